//! # scribecal
//!
//! Text-to-calendar-event extraction: turn unstructured recognized text
//! (e.g. OCR output from a photographed flyer) into a concrete calendar
//! event.
//!
//! ## Architecture
//!
//! - **Detection** (`detect`): first date/time span in free text, plus an
//!   optional duration
//! - **Normalization** (`normalize`): heterogeneous date/time strings into
//!   local instants via an ordered parser chain
//! - **Extraction** (`pipeline`, `model`, `heuristic`): a generative model
//!   stage with a total regex-based fallback, tried in priority order
//! - **Reconciliation** (`reconcile`): partial date/time fragments into
//!   concrete start/end instants under explicit default policies
//! - **Calendar boundary** (`calendar`): access states, writable-target
//!   selection, in-memory and `.ics` file stores
//!
//! ## Library usage
//!
//! ```
//! use scribecal::pipeline::{ExtractionPipeline, PipelineConfig};
//! use scribecal::reconcile::reconcile;
//!
//! let pipeline = ExtractionPipeline::new(PipelineConfig { model: None });
//! let candidate = pipeline.run("Team Standup\nMonday at 9:00 AM\nLocation: Room 204");
//! let event = reconcile(&candidate).unwrap();
//! assert_eq!(event.title, "Team Standup");
//! ```

pub mod calendar;
pub mod candidate;
pub mod detect;
pub mod display;
pub mod error;
pub mod heuristic;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
