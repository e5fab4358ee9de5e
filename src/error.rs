//! Top-level error type.
//!
//! Each fallible subsystem defines its own error enum with miette
//! `#[diagnostic]` derives; this module ties them together so callers can
//! hold one error type while keeping the full diagnostic chain.

use miette::Diagnostic;
use thiserror::Error;

use crate::calendar::CalendarError;
use crate::model::ModelError;
use crate::reconcile::ReconcileError;

/// Top-level error type for the scribecal engine.
#[derive(Debug, Error, Diagnostic)]
pub enum ScribeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Calendar(#[from] CalendarError),
}

/// Convenience alias for functions returning scribecal results.
pub type ScribeResult<T> = std::result::Result<T, ScribeError>;
