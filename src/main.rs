//! scribecal CLI: turn recognized text into calendar events.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use scribecal::calendar::{IcsFileStore, save_event};
use scribecal::detect::DateTimeDetector;
use scribecal::display::DisplayEvent;
use scribecal::model::ModelConfig;
use scribecal::pipeline::{ExtractionPipeline, PipelineConfig};
use scribecal::reconcile::reconcile;

#[derive(Parser)]
#[command(name = "scribecal", version, about = "Extract calendar events from recognized text")]
struct Cli {
    /// Base URL of the generative model server.
    #[arg(long, global = true, default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Model name.
    #[arg(long, global = true, default_value = "llama3.2")]
    model: String,

    /// Model request timeout in seconds.
    #[arg(long, global = true, default_value = "30")]
    timeout_secs: u64,

    /// Skip the generative stage; use only the heuristic extractor.
    #[arg(long, global = true)]
    heuristic_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract an event candidate and print it as JSON.
    Extract {
        /// Path to a text file; reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Extract and reconcile into concrete start/end instants.
    Plan {
        /// Path to a text file; reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Extract, reconcile, and append the event to an iCalendar file.
    Save {
        /// Path to a text file; reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output .ics path.
        #[arg(long, default_value = "events.ics")]
        output: PathBuf,
    },

    /// Show what the date/time detector finds in the text.
    Detect {
        /// Path to a text file; reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            model: (!self.heuristic_only).then(|| ModelConfig {
                base_url: self.ollama_url.clone(),
                model: self.model.clone(),
                timeout_secs: self.timeout_secs,
            }),
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).into_diagnostic()?;
            Ok(text)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config();

    match &cli.command {
        Commands::Extract { file } => {
            let text = read_input(file.as_ref())?;
            let candidate = ExtractionPipeline::new(config).run(&text);
            let display = DisplayEvent::from_candidate("candidate", &candidate);
            println!("{}", serde_json::to_string_pretty(&display).into_diagnostic()?);
        }

        Commands::Plan { file } => {
            let text = read_input(file.as_ref())?;
            let candidate = ExtractionPipeline::new(config).run(&text);
            let event = reconcile(&candidate)?;
            let display = DisplayEvent::from_reconciled("planned", &event);
            println!("{}", serde_json::to_string_pretty(&display).into_diagnostic()?);
        }

        Commands::Save { file, output } => {
            let text = read_input(file.as_ref())?;
            let candidate = ExtractionPipeline::new(config).run(&text);
            let event = reconcile(&candidate)?;
            let mut store = IcsFileStore::new(output);
            let event_id = save_event(&mut store, &event)?;
            println!("Saved event {} to {}", event_id, output.display());
        }

        Commands::Detect { file } => {
            let text = read_input(file.as_ref())?;
            match DateTimeDetector::now().detect(&text) {
                Some(found) => println!(
                    "{} (+{} min)",
                    found.instant.format("%Y-%m-%d %H:%M"),
                    found.duration.num_minutes()
                ),
                None => println!("no date/time span found"),
            }
        }
    }

    Ok(())
}
