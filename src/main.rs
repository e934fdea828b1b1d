//! deal-intake CLI: email extraction and submission diffing.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use deal_intake::conflict::{IntakeStatus, detect_conflicts};
use deal_intake::llm::{ExtractStrategy, LlmExtractor, RuleBased};
use deal_intake::record::FieldMap;
use deal_intake::vocab::Vocabulary;

#[derive(Parser)]
#[command(name = "deal-intake", version, about = "Deal-registration intake engine")]
struct Cli {
    /// Vocabulary TOML file (defaults to the built-in vocabulary).
    #[arg(long, global = true)]
    vocab: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a deal-registration record from an email body.
    Extract {
        /// Email body file (reads stdin when omitted).
        file: Option<PathBuf>,

        /// Envelope sender address.
        #[arg(long)]
        sender: Option<String>,

        /// Envelope sender display name.
        #[arg(long)]
        sender_name: Option<String>,

        /// Envelope subject line.
        #[arg(long)]
        subject: Option<String>,

        /// Delegate to an LLM completion endpoint instead of the rules.
        #[arg(long)]
        llm_endpoint: Option<String>,

        /// Model name sent to the LLM endpoint.
        #[arg(long, default_value = "extraction-default")]
        llm_model: String,

        /// Run the rule pipeline when the LLM fails.
        #[arg(long, requires = "llm_endpoint")]
        llm_fallback: bool,
    },

    /// Diff a partner submission against the reviewed snapshot.
    Diff {
        /// Reviewed snapshot (JSON field map).
        snapshot: PathBuf,

        /// Partner submission (JSON field map).
        submitted: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let vocab = match &cli.vocab {
        Some(path) => Vocabulary::load(path)?,
        None => Vocabulary::builtin(),
    };

    match cli.command {
        Commands::Extract {
            file,
            sender,
            sender_name,
            subject,
            llm_endpoint,
            llm_model,
            llm_fallback,
        } => {
            let body = match file {
                Some(path) => std::fs::read_to_string(&path).into_diagnostic()?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                    buf
                }
            };

            let strategy: Box<dyn ExtractStrategy> = match llm_endpoint {
                Some(endpoint) => {
                    let llm = LlmExtractor::new(endpoint, llm_model, vocab);
                    Box::new(if llm_fallback { llm.with_fallback() } else { llm })
                }
                None => Box::new(RuleBased::new(vocab)),
            };

            let out = strategy.extract(
                &body,
                sender.as_deref(),
                sender_name.as_deref(),
                subject.as_deref(),
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&out).into_diagnostic()?
            );
        }

        Commands::Diff {
            snapshot,
            submitted,
        } => {
            let snapshot: FieldMap = read_field_map(&snapshot)?;
            let submitted: FieldMap = read_field_map(&submitted)?;

            let report = detect_conflicts(&snapshot, &submitted);
            let status = IntakeStatus::after_submission(&report);

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "report": report,
                    "status": status,
                }))
                .into_diagnostic()?
            );
        }
    }

    Ok(())
}

fn read_field_map(path: &PathBuf) -> Result<FieldMap> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&content).into_diagnostic()
}
