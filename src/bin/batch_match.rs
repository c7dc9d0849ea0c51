//! `batch-match`: drives IAP batch generation over a JSON snapshot of
//! funding programs.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use jiwon_match::config::{BatchConfig, LlmRates};
use jiwon_match::funnel;
use jiwon_match::iap;
use jiwon_match::llm::{Completer, NullCompleter, ReqwestCompleter};
use jiwon_match::models::FundingProgram;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ProgramTypeFilter {
    Rd,
    Sme,
    All,
}

#[derive(Parser, Debug)]
#[command(name = "batch-match", about = "Batch IAP generation over a funding-program snapshot")]
struct Cli {
    /// Path to a JSON file containing an array of funding programs.
    #[arg(long)]
    input: PathBuf,

    /// Disable the LLM tier; generate rule-only IAPs.
    #[arg(long)]
    no_llm: bool,

    /// Restrict to one program family.
    #[arg(long, value_enum, default_value_t = ProgramTypeFilter::All)]
    r#type: ProgramTypeFilter,

    /// Compute without writing the result back to --input.
    #[arg(long)]
    dry_run: bool,

    /// Number of programs processed per paced batch.
    #[arg(long, default_value_t = BatchConfig::default().batch_size)]
    batch_size: usize,

    /// Stop after this many programs total (0 = no limit).
    #[arg(long, default_value_t = 0)]
    limit: usize,
}

fn family_matches(program: &FundingProgram, filter: ProgramTypeFilter) -> bool {
    match filter {
        ProgramTypeFilter::All => true,
        ProgramTypeFilter::Rd => program.program_family == jiwon_match::models::ProgramFamily::Rd,
        ProgramTypeFilter::Sme => program.program_family == jiwon_match::models::ProgramFamily::Sme,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input snapshot at {}", cli.input.display()))?;
    let mut programs: Vec<FundingProgram> =
        serde_json::from_str(&raw).context("parsing funding-program snapshot as JSON")?;

    let rates = LlmRates::from_env();
    let completer: Box<dyn Completer> = if cli.no_llm {
        Box::new(NullCompleter)
    } else {
        match (std::env::var("LLM_ENDPOINT"), std::env::var("LLM_API_KEY")) {
            (Ok(endpoint), Ok(api_key)) => {
                Box::new(ReqwestCompleter::new(endpoint, api_key, Duration::from_secs(30))?)
            }
            _ => {
                warn!("LLM_ENDPOINT/LLM_API_KEY not set; falling back to rule-only IAP generation");
                Box::new(NullCompleter)
            }
        }
    };
    let use_llm = !cli.no_llm;

    let cancellation = funnel::new_cancellation_signal();
    {
        let cancellation = cancellation.clone();
        ctrlc_handler(move || cancellation.store(true, Ordering::Relaxed));
    }

    let mut generated = 0usize;
    let mut skipped_resumed = 0usize;

    let eligible_indices: Vec<usize> = programs
        .iter()
        .enumerate()
        .filter(|(_, p)| family_matches(p, cli.r#type))
        .map(|(i, _)| i)
        .collect();

    'batches: for batch in eligible_indices.chunks(cli.batch_size.max(1)) {
        if cancellation.load(Ordering::Relaxed) {
            info!("cancellation requested; stopping before next batch");
            break;
        }

        for &idx in batch {
            if cli.limit > 0 && generated + skipped_resumed >= cli.limit {
                break 'batches;
            }

            if programs[idx].has_iap() {
                skipped_resumed += 1;
                continue;
            }

            let result =
                iap::generate_ideal_profile(&programs[idx], use_llm, Some(completer.as_ref()), &rates).await;

            if result.used_llm {
                info!(program_id = %programs[idx].id, cost_krw = result.llm_cost_krw, "IAP generated via LLM tier");
            }

            programs[idx].ideal_applicant_profile = Some(result.profile);
            generated += 1;
        }

        if use_llm && !cancellation.load(Ordering::Relaxed) {
            tokio::time::sleep(BatchConfig::default().pacing).await;
        }
    }

    info!(generated, skipped_resumed, "batch IAP generation complete");

    if !cli.dry_run {
        let serialized = serde_json::to_string_pretty(&programs).context("serializing updated snapshot")?;
        fs::write(&cli.input, serialized)
            .with_context(|| format!("writing updated snapshot to {}", cli.input.display()))?;
    }

    Ok(())
}

fn ctrlc_handler<F: Fn() + Send + 'static>(f: F) {
    // Minimal signal wiring: a single SIGINT triggers cooperative
    // cancellation at the next batch boundary rather than exiting hard.
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            f();
        }
    });
}
