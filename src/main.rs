use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use diagtime_lib::config::{self, AppConfig};
use diagtime_lib::models::{load_records, write_results, ExtractionMethod};
use diagtime_lib::pipeline::diagnosis_time::{run_concurrent, DiagnosisTimeRunner, NlpContext};

#[derive(Parser, Debug)]
#[command(name = "diagtime", version)]
#[command(about = "Extract diagnosis time from self-report text")]
struct Args {
    /// TOML config file; defaults apply when it does not exist.
    #[arg(long, env = "DIAGTIME_CONFIG", default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// JSON array of {"text", "created_utc"} records.
    #[arg(long, default_value = "data/example_data.json")]
    input_file: PathBuf,
    #[arg(long, default_value = "output/example_diagnosis_time.json")]
    output_file: PathBuf,
    /// `parsing` or `char_dist`.
    #[arg(long)]
    method: Option<ExtractionMethod>,
    /// Pre-computed dependency parses (CoNLL-U).
    #[arg(long)]
    conllu: Option<PathBuf>,
    #[arg(long)]
    workers: Option<usize>,
    /// Per-record time limit in seconds (concurrent runs).
    #[arg(long)]
    record_timeout: Option<u64>,
}

impl Args {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(method) = self.method {
            config.extraction.method = method;
        }
        if let Some(conllu) = &self.conllu {
            config.data_locations.conllu = Some(conllu.clone());
        }
        if let Some(workers) = self.workers {
            config.extraction.workers = workers;
        }
        if let Some(secs) = self.record_timeout {
            config.extraction.record_timeout_secs = Some(secs);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut app = AppConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    args.apply_to(&mut app);

    diagtime_lib::init_tracing(&app.logging.filter);
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);
    if !args.config.exists() {
        tracing::info!(path = %args.config.display(), "Config file not found, using defaults");
    }

    let lexicon = app.load_lexicon().context("loading lexicon")?;
    let parser = app.load_parser().context("loading dependency parses")?;
    let context = NlpContext::rule_based(Arc::new(parser));
    let runner = DiagnosisTimeRunner::new(&context, &lexicon, &app.extraction)?;

    let records = load_records(&args.input_file)
        .with_context(|| format!("reading {}", args.input_file.display()))?;

    let settings = &app.extraction;
    let output = if settings.workers > 1 || settings.record_timeout_secs.is_some() {
        run_concurrent(
            Arc::new(runner),
            records,
            settings.workers,
            settings.record_timeout_secs.map(Duration::from_secs),
        )
        .await
    } else {
        runner.get_diagnosis_time(&records)
    };

    write_results(&args.output_file, &output.results)
        .with_context(|| format!("writing {}", args.output_file.display()))?;
    tracing::info!(path = %args.output_file.display(), "Results written");

    Ok(())
}
