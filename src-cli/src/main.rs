mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hive_core::demo::demo_cases;
use hive_core::domain::RawCaseRecord;
use hive_core::error::AppError;
use hive_core::pipeline::{run_report, Delivery};
use hive_core::ports::CaseSource;
use hive_io::outbox::OutboxTransport;
use hive_io::render::{write_artifact, CsvBundleRenderer};
use hive_io::thehive::TheHiveClient;
use time::{Date, OffsetDateTime};
use tracing::{error, info, warn};

use crate::config::{FileConfig, Overrides};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "hivemetrics",
    about = "Build and mail the TheHive case metrics report",
    version,
    long_version = LONG_VERSION
)]
struct Cli {
    /// TOML config file.
    #[arg(short, long, env = "HIVEMETRICS_CONFIG")]
    config: Option<PathBuf>,

    /// Pretend today is this UTC date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_day)]
    today: Option<Date>,

    /// Use generated cases instead of querying TheHive.
    #[arg(long)]
    demo: bool,

    /// Directory the rendered report files are written to.
    #[arg(long, env = "HIVEMETRICS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Abort on the first malformed case record.
    #[arg(long)]
    strict: bool,

    /// Render only; never spool mail.
    #[arg(long)]
    no_mail: bool,

    #[arg(long, env = "HIVE_URL")]
    hive_url: Option<String>,

    #[arg(long, env = "HIVE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Debug logging for every target (ignored when RUST_LOG is set).
    #[arg(short, long)]
    verbose: bool,
}

fn parse_day(s: &str) -> Result<Date, String> {
    let fmt = time::format_description::parse("[year]-[month]-[day]").map_err(|e| e.to_string())?;
    Date::parse(s.trim(), &fmt).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

struct DemoSource {
    today: Date,
}

impl CaseSource for DemoSource {
    fn fetch_cases(&self) -> Result<Vec<RawCaseRecord>, AppError> {
        Ok(demo_cases(self.today))
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let file = match &cli.config {
        Some(path) => config::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        hive_url: cli.hive_url,
        api_key: cli.api_key,
        output_dir: cli.output_dir,
        strict: cli.strict,
        no_mail: cli.no_mail,
        demo: cli.demo,
    };
    let settings = config::resolve(file, &overrides)?;
    let today = cli.today.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    info!(%today, demo = cli.demo, commit = env!("GIT_COMMIT_HASH"), "starting report run");

    let source: Box<dyn CaseSource> = match &settings.hive {
        Some(hive) => Box::new(TheHiveClient::new(&hive.base_url, hive.api_key.clone())?),
        None => Box::new(DemoSource { today }),
    };
    let renderer = CsvBundleRenderer::new(settings.artifact_name.clone());
    let transport = settings
        .mail
        .as_ref()
        .map(|m| OutboxTransport::new(m.outbox_dir.clone(), m.template.clone()));
    let delivery = match (&settings.mail, &transport) {
        (Some(mail), Some(transport)) => Some(Delivery {
            transport,
            recipients: &mail.recipients,
            server: &mail.server,
        }),
        _ => None,
    };
    if delivery.is_none() {
        info!("mail delivery disabled");
    }

    let outcome = run_report(
        source.as_ref(),
        &renderer,
        delivery,
        today,
        &settings.report,
    )?;

    for rejected in &outcome.report.rejected {
        warn!(%rejected, "skipped malformed case record");
    }
    for w in &outcome.report.warnings {
        warn!(code = %w.code, message = %w.message, "report warning");
    }

    let written = write_artifact(&settings.output_dir, &outcome.artifact)?;
    info!(files = written.len(), dir = %settings.output_dir.display(), "wrote report files");

    let json = serde_json::to_string_pretty(&outcome.report).map_err(|e| {
        AppError::new("INTERNAL", "Failed to encode run report").with_details(e.to_string())
    })?;
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(
                code = %e.code,
                details = e.details.as_deref().unwrap_or(""),
                retryable = e.retryable,
                "{}",
                e.message
            );
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
