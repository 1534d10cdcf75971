use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mongospectre::analyzer::{self, IgnoreList};
use mongospectre::config::{AuditArgs, Cli, Command, CompareArgs, Config, LintArgs};
use mongospectre::models::{Report, max_severity};
use mongospectre::services::{AtlasClient, CodeScanner, MongoInspector, report_writer};
use mongospectre::utils::redact_uri;
use mongospectre::{AuditSnapshot, Severity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    let exit_code = match &cli.command {
        Command::Audit(args) => run_audit_command(cli.config.as_deref(), args).await?,
        Command::Compare(args) => run_compare_command(args).await?,
        Command::Lint(args) => run_lint_command(args),
    };

    std::process::exit(exit_code);
}

fn init_tracing(cli_level: Option<&str>) {
    let level = cli_level
        .map(str::to_string)
        .or_else(|| std::env::var("MONGOSPECTRE_LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr; stdout carries only the report.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_audit_command(cli_config: Option<&str>, args: &AuditArgs) -> anyhow::Result<i32> {
    let config = Config::load(cli_config, args)?;
    let timeout = Duration::from_secs(config.mongo.timeout_secs);

    tracing::info!("connecting to {}", redact_uri(&config.mongo.uri));
    let inspector = MongoInspector::connect(&config.mongo.uri, timeout).await?;

    let database = if config.mongo.database.is_empty() {
        None
    } else {
        Some(config.mongo.database.as_str())
    };
    let collections = inspector.inspect(database).await?;
    tracing::info!("inspected {} collection(s)", collections.len());

    let (users, security, replica_set, sharding, profile_entries) = tokio::try_join!(
        inspector.inspect_users(),
        inspector.inspect_security(),
        inspector.inspect_repl_set(),
        inspector.inspect_sharding(),
        inspector.read_profiler(config.mongo.profile_limit),
    )?;
    let samples = inspector
        .sample_documents(&collections, config.mongo.sample_size)
        .await?;

    let scan = if config.scan.path.is_empty() {
        None
    } else {
        tracing::info!("scanning source tree {}", config.scan.path);
        Some(CodeScanner::new(&config.scan.path).scan()?)
    };

    let atlas = if config.atlas.is_configured() {
        tracing::info!("correlating Atlas project {}", config.atlas.project_id);
        let client = AtlasClient::connect(
            config.atlas.base_url.as_deref(),
            &config.atlas.project_id,
            &config.atlas.client_id,
            &config.atlas.client_secret,
        )
        .await?;
        let cluster = if config.atlas.cluster.is_empty() {
            None
        } else {
            Some(config.atlas.cluster.as_str())
        };
        Some(client.snapshot(cluster).await?)
    } else {
        None
    };

    let baseline = if config.report.baseline.is_empty() {
        None
    } else {
        Some(analyzer::load_baseline(Path::new(&config.report.baseline))?)
    };
    let ignore = IgnoreList::load(Path::new(&config.report.ignore_file));

    let snapshot = AuditSnapshot {
        uri: Some(config.mongo.uri.clone()),
        taken_at: Some(Utc::now()),
        collections,
        users,
        security: Some(security),
        replica_set: Some(replica_set),
        sharding: Some(sharding),
        samples,
        profile_entries,
        scan,
        atlas,
    };

    let outcome = analyzer::run_audit(&snapshot, baseline.as_ref(), &ignore);
    tracing::info!(
        "{} finding(s), {} suppressed, max severity {}",
        outcome.findings.len(),
        outcome.suppressed,
        outcome.max_severity
    );

    let rendered = match config.report.format.as_str() {
        "json" => {
            let mut report = Report::new(outcome.findings.clone(), snapshot.collections.clone());
            report.metadata.uri = redact_uri(&config.mongo.uri);
            report_writer::to_json(&report)?
        },
        "markdown" => report_writer::render_markdown(&outcome),
        _ => report_writer::render_text(&outcome),
    };

    if config.report.output.is_empty() {
        print!("{}", rendered);
    } else {
        fs::write(&config.report.output, &rendered)?;
        tracing::info!("report written to {}", config.report.output);
    }

    Ok(outcome.exit_code())
}

async fn run_compare_command(args: &CompareArgs) -> anyhow::Result<i32> {
    let timeout = Duration::from_secs(args.timeout.unwrap_or(30));

    tracing::info!("connecting to source {}", redact_uri(&args.source_uri));
    let source = MongoInspector::connect(&args.source_uri, timeout).await?;
    tracing::info!("connecting to target {}", redact_uri(&args.target_uri));
    let target = MongoInspector::connect(&args.target_uri, timeout).await?;

    let (source_collections, target_collections) =
        tokio::try_join!(source.inspect(None), target.inspect(None))?;

    let findings = analyzer::compare_clusters(&source_collections, &target_collections);
    print!("{}", report_writer::render_compare(&findings));

    let max = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::Info);
    Ok(max.exit_code())
}

fn run_lint_command(args: &LintArgs) -> i32 {
    let findings = analyzer::rules::lint_uri(&args.uri);
    let outcome = mongospectre::AuditOutcome {
        max_severity: max_severity(&findings),
        findings,
        suppressed: 0,
        baseline: None,
    };
    print!("{}", report_writer::render_text(&outcome));
    outcome.exit_code()
}
