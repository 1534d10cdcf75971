use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub mongo: MongoConfig,
    pub atlas: AtlasConfig,
    pub scan: ScanConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    /// Restrict the audit to one database; empty audits everything.
    pub database: String,
    /// Deadline propagated into driver connect/server-selection timeouts.
    pub timeout_secs: u64,
    pub sample_size: i64,
    pub profile_limit: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AtlasConfig {
    pub project_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Cluster to correlate; empty picks the project's first cluster.
    pub cluster: String,
    /// Override for self-hosted test doubles.
    pub base_url: Option<String>,
}

impl AtlasConfig {
    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Source tree to scan; empty disables the code-aware families.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// text | json | markdown
    pub format: String,
    /// Destination file; empty writes to stdout.
    pub output: String,
    pub baseline: String,
    pub ignore_file: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Command line surface.
#[derive(Parser, Debug)]
#[command(name = "mongospectre")]
#[command(version, about = "Audit a MongoDB deployment and the code that uses it")]
pub struct Cli {
    /// Path to configuration file (default: mongospectre.toml if present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (overrides config file, e.g. "info,mongospectre=debug")
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Audit a deployment (and optionally an Atlas project and a code tree)
    Audit(AuditArgs),
    /// Diff the collections and indexes of two clusters
    Compare(CompareArgs),
    /// Lint a connection string without connecting
    Lint(LintArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct AuditArgs {
    /// Connection string of the deployment to audit
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Audit a single database instead of all application databases
    #[arg(long, value_name = "DB")]
    pub database: Option<String>,

    /// Driver deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Source tree to scan for collection/field references
    #[arg(long, value_name = "DIR")]
    pub code: Option<String>,

    /// Prior report JSON to diff against
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<String>,

    /// Ignore file (default: .mongospectreignore)
    #[arg(long, value_name = "FILE")]
    pub ignore_file: Option<String>,

    /// Documents sampled per collection
    #[arg(long, value_name = "N")]
    pub sample_size: Option<i64>,

    /// Profiler entries read per database
    #[arg(long, value_name = "N")]
    pub profile_limit: Option<i64>,

    /// Atlas project (group) id; enables the Atlas families
    #[arg(long, value_name = "ID")]
    pub atlas_project: Option<String>,

    /// Atlas service-account client id
    #[arg(long, value_name = "ID")]
    pub atlas_client_id: Option<String>,

    /// Atlas service-account client secret
    #[arg(long, value_name = "SECRET")]
    pub atlas_client_secret: Option<String>,

    /// Atlas cluster name (default: first cluster in the project)
    #[arg(long, value_name = "NAME")]
    pub atlas_cluster: Option<String>,

    /// Output format: text, json or markdown
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Connection string of the reference cluster
    #[arg(long, value_name = "URI")]
    pub source_uri: String,

    /// Connection string of the cluster to check for drift
    #[arg(long, value_name = "URI")]
    pub target_uri: String,

    /// Driver deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct LintArgs {
    /// Connection string to lint
    #[arg(long, value_name = "URI")]
    pub uri: String,
}

impl Config {
    /// Load configuration for an audit run.
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with MONGOSPECTRE_)
    /// 3. Configuration file (mongospectre.toml)
    /// 4. Default values
    pub fn load(cli_config: Option<&str>, args: &AuditArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_config
            .map(str::to_string)
            .or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported environment variables:
    /// - MONGOSPECTRE_URI: connection string
    /// - MONGOSPECTRE_DATABASE: single database to audit
    /// - MONGOSPECTRE_TIMEOUT_SECS: driver deadline
    /// - MONGOSPECTRE_ATLAS_PROJECT: Atlas project (group) id
    /// - MONGOSPECTRE_ATLAS_CLIENT_ID / _SECRET: service-account credentials
    /// - MONGOSPECTRE_LOG_LEVEL: logging level
    fn apply_env_overrides(&mut self) {
        if let Ok(uri) = std::env::var("MONGOSPECTRE_URI") {
            self.mongo.uri = uri;
            tracing::info!("Override mongo.uri from env");
        }
        if let Ok(database) = std::env::var("MONGOSPECTRE_DATABASE") {
            self.mongo.database = database;
            tracing::info!("Override mongo.database from env: {}", self.mongo.database);
        }
        if let Ok(timeout) = std::env::var("MONGOSPECTRE_TIMEOUT_SECS")
            && let Ok(timeout) = timeout.parse()
        {
            self.mongo.timeout_secs = timeout;
            tracing::info!("Override mongo.timeout_secs from env: {}", self.mongo.timeout_secs);
        }
        if let Ok(project) = std::env::var("MONGOSPECTRE_ATLAS_PROJECT") {
            self.atlas.project_id = project;
            tracing::info!("Override atlas.project_id from env");
        }
        if let Ok(id) = std::env::var("MONGOSPECTRE_ATLAS_CLIENT_ID") {
            self.atlas.client_id = id;
            tracing::info!("Override atlas.client_id from env");
        }
        if let Ok(secret) = std::env::var("MONGOSPECTRE_ATLAS_CLIENT_SECRET") {
            self.atlas.client_secret = secret;
            tracing::info!("Override atlas.client_secret from env");
        }
        if let Ok(level) = std::env::var("MONGOSPECTRE_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Apply command line argument overrides (highest priority).
    fn apply_cli_overrides(&mut self, args: &AuditArgs) {
        if let Some(uri) = &args.uri {
            self.mongo.uri = uri.clone();
        }
        if let Some(database) = &args.database {
            self.mongo.database = database.clone();
        }
        if let Some(timeout) = args.timeout {
            self.mongo.timeout_secs = timeout;
        }
        if let Some(sample_size) = args.sample_size {
            self.mongo.sample_size = sample_size;
        }
        if let Some(profile_limit) = args.profile_limit {
            self.mongo.profile_limit = profile_limit;
        }
        if let Some(code) = &args.code {
            self.scan.path = code.clone();
        }
        if let Some(baseline) = &args.baseline {
            self.report.baseline = baseline.clone();
        }
        if let Some(ignore_file) = &args.ignore_file {
            self.report.ignore_file = ignore_file.clone();
        }
        if let Some(project) = &args.atlas_project {
            self.atlas.project_id = project.clone();
        }
        if let Some(id) = &args.atlas_client_id {
            self.atlas.client_id = id.clone();
        }
        if let Some(secret) = &args.atlas_client_secret {
            self.atlas.client_secret = secret.clone();
        }
        if let Some(cluster) = &args.atlas_cluster {
            self.atlas.cluster = cluster.clone();
        }
        if let Some(format) = &args.format {
            self.report.format = format.clone();
        }
        if let Some(output) = &args.output {
            self.report.output = output.clone();
        }
    }

    /// Validate configuration.
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.mongo.uri.is_empty() {
            anyhow::bail!("no connection string; pass --uri or set MONGOSPECTRE_URI");
        }
        if self.mongo.timeout_secs == 0 {
            anyhow::bail!("mongo.timeout_secs must be > 0");
        }
        if self.mongo.sample_size <= 0 {
            anyhow::bail!("mongo.sample_size must be > 0");
        }
        if self.mongo.profile_limit <= 0 {
            anyhow::bail!("mongo.profile_limit must be > 0");
        }
        if !matches!(self.report.format.as_str(), "text" | "json" | "markdown") {
            anyhow::bail!("report.format must be text, json or markdown");
        }
        if !self.atlas.project_id.is_empty() && !self.atlas.is_configured() {
            anyhow::bail!(
                "--atlas-project needs service-account credentials (--atlas-client-id/--atlas-client-secret)"
            );
        }
        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["mongospectre.toml", "conf/mongospectre.toml", ".mongospectre.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: String::new(),
            timeout_secs: 30,
            sample_size: crate::analyzer::thresholds::DEFAULT_SAMPLE_SIZE,
            profile_limit: crate::analyzer::thresholds::DEFAULT_PROFILE_LIMIT,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            output: String::new(),
            baseline: String::new(),
            ignore_file: ".mongospectreignore".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri_args() -> AuditArgs {
        AuditArgs { uri: Some("mongodb://localhost/app".into()), ..Default::default() }
    }

    #[test]
    fn defaults_are_valid_once_uri_is_set() {
        let config = Config::load(None, &uri_args()).unwrap();
        assert_eq!(config.mongo.timeout_secs, 30);
        assert_eq!(config.report.format, "text");
        assert_eq!(config.report.ignore_file, ".mongospectreignore");
    }

    #[test]
    fn missing_uri_is_rejected() {
        assert!(Config::load(None, &AuditArgs::default()).is_err());
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        write!(
            file,
            "[mongo]\nuri = \"mongodb://file.example.com/db\"\ntimeout_secs = 10\n"
        )
        .unwrap();
        let mut args = uri_args();
        args.timeout = Some(5);
        let config = Config::load(file.path().to_str(), &args).unwrap();
        assert_eq!(config.mongo.uri, "mongodb://localhost/app");
        assert_eq!(config.mongo.timeout_secs, 5);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let mut args = uri_args();
        args.format = Some("yaml".into());
        assert!(Config::load(None, &args).is_err());
    }

    #[test]
    fn atlas_project_requires_credentials() {
        let mut args = uri_args();
        args.atlas_project = Some("abc123".into());
        assert!(Config::load(None, &args).is_err());

        args.atlas_client_id = Some("id".into());
        args.atlas_client_secret = Some("secret".into());
        assert!(Config::load(None, &args).is_ok());
    }
}
