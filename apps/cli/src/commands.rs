//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use testsplit_core::{GroupResult, ProgressReporter, group_files};
use testsplit_shared::{AppConfig, GroupBy, GroupConfig, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// testsplit: balance test files across parallel workers.
#[derive(Parser)]
#[command(
    name = "testsplit",
    version,
    about = "Split test files into cost-balanced groups for parallel workers.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.testsplit/testsplit.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format of the grouping result.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Split files into groups and print the result.
    Group(GroupArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `testsplit group`. Unset flags fall back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct GroupArgs {
    /// Test files to group.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of groups.
    #[arg(short = 'n', long = "groups")]
    pub groups: Option<usize>,

    /// Cost strategy: default, weight, steps, or scenarios.
    #[arg(long = "by")]
    pub group_by: Option<GroupBy>,

    /// Regex of files that must run in group 0 (repeatable).
    #[arg(long = "single-process")]
    pub single_process: Vec<String>,

    /// Reserve group 0 for single-process files only.
    #[arg(long)]
    pub isolate: bool,

    /// Regex of tags whose features/scenarios are not counted.
    #[arg(long)]
    pub ignore_tag_pattern: Option<String>,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout only
/// carries the grouping.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "testsplit=info",
        1 => "testsplit=debug",
        _ => "testsplit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Group(args) => cmd_group(config_path, args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge CLI flags over the loaded config.
fn resolve_group_config(app: &AppConfig, args: GroupArgs) -> GroupConfig {
    let mut config = GroupConfig::from(app);
    config.files = args.files;
    if let Some(groups) = args.groups {
        config.num_groups = groups;
    }
    if let Some(group_by) = args.group_by {
        config.group_by = group_by;
    }
    if !args.single_process.is_empty() {
        config.single_process = args.single_process;
    }
    config.isolate |= args.isolate;
    if args.ignore_tag_pattern.is_some() {
        config.ignore_tag_pattern = args.ignore_tag_pattern;
    }
    config
}

async fn cmd_group(config_path: Option<&Path>, args: GroupArgs) -> Result<()> {
    let app = load(config_path)?;
    let format = args.format.clone();
    let config = resolve_group_config(&app, args);

    info!(
        files = config.files.len(),
        groups = config.num_groups,
        group_by = %config.group_by,
        isolate = config.isolate,
        "grouping test files"
    );

    let reporter = CliProgress::new();
    let result = group_files(&config, &reporter).await?;

    match format {
        OutputFormat::Text => print!("{}", result.partition.summary()),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "group_by": result.group_by.to_string(),
                "groups": result.partition.groups(),
                "summary": result.partition.summary(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_estimated(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Estimating [{current}/{total}] {path}"));
    }

    fn done(&self, result: &GroupResult) {
        self.spinner.finish_and_clear();
        info!(
            items = result.item_count,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "grouped"
        );
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("failed to render config: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_group_flags() {
        let cli = Cli::try_parse_from([
            "testsplit",
            "group",
            "-n",
            "3",
            "--by",
            "steps",
            "--single-process",
            "db/",
            "--single-process",
            "payments",
            "--isolate",
            "a.feature",
            "b.feature",
        ])
        .expect("parse");

        let Command::Group(args) = cli.command else {
            panic!("expected group command");
        };
        assert_eq!(args.groups, Some(3));
        assert_eq!(args.group_by, Some(GroupBy::Steps));
        assert_eq!(args.single_process, vec!["db/", "payments"]);
        assert!(args.isolate);
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn group_requires_files() {
        assert!(Cli::try_parse_from(["testsplit", "group", "-n", "2"]).is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["testsplit", "group", "--by", "runtime", "a"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut app = AppConfig::default();
        app.pinning.single_process = vec!["from-config".into()];
        app.estimation.ignore_tag_pattern = Some("@wip".into());

        let args = GroupArgs {
            files: vec![PathBuf::from("a.feature")],
            groups: Some(6),
            group_by: Some(GroupBy::Weight),
            ..GroupArgs::default()
        };
        let config = resolve_group_config(&app, args);

        assert_eq!(config.num_groups, 6);
        assert_eq!(config.group_by, GroupBy::Weight);
        assert_eq!(config.single_process, vec!["from-config".to_string()]);
        assert_eq!(config.ignore_tag_pattern.as_deref(), Some("@wip"));
        assert!(!config.isolate);
    }

    #[test]
    fn config_values_apply_when_flags_are_absent() {
        let mut app = AppConfig::default();
        app.defaults.num_groups = 2;
        app.pinning.isolate = true;

        let args = GroupArgs {
            files: vec![PathBuf::from("a.feature")],
            ..GroupArgs::default()
        };
        let config = resolve_group_config(&app, args);
        assert_eq!(config.num_groups, 2);
        assert!(config.isolate);
        assert_eq!(config.group_by, GroupBy::Default);
    }
}
