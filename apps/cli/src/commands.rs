//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use navsphere_core::icon::resolve_tree_icons;
use navsphere_review::{LocalTracker, ReviewAction, ReviewWorkflow};
use navsphere_shared::{
    AppConfig, ReviewConfig, TreeStats, init_config, load_config, validate_token,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// NavSphere: curated link directory tooling.
#[derive(Parser)]
#[command(
    name = "navsphere",
    version,
    about = "Load, check and render NavSphere navigation data, and review link submissions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the filtered `{site, navigation}` document the site renders.
    Render {
        /// Path to navigation.json (defaults to `[data].navigation_path`).
        #[arg(long)]
        navigation: Option<PathBuf>,

        /// Path to site.json (defaults to `[data].site_path`).
        #[arg(long)]
        site: Option<PathBuf>,

        /// Rewrite icon references to servable paths.
        #[arg(long)]
        resolve_icons: bool,

        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },

    /// Validate data files and report entity counts.
    Check {
        /// Path to navigation.json (defaults to `[data].navigation_path`).
        #[arg(long)]
        navigation: Option<PathBuf>,

        /// Path to site.json. Checked only when given.
        #[arg(long)]
        site: Option<PathBuf>,
    },

    /// Approve or reject a submission issue.
    #[command(group(ArgGroup::new("decision").required(true).args(["approve", "reject"])))]
    Review {
        /// Issue number.
        number: u64,

        /// Add the submitted link to the navigation data.
        #[arg(long)]
        approve: bool,

        /// Decline the submission.
        #[arg(long)]
        reject: bool,

        /// Reason quoted in the rejection comment.
        #[arg(long, conflicts_with = "approve")]
        reason: Option<String>,

        /// Directory holding `<number>.json` issue files.
        #[arg(long)]
        issues: PathBuf,

        /// Navigation data file to update (defaults to `[tracker].data_path`).
        #[arg(long)]
        data: Option<String>,

        /// Name recorded in the review comment.
        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Check that the tracker repository and token are configured.
    Check,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Crate targets the default filter applies to.
const LOG_TARGETS: &[&str] = &[
    "navsphere",
    "navsphere_shared",
    "navsphere_core",
    "navsphere_review",
];

fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    // Logs go to stderr so `render` output stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
    match cli.command {
        Command::Render {
            navigation,
            site,
            resolve_icons,
            pretty,
        } => cmd_render(navigation, site, resolve_icons, pretty),
        Command::Check { navigation, site } => cmd_check(navigation, site.as_deref()),
        Command::Review {
            number,
            approve,
            reject: _,
            reason,
            issues,
            data,
            reviewer,
        } => {
            let action = if approve {
                ReviewAction::Approve
            } else {
                ReviewAction::Reject { reason }
            };
            cmd_review(number, action, issues, data, reviewer).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Check => cmd_config_check(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_render(
    navigation: Option<PathBuf>,
    site: Option<PathBuf>,
    resolve_icons: bool,
    pretty: bool,
) -> Result<()> {
    let config = load_config()?;
    let navigation = navigation.unwrap_or_else(|| config.data.navigation_path.clone().into());
    let site = site.unwrap_or_else(|| config.data.site_path.clone().into());

    let mut data = navsphere_core::load_files(&navigation, &site)?;
    if resolve_icons {
        data.tree = resolve_tree_icons(&data.tree);
    }

    let document = serde_json::json!({
        "site": data.site,
        "navigation": data.tree,
    });
    let output = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{output}");

    Ok(())
}

fn cmd_check(navigation: Option<PathBuf>, site: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let navigation = navigation.unwrap_or_else(|| config.data.navigation_path.clone().into());

    let raw = navsphere_core::read_navigation(&navigation)?;
    let tree = navsphere_core::normalize_tree(&raw);
    let visible = navsphere_core::filter_tree(&tree);

    if let Some(site) = site {
        let raw_site = navsphere_core::read_site(site)?;
        let settings = navsphere_core::normalize_site(&raw_site);
        println!(
            "  Site:     theme={} linkTarget={}",
            settings.appearance.theme.as_str(),
            settings.navigation.link_target.as_str()
        );
    }

    print_stats("Source", &tree.stats());
    print_stats("Visible", &visible.stats());
    info!(path = %navigation.display(), "navigation data is valid");

    Ok(())
}

fn print_stats(label: &str, stats: &TreeStats) {
    println!(
        "  {label:<8}  categories={} subcategories={} links={} videos={} disabled={}",
        stats.categories, stats.subcategories, stats.links, stats.videos, stats.disabled
    );
}

async fn cmd_review(
    number: u64,
    action: ReviewAction,
    issues: PathBuf,
    data: Option<String>,
    reviewer: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let review_config = review_config(&config, data, reviewer);

    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    let tracker = LocalTracker::new(issues, cwd);
    let workflow = ReviewWorkflow::new(tracker, review_config);

    let outcome = match workflow.review(number, &action).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.data_committed() {
                warn!(
                    issue = number,
                    step = %err.step,
                    "navigation data was already updated; finish the issue by hand"
                );
            }
            return Err(err.into());
        }
    };

    println!();
    if outcome.approved {
        println!("  Submission #{number} approved.");
        if let Some(placement) = &outcome.placement {
            println!("  Added to: {placement}");
        }
        if let Some(id) = &outcome.item_id {
            println!("  Link id:  {id}");
        }
    } else {
        println!("  Submission #{number} rejected.");
    }
    println!();

    Ok(())
}

fn review_config(
    config: &AppConfig,
    data: Option<String>,
    reviewer: Option<String>,
) -> ReviewConfig {
    let mut review = ReviewConfig::from(config);
    if let Some(data) = data {
        review.data_path = data;
    }
    if let Some(reviewer) = reviewer {
        review.reviewer = reviewer;
    }
    review
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_check() -> Result<()> {
    let config = load_config()?;
    validate_token(&config)?;
    println!(
        "Tracker {}/{} configured; token read from ${}.",
        config.tracker.owner, config.tracker.repo, config.tracker.token_env
    );
    Ok(())
}
