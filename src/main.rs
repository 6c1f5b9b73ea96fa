mod display;

use anyhow::Context;
use clap::Parser;
use counterpick::{Config, DataDragonClient, RecommendationService, Role, RosterCache};
use display::output::{display_champion, display_error, display_info, display_recommendations, display_roster};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "counterpick")]
#[command(about = "Recommend counter picks against an enemy champion", long_about = None)]
struct Args {
    /// Enemy champion (name, id, or part of a name)
    #[arg(required_unless_present = "list")]
    enemy: Option<String>,

    /// Your lane: top, jungle, mid, adc, support (default: top)
    #[arg(short, long)]
    role: Option<Role>,

    /// Number of picks to display
    #[arg(short, long, default_value = "6")]
    top_n: usize,

    /// Show the enemy's champion data instead of counters
    #[arg(long)]
    info: bool,

    /// List the roster (filtered by --role if given)
    #[arg(long)]
    list: bool,

    /// Show how each pick's score is made up
    #[arg(long)]
    explain: bool,

    /// Data Dragon locale (overrides DDRAGON_LOCALE)
    #[arg(long)]
    locale: Option<String>,

    /// Roster fetch timeout in seconds (overrides ROSTER_FETCH_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// More log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info,counterpick=info",
        _ => "debug,counterpick=debug",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if let Some(secs) = args.timeout {
        config = config
            .with_fetch_timeout_secs(secs)
            .context("applying --timeout")?;
    }

    let policy = config.cache_policy();
    let client = DataDragonClient::new(config);
    let cache = Arc::new(RosterCache::new(Arc::new(client), policy));
    let service = RecommendationService::new(Arc::clone(&cache));

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Loading champion data from Data Dragon");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let warmed = cache.get_roster();
    spinner.finish_and_clear();
    let roster = warmed.context("fetching champion roster")?;
    display_info(&format!(
        "Patch {} ({} champions)",
        roster.snapshot.version(),
        roster.snapshot.len()
    ));

    if args.list {
        let listing = service.list_champions(args.role)?;
        display_roster(&listing);
        return Ok(());
    }

    let enemy = args.enemy.unwrap_or_default();

    if args.info {
        let lookup = service.find_champion(&enemy)?;
        display_champion(&lookup);
        return Ok(());
    }

    let role = args.role.unwrap_or(Role::Top);
    let recommendation = service.recommend(&enemy, role, args.top_n)?;
    display_recommendations(&recommendation, args.explain);

    Ok(())
}
