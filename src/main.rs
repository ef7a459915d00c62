use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use offerdash::cli::{self, AnalyticsArgs, OfferArgs, OutputFormat};
use offerdash::config;
use offerdash::logging;
use offerdash::offers::ScaleStatus;
use offerdash::offers::store::OfferFilter;
use offerdash::web::{self, WebState};

#[derive(Debug, Parser)]
#[command(name = "offerdash")]
#[command(about = "Track advertising offers, their scale status and profitability")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List offers, newest first
    List {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        niche: Option<String>,
        #[arg(long, value_parser = cli::parse_status)]
        status: Option<ScaleStatus>,
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one offer with its links
    Show { id: String },
    /// Create an offer
    Add {
        #[command(flatten)]
        fields: OfferArgs,
    },
    /// Change fields of an offer
    Edit {
        id: String,
        #[command(flatten)]
        fields: OfferArgs,
    },
    /// Delete an offer
    Delete { id: String },
    /// Show the scale-status board
    Board,
    /// Move an offer to another board column
    Move {
        id: String,
        #[arg(value_parser = cli::parse_status)]
        status: ScaleStatus,
    },
    /// Period metrics, trends, rankings and top offers
    Analytics {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD); defaults to `from`
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// The last N days ending today (ignored with --from)
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        niche: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Profit and ROI for a cost/revenue pair
    Roi {
        #[arg(long, value_parser = cli::parse_amount)]
        cost: f64,
        #[arg(long, value_parser = cli::parse_amount)]
        revenue: f64,
    },
    /// Export all offers as CSV
    Export {
        /// Output file, or `-` for stdout (default: ofertas-<date>.csv)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Import offers from a CSV file (`-` for stdin)
    Import { file: PathBuf },
    /// Fetch a sales page's title and preview image
    Spy {
        url: String,
        /// Save the result as a new offer
        #[arg(long)]
        add: bool,
    },
    /// Ask the AI mentor (interactive without a message)
    Chat {
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Start the web dashboard
    Web {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Show recent offer changes
    Activity {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Check config, data dir, store and chat setup
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective merged configuration
    Show,
    /// Write a default config file to ~/.offerdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `analytics.default_days 7`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();
    logging::init(&cfg.logging);

    match app.command {
        Commands::List {
            platform,
            niche,
            status,
            search,
            format,
        } => {
            let filter = OfferFilter {
                platform,
                niche,
                status,
                search,
            };
            cli::run_list(&cfg, &filter, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Show { id } => cli::run_show(&cfg, &id),
        Commands::Add { fields } => cli::run_add(&cfg, fields),
        Commands::Edit { id, fields } => cli::run_edit(&cfg, &id, fields),
        Commands::Delete { id } => cli::run_delete(&cfg, &id),
        Commands::Board => cli::run_board(&cfg),
        Commands::Move { id, status } => cli::run_move(&cfg, &id, status),
        Commands::Analytics {
            from,
            to,
            days,
            platform,
            niche,
            format,
        } => {
            let args = AnalyticsArgs {
                from,
                to,
                days,
                platform,
                niche,
            };
            cli::run_analytics(&cfg, &args, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Roi { cost, revenue } => cli::run_roi(cost, revenue),
        Commands::Export { output } => cli::run_export(&cfg, output.as_deref()),
        Commands::Import { file } => cli::run_import(&cfg, &file),
        Commands::Spy { url, add } => cli::run_spy(&cfg, &url, add),
        Commands::Chat { message } => {
            let message = message.join(" ");
            let message = message.trim();
            cli::run_chat(&cfg, (!message.is_empty()).then_some(message))
        }
        Commands::Web { addr, open } => {
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            let open = open || cfg.web.open_browser;
            web::serve(WebState::from_config(cfg), &addr, open)
        }
        Commands::Activity { limit } => cli::run_activity(&cfg, limit),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
