//! CLI command implementations for offerdash.
//!
//! Provides subcommand handlers for:
//! - `offerdash list|show|add|edit|delete`: the offer library
//! - `offerdash board|move`: the scale-status Kanban board
//! - `offerdash analytics`: period metrics, trends and rankings
//! - `offerdash export|import`: CSV exchange
//! - `offerdash spy|chat|roi`: tools
//! - `offerdash activity|health`: diagnostics
//! - `offerdash config show|init|set|reset`: configuration management

use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;

use crate::activity::{ActivityKind, ActivityLog, AuditedStore};
use crate::analytics::metrics::{Metrics, roi_calculator};
use crate::analytics::period::{self, DateRange};
use crate::analytics::{self, AnalyticsData, AnalyticsQuery, offset_from_minutes};
use crate::chat::{HistoryItem, OpenRouterClient, Sender};
use crate::config::{self, OfferdashConfig};
use crate::offers::board::{self, Board, Moved};
use crate::offers::csv_io;
use crate::offers::store::{JsonFileStore, OfferFilter, OfferStore};
use crate::offers::{NewOffer, Offer, OfferLinks, OfferPatch, ScaleStatus};
use crate::spy;

/// Output format for listing and analytics commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// The on-disk store for the configured data dir, with activity logging when
/// enabled.
pub fn open_store(cfg: &OfferdashConfig) -> AuditedStore<JsonFileStore> {
    let data_dir = cfg.general.data_dir_path();
    AuditedStore::new(JsonFileStore::in_dir(&data_dir), activity_log(cfg))
}

fn activity_log(cfg: &OfferdashConfig) -> ActivityLog {
    if cfg.logging.activity_log {
        ActivityLog::in_dir(&cfg.general.data_dir_path())
    } else {
        ActivityLog::disabled()
    }
}

// ---------------------------------------------------------------------------
// Offer field arguments
// ---------------------------------------------------------------------------

/// Offer fields shared by `add` and `edit`.
#[derive(Debug, Clone, Default, Args)]
pub struct OfferArgs {
    /// Offer name (at least 2 characters)
    #[arg(long)]
    pub name: Option<String>,
    /// Ad platform, e.g. "Google Ads"
    #[arg(long)]
    pub platform: Option<String>,
    /// Market niche
    #[arg(long)]
    pub niche: Option<String>,
    /// Amount spent, in R$ (comma decimals accepted)
    #[arg(long, value_parser = parse_amount)]
    pub cost: Option<f64>,
    /// Amount earned, in R$ (comma decimals accepted)
    #[arg(long, value_parser = parse_amount)]
    pub revenue: Option<f64>,
    /// Scale status: Inicio, "Pré escala", Escalando, ESCALADISSIMA
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ScaleStatus>,
    /// Cover image URL
    #[arg(long)]
    pub image_url: Option<String>,
    /// Sales page URL
    #[arg(long)]
    pub sales_page: Option<String>,
    /// Checkout URL
    #[arg(long)]
    pub checkout: Option<String>,
    /// Upsell page URL (repeatable, up to 7)
    #[arg(long = "upsell")]
    pub upsells: Vec<String>,
    /// Thank-you page URL
    #[arg(long)]
    pub thank_you: Option<String>,
    /// Drive folder URL
    #[arg(long)]
    pub drive: Option<String>,
    /// Ad library URL
    #[arg(long)]
    pub ad_library: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl OfferArgs {
    fn has_links(&self) -> bool {
        self.sales_page.is_some()
            || self.checkout.is_some()
            || !self.upsells.is_empty()
            || self.thank_you.is_some()
            || self.drive.is_some()
            || self.ad_library.is_some()
    }

    fn links(&self) -> OfferLinks {
        OfferLinks {
            sales_page_link: self.sales_page.clone(),
            checkout_link: self.checkout.clone(),
            upsell_links: self.upsells.clone(),
            thank_you_page_link: self.thank_you.clone(),
            drive_link: self.drive.clone(),
            ad_library_link: self.ad_library.clone(),
        }
    }

    pub fn into_new_offer(self) -> NewOffer {
        let links = self.links();
        NewOffer {
            name: self.name.unwrap_or_default(),
            image_url: self.image_url,
            platform: self.platform,
            niche: self.niche,
            cost: self.cost,
            revenue: self.revenue,
            scale_status: self.status,
            links,
            observations: self.notes,
        }
    }

    /// Patch touching only the flags that were given. Any link flag replaces
    /// the whole link set, merged over the offer's current links.
    pub fn into_patch(self, current: &Offer) -> OfferPatch {
        let links = self.has_links().then(|| {
            let given = self.links();
            let now = &current.links;
            OfferLinks {
                sales_page_link: given.sales_page_link.or_else(|| now.sales_page_link.clone()),
                checkout_link: given.checkout_link.or_else(|| now.checkout_link.clone()),
                upsell_links: if given.upsell_links.is_empty() {
                    now.upsell_links.clone()
                } else {
                    given.upsell_links
                },
                thank_you_page_link: given
                    .thank_you_page_link
                    .or_else(|| now.thank_you_page_link.clone()),
                drive_link: given.drive_link.or_else(|| now.drive_link.clone()),
                ad_library_link: given.ad_library_link.or_else(|| now.ad_library_link.clone()),
            }
        });
        OfferPatch {
            name: self.name,
            image_url: self.image_url,
            platform: self.platform,
            niche: self.niche,
            cost: self.cost,
            revenue: self.revenue,
            scale_status: self.status,
            links,
            observations: self.notes,
        }
    }
}

/// Parse a money amount, accepting `1234.5`, `1234,5` and a leading `R$`.
pub fn parse_amount(raw: &str) -> std::result::Result<f64, String> {
    let cleaned = raw.trim().trim_start_matches("R$").trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{raw}' is not a valid amount"))
}

/// Parse a scale status label (case and accent insensitive).
pub fn parse_status(raw: &str) -> std::result::Result<ScaleStatus, String> {
    ScaleStatus::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = ScaleStatus::ALL.iter().map(|s| s.label()).collect();
        format!("unknown status '{raw}' (expected one of: {})", known.join(", "))
    })
}

// ---------------------------------------------------------------------------
// offerdash list | show | add | edit | delete
// ---------------------------------------------------------------------------

/// List offers, newest first.
pub fn run_list(cfg: &OfferdashConfig, filter: &OfferFilter, format: OutputFormat) -> Result<()> {
    let offers = open_store(cfg).list(filter)?;

    if offers.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No offers found. Add one with `offerdash add --name ...`.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&offers)?),
        OutputFormat::Csv => {
            let offset = offset_from_minutes(cfg.analytics.utc_offset_minutes);
            print!("{}", csv_io::export_to_string(&offers, &offset)?);
        }
        OutputFormat::Table => print_offers_table(&offers),
    }
    Ok(())
}

fn print_offers_table(offers: &[Offer]) {
    println!("{}", format!("Offers ({})", offers.len()).bold().cyan());
    println!("{}", "=".repeat(100));
    println!(
        "  {:<8} {:<26} {:<14} {:<14} {:<13} {:>14} {:>7}",
        "Id", "Name", "Platform", "Niche", "Status", "Profit", "ROI"
    );
    println!("  {}", "-".repeat(98));

    for (i, offer) in offers.iter().enumerate() {
        let line = format!(
            "  {:<8} {:<26} {:<14} {:<14} {:<13} {:>14} {:>6.1}%",
            short_id(&offer.id),
            truncate(&offer.name, 26),
            truncate(offer.platform_key(), 14),
            truncate(offer.niche_display(), 14),
            truncate(offer.scale_status.label(), 13),
            format_currency(offer.profit()),
            offer.roi(),
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

/// Show one offer with all its links.
pub fn run_show(cfg: &OfferdashConfig, id: &str) -> Result<()> {
    let offer = open_store(cfg).get(id)?;
    print_offer_detail(&offer);
    Ok(())
}

fn print_offer_detail(offer: &Offer) {
    println!("{}", offer.name.bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Id:        ".bold(), offer.id);
    println!("  {} {}", "Status:    ".bold(), offer.scale_status.title());
    println!("  {} {}", "Platform:  ".bold(), offer.platform_key());
    println!("  {} {}", "Niche:     ".bold(), offer.niche_display());
    println!(
        "  {} {}",
        "Created:   ".bold(),
        offer.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    if offer.has_financials() {
        println!("  {} {}", "Cost:      ".bold(), format_currency(offer.cost_or_zero()));
        println!(
            "  {} {}",
            "Revenue:   ".bold(),
            format_currency(offer.revenue_or_zero())
        );
        println!("  {} {}", "Profit:    ".bold(), colorize_money(offer.profit()));
        println!("  {} {:.1}%", "ROI:       ".bold(), offer.roi());
    }
    if let Some(url) = &offer.image_url {
        println!("  {} {}", "Image:     ".bold(), url);
    }

    let links = offer.links.labelled();
    if !links.is_empty() {
        println!();
        println!("{}", "Links".bold().cyan());
        for (label, url) in links {
            println!("  {:<24} {}", label, url.dimmed());
        }
    }
    if let Some(notes) = &offer.observations {
        println!();
        println!("{}", "Notes".bold().cyan());
        println!("  {notes}");
    }
}

/// Create an offer.
pub fn run_add(cfg: &OfferdashConfig, args: OfferArgs) -> Result<()> {
    let offer = open_store(cfg).insert(args.into_new_offer())?;
    println!(
        "{} Created {} ({})",
        "✓".green().bold(),
        offer.name.bold(),
        offer.id.dimmed()
    );
    Ok(())
}

/// Edit the given fields of an offer.
pub fn run_edit(cfg: &OfferdashConfig, id: &str, args: OfferArgs) -> Result<()> {
    let store = open_store(cfg);
    let current = store.get(id)?;
    let patch = args.into_patch(&current);
    if patch.is_empty() {
        println!("{}", "Nothing to change: pass at least one field flag.".yellow());
        return Ok(());
    }
    let offer = store.update(id, patch)?;
    println!("{} Updated {}", "✓".green().bold(), offer.name.bold());
    Ok(())
}

/// Delete an offer.
pub fn run_delete(cfg: &OfferdashConfig, id: &str) -> Result<()> {
    let offer = open_store(cfg).delete(id)?;
    println!("{} Deleted {}", "✓".green().bold(), offer.name.bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// offerdash board | move
// ---------------------------------------------------------------------------

/// Print the Kanban board, one section per status column.
pub fn run_board(cfg: &OfferdashConfig) -> Result<()> {
    let board = Board::from_offers(open_store(cfg).all()?);

    for column in &board.columns {
        println!(
            "{} {}",
            column.title.bold().cyan(),
            format!(
                "({} · {})",
                column.offers.len(),
                format_currency(column.total_profit)
            )
            .dimmed()
        );
        if column.offers.is_empty() {
            println!("  {}", "empty".dimmed());
        }
        for offer in &column.offers {
            println!(
                "  {:<8} {:<30} {:>14}",
                short_id(&offer.id),
                truncate(&offer.name, 30),
                colorize_money(offer.profit()),
            );
        }
        println!();
    }
    Ok(())
}

/// Move an offer to another column.
pub fn run_move(cfg: &OfferdashConfig, id: &str, status: ScaleStatus) -> Result<()> {
    let store = open_store(cfg);
    match board::move_offer(&store, id, status)? {
        Moved::Unchanged(offer) => println!(
            "{} {} is already in {}",
            "·".dimmed(),
            offer.name.bold(),
            status.label()
        ),
        Moved::To(offer) => println!(
            "{} Moved {} to {}",
            "✓".green().bold(),
            offer.name.bold(),
            status.title()
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// offerdash analytics
// ---------------------------------------------------------------------------

/// Reporting window and category filter for `offerdash analytics`.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsArgs {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: Option<u32>,
    pub platform: Option<String>,
    pub niche: Option<String>,
}

impl AnalyticsArgs {
    /// Resolve into a query. Without `from` or `days` the configured default
    /// window ending today is used.
    pub fn query(&self, cfg: &OfferdashConfig) -> Result<AnalyticsQuery> {
        let offset = offset_from_minutes(cfg.analytics.utc_offset_minutes);
        let range = match (self.from, self.days) {
            (Some(from), _) => DateRange::new(from, self.to).limited(),
            (None, days) => DateRange::last_days(
                period::today(&offset),
                days.unwrap_or(cfg.analytics.default_days),
            ),
        }
        .context("invalid analytics window")?;
        Ok(AnalyticsQuery {
            range: Some(range),
            platform: self.platform.clone(),
            niche: self.niche.clone(),
            utc_offset: offset,
            top_offers: cfg.analytics.top_offers,
        })
    }
}

/// Compute and print the analytics report.
pub fn run_analytics(cfg: &OfferdashConfig, args: &AnalyticsArgs, format: OutputFormat) -> Result<()> {
    let query = args.query(cfg)?;
    let offers = open_store(cfg).all()?;
    let data = analytics::analyze(&offers, &query);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Csv => print_series_csv(&data),
        OutputFormat::Table => print_analytics_table(&data, args),
    }
    Ok(())
}

fn print_analytics_table(data: &AnalyticsData, args: &AnalyticsArgs) {
    let Some(range) = data.range else {
        println!("{}", "No reporting window selected.".yellow());
        return;
    };

    println!(
        "{}",
        format!("Analytics {} → {}", range.from, range.to).bold().cyan()
    );
    println!("{}", "=".repeat(60));
    if let Some(prev) = data.previous_range {
        println!(
            "  {}",
            format!("Compared with {} → {}", prev.from, prev.to).dimmed()
        );
    }
    let filters: Vec<String> = [("platform", &args.platform), ("niche", &args.niche)]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
        .collect();
    if !filters.is_empty() {
        println!("  {}", format!("Filter: {}", filters.join(", ")).dimmed());
    }
    println!();

    print_metrics(&data.current_period_metrics, data);
    println!();

    println!("{}", "Daily Performance".bold().cyan());
    println!("  {:<8} {:>14} {:>14}", "Day", "Revenue", "Cost");
    println!("  {}", "-".repeat(38));
    let active: Vec<_> = data
        .performance_over_time_data
        .iter()
        .filter(|p| p.receita != 0.0 || p.custo != 0.0)
        .collect();
    if active.is_empty() {
        println!("  {}", "no activity in this window".dimmed());
    }
    for point in active {
        println!(
            "  {:<8} {:>14} {:>14}",
            point.date,
            format_currency(point.receita),
            format_currency(point.custo),
        );
    }
    println!();

    print_ranking(
        "Profit by Platform",
        data.profit_by_platform_data
            .iter()
            .map(|p| (p.platform.as_str(), p.profit)),
        format_currency,
    );
    print_ranking(
        "Offers by Niche",
        data.offers_by_niche_data
            .iter()
            .map(|g| (g.name.as_str(), g.value)),
        |v| format!("{v:.0}"),
    );
    print_ranking(
        "Profit by Niche",
        data.profit_by_niche_data
            .iter()
            .map(|n| (n.niche.as_str(), n.profit)),
        format_currency,
    );

    println!("{}", "Top Offers".bold().cyan());
    if data.top_offers.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for (i, top) in data.top_offers.iter().enumerate() {
        println!(
            "  {}. {:<30} {:<14} {:>14}",
            i + 1,
            truncate(&top.name, 30),
            truncate(&top.platform, 14),
            colorize_money(top.profit),
        );
    }
}

fn print_metrics(current: &Metrics, data: &AnalyticsData) {
    let trends = &data.trends;
    println!(
        "  {} {:>14}  {}",
        "Revenue:".bold(),
        format_currency(current.revenue),
        colorize_trend(trends.revenue, false)
    );
    println!(
        "  {} {:>14}  {}",
        "Cost:   ".bold(),
        format_currency(current.cost),
        colorize_trend(trends.cost, true)
    );
    println!(
        "  {} {:>14}  {}",
        "Profit: ".bold(),
        format_currency(current.profit),
        colorize_trend(trends.profit, false)
    );
    println!("  {} {:>13.1}%", "ROI:    ".bold(), current.roi);
}

fn print_ranking<'a>(
    title: &str,
    rows: impl Iterator<Item = (&'a str, f64)>,
    fmt: impl Fn(f64) -> String,
) {
    println!("{}", title.bold().cyan());
    let rows: Vec<_> = rows.collect();
    if rows.is_empty() {
        println!("  {}", "none".dimmed());
    }
    let max = rows.iter().map(|(_, v)| v.abs()).fold(0.0_f64, f64::max);
    for (name, value) in rows {
        let width = if max > 0.0 {
            ((value.abs() / max) * 20.0).round() as usize
        } else {
            0
        };
        let bar = "█".repeat(width.max(1));
        let bar = if value < 0.0 { bar.red() } else { bar.blue() };
        println!("  {:<20} {:<20} {}", truncate(name, 20), bar, fmt(value));
    }
    println!();
}

fn print_series_csv(data: &AnalyticsData) {
    println!("day,revenue,cost");
    for point in &data.performance_over_time_data {
        println!("{},{:.2},{:.2}", point.day, point.receita, point.custo);
    }
}

/// Print profit and ROI for a cost/revenue pair.
pub fn run_roi(cost: f64, revenue: f64) -> Result<()> {
    let result = roi_calculator(cost, revenue)
        .context("cost and revenue must be finite numbers")?;
    println!("  {} {}", "Profit:".bold(), colorize_money(result.profit));
    println!("  {} {:.2}%", "ROI:   ".bold(), result.roi);
    Ok(())
}

// ---------------------------------------------------------------------------
// offerdash export | import
// ---------------------------------------------------------------------------

/// Export every offer as CSV. `-` writes to stdout; no path uses the dated
/// default file name in the current directory.
pub fn run_export(cfg: &OfferdashConfig, output: Option<&str>) -> Result<()> {
    let offers = open_store(cfg).all()?;
    let offset = offset_from_minutes(cfg.analytics.utc_offset_minutes);
    let csv = csv_io::export_to_string(&offers, &offset)?;

    if output == Some("-") {
        print!("{csv}");
        return Ok(());
    }

    let path = output
        .map(str::to_string)
        .unwrap_or_else(|| csv_io::export_file_name(period::today(&offset)));
    std::fs::write(&path, csv).with_context(|| format!("failed to write {path}"))?;
    println!(
        "{} Exported {} offers to {}",
        "✓".green().bold(),
        offers.len(),
        path
    );
    Ok(())
}

/// Import offers from a CSV file. `-` reads stdin.
pub fn run_import(cfg: &OfferdashConfig, path: &Path) -> Result<()> {
    let store = open_store(cfg);
    let input: Box<dyn Read> = if path == Path::new("-") {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(path).with_context(|| format!("failed to open {}", path.display()))?)
    };

    let report = csv_io::import_offers(&store, input)?;
    println!(
        "{} Imported {} offers",
        "✓".green().bold(),
        report.imported
    );
    if report.skipped > 0 {
        println!(
            "  {}",
            format!("{} rows skipped (missing name or invalid values)", report.skipped).yellow()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// offerdash spy | chat
// ---------------------------------------------------------------------------

/// Fetch a sales page's title and image. With `add`, save it as a new offer.
pub fn run_spy(cfg: &OfferdashConfig, url: &str, add: bool) -> Result<()> {
    let url = spy::normalize_url(url)?;
    let result = spy::spy(&url, &cfg.spy)?;

    println!("  {} {}", "Title:".bold(), result.title);
    println!(
        "  {} {}",
        "Image:".bold(),
        if result.image_url.is_empty() {
            "none".dimmed().to_string()
        } else {
            result.image_url.clone()
        }
    );

    if add {
        let offer = open_store(cfg).insert(NewOffer {
            name: result.title,
            image_url: Some(result.image_url),
            links: OfferLinks {
                sales_page_link: Some(url),
                ..OfferLinks::default()
            },
            ..NewOffer::default()
        })?;
        println!(
            "{} Created {} ({})",
            "✓".green().bold(),
            offer.name.bold(),
            offer.id.dimmed()
        );
    }
    Ok(())
}

/// Ask the AI mentor. With a message, answer once; otherwise start an
/// interactive session on stdin.
pub fn run_chat(cfg: &OfferdashConfig, message: Option<&str>) -> Result<()> {
    let client = OpenRouterClient::from_config(&cfg.chat)?;
    let mut history: Vec<HistoryItem> = Vec::new();

    if let Some(message) = message {
        history.push(HistoryItem::user(message));
        stream_reply(&client, &history)?;
        return Ok(());
    }

    println!(
        "{}",
        format!("AI Mentor ({}), empty line to quit", client.model())
            .bold()
            .cyan()
    );
    let stdin = io::stdin();
    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        history.push(HistoryItem::user(line.trim()));
        let reply = stream_reply(&client, &history)?;
        history.push(HistoryItem {
            sender: Sender::Ai,
            text: reply,
        });
        println!();
    }
    Ok(())
}

/// Copy the streamed reply to stdout as it arrives and return it.
fn stream_reply(client: &OpenRouterClient, history: &[HistoryItem]) -> Result<String> {
    let mut stream = client.stream_chat(history)?;
    let mut stdout = io::stdout().lock();
    let mut reply = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).context("chat stream interrupted")?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
        stdout.flush()?;
        reply.extend_from_slice(&buf[..n]);
    }
    writeln!(stdout)?;
    Ok(String::from_utf8_lossy(&reply).into_owned())
}

// ---------------------------------------------------------------------------
// offerdash activity | health
// ---------------------------------------------------------------------------

/// Show the most recent activity log entries.
pub fn run_activity(cfg: &OfferdashConfig, limit: usize) -> Result<()> {
    let log = activity_log(cfg);
    let entries = log.read_recent(limit);
    if entries.is_empty() {
        println!("{}", "No activity recorded yet.".yellow());
        return Ok(());
    }

    println!("{}", "Recent Activity".bold().cyan());
    println!("{}", "=".repeat(70));
    for entry in entries {
        let when = entry.timestamp.get(..19).unwrap_or(&entry.timestamp);
        println!(
            "  {} {:<9} {:<28} {}",
            when.dimmed(),
            colorize_kind(entry.kind),
            truncate(entry.offer_name.as_deref().unwrap_or(""), 28),
            entry.detail.as_deref().unwrap_or("").dimmed(),
        );
    }
    Ok(())
}

/// Check config files, data dir, store and chat setup.
pub fn run_health(cfg: &OfferdashConfig) -> Result<()> {
    println!("{}", "offerdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global = config::global_config_file();
    let global_exists = global.as_ref().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        global_exists,
        &if global_exists {
            format!("{} found", display_path(global.as_deref()))
        } else {
            "not found (run `offerdash config init` to create)".to_string()
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".offerdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let data_dir = cfg.general.data_dir_path();
    print_health_item("Data dir", data_dir.exists(), &data_dir.display().to_string());

    let store = open_store(cfg);
    match store.all() {
        Ok(offers) => print_health_item("Offer store", true, &format!("{} offers", offers.len())),
        Err(e) => print_health_item("Offer store", false, &e.to_string()),
    }

    let log = store.log();
    print_health_item(
        "Activity log",
        log.path().is_some(),
        &match log.path() {
            Some(_) => format!("{} entries", log.read_all().len()),
            None => "disabled".to_string(),
        },
    );

    print_health_item(
        "AI mentor",
        cfg.chat.has_api_key(),
        &if cfg.chat.has_api_key() {
            format!("model {}", cfg.chat.model)
        } else {
            "no API key (set OPENROUTER_API_KEY)".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// offerdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective offerdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, name) in [
        (global_exists, "~/.offerdash/config.toml"),
        (project_exists, ".offerdash.toml"),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "OFFERDASH_* / OPENROUTER_API_KEY environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.offerdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to customize offerdash.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    let shown = if key == "chat.api_key" {
        config::mask_secret(value)
    } else {
        value.to_string()
    };
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), shown);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format an integer with `.` thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format an amount as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {},{:02}", format_number(cents / 100), cents % 100)
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn colorize_money(value: f64) -> colored::ColoredString {
    let text = format_currency(value);
    if value < 0.0 { text.red() } else { text.green() }
}

/// Trend arrow. For cost-like figures a rise is bad.
fn colorize_trend(pct: f64, cost_like: bool) -> colored::ColoredString {
    let arrow = if pct >= 0.0 { "▲" } else { "▼" };
    let text = format!("{arrow} {:.1}%", pct.abs());
    if (pct >= 0.0) != cost_like {
        text.green()
    } else {
        text.red()
    }
}

fn colorize_kind(kind: ActivityKind) -> colored::ColoredString {
    let name = kind.as_str();
    match kind {
        ActivityKind::Created | ActivityKind::Imported => name.green(),
        ActivityKind::Moved => name.blue(),
        ActivityKind::Updated => name.yellow(),
        ActivityKind::Deleted => name.red(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
