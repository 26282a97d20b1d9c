//! TrustLend CLI — `tl` command.
//!
//! Manage your profile and trust circle, publish items, browse what your
//! network lends, and request or approve bookings from the command line.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use trustlend::booking::rental_days;
use trustlend::config::{default_data_dir, MarketConfig};
use trustlend::time::{micros_to_rfc3339, parse_date};
use trustlend::{BookingId, Decision, ItemId, Marketplace, Profile, UserId};

/// Environment variable naming the acting user when `--user` is absent.
const USER_ENV: &str = "TRUSTLEND_USER";

// ── CLI structure ─────────────────────────────────────────────────────────────

/// TrustLend CLI — lend and borrow within your trust network.
#[derive(Parser, Debug)]
#[command(
    name = "tl",
    about = "TrustLend CLI",
    version,
    long_about = "tl — TrustLend CLI\n\nFollow people you trust, publish items, see how closely you are\nconnected to every owner, and book items without double-booking."
)]
struct Cli {
    /// Data directory (default: $TRUSTLEND_HOME or ~/.trustlend)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Acting user id (default: $TRUSTLEND_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage public profiles
    Profile {
        #[command(subcommand)]
        subcommand: ProfileCommands,
    },

    /// Manage who you trust
    Trust {
        #[command(subcommand)]
        subcommand: TrustCommands,
    },

    /// Publish and list your items
    Item {
        #[command(subcommand)]
        subcommand: ItemCommands,
    },

    /// Browse every item with your handshake level to its owner
    Discover {
        /// Closest owners first
        #[arg(long)]
        ranked: bool,
    },

    /// Request, decide and inspect bookings
    Book {
        #[command(subcommand)]
        subcommand: BookCommands,
    },

    /// Show or write the configuration
    Config {
        /// Write the effective configuration to {home}/config.json
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommands {
    /// Register or update the acting user's profile
    Set {
        /// Display name
        #[arg(long)]
        name: String,

        /// Contact details shown to owners of items you request
        #[arg(long, default_value = "")]
        contact: String,
    },

    /// Show a profile (default: the acting user)
    Show {
        /// User id to show
        id: Option<String>,
    },

    /// Search profiles by display name
    Search {
        /// At least three characters
        query: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum TrustCommands {
    /// Trust another user
    Add {
        /// User id to trust
        #[arg(id = "target_user", value_name = "USER")]
        user: String,

        /// Opaque strength, 1 or more
        #[arg(long, default_value_t = 1)]
        strength: u32,
    },

    /// Stop trusting a user
    Revoke {
        /// User id to stop trusting
        #[arg(id = "target_user", value_name = "USER")]
        user: String,
    },

    /// List the users you trust
    List {
        /// List the users who trust you instead
        #[arg(long)]
        followers: bool,
    },

    /// Show your handshake level to a user
    Level {
        /// Target user id
        #[arg(id = "target_user", value_name = "USER")]
        user: String,
    },

    /// Show the shortest trust path to a user
    Path {
        /// Target user id
        #[arg(id = "target_user", value_name = "USER")]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
enum ItemCommands {
    /// Publish an item for rent
    Publish {
        #[arg(long)]
        title: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Price per day
        #[arg(long, allow_hyphen_values = true)]
        price: f64,
    },

    /// List your items
    List,

    /// Show the dates an item is blocked on
    Blocked {
        /// Item id
        item: String,
    },
}

#[derive(Subcommand, Debug)]
enum BookCommands {
    /// Request an item for an inclusive date range
    Request {
        /// Item id
        item: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// Confirm or cancel a booking on one of your items
    Decide {
        /// Booking id
        booking: String,

        /// confirm or cancel
        decision: String,
    },

    /// List the bookings you requested
    Mine,

    /// List requests on your items
    Incoming,

    /// Price a booking, or a price and range
    Quote {
        /// Booking id
        booking: Option<String>,

        /// Price per day (instead of a booking id)
        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },
}

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Ctx {
    market: Marketplace,
    user: Option<UserId>,
    json: bool,
    verbose: bool,
}

impl Ctx {
    fn acting_user(&self) -> Result<&UserId> {
        self.user
            .as_ref()
            .ok_or_else(|| anyhow!("no acting user: pass --user or set {USER_ENV}"))
    }
}

fn open_market(home: Option<PathBuf>) -> Result<Marketplace> {
    let home = home.unwrap_or_else(default_data_dir);
    let config = MarketConfig::load(&home)
        .with_context(|| format!("failed to load config from {}", home.display()))?;
    Marketplace::open(config)
        .with_context(|| format!("failed to open data directory {}", home.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn parse_day(s: &str, flag: &str) -> Result<chrono::NaiveDate> {
    parse_date(s).with_context(|| format!("invalid --{flag} value: '{s}'"))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { save } = cli.command {
        return cmd_config(cli.home, save, cli.json);
    }

    let ctx = Ctx {
        market: open_market(cli.home)?,
        user: cli
            .user
            .or_else(|| std::env::var(USER_ENV).ok())
            .filter(|u| !u.trim().is_empty())
            .map(UserId::from),
        json: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Profile { subcommand } => match subcommand {
            ProfileCommands::Set { name, contact } => cmd_profile_set(&ctx, &name, &contact),
            ProfileCommands::Show { id } => cmd_profile_show(&ctx, id.as_deref()),
            ProfileCommands::Search { query, limit } => cmd_profile_search(&ctx, &query, limit),
        },
        Commands::Trust { subcommand } => match subcommand {
            TrustCommands::Add { user, strength } => cmd_trust_add(&ctx, &user, strength),
            TrustCommands::Revoke { user } => cmd_trust_revoke(&ctx, &user),
            TrustCommands::List { followers } => cmd_trust_list(&ctx, followers),
            TrustCommands::Level { user } => cmd_trust_level(&ctx, &user),
            TrustCommands::Path { user } => cmd_trust_path(&ctx, &user),
        },
        Commands::Item { subcommand } => match subcommand {
            ItemCommands::Publish {
                title,
                lat,
                lng,
                price,
            } => cmd_item_publish(&ctx, &title, lat, lng, price),
            ItemCommands::List => cmd_item_list(&ctx),
            ItemCommands::Blocked { item } => cmd_item_blocked(&ctx, &item),
        },
        Commands::Discover { ranked } => cmd_discover(&ctx, ranked),
        Commands::Book { subcommand } => match subcommand {
            BookCommands::Request { item, start, end } => {
                cmd_book_request(&ctx, &item, &start, &end)
            }
            BookCommands::Decide { booking, decision } => {
                cmd_book_decide(&ctx, &booking, &decision)
            }
            BookCommands::Mine => cmd_book_mine(&ctx),
            BookCommands::Incoming => cmd_book_incoming(&ctx),
            BookCommands::Quote {
                booking,
                price,
                start,
                end,
            } => cmd_book_quote(
                &ctx,
                booking.as_deref(),
                price,
                start.as_deref(),
                end.as_deref(),
            ),
        },
        Commands::Config { .. } => Ok(()),
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// `tl config [--save]`
fn cmd_config(home: Option<PathBuf>, save: bool, json: bool) -> Result<()> {
    let home = home.unwrap_or_else(default_data_dir);
    let config = MarketConfig::load(&home)
        .with_context(|| format!("failed to load config from {}", home.display()))?;

    if save {
        config.save().context("failed to write config")?;
    }

    if json {
        return print_json(&config);
    }

    println!("Data dir:             {}", config.data_dir.display());
    println!("Search min chars:     {}", config.search_min_chars);
    println!("Search default limit: {}", config.search_default_limit);
    println!("Forbid self booking:  {}", config.forbid_self_booking);
    if save {
        println!("Saved.");
    }
    Ok(())
}

// ── Profile ───────────────────────────────────────────────────────────────────

/// `tl profile set --name NAME [--contact CONTACT]`
fn cmd_profile_set(ctx: &Ctx, name: &str, contact: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let profile = Profile::new(user.clone(), name, contact);
    ctx.market
        .register_profile(profile.clone())
        .context("failed to save profile")?;

    if ctx.json {
        return print_json(&profile);
    }
    println!("Profile saved");
    println!("  User:    {}", profile.id);
    println!("  Name:    {}", profile.display_name);
    if !profile.contact.is_empty() {
        println!("  Contact: {}", profile.contact);
    }
    Ok(())
}

/// `tl profile show [ID]`
fn cmd_profile_show(ctx: &Ctx, id: Option<&str>) -> Result<()> {
    let id = match id {
        Some(id) => UserId::from(id),
        None => ctx.acting_user()?.clone(),
    };
    let profile = ctx
        .market
        .profile(&id)?
        .ok_or_else(|| anyhow!("no profile for '{id}'"))?;

    if ctx.json {
        return print_json(&profile);
    }
    println!("User:    {}", profile.id);
    println!("Name:    {}", profile.display_name);
    println!("Contact: {}", profile.contact);
    Ok(())
}

/// `tl profile search QUERY [--limit N]`
fn cmd_profile_search(ctx: &Ctx, query: &str, limit: Option<usize>) -> Result<()> {
    let results = ctx
        .market
        .search_profiles(query, ctx.user.as_ref(), limit)?;

    if ctx.json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    println!("{:<24} NAME", "USER");
    println!("{}", "-".repeat(56));
    for p in &results {
        println!("{:<24} {}", p.id, p.display_name);
    }
    Ok(())
}

// ── Trust ─────────────────────────────────────────────────────────────────────

/// `tl trust add USER [--strength N]`
fn cmd_trust_add(ctx: &Ctx, target: &str, strength: u32) -> Result<()> {
    let user = ctx.acting_user()?;
    let edge = ctx
        .market
        .add_trust_edge(user, &UserId::from(target), strength)?;

    if ctx.json {
        return print_json(&edge);
    }
    println!("Trusting {}", edge.following);
    if ctx.verbose {
        println!("  Edge ID:  {}", edge.id);
        println!("  Strength: {}", edge.strength.get());
        println!("  Since:    {}", micros_to_rfc3339(edge.created_at));
    }
    Ok(())
}

/// `tl trust revoke USER`
fn cmd_trust_revoke(ctx: &Ctx, target: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let removed = ctx
        .market
        .revoke_trust_edge(user, &UserId::from(target))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "revoked": removed }));
    }
    if removed {
        println!("No longer trusting {target}");
    } else {
        println!("You were not trusting {target}");
    }
    Ok(())
}

/// `tl trust list [--followers]`
fn cmd_trust_list(ctx: &Ctx, followers: bool) -> Result<()> {
    let user = ctx.acting_user()?;
    let people = if followers {
        ctx.market.list_followers(user)
    } else {
        ctx.market.list_outgoing_trust(user)
    };

    if ctx.json {
        return print_json(&people);
    }

    let title = if followers { "Trusted by" } else { "Trusting" };
    println!("{title} ({}):", people.len());
    if people.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for p in &people {
        if ctx.verbose && !p.contact.is_empty() {
            println!("  {:<24} {} <{}>", p.id, p.display_name, p.contact);
        } else {
            println!("  {:<24} {}", p.id, p.display_name);
        }
    }
    Ok(())
}

/// `tl trust level USER`
fn cmd_trust_level(ctx: &Ctx, target: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let level = ctx.market.handshake_level(user, &UserId::from(target));

    if ctx.json {
        return print_json(&serde_json::json!({
            "level": level.as_u8(),
            "label": level.as_str(),
        }));
    }
    println!("{} ({})", level.as_u8(), level);
    Ok(())
}

/// `tl trust path USER`
fn cmd_trust_path(ctx: &Ctx, target: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let path = ctx.market.trust_path(user, &UserId::from(target));

    if ctx.json {
        return print_json(&path);
    }
    match path {
        Some(hops) => {
            let names: Vec<&str> = hops.iter().map(|u| u.as_str()).collect();
            println!("{}", names.join(" -> "));
        }
        None => println!("No trust path within 3 hops."),
    }
    Ok(())
}

// ── Items ─────────────────────────────────────────────────────────────────────

/// `tl item publish --title T --lat LAT --lng LNG --price P`
fn cmd_item_publish(ctx: &Ctx, title: &str, lat: f64, lng: f64, price: f64) -> Result<()> {
    let user = ctx.acting_user()?;
    let item = ctx.market.publish_item(user, title, lat, lng, price)?;

    if ctx.json {
        return print_json(&item);
    }
    println!("Item published");
    println!("  Item ID:  {}", item.id);
    println!("  Title:    {}", item.title);
    println!("  Location: {:.5}, {:.5}", item.location.lat, item.location.lng);
    println!("  Price:    {:.2}/day", item.price_per_day.get());
    Ok(())
}

/// `tl item list`
fn cmd_item_list(ctx: &Ctx) -> Result<()> {
    let user = ctx.acting_user()?;
    let items = ctx.market.list_my_items(user);

    if ctx.json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("You have not published any items.");
        return Ok(());
    }
    println!("{:<30} {:<10} TITLE", "ITEM ID", "PRICE");
    println!("{}", "-".repeat(72));
    for item in &items {
        println!(
            "{:<30} {:<10.2} {}",
            item.id,
            item.price_per_day.get(),
            item.title
        );
    }
    Ok(())
}

/// `tl item blocked ITEM`
fn cmd_item_blocked(ctx: &Ctx, item: &str) -> Result<()> {
    let item_id = ItemId(item.to_string());
    ctx.market.item(&item_id)?;
    let days = ctx.market.list_blocked_dates(&item_id);

    if ctx.json {
        return print_json(&days);
    }
    if days.is_empty() {
        println!("No blocked dates.");
        return Ok(());
    }
    for day in &days {
        println!("{day}");
    }
    Ok(())
}

/// `tl discover [--ranked]`
fn cmd_discover(ctx: &Ctx, ranked: bool) -> Result<()> {
    let user = ctx.acting_user()?;
    let visible = if ranked {
        ctx.market.rank_visible_items(user)
    } else {
        ctx.market.list_visible_items(user)
    };

    if ctx.json {
        return print_json(&visible);
    }
    if visible.is_empty() {
        println!("No items listed yet.");
        return Ok(());
    }
    println!(
        "{:<30} {:<18} {:<10} {:<16} TITLE",
        "ITEM ID", "HANDSHAKE", "PRICE", "OWNER"
    );
    println!("{}", "-".repeat(96));
    for v in &visible {
        let owner = if v.is_own_item {
            format!("{} (you)", v.item.owner)
        } else {
            v.item.owner.to_string()
        };
        println!(
            "{:<30} {:<18} {:<10.2} {:<16} {}",
            v.item.id,
            format!("{} {}", v.handshake_level.as_u8(), v.handshake_level),
            v.item.price_per_day.get(),
            owner,
            v.item.title
        );
    }
    Ok(())
}

// ── Bookings ──────────────────────────────────────────────────────────────────

/// `tl book request ITEM --start DATE --end DATE`
fn cmd_book_request(ctx: &Ctx, item: &str, start: &str, end: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let start = parse_day(start, "start")?;
    let end = parse_day(end, "end")?;
    let booking = ctx
        .market
        .request_booking(&ItemId(item.to_string()), user, start, end)?;

    if ctx.json {
        return print_json(&booking);
    }
    println!("Booking requested");
    println!("  Booking ID: {}", booking.id);
    println!("  Item:       {}", booking.item_id);
    println!("  Dates:      {}", booking.range());
    println!("  Status:     {}", booking.status);
    Ok(())
}

/// `tl book decide BOOKING confirm|cancel`
fn cmd_book_decide(ctx: &Ctx, booking: &str, decision: &str) -> Result<()> {
    let user = ctx.acting_user()?;
    let decision: Decision = decision
        .parse()
        .with_context(|| format!("invalid decision '{decision}'"))?;
    let booking = ctx
        .market
        .decide_booking(&BookingId(booking.to_string()), user, decision)?;

    if ctx.json {
        return print_json(&booking);
    }
    println!("Booking {} is now {}", booking.id, booking.status);
    if ctx.verbose {
        if let Some(at) = booking.decided_at {
            println!("  Decided at: {}", micros_to_rfc3339(at));
        }
    }
    Ok(())
}

/// `tl book mine`
fn cmd_book_mine(ctx: &Ctx) -> Result<()> {
    let user = ctx.acting_user()?;
    let bookings = ctx.market.list_my_bookings(user);

    if ctx.json {
        return print_json(&bookings);
    }
    if bookings.is_empty() {
        println!("You have no bookings.");
        return Ok(());
    }
    println!(
        "{:<30} {:<24} {:<10} {:<10} ITEM",
        "BOOKING ID", "DATES", "STATUS", "TOTAL"
    );
    println!("{}", "-".repeat(96));
    for s in &bookings {
        println!(
            "{:<30} {:<24} {:<10} {:<10.2} {}",
            s.booking.id,
            s.booking.range().to_string(),
            s.booking.status.as_str(),
            s.total_price,
            s.item_title
        );
    }
    Ok(())
}

/// `tl book incoming`
fn cmd_book_incoming(ctx: &Ctx) -> Result<()> {
    let user = ctx.acting_user()?;
    let requests = ctx.market.list_incoming_requests(user);

    if ctx.json {
        return print_json(&requests);
    }
    if requests.is_empty() {
        println!("No requests on your items.");
        return Ok(());
    }
    println!(
        "{:<30} {:<24} {:<10} {:<20} ITEM",
        "BOOKING ID", "DATES", "STATUS", "BORROWER"
    );
    println!("{}", "-".repeat(100));
    for r in &requests {
        println!(
            "{:<30} {:<24} {:<10} {:<20} {}",
            r.booking.id,
            r.booking.range().to_string(),
            r.booking.status.as_str(),
            r.borrower.display_name,
            r.item_title
        );
        if ctx.verbose && !r.borrower.contact.is_empty() {
            println!("    Contact: {}", r.borrower.contact);
        }
    }
    Ok(())
}

/// `tl book quote BOOKING` or `tl book quote --price P --start DATE --end DATE`
fn cmd_book_quote(
    ctx: &Ctx,
    booking: Option<&str>,
    price: Option<f64>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let (total, days) = match (booking, price, start, end) {
        (Some(id), None, _, _) => {
            let id = BookingId(id.to_string());
            let booking = ctx.market.booking(&id)?;
            let total = ctx.market.quote_booking(&id)?;
            (total, rental_days(booking.start_date, booking.end_date))
        }
        (None, Some(price), Some(start), Some(end)) => {
            let start = parse_day(start, "start")?;
            let end = parse_day(end, "end")?;
            (ctx.market.quote(price, start, end)?, rental_days(start, end))
        }
        _ => {
            return Err(anyhow!(
                "pass either a booking id or --price with --start and --end"
            ))
        }
    };

    if ctx.json {
        return print_json(&serde_json::json!({ "days": days, "total": total }));
    }
    println!("{days} day(s): {total:.2}");
    Ok(())
}
