//! fleet-dashboard: headless client for the fleet management backend
//!
//! Runs each dashboard view from the terminal: the monitoring table, the
//! summary counters, the paginated GPS and dispatch feeds, and the client
//! and device listings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use fleet_dashboard::list::{ListController, PageFetcher};
use fleet_dashboard::monitor::{MonitorBoard, MonitorFetcher};
use fleet_dashboard::resources::{
    self, NewVehicle, VehicleAssignment, DISPATCH_CLIENT_FILTER, DISPATCH_FILTERS,
};
use fleet_dashboard::{
    ApiClient, AuthClient, CounterBoard, DashboardConfig, ListOptions, LiveOptions, LiveView,
    LoadOutcome, Query, Session, SkipReason,
};

#[derive(Parser)]
#[command(name = "fleet-dashboard")]
#[command(about = "Headless client for the fleet management dashboard")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fleet-dashboard.toml")]
    config: PathBuf,

    /// Backend entry point (overrides config file)
    #[arg(long, env = "FLEET_API_URL")]
    base_url: Option<String>,

    /// Session token from an earlier login
    #[arg(long, env = "FLEET_API_TOKEN", conflicts_with = "user")]
    token: Option<String>,

    /// Log in with this user before running the command
    #[arg(long, env = "FLEET_USER", requires = "password")]
    user: Option<String>,

    #[arg(long, env = "FLEET_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Terminal replication status, problems first
    Monitor {
        /// Print one snapshot and exit
        #[arg(long)]
        once: bool,
    },

    /// Client, vehicle, shift and dispatch totals
    Counters,

    /// Recently installed GPS units
    GpsFeed {
        /// Search by IMEI, client, model, ...
        #[arg(short, long)]
        search: Option<String>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Latest dispatches of one client
    Dispatches {
        /// Client code
        #[arg(long)]
        client: String,
        /// Column filter as key=value (repeatable)
        #[arg(short, long, value_parser = parse_filter)]
        filter: Vec<(String, String)>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Registered clients
    Clients {
        #[arg(long)]
        enabled_only: bool,
    },

    /// GPS devices
    Devices {
        /// Column filter as key=value (repeatable)
        #[arg(short, long, value_parser = parse_filter)]
        filter: Vec<(String, String)>,
    },

    /// Vehicles a GPS device can be assigned to, or assign it to one
    AssignVehicle {
        /// GPS device id
        #[arg(long)]
        device: i64,
        /// Assign to this existing vehicle
        #[arg(long, conflicts_with = "plate")]
        vehicle: Option<i64>,
        /// Create a vehicle with this plate and assign to it
        #[arg(long, requires_all = ["internal_number", "owner_rut"])]
        plate: Option<String>,
        #[arg(long)]
        internal_number: Option<String>,
        #[arg(long)]
        owner_rut: Option<String>,
        /// Expiry date of the new vehicle (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
    },

    /// GPS model distribution, installs per client and latest installs
    Stats {
        /// Clients to show in the installs ranking
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in {:?}", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet_dashboard=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(base_url) = cli.base_url.clone() {
        config.api.base_url = base_url;
    }
    config.validate()?;

    info!(base_url = %config.api.base_url, "Using backend");

    let api = authenticate(&cli, ApiClient::new(&config.api)?).await?;
    let list_options = ListOptions::from(&config.list);
    let live_options = LiveOptions::from(&config.live);

    match cli.command {
        Command::Monitor { once } => run_monitor(api, live_options, once, cli.json).await,
        Command::Counters => {
            let board = CounterBoard::new(&api, &live_options);
            board.refresh_all().await;
            let totals = board.totals();
            if cli.json {
                return print_json(&totals);
            }
            for (counter, total) in totals {
                match total {
                    Some(total) => println!("{:<12} {}", counter, total),
                    None => println!("{:<12} -", counter),
                }
            }
            Ok(())
        }
        Command::GpsFeed { search, pages } => {
            let feed = resources::gps_feed(api, list_options);
            let query = Query::new().with_search(search.unwrap_or_default());
            let items = load_pages(&feed, query, pages).await?;
            if cli.json {
                return print_json(&items);
            }
            for gps in &items {
                println!(
                    "{:>6}  {:<16} {:<10} {:<12} {:<24} {}",
                    gps.id,
                    gps.imei,
                    gps.model,
                    resources::format_date(&gps.assigned_at),
                    gps.client_name,
                    gps.city
                );
            }
            Ok(())
        }
        Command::Dispatches {
            client,
            filter,
            pages,
        } => {
            let feed = resources::dispatch_feed(api, list_options);
            let mut query = Query::new().with_filter(DISPATCH_CLIENT_FILTER, client);
            for (key, value) in filter {
                if !DISPATCH_FILTERS.contains(&key.as_str()) {
                    warn!(filter = %key, "Unknown dispatch filter, sending anyway");
                }
                query = query.with_filter(key, value);
            }
            let items = load_pages(&feed, query, pages).await?;
            if cli.json {
                return print_json(&items);
            }
            for d in &items {
                println!(
                    "{:>6}  {:<17} {:<8} {:<8} {:<24} {:<8} {}",
                    d.id,
                    d.departure_display(),
                    d.internal_number,
                    d.plate,
                    d.driver_name,
                    d.direction.label(),
                    d.destination
                );
            }
            Ok(())
        }
        Command::Clients { enabled_only } => {
            let clients = if enabled_only {
                api.list_enabled_clients().await?
            } else {
                api.list_clients().await?
            };
            if cli.json {
                return print_json(&clients);
            }
            for c in &clients {
                println!(
                    "{:>4}  {:<28} {:<16} {:<14} {:>6} {:>6} {}",
                    c.id,
                    c.name,
                    c.database_name,
                    c.city,
                    c.database_port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                    c.listener_port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                    if c.enabled { "enabled" } else { "disabled" }
                );
            }
            Ok(())
        }
        Command::Devices { filter } => {
            let filters: BTreeMap<String, String> = filter.into_iter().collect();
            let devices = api.list_gps_devices(&filters).await?;
            if cli.json {
                return print_json(&devices);
            }
            for d in &devices {
                println!(
                    "{:>6}  {:<16} {:<10} {:<12} {:<12} {}",
                    d.id, d.imei, d.model, d.status, d.carrier, d.city
                );
            }
            Ok(())
        }
        Command::AssignVehicle {
            device,
            vehicle,
            plate,
            internal_number,
            owner_rut,
            expires,
        } => {
            let assignment = match (vehicle, plate) {
                (Some(vehicle), _) => VehicleAssignment::existing(device, vehicle),
                (None, Some(plate)) => VehicleAssignment::new_vehicle(
                    device,
                    NewVehicle {
                        plate,
                        internal_number: internal_number.unwrap_or_default(),
                        owner_rut: owner_rut.unwrap_or_default(),
                        expires_on: expires.unwrap_or_default(),
                    },
                )?,
                (None, None) => {
                    let options = api.vehicles_for_assignment(device).await?;
                    if cli.json {
                        return print_json(&options);
                    }
                    for v in &options.vehicles {
                        println!(
                            "{:>6}  {:<20} {:<12} {}",
                            v.id,
                            v.label(),
                            v.model,
                            v.last_imei.as_deref().unwrap_or("-")
                        );
                    }
                    println!("Owners");
                    for owner in &options.owners {
                        println!("  {:<14} {}", owner.rut, owner.name);
                    }
                    return Ok(());
                }
            };
            let message = api.assign_vehicle(&assignment).await?;
            info!(device, "Vehicle assigned");
            if let Some(message) = message {
                println!("{}", message);
            }
            Ok(())
        }
        Command::Stats { top } => {
            let (shares, totals, recent) = tokio::try_join!(
                api.model_distribution(),
                api.installed_gps_totals(),
                api.recent_gps()
            )?;
            if cli.json {
                return print_json(&serde_json::json!({
                    "models": shares,
                    "installed": totals,
                    "recent": recent,
                }));
            }
            println!("Models");
            for share in &shares {
                println!("  {:<16} {:>6} {:>6.1}%", share.model, share.count, share.percentage);
            }
            println!("Installed GPS: {} across {} clients", totals.total, totals.per_client.len());
            for (name, count) in totals.top(top) {
                println!("  {:<28} {:>6}", name, count);
            }
            println!("Latest installs");
            for d in &recent {
                println!("  {:<16} {:<10} {}", d.imei, d.model, resources::format_date(&d.assigned_at));
            }
            Ok(())
        }
    }
}

/// Resolve the session from CLI credentials and return a client carrying it.
async fn authenticate(cli: &Cli, api: ApiClient) -> anyhow::Result<ApiClient> {
    let auth = AuthClient::new(api.clone());

    let session = match (&cli.user, &cli.password, &cli.token) {
        (Some(user), Some(password), _) => auth.login(user, password).await?,
        (_, _, Some(token)) => {
            let session = auth.restore(token.clone()).await;
            if !session.is_authenticated() {
                warn!("Stored token rejected, continuing anonymously");
            }
            session
        }
        _ => Session::Anonymous,
    };

    if let Some(user) = session.user() {
        info!(user = %user.display_name(), "Authenticated");
    }
    Ok(auth.authorized_api())
}

/// Mount the list with `query` and keep paging until `pages` pages are in.
async fn load_pages<F: PageFetcher>(
    list: &ListController<F>,
    query: Query,
    pages: u32,
) -> anyhow::Result<Vec<F::Item>> {
    let mut outcome = list.mount(query).await;

    for _ in 1..pages {
        if !outcome.is_applied() {
            break;
        }
        outcome = list.load_more().await;
        if outcome == LoadOutcome::Skipped(SkipReason::Exhausted) {
            break;
        }
    }

    let state = list.snapshot();
    if let Some(error) = state.error {
        anyhow::bail!("{:?}: {}", error.kind, error.message);
    }
    if outcome == LoadOutcome::Skipped(SkipReason::NoActiveQuery) {
        anyhow::bail!("query is missing a required filter");
    }
    Ok(state.items)
}

async fn run_monitor(api: ApiClient, options: LiveOptions, once: bool, json: bool) -> anyhow::Result<()> {
    let view = LiveView::new(MonitorFetcher::new(api), options);

    if once {
        view.refresh().await;
        let state = view.snapshot();
        if let Some(error) = state.error {
            anyhow::bail!("{:?}: {}", error.kind, error.message);
        }
        return print_board(&state.data.unwrap_or_default(), json);
    }

    let mut rx = view.subscribe();
    let _refresh = view.spawn();
    let mut last_printed = None;

    loop {
        rx.changed().await?;
        let state = rx.borrow_and_update().clone();
        if state.is_loading || state.is_refreshing {
            continue;
        }

        let current = (state.data.clone(), state.error.clone());
        if last_printed.as_ref() == Some(&current) {
            continue;
        }

        if let Some(error) = &state.error {
            warn!(kind = ?error.kind, "Monitor refresh failed: {}", error.message);
        }
        if let Some(board) = &state.data {
            print_board(board, json)?;
        }
        last_printed = Some(current);
    }
}

fn print_board(board: &MonitorBoard, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(board);
    }

    println!(
        "{} terminals, {} with problems, {} clients without terminals",
        board.total_terminals, board.terminals_with_problems, board.clients_without_terminals
    );
    for row in board.rows() {
        let status = row
            .status
            .as_ref()
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "no terminals".to_string());
        println!(
            "{} {:<14} {:<28} {:<8} {:<15} {:<14} {}",
            if row.has_problems { "!" } else { " " },
            row.city,
            row.client_name,
            row.client_code,
            row.ip_vpn.as_deref().unwrap_or("-"),
            status,
            row.last_update.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("patente= AB1234 ").unwrap(),
            ("patente".to_string(), "AB1234".to_string())
        );
        assert!(parse_filter("patente").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_cli_parses_dispatches() {
        let cli = Cli::try_parse_from([
            "fleet-dashboard",
            "dispatches",
            "--client",
            "C1",
            "--filter",
            "sentido=Ida",
            "--pages",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Dispatches { client, filter, pages } => {
                assert_eq!(client, "C1");
                assert_eq!(filter, vec![("sentido".to_string(), "Ida".to_string())]);
                assert_eq!(pages, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_new_vehicle_needs_number_and_owner() {
        assert!(Cli::try_parse_from([
            "fleet-dashboard",
            "assign-vehicle",
            "--device",
            "3",
            "--plate",
            "AB-CD-12",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "fleet-dashboard",
            "assign-vehicle",
            "--device",
            "3",
            "--vehicle",
            "12",
            "--plate",
            "AB-CD-12",
        ])
        .is_err());

        let cli = Cli::try_parse_from(["fleet-dashboard", "assign-vehicle", "--device", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::AssignVehicle { device: 3, vehicle: None, plate: None, .. }
        ));
    }
}
