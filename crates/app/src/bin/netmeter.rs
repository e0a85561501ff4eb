use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use netmeter_app::{
    AppPaths, AppState, Result, default_app_data_dir, ensure_app_data_dir, format_window,
};
use netmeter_core::{Entity, OfflineSource, Transport, UsageRecord, format_bytes};
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    History(HistoryArgs),
    Status,
    Clear,
    ResetBootstrap(Option<Transport>),
    Help,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct HistoryArgs {
    transport: Option<Transport>,
    entity: Option<Entity>,
    limit: Option<usize>,
    json: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    data_dir: Option<PathBuf>,
    command: Command,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            return ExitCode::from(2);
        }
    };
    if args.command == Command::Help {
        print_help();
        return ExitCode::SUCCESS;
    }
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_app_data_dir()?,
    };
    let paths = AppPaths::new(data_dir);
    ensure_app_data_dir(&paths)?;
    // Reporting only reads the cache, so no OS statistics are needed here.
    let state = AppState::from_paths(&paths, Arc::new(OfflineSource))?;
    state.setup_db()?;

    match args.command {
        Command::History(history) => print_history(&state, &history),
        Command::Status => {
            println!("data dir: {}", paths.app_data_dir.display());
            println!("records: {}", state.open_db()?.count_usage()?);
            if let Some(bucket) = state.services.settings.bucket_size_ms()? {
                println!("bucket size: {} ms", bucket);
            }
            for status in state.services.settings.bootstrap_status()? {
                let label = if status.bootstrapped { "done" } else { "pending" };
                println!("bootstrap {:<8} {}", status.transport.as_str(), label);
            }
            Ok(())
        }
        Command::Clear => {
            let cleared = state.services.usage.clear_history()?;
            println!("removed {} records", cleared);
            Ok(())
        }
        Command::ResetBootstrap(transport) => {
            state.services.settings.reset_bootstrap(transport)?;
            println!("bootstrap flag reset");
            Ok(())
        }
        Command::Help => Ok(()),
    }
}

fn print_history(state: &AppState, args: &HistoryArgs) -> Result<()> {
    let usage = &state.services.usage;
    let records = match (args.transport, args.entity) {
        (Some(transport), Some(entity)) => usage.history_for(transport, entity)?,
        _ => usage.history()?,
    };
    let records: Vec<UsageRecord> = records
        .into_iter()
        .filter(|record| args.transport.is_none_or(|transport| record.transport == transport))
        .filter(|record| args.entity.is_none_or(|entity| record.entity == entity))
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for record in &records {
        let label = match record.entity {
            Entity::Device => "device".to_string(),
            Entity::App(uid) => format!("{} ({})", record.display_name, uid),
        };
        println!(
            "{}  {:<8}  {:<32}  rx {:>10}  tx {:>10}",
            format_window(&record.window),
            record.transport.as_str(),
            label,
            format_bytes(record.rx_bytes),
            format_bytes(record.tx_bytes)
        );
    }
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> std::result::Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut data_dir = None;
    let mut command = None;
    let mut history = HistoryArgs::default();
    let mut reset_transport = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --data-dir".to_string())?;
                data_dir = Some(PathBuf::from(value));
            }
            "--transport" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --transport".to_string())?;
                let transport = value
                    .parse::<Transport>()
                    .map_err(|err| err.to_string())?;
                history.transport = Some(transport);
                reset_transport = Some(transport);
            }
            "--uid" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --uid".to_string())?;
                let uid = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid uid value: {value}"))?;
                history.entity = Some(Entity::App(uid));
            }
            "--device" => {
                history.entity = Some(Entity::Device);
            }
            "--limit" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --limit".to_string())?;
                let limit = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid limit value: {value}"))?;
                history.limit = Some(limit);
            }
            "--json" => {
                history.json = true;
            }
            "--help" | "-h" => {
                command = Some("help".to_string());
            }
            "history" | "status" | "clear" | "reset-bootstrap" if command.is_none() => {
                command = Some(arg);
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }

    let command = match command.as_deref() {
        Some("history") | None => Command::History(history),
        Some("status") => Command::Status,
        Some("clear") => Command::Clear,
        Some("reset-bootstrap") => Command::ResetBootstrap(reset_transport),
        Some(_) => Command::Help,
    };
    Ok(CliArgs { data_dir, command })
}

fn print_help() {
    println!(
        "netmeter\n\n\
Usage:\n  netmeter [--data-dir <path>] [history|status|clear|reset-bootstrap] [options]\n\n\
Commands:\n  history          List cached usage buckets, newest first (default)\n  status           Show record count and bootstrap state\n  clear            Delete every cached usage record\n  reset-bootstrap  Make the next start backfill history again\n\n\
Options:\n  --data-dir <path>     Data directory (default $NETMETER_DATA_DIR or ~/.local/share/netmeter)\n  --transport <t>       wifi, cellular, ethernet or vpn\n  --uid <n>             Only this app\n  --device              Only device-wide records\n  --limit <n>           Show at most n records\n  --json                Print records as JSON\n  -h, --help            Show this help message\n"
    );
}
