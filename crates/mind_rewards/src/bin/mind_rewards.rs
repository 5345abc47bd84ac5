use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use mind_rewards::proto::RewardEvent;
use mind_rewards::rewards::read_json_from_path;
use mind_rewards::{
    InMemoryLedger, RewardEngine, SystemClock, TomlRuleStore, DEFAULT_RULES_FILE,
    MAX_BATCH_EVENTS,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEDGER_FILE: &str = "reward_ledger.json";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Process { events_path: PathBuf },
    Rebalance,
    Stats { user_id: String },
    ResetDaily,
    RegisterUser { user_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    ledger_path: PathBuf,
    verbose: bool,
    command: Command,
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    events: usize,
    rewards_recorded: usize,
    total_rewards: u64,
}

fn main() {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    if raw_args.is_empty() || raw_args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return;
    }

    let options = match parse_options(raw_args.iter().map(|arg| arg.as_str())) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            process::exit(1);
        }
    };

    init_tracing(options.verbose);

    if let Err(err) = run(&options) {
        eprintln!("mind_rewards failed: {err}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: &CliOptions) -> Result<(), String> {
    let clock = Arc::new(SystemClock);
    let mut ledger = InMemoryLedger::load_json(&options.ledger_path, clock.clone())
        .map_err(|err| format!("load ledger {} failed: {err}", options.ledger_path.display()))?;

    if let Command::RegisterUser { user_id } = &options.command {
        let account = ledger.register_user(user_id.as_str());
        save_ledger(&ledger, options)?;
        return print_json(&account);
    }

    let engine = RewardEngine::with_clock(TomlRuleStore::new(&options.config_path), clock)
        .map_err(|err| format!("load rules {} failed: {err}", options.config_path.display()))?;

    match &options.command {
        Command::Process { events_path } => {
            let events: Vec<RewardEvent> = read_json_from_path(events_path)
                .map_err(|err| format!("read events {} failed: {err}", events_path.display()))?;
            if events.len() > MAX_BATCH_EVENTS {
                return Err(format!(
                    "batch of {} events exceeds the limit of {MAX_BATCH_EVENTS}",
                    events.len()
                ));
            }
            let before = ledger.rewards().len();
            ledger
                .unit_of_work(|ledger| engine.process_batch(ledger, &events))
                .map_err(|err| format!("process batch failed: {err}"))?;
            save_ledger(&ledger, options)?;
            print_json(&BatchSummary {
                events: events.len(),
                rewards_recorded: ledger.rewards().len() - before,
                total_rewards: ledger
                    .rewards()
                    .iter()
                    .map(|record| record.mind_amount)
                    .sum(),
            })
        }
        Command::Rebalance => {
            let report = engine
                .execute_monthly_rebalance_report(&ledger)
                .map_err(|err| format!("rebalance failed: {err}"))?;
            print_json(&report)
        }
        Command::Stats { user_id } => {
            let stats = engine
                .get_user_daily_stats(&mut ledger, user_id.as_str())
                .map_err(|err| format!("stats for {user_id} failed: {err}"))?;
            print_json(&stats)
        }
        Command::ResetDaily => {
            engine.reset_daily_counters();
            Ok(())
        }
        Command::RegisterUser { .. } => Ok(()),
    }
}

fn save_ledger(ledger: &InMemoryLedger, options: &CliOptions) -> Result<(), String> {
    ledger
        .save_json(&options.ledger_path)
        .map_err(|err| format!("save ledger {} failed: {err}", options.ledger_path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| format!("render output failed: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn parse_options<'a>(args: impl Iterator<Item = &'a str>) -> Result<CliOptions, String> {
    let mut config_path = PathBuf::from(DEFAULT_RULES_FILE);
    let mut ledger_path = PathBuf::from(DEFAULT_LEDGER_FILE);
    let mut verbose = false;
    let mut command_name: Option<String> = None;
    let mut events_path: Option<PathBuf> = None;
    let mut user_id: Option<String> = None;
    let mut iter = args.peekable();

    while let Some(arg) = iter.next() {
        match arg {
            "--config" => {
                config_path = PathBuf::from(parse_required_value(&mut iter, "--config")?);
            }
            "--ledger" => {
                ledger_path = PathBuf::from(parse_required_value(&mut iter, "--ledger")?);
            }
            "--events" => {
                events_path = Some(PathBuf::from(parse_required_value(&mut iter, "--events")?));
            }
            "--user" => {
                user_id = Some(parse_required_value(&mut iter, "--user")?);
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}"));
            }
            name => {
                if let Some(existing) = &command_name {
                    return Err(format!("unexpected argument {name} after command {existing}"));
                }
                command_name = Some(name.to_string());
            }
        }
    }

    let command = match command_name.as_deref() {
        Some("process") => Command::Process {
            events_path: events_path.ok_or_else(|| "process requires --events <path>".to_string())?,
        },
        Some("rebalance") => Command::Rebalance,
        Some("stats") => Command::Stats {
            user_id: user_id.ok_or_else(|| "stats requires --user <id>".to_string())?,
        },
        Some("reset-daily") => Command::ResetDaily,
        Some("register-user") => Command::RegisterUser {
            user_id: user_id.ok_or_else(|| "register-user requires --user <id>".to_string())?,
        },
        Some(other) => return Err(format!("unknown command: {other}")),
        None => return Err("a command is required".to_string()),
    };

    Ok(CliOptions {
        config_path,
        ledger_path,
        verbose,
        command,
    })
}

fn parse_required_value<'a, I>(
    iter: &mut std::iter::Peekable<I>,
    flag: &str,
) -> Result<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let Some(value) = iter.next() else {
        return Err(format!("{flag} requires a value"));
    };
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{flag} requires a non-empty value"));
    }
    Ok(value.to_string())
}

fn print_help() {
    println!(
        "Usage: mind_rewards [options] <command>\n\n\
Runs the MIND reward engine against a rule document and a JSON ledger file.\n\n\
Commands:\n\
  process --events <path>   credit a JSON array of reward events (at most {MAX_BATCH_EVENTS})\n\
  rebalance                 run the monthly emission rebalance and print the report\n\
  stats --user <id>         print today's counters and remaining caps for a user\n\
  reset-daily               reset daily counters (counters are date scoped; no-op)\n\
  register-user --user <id> create a zero-balance account in the ledger\n\n\
Options:\n\
  --config <path>           reward rule document (default: {DEFAULT_RULES_FILE})\n\
  --ledger <path>           ledger JSON file (default: {DEFAULT_LEDGER_FILE})\n\
  -v, --verbose             log skipped events (RUST_LOG overrides)\n\
  -h, --help                show help"
    );
}
