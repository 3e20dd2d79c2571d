//! One-shot runner for the team battle scheduler.
//!
//! Meant to be started by an external timer (cron, systemd timer, CI
//! schedule). Each run performs a single tick of the cycle state machine
//! and exits non-zero if any battle of the executed batch failed.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Error};
use chrono::Utc;
use log::{error, info};
use pico_args::Arguments;
use team_battles::config::{BattleConfig, api_token_from_env};
use team_battles::cycle::{CycleMachine, TickReport};
use team_battles::remote::{ArenaClient, TokioPacer};
use team_battles::schedule::{BATCH_COUNT, select_batch};
use team_battles::store::{JsonFileStore, StateStore};

const HELP: &str = "\
Advance the weekly team battle cycle by one tick

USAGE:
  tb_runner [OPTIONS]

OPTIONS:
  --state PATH         Cycle state file  [default: env BATTLE_STATE_FILE or battle_state.json]

FLAGS:
  --dry-run            Log what would be created without calling the API
  --status             Show the cycle phase and schedule, change nothing
                       (still requires BATTLE_API_TOKEN)
  -h, --help           Print help information

ENVIRONMENT:
  BATTLE_API_TOKEN     API token with tournament write scope (required)
  BATTLE_HOST_TEAM     Team hosting the battles (required)
  BATTLE_INVITED_TEAMS Comma separated teams invited to every battle
  BATTLE_SERVER_URL    Remote server  [default: https://lichess.org]
  DRY_RUN              Same as --dry-run when set to true
  (See .env for all configuration options)
";

struct Args {
    dry_run: bool,
    status: bool,
    state_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return ExitCode::SUCCESS;
    }

    let args = match parse_args(pargs) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut pargs: Arguments) -> Result<Args, pico_args::Error> {
    Ok(Args {
        dry_run: pargs.contains("--dry-run"),
        status: pargs.contains("--status"),
        state_file: pargs.opt_value_from_str("--state")?,
    })
}

async fn run(args: Args) -> Result<ExitCode, Error> {
    // The token gates everything else, status included
    let token = api_token_from_env()?;

    let config = BattleConfig::from_env(args.dry_run, args.state_file)?;
    if args.status {
        print_status(&config)?;
        return Ok(ExitCode::SUCCESS);
    }
    config.validate()?;

    info!(
        "Team battle tick for host {} (state: {}{})",
        config.battle.host_team,
        config.state_file.display(),
        if config.dry_run { ", dry run" } else { "" }
    );

    let client = ArenaClient::new(config.clone(), token).context("Failed to build API client")?;
    let store = JsonFileStore::new(&config.state_file);
    let machine = CycleMachine::new(
        config,
        Arc::new(store),
        Arc::new(client),
        Arc::new(TokioPacer),
    );

    let report = machine.tick(Utc::now()).await.context("Cycle tick failed")?;
    info!("{}", report);

    if let TickReport::BatchRan { outcome, .. } = &report {
        for created in &outcome.created {
            logging::log_slot_created(created);
        }
        for failure in &outcome.failures {
            logging::log_slot_failed(failure);
        }
    }

    if report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_status(config: &BattleConfig) -> Result<(), Error> {
    let now = Utc::now();
    let state = JsonFileStore::new(&config.state_file).load();

    println!("State file:      {}", config.state_file.display());
    println!("Phase:           {}", state.phase(now));
    println!("Last completed:  #{}", state.last_completed_sequence_number);

    if !state.is_cycle_active {
        match state.next_cycle_at() {
            Some(at) if at > now => println!("Next cycle:      {}", at.to_rfc3339()),
            _ => println!("Next cycle:      due now"),
        }
        return Ok(());
    }

    println!("Cycle started:   {}", state.cycle_start_timestamp.to_rfc3339());
    println!("Next batch at:   {}", state.next_eligible_at().to_rfc3339());
    println!();
    let schedule = state.cycle_schedule()?;
    for batch in 1..=BATCH_COUNT {
        let Ok(slots) = select_batch(&schedule, batch) else {
            continue;
        };
        let marker = if batch < state.current_batch_index {
            "created"
        } else {
            "pending"
        };
        for slot in slots {
            println!("  [batch {}] {:<8} {}", batch, marker, slot);
        }
    }
    Ok(())
}
