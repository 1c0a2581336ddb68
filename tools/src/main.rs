//! quest-runner: headless runner for the Quest Drive engine.
//!
//! Usage:
//!   quest-runner --player alice --ticks 96 --advance 1 --db run.db
//!   quest-runner --player alice --ipc-mode --tick-minutes 5
//!
//! IPC mode reads one JSON request per stdin line and writes one JSON
//! response per stdout line. Time only moves on `tick` requests.

use anyhow::Result;
use chrono::{Duration, FixedOffset};
use questdrive_core::{
    clock::{Clock, ManualClock, SystemClock},
    command::{CommandOutcome, PlayerCommand},
    config::GameConfig,
    engine::GameEngine,
    error::QuestError,
    event::GameEvent,
    store::QuestStore,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    /// Advance the clock by `count` storm intervals, ticking each one.
    Tick {
        count: u64,
    },
    /// A command from the authenticated player.
    Command {
        command: PlayerCommand,
    },
    /// A command with no caller identity (always rejected).
    Anonymous {
        command: PlayerCommand,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct IpcError {
    error:  String,
    status: u16,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticks = parse_arg(&args, "--ticks", 96u64);
    let advance = parse_arg(&args, "--advance", 1i64);
    let offset_minutes = parse_arg(&args, "--utc-offset-minutes", 0i32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let player = string_arg(&args, "--player").unwrap_or("player-1");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    config.storm.tick_interval_minutes =
        parse_arg(&args, "--tick-minutes", config.storm.tick_interval_minutes);

    if !ipc_mode {
        println!("Quest Drive quest-runner");
        println!("  player:   {player}");
        println!("  ticks:    {ticks}");
        println!("  advance:  {advance} tile(s)/hour");
        println!("  db:       {db}");
        println!();
    }

    let store = QuestStore::open(db)?;
    store.migrate()?;

    let tz = utc_offset(offset_minutes)?;
    let engine = GameEngine::new(store, config)?.with_timezone(tz);
    let clock = ManualClock::new(SystemClock.now());
    engine.register_player(player, clock.now())?;

    if ipc_mode {
        run_ipc_loop(&engine, &clock, player)?;
    } else {
        run_simulation(&engine, &clock, player, ticks, advance)?;
        print_summary(&engine, &clock, player)?;
    }

    Ok(())
}

fn tick_interval(engine: &GameEngine) -> Duration {
    Duration::minutes(i64::from(engine.config().storm.tick_interval_minutes))
}

/// Tick the storm; once per in-game hour drive forward and open every
/// crate passed on the way.
fn run_simulation(
    engine: &GameEngine,
    clock: &ManualClock,
    player: &str,
    ticks: u64,
    advance: i64,
) -> Result<()> {
    let per_hour = (60 / engine.config().storm.tick_interval_minutes.max(1)).max(1) as u64;

    for tick in 1..=ticks {
        let now = clock.advance(tick_interval(engine));
        let events = engine.storm_tick(player, now)?;
        if events.iter().any(|e| matches!(e, GameEvent::PlayerZapped { .. })) {
            println!("  tick {tick}: zapped by the storm");
            break;
        }

        if tick % per_hour == 0 {
            for event in engine.advance_vehicle(player, advance, now)? {
                if let GameEvent::CrateReached { tile_index, .. } = event {
                    let outcome = engine.claim(Some(player), &serde_json::json!(tile_index), now)?;
                    log::info!("tick={tick} crate at {tile_index}: {}", outcome.reward.label);
                }
            }
        }
    }
    Ok(())
}

fn run_ipc_loop(engine: &GameEngine, clock: &ManualClock, player: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err = IpcError { error: e.to_string(), status: 400 };
                writeln!(stdout, "{}", serde_json::to_string(&err)?)?;
                stdout.flush()?;
                continue;
            }
        };

        let result = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => engine.handle(Some(player), PlayerCommand::GetState, clock.now()),
            IpcCommand::Tick { count } => tick_many(engine, clock, player, count),
            IpcCommand::Command { command } => engine.handle(Some(player), command, clock.now()),
            IpcCommand::Anonymous { command } => engine.handle(None, command, clock.now()),
        };

        match result {
            Ok(outcome) => writeln!(stdout, "{}", serde_json::to_string(&outcome)?)?,
            Err(e) => {
                log::warn!("ipc: request failed: {e}");
                writeln!(stdout, "{}", serde_json::to_string(&error_body(&e))?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn tick_many(
    engine: &GameEngine,
    clock: &ManualClock,
    player: &str,
    count: u64,
) -> Result<CommandOutcome, QuestError> {
    let mut events = Vec::new();
    for _ in 0..count {
        let now = clock.advance(tick_interval(engine));
        events.extend(engine.storm_tick(player, now)?);
    }
    Ok(CommandOutcome::Events { events })
}

fn error_body(e: &QuestError) -> IpcError {
    IpcError { error: e.to_string(), status: e.http_status() }
}

fn print_summary(engine: &GameEngine, clock: &ManualClock, player: &str) -> Result<()> {
    let state = engine.game_state(player)?;
    let storm = engine.storm_view(&state, clock.now());
    let rewards = engine.store.rewards_for_player(player)?;
    let events = engine.store.events_for_player(player)?;

    println!("=== RUN SUMMARY ===");
    println!("  player:         {player}");
    println!("  vehicle:        tile {} (level {})", state.vehicle_position, state.vehicle_level);
    println!("  distance:       {}", state.total_distance);
    println!("  storm:          {:.2} (gap {:.2})", storm.authoritative, storm.gap);
    println!("  zapped:         {}", state.zapped);
    println!("  scrap/boost/ticket: {}/{}/{}", state.scrap_count, state.boost_count, state.ticket_count);
    println!("  rewards:        {}", rewards.len());
    println!("  events logged:  {}", events.len());

    println!();
    println!("=== TRACK AHEAD ===");
    let window = engine.window(player)?;
    let line: String = window
        .iter()
        .filter(|t| t.index >= state.vehicle_position)
        .map(|t| match t.kind {
            questdrive_core::track::TileKind::Road      => '.',
            questdrive_core::track::TileKind::Crate     => 'c',
            questdrive_core::track::TileKind::Milestone => 'M',
        })
        .collect();
    println!("  {line}");
    Ok(())
}

fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow::anyhow!("utc offset out of range: {minutes} minutes"))
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
