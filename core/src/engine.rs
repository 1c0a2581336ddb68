//! The game engine: the authoritative side of Quest Drive.
//!
//! The generators and models are pure; the engine is where their outputs
//! meet the store. Every state-changing operation:
//!   - runs in one store transaction (all or nothing),
//!   - returns the events it produced,
//!   - appends those events to the event log before committing.
//!
//! "Now" is always passed in. The engine never reads a clock itself.

use crate::{
    claim::{ClaimOutcome, RewardClaim},
    command::{BoardEntry, CommandOutcome, NewTask, PlayerCommand, StormView},
    config::GameConfig,
    error::{QuestError, QuestResult},
    event::{EventLogEntry, GameEvent},
    loot::LootRoller,
    progression::Progression,
    recurrence::{TaskSchedule, TaskStatus},
    rng::identity_hash,
    snapshot::GameState,
    storm::{self, StormModel},
    store::{QuestStore, TaskRow},
    track::{Tile, TrackGenerator},
    types::Timestamp,
};
use chrono::{FixedOffset, Offset, TimeZone, Utc};

/// Largest single move `advance_vehicle` accepts.
pub const MAX_ADVANCE_TILES: i64 = 10_000;

pub struct GameEngine {
    pub store:   QuestStore,
    config:      GameConfig,
    track:       TrackGenerator,
    loot:        LootRoller,
    storm:       StormModel,
    progression: Progression,
    /// The players' wall-clock zone for recurrence anchors.
    tz:          FixedOffset,
}

impl GameEngine {
    pub fn new(store: QuestStore, config: GameConfig) -> QuestResult<Self> {
        config.validate()?;
        Ok(Self {
            track:       TrackGenerator::new(config.track.clone()),
            loot:        LootRoller::new(config.loot.clone()),
            storm:       StormModel::new(config.storm.clone()),
            progression: Progression::new(config.progression.clone()),
            tz:          utc_offset(),
            store,
            config,
        })
    }

    /// Default config over a migrated in-memory store.
    pub fn build_test() -> QuestResult<Self> {
        let store = QuestStore::in_memory()?;
        store.migrate()?;
        Self::new(store, GameConfig::default())
    }

    pub fn with_timezone(mut self, tz: FixedOffset) -> Self {
        self.tz = tz;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn track(&self) -> &TrackGenerator {
        &self.track
    }

    pub fn loot(&self) -> &LootRoller {
        &self.loot
    }

    pub fn storm_model(&self) -> &StormModel {
        &self.storm
    }

    // ── Players ────────────────────────────────────────────────

    /// Create the player and their aggregate. Idempotent.
    pub fn register_player(&self, player_id: &str, now: Timestamp) -> QuestResult<GameState> {
        let tx = self.store.begin()?;
        let seed = identity_hash(player_id);
        if self.store.insert_player(player_id, seed, now)? {
            let state = GameState::new(player_id.to_string(), self.config.storm.head_start, now);
            self.store.insert_game_state(&state)?;
            self.record(
                player_id,
                now,
                &[GameEvent::PlayerRegistered { player_id: player_id.to_string(), seed }],
            )?;
            log::info!("engine: registered player={player_id} seed={seed}");
        }
        let state = self.game_state(player_id)?;
        tx.commit()?;
        Ok(state)
    }

    pub fn game_state(&self, player_id: &str) -> QuestResult<GameState> {
        self.store
            .game_state(player_id)?
            .ok_or_else(|| QuestError::PlayerNotFound { player_id: player_id.to_string() })
    }

    pub fn storm_view(&self, state: &GameState, now: Timestamp) -> StormView {
        let vehicle = state.vehicle_position as f64;
        let storm_state = state.storm();
        StormView {
            authoritative: state.storm_position,
            display:       self.storm.display_position(&storm_state, vehicle, now),
            speed:         self.storm.speed(state.daily_task_count),
            gap:           storm::gap(vehicle, state.storm_position),
            warning:       self.storm.is_warning(vehicle, state.storm_position),
        }
    }

    /// The visible tiles around the vehicle.
    pub fn window(&self, player_id: &str) -> QuestResult<Vec<Tile>> {
        let state = self.game_state(player_id)?;
        Ok(self.track.view(state.vehicle_position, identity_hash(player_id)))
    }

    // ── Storm ──────────────────────────────────────────────────

    /// Authoritative storm tick: advance by the elapsed time at the task
    /// load that was in effect, then pick up the current load for the
    /// next interval. Catching the vehicle is recorded once.
    pub fn storm_tick(&self, player_id: &str, now: Timestamp) -> QuestResult<Vec<GameEvent>> {
        let tx = self.store.begin()?;
        let mut state = self.game_state(player_id)?;
        let pending = self.store.pending_task_count(player_id)?;

        let from = state.storm_position;
        let speed = self.storm.speed(state.daily_task_count);
        let advanced = self.storm.advance(&state.storm(), now);

        state.storm_position = advanced.position;
        state.last_storm_tick = advanced.last_tick_at;
        state.daily_task_count = pending;
        state.updated_at = now;

        let mut events = vec![GameEvent::StormAdvanced {
            player_id:        player_id.to_string(),
            from_position:    from,
            to_position:      state.storm_position,
            speed,
            daily_task_count: pending,
        }];

        let vehicle = state.vehicle_position as f64;
        if !state.zapped && storm::is_zapped(vehicle, state.storm_position) {
            state.zapped = true;
            events.push(GameEvent::PlayerZapped {
                player_id:        player_id.to_string(),
                vehicle_position: state.vehicle_position,
                storm_position:   state.storm_position,
            });
            log::warn!(
                "engine: player={player_id} zapped at vehicle={} storm={:.3}",
                state.vehicle_position,
                state.storm_position
            );
        } else if self.storm.is_warning(vehicle, state.storm_position) {
            log::info!(
                "engine: storm within {:.2} tiles of player={player_id}",
                storm::gap(vehicle, state.storm_position)
            );
        }

        self.store.save_game_state(&state)?;
        self.record(player_id, now, &events)?;
        tx.commit()?;
        Ok(events)
    }

    // ── Vehicle ────────────────────────────────────────────────

    pub fn advance_vehicle(
        &self,
        player_id: &str,
        tiles: i64,
        now: Timestamp,
    ) -> QuestResult<Vec<GameEvent>> {
        if tiles > MAX_ADVANCE_TILES {
            return Err(QuestError::InvalidAdvance { tiles });
        }
        let tx = self.store.begin()?;
        let mut state = self.game_state(player_id)?;
        let events = self.advance_state(&mut state, tiles, now);
        self.store.save_game_state(&state)?;
        self.record(player_id, now, &events)?;
        tx.commit()?;
        Ok(events)
    }

    /// Begin a new weekly checkpoint at the current position.
    pub fn start_week(&self, player_id: &str, now: Timestamp) -> QuestResult<GameState> {
        let tx = self.store.begin()?;
        let mut state = self.game_state(player_id)?;
        state.week_start_position = state.vehicle_position;
        state.updated_at = now;
        self.store.save_game_state(&state)?;
        tx.commit()?;
        Ok(state)
    }

    /// Move forward, re-level, and report every crate passed on the way.
    fn advance_state(&self, state: &mut GameState, tiles: i64, now: Timestamp) -> Vec<GameEvent> {
        let tiles = tiles.max(0);
        if tiles == 0 {
            return Vec::new();
        }
        let player_id = state.player_id.clone();
        let from = state.vehicle_position;
        let to = from.saturating_add(tiles);

        state.vehicle_position = to;
        state.total_distance = state.total_distance.saturating_add(tiles);
        state.updated_at = now;

        let mut events = vec![GameEvent::VehicleMoved {
            player_id:     player_id.clone(),
            from_position: from,
            to_position:   to,
        }];

        let seed = identity_hash(&player_id);
        events.extend(self.track.crates_in_range(from, to, seed).into_iter().map(|tile| {
            GameEvent::CrateReached { player_id: player_id.clone(), tile_index: tile.index }
        }));

        if let Some(vehicle) = self.progression.vehicle_for(state.total_distance) {
            if vehicle.level != state.vehicle_level {
                state.vehicle_level = vehicle.level;
                events.push(GameEvent::VehicleEvolved {
                    player_id: player_id.clone(),
                    level:     vehicle.level,
                    name:      vehicle.name.clone(),
                });
                log::info!("engine: player={player_id} evolved to {}", vehicle.name);
            }
        }
        events
    }

    // ── Rewards ────────────────────────────────────────────────

    pub fn claim(
        &self,
        caller: Option<&str>,
        raw_tile_index: &serde_json::Value,
        now: Timestamp,
    ) -> QuestResult<ClaimOutcome> {
        RewardClaim::new(&self.store, &self.track, &self.loot).claim(caller, raw_tile_index, now)
    }

    // ── Tasks ──────────────────────────────────────────────────

    pub fn add_task(&self, player_id: &str, task: NewTask, now: Timestamp) -> QuestResult<TaskRow> {
        self.game_state(player_id)?;
        let row = TaskRow {
            task_id:     uuid::Uuid::new_v4().to_string(),
            player_id:   player_id.to_string(),
            title:       task.title,
            description: task.description,
            schedule: TaskSchedule {
                is_permanent:  task.is_permanent,
                status:        TaskStatus::Pending,
                interval_days: task.interval_days,
                anchor:        task.anchor,
                completed_at:  None,
                deadline:      task.deadline,
                difficulty:    task.difficulty.clamp(1, 3),
            },
            created_at:  now,
        };
        self.store.insert_task(&row)?;
        log::debug!("engine: task {} added for player={player_id}", row.task_id);
        Ok(row)
    }

    /// Complete a pending task and drive the vehicle forward by its
    /// difficulty. Completing an already-completed task does nothing.
    pub fn complete_task(
        &self,
        player_id: &str,
        task_id: &str,
        now: Timestamp,
    ) -> QuestResult<Vec<GameEvent>> {
        let tx = self.store.begin()?;
        let task = self.owned_task(player_id, task_id)?;
        if task.schedule.status != TaskStatus::Pending {
            return Ok(Vec::new());
        }

        self.store.update_task_status(task_id, TaskStatus::Completed, Some(now))?;
        let tiles = i64::from(task.schedule.difficulty);
        let mut events = vec![GameEvent::TaskCompleted {
            player_id: player_id.to_string(),
            task_id:   task_id.to_string(),
            tiles,
        }];

        let mut state = self.game_state(player_id)?;
        events.extend(self.advance_state(&mut state, tiles, now));
        self.store.save_game_state(&state)?;
        self.record(player_id, now, &events)?;
        tx.commit()?;
        Ok(events)
    }

    /// Permanent tasks whose repeat time has come go back to pending.
    pub fn reset_due_tasks(&self, player_id: &str, now: Timestamp) -> QuestResult<Vec<GameEvent>> {
        let tx = self.store.begin()?;
        let mut events = Vec::new();
        for task in self.store.tasks_for_player(player_id)? {
            let s = &task.schedule;
            if s.is_permanent && s.status == TaskStatus::Completed && s.is_due(now, &self.tz) {
                self.store.update_task_status(&task.task_id, TaskStatus::Pending, None)?;
                events.push(GameEvent::TaskReset {
                    player_id: player_id.to_string(),
                    task_id:   task.task_id.clone(),
                });
            }
        }
        self.record(player_id, now, &events)?;
        tx.commit()?;
        Ok(events)
    }

    /// Tasks a player should currently see, with their urgency.
    pub fn task_board(&self, player_id: &str, now: Timestamp) -> QuestResult<Vec<BoardEntry>> {
        self.task_board_in(player_id, now, &self.tz)
    }

    pub fn task_board_in<Tz: TimeZone>(
        &self,
        player_id: &str,
        now: Timestamp,
        tz: &Tz,
    ) -> QuestResult<Vec<BoardEntry>> {
        let entries = self
            .store
            .tasks_for_player(player_id)?
            .into_iter()
            .filter(|t| t.schedule.is_visible(now, tz))
            .map(|task| BoardEntry {
                urgency:      task.schedule.urgency(now, tz),
                due_at:       task.schedule.due_at(now, tz),
                repeat_label: task.schedule.repeat_label(),
                task,
            })
            .collect();
        Ok(entries)
    }

    fn owned_task(&self, player_id: &str, task_id: &str) -> QuestResult<TaskRow> {
        self.store
            .task(task_id)?
            .filter(|t| t.player_id == player_id)
            .ok_or_else(|| QuestError::TaskNotFound { task_id: task_id.to_string() })
    }

    // ── Commands ───────────────────────────────────────────────

    pub fn handle(
        &self,
        caller: Option<&str>,
        command: PlayerCommand,
        now: Timestamp,
    ) -> QuestResult<CommandOutcome> {
        let player_id = caller.ok_or(QuestError::Unauthorized)?;
        let outcome = match command {
            PlayerCommand::GetState => self.state_outcome(player_id, now)?,
            PlayerCommand::Window => CommandOutcome::Window { tiles: self.window(player_id)? },
            PlayerCommand::TaskBoard => CommandOutcome::Board { entries: self.task_board(player_id, now)? },
            PlayerCommand::Advance { tiles } => CommandOutcome::Events {
                events: self.advance_vehicle(player_id, tiles, now)?,
            },
            PlayerCommand::StormTick => CommandOutcome::Events { events: self.storm_tick(player_id, now)? },
            PlayerCommand::StartWeek => {
                self.start_week(player_id, now)?;
                self.state_outcome(player_id, now)?
            }
            PlayerCommand::AddTask { task } => CommandOutcome::TaskAdded {
                task: self.add_task(player_id, task, now)?,
            },
            PlayerCommand::CompleteTask { task_id } => CommandOutcome::Events {
                events: self.complete_task(player_id, &task_id, now)?,
            },
            PlayerCommand::ResetDueTasks => CommandOutcome::Events {
                events: self.reset_due_tasks(player_id, now)?,
            },
            PlayerCommand::Claim { tile_index } => CommandOutcome::Claimed {
                outcome: self.claim(Some(player_id), &tile_index, now)?,
            },
        };
        Ok(outcome)
    }

    fn state_outcome(&self, player_id: &str, now: Timestamp) -> QuestResult<CommandOutcome> {
        let game_state = self.game_state(player_id)?;
        Ok(CommandOutcome::State {
            storm:        self.storm_view(&game_state, now),
            checkpoint:   self
                .progression
                .weekly_checkpoint(game_state.vehicle_position, game_state.week_start_position),
            vehicle_name: self
                .progression
                .level_info(game_state.vehicle_level)
                .map(|v| v.name.clone()),
            game_state,
        })
    }

    /// Persist events to the log. Callers hold the transaction.
    fn record(&self, player_id: &str, now: Timestamp, events: &[GameEvent]) -> QuestResult<()> {
        for event in events {
            self.store.append_event(&EventLogEntry {
                id:          None,
                player_id:   player_id.to_string(),
                occurred_at: now,
                event_type:  event.type_name().to_string(),
                payload:     serde_json::to_string(event)?,
            })?;
        }
        Ok(())
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
