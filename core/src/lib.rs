//! Quest Drive core: deterministic track and reward generation, the
//! pursuing storm, recurring-task scheduling, and the SQLite-backed
//! boundary that makes reward claims idempotent.

pub mod claim;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod loot;
pub mod progression;
pub mod recurrence;
pub mod rng;
pub mod snapshot;
pub mod storm;
pub mod store;
pub mod track;
pub mod types;
