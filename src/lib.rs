//! Swarm Survivor - A fixed-tick arcade survival simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, progression)
//! - `engine`: Host-facing control surface (start/pause/advance/snapshot)
//! - `tuning`: Data-driven game balance
//! - `upgrades`: Upgrade curves and the external currency ledger
//! - `settings`: Host and simulation options

pub mod engine;
pub mod error;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod upgrades;

pub use engine::Simulation;
pub use error::ConfigError;
pub use settings::{HitPolicy, Settings};
pub use tuning::Tuning;
pub use upgrades::{MemoryLedger, UpgradeId, UpgradeLedger};

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TICK_HZ: u64 = 60;
    /// Fixed simulation timestep in milliseconds
    pub const TICK_MS: f32 = 1000.0 / TICK_HZ as f32;
    /// Maximum substeps per `advance` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default playfield dimensions (pixels)
    pub const PLAYFIELD_WIDTH: f32 = 400.0;
    pub const PLAYFIELD_HEIGHT: f32 = 800.0;
    /// How far a projectile may leave the playfield before it is dropped
    pub const BOUNDS_MARGIN: f32 = 50.0;

    /// Survival time between difficulty checkpoints
    pub const DIFFICULTY_STEP_MS: u64 = 10_000;
    /// Spawn interval multiplier applied at every checkpoint
    pub const SPAWN_INTERVAL_DECAY: f32 = 0.9;

    /// Level curve
    pub const START_XP_TO_NEXT_LEVEL: u32 = 100;
    pub const XP_TO_NEXT_LEVEL_GROWTH: u32 = 50;

    /// Damage dealt to (and taken by) each enemy touching the player
    pub const CONTACT_DAMAGE: i32 = 1;
}

/// Convert a duration in milliseconds to whole simulation ticks (rounded)
#[inline]
pub fn ms_to_ticks(ms: f32) -> u64 {
    if ms <= 0.0 {
        return 0;
    }
    (ms * consts::TICK_HZ as f32 / 1000.0).round() as u64
}

/// Elapsed milliseconds after `ticks` simulation ticks
#[inline]
pub fn ticks_to_ms(ticks: u64) -> u64 {
    ticks * 1000 / consts::TICK_HZ
}
