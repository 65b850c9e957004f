//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or storage dependencies

pub mod collision;
pub mod events;
pub mod movement;
pub mod progression;
pub mod registry;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::circles_overlap;
pub use events::{EntityRef, EventBus, GameEvent, ListenerId, PickupKind};
pub use registry::{Entity, Registry};
pub use state::{
    ActiveEffect, ActiveEffects, Combo, Dash, Enemy, EntityIds, Explosion, GamePhase, GameState,
    Invincibility, Particle, Player, PlayerStats, PowerUp, Projectile, Shard, Snapshot, XpOrb,
};
pub use tick::{TickContext, TickInput, tick};
