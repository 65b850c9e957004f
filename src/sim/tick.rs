//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Every tick runs
//! the same stages in the same order:
//! input → spawner → movement → collisions → progression → pruning.

use glam::Vec2;

use super::events::GameEvent;
use super::state::{GamePhase, GameState};
use super::{collision, movement, progression, spawner};
use crate::settings::HitPolicy;
use crate::tuning::Tuning;
use crate::upgrades::{Modifiers, UpgradeLedger};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Pointer position the player jumps to (clamped to the playfield)
    pub target: Option<Vec2>,
    /// Start a dash if the cooldown allows
    pub dash: bool,
}

/// Collaborators a tick reads from or reports to
pub struct TickContext<'a> {
    pub tuning: &'a Tuning,
    pub hit_policy: HitPolicy,
    /// Upgrade coefficients sampled at tick start
    pub mods: Modifiers,
    pub ledger: &'a mut dyn UpgradeLedger,
    /// Events produced this tick, in order
    pub events: &'a mut Vec<GameEvent>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    // Don't tick unless running
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;

    if let Some(target) = input.target {
        state.player.pos = state.clamp_to_playfield(target);
    }
    if input.dash && progression::try_dash(state, ctx.tuning) {
        log::debug!("Dash at tick {}", state.time_ticks);
    }

    spawner::update(state, ctx);

    movement::update(state, ctx.tuning);

    let hits = collision::player_enemy(state, ctx.events);
    progression::apply_contact_damage(state, ctx, hits);
    if state.is_over() {
        return;
    }

    collision::projectile_enemy(state, ctx);

    let orbs = collision::player_xp_orbs(state, ctx);
    progression::collect_xp(state, ctx, &orbs);

    collision::player_shards(state, ctx);

    let power_ups = collision::player_power_ups(state, ctx);
    progression::activate_power_ups(state, ctx.tuning, &power_ups);

    progression::update_status(state, ctx.tuning);

    prune(state);
}

/// Drop finished effects and uncollected power-ups past their lifetime
fn prune(state: &mut GameState) {
    let now = state.time_ticks;
    state.explosions.retain(|e| !e.is_finished());
    state.power_ups.retain(|p| now < p.expires_at_tick);
}
