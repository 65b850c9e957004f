//! Player status and run progression
//!
//! Applies the deltas produced by collision resolution: contact damage,
//! invincibility, XP and level-ups, combo chains, power-up effects. Also owns
//! the end-of-tick timer transitions and difficulty scaling.

use super::events::{EntityRef, GameEvent};
use super::state::{ActiveEffect, GamePhase, GameState, Invincibility, PlayerStats, PowerUp, XpOrb};
use super::tick::TickContext;
use crate::consts::{CONTACT_DAMAGE, DIFFICULTY_STEP_MS, SPAWN_INTERVAL_DECAY, XP_TO_NEXT_LEVEL_GROWTH};
use crate::ms_to_ticks;
use crate::tuning::{PowerUpKind, Tuning};

/// Apply `hits` enemy contacts to the player.
///
/// Any hit starts the invincibility window; health reaching zero ends the run
/// within the same tick.
pub fn apply_contact_damage(state: &mut GameState, ctx: &mut TickContext<'_>, hits: u32) {
    if hits == 0 {
        return;
    }

    let damage = hits as i32 * CONTACT_DAMAGE;
    let player = &mut state.player;
    player.health = (player.health - damage).max(0);
    ctx.events.push(GameEvent::EntityHit {
        entity: EntityRef::Player,
        damage,
        remaining_health: player.health,
    });

    let window_ms = ctx.tuning.player.base_invincibility_ms + ctx.mods.invincibility_bonus_ms;
    player.grant_invincibility(state.time_ticks + ms_to_ticks(window_ms));

    if player.health == 0 {
        game_over(state, ctx);
    }
}

/// Enter the terminal phase and announce the final result
pub fn game_over(state: &mut GameState, ctx: &mut TickContext<'_>) {
    if state.is_over() {
        return;
    }
    state.phase = GamePhase::GameOver;
    let survival_ms = state.elapsed_ms();
    log::info!(
        "Game over: score {} after {:.1}s (level {}, {} kills)",
        state.score,
        survival_ms as f32 / 1000.0,
        state.player.stats.level,
        state.kills
    );
    ctx.events.push(GameEvent::GameOver {
        score: state.score,
        survival_ms,
        level: state.player.stats.level,
        kills: state.kills,
    });
}

/// Add XP and level up as many times as the total allows.
///
/// Returns every level reached, in order.
pub fn gain_xp(stats: &mut PlayerStats, amount: u32) -> Vec<u32> {
    stats.xp = stats.xp.saturating_add(amount);
    let mut reached = Vec::new();
    while stats.xp_to_next_level > 0 && stats.xp >= stats.xp_to_next_level {
        stats.xp -= stats.xp_to_next_level;
        stats.level += 1;
        stats.xp_to_next_level += XP_TO_NEXT_LEVEL_GROWTH;
        reached.push(stats.level);
    }
    reached
}

/// Credit collected orbs: XP (summed, then one level-up pass), combo chain
/// and combo-scaled score.
pub fn collect_xp(state: &mut GameState, ctx: &mut TickContext<'_>, orbs: &[XpOrb]) {
    if orbs.is_empty() {
        return;
    }

    let combo = &ctx.tuning.combo;
    let window = ms_to_ticks(combo.window_ms);
    let now = state.time_ticks;
    let mut total: u32 = 0;
    for orb in orbs {
        total = total.saturating_add(orb.value);

        let chain = &mut state.combo;
        if chain.count > 0 && now - chain.last_pickup_tick <= window {
            chain.count += 1;
        } else {
            chain.count = 1;
        }
        chain.last_pickup_tick = now;
        chain.best = chain.best.max(chain.count);

        let multiplier = (1.0 + combo.step * (chain.count - 1) as f32).min(combo.max_multiplier);
        state.score += (orb.value as f32 * multiplier).round() as u64;
    }

    for level in gain_xp(&mut state.player.stats, total) {
        log::debug!("Level up: {level}");
        ctx.events.push(GameEvent::LevelUp { level });
    }
}

/// Start the timed effects of collected power-ups
pub fn activate_power_ups(state: &mut GameState, tuning: &Tuning, picked: &[PowerUp]) {
    for power_up in picked {
        let archetype = tuning.power_up(&power_up.archetype);
        let until_tick = state.time_ticks + ms_to_ticks(archetype.duration_ms);
        log::debug!("Power-up {} active until tick {until_tick}", archetype.id);
        match power_up.kind {
            PowerUpKind::Shield => state.player.grant_invincibility(until_tick),
            kind => state.effects.activate(ActiveEffect {
                kind,
                magnitude: archetype.magnitude,
                until_tick,
            }),
        }
    }
}

/// Begin a dash if the cooldown allows it
pub fn try_dash(state: &mut GameState, tuning: &Tuning) -> bool {
    let now = state.time_ticks;
    let dash = &mut state.player.dash;
    if !dash.is_ready(now) {
        return false;
    }
    dash.active_until = now + ms_to_ticks(tuning.player.dash_duration_ms);
    dash.ready_at = now + ms_to_ticks(tuning.player.dash_cooldown_ms);
    true
}

/// End-of-tick timers: invincibility, power-ups, combo window, difficulty
pub fn update_status(state: &mut GameState, tuning: &Tuning) {
    let now = state.time_ticks;

    if let Invincibility::Invincible { until_tick } = state.player.invincibility {
        if now >= until_tick {
            state.player.invincibility = Invincibility::Vulnerable;
        }
    }

    state.effects.expire(now);

    let window = ms_to_ticks(tuning.combo.window_ms);
    if state.combo.count > 0 && now - state.combo.last_pickup_tick > window {
        state.combo.count = 0;
    }

    update_difficulty(state, tuning);
}

/// Shrink the spawn interval once per elapsed difficulty checkpoint
pub fn update_difficulty(state: &mut GameState, tuning: &Tuning) {
    let checkpoints = (state.elapsed_ms() / DIFFICULTY_STEP_MS) as u32;
    while state.difficulty_level < checkpoints {
        state.difficulty_level += 1;
        state.spawn_interval_ms = (state.spawn_interval_ms * SPAWN_INTERVAL_DECAY)
            .max(tuning.spawn.min_spawn_interval_ms);
        log::debug!(
            "Difficulty {}: spawn interval {:.0}ms",
            state.difficulty_level,
            state.spawn_interval_ms
        );
    }
}
