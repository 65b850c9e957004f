//! Time-driven enemy spawning and weapon fire

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::registry::Registry;
use super::state::{Enemy, GamePhase, GameState, Projectile};
use super::tick::TickContext;
use crate::consts::TICK_MS;
use crate::tuning::{PowerUpKind, Tuning, WeaponArchetype, weighted_index};
use crate::upgrades::Modifiers;

/// Advance spawn and fire timers by one tick, acting on every elapsed interval
pub fn update(state: &mut GameState, ctx: &mut TickContext<'_>) {
    if state.phase != GamePhase::Running {
        return;
    }

    state.spawn_timer_ms += TICK_MS;
    while state.spawn_timer_ms >= state.spawn_interval_ms {
        state.spawn_timer_ms -= state.spawn_interval_ms;
        spawn_enemy(state, ctx.tuning);
    }

    let interval = fire_interval_ms(&ctx.tuning.weapon, &ctx.mods, state);
    state.fire_timer_ms += TICK_MS;
    while state.fire_timer_ms >= interval {
        state.fire_timer_ms -= interval;
        fire_weapon(state, ctx);
    }
}

/// Weapon interval after the fire-rate upgrade and rapid-fire power-up
pub fn fire_interval_ms(weapon: &WeaponArchetype, mods: &Modifiers, state: &GameState) -> f32 {
    let rapid = state.effects.magnitude(PowerUpKind::RapidFire).unwrap_or(1.0);
    ((weapon.fire_interval_ms - mods.fire_rate_reduction_ms) * rapid).max(weapon.min_fire_interval_ms)
}

/// Spawn a weighted-random enemy just outside a random playfield edge
pub fn spawn_enemy(state: &mut GameState, tuning: &Tuning) -> Option<u32> {
    if state.phase != GamePhase::Running {
        return None;
    }

    let roll: f32 = state.rng.random();
    let Some(idx) = weighted_index(tuning.enemies.iter().map(|e| e.weight), roll) else {
        log::warn!("No spawnable enemy archetypes");
        return None;
    };
    let archetype = &tuning.enemies[idx];

    let edge = state.rng.random_range(0..4u32);
    let along: f32 = state.rng.random();
    let b = state.bounds;
    let r = archetype.radius;
    let pos = match edge {
        0 => Vec2::new(along * b.x, -r),
        1 => Vec2::new(b.x + r, along * b.y),
        2 => Vec2::new(along * b.x, b.y + r),
        _ => Vec2::new(-r, along * b.y),
    };

    let id = state.ids.next_enemy();
    state.enemies.insert(Enemy {
        id,
        archetype: archetype.id.clone(),
        pos,
        radius: r,
        health: archetype.health,
        speed: archetype.speed,
        color: archetype.color,
    });
    log::debug!("Spawned {} #{id} at ({:.0}, {:.0})", archetype.id, pos.x, pos.y);
    Some(id)
}

/// Closest enemy strictly inside `range` of `origin`; ties go to the lowest id
pub fn nearest_in_range(enemies: &Registry<Enemy>, origin: Vec2, range: f32) -> Option<&Enemy> {
    enemies
        .iter()
        .map(|e| (e, e.pos.distance(origin)))
        .filter(|(_, dist)| *dist < range)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(e, _)| e)
}

/// Fire one projectile at the nearest in-range enemy.
///
/// Returns the new projectile id, or `None` when there is nothing to shoot
/// at (no target in range, or the target sits exactly on the player).
pub fn fire_weapon(state: &mut GameState, ctx: &mut TickContext<'_>) -> Option<u32> {
    if state.phase != GamePhase::Running {
        return None;
    }

    let weapon = &ctx.tuning.weapon;
    let origin = state.player.pos;
    let target = nearest_in_range(&state.enemies, origin, weapon.range)?;
    let target_id = target.id;
    let direction = (target.pos - origin).try_normalize()?;

    let id = state.ids.next_projectile();
    state.projectiles.insert(Projectile {
        id,
        pos: origin,
        vel: direction * weapon.speed * ctx.mods.speed_multiplier,
        radius: weapon.radius,
        damage: weapon.damage + ctx.mods.damage_bonus,
        range: weapon.range,
        distance_traveled: 0.0,
    });
    ctx.events.push(GameEvent::WeaponFired {
        projectile_id: id,
        target_id,
        origin,
        direction,
    });
    Some(id)
}
