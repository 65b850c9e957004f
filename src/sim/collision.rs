//! Collision detection and response
//!
//! Everything is a circle. Relations are resolved one at a time in a fixed
//! order (player↔enemy, projectile↔enemy, player↔XP, player↔shard,
//! player↔power-up); each function here handles one relation and hands its
//! deltas to the progression manager.

use glam::Vec2;
use rand::Rng;

use super::events::{EntityRef, GameEvent, PickupKind};
use super::state::{Enemy, Explosion, GameState, Particle, PowerUp, Shard, XpOrb};
use super::tick::TickContext;
use crate::consts::CONTACT_DAMAGE;
use crate::settings::HitPolicy;
use crate::tuning::{PowerUpKind, Tuning, weighted_index};

/// Two circles collide iff the distance between centers is below the sum of radii
#[inline]
pub fn circles_overlap(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    let reach = r1 + r2;
    c1.distance_squared(c2) < reach * reach
}

/// Player↔enemy contact. Returns how many enemies touched the player.
///
/// Skipped entirely while the player is invincible or dashing. Each touching
/// enemy takes `CONTACT_DAMAGE` and is removed at once if that kills it.
pub fn player_enemy(state: &mut GameState, events: &mut Vec<GameEvent>) -> u32 {
    if state.player.is_protected(state.time_ticks) {
        return 0;
    }

    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let mut hits = 0;
    let mut i = 0;
    while i < state.enemies.len() {
        let enemy = &mut state.enemies.as_mut_slice()[i];
        if !circles_overlap(player_pos, player_radius, enemy.pos, enemy.radius) {
            i += 1;
            continue;
        }

        hits += 1;
        enemy.health -= CONTACT_DAMAGE;
        events.push(GameEvent::EntityHit {
            entity: EntityRef::Enemy(enemy.id),
            damage: CONTACT_DAMAGE,
            remaining_health: enemy.health.max(0),
        });

        if enemy.health <= 0 {
            let dead = state.enemies.remove_at(i);
            events.push(GameEvent::EntityDied {
                entity: EntityRef::Enemy(dead.id),
                archetype: dead.archetype,
                pos: dead.pos,
            });
        } else {
            i += 1;
        }
    }
    hits
}

/// Projectile↔enemy hits. Every projectile that touches an enemy is consumed.
///
/// With [`HitPolicy::SingleTarget`] a projectile damages only the lowest-id
/// enemy it overlaps; with [`HitPolicy::AllOverlapping`] it damages all of
/// them. Killed enemies are removed immediately and their death follows the
/// lethal hit in the event stream. Drops are spawned once every projectile
/// has resolved.
pub fn projectile_enemy(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let mut consumed = Vec::new();
    let mut killed = Vec::new();

    for projectile in state.projectiles.iter() {
        let mut hit = false;
        let mut i = 0;
        while i < state.enemies.len() {
            let enemy = &mut state.enemies.as_mut_slice()[i];
            if !circles_overlap(projectile.pos, projectile.radius, enemy.pos, enemy.radius) {
                i += 1;
                continue;
            }

            hit = true;
            enemy.health -= projectile.damage;
            ctx.events.push(GameEvent::EntityHit {
                entity: EntityRef::Enemy(enemy.id),
                damage: projectile.damage,
                remaining_health: enemy.health.max(0),
            });

            if enemy.health <= 0 {
                let dead = state.enemies.remove_at(i);
                ctx.events.push(GameEvent::EntityDied {
                    entity: EntityRef::Enemy(dead.id),
                    archetype: dead.archetype.clone(),
                    pos: dead.pos,
                });
                killed.push(dead);
            } else {
                i += 1;
            }

            if ctx.hit_policy == HitPolicy::SingleTarget {
                break;
            }
        }
        if hit {
            consumed.push(projectile.id);
        }
    }

    state.projectiles.remove_all(&consumed);

    for enemy in killed {
        on_enemy_killed(state, ctx, enemy);
    }
}

/// Award score and spawn the drops of an enemy killed by the weapon
fn on_enemy_killed(state: &mut GameState, ctx: &mut TickContext<'_>, enemy: Enemy) {
    let archetype = ctx.tuning.enemy(&enemy.archetype);
    state.kills += 1;
    state.score += archetype.score;

    let drops = &ctx.tuning.drops;

    // XP always drops
    let xp_value = ctx.mods.scale_xp(archetype.xp_value);
    let orb_id = state.ids.next_xp_orb();
    state.xp_orbs.insert(XpOrb {
        id: orb_id,
        pos: enemy.pos,
        radius: drops.xp_orb_radius,
        value: xp_value,
    });

    let explosion = spawn_explosion(state, ctx.tuning, enemy.pos);
    ctx.events.push(GameEvent::ExplosionCreated {
        id: explosion,
        pos: enemy.pos,
    });

    let shard_roll: f32 = state.rng.random();
    if shard_roll < drops.shard_chance {
        let jitter = Vec2::new(
            (state.rng.random::<f32>() * 2.0 - 1.0) * drops.shard_jitter,
            (state.rng.random::<f32>() * 2.0 - 1.0) * drops.shard_jitter,
        );
        let id = state.ids.next_shard();
        state.shards.insert(Shard {
            id,
            pos: enemy.pos + jitter,
            radius: drops.shard_radius,
            value: archetype.shard_value,
        });
    }

    if ctx.tuning.power_ups.is_empty() {
        return;
    }
    let power_up_roll: f32 = state.rng.random();
    if power_up_roll < drops.power_up_chance {
        let pick: f32 = state.rng.random();
        if let Some(idx) = weighted_index(ctx.tuning.power_ups.iter().map(|p| p.weight), pick) {
            let archetype = &ctx.tuning.power_ups[idx];
            let id = state.ids.next_power_up();
            log::debug!("Dropped power-up {} (#{id})", archetype.id);
            state.power_ups.insert(PowerUp {
                id,
                archetype: archetype.id.clone(),
                kind: archetype.kind,
                pos: enemy.pos,
                radius: archetype.radius,
                expires_at_tick: state.time_ticks + crate::ms_to_ticks(archetype.lifetime_ms),
            });
        }
    }
}

/// Spawn an evenly spread particle burst. Uses no randomness so visuals never
/// perturb the gameplay RNG.
pub fn spawn_explosion(state: &mut GameState, tuning: &Tuning, pos: Vec2) -> u32 {
    let burst = &tuning.explosion;
    let life = crate::ms_to_ticks(burst.life_ms) as f32;
    let count = burst.count.max(1);
    let particles = (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            // Alternate fast and slow particles for a less uniform ring
            let speed = if i % 2 == 0 { burst.speed } else { burst.speed * 0.6 };
            Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life,
                max_life: life,
            }
        })
        .collect();

    let id = state.ids.next_effect();
    state.explosions.insert(Explosion {
        id,
        pos,
        radius: burst.radius,
        particles,
    });
    id
}

/// Collection radius around the player (magnet power-up widens it)
fn pickup_reach(state: &GameState, tuning: &Tuning) -> f32 {
    let base = state.player.radius + tuning.player.pickup_reach;
    base * state.effects.magnitude(PowerUpKind::Magnet).unwrap_or(1.0)
}

/// Player↔XP orb. Returns the collected orbs.
pub fn player_xp_orbs(state: &mut GameState, ctx: &mut TickContext<'_>) -> Vec<XpOrb> {
    let reach = pickup_reach(state, ctx.tuning);
    let orbs = state.xp_orbs.drain_overlapping(state.player.pos, reach);
    for orb in &orbs {
        ctx.events.push(GameEvent::PickupCollected {
            kind: PickupKind::Xp,
            id: orb.id,
            value: orb.value,
            pos: orb.pos,
        });
    }
    orbs
}

/// Player↔shard. Credits the summed value to the ledger; returns the sum.
pub fn player_shards(state: &mut GameState, ctx: &mut TickContext<'_>) -> u32 {
    let reach = pickup_reach(state, ctx.tuning);
    let shards = state.shards.drain_overlapping(state.player.pos, reach);
    let mut total: u32 = 0;
    for shard in &shards {
        total = total.saturating_add(shard.value);
        ctx.events.push(GameEvent::PickupCollected {
            kind: PickupKind::Shard,
            id: shard.id,
            value: shard.value,
            pos: shard.pos,
        });
    }
    if total > 0 {
        ctx.ledger.add_currency(total);
    }
    total
}

/// Player↔power-up. Returns the collected pickups.
pub fn player_power_ups(state: &mut GameState, ctx: &mut TickContext<'_>) -> Vec<PowerUp> {
    let picked = state
        .power_ups
        .drain_overlapping(state.player.pos, state.player.radius);
    for power_up in &picked {
        ctx.events.push(GameEvent::PickupCollected {
            kind: PickupKind::PowerUp(power_up.archetype.clone()),
            id: power_up.id,
            value: 1,
            pos: power_up.pos,
        });
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{GamePhase, Projectile};
    use crate::upgrades::{MemoryLedger, Modifiers};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn running_state(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(&Settings::default(), tuning, &Modifiers::default());
        state.phase = GamePhase::Running;
        state
    }

    fn enemy(state: &mut GameState, tuning: &Tuning, archetype: &str, pos: Vec2) -> u32 {
        let a = tuning.enemy(archetype);
        let id = state.ids.next_enemy();
        state.enemies.insert(Enemy {
            id,
            archetype: a.id.clone(),
            pos,
            radius: a.radius,
            health: a.health,
            speed: a.speed,
            color: a.color,
        });
        id
    }

    fn projectile(state: &mut GameState, pos: Vec2, damage: i32) -> u32 {
        let id = state.ids.next_projectile();
        state.projectiles.insert(Projectile {
            id,
            pos,
            vel: Vec2::new(1.0, 0.0),
            radius: 5.0,
            damage,
            range: 300.0,
            distance_traveled: 1.0,
        });
        id
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.9, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn test_player_enemy_mutual_damage() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        let p = state.player.pos;
        let standard = enemy(&mut state, &tuning, "standard", p + Vec2::new(5.0, 0.0));
        let brute = enemy(&mut state, &tuning, "brute", p - Vec2::new(5.0, 0.0));
        let far = enemy(&mut state, &tuning, "standard", p + Vec2::new(200.0, 0.0));

        let mut events = Vec::new();
        let hits = player_enemy(&mut state, &mut events);
        assert_eq!(hits, 2);
        assert!(!state.enemies.contains(standard));
        assert_eq!(state.enemies.get(brute).unwrap().health, 2);
        assert!(state.enemies.contains(far));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::EntityDied { entity: EntityRef::Enemy(id), .. } if *id == standard
        )));
    }

    #[test]
    fn test_player_enemy_skipped_while_protected() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        let p = state.player.pos;
        for _ in 0..4 {
            enemy(&mut state, &tuning, "brute", p);
        }
        state.player.grant_invincibility(100);
        let mut events = Vec::new();
        assert_eq!(player_enemy(&mut state, &mut events), 0);
        assert!(events.is_empty());
        assert!(state.enemies.iter().all(|e| e.health == 3));

        state.player.invincibility = crate::sim::state::Invincibility::Vulnerable;
        state.player.dash.active_until = state.time_ticks + 5;
        assert_eq!(player_enemy(&mut state, &mut events), 0);
    }

    fn ctx_parts() -> (Tuning, MemoryLedger, Vec<GameEvent>) {
        (Tuning::default(), MemoryLedger::new(), Vec::new())
    }

    #[test]
    fn test_single_target_projectile_hits_lowest_id() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let spot = Vec2::new(100.0, 100.0);
        let first = enemy(&mut state, &tuning, "brute", spot);
        let second = enemy(&mut state, &tuning, "brute", spot);
        projectile(&mut state, spot, 1);

        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        projectile_enemy(&mut state, &mut ctx);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.enemies.get(first).unwrap().health, 2);
        assert_eq!(state.enemies.get(second).unwrap().health, 3);
    }

    #[test]
    fn test_all_overlapping_projectile_hits_every_enemy() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let spot = Vec2::new(100.0, 100.0);
        enemy(&mut state, &tuning, "brute", spot);
        enemy(&mut state, &tuning, "brute", spot);
        projectile(&mut state, spot, 1);

        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::AllOverlapping,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        projectile_enemy(&mut state, &mut ctx);
        assert!(state.projectiles.is_empty());
        assert!(state.enemies.iter().all(|e| e.health == 2));
    }

    #[test]
    fn test_dead_enemy_is_not_hit_again() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let spot = Vec2::new(100.0, 100.0);
        let target = enemy(&mut state, &tuning, "standard", spot);
        projectile(&mut state, spot, 1);
        let second = projectile(&mut state, spot, 1);

        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        projectile_enemy(&mut state, &mut ctx);
        assert!(!state.enemies.contains(target));
        // The second projectile found nothing left to hit
        assert!(state.projectiles.contains(second));
        let deaths = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityDied { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_death_follows_lethal_hit() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let left = Vec2::new(100.0, 100.0);
        let right = Vec2::new(300.0, 100.0);
        let first = enemy(&mut state, &tuning, "standard", left);
        let second = enemy(&mut state, &tuning, "standard", right);
        projectile(&mut state, left, 1);
        projectile(&mut state, right, 1);

        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        projectile_enemy(&mut state, &mut ctx);

        let kinds: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::EntityHit { entity: EntityRef::Enemy(id), .. } => Some(("hit", *id)),
                GameEvent::EntityDied { entity: EntityRef::Enemy(id), .. } => Some(("died", *id)),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![("hit", first), ("died", first), ("hit", second), ("died", second)]
        );
        assert_eq!(state.kills, 2);
    }

    #[test]
    fn test_brute_dies_on_third_hit_with_seeded_shard() {
        for seed in 0..40u64 {
            let (tuning, mut ledger, mut events) = ctx_parts();
            let mut state = running_state(&tuning);
            state.rng = Pcg32::seed_from_u64(seed);
            let spot = Vec2::new(150.0, 150.0);
            let brute = enemy(&mut state, &tuning, "brute", spot);

            for hit in 1..=3 {
                projectile(&mut state, spot, 1);
                let expected_draw: f32 = state.rng.clone().random();
                let mut ctx = TickContext {
                    tuning: &tuning,
                    hit_policy: HitPolicy::SingleTarget,
                    mods: Modifiers::default(),
                    ledger: &mut ledger,
                    events: &mut events,
                };
                projectile_enemy(&mut state, &mut ctx);

                if hit < 3 {
                    assert_eq!(state.enemies.get(brute).unwrap().health, 3 - hit);
                    assert!(state.xp_orbs.is_empty());
                    continue;
                }

                assert!(!state.enemies.contains(brute));
                assert_eq!(state.xp_orbs.len(), 1);
                let orb = state.xp_orbs.iter().next().unwrap();
                assert_eq!(orb.value, tuning.enemy("brute").xp_value);
                assert_eq!(orb.pos, spot);
                assert_eq!(state.explosions.len(), 1);
                assert_eq!(state.shards.len(), usize::from(expected_draw < 0.15));
                if let Some(shard) = state.shards.iter().next() {
                    assert_eq!(shard.value, tuning.enemy("brute").shard_value);
                    assert!((shard.pos - spot).abs().max_element() <= tuning.drops.shard_jitter);
                }
            }
        }
    }

    #[test]
    fn test_xp_bonus_floors_value() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let spot = Vec2::new(100.0, 100.0);
        enemy(&mut state, &tuning, "standard", spot);
        projectile(&mut state, spot, 1);
        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers {
                xp_percent: 125,
                ..Modifiers::default()
            },
            ledger: &mut ledger,
            events: &mut events,
        };
        projectile_enemy(&mut state, &mut ctx);
        // 10 * 1.25 = 12.5 -> 12
        assert_eq!(state.xp_orbs.iter().next().unwrap().value, 12);
        assert_eq!(state.score, 10);
        assert_eq!(state.kills, 1);
    }

    #[test]
    fn test_shards_credit_ledger_once() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let p = state.player.pos;
        for value in [2, 3] {
            let id = state.ids.next_shard();
            state.shards.insert(Shard {
                id,
                pos: p,
                radius: 5.0,
                value,
            });
        }
        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        assert_eq!(player_shards(&mut state, &mut ctx), 5);
        assert_eq!(player_shards(&mut state, &mut ctx), 0);
        assert!(state.shards.is_empty());
        assert_eq!(ledger.currency, 5);
    }

    #[test]
    fn test_magnet_widens_pickup_reach() {
        let (tuning, mut ledger, mut events) = ctx_parts();
        let mut state = running_state(&tuning);
        let id = state.ids.next_xp_orb();
        state.xp_orbs.insert(XpOrb {
            id,
            pos: state.player.pos + Vec2::new(40.0, 0.0),
            radius: 6.0,
            value: 10,
        });

        let mut ctx = TickContext {
            tuning: &tuning,
            hit_policy: HitPolicy::SingleTarget,
            mods: Modifiers::default(),
            ledger: &mut ledger,
            events: &mut events,
        };
        assert!(player_xp_orbs(&mut state, &mut ctx).is_empty());

        state.effects.activate(crate::sim::state::ActiveEffect {
            kind: PowerUpKind::Magnet,
            magnitude: 3.0,
            until_tick: 1000,
        });
        assert_eq!(player_xp_orbs(&mut state, &mut ctx).len(), 1);
    }
}
