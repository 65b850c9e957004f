//! Per-tick position integration
//!
//! Enemies seek the player, projectiles fly straight and are dropped once
//! spent or out of bounds, explosion particles drift and fade. Pickups and
//! the player never move here.

use glam::Vec2;

use super::state::{Enemy, GameState, Projectile};
use crate::consts::BOUNDS_MARGIN;
use crate::tuning::Tuning;

pub fn update(state: &mut GameState, tuning: &Tuning) {
    let target = state.player.pos;
    for enemy in &mut state.enemies {
        seek(enemy, target);
    }

    for projectile in &mut state.projectiles {
        advance_projectile(projectile);
    }
    let bounds = state.bounds;
    state
        .projectiles
        .retain(|p| p.distance_traveled < p.range && in_bounds(p.pos, bounds, BOUNDS_MARGIN));

    let drag = tuning.explosion.drag;
    for explosion in &mut state.explosions {
        for particle in explosion.particles.iter_mut().filter(|p| p.is_alive()) {
            particle.pos += particle.vel;
            particle.vel *= drag;
            particle.life -= 1.0;
        }
    }
}

/// Step an enemy straight toward `target`. No-op when already on top of it.
pub fn seek(enemy: &mut Enemy, target: Vec2) {
    if let Some(dir) = (target - enemy.pos).try_normalize() {
        enemy.pos += dir * enemy.speed;
    }
}

pub fn advance_projectile(projectile: &mut Projectile) {
    projectile.pos += projectile.vel;
    projectile.distance_traveled += projectile.vel.length();
}

/// Whether `pos` is within the playfield grown by `margin` on every side
pub fn in_bounds(pos: Vec2, bounds: Vec2, margin: f32) -> bool {
    pos.x >= -margin && pos.y >= -margin && pos.x <= bounds.x + margin && pos.y <= bounds.y + margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{Explosion, Particle};
    use crate::upgrades::Modifiers;

    fn state() -> GameState {
        GameState::new(&Settings::default(), &Tuning::default(), &Modifiers::default())
    }

    fn enemy_at(pos: Vec2, speed: f32) -> Enemy {
        Enemy {
            id: 1,
            archetype: "standard".into(),
            pos,
            radius: 15.0,
            health: 1,
            speed,
            color: 0,
        }
    }

    #[test]
    fn test_seek_moves_speed_toward_target() {
        let mut enemy = enemy_at(Vec2::new(0.0, 0.0), 2.0);
        seek(&mut enemy, Vec2::new(30.0, 40.0));
        assert!((enemy.pos - Vec2::new(1.2, 1.6)).length() < 1e-5);
    }

    #[test]
    fn test_seek_zero_distance_is_noop() {
        let mut enemy = enemy_at(Vec2::new(5.0, 5.0), 2.0);
        seek(&mut enemy, Vec2::new(5.0, 5.0));
        assert_eq!(enemy.pos, Vec2::new(5.0, 5.0));
        assert!(enemy.pos.is_finite());
    }

    #[test]
    fn test_projectile_pruned_at_range() {
        let tuning = Tuning::default();
        let mut state = state();
        state.projectiles.insert(Projectile {
            id: 1,
            pos: Vec2::new(200.0, 400.0),
            vel: Vec2::new(0.0, 10.0),
            radius: 5.0,
            damage: 1,
            range: 25.0,
            distance_traveled: 0.0,
        });

        update(&mut state, &tuning);
        update(&mut state, &tuning);
        let p = state.projectiles.get(1).unwrap();
        assert_eq!(p.distance_traveled, 20.0);
        assert_eq!(p.pos, Vec2::new(200.0, 420.0));

        update(&mut state, &tuning);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_projectile_pruned_out_of_bounds() {
        let tuning = Tuning::default();
        let mut state = state();
        state.projectiles.insert(Projectile {
            id: 1,
            pos: Vec2::new(-BOUNDS_MARGIN + 5.0, 100.0),
            vel: Vec2::new(-10.0, 0.0),
            radius: 5.0,
            damage: 1,
            range: 1000.0,
            distance_traveled: 0.0,
        });
        update(&mut state, &tuning);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_particles_fade() {
        let tuning = Tuning::default();
        let mut state = state();
        state.explosions.insert(Explosion {
            id: 1,
            pos: Vec2::ZERO,
            radius: 3.0,
            particles: vec![Particle {
                pos: Vec2::ZERO,
                vel: Vec2::new(1.0, 0.0),
                life: 2.0,
                max_life: 2.0,
            }],
        });
        update(&mut state, &tuning);
        let explosion = state.explosions.get(1).unwrap();
        assert_eq!(explosion.particles[0].pos, Vec2::new(1.0, 0.0));
        assert!(!explosion.is_finished());
        update(&mut state, &tuning);
        assert!(state.explosions.get(1).unwrap().is_finished());
    }
}
