//! Game state and core simulation types
//!
//! Everything the tick mutates lives here: the player, the entity
//! registries, timers and the seeded RNG.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::registry::{Entity, Registry};
use crate::consts::START_XP_TO_NEXT_LEVEL;
use crate::settings::Settings;
use crate::tuning::{PowerUpKind, Tuning};
use crate::upgrades::Modifiers;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Fresh state, waiting for `start`
    Ready,
    /// Ticks are processed
    Running,
    /// Ticks are suspended; state untouched
    Paused,
    /// Run ended; only `reset` leaves this phase
    GameOver,
}

/// Player invincibility window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invincibility {
    Vulnerable,
    /// Immune to contact damage until (exclusive) the given tick
    Invincible { until_tick: u64 },
}

/// Player dash timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dash {
    /// Dash is active while `tick < active_until`
    pub active_until: u64,
    /// A new dash may start once `tick >= ready_at`
    pub ready_at: u64,
}

impl Dash {
    pub fn is_active(&self, tick: u64) -> bool {
        tick < self.active_until
    }

    pub fn is_ready(&self, tick: u64) -> bool {
        tick >= self.ready_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: START_XP_TO_NEXT_LEVEL,
        }
    }
}

/// The player avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub health: i32,
    pub max_health: i32,
    pub invincibility: Invincibility,
    pub dash: Dash,
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(pos: Vec2, radius: f32, max_health: i32) -> Self {
        Self {
            pos,
            radius,
            health: max_health,
            max_health,
            invincibility: Invincibility::Vulnerable,
            dash: Dash::default(),
            stats: PlayerStats::default(),
        }
    }

    pub fn is_invincible(&self) -> bool {
        matches!(self.invincibility, Invincibility::Invincible { .. })
    }

    /// Ticks of invincibility left at `tick`
    pub fn invincibility_remaining(&self, tick: u64) -> u64 {
        match self.invincibility {
            Invincibility::Vulnerable => 0,
            Invincibility::Invincible { until_tick } => until_tick.saturating_sub(tick),
        }
    }

    /// Start (or extend) invincibility; never shortens an active window
    pub fn grant_invincibility(&mut self, until_tick: u64) {
        let until_tick = match self.invincibility {
            Invincibility::Invincible { until_tick: current } => current.max(until_tick),
            Invincibility::Vulnerable => until_tick,
        };
        self.invincibility = Invincibility::Invincible { until_tick };
    }

    /// Immune to contact damage this tick (invincible or dashing)
    pub fn is_protected(&self, tick: u64) -> bool {
        self.is_invincible() || self.dash.is_active(tick)
    }
}

/// An enemy that seeks the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub archetype: String,
    pub pos: Vec2,
    pub radius: f32,
    pub health: i32,
    /// Pixels per tick
    pub speed: f32,
    pub color: u32,
}

/// A straight-flying weapon projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub radius: f32,
    pub damage: i32,
    pub range: f32,
    pub distance_traveled: f32,
}

/// Experience dropped by a killed enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpOrb {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub value: u32,
}

/// Currency dropped by a killed enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub value: u32,
}

/// A collectible timed power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub archetype: String,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Removed uncollected at this tick
    pub expires_at_tick: u64,
}

/// A single explosion particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in ticks
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// Fade factor for rendering (1 = fresh, 0 = gone)
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// Transient particle burst left where an enemy died
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub particles: Vec<Particle>,
}

impl Explosion {
    pub fn is_finished(&self) -> bool {
        self.particles.iter().all(|p| !p.is_alive())
    }
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> u32 {
                    self.id
                }
                fn pos(&self) -> Vec2 {
                    self.pos
                }
                fn radius(&self) -> f32 {
                    self.radius
                }
            }
        )*
    };
}

impl_entity!(Enemy, Projectile, XpOrb, Shard, PowerUp, Explosion);

/// Per-category id counters. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIds {
    pub enemy: u32,
    pub projectile: u32,
    pub xp_orb: u32,
    pub shard: u32,
    pub power_up: u32,
    pub effect: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self {
            enemy: 1,
            projectile: 1,
            xp_orb: 1,
            shard: 1,
            power_up: 1,
            effect: 1,
        }
    }
}

fn bump(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter += 1;
    id
}

impl EntityIds {
    pub fn next_enemy(&mut self) -> u32 {
        bump(&mut self.enemy)
    }
    pub fn next_projectile(&mut self) -> u32 {
        bump(&mut self.projectile)
    }
    pub fn next_xp_orb(&mut self) -> u32 {
        bump(&mut self.xp_orb)
    }
    pub fn next_shard(&mut self) -> u32 {
        bump(&mut self.shard)
    }
    pub fn next_power_up(&mut self) -> u32 {
        bump(&mut self.power_up)
    }
    pub fn next_effect(&mut self) -> u32 {
        bump(&mut self.effect)
    }
}

/// Chain of pickups collected in quick succession
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    pub last_pickup_tick: u64,
    pub best: u32,
}

/// A power-up effect currently applied to the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub magnitude: f32,
    pub until_tick: u64,
}

/// Active power-up effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    /// Start an effect; re-collecting the same kind refreshes it
    pub fn activate(&mut self, effect: ActiveEffect) {
        match self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            Some(existing) => {
                existing.magnitude = effect.magnitude;
                existing.until_tick = existing.until_tick.max(effect.until_tick);
            }
            None => self.effects.push(effect),
        }
    }

    /// Magnitude of an active effect, if any
    pub fn magnitude(&self, kind: PowerUpKind) -> Option<f32> {
        self.effects
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.magnitude)
    }

    pub fn expire(&mut self, tick: u64) {
        self.effects.retain(|e| tick < e.until_tick);
    }
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Playfield size (origin at top-left)
    pub bounds: Vec2,
    pub player: Player,
    pub enemies: Registry<Enemy>,
    pub projectiles: Registry<Projectile>,
    pub xp_orbs: Registry<XpOrb>,
    pub shards: Registry<Shard>,
    pub power_ups: Registry<PowerUp>,
    /// Visual effects (not gameplay-affecting)
    pub explosions: Registry<Explosion>,
    pub effects: ActiveEffects,
    pub ids: EntityIds,
    /// Milliseconds accumulated toward the next enemy spawn
    pub spawn_timer_ms: f32,
    /// Milliseconds accumulated toward the next weapon shot
    pub fire_timer_ms: f32,
    pub spawn_interval_ms: f32,
    /// Difficulty checkpoints applied so far
    pub difficulty_level: u32,
    pub score: u64,
    pub kills: u32,
    pub combo: Combo,
}

impl GameState {
    /// Create a start-of-run state
    pub fn new(settings: &Settings, tuning: &Tuning, mods: &Modifiers) -> Self {
        let bounds = settings.playfield();
        let max_health = (tuning.player.base_health + mods.health_bonus).max(1);
        Self {
            seed: settings.seed,
            rng: Pcg32::seed_from_u64(settings.seed),
            phase: GamePhase::Ready,
            time_ticks: 0,
            bounds,
            player: Player::new(bounds * 0.5, tuning.player.radius, max_health),
            enemies: Registry::new(),
            projectiles: Registry::new(),
            xp_orbs: Registry::new(),
            shards: Registry::new(),
            power_ups: Registry::new(),
            explosions: Registry::new(),
            effects: ActiveEffects::default(),
            ids: EntityIds::default(),
            spawn_timer_ms: 0.0,
            fire_timer_ms: 0.0,
            spawn_interval_ms: tuning.spawn.base_spawn_interval_ms,
            difficulty_level: 0,
            score: 0,
            kills: 0,
            combo: Combo::default(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Elapsed survival time in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        crate::ticks_to_ms(self.time_ticks)
    }

    /// Clamp a position so the player circle stays inside the playfield
    pub fn clamp_to_playfield(&self, pos: Vec2) -> Vec2 {
        let r = Vec2::splat(self.player.radius).min(self.bounds * 0.5);
        pos.clamp(r, self.bounds - r)
    }
}

/// Read-only view of the state for renderers and other observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub time_ticks: u64,
    pub elapsed_ms: u64,
    pub bounds: Vec2,
    pub player: Player,
    pub enemies: Registry<Enemy>,
    pub projectiles: Registry<Projectile>,
    pub xp_orbs: Registry<XpOrb>,
    pub shards: Registry<Shard>,
    pub power_ups: Registry<PowerUp>,
    pub explosions: Registry<Explosion>,
    pub effects: ActiveEffects,
    pub spawn_interval_ms: f32,
    pub difficulty_level: u32,
    pub score: u64,
    pub kills: u32,
    pub combo: Combo,
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        Self {
            phase: state.phase,
            time_ticks: state.time_ticks,
            elapsed_ms: state.elapsed_ms(),
            bounds: state.bounds,
            player: state.player.clone(),
            enemies: state.enemies.clone(),
            projectiles: state.projectiles.clone(),
            xp_orbs: state.xp_orbs.clone(),
            shards: state.shards.clone(),
            power_ups: state.power_ups.clone(),
            explosions: state.explosions.clone(),
            effects: state.effects.clone(),
            spawn_interval_ms: state.spawn_interval_ms,
            difficulty_level: state.difficulty_level,
            score: state.score,
            kills: state.kills,
            combo: state.combo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_centered_player() {
        let settings = Settings::default();
        let state = GameState::new(&settings, &Tuning::default(), &Modifiers::default());
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.player.pos, settings.playfield() * 0.5);
        assert_eq!(state.player.health, 3);
        assert_eq!(state.player.stats, PlayerStats::default());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_health_upgrade_raises_max_health() {
        let mods = Modifiers {
            health_bonus: 2,
            ..Modifiers::default()
        };
        let state = GameState::new(&Settings::default(), &Tuning::default(), &mods);
        assert_eq!(state.player.max_health, 5);
        assert_eq!(state.player.health, 5);
    }

    #[test]
    fn test_invincibility_extends_not_stacks() {
        let mut player = Player::new(Vec2::ZERO, 10.0, 3);
        player.grant_invincibility(60);
        player.grant_invincibility(30);
        assert_eq!(player.invincibility, Invincibility::Invincible { until_tick: 60 });
        player.grant_invincibility(90);
        assert_eq!(player.invincibility_remaining(10), 80);
    }

    #[test]
    fn test_clamp_to_playfield() {
        let state = GameState::new(
            &Settings::default(),
            &Tuning::default(),
            &Modifiers::default(),
        );
        let r = state.player.radius;
        assert_eq!(state.clamp_to_playfield(Vec2::new(-50.0, 5000.0)), Vec2::new(r, state.bounds.y - r));
    }

    #[test]
    fn test_particle_alpha() {
        let p = Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 15.0,
            max_life: 30.0,
        };
        assert!((p.alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_effect_refresh() {
        let mut effects = ActiveEffects::default();
        let magnet = ActiveEffect {
            kind: PowerUpKind::Magnet,
            magnitude: 3.0,
            until_tick: 100,
        };
        effects.activate(magnet);
        effects.activate(ActiveEffect {
            until_tick: 150,
            ..magnet
        });
        assert_eq!(effects.effects.len(), 1);
        effects.expire(149);
        assert_eq!(effects.magnitude(PowerUpKind::Magnet), Some(3.0));
        effects.expire(150);
        assert_eq!(effects.magnitude(PowerUpKind::Magnet), None);
    }
}
