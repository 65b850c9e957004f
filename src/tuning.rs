//! Data-driven game balance
//!
//! Read-only archetype tables keyed by string id. The simulation never fails
//! on a missing entry: lookups for unknown ids fall back to an inert
//! zero-valued archetype.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ensure_positive, ensure_probability};

/// An enemy template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub id: String,
    pub health: i32,
    /// Pixels per tick
    pub speed: f32,
    pub radius: f32,
    /// Cosmetic only (0xRRGGBB)
    pub color: u32,
    /// XP orb value dropped on death (before the XP multiplier)
    pub xp_value: u32,
    /// Shard value dropped on death (when the drop roll succeeds)
    pub shard_value: u32,
    /// Score awarded on kill
    pub score: u64,
    /// Relative spawn weight
    pub weight: f32,
}

static UNKNOWN_ENEMY: EnemyArchetype = EnemyArchetype {
    id: String::new(),
    health: 0,
    speed: 0.0,
    radius: 0.0,
    color: 0,
    xp_value: 0,
    shard_value: 0,
    score: 0,
    weight: 0.0,
};

/// The auto-firing weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponArchetype {
    pub id: String,
    pub damage: i32,
    /// Pixels per tick
    pub speed: f32,
    /// Targeting radius and maximum projectile travel
    pub range: f32,
    pub radius: f32,
    pub fire_interval_ms: f32,
    /// Floor for the upgrade/power-up modified interval
    pub min_fire_interval_ms: f32,
}

impl Default for WeaponArchetype {
    fn default() -> Self {
        Self {
            id: "blaster".into(),
            damage: 1,
            speed: 10.0,
            range: 300.0,
            radius: 5.0,
            fire_interval_ms: 500.0,
            min_fire_interval_ms: 100.0,
        }
    }
}

/// Explosion burst template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleArchetype {
    pub id: String,
    pub count: u32,
    /// Initial particle speed (pixels per tick)
    pub speed: f32,
    pub life_ms: f32,
    /// Per-tick velocity retention
    pub drag: f32,
    pub radius: f32,
}

impl Default for ParticleArchetype {
    fn default() -> Self {
        Self {
            id: "explosion".into(),
            count: 12,
            speed: 3.0,
            life_ms: 500.0,
            drag: 0.92,
            radius: 3.0,
        }
    }
}

/// Timed effect granted by a power-up pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Scales the pickup collection radius by `magnitude`
    Magnet,
    /// Scales the weapon fire interval by `magnitude`
    RapidFire,
    /// Grants invincibility for the duration
    Shield,
}

/// A power-up template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpArchetype {
    pub id: String,
    pub kind: PowerUpKind,
    pub duration_ms: f32,
    pub magnitude: f32,
    pub weight: f32,
    pub radius: f32,
    /// How long an uncollected pickup stays on the field
    pub lifetime_ms: f32,
}

static UNKNOWN_POWER_UP: PowerUpArchetype = PowerUpArchetype {
    id: String::new(),
    kind: PowerUpKind::Magnet,
    duration_ms: 0.0,
    magnitude: 1.0,
    weight: 0.0,
    radius: 0.0,
    lifetime_ms: 0.0,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub base_health: i32,
    pub base_invincibility_ms: f32,
    pub dash_duration_ms: f32,
    pub dash_cooldown_ms: f32,
    /// Extra reach added to the player radius when collecting pickups
    pub pickup_reach: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 20.0,
            base_health: 3,
            base_invincibility_ms: 1000.0,
            dash_duration_ms: 250.0,
            dash_cooldown_ms: 2000.0,
            pickup_reach: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub base_spawn_interval_ms: f32,
    pub min_spawn_interval_ms: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_spawn_interval_ms: 2000.0,
            min_spawn_interval_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTuning {
    pub shard_chance: f32,
    /// Maximum offset of a shard from the death position, per axis
    pub shard_jitter: f32,
    pub power_up_chance: f32,
    pub xp_orb_radius: f32,
    pub shard_radius: f32,
}

impl Default for DropTuning {
    fn default() -> Self {
        Self {
            shard_chance: 0.15,
            shard_jitter: 10.0,
            power_up_chance: 0.05,
            xp_orb_radius: 6.0,
            shard_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    pub window_ms: f32,
    /// Score multiplier gained per chained pickup
    pub step: f32,
    pub max_multiplier: f32,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            window_ms: 1500.0,
            step: 0.1,
            max_multiplier: 3.0,
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub enemies: Vec<EnemyArchetype>,
    pub weapon: WeaponArchetype,
    pub explosion: ParticleArchetype,
    pub power_ups: Vec<PowerUpArchetype>,
    pub player: PlayerTuning,
    pub spawn: SpawnTuning,
    pub drops: DropTuning,
    pub combo: ComboTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            enemies: vec![
                EnemyArchetype {
                    id: "standard".into(),
                    health: 1,
                    speed: 1.5,
                    radius: 15.0,
                    color: 0xff4d4d,
                    xp_value: 10,
                    shard_value: 1,
                    score: 10,
                    weight: 3.0,
                },
                EnemyArchetype {
                    id: "brute".into(),
                    health: 3,
                    speed: 0.8,
                    radius: 25.0,
                    color: 0x9b59b6,
                    xp_value: 30,
                    shard_value: 3,
                    score: 30,
                    weight: 1.0,
                },
            ],
            weapon: WeaponArchetype::default(),
            explosion: ParticleArchetype::default(),
            power_ups: vec![
                PowerUpArchetype {
                    id: "magnet".into(),
                    kind: PowerUpKind::Magnet,
                    duration_ms: 8000.0,
                    magnitude: 3.0,
                    weight: 1.0,
                    radius: 10.0,
                    lifetime_ms: 10_000.0,
                },
                PowerUpArchetype {
                    id: "rapid_fire".into(),
                    kind: PowerUpKind::RapidFire,
                    duration_ms: 5000.0,
                    magnitude: 0.5,
                    weight: 1.0,
                    radius: 10.0,
                    lifetime_ms: 10_000.0,
                },
                PowerUpArchetype {
                    id: "shield".into(),
                    kind: PowerUpKind::Shield,
                    duration_ms: 3000.0,
                    magnitude: 1.0,
                    weight: 0.5,
                    radius: 10.0,
                    lifetime_ms: 10_000.0,
                },
            ],
            player: PlayerTuning::default(),
            spawn: SpawnTuning::default(),
            drops: DropTuning::default(),
            combo: ComboTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let tuning = Self::from_json(&json)?;
        log::info!(
            "Loaded tuning from {} ({} enemy archetypes, {} power-ups)",
            path.display(),
            tuning.enemies.len(),
            tuning.power_ups.len()
        );
        Ok(tuning)
    }

    /// Check every value the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enemies.is_empty() {
            return Err(ConfigError::NoEnemies);
        }
        if self.enemies.iter().all(|e| e.weight <= 0.0) {
            return Err(ConfigError::ZeroWeights(self.enemies[0].id.clone()));
        }
        for enemy in &self.enemies {
            ensure_positive("enemy.health", enemy.health as f32)?;
            ensure_positive("enemy.radius", enemy.radius)?;
        }

        let weapon = &self.weapon;
        ensure_positive("weapon.speed", weapon.speed)?;
        ensure_positive("weapon.range", weapon.range)?;
        ensure_positive("weapon.radius", weapon.radius)?;
        ensure_positive("weapon.fire_interval_ms", weapon.fire_interval_ms)?;
        ensure_positive("weapon.min_fire_interval_ms", weapon.min_fire_interval_ms)?;

        ensure_positive("spawn.min_spawn_interval_ms", self.spawn.min_spawn_interval_ms)?;
        if self.spawn.min_spawn_interval_ms > self.spawn.base_spawn_interval_ms {
            return Err(ConfigError::InvertedRange {
                field: "spawn",
                min: self.spawn.min_spawn_interval_ms,
                base: self.spawn.base_spawn_interval_ms,
            });
        }

        ensure_positive("player.radius", self.player.radius)?;
        ensure_positive("player.base_health", self.player.base_health as f32)?;

        ensure_probability("drops.shard_chance", self.drops.shard_chance)?;
        ensure_probability("drops.power_up_chance", self.drops.power_up_chance)?;
        for power_up in &self.power_ups {
            ensure_positive("power_up.radius", power_up.radius)?;
        }

        Ok(())
    }

    /// Enemy archetype by id, or an inert zero-valued archetype
    pub fn enemy(&self, id: &str) -> &EnemyArchetype {
        match self.enemies.iter().find(|e| e.id == id) {
            Some(enemy) => enemy,
            None => {
                log::warn!("Unknown enemy archetype `{id}`, using zero values");
                &UNKNOWN_ENEMY
            }
        }
    }

    /// Power-up archetype by id, or an inert zero-duration archetype
    pub fn power_up(&self, id: &str) -> &PowerUpArchetype {
        match self.power_ups.iter().find(|p| p.id == id) {
            Some(power_up) => power_up,
            None => {
                log::warn!("Unknown power-up archetype `{id}`, ignoring");
                &UNKNOWN_POWER_UP
            }
        }
    }
}

/// Pick an index from `weights` given a uniform `roll` in [0, 1).
///
/// Non-positive weights are never picked. Returns `None` when no weight is
/// positive.
pub fn weighted_index(weights: impl Iterator<Item = f32> + Clone, roll: f32) -> Option<usize> {
    let total: f32 = weights.clone().filter(|w| *w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = roll * total;
    let mut last = None;
    for (i, w) in weights.enumerate() {
        if w <= 0.0 {
            continue;
        }
        if target < w {
            return Some(i);
        }
        target -= w;
        last = Some(i);
    }
    // Float rounding can leave `target` just past the final bucket
    last
}
