//! Upgrade curves and the external currency ledger
//!
//! The ledger (upgrade levels and currency balance) belongs to the host; the
//! simulation only reads levels and credits currency, fire-and-forget.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Persistent upgrades that modify the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    /// +1 max health per level
    Health,
    /// +10% projectile speed per level
    Speed,
    /// +1 projectile damage per level
    Damage,
    /// -50 ms fire interval per level
    FireRate,
    /// +10% XP per level
    XpMultiplier,
    /// +200 ms invincibility window per level
    Invincibility,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 6] = [
        UpgradeId::Health,
        UpgradeId::Speed,
        UpgradeId::Damage,
        UpgradeId::FireRate,
        UpgradeId::XpMultiplier,
        UpgradeId::Invincibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::Health => "health",
            UpgradeId::Speed => "speed",
            UpgradeId::Damage => "damage",
            UpgradeId::FireRate => "fire_rate",
            UpgradeId::XpMultiplier => "xp_multiplier",
            UpgradeId::Invincibility => "invincibility",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

/// Bonus granted by an upgrade at a given level.
///
/// Additive for health, damage, fire rate (ms removed) and invincibility
/// (ms added); the multiplier upgrades return the bonus fraction on top of 1.0.
pub fn upgrade_value(id: UpgradeId, level: u32) -> f32 {
    let n = level as f32;
    match id {
        UpgradeId::Health => n,
        UpgradeId::Speed => 0.1 * n,
        UpgradeId::Damage => n,
        UpgradeId::FireRate => 50.0 * n,
        UpgradeId::XpMultiplier => xp_bonus_percent(level) as f32 / 100.0,
        UpgradeId::Invincibility => 200.0 * n,
    }
}

/// Extra XP per orb in whole percent (+10% per level)
pub fn xp_bonus_percent(level: u32) -> u32 {
    level.saturating_mul(10)
}

/// [`upgrade_value`] by name; unknown names are worth nothing
pub fn upgrade_value_for(name: &str, level: u32) -> f32 {
    UpgradeId::from_str(name)
        .map(|id| upgrade_value(id, level))
        .unwrap_or(0.0)
}

/// The persistent upgrade/currency store, owned by the host
pub trait UpgradeLedger {
    /// Current purchased level (0 when never bought)
    fn upgrade_level(&self, id: UpgradeId) -> u32;

    /// Credit earned currency. Must not fail.
    fn add_currency(&mut self, amount: u32);
}

impl<L: UpgradeLedger + ?Sized> UpgradeLedger for Rc<RefCell<L>> {
    fn upgrade_level(&self, id: UpgradeId) -> u32 {
        self.borrow().upgrade_level(id)
    }

    fn add_currency(&mut self, amount: u32) {
        self.borrow_mut().add_currency(amount);
    }
}

/// Simple in-memory ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLedger {
    pub currency: u64,
    pub levels: HashMap<UpgradeId, u32>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, id: UpgradeId, level: u32) -> Self {
        self.levels.insert(id, level);
        self
    }

}

impl UpgradeLedger for MemoryLedger {
    fn upgrade_level(&self, id: UpgradeId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    fn add_currency(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount as u64);
    }
}

/// Upgrade-derived coefficients, read from the ledger at tick start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub health_bonus: i32,
    pub speed_multiplier: f32,
    pub damage_bonus: i32,
    pub fire_rate_reduction_ms: f32,
    /// XP scale in whole percent (100 = unchanged)
    pub xp_percent: u32,
    pub invincibility_bonus_ms: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            health_bonus: 0,
            speed_multiplier: 1.0,
            damage_bonus: 0,
            fire_rate_reduction_ms: 0.0,
            xp_percent: 100,
            invincibility_bonus_ms: 0.0,
        }
    }
}

impl Modifiers {
    pub fn from_ledger(ledger: &dyn UpgradeLedger) -> Self {
        let value = |id| upgrade_value(id, ledger.upgrade_level(id));
        Self {
            health_bonus: value(UpgradeId::Health) as i32,
            speed_multiplier: 1.0 + value(UpgradeId::Speed),
            damage_bonus: value(UpgradeId::Damage) as i32,
            fire_rate_reduction_ms: value(UpgradeId::FireRate),
            xp_percent: 100 + xp_bonus_percent(ledger.upgrade_level(UpgradeId::XpMultiplier)),
            invincibility_bonus_ms: value(UpgradeId::Invincibility),
        }
    }

    /// Apply the XP bonus to an orb value, rounding down
    pub fn scale_xp(&self, base: u32) -> u32 {
        (u64::from(base) * u64::from(self.xp_percent) / 100).min(u64::from(u32::MAX)) as u32
    }
}
