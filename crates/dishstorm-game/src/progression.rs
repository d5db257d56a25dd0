//! Upgrade levels and the numeric bonuses derived from them

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

pub type SharedProgression = Arc<Mutex<Progression>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Slows every dish's lifetime clock
    TimeDilation,
    CursorRadius,
    CursorDamage,
    Bomb,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        Self::TimeDilation,
        Self::CursorRadius,
        Self::CursorDamage,
        Self::Bomb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TimeDilation => "time_dilation",
            Self::CursorRadius => "cursor_radius",
            Self::CursorDamage => "cursor_damage",
            Self::Bomb => "bomb",
        }
    }
}

/// Numeric upgrade tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeTable {
    pub max_level: u32,
    /// Global slow gained per time dilation level (fraction)
    pub slow_per_level: f32,
    /// Global slow never exceeds this
    pub max_global_slow: f32,
    pub base_cursor_radius: f32,
    pub radius_per_level: f32,
    pub base_cursor_damage: f32,
    pub damage_per_level: f32,
    pub bombs_per_level: u32,
}

impl Default for UpgradeTable {
    fn default() -> Self {
        Self {
            max_level: 5,
            slow_per_level: 0.08,
            max_global_slow: 0.5,
            base_cursor_radius: 40.0,
            radius_per_level: 8.0,
            base_cursor_damage: 1.0,
            damage_per_level: 0.5,
            bombs_per_level: 1,
        }
    }
}

/// Ability levels for the current run
#[derive(Debug, Clone, Default)]
pub struct Progression {
    table: UpgradeTable,
    levels: HashMap<UpgradeKind, u32>,
}

impl Progression {
    pub fn new(table: UpgradeTable) -> Self {
        Self {
            table,
            levels: HashMap::new(),
        }
    }

    pub fn shared(table: UpgradeTable) -> SharedProgression {
        Arc::new(Mutex::new(Self::new(table)))
    }

    pub fn table(&self) -> &UpgradeTable {
        &self.table
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// Raise an upgrade by one level, up to the table's max. Returns the new level.
    pub fn add_level(&mut self, kind: UpgradeKind) -> u32 {
        let max = self.table.max_level;
        let level = self.levels.entry(kind).or_insert(0);
        if *level < max {
            *level += 1;
            info!("Upgrade {} -> level {}", kind.name(), *level);
        }
        *level
    }

    /// Fraction (0.0 to `max_global_slow`) removed from every lifetime tick
    pub fn global_slow_percent(&self) -> f32 {
        (self.level(UpgradeKind::TimeDilation) as f32 * self.table.slow_per_level)
            .min(self.table.max_global_slow)
    }

    pub fn cursor_radius(&self) -> f32 {
        self.table.base_cursor_radius
            + self.level(UpgradeKind::CursorRadius) as f32 * self.table.radius_per_level
    }

    pub fn cursor_damage(&self) -> f32 {
        self.table.base_cursor_damage
            + self.level(UpgradeKind::CursorDamage) as f32 * self.table.damage_per_level
    }

    pub fn bomb_count(&self) -> u32 {
        self.level(UpgradeKind::Bomb) * self.table.bombs_per_level
    }

    pub fn reset(&mut self) {
        self.levels.clear();
    }
}
