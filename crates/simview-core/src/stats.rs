//! Population-wide statistics.

use serde::{Deserialize, Serialize};

/// Aggregates computed by the server over the whole population.
///
/// Present in a snapshot only when the frame carried a well-formed STATS
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub avg_energy: f64,
    pub avg_stress: f64,
    pub avg_money: f64,
    pub alive: u32,
    pub dead: u32,
    pub occupied: u32,
}

impl StatsSummary {
    /// Total population, alive or not.
    pub fn population(&self) -> u32 {
        self.alive.saturating_add(self.dead)
    }
}
