//! Simulation clock, speed and state-hash types.
//!
//! The colony advances in whole ticks. A driver either calls
//! `Colony::advance_tick()` directly or feeds elapsed wall time to
//! `Colony::advance()`, which accumulates milliseconds and runs as many
//! ticks as fit, carrying the remainder forward.

use crate::config::ColonyConfig;
use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Game speed
// ---------------------------------------------------------------------------

/// Tick-rate multiplier selected by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum GameSpeed {
    /// No ticks run and settlers freeze.
    Paused,
    #[default]
    Normal,
    Double,
}

impl GameSpeed {
    /// Map the numeric speed code (0, 1 or 2) used by the command API.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GameSpeed::Paused),
            1 => Some(GameSpeed::Normal),
            2 => Some(GameSpeed::Double),
            _ => None,
        }
    }

    /// Numeric multiplier applied to the tick rate.
    pub fn multiplier(self) -> u64 {
        match self {
            GameSpeed::Paused => 0,
            GameSpeed::Normal => 1,
            GameSpeed::Double => 2,
        }
    }

    pub fn is_paused(self) -> bool {
        self == GameSpeed::Paused
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Counters advanced by the tick pipeline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Ticks run since founding.
    pub tick: Ticks,

    /// Position inside the current day, in ticks (`0..day_length`).
    pub day_tick: Ticks,

    /// Completed days.
    pub day_count: u64,

    /// Ticks left until the next storm.
    pub storm_countdown: Ticks,

    /// Ticks since the last settler upkeep.
    pub depletion_counter: Ticks,

    /// Ticks since the last population growth check.
    pub growth_counter: Ticks,

    /// Wall-clock remainder for `advance(elapsed_ms)`.
    pub accumulator_ms: u64,
}

impl SimState {
    /// Fresh counters for a newly founded colony.
    pub fn new(config: &ColonyConfig) -> Self {
        Self {
            tick: 0,
            day_tick: config.day_start_tick() % config.day_length.max(1),
            day_count: 0,
            storm_countdown: config.storm_interval,
            depletion_counter: 0,
            growth_counter: 0,
            accumulator_ms: 0,
        }
    }

    /// Advance the day clock by one tick, wrapping at `day_length`.
    pub fn advance_day(&mut self, day_length: Ticks) {
        self.day_tick += 1;
        if self.day_tick >= day_length.max(1) {
            self.day_tick = 0;
            self.day_count += 1;
        }
    }

    /// Fraction of the current day elapsed, in `[0, 1)`.
    pub fn day_time(&self, day_length: Ticks) -> f64 {
        self.day_tick as f64 / day_length.max(1) as f64
    }

    /// Night lasts while the day fraction is below 0.2 or above 0.8.
    pub fn is_night(&self, day_length: Ticks) -> bool {
        let t = self.day_time(day_length);
        !(0.2..=0.8).contains(&t)
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of colony state for desync detection.
///
/// Uses FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
