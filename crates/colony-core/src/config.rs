use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use crate::position::GridPosition;

/// A half-open square region `[start, end)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub start: i32,
    pub end: i32,
}

impl SpawnArea {
    pub fn contains(&self, pos: GridPosition) -> bool {
        (self.start..self.end).contains(&pos.x) && (self.start..self.end).contains(&pos.y)
    }

    /// Side length (zero when the area is empty).
    pub fn span(&self) -> u32 {
        (self.end - self.start).max(0) as u32
    }
}

/// Tuning constants for one colony. Every field has a default, so data
/// files only need to name what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    pub grid_size: u32,
    pub build_time: Ticks,
    pub salvage_time: Ticks,
    /// Settlers per building.
    pub max_settlers_per_building: u32,
    /// Cells per frame at 60 fps.
    pub settler_speed: f64,
    pub starting_settlers: u32,
    pub starting_population_cap: u32,

    pub upkeep_oxygen: Fixed64,
    pub upkeep_food: Fixed64,
    pub upkeep_water: Fixed64,
    pub depletion_interval: Ticks,

    pub day_length: Ticks,
    /// Day fraction at founding.
    pub day_start: f64,
    pub storm_interval: Ticks,
    pub storm_wreckage_min: u32,
    pub storm_wreckage_max: u32,
    pub storm_area: SpawnArea,
    /// Spawn attempts allowed per wreckage piece.
    pub storm_spawn_attempts: u32,

    pub initial_wreckage: u32,
    pub initial_wreckage_area: SpawnArea,
    pub initial_spawn_attempts: u32,
    pub anchor: GridPosition,

    pub growth_interval: Ticks,

    pub worker_bonus: Fixed64,
    pub solar_floor: f64,
    pub raw_capacity_floor: Fixed64,
    pub compound_capacity_floor: Fixed64,

    /// Wall-clock milliseconds per tick at normal speed.
    pub tick_interval_ms: u64,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            build_time: 45,
            salvage_time: 15,
            max_settlers_per_building: 3,
            settler_speed: 0.06,
            starting_settlers: 5,
            starting_population_cap: 5,

            upkeep_oxygen: Fixed64::from_num(1),
            upkeep_food: Fixed64::from_num(1),
            upkeep_water: Fixed64::from_num(1),
            depletion_interval: 5,

            day_length: 240,
            day_start: 0.25,
            storm_interval: 1680,
            storm_wreckage_min: 10,
            storm_wreckage_max: 15,
            storm_area: SpawnArea { start: 15, end: 35 },
            storm_spawn_attempts: 10,

            initial_wreckage: 18,
            initial_wreckage_area: SpawnArea { start: 22, end: 29 },
            initial_spawn_attempts: 5,
            anchor: GridPosition::new(25, 25),

            growth_interval: 30,

            worker_bonus: f64_to_fixed64(0.33),
            solar_floor: 0.1,
            raw_capacity_floor: Fixed64::from_num(30),
            compound_capacity_floor: Fixed64::from_num(15),

            tick_interval_ms: 1000,
        }
    }
}

impl ColonyConfig {
    /// Tick within the day that corresponds to `day_start`.
    pub fn day_start_tick(&self) -> Ticks {
        (self.day_start.clamp(0.0, 1.0) * self.day_length as f64).floor() as Ticks
    }

    /// Staffing multiplier `1 + bonus * (workers - 1)`, with zero workers
    /// treated as one.
    pub fn worker_multiplier(&self, workers: u32) -> Fixed64 {
        let extra = workers.max(1) - 1;
        Fixed64::from_num(1) + self.worker_bonus * Fixed64::from_num(extra)
    }

    /// Fabrication multiplier `1 + bonus * (workers - 1)` without the floor,
    /// so an unstaffed plant runs below par.
    pub fn fabrication_multiplier(&self, workers: u32) -> Fixed64 {
        let extra = Fixed64::from_num(workers) - Fixed64::from_num(1);
        Fixed64::from_num(1) + self.worker_bonus * extra
    }
}
