use crate::core::car::{Pace, TireType};
use crate::core::weather::WeatherCondition;

/// Read-only snapshots handed to the presentation layer. The engine never
/// renders anything itself; whoever drives it (console menu, batch runner)
/// works off these structs.

#[derive(Debug, Clone)]
pub struct WeatherStatus {
    pub condition: WeatherCondition,
    pub temperature_c: i32,
}

#[derive(Debug, Clone)]
pub struct CarStatus {
    pub team: String,
    pub color: String,
    pub fuel_l: f64,
    pub tank_capacity_l: f64,
    pub tire: TireType,
    pub tire_condition: f64,
    pub pace: Pace,
    pub effective_top_speed_kmh: f64,
    pub mileage_km: f64,
    pub retired: bool,
}

#[derive(Debug, Clone)]
pub struct StandingRow {
    pub position: usize,
    pub team: String,
    pub tire: TireType,
    pub tire_condition: f64,
    pub last_lap_s: f64,
    pub total_time_s: f64,
    pub gap_to_leader_s: f64,
    pub retired: bool,
}
