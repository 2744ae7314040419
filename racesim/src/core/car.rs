use crate::core::weather::WeatherModel;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Additive multiplier penalty for running a dry compound in rain.
const RAIN_MISMATCH_PENALTY: f64 = 0.5;
/// Additive multiplier penalty for running the wet compound on a dry track.
const CLEAR_WET_PENALTY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TireType {
    Soft,
    Medium,
    Hard,
    Wet,
}

impl TireType {
    /// The method maps the boundary code (1-4) to a compound. Out-of-range
    /// codes are rejected at the boundary, the engine never sees them.
    pub fn from_code(code: u8) -> Option<TireType> {
        match code {
            1 => Some(TireType::Soft),
            2 => Some(TireType::Medium),
            3 => Some(TireType::Hard),
            4 => Some(TireType::Wet),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            TireType::Soft => 1,
            TireType::Medium => 2,
            TireType::Hard => 3,
            TireType::Wet => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TireType::Soft => "Soft",
            TireType::Medium => "Medium",
            TireType::Hard => "Hard",
            TireType::Wet => "Wet",
        }
    }

    pub fn is_dry(self) -> bool {
        !matches!(self, TireType::Wet)
    }

    /// (base wear per km, type wear multiplier). Soft wears fastest, Hard
    /// slowest, Wet sits in between and couples to the weather instead.
    fn wear_pars(self) -> (f64, f64) {
        match self {
            TireType::Soft => (0.8, 1.2),
            TireType::Medium => (0.5, 1.0),
            TireType::Hard => (0.2, 0.8),
            TireType::Wet => (0.6, 0.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pace {
    Aggressive,
    Normal,
    Economic,
}

impl Pace {
    /// Boundary codes: 1 Economic, 2 Normal, 3 Aggressive.
    pub fn from_code(code: u8) -> Option<Pace> {
        match code {
            1 => Some(Pace::Economic),
            2 => Some(Pace::Normal),
            3 => Some(Pace::Aggressive),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Pace::Economic => 1,
            Pace::Normal => 2,
            Pace::Aggressive => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pace::Aggressive => "Aggressive",
            Pace::Normal => "Normal",
            Pace::Economic => "Economic",
        }
    }

    /// Lower is faster and more fuel-efficient in this rule set.
    pub fn multiplier(self) -> f64 {
        match self {
            Pace::Aggressive => 0.9,
            Pace::Normal => 1.0,
            Pace::Economic => 1.3,
        }
    }
}

/// Baseline car performance figures, varied per AI car by `stat_variance`.
/// * `top_speed_kmh` - (km/h) Base top speed
/// * `base_fuel_per_km` - (L/km) Base fuel consumption
/// * `tank_capacity_l` - (L) Tank capacity
/// * `starting_fuel_l` - (L) Fuel load on the grid
/// * `stat_variance` - Relative spread applied to AI car stats (0.05 = ±5%)
/// * `t_pit_refuel_s` - (s) Lap time penalty for refueling during a pit stop
/// * `t_pit_tirechange_s` - (s) Lap time penalty for a tire change during a pit stop
#[derive(Debug, Deserialize, Clone)]
pub struct BaseCarPars {
    #[serde(default = "default_top_speed")]
    pub top_speed_kmh: f64,
    #[serde(default = "default_base_fuel_per_km")]
    pub base_fuel_per_km: f64,
    #[serde(default = "default_tank_capacity")]
    pub tank_capacity_l: f64,
    #[serde(default = "default_starting_fuel")]
    pub starting_fuel_l: f64,
    #[serde(default = "default_stat_variance")]
    pub stat_variance: f64,
    #[serde(default = "default_t_pit_refuel")]
    pub t_pit_refuel_s: f64,
    #[serde(default = "default_t_pit_tirechange")]
    pub t_pit_tirechange_s: f64,
}

fn default_top_speed() -> f64 {
    310.0
}

fn default_base_fuel_per_km() -> f64 {
    0.85
}

fn default_tank_capacity() -> f64 {
    100.0
}

fn default_starting_fuel() -> f64 {
    90.0
}

fn default_stat_variance() -> f64 {
    0.05
}

fn default_t_pit_refuel() -> f64 {
    10.0
}

fn default_t_pit_tirechange() -> f64 {
    12.0
}

impl Default for BaseCarPars {
    fn default() -> Self {
        BaseCarPars {
            top_speed_kmh: default_top_speed(),
            base_fuel_per_km: default_base_fuel_per_km(),
            tank_capacity_l: default_tank_capacity(),
            starting_fuel_l: default_starting_fuel(),
            stat_variance: default_stat_variance(),
            t_pit_refuel_s: default_t_pit_refuel(),
            t_pit_tirechange_s: default_t_pit_tirechange(),
        }
    }
}

/// Parameters of one concrete car on the grid.
#[derive(Debug, Deserialize, Clone)]
pub struct CarPars {
    pub team: String,
    pub color: String,
    pub top_speed_kmh: f64,
    pub tank_capacity_l: f64,
    pub base_fuel_per_km: f64,
    pub fuel_l: f64,
    pub tire: TireType,
    pub t_pit_refuel_s: f64,
    pub t_pit_tirechange_s: f64,
}

impl CarPars {
    /// The method builds the player's car straight from the baseline figures.
    pub fn player(team: String, color: String, base: &BaseCarPars, tire: TireType) -> CarPars {
        CarPars {
            team,
            color,
            top_speed_kmh: base.top_speed_kmh,
            tank_capacity_l: base.tank_capacity_l,
            base_fuel_per_km: base.base_fuel_per_km,
            fuel_l: base.starting_fuel_l,
            tire,
            t_pit_refuel_s: base.t_pit_refuel_s,
            t_pit_tirechange_s: base.t_pit_tirechange_s,
        }
    }

    /// The method builds an AI car with each performance stat varied by a
    /// normal draw clamped to the ±`stat_variance` band. AI cars start on
    /// softs at normal pace.
    pub fn randomized(
        team: String,
        color: String,
        base: &BaseCarPars,
        rng: &mut impl Rng,
    ) -> CarPars {
        CarPars {
            team,
            color,
            top_speed_kmh: varied(base.top_speed_kmh, base.stat_variance, rng),
            tank_capacity_l: varied(base.tank_capacity_l, base.stat_variance, rng),
            base_fuel_per_km: varied(base.base_fuel_per_km, base.stat_variance, rng),
            fuel_l: varied(base.starting_fuel_l, base.stat_variance, rng),
            tire: TireType::Soft,
            t_pit_refuel_s: base.t_pit_refuel_s,
            t_pit_tirechange_s: base.t_pit_tirechange_s,
        }
    }
}

fn varied(base: f64, variance: f64, rng: &mut impl Rng) -> f64 {
    let factor = match Normal::new(1.0, variance / 2.0) {
        Ok(normal) => {
            let sample: f64 = normal.sample(rng);
            sample.clamp(1.0 - variance, 1.0 + variance)
        }
        Err(_) => 1.0,
    };
    base * factor
}

/// Car owns all mutable physical state of one entry: fuel, tires, pace and
/// the multipliers derived from them against the current weather. The top
/// speed the car was built with is kept immutable; the degraded speed is
/// re-derived on every multiplier refresh so wear never compounds across
/// laps.
#[derive(Debug, Clone)]
pub struct Car {
    pub team: String,
    pub color: String,
    base_top_speed_kmh: f64,
    tank_capacity_l: f64,
    base_fuel_per_km: f64,
    t_pit_refuel_s: f64,
    t_pit_tirechange_s: f64,
    fuel_l: f64,
    tire: TireType,
    tire_condition: f64,
    pace: Pace,
    mileage_km: f64,
    retired: bool,
    pace_multiplier: f64,
    tire_degr_multiplier: f64,
    type_wear_multiplier: f64,
    base_tire_wear_per_km: f64,
    effective_top_speed_kmh: f64,
    pit_penalty_s: f64,
    pitted: bool,
}

impl Car {
    pub fn new(car_pars: &CarPars) -> Car {
        let (base_tire_wear_per_km, type_wear_multiplier) = car_pars.tire.wear_pars();

        Car {
            team: car_pars.team.to_owned(),
            color: car_pars.color.to_owned(),
            base_top_speed_kmh: car_pars.top_speed_kmh,
            tank_capacity_l: car_pars.tank_capacity_l,
            base_fuel_per_km: car_pars.base_fuel_per_km,
            t_pit_refuel_s: car_pars.t_pit_refuel_s,
            t_pit_tirechange_s: car_pars.t_pit_tirechange_s,
            fuel_l: car_pars.fuel_l.min(car_pars.tank_capacity_l),
            tire: car_pars.tire,
            tire_condition: 100.0,
            pace: Pace::Normal,
            mileage_km: 0.0,
            retired: false,
            pace_multiplier: Pace::Normal.multiplier(),
            tire_degr_multiplier: 0.0,
            type_wear_multiplier,
            base_tire_wear_per_km,
            effective_top_speed_kmh: car_pars.top_speed_kmh,
            pit_penalty_s: 0.0,
            pitted: false,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // DERIVED STATE -------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method re-derives all multipliers from the car's current state and
    /// the given weather. Repeated calls with the same inputs are idempotent:
    /// the effective top speed is always computed from the immutable base
    /// speed, never from its own previous value.
    pub fn recompute_multipliers(&mut self, weather: &WeatherModel) {
        self.pace_multiplier = self.pace.multiplier();
        self.tire_degr_multiplier = (100.0 - self.tire_condition) / 100.0;

        let (base_wear, type_wear) = self.tire.wear_pars();
        self.base_tire_wear_per_km = base_wear;
        self.type_wear_multiplier = type_wear;

        if self.tire.is_dry() && weather.is_rain() {
            self.tire_degr_multiplier += RAIN_MISMATCH_PENALTY;
            self.type_wear_multiplier += RAIN_MISMATCH_PENALTY;
        }

        if self.tire == TireType::Wet && !weather.is_rain() {
            self.tire_degr_multiplier += CLEAR_WET_PENALTY;
            self.type_wear_multiplier += CLEAR_WET_PENALTY;
        }

        let temperature_factor =
            WeatherModel::tire_wear_temperature_factor(weather.temperature_c as f64) / 100.0;
        self.type_wear_multiplier *= temperature_factor;

        self.effective_top_speed_kmh =
            (self.base_top_speed_kmh * (1.0 - self.tire_degr_multiplier)).max(0.0);
    }

    pub fn fuel_per_km(&self) -> f64 {
        self.base_fuel_per_km * self.pace_multiplier
    }

    pub fn tire_wear_per_km(&self) -> f64 {
        self.base_tire_wear_per_km
            * self.pace_multiplier
            * self.type_wear_multiplier
            * (1.0 + self.tire_degr_multiplier)
    }

    // ---------------------------------------------------------------------------------------------
    // LAP-BY-LAP MUTATIONS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method advances the car by the given distance, deducting fuel and
    /// wearing the tires. Fails without any state change when the fuel on
    /// board does not cover the distance; covering it exactly succeeds.
    pub fn consume_for_distance(&mut self, distance_km: f64) -> bool {
        let fuel_needed = self.fuel_per_km() * distance_km;
        if fuel_needed > self.fuel_l {
            return false;
        }

        self.fuel_l -= fuel_needed;
        self.mileage_km += distance_km;
        self.tire_condition = (self.tire_condition - self.tire_wear_per_km() * distance_km).max(0.0);
        true
    }

    /// The method adds fuel. Fails without state change for non-positive
    /// amounts or when the tank would overflow; filling to exactly the
    /// capacity succeeds.
    pub fn refuel(&mut self, amount_l: f64) -> bool {
        if amount_l <= 0.0 {
            return false;
        }
        if self.fuel_l + amount_l > self.tank_capacity_l {
            return false;
        }

        self.fuel_l += amount_l;
        true
    }

    /// The method mounts a fresh set of the given compound.
    pub fn fit_tires(&mut self, tire: TireType) {
        self.tire = tire;
        self.tire_condition = 100.0;
    }

    pub fn set_pace(&mut self, pace: Pace) {
        self.pace = pace;
    }

    /// The method performs a pit stop: optional refuel (+10 s) and optional
    /// tire change (+12 s), penalties stacking additively within one stop.
    /// A supplied compound is fitted when it differs from the current one or
    /// the current set is no longer fresh, so a worn set can be swapped for
    /// the same compound. Multipliers are recomputed afterwards.
    pub fn pit_stop(&mut self, refuel_l: f64, weather: &WeatherModel, new_tire: Option<TireType>) {
        self.pitted = true;
        self.pit_penalty_s = 0.0;

        if refuel_l > 0.0 {
            if !self.refuel(refuel_l) {
                log::warn!("{}: refill of {:.1}L rejected", self.team, refuel_l);
            }
            self.pit_penalty_s += self.t_pit_refuel_s;
        }

        if let Some(tire) = new_tire {
            if tire != self.tire || self.tire_condition < 100.0 {
                self.fit_tires(tire);
                self.pit_penalty_s += self.t_pit_tirechange_s;
            }
        }

        self.recompute_multipliers(weather);
    }

    /// The method returns this lap's time in seconds, derived from the ideal
    /// lap time (minutes) and the current multipliers. Any pending pit stop
    /// penalty is added once and consumed. Retired cars report an infinite
    /// lap time.
    pub fn lap_time(&mut self, ideal_lap_time_min: f64) -> f64 {
        if self.retired {
            return f64::INFINITY;
        }

        let mut t_lap = ideal_lap_time_min
            * SECONDS_PER_MINUTE
            * self.pace_multiplier
            * (1.0 + self.tire_degr_multiplier);

        if self.pitted {
            t_lap += self.pit_penalty_s;
            self.pit_penalty_s = 0.0;
            self.pitted = false;
        }

        t_lap
    }

    /// One-way transition; nothing un-retires a car.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    // ---------------------------------------------------------------------------------------------
    // ACCESSORS -----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn fuel_l(&self) -> f64 {
        self.fuel_l
    }

    pub fn tank_capacity_l(&self) -> f64 {
        self.tank_capacity_l
    }

    pub fn free_tank_space_l(&self) -> f64 {
        self.tank_capacity_l - self.fuel_l
    }

    pub fn tire(&self) -> TireType {
        self.tire
    }

    pub fn tire_condition(&self) -> f64 {
        self.tire_condition
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    pub fn mileage_km(&self) -> f64 {
        self.mileage_km
    }

    pub fn base_top_speed_kmh(&self) -> f64 {
        self.base_top_speed_kmh
    }

    pub fn effective_top_speed_kmh(&self) -> f64 {
        self.effective_top_speed_kmh
    }

    pub fn tire_degradation_multiplier(&self) -> f64 {
        self.tire_degr_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::weather::{WeatherCondition, WeatherModel, WeatherPars};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_car() -> Car {
        Car::new(&CarPars {
            team: String::from("Test"),
            color: String::from("#ff0000"),
            top_speed_kmh: 310.0,
            tank_capacity_l: 100.0,
            base_fuel_per_km: 0.85,
            fuel_l: 90.0,
            tire: TireType::Medium,
            t_pit_refuel_s: 10.0,
            t_pit_tirechange_s: 12.0,
        })
    }

    fn clear_weather() -> WeatherModel {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weather = WeatherModel::new(WeatherPars::default(), &mut rng);
        weather.condition = WeatherCondition::Clear;
        weather.temperature_c = 25;
        weather
    }

    fn rainy_weather() -> WeatherModel {
        let mut weather = clear_weather();
        weather.condition = WeatherCondition::Rain;
        weather.temperature_c = 15;
        weather
    }

    #[test]
    fn test_fuel_decreases_by_exact_consumption() {
        let mut car = test_car();
        car.recompute_multipliers(&clear_weather());

        let fuel_before = car.fuel_l();
        let expected = car.fuel_per_km() * 4.0;
        assert!(car.consume_for_distance(4.0));
        assert_relative_eq!(car.fuel_l(), fuel_before - expected);
    }

    #[test]
    fn test_insufficient_fuel_fails_without_mutation() {
        let mut car = test_car();
        car.recompute_multipliers(&clear_weather());
        car.fuel_l = 1.0;

        let condition_before = car.tire_condition();
        let mileage_before = car.mileage_km();
        assert!(!car.consume_for_distance(5.0));
        assert_relative_eq!(car.fuel_l(), 1.0);
        assert_relative_eq!(car.tire_condition(), condition_before);
        assert_relative_eq!(car.mileage_km(), mileage_before);
    }

    #[test]
    fn test_exact_fuel_amount_succeeds() {
        let mut car = test_car();
        car.recompute_multipliers(&clear_weather());
        car.fuel_l = car.fuel_per_km() * 5.0;

        assert!(car.consume_for_distance(5.0));
        assert_relative_eq!(car.fuel_l(), 0.0);
    }

    #[test]
    fn test_tire_condition_clamped_at_zero() {
        let mut car = test_car();
        car.recompute_multipliers(&rainy_weather());
        car.tire_condition = 1.0;

        // dry tires in rain at high wear rate, far more wear than condition left
        assert!(car.consume_for_distance(7.0));
        assert!(car.tire_condition() >= 0.0);
        assert_relative_eq!(car.tire_condition(), 0.0);
    }

    #[test]
    fn test_refuel_rejects_non_positive_amounts() {
        let mut car = test_car();
        assert!(!car.refuel(0.0));
        assert!(!car.refuel(-3.0));
        assert_relative_eq!(car.fuel_l(), 90.0);
    }

    #[test]
    fn test_refuel_rejects_overflow_and_accepts_exact_fill() {
        let mut car = test_car();
        assert!(!car.refuel(10.1));
        assert_relative_eq!(car.fuel_l(), 90.0);

        assert!(car.refuel(10.0));
        assert_relative_eq!(car.fuel_l(), 100.0);
    }

    #[test]
    fn test_pit_stop_penalties_stack_once_then_reset() {
        let mut car = test_car();
        let weather = clear_weather();
        car.recompute_multipliers(&weather);

        car.pit_stop(5.0, &weather, Some(TireType::Hard));

        // fresh tires in clear weather: no degradation, normal pace
        let expected_base = 10.0 * 60.0;
        assert_relative_eq!(car.lap_time(10.0), expected_base + 10.0 + 12.0);
        assert_relative_eq!(car.lap_time(10.0), expected_base);
    }

    #[test]
    fn test_pit_stop_same_compound_swaps_worn_set() {
        let mut car = test_car();
        let weather = clear_weather();
        car.recompute_multipliers(&weather);
        car.tire_condition = 20.0;

        car.pit_stop(0.0, &weather, Some(TireType::Medium));
        assert_eq!(car.tire(), TireType::Medium);
        assert_relative_eq!(car.tire_condition(), 100.0);
    }

    #[test]
    fn test_pit_stop_same_fresh_compound_is_a_no_op_change() {
        let mut car = test_car();
        let weather = clear_weather();
        car.recompute_multipliers(&weather);

        car.pit_stop(0.0, &weather, Some(TireType::Medium));

        // no refuel, no actual tire change: no penalty on the next lap
        assert_relative_eq!(car.lap_time(10.0), 600.0);
    }

    #[test]
    fn test_effective_speed_does_not_compound() {
        let mut car = test_car();
        let weather = clear_weather();
        car.tire_condition = 50.0;

        car.recompute_multipliers(&weather);
        let speed_first = car.effective_top_speed_kmh();
        car.recompute_multipliers(&weather);
        let speed_second = car.effective_top_speed_kmh();

        assert_relative_eq!(speed_first, 310.0 * 0.5);
        assert_relative_eq!(speed_first, speed_second);
        assert_relative_eq!(car.base_top_speed_kmh(), 310.0);
    }

    #[test]
    fn test_rain_penalty_on_dry_tires() {
        let mut car = test_car();
        car.recompute_multipliers(&rainy_weather());

        // fresh tires: degradation comes from the mismatch penalty alone
        assert_relative_eq!(car.tire_degradation_multiplier(), 0.5);
    }

    #[test]
    fn test_dry_penalty_on_wet_tires() {
        let mut car = test_car();
        car.fit_tires(TireType::Wet);
        car.recompute_multipliers(&clear_weather());

        assert_relative_eq!(car.tire_degradation_multiplier(), 0.3);
    }

    #[test]
    fn test_matched_tires_have_no_mismatch_penalty() {
        let mut car = test_car();
        car.fit_tires(TireType::Wet);
        car.recompute_multipliers(&rainy_weather());
        assert_relative_eq!(car.tire_degradation_multiplier(), 0.0);

        car.fit_tires(TireType::Soft);
        car.recompute_multipliers(&clear_weather());
        assert_relative_eq!(car.tire_degradation_multiplier(), 0.0);
    }

    #[test]
    fn test_lap_time_of_retired_car_is_infinite() {
        let mut car = test_car();
        car.recompute_multipliers(&clear_weather());
        car.retire();
        assert!(car.lap_time(10.0).is_infinite());
    }

    #[test]
    fn test_pace_boundary_codes() {
        assert_eq!(Pace::from_code(1), Some(Pace::Economic));
        assert_eq!(Pace::from_code(2), Some(Pace::Normal));
        assert_eq!(Pace::from_code(3), Some(Pace::Aggressive));
        assert_eq!(Pace::from_code(0), None);
        assert_eq!(Pace::from_code(4), None);
    }

    #[test]
    fn test_tire_boundary_codes() {
        assert_eq!(TireType::from_code(4), Some(TireType::Wet));
        assert_eq!(TireType::from_code(5), None);
        for code in 1..=4 {
            let tire = TireType::from_code(code).unwrap();
            assert_eq!(tire.code(), code);
        }
    }

    #[test]
    fn test_randomized_pars_stay_in_variance_band() {
        let base = BaseCarPars::default();
        let mut rng = StdRng::seed_from_u64(42);

        for i in 0..200 {
            let pars = CarPars::randomized(format!("AI Team {}", i), String::new(), &base, &mut rng);
            assert!(
                pars.top_speed_kmh >= 310.0 * 0.95 && pars.top_speed_kmh <= 310.0 * 1.05,
                "top speed out of band: {}",
                pars.top_speed_kmh
            );
            assert!(pars.tank_capacity_l >= 95.0 && pars.tank_capacity_l <= 105.0);
            assert!(pars.base_fuel_per_km >= 0.85 * 0.95 && pars.base_fuel_per_km <= 0.85 * 1.05);
            assert_eq!(pars.tire, TireType::Soft);
        }
    }
}
