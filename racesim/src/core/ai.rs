use crate::core::car::{Car, Pace, TireType};
use crate::core::track::Track;
use crate::core::weather::WeatherModel;

/// Tire condition below which the policy wants fresh rubber.
const TIRE_CHANGE_THRESHOLD: f64 = 25.0;
/// Tire condition above which an aggressive pace is considered.
const AGGRESSIVE_TIRE_CONDITION: f64 = 70.0;
/// Tire condition below which the policy backs off to economic pace.
const CONSERVATIVE_TIRE_CONDITION: f64 = 40.0;
/// Fuel margin (in track lengths) required for an aggressive pace.
const AGGRESSIVE_FUEL_MARGIN_LAPS: f64 = 2.0;
/// Fuel margin (in track lengths) below which the pace turns economic.
const CONSERVATIVE_FUEL_MARGIN_LAPS: f64 = 1.5;
/// Refueling tops up for at least this many laps' worth of consumption.
const REFUEL_HORIZON_LAPS: f64 = 3.0;
/// Remaining distance up to which a fresh Soft set pays off.
const SOFT_TIRE_MAX_REMAINING_KM: f64 = 20.0;
/// Remaining distance up to which Medium is the compound of choice.
const MEDIUM_TIRE_MAX_REMAINING_KM: f64 = 50.0;

/// What a triggered pit stop should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitRequest {
    pub refuel_l: f64,
    pub new_tire: Option<TireType>,
}

/// PolicyController drives the computer-controlled cars: a rule-based pace
/// selection plus a pit trigger on fuel margin, tire wear and tire/weather
/// mismatch. Pit stops are suppressed once the race enters the final-laps
/// window, where a stop cannot pay for itself anymore.
#[derive(Debug, Clone)]
pub struct PolicyController {
    final_laps_window: u32,
}

impl PolicyController {
    pub fn new(final_laps_window: u32) -> PolicyController {
        PolicyController { final_laps_window }
    }

    /// The method makes this lap's decisions for one car: sets the pace and,
    /// when warranted, executes a pit stop. Returns the executed pit request
    /// for event bookkeeping. `cur_lap` is 1-based and names the lap about
    /// to be driven.
    pub fn decide(
        &self,
        car: &mut Car,
        track: &Track,
        weather: &WeatherModel,
        cur_lap: u32,
        tot_no_laps: u32,
    ) -> Option<PitRequest> {
        let pit_request = self.pit_decision(car, track, weather, cur_lap, tot_no_laps);

        car.set_pace(self.choose_pace(car, track, weather));

        if let Some(request) = pit_request {
            log::debug!(
                "{} pits: {:.1}L, tires {:?}",
                car.team,
                request.refuel_l,
                request.new_tire
            );
            car.pit_stop(request.refuel_l, weather, request.new_tire);
        } else {
            car.recompute_multipliers(weather);
        }

        pit_request
    }

    /// Three-tier pace rule, first match wins: fresh tires + ample fuel +
    /// clear sky run aggressive; worn tires or a tight fuel margin run
    /// economic; everything else runs normal.
    pub fn choose_pace(&self, car: &Car, track: &Track, weather: &WeatherModel) -> Pace {
        if car.tire_condition() > AGGRESSIVE_TIRE_CONDITION
            && car.fuel_l() > track.length_km * AGGRESSIVE_FUEL_MARGIN_LAPS
            && !weather.is_rain()
        {
            Pace::Aggressive
        } else if car.tire_condition() < CONSERVATIVE_TIRE_CONDITION
            || car.fuel_l() < track.length_km * CONSERVATIVE_FUEL_MARGIN_LAPS
        {
            Pace::Economic
        } else {
            Pace::Normal
        }
    }

    /// The method decides whether the car pits before this lap, and with
    /// what. The fuel projection uses the consumption rate as currently
    /// derived; the hard fuel guarantee stays with the consumption step
    /// itself.
    pub fn pit_decision(
        &self,
        car: &Car,
        track: &Track,
        weather: &WeatherModel,
        cur_lap: u32,
        tot_no_laps: u32,
    ) -> Option<PitRequest> {
        let remaining_laps = tot_no_laps.saturating_sub(cur_lap) + 1;
        let remaining_km = track.length_km * remaining_laps as f64;

        let fuel_needed_to_finish = remaining_km * car.fuel_per_km();
        let fuel_sufficient = car.fuel_l() >= fuel_needed_to_finish;

        let needs_tire_change = car.tire_condition() < TIRE_CHANGE_THRESHOLD;

        let tire_weather_mismatch = (car.tire().is_dry() && weather.is_rain())
            || (!car.tire().is_dry() && !weather.is_rain());

        let final_laps = remaining_laps <= self.final_laps_window;

        if final_laps || (fuel_sufficient && !needs_tire_change && !tire_weather_mismatch) {
            return None;
        }

        let refuel_l = (car.free_tank_space_l())
            .min((track.length_km * REFUEL_HORIZON_LAPS * car.fuel_per_km())
                .max(fuel_needed_to_finish));

        let optimal = Self::optimal_tire(weather, remaining_km);
        let new_tire = if optimal != car.tire() || needs_tire_change {
            Some(optimal)
        } else {
            None
        };

        Some(PitRequest { refuel_l, new_tire })
    }

    /// The compound of choice for the given conditions: Wet whenever it
    /// rains; otherwise picked by the distance still to cover. Soft for a
    /// short run to the flag, Medium for a middle stint, Hard for a long one.
    pub fn optimal_tire(weather: &WeatherModel, remaining_km: f64) -> TireType {
        if weather.is_rain() {
            TireType::Wet
        } else if remaining_km <= SOFT_TIRE_MAX_REMAINING_KM {
            TireType::Soft
        } else if remaining_km <= MEDIUM_TIRE_MAX_REMAINING_KM {
            TireType::Medium
        } else {
            TireType::Hard
        }
    }
}
