use crate::core::incident;
use crate::core::standings::RaceEntry;
use crate::core::track::Track;
use crate::core::weather::WeatherModel;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirementCause {
    FuelExhausted,
    Incident,
}

impl RetirementCause {
    pub fn name(self) -> &'static str {
        match self {
            RetirementCause::FuelExhausted => "out of fuel",
            RetirementCause::Incident => "incident",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LapOutcome {
    Completed { lap_time_s: f64 },
    Retired(RetirementCause),
    AlreadyRetired,
}

/// The function simulates one lap for one car: refresh the multipliers
/// against the current weather, advance the car by the track length, compute
/// the lap time and run the incident check. Fuel exhaustion retires the car
/// before the lap counts; an incident retires it after the lap was driven but
/// the crashed lap earns no time either way.
pub fn simulate_lap(
    entry: &mut RaceEntry,
    track: &Track,
    weather: &WeatherModel,
    rng: &mut impl Rng,
) -> LapOutcome {
    entry.car.recompute_multipliers(weather);

    if entry.car.is_retired() {
        return LapOutcome::AlreadyRetired;
    }

    if !entry.car.consume_for_distance(track.length_km) {
        entry.car.retire();
        log::debug!("{} ran out of fuel", entry.car.team);
        return LapOutcome::Retired(RetirementCause::FuelExhausted);
    }

    let lap_time_s = entry.car.lap_time(entry.ideal_lap_time_min);

    if incident::check_retirement(&entry.car, weather, rng) {
        entry.car.retire();
        log::debug!("{} retired after an incident", entry.car.team);
        return LapOutcome::Retired(RetirementCause::Incident);
    }

    entry.record_lap(lap_time_s);
    LapOutcome::Completed { lap_time_s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::car::{Car, CarPars, TireType};
    use crate::core::weather::{WeatherCondition, WeatherPars};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track_5km() -> Track {
        Track {
            length_km: 5.0,
            easy_turns: 8,
            medium_turns: 5,
            hard_turns: 2,
        }
    }

    fn weather(condition: WeatherCondition) -> WeatherModel {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weather = WeatherModel::new(WeatherPars::default(), &mut rng);
        weather.condition = condition;
        weather.temperature_c = 22;
        weather
    }

    fn entry_with_fuel(fuel_l: f64, tire: TireType) -> RaceEntry {
        let car = Car::new(&CarPars {
            team: String::from("Test"),
            color: String::from("#ff0000"),
            top_speed_kmh: 310.0,
            tank_capacity_l: 100.0,
            base_fuel_per_km: 0.85,
            fuel_l,
            tire,
            t_pit_refuel_s: 10.0,
            t_pit_tirechange_s: 12.0,
        });
        let ideal = track_5km().ideal_lap_time(car.base_top_speed_kmh());
        RaceEntry::new(car, ideal)
    }

    #[test]
    fn test_completed_lap_records_time() {
        let track = track_5km();
        let clear = weather(WeatherCondition::Clear);
        let mut entry = entry_with_fuel(90.0, TireType::Medium);
        let mut rng = StdRng::seed_from_u64(1);

        match simulate_lap(&mut entry, &track, &clear, &mut rng) {
            LapOutcome::Completed { lap_time_s } => {
                assert_relative_eq!(entry.last_lap_s, lap_time_s);
                assert_relative_eq!(entry.total_race_time_s, lap_time_s);
            }
            other => panic!("expected a completed lap, got {:?}", other),
        }
    }

    #[test]
    fn test_fuel_exhaustion_is_terminal_and_uncredited() {
        let track = track_5km();
        let clear = weather(WeatherCondition::Clear);
        // 1.0 L on board, 0.85 L/km over 5 km is far short
        let mut entry = entry_with_fuel(1.0, TireType::Medium);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = simulate_lap(&mut entry, &track, &clear, &mut rng);
        assert_eq!(outcome, LapOutcome::Retired(RetirementCause::FuelExhausted));
        assert!(entry.car.is_retired());
        assert_relative_eq!(entry.total_race_time_s, 0.0);
        assert_relative_eq!(entry.last_lap_s, 0.0);
        // the failed attempt consumed nothing
        assert_relative_eq!(entry.car.fuel_l(), 1.0);
    }

    #[test]
    fn test_retired_car_is_skipped() {
        let track = track_5km();
        let clear = weather(WeatherCondition::Clear);
        let mut entry = entry_with_fuel(90.0, TireType::Medium);
        entry.car.retire();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = simulate_lap(&mut entry, &track, &clear, &mut rng);
        assert_eq!(outcome, LapOutcome::AlreadyRetired);
        assert_relative_eq!(entry.total_race_time_s, 0.0);
        assert_relative_eq!(entry.car.fuel_l(), 90.0);
    }

    #[test]
    fn test_incident_lap_earns_no_time() {
        let track = track_5km();
        let rain = weather(WeatherCondition::Rain);
        let mut rng = StdRng::seed_from_u64(5);

        // dry tires in rain carry at least a 20% retirement chance per lap,
        // so across many fresh entries some must crash; a crashed lap must
        // never appear in the totals.
        let mut saw_incident = false;
        for _ in 0..200 {
            let mut entry = entry_with_fuel(90.0, TireType::Soft);
            if let LapOutcome::Retired(cause) = simulate_lap(&mut entry, &track, &rain, &mut rng) {
                assert_eq!(cause, RetirementCause::Incident);
                assert!(entry.car.is_retired());
                assert_relative_eq!(entry.total_race_time_s, 0.0);
                saw_incident = true;
            }
        }
        assert!(saw_incident, "no incident in 200 rain laps on dry tires");
    }

    #[test]
    fn test_lap_consumes_fuel_and_wears_tires() {
        let track = track_5km();
        let clear = weather(WeatherCondition::Clear);
        let mut entry = entry_with_fuel(90.0, TireType::Medium);
        let mut rng = StdRng::seed_from_u64(1);

        simulate_lap(&mut entry, &track, &clear, &mut rng);
        assert!(entry.car.fuel_l() < 90.0);
        assert!(entry.car.tire_condition() < 100.0);
        assert_relative_eq!(entry.car.mileage_km(), 5.0);
    }
}
