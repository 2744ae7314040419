use crate::core::car::Car;
use crate::core::weather::WeatherModel;
use rand::Rng;

/// Base retirement probability for running dry tires in rain.
const RAIN_MISMATCH_PROB_BASE: f64 = 0.2;
/// Additional probability span as mismatched tires degrade (20% -> 40%).
const RAIN_MISMATCH_PROB_SPAN: f64 = 0.2;
/// Tire condition below which worn tires alone can cause a retirement.
const WORN_TIRE_THRESHOLD: f64 = 40.0;
/// Maximum retirement probability from worn tires alone.
const WORN_TIRE_MAX_PROB: f64 = 0.05;

/// The function returns this lap's retirement probability. Deterministic so
/// it can be checked directly; the random draw lives in `check_retirement`.
pub fn retirement_probability(car: &Car, weather: &WeatherModel) -> f64 {
    let tire_mismatch = weather.is_rain() && car.tire().is_dry();

    if tire_mismatch {
        return RAIN_MISMATCH_PROB_BASE
            + (100.0 - car.tire_condition()) / 100.0 * RAIN_MISMATCH_PROB_SPAN;
    }

    if car.tire_condition() < WORN_TIRE_THRESHOLD {
        let tire_penalty = (WORN_TIRE_THRESHOLD - car.tire_condition()) / WORN_TIRE_THRESHOLD;
        return WORN_TIRE_MAX_PROB * tire_penalty;
    }

    0.0
}

/// The function decides whether the car retires this lap. Runs once per
/// completed lap per active car; a positive result is terminal.
pub fn check_retirement(car: &Car, weather: &WeatherModel, rng: &mut impl Rng) -> bool {
    rng.gen::<f64>() < retirement_probability(car, weather)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::car::{CarPars, TireType};
    use crate::core::weather::{WeatherCondition, WeatherPars};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car_on(tire: TireType) -> Car {
        Car::new(&CarPars {
            team: String::from("Test"),
            color: String::from("#ff0000"),
            top_speed_kmh: 310.0,
            tank_capacity_l: 100.0,
            base_fuel_per_km: 0.85,
            fuel_l: 90.0,
            tire,
            t_pit_refuel_s: 10.0,
            t_pit_tirechange_s: 12.0,
        })
    }

    fn weather(condition: WeatherCondition) -> WeatherModel {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weather = WeatherModel::new(WeatherPars::default(), &mut rng);
        weather.condition = condition;
        weather.temperature_c = 20;
        weather
    }

    /// Wears the tires down to the target condition through the public
    /// consumption API, topping the tank up between steps.
    fn wear_down_to(car: &mut Car, target: f64) {
        while car.tire_condition() > target {
            let step_km = ((car.tire_condition() - target) / car.tire_wear_per_km()).min(10.0);
            let _ = car.refuel(car.free_tank_space_l());
            assert!(car.consume_for_distance(step_km));
        }
    }

    #[test]
    fn test_mismatch_probability_grows_with_wear() {
        let rain = weather(WeatherCondition::Rain);

        let fresh = car_on(TireType::Soft);
        assert_relative_eq!(retirement_probability(&fresh, &rain), 0.2);

        let mut half_worn = car_on(TireType::Soft);
        wear_down_to(&mut half_worn, 50.0);
        assert_relative_eq!(
            retirement_probability(&half_worn, &rain),
            0.3,
            epsilon = 1e-6
        );

        let mut worn_out = car_on(TireType::Soft);
        wear_down_to(&mut worn_out, 0.0);
        assert_relative_eq!(retirement_probability(&worn_out, &rain), 0.4);
    }

    #[test]
    fn test_wet_tires_in_rain_are_not_mismatched() {
        let rain = weather(WeatherCondition::Rain);
        let car = car_on(TireType::Wet);
        assert_relative_eq!(retirement_probability(&car, &rain), 0.0);
    }

    #[test]
    fn test_worn_tire_probability_formula() {
        let clear = weather(WeatherCondition::Clear);

        let mut car = car_on(TireType::Soft);
        wear_down_to(&mut car, 20.0);
        assert_relative_eq!(
            retirement_probability(&car, &clear),
            0.05 * 0.5,
            epsilon = 1e-6
        );

        let mut worn_out = car_on(TireType::Soft);
        wear_down_to(&mut worn_out, 0.0);
        assert_relative_eq!(retirement_probability(&worn_out, &clear), 0.05);
    }

    #[test]
    fn test_probability_is_zero_at_and_above_threshold() {
        let clear = weather(WeatherCondition::Clear);

        let fresh = car_on(TireType::Medium);
        assert_relative_eq!(retirement_probability(&fresh, &clear), 0.0);

        let mut at_threshold = car_on(TireType::Medium);
        wear_down_to(&mut at_threshold, 40.0);
        assert_relative_eq!(
            retirement_probability(&at_threshold, &clear),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_fresh_tires_never_retire() {
        let clear = weather(WeatherCondition::Clear);
        let car = car_on(TireType::Medium);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..1000 {
            assert!(!check_retirement(&car, &clear, &mut rng));
        }
    }
}
