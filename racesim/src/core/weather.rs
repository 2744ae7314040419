use crate::core::standings::RaceEntry;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Temperature at which tire wear is lowest. The penalty grows faster above
/// this optimum than below it (hot tarmac destroys rubber, cold only hardens
/// it).
pub const OPTIMAL_TIRE_TEMPERATURE_C: f64 = 25.0;

/// * `temp_range_clear_c` - (°C) Temperature range drawn in clear weather
/// * `temp_range_rain_c` - (°C) Temperature range drawn in rain
/// * `change_interval_laps` - (laps) Range the weather-change countdown is re-rolled from
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherPars {
    #[serde(default = "default_temp_range_clear")]
    pub temp_range_clear_c: [i32; 2],
    #[serde(default = "default_temp_range_rain")]
    pub temp_range_rain_c: [i32; 2],
    #[serde(default = "default_change_interval")]
    pub change_interval_laps: [u32; 2],
}

fn default_temp_range_clear() -> [i32; 2] {
    [15, 30]
}

fn default_temp_range_rain() -> [i32; 2] {
    [5, 20]
}

fn default_change_interval() -> [u32; 2] {
    [5, 10]
}

impl Default for WeatherPars {
    fn default() -> Self {
        WeatherPars {
            temp_range_clear_c: default_temp_range_clear(),
            temp_range_rain_c: default_temp_range_rain(),
            change_interval_laps: default_change_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Rain,
}

impl WeatherCondition {
    pub fn name(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Rain => "Rain",
        }
    }
}

/// WeatherModel holds the current weather and mutates it on a randomly drawn
/// lap interval. All cars read it when deriving their multipliers.
#[derive(Debug)]
pub struct WeatherModel {
    pub condition: WeatherCondition,
    pub temperature_c: i32,
    laps_until_change: u32,
    pars: WeatherPars,
}

impl WeatherModel {
    pub fn new(pars: WeatherPars, rng: &mut impl Rng) -> WeatherModel {
        let mut weather = WeatherModel {
            condition: WeatherCondition::Clear,
            temperature_c: OPTIMAL_TIRE_TEMPERATURE_C as i32,
            laps_until_change: 0,
            pars,
        };
        weather.generate(rng);
        weather
    }

    /// The method draws a fresh condition + temperature pair and re-rolls the
    /// change countdown, replacing the current state.
    pub fn generate(&mut self, rng: &mut impl Rng) {
        self.condition = if rng.gen_range(0..2) == 0 {
            WeatherCondition::Clear
        } else {
            WeatherCondition::Rain
        };

        let temp_range = match self.condition {
            WeatherCondition::Clear => self.pars.temp_range_clear_c,
            WeatherCondition::Rain => self.pars.temp_range_rain_c,
        };
        self.temperature_c = rng.gen_range(temp_range[0]..=temp_range[1]);

        self.laps_until_change =
            rng.gen_range(self.pars.change_interval_laps[0]..=self.pars.change_interval_laps[1]);
    }

    /// The method advances the weather by one lap. When the countdown runs
    /// out, new weather is generated and every car's derived multipliers are
    /// recomputed against the new state. Returns whether the weather changed.
    pub fn tick(&mut self, entries: &mut [RaceEntry], rng: &mut impl Rng) -> bool {
        self.laps_until_change = self.laps_until_change.saturating_sub(1);

        if self.laps_until_change > 0 {
            return false;
        }

        self.generate(rng);
        log::info!(
            "weather changed to {} at {}°C",
            self.condition.name(),
            self.temperature_c
        );

        for entry in entries.iter_mut() {
            entry.car.recompute_multipliers(self);
        }

        true
    }

    pub fn is_rain(&self) -> bool {
        self.condition == WeatherCondition::Rain
    }

    pub fn laps_until_change(&self) -> u32 {
        self.laps_until_change
    }

    /// The method returns the temperature-dependent tire wear factor in
    /// percent: `100 + (2 + sign(t - 25)) * |t - 25|`. It scales the tire
    /// wear rate only, never fuel use.
    pub fn tire_wear_temperature_factor(temperature_c: f64) -> f64 {
        let diff = temperature_c - OPTIMAL_TIRE_TEMPERATURE_C;
        let sign = if diff > 0.0 {
            1.0
        } else if diff < 0.0 {
            -1.0
        } else {
            0.0
        };
        100.0 + (2.0 + sign) * diff.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_temperature_factor_above_optimum() {
        // above 25°C the coefficient is 3
        assert_eq!(WeatherModel::tire_wear_temperature_factor(30.0), 115.0);
    }

    #[test]
    fn test_temperature_factor_below_optimum() {
        // below 25°C the coefficient is 1
        assert_eq!(WeatherModel::tire_wear_temperature_factor(15.0), 110.0);
    }

    #[test]
    fn test_temperature_factor_at_optimum() {
        assert_eq!(WeatherModel::tire_wear_temperature_factor(25.0), 100.0);
    }

    #[test]
    fn test_generate_respects_condition_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut weather = WeatherModel::new(WeatherPars::default(), &mut rng);

        for _ in 0..500 {
            weather.generate(&mut rng);
            match weather.condition {
                WeatherCondition::Clear => {
                    assert!(
                        (15..=30).contains(&weather.temperature_c),
                        "clear temperature out of range: {}",
                        weather.temperature_c
                    );
                }
                WeatherCondition::Rain => {
                    assert!(
                        (5..=20).contains(&weather.temperature_c),
                        "rain temperature out of range: {}",
                        weather.temperature_c
                    );
                }
            }
            assert!(
                (5..=10).contains(&weather.laps_until_change),
                "change interval out of range: {}",
                weather.laps_until_change
            );
        }
    }

    #[test]
    fn test_weather_cycle() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut weather = WeatherModel::new(WeatherPars::default(), &mut rng);
        weather.laps_until_change = 6;

        let condition = weather.condition;
        let temperature = weather.temperature_c;

        // N-1 ticks leave the weather untouched
        for _ in 0..5 {
            assert!(!weather.tick(&mut [], &mut rng));
            assert_eq!(weather.condition, condition);
            assert_eq!(weather.temperature_c, temperature);
        }

        // the Nth tick re-rolls state and countdown
        assert!(weather.tick(&mut [], &mut rng));
        assert!(
            (5..=10).contains(&weather.laps_until_change),
            "fresh interval out of range: {}",
            weather.laps_until_change
        );
    }
}
