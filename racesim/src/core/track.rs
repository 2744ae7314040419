use rand::Rng;
use serde::Deserialize;

const EASY_TURN_PENALTY: f64 = 0.5;
const MEDIUM_TURN_PENALTY: f64 = 1.5;
const HARD_TURN_PENALTY: f64 = 3.0;

/// * `length_range_km` - (km) Track length range
/// * `easy_turns_range` - Easy turn count range
/// * `medium_turns_range` - Medium turn count range
/// * `hard_turns_range` - Hard turn count range
#[derive(Debug, Deserialize, Clone)]
pub struct TrackPars {
    #[serde(default = "default_length_range")]
    pub length_range_km: [f64; 2],
    #[serde(default = "default_easy_turns_range")]
    pub easy_turns_range: [u32; 2],
    #[serde(default = "default_medium_turns_range")]
    pub medium_turns_range: [u32; 2],
    #[serde(default = "default_hard_turns_range")]
    pub hard_turns_range: [u32; 2],
}

fn default_length_range() -> [f64; 2] {
    [3.0, 7.0]
}

fn default_easy_turns_range() -> [u32; 2] {
    [5, 14]
}

fn default_medium_turns_range() -> [u32; 2] {
    [3, 9]
}

fn default_hard_turns_range() -> [u32; 2] {
    [1, 4]
}

impl Default for TrackPars {
    fn default() -> Self {
        TrackPars {
            length_range_km: default_length_range(),
            easy_turns_range: default_easy_turns_range(),
            medium_turns_range: default_medium_turns_range(),
            hard_turns_range: default_hard_turns_range(),
        }
    }
}

/// Track is generated once per race and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Track {
    pub length_km: f64,
    pub easy_turns: u32,
    pub medium_turns: u32,
    pub hard_turns: u32,
}

impl Track {
    pub fn random(track_pars: &TrackPars, rng: &mut impl Rng) -> Track {
        let length_km =
            rng.gen_range(track_pars.length_range_km[0]..=track_pars.length_range_km[1]);

        Track {
            // two decimals are enough resolution for a course length
            length_km: (length_km * 100.0).round() / 100.0,
            easy_turns: rng
                .gen_range(track_pars.easy_turns_range[0]..=track_pars.easy_turns_range[1]),
            medium_turns: rng
                .gen_range(track_pars.medium_turns_range[0]..=track_pars.medium_turns_range[1]),
            hard_turns: rng
                .gen_range(track_pars.hard_turns_range[0]..=track_pars.hard_turns_range[1]),
        }
    }

    /// The method returns the ideal lap time in minutes for a car running at
    /// the given top speed: flat-out time over the course length plus the
    /// fixed per-turn penalties. Pace, tire and weather multipliers are
    /// applied later, on top of this baseline.
    pub fn ideal_lap_time(&self, top_speed_kmh: f64) -> f64 {
        let base_time_min = self.length_km / top_speed_kmh * 60.0;

        let turn_penalty_min = self.easy_turns as f64 * EASY_TURN_PENALTY
            + self.medium_turns as f64 * MEDIUM_TURN_PENALTY
            + self.hard_turns as f64 * HARD_TURN_PENALTY;

        base_time_min + turn_penalty_min
    }
}
