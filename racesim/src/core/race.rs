use crate::core::ai::PolicyController;
use crate::core::car::{BaseCarPars, Car, CarPars, Pace, TireType};
use crate::core::lap::{self, LapOutcome};
use crate::core::standings::{RaceEntry, Standings};
use crate::core::track::{Track, TrackPars};
use crate::core::weather::{WeatherModel, WeatherPars};
use crate::interfaces::ui_interface::{CarStatus, StandingRow, WeatherStatus};
use crate::post::race_result::{EventKind, RaceEvent, RaceResult};
use anyhow::ensure;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

/// Series colors assigned to the AI grid, cycled when the grid is larger.
const GRID_COLORS: [&str; 8] = [
    "#d40000", "#00d2be", "#ff8700", "#0600ef", "#006f62", "#dc0000", "#b6babd", "#900000",
];

/// All tunable constants of the simulation, each with a default so a partial
/// parameter file (or none at all) works.
#[derive(Debug, Deserialize, Clone)]
pub struct SimConstants {
    #[serde(default)]
    pub weather_pars: WeatherPars,
    #[serde(default)]
    pub track_pars: TrackPars,
    #[serde(default)]
    pub car_pars: BaseCarPars,
    #[serde(default = "default_no_ai_cars")]
    pub no_ai_cars: u32,
    #[serde(default = "default_final_laps_window")]
    pub final_laps_window: u32,
}

fn default_no_ai_cars() -> u32 {
    5
}

fn default_final_laps_window() -> u32 {
    2
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            weather_pars: WeatherPars::default(),
            track_pars: TrackPars::default(),
            car_pars: BaseCarPars::default(),
            no_ai_cars: default_no_ai_cars(),
            final_laps_window: default_final_laps_window(),
        }
    }
}

impl SimConstants {
    /// The method checks that the constants describe a runnable simulation.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.track_pars;
        ensure!(
            t.length_range_km[0] > 0.0 && t.length_range_km[0] <= t.length_range_km[1],
            "Track length range is invalid!"
        );
        ensure!(
            t.easy_turns_range[0] <= t.easy_turns_range[1]
                && t.medium_turns_range[0] <= t.medium_turns_range[1]
                && t.hard_turns_range[0] <= t.hard_turns_range[1],
            "Turn count ranges are invalid!"
        );

        let w = &self.weather_pars;
        ensure!(
            w.temp_range_clear_c[0] <= w.temp_range_clear_c[1]
                && w.temp_range_rain_c[0] <= w.temp_range_rain_c[1],
            "Temperature ranges are invalid!"
        );
        ensure!(
            w.change_interval_laps[0] >= 1
                && w.change_interval_laps[0] <= w.change_interval_laps[1],
            "Weather change interval range is invalid!"
        );

        let c = &self.car_pars;
        ensure!(c.top_speed_kmh > 0.0, "Base top speed must be positive!");
        ensure!(
            c.base_fuel_per_km > 0.0,
            "Base fuel consumption must be positive!"
        );
        ensure!(c.tank_capacity_l > 0.0, "Tank capacity must be positive!");
        ensure!(
            c.starting_fuel_l > 0.0 && c.starting_fuel_l <= c.tank_capacity_l,
            "Starting fuel must fit the tank!"
        );
        ensure!(
            (0.0..=0.5).contains(&c.stat_variance),
            "Stat variance must be within [0, 0.5]!"
        );
        ensure!(
            c.t_pit_refuel_s >= 0.0 && c.t_pit_tirechange_s >= 0.0,
            "Pit stop penalties must not be negative!"
        );

        Ok(())
    }
}

/// What happened to each car during one simulated lap.
#[derive(Debug, Clone)]
pub struct LapReport {
    pub lap: u32,
    pub weather_changed: bool,
    pub outcomes: Vec<(String, LapOutcome)>,
}

/// RaceSession wires the whole engine together: it owns the track, the
/// weather, the standings, the AI policy and the run's random number
/// generator, advances the race strictly one lap at a time and keeps the
/// per-lap time matrices for post-processing.
#[derive(Debug)]
pub struct RaceSession {
    consts: SimConstants,
    pub tot_no_laps: u32,
    cur_lap: u32,
    pub track: Track,
    pub weather: WeatherModel,
    standings: Standings,
    policy: PolicyController,
    rng: StdRng,
    player_idx: Option<usize>,
    laptimes: Vec<Vec<f64>>,
    racetimes: Vec<Vec<f64>>,
    weather_history: Vec<crate::core::weather::WeatherCondition>,
    events: Vec<RaceEvent>,
}

impl RaceSession {
    /// The method sets up a race over the given lap count. An explicit seed
    /// makes the whole run (track, weather, incidents, AI variance)
    /// reproducible.
    pub fn new(consts: SimConstants, tot_no_laps: u32, seed: Option<u64>) -> RaceSession {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let weather = WeatherModel::new(consts.weather_pars.clone(), &mut rng);
        let track = Track::random(&consts.track_pars, &mut rng);
        let policy = PolicyController::new(consts.final_laps_window);

        log::info!(
            "race set up: {:.2} km, {}/{}/{} turns, {} laps",
            track.length_km,
            track.easy_turns,
            track.medium_turns,
            track.hard_turns,
            tot_no_laps
        );

        RaceSession {
            consts,
            tot_no_laps,
            cur_lap: 0,
            track,
            weather,
            standings: Standings::new(),
            policy,
            rng,
            player_idx: None,
            laptimes: Vec::new(),
            racetimes: Vec::new(),
            weather_history: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn consts(&self) -> &SimConstants {
        &self.consts
    }

    // ---------------------------------------------------------------------------------------------
    // REGISTRATION --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method registers one car. All cars must be registered before the
    /// first lap is simulated. Returns the car's index.
    pub fn register_car(&mut self, car_pars: &CarPars) -> usize {
        let mut car = Car::new(car_pars);
        car.recompute_multipliers(&self.weather);

        let ideal_lap_time_min = self.track.ideal_lap_time(car.base_top_speed_kmh());
        self.standings.register(RaceEntry::new(car, ideal_lap_time_min));

        self.laptimes.push(vec![0.0; self.tot_no_laps as usize + 1]);
        self.racetimes.push(vec![0.0; self.tot_no_laps as usize + 1]);

        self.standings.len() - 1
    }

    /// The method registers the human-controlled car.
    pub fn register_player(&mut self, car_pars: &CarPars) -> usize {
        let idx = self.register_car(car_pars);
        self.player_idx = Some(idx);
        idx
    }

    /// The method fills the grid with AI cars, their stats varied around the
    /// baseline figures.
    pub fn add_randomized_grid(&mut self, no_cars: u32) {
        for i in 0..no_cars {
            let color = GRID_COLORS[i as usize % GRID_COLORS.len()];
            let car_pars = CarPars::randomized(
                format!("AI Team {}", i + 1),
                color.to_owned(),
                &self.consts.car_pars,
                &mut self.rng,
            );
            self.register_car(&car_pars);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // PLAYER COMMANDS -----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method applies the player's pace selection for the upcoming lap.
    /// Fails once the player has retired.
    pub fn set_player_pace(&mut self, pace: Pace) -> bool {
        let idx = match self.player_idx {
            Some(idx) => idx,
            None => return false,
        };
        let entry = match self.standings.get_mut(idx) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.car.is_retired() {
            return false;
        }

        entry.car.set_pace(pace);
        true
    }

    /// The method executes the player's pit stop before the upcoming lap.
    /// The refuel amount must already be validated against the free tank
    /// space at the input boundary.
    pub fn player_pit_stop(&mut self, refuel_l: f64, new_tire: Option<TireType>) -> bool {
        let lap = self.cur_lap + 1;
        let idx = match self.player_idx {
            Some(idx) => idx,
            None => return false,
        };
        let entry = match self.standings.get_mut(idx) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.car.is_retired() {
            return false;
        }

        entry.car.pit_stop(refuel_l, &self.weather, new_tire);
        let team = entry.car.team.clone();
        self.events.push(RaceEvent {
            kind: EventKind::PitStop,
            lap,
            team: Some(team),
        });
        true
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method advances the whole race by one lap: weather tick, AI
    /// decisions for all active computer cars, then the lap simulation for
    /// every entry in registration order.
    pub fn simulate_lap(&mut self) -> LapReport {
        if self.finished() {
            return LapReport {
                lap: self.cur_lap,
                weather_changed: false,
                outcomes: Vec::new(),
            };
        }

        let lap = self.cur_lap + 1;

        let weather_changed = self
            .weather
            .tick(self.standings.entries_mut(), &mut self.rng);
        if weather_changed {
            self.events.push(RaceEvent {
                kind: EventKind::WeatherChange,
                lap,
                team: None,
            });
        }
        self.weather_history.push(self.weather.condition);

        // AI decisions for everyone but the player
        let tot_no_laps = self.tot_no_laps;
        for (i, entry) in self.standings.entries_mut().iter_mut().enumerate() {
            if self.player_idx == Some(i) || entry.car.is_retired() {
                continue;
            }

            let pitted = self
                .policy
                .decide(&mut entry.car, &self.track, &self.weather, lap, tot_no_laps)
                .is_some();
            if pitted {
                self.events.push(RaceEvent {
                    kind: EventKind::PitStop,
                    lap,
                    team: Some(entry.car.team.clone()),
                });
            }
        }

        // lap simulation
        let mut outcomes = Vec::with_capacity(self.standings.len());
        for (i, entry) in self.standings.entries_mut().iter_mut().enumerate() {
            let outcome = lap::simulate_lap(entry, &self.track, &self.weather, &mut self.rng);

            self.laptimes[i][lap as usize] = match outcome {
                LapOutcome::Completed { lap_time_s } => lap_time_s,
                _ => f64::INFINITY,
            };
            self.racetimes[i][lap as usize] = entry.total_race_time_s;

            if let LapOutcome::Retired(cause) = outcome {
                log::info!("{} is out of the race ({})", entry.car.team, cause.name());
                self.events.push(RaceEvent {
                    kind: EventKind::from(cause),
                    lap,
                    team: Some(entry.car.team.clone()),
                });
            }

            outcomes.push((entry.car.team.clone(), outcome));
        }

        self.cur_lap = lap;
        LapReport {
            lap,
            weather_changed,
            outcomes,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // STATE QUERIES -------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn cur_lap(&self) -> u32 {
        self.cur_lap
    }

    pub fn finished(&self) -> bool {
        self.cur_lap >= self.tot_no_laps
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn player(&self) -> Option<&RaceEntry> {
        self.player_idx.and_then(|idx| self.standings.get(idx))
    }

    pub fn player_retired(&self) -> bool {
        self.player().map_or(false, |entry| entry.car.is_retired())
    }

    // ---------------------------------------------------------------------------------------------
    // SNAPSHOTS FOR THE PRESENTATION LAYER --------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn weather_status(&self) -> WeatherStatus {
        WeatherStatus {
            condition: self.weather.condition,
            temperature_c: self.weather.temperature_c,
        }
    }

    pub fn car_status(&self, idx: usize) -> Option<CarStatus> {
        self.standings.get(idx).map(|entry| CarStatus {
            team: entry.car.team.clone(),
            color: entry.car.color.clone(),
            fuel_l: entry.car.fuel_l(),
            tank_capacity_l: entry.car.tank_capacity_l(),
            tire: entry.car.tire(),
            tire_condition: entry.car.tire_condition(),
            pace: entry.car.pace(),
            effective_top_speed_kmh: entry.car.effective_top_speed_kmh(),
            mileage_km: entry.car.mileage_km(),
            retired: entry.car.is_retired(),
        })
    }

    pub fn player_status(&self) -> Option<CarStatus> {
        self.player_idx.and_then(|idx| self.car_status(idx))
    }

    /// The method returns the current classification as presentation rows,
    /// gaps relative to the leading car.
    pub fn standings_rows(&self) -> Vec<StandingRow> {
        let ranked = self.standings.ranked();
        let leader_total = ranked
            .first()
            .map(|entry| entry.total_race_time_s)
            .unwrap_or(0.0);

        ranked
            .iter()
            .enumerate()
            .map(|(pos, entry)| StandingRow {
                position: pos + 1,
                team: entry.car.team.clone(),
                tire: entry.car.tire(),
                tire_condition: entry.car.tire_condition(),
                last_lap_s: if entry.car.is_retired() {
                    f64::INFINITY
                } else {
                    entry.last_lap_s
                },
                total_time_s: entry.total_race_time_s,
                gap_to_leader_s: if entry.car.is_retired() {
                    f64::INFINITY
                } else {
                    entry.total_race_time_s - leader_total
                },
                retired: entry.car.is_retired(),
            })
            .collect()
    }

    /// The method packages everything post-processing needs.
    pub fn race_result(&self) -> RaceResult {
        let entries = self.standings.entries();
        RaceResult {
            tot_no_laps: self.tot_no_laps,
            teams: entries.iter().map(|e| e.car.team.clone()).collect(),
            colors: entries.iter().map(|e| e.car.color.clone()).collect(),
            dnf: entries.iter().map(|e| e.car.is_retired()).collect(),
            total_times_s: entries.iter().map(|e| e.total_race_time_s).collect(),
            laptimes: self.laptimes.clone(),
            racetimes: self.racetimes.clone(),
            weather_history: self.weather_history.clone(),
            events: self.events.clone(),
        }
    }
}
