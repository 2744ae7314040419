use crate::core::lap::RetirementCause;
use crate::core::weather::WeatherCondition;
use anyhow::Context;
use helpers::general::{argsort, format_laptime, SortOrder};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    WeatherChange,
    PitStop,
    FuelExhausted,
    Incident,
}

impl From<RetirementCause> for EventKind {
    fn from(cause: RetirementCause) -> EventKind {
        match cause {
            RetirementCause::FuelExhausted => EventKind::FuelExhausted,
            RetirementCause::Incident => EventKind::Incident,
        }
    }
}

/// One noteworthy thing that happened during the race, for post-processing
/// and chart annotation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RaceEvent {
    pub kind: EventKind,
    pub lap: u32,
    pub team: Option<String>,
}

/// RaceResult contains all race information that is required for
/// post-processing the results. Lap and race times are indexed
/// `[car][lap]` with lap 0 unused; laps a car did not complete hold an
/// infinite lap time while the race time stays frozen at the last total.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RaceResult {
    pub tot_no_laps: u32,
    pub teams: Vec<String>,
    pub colors: Vec<String>,
    pub dnf: Vec<bool>,
    pub total_times_s: Vec<f64>,
    pub laptimes: Vec<Vec<f64>>,
    pub racetimes: Vec<Vec<f64>>,
    pub weather_history: Vec<WeatherCondition>,
    pub events: Vec<RaceEvent>,
}

fn fmt_time_cell(t_s: f64) -> String {
    if t_s.is_finite() {
        format!("{:9.3}s", t_s)
    } else {
        String::from("      DNF ")
    }
}

impl RaceResult {
    /// The method returns the car indices in final classification order:
    /// finishers before retirees, faster totals first within each group.
    pub fn classification(&self) -> Vec<usize> {
        let keys: Vec<(bool, f64)> = self
            .dnf
            .iter()
            .zip(self.total_times_s.iter())
            .map(|(&dnf, &total)| (dnf, total))
            .collect();
        argsort(&keys, SortOrder::Ascending)
    }

    /// The method renders the lap and race time tables into one string,
    /// shared by console printing and the text file export.
    fn lap_and_race_times_tables(&self) -> String {
        let mut tmp_string_laptime = String::new();
        let mut tmp_string_racetime = String::new();

        for lap in 1..self.tot_no_laps as usize + 1 {
            write!(&mut tmp_string_laptime, "{:3}, ", lap).unwrap();
            write!(&mut tmp_string_racetime, "{:3}, ", lap).unwrap();

            for i in 0..self.teams.len() {
                let sep = if i < self.teams.len() - 1 { ", " } else { "\n" };
                write!(
                    &mut tmp_string_laptime,
                    "{}{}",
                    fmt_time_cell(self.laptimes[i][lap]),
                    sep
                )
                .unwrap();
                write!(
                    &mut tmp_string_racetime,
                    "{}{}",
                    fmt_time_cell(self.racetimes[i][lap]),
                    sep
                )
                .unwrap();
            }
        }

        let mut tmp_string_team_info = String::from("lap, ");
        for (i, team) in self.teams.iter().enumerate() {
            let sep = if i < self.teams.len() - 1 { ", " } else { "" };
            write!(&mut tmp_string_team_info, "{:>10}{}", team, sep).unwrap();
        }

        let mut content = String::new();
        writeln!(&mut content, "RESULT: Lap times").unwrap();
        writeln!(&mut content, "{}", tmp_string_team_info).unwrap();
        writeln!(&mut content, "{}", tmp_string_laptime).unwrap();
        writeln!(&mut content, "RESULT: Race times").unwrap();
        writeln!(&mut content, "{}", tmp_string_team_info).unwrap();
        writeln!(&mut content, "{}", tmp_string_racetime).unwrap();
        content
    }

    /// print_lap_and_race_times prints the resulting lap and race times to
    /// the console output.
    pub fn print_lap_and_race_times(&self) {
        print!("{}", self.lap_and_race_times_tables());
    }

    /// The method prints the final classification, retirees marked DNF.
    pub fn print_final_classification(&self) {
        println!("RESULT: Final classification");
        for (pos, idx) in self.classification().into_iter().enumerate() {
            let result = if self.dnf[idx] {
                String::from("DNF")
            } else {
                format_laptime(self.total_times_s[idx])
            };
            println!("{:2}. {:<12} | {}", pos + 1, self.teams[idx], result);
        }
    }

    /// write_lap_and_race_times_to_file writes lap and race times to a text
    /// file (default: output/last_run.txt). Returns the path written to.
    pub fn write_lap_and_race_times_to_file(
        &self,
        path: Option<&Path>,
    ) -> anyhow::Result<String> {
        let out_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)
                    .context("Failed to create the output directory!")?;
                out_dir.join("last_run.txt")
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)
            .context(format!(
                "Failed to open result file {}!",
                out_path.to_string_lossy()
            ))?;
        file.write_all(self.lap_and_race_times_tables().as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    /// The method exports the lap times as CSV (default:
    /// output/laptimes.csv): one row per lap, one column per car, DNF laps
    /// left empty. Returns the path written to.
    pub fn write_csv(&self, path: Option<&Path>) -> anyhow::Result<String> {
        let out_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)
                    .context("Failed to create the output directory!")?;
                out_dir.join("laptimes.csv")
            }
        };

        let mut csv_writer = csv::Writer::from_path(&out_path).context(format!(
            "Failed to open CSV file {}!",
            out_path.to_string_lossy()
        ))?;

        let mut header = vec![String::from("lap"), String::from("weather")];
        header.extend(self.teams.iter().cloned());
        csv_writer.write_record(&header)?;

        for lap in 1..self.tot_no_laps as usize + 1 {
            let mut record = vec![
                lap.to_string(),
                self.weather_history
                    .get(lap - 1)
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
            ];
            for i in 0..self.teams.len() {
                let t_lap = self.laptimes[i][lap];
                record.push(if t_lap.is_finite() {
                    format!("{:.3}", t_lap)
                } else {
                    String::new()
                });
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(out_path.to_string_lossy().into_owned())
    }
}
