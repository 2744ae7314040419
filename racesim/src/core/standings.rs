use crate::core::car::Car;
use helpers::general::{argsort, SortOrder};

/// RaceEntry pairs a car with its race bookkeeping. Created once at
/// registration, mutated once per completed lap, never destroyed mid-race:
/// a retired car keeps its accumulated total.
#[derive(Debug, Clone)]
pub struct RaceEntry {
    pub car: Car,
    pub last_lap_s: f64,
    pub previous_lap_s: f64,
    pub total_race_time_s: f64,
    pub ideal_lap_time_min: f64,
}

impl RaceEntry {
    pub fn new(car: Car, ideal_lap_time_min: f64) -> RaceEntry {
        RaceEntry {
            car,
            last_lap_s: 0.0,
            previous_lap_s: 0.0,
            total_race_time_s: 0.0,
            ideal_lap_time_min,
        }
    }

    /// The method credits a completed lap to this entry.
    pub fn record_lap(&mut self, lap_time_s: f64) {
        self.previous_lap_s = self.last_lap_s;
        self.last_lap_s = lap_time_s;
        self.total_race_time_s += lap_time_s;
    }
}

/// Standings is the ordered collection of all race entries, in registration
/// order. Ranked views are produced on demand and never disturb that order.
#[derive(Debug, Default)]
pub struct Standings {
    entries: Vec<RaceEntry>,
}

impl Standings {
    pub fn new() -> Standings {
        Standings {
            entries: Vec::new(),
        }
    }

    /// Appends the entry; duplicate detection is the caller's business.
    pub fn register(&mut self, entry: RaceEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RaceEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [RaceEntry] {
        &mut self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&RaceEntry> {
        self.entries.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut RaceEntry> {
        self.entries.get_mut(idx)
    }

    /// The method returns a fresh ranked snapshot: running cars before
    /// retired ones, faster totals first within each group, insertion order
    /// preserved on exact ties.
    pub fn ranked(&self) -> Vec<&RaceEntry> {
        let keys: Vec<(bool, f64)> = self
            .entries
            .iter()
            .map(|entry| (entry.car.is_retired(), entry.total_race_time_s))
            .collect();

        argsort(&keys, SortOrder::Ascending)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .collect()
    }
}
