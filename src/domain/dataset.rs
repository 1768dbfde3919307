// Dataset domain model - a whole SIRN run held in memory
use super::sirn::{SirnPoint, TimeStep};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub city: String,
    pub time: TimeStep,
    pub point: SirnPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SirnDataset {
    /// Display order of the cities.
    pub roster: Vec<String>,
    pub entries: Vec<DatasetEntry>,
}

impl SirnDataset {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by time, times ascending, cities in roster order.
    pub fn by_time(&self) -> BTreeMap<TimeStep, Vec<&DatasetEntry>> {
        let rank = |city: &str| {
            self.roster
                .iter()
                .position(|known| known == city)
                .unwrap_or(usize::MAX)
        };
        let mut grouped: BTreeMap<TimeStep, Vec<&DatasetEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.time).or_default().push(entry);
        }
        for entries in grouped.values_mut() {
            entries.sort_by_key(|entry| rank(&entry.city));
        }
        grouped
    }

    pub fn point(&self, city: &str, time: TimeStep) -> Option<&SirnPoint> {
        self.entries
            .iter()
            .find(|entry| entry.city == city && entry.time == time)
            .map(|entry| &entry.point)
    }
}
