// Data store - owns every SIRN point and derives the roster and global time axis
use crate::domain::error::{Result, VisualizerError};
use crate::domain::sirn::{SirnPoint, TimeStep};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type Timeline = BTreeMap<TimeStep, SirnPoint>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointChange {
    Inserted,
    Overwritten,
    Unchanged,
}

/// How the global axis moved during one insert.
///
/// `inserted` is an index into the axis right after the insert; `removed` are indices
/// into that same axis, dropped afterwards by retention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisDelta {
    pub inserted: Option<usize>,
    pub removed: Vec<usize>,
}

impl AxisDelta {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_none() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub change: PointChange,
    pub new_city: bool,
    pub axis: AxisDelta,
}

impl InsertOutcome {
    pub fn is_visible_change(&self) -> bool {
        self.change != PointChange::Unchanged || self.new_city || !self.axis.is_empty()
    }
}

/// Point-in-time copy handed to renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub roster: Vec<String>,
    pub axis: Vec<TimeStep>,
    pub timelines: HashMap<String, Timeline>,
    pub revision: u64,
}

impl StoreSnapshot {
    pub fn point(&self, city: &str, time: TimeStep) -> Option<&SirnPoint> {
        self.timelines.get(city).and_then(|timeline| timeline.get(&time))
    }
}

#[derive(Debug, Default)]
pub struct DataStore {
    roster: Vec<String>,
    explicit_roster: bool,
    timelines: HashMap<String, Timeline>,
    /// Sorted distinct times.
    axis: Vec<TimeStep>,
    /// How many cities hold each axis time.
    axis_refs: BTreeMap<TimeStep, usize>,
    max_history: Option<usize>,
    revision: u64,
}

impl DataStore {
    pub fn new(max_history: Option<usize>) -> Self {
        Self {
            max_history: max_history.filter(|cap| *cap > 0),
            ..Self::default()
        }
    }

    /// Fix the display order. Once data exists, the new roster must keep every city with
    /// data, in the same relative order.
    pub fn initialize(&mut self, cities: &[String]) -> Result<()> {
        let mut unique = HashSet::new();
        if let Some(duplicate) = cities.iter().find(|city| !unique.insert(city.as_str())) {
            return Err(VisualizerError::configuration(format!(
                "city '{duplicate}' appears twice in the roster"
            )));
        }

        let seen: Vec<&String> = self
            .roster
            .iter()
            .filter(|city| self.timelines.contains_key(*city))
            .collect();

        if let Some(missing) = seen.iter().find(|city| !unique.contains(city.as_str())) {
            return Err(VisualizerError::configuration(format!(
                "roster drops city '{missing}' which already has data"
            )));
        }

        let reordered: Vec<&String> = cities
            .iter()
            .filter(|city| self.timelines.contains_key(*city))
            .collect();
        if reordered != seen {
            return Err(VisualizerError::configuration(
                "roster reorders cities which already have data",
            ));
        }

        self.roster = cities.to_vec();
        self.explicit_roster = true;
        self.revision += 1;
        Ok(())
    }

    pub fn add_data_point(
        &mut self,
        city: &str,
        time: TimeStep,
        point: SirnPoint,
    ) -> InsertOutcome {
        let new_city = !self.roster.iter().any(|known| known == city);
        if new_city {
            if self.explicit_roster {
                tracing::warn!("City {} is not in the initialized roster, appending", city);
            }
            self.roster.push(city.to_string());
        }

        let timeline = self.timelines.entry(city.to_string()).or_default();
        let change = match timeline.insert(time, point) {
            None => PointChange::Inserted,
            Some(previous) if previous == point => PointChange::Unchanged,
            Some(_) => PointChange::Overwritten,
        };

        let mut axis = AxisDelta::default();
        if change == PointChange::Inserted {
            axis.inserted = self.retain_time(time);
            axis.removed = self.enforce_history_cap(city);
        }

        if change != PointChange::Unchanged || new_city {
            self.revision += 1;
        }

        InsertOutcome {
            change,
            new_city,
            axis,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            roster: self.roster.clone(),
            axis: self.axis.clone(),
            timelines: self.timelines.clone(),
            revision: self.revision,
        }
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn axis(&self) -> &[TimeStep] {
        &self.axis
    }

    pub fn point(&self, city: &str, time: TimeStep) -> Option<&SirnPoint> {
        self.timelines.get(city).and_then(|timeline| timeline.get(&time))
    }

    pub fn has_data(&self) -> bool {
        !self.timelines.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Count a city's use of `time`, returning its new axis index if it was unseen.
    fn retain_time(&mut self, time: TimeStep) -> Option<usize> {
        let refs = self.axis_refs.entry(time).or_insert(0);
        *refs += 1;
        if *refs > 1 {
            return None;
        }
        let index = self.axis.partition_point(|t| *t < time);
        self.axis.insert(index, time);
        Some(index)
    }

    /// Drop one city's use of `time`, returning the axis index it had if it was the last.
    fn release_time(&mut self, time: TimeStep) -> Option<usize> {
        let refs = self.axis_refs.get_mut(&time)?;
        *refs -= 1;
        if *refs > 0 {
            return None;
        }
        self.axis_refs.remove(&time);
        let index = self.axis.binary_search(&time).ok()?;
        self.axis.remove(index);
        Some(index)
    }

    fn enforce_history_cap(&mut self, city: &str) -> Vec<usize> {
        let Some(cap) = self.max_history else {
            return Vec::new();
        };

        let mut evicted = Vec::new();
        if let Some(timeline) = self.timelines.get_mut(city) {
            while timeline.len() > cap {
                match timeline.pop_first() {
                    Some((time, _)) => evicted.push(time),
                    None => break,
                }
            }
        }

        // Evicted times are ascending, so every earlier removal sat below the current
        // one; adding their count maps back to the pre-eviction axis.
        let mut removed = Vec::new();
        for time in evicted {
            if let Some(index) = self.release_time(time) {
                removed.push(index + removed.len());
            }
        }
        removed
    }
}
