// SIRN data domain models
use super::error::{Result, VisualizerError};
use std::cmp::Ordering;
use std::fmt;

/// A point on the global time axis.
///
/// Always finite, so the total order over `f64` doubles as the numeric order.
#[derive(Debug, Clone, Copy)]
pub struct TimeStep(f64);

impl TimeStep {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(VisualizerError::malformed(format!(
                "time must be a finite number, got {value}"
            )));
        }
        // -0.0 and 0.0 are the same time
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    /// Parse a stringified time key from the persisted format.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| VisualizerError::malformed(format!("time key '{raw}' is not a number")))?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for TimeStep {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeStep {}

impl PartialOrd for TimeStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStep {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for TimeStep {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One (S, I, R, N) observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirnPoint {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
    pub total: f64,
}

impl SirnPoint {
    /// Validate a raw `[S, I, R, N]` array.
    ///
    /// `max_sum_deviation` is relative to `max(N, 1)`; smaller mismatches are kept and
    /// left for the renderer to flag.
    pub fn from_values(values: &[f64], max_sum_deviation: f64) -> Result<Self> {
        let [s, i, r, n] = values else {
            return Err(VisualizerError::malformed(format!(
                "expected 4 values [S, I, R, N], got {}",
                values.len()
            )));
        };

        for (label, value) in [("S", s), ("I", i), ("R", r), ("N", n)] {
            if !value.is_finite() || *value < 0.0 {
                return Err(VisualizerError::malformed(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }

        let point = Self {
            susceptible: *s,
            infected: *i,
            recovered: *r,
            total: *n,
        };

        let allowed = max_sum_deviation * point.total.max(1.0);
        if point.sum_deviation() > allowed {
            return Err(VisualizerError::malformed(format!(
                "S+I+R = {} does not match N = {}",
                point.compartment_sum(),
                point.total
            )));
        }

        Ok(point)
    }

    pub fn compartment_sum(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    pub fn sum_deviation(&self) -> f64 {
        (self.compartment_sum() - self.total).abs()
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.susceptible, self.infected, self.recovered, self.total]
    }
}
