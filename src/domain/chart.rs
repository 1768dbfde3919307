// Chart domain models
use super::sirn::TimeStep;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GRAY: Rgb = Rgb(110, 110, 110);
    pub const DARK_GRAY: Rgb = Rgb(60, 60, 60);
    pub const YELLOW: Rgb = Rgb(230, 200, 40);

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }
}

/// Compartments in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

impl Compartment {
    pub const ALL: [Compartment; 3] = [
        Compartment::Susceptible,
        Compartment::Infected,
        Compartment::Recovered,
    ];

    pub fn short_label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Infected => "I",
            Compartment::Recovered => "R",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "Susceptible",
            Compartment::Infected => "Infected",
            Compartment::Recovered => "Recovered",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Compartment::Susceptible => Rgb(40, 90, 220),
            Compartment::Infected => Rgb(215, 40, 40),
            Compartment::Recovered => Rgb(40, 160, 70),
        }
    }

    /// Heat-map shade for a fraction in [0, 1]: white through the compartment color.
    pub fn shade(self, fraction: f64) -> Rgb {
        Rgb::WHITE.mix(self.color(), fraction)
    }

    pub fn next(self) -> Compartment {
        match self {
            Compartment::Susceptible => Compartment::Infected,
            Compartment::Infected => Compartment::Recovered,
            Compartment::Recovered => Compartment::Susceptible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    /// N == 0, proportions are not meaningful.
    ZeroPopulation,
    /// S + I + R differs from N; proportions were normalised by S + I + R.
    InconsistentTotal { compartment_sum: f64, total: f64 },
}

impl Anomaly {
    pub fn describe(&self) -> String {
        match self {
            Anomaly::ZeroPopulation => "N = 0".to_string(),
            Anomaly::InconsistentTotal {
                compartment_sum,
                total,
            } => format!("S+I+R = {compartment_sum:.1} vs N = {total:.1}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub compartment: Compartment,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProportionChart {
    /// Always Susceptible, Infected, Recovered in that order.
    pub slices: [Slice; 3],
    pub anomaly: Option<Anomaly>,
}

impl ProportionChart {
    pub fn proportion(&self, compartment: Compartment) -> f64 {
        self.slices
            .iter()
            .find(|slice| slice.compartment == compartment)
            .map(|slice| slice.proportion)
            .unwrap_or_default()
    }

    pub fn proportions(&self) -> [f64; 3] {
        self.slices.map(|slice| slice.proportion)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatCell {
    Value(f64),
    NoData,
}

impl HeatCell {
    pub fn value(self) -> Option<f64> {
        match self {
            HeatCell::Value(value) => Some(value),
            HeatCell::NoData => None,
        }
    }
}

/// Cities x times matrix of one compartment fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatMap {
    pub metric: Compartment,
    pub cities: Vec<String>,
    pub times: Vec<TimeStep>,
    pub cells: Vec<Vec<HeatCell>>,
}

impl HeatMap {
    pub fn cell(&self, row: usize, col: usize) -> Option<HeatCell> {
        self.cells.get(row).and_then(|cells| cells.get(col)).copied()
    }

    pub fn title(&self) -> String {
        format!("{} Population (% of total)", self.metric.label())
    }
}
