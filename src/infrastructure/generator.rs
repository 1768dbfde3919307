// Synthetic SIRN data generator - sub-stepped SIR integration per city
use crate::domain::dataset::{DatasetEntry, SirnDataset};
use crate::domain::sirn::{SirnPoint, TimeStep};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

const SUBSTEPS: u32 = 10;
const NOISE_STD: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub cities: usize,
    pub max_time: u32,
    pub time_step: u32,
    pub initial_infected: u32,
    /// Vary beta and gamma by city index instead of the fixed 0.3 / 0.1.
    pub vary_params: bool,
    /// Per-city population (excluding the initially infected); missing entries default.
    pub populations: Vec<u32>,
    pub seed: Option<u64>,
    pub stochastic: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            cities: 3,
            max_time: 100,
            time_step: 10,
            initial_infected: 1,
            vary_params: true,
            populations: Vec::new(),
            seed: None,
            stochastic: false,
        }
    }
}

/// Small, medium and large cities by thirds of the roster.
pub fn default_population(index: usize, cities: usize) -> u32 {
    if index < cities / 3 {
        100
    } else if index < 2 * cities / 3 {
        200
    } else {
        500
    }
}

/// Report times after 0: every `time_step` up to `max_time`, plus `max_time` itself.
pub fn report_times(max_time: u32, time_step: u32) -> anyhow::Result<Vec<u32>> {
    anyhow::ensure!(time_step > 0, "time step must be positive");
    let mut times: Vec<u32> = (time_step..=max_time).step_by(time_step as usize).collect();
    if max_time > 0 && max_time % time_step != 0 {
        times.push(max_time);
    }
    Ok(times)
}

/// Random multiplicative jitter on the model rates.
pub enum ParameterNoise {
    Off,
    Gaussian { rng: Pcg64, normal: Normal<f64> },
}

impl ParameterNoise {
    pub fn new(stochastic: bool, seed: Option<u64>) -> anyhow::Result<Self> {
        if !stochastic {
            return Ok(ParameterNoise::Off);
        }
        let rng = match seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        let normal = Normal::new(0.0, NOISE_STD)
            .map_err(|err| anyhow::anyhow!("invalid noise distribution: {err:?}"))?;
        Ok(ParameterNoise::Gaussian { rng, normal })
    }

    fn factor(&mut self) -> f64 {
        match self {
            ParameterNoise::Off => 1.0,
            ParameterNoise::Gaussian { rng, normal } => 1.0 + normal.sample(rng),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityModel {
    pub population: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl CityModel {
    pub fn initial_point(&self, initial_infected: f64) -> SirnPoint {
        let infected = initial_infected.min(self.population).max(0.0);
        SirnPoint {
            susceptible: self.population - infected,
            infected,
            recovered: 0.0,
            total: self.population,
        }
    }

    /// Integrate over `dt` in fixed sub-steps, keeping S + I + R == N.
    pub fn advance(&self, point: SirnPoint, dt: f64, noise: &mut ParameterNoise) -> SirnPoint {
        let n = self.population;
        let (mut s, mut i, mut r) = (point.susceptible, point.infected, point.recovered);
        let sub_dt = dt / SUBSTEPS as f64;

        for _ in 0..SUBSTEPS {
            let beta = self.beta * noise.factor();
            let gamma = self.gamma * noise.factor();
            let infections = if n > 0.0 { beta * s * i / n * sub_dt } else { 0.0 };
            let recoveries = gamma * i * sub_dt;

            s = (s - infections).max(0.0);
            i = (i + infections - recoveries).max(0.0);
            r = (r + recoveries).max(0.0);

            let sum = s + i + r;
            if sum > 0.0 && (sum - n).abs() > 1e-9 {
                s *= n / sum;
                i *= n / sum;
                r *= n / sum;
            }
        }

        SirnPoint {
            susceptible: s,
            infected: i,
            recovered: r,
            total: n,
        }
    }
}

pub fn city_models(params: &GeneratorParams) -> Vec<CityModel> {
    (0..params.cities)
        .map(|city| {
            let base = params
                .populations
                .get(city)
                .copied()
                .unwrap_or_else(|| {
                    if params.populations.is_empty() {
                        default_population(city, params.cities)
                    } else {
                        100
                    }
                });
            let (beta, gamma) = if params.vary_params {
                (0.2 + 0.05 * city as f64, 0.1 + 0.01 * city as f64)
            } else {
                (0.3, 0.1)
            };
            CityModel {
                population: (base + params.initial_infected) as f64,
                beta,
                gamma,
            }
        })
        .collect()
}

pub fn generate_dataset(params: &GeneratorParams) -> anyhow::Result<SirnDataset> {
    let times = report_times(params.max_time, params.time_step)?;
    let mut noise = ParameterNoise::new(params.stochastic, params.seed)?;
    let roster: Vec<String> = (0..params.cities).map(|city| city.to_string()).collect();

    let mut entries = Vec::with_capacity(params.cities * (times.len() + 1));
    for (city, model) in city_models(params).iter().enumerate() {
        let mut point = model.initial_point(params.initial_infected as f64);
        entries.push(DatasetEntry {
            city: roster[city].clone(),
            time: TimeStep::new(0.0)?,
            point,
        });

        let mut previous = 0;
        for &time in &times {
            point = model.advance(point, (time - previous) as f64, &mut noise);
            previous = time;
            entries.push(DatasetEntry {
                city: roster[city].clone(),
                time: TimeStep::new(time as f64)?,
                point,
            });
        }
    }

    tracing::info!(
        "Generated {} points for {} cities up to t={}",
        entries.len(),
        params.cities,
        params.max_time
    );
    Ok(SirnDataset { roster, entries })
}

/// First few times of the first few cities, one line per time.
pub fn format_preview(dataset: &SirnDataset, cities: usize, times: usize) -> String {
    let mut out = String::new();
    let grouped = dataset.by_time();
    for city in dataset.roster.iter().take(cities) {
        out.push_str(&format!("City {city}:\n"));
        let series: Vec<_> = grouped
            .iter()
            .filter_map(|(time, entries)| {
                entries
                    .iter()
                    .find(|entry| &entry.city == city)
                    .map(|entry| (*time, entry.point))
            })
            .collect();
        for (time, point) in series.iter().take(times) {
            out.push_str(&format!(
                "  Time {}: S={:.2}, I={:.2}, R={:.2}, N={:.2}\n",
                time, point.susceptible, point.infected, point.recovered, point.total
            ));
        }
        if series.len() > times {
            out.push_str(&format!("  ... and {} more time steps\n", series.len() - times));
        }
        out.push('\n');
    }
    out
}
