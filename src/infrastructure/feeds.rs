// Feed implementations - dataset replay, live demo simulation and the scripted example model
use crate::application::feed::{FeedStep, SirnFeed};
use crate::domain::dataset::SirnDataset;
use crate::domain::sirn::SirnPoint;
use crate::infrastructure::generator::{
    CityModel, ParameterNoise, default_population, report_times,
};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Replays a loaded dataset one time at a time, cities in roster order.
pub struct DatasetFeed {
    roster: Vec<String>,
    steps: VecDeque<FeedStep>,
}

impl DatasetFeed {
    pub fn new(dataset: &SirnDataset) -> Self {
        let steps = dataset
            .by_time()
            .into_iter()
            .map(|(time, entries)| FeedStep {
                time: time.value(),
                points: entries
                    .into_iter()
                    .map(|entry| (entry.city.clone(), entry.point.as_array()))
                    .collect(),
            })
            .collect();
        Self {
            roster: dataset.roster.clone(),
            steps,
        }
    }
}

#[async_trait]
impl SirnFeed for DatasetFeed {
    fn roster(&self) -> Vec<String> {
        self.roster.clone()
    }

    async fn next_step(&mut self) -> anyhow::Result<Option<FeedStep>> {
        Ok(self.steps.pop_front())
    }
}

/// Integrates a SIR model per city as it goes, so data appears live.
pub struct SimulationFeed {
    models: Vec<CityModel>,
    current: Vec<SirnPoint>,
    times: VecDeque<u32>,
    previous_time: Option<u32>,
    noise: ParameterNoise,
}

impl SimulationFeed {
    pub fn new(
        cities: usize,
        max_time: u32,
        time_step: u32,
        stochastic: bool,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        let models: Vec<CityModel> = (0..cities)
            .map(|city| CityModel {
                population: (default_population(city, cities) + 1) as f64,
                beta: 0.2 + 0.03 * city as f64,
                gamma: 0.1 + 0.01 * city as f64,
            })
            .collect();
        let current = models.iter().map(|model| model.initial_point(1.0)).collect();

        let mut times = VecDeque::from(report_times(max_time, time_step)?);
        times.push_front(0);

        Ok(Self {
            models,
            current,
            times,
            previous_time: None,
            noise: ParameterNoise::new(stochastic, seed)?,
        })
    }
}

#[async_trait]
impl SirnFeed for SimulationFeed {
    fn roster(&self) -> Vec<String> {
        (0..self.models.len()).map(|city| city.to_string()).collect()
    }

    async fn next_step(&mut self) -> anyhow::Result<Option<FeedStep>> {
        let Some(time) = self.times.pop_front() else {
            return Ok(None);
        };
        if let Some(previous) = self.previous_time {
            let dt = (time - previous) as f64;
            for (model, point) in self.models.iter().zip(self.current.iter_mut()) {
                *point = model.advance(*point, dt, &mut self.noise);
            }
        }
        self.previous_time = Some(time);

        Ok(Some(FeedStep {
            time: time as f64,
            points: self
                .current
                .iter()
                .enumerate()
                .map(|(city, point)| (city.to_string(), point.as_array()))
                .collect(),
        }))
    }
}

/// Closed-form toy model over four cities, reported every 10 time units up to 100.
pub struct ExampleFeed {
    cities: usize,
    times: VecDeque<u32>,
}

impl ExampleFeed {
    pub fn new() -> Self {
        Self {
            cities: 4,
            times: (0..=100).step_by(10).collect(),
        }
    }

    fn point(city: usize, time: u32) -> [f64; 4] {
        let city = city as f64;
        let n = 100.0 + city * 100.0;
        let t = time as f64 / 100.0;
        let s = n * (1.0 - t * (0.7 + 0.1 * city));
        let i = n * t * (0.4 - 0.05 * city);
        [s, i, n - s - i, n]
    }
}

impl Default for ExampleFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SirnFeed for ExampleFeed {
    fn roster(&self) -> Vec<String> {
        (0..self.cities).map(|city| city.to_string()).collect()
    }

    async fn next_step(&mut self) -> anyhow::Result<Option<FeedStep>> {
        Ok(self.times.pop_front().map(|time| FeedStep {
            time: time as f64,
            points: (0..self.cities)
                .map(|city| (city.to_string(), Self::point(city, time)))
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::json_loader::parse_dataset;

    async fn drain(feed: &mut dyn SirnFeed) -> Vec<FeedStep> {
        let mut steps = Vec::new();
        while let Some(step) = feed.next_step().await.unwrap() {
            steps.push(step);
        }
        steps
    }

    #[tokio::test]
    async fn test_dataset_feed_replays_in_time_order() {
        let dataset = parse_dataset(
            r#"{"1": {"10": [1, 0, 0, 1], "0": [1, 0, 0, 1]}, "0": {"10": [2, 0, 0, 2]}}"#,
            0.05,
        )
        .unwrap();
        let mut feed = DatasetFeed::new(&dataset);
        assert_eq!(feed.roster(), vec!["0", "1"]);

        let steps = drain(&mut feed).await;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].time, 0.0);
        let cities: Vec<&str> = steps[1].points.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(cities, vec!["0", "1"]);
    }

    #[tokio::test]
    async fn test_simulation_feed_matches_demo_populations() {
        let mut feed = SimulationFeed::new(10, 100, 10, false, None).unwrap();
        let steps = drain(&mut feed).await;

        assert_eq!(steps.len(), 11);
        let totals: Vec<f64> = steps[0].points.iter().map(|(_, v)| v[3]).collect();
        assert_eq!(
            totals,
            vec![101.0, 101.0, 101.0, 201.0, 201.0, 201.0, 501.0, 501.0, 501.0, 501.0]
        );
        for step in &steps {
            for (_, [s, i, r, n]) in &step.points {
                assert!((s + i + r - n).abs() < 1e-6);
            }
        }
    }

    #[tokio::test]
    async fn test_example_feed_values() {
        let mut feed = ExampleFeed::new();
        let steps = drain(&mut feed).await;

        assert_eq!(steps.len(), 11);
        assert_eq!(steps[0].points[0].1, [100.0, 0.0, 0.0, 100.0]);
        let [s, i, r, n] = steps[10].points[0].1;
        assert!((s - 30.0).abs() < 1e-9);
        assert!((i - 40.0).abs() < 1e-9);
        assert!((r - 30.0).abs() < 1e-9);
        assert_eq!(n, 100.0);
    }
}
