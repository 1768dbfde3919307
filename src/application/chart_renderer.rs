// Chart renderer - pure transforms from SIRN data to chart descriptions
use crate::application::data_store::Timeline;
use crate::domain::chart::{Anomaly, Compartment, HeatCell, HeatMap, ProportionChart, Slice};
use crate::domain::sirn::{SirnPoint, TimeStep};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    sum_tolerance: f64,
}

impl ChartRenderer {
    pub fn new(sum_tolerance: f64) -> Self {
        Self {
            sum_tolerance: sum_tolerance.max(0.0),
        }
    }

    /// Three non-negative proportions in S, I, R order.
    ///
    /// A consistent point with N > 0 is divided by N. Otherwise the parts are normalised
    /// by their own sum (when positive) and the chart carries an anomaly flag.
    pub fn render_proportion(&self, point: &SirnPoint) -> ProportionChart {
        let parts = [
            point.susceptible.max(0.0),
            point.infected.max(0.0),
            point.recovered.max(0.0),
        ];
        let parts_sum: f64 = parts.iter().sum();

        let anomaly = if point.total <= 0.0 {
            Some(Anomaly::ZeroPopulation)
        } else if (parts_sum - point.total).abs() > self.sum_tolerance * point.total {
            Some(Anomaly::InconsistentTotal {
                compartment_sum: parts_sum,
                total: point.total,
            })
        } else {
            None
        };

        let divisor = match anomaly {
            None => point.total,
            Some(_) => parts_sum,
        };
        let proportion = |part: f64| {
            if divisor > 0.0 {
                (part / divisor).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        ProportionChart {
            slices: [
                Slice {
                    compartment: Compartment::Susceptible,
                    proportion: proportion(parts[0]),
                },
                Slice {
                    compartment: Compartment::Infected,
                    proportion: proportion(parts[1]),
                },
                Slice {
                    compartment: Compartment::Recovered,
                    proportion: proportion(parts[2]),
                },
            ],
            anomaly,
        }
    }

    /// Cities x times matrix of the `metric` fraction; unsupplied cells are `NoData`.
    pub fn render_heatmap(
        &self,
        roster: &[String],
        axis: &[TimeStep],
        timelines: &HashMap<String, Timeline>,
        metric: Compartment,
    ) -> HeatMap {
        let cells = roster
            .iter()
            .map(|city| {
                let timeline = timelines.get(city);
                axis.iter()
                    .map(|time| match timeline.and_then(|t| t.get(time)) {
                        Some(point) => {
                            HeatCell::Value(self.render_proportion(point).proportion(metric))
                        }
                        None => HeatCell::NoData,
                    })
                    .collect()
            })
            .collect();

        HeatMap {
            metric,
            cities: roster.to_vec(),
            times: axis.to_vec(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(values: [f64; 4]) -> SirnPoint {
        SirnPoint {
            susceptible: values[0],
            infected: values[1],
            recovered: values[2],
            total: values[3],
        }
    }

    fn t(value: f64) -> TimeStep {
        TimeStep::new(value).unwrap()
    }

    #[test]
    fn test_consistent_point_sums_to_one() {
        let renderer = ChartRenderer::new(1e-6);
        let chart = renderer.render_proportion(&point([90.0, 10.0, 1.0, 101.0]));

        let [s, i, r] = chart.proportions();
        assert!(chart.anomaly.is_none());
        assert!((s - 0.891).abs() < 1e-3);
        assert!((i - 0.099).abs() < 1e-3);
        assert!((r - 0.010).abs() < 1e-3);
        assert!((s + i + r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_order_is_fixed() {
        let renderer = ChartRenderer::new(1e-6);
        let chart = renderer.render_proportion(&point([1.0, 98.0, 1.0, 100.0]));
        let order: Vec<Compartment> = chart.slices.iter().map(|s| s.compartment).collect();
        assert_eq!(order, Compartment::ALL.to_vec());
    }

    #[test]
    fn test_zero_population_is_flagged() {
        let renderer = ChartRenderer::new(1e-6);
        let chart = renderer.render_proportion(&point([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(chart.anomaly, Some(Anomaly::ZeroPopulation));
        assert_eq!(chart.proportions(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inconsistent_total_is_normalised_and_flagged() {
        let renderer = ChartRenderer::new(1e-6);
        let chart = renderer.render_proportion(&point([49.0, 49.0, 0.0, 100.0]));

        assert!(matches!(
            chart.anomaly,
            Some(Anomaly::InconsistentTotal { .. })
        ));
        let [s, i, r] = chart.proportions();
        assert!((s - 0.5).abs() < 1e-9);
        assert!((i - 0.5).abs() < 1e-9);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_heatmap_distinguishes_missing_from_zero() {
        let renderer = ChartRenderer::new(1e-6);
        let roster = vec!["A".to_string(), "B".to_string()];
        let axis = vec![t(0.0), t(10.0)];

        let mut timelines: HashMap<String, Timeline> = HashMap::new();
        timelines
            .entry("A".to_string())
            .or_default()
            .insert(t(0.0), point([100.0, 0.0, 0.0, 100.0]));
        timelines
            .entry("A".to_string())
            .or_default()
            .insert(t(10.0), point([90.0, 10.0, 0.0, 100.0]));
        timelines
            .entry("B".to_string())
            .or_default()
            .insert(t(0.0), point([200.0, 0.0, 0.0, 200.0]));

        let heatmap = renderer.render_heatmap(&roster, &axis, &timelines, Compartment::Infected);

        assert_eq!(heatmap.cell(0, 0), Some(HeatCell::Value(0.0)));
        assert_eq!(heatmap.cell(0, 1), Some(HeatCell::Value(0.1)));
        assert_eq!(heatmap.cell(1, 0), Some(HeatCell::Value(0.0)));
        assert_eq!(heatmap.cell(1, 1), Some(HeatCell::NoData));
        assert_ne!(heatmap.cell(1, 1), heatmap.cell(1, 0));
    }

    #[test]
    fn test_heatmap_rows_for_cities_without_data() {
        let renderer = ChartRenderer::new(1e-6);
        let roster = vec!["ghost".to_string()];
        let heatmap =
            renderer.render_heatmap(&roster, &[t(1.0)], &HashMap::new(), Compartment::Recovered);
        assert_eq!(heatmap.cells, vec![vec![HeatCell::NoData]]);
        assert_eq!(heatmap.title(), "Recovered Population (% of total)");
    }
}
