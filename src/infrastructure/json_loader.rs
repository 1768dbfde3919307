// JSON dataset loader - the `{city: {time: [S, I, R, N]}}` file format
use crate::domain::city::sort_city_ids;
use crate::domain::dataset::{DatasetEntry, SirnDataset};
use crate::domain::error::{Result, VisualizerError};
use crate::domain::sirn::{SirnPoint, TimeStep};
use std::collections::BTreeMap;
use std::path::Path;

type RawDataset = BTreeMap<String, BTreeMap<String, Vec<f64>>>;

/// Parse the persisted format. Times are sorted numerically per city; the roster is
/// numeric when every city id is a number, lexicographic otherwise.
pub fn parse_dataset(raw: &str, max_sum_deviation: f64) -> Result<SirnDataset> {
    let parsed: RawDataset = serde_json::from_str(raw)
        .map_err(|err| VisualizerError::malformed(format!("invalid dataset JSON: {err}")))?;

    let mut roster: Vec<String> = parsed.keys().cloned().collect();
    sort_city_ids(&mut roster);

    let mut entries = Vec::new();
    for city in &roster {
        let Some(series) = parsed.get(city) else {
            continue;
        };
        let mut points = Vec::with_capacity(series.len());
        for (raw_time, values) in series {
            let time = TimeStep::parse(raw_time)
                .map_err(|err| VisualizerError::malformed(format!("city {city}: {err}")))?;
            let point = SirnPoint::from_values(values, max_sum_deviation).map_err(|err| {
                VisualizerError::malformed(format!("city {city} at t={raw_time}: {err}"))
            })?;
            points.push(DatasetEntry {
                city: city.clone(),
                time,
                point,
            });
        }
        points.sort_by_key(|entry| entry.time);
        entries.extend(points);
    }

    Ok(SirnDataset { roster, entries })
}

pub fn load_dataset(path: &Path, max_sum_deviation: f64) -> Result<SirnDataset> {
    let raw = std::fs::read_to_string(path).map_err(|err| VisualizerError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let dataset = parse_dataset(&raw, max_sum_deviation)?;
    tracing::info!(
        "Loaded {} cities, {} points from {}",
        dataset.roster.len(),
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

pub fn dataset_to_json(dataset: &SirnDataset) -> anyhow::Result<String> {
    let mut raw: BTreeMap<&str, BTreeMap<String, [f64; 4]>> = BTreeMap::new();
    for city in &dataset.roster {
        raw.entry(city.as_str()).or_default();
    }
    for entry in &dataset.entries {
        raw.entry(entry.city.as_str())
            .or_default()
            .insert(entry.time.to_string(), entry.point.as_array());
    }
    Ok(serde_json::to_string_pretty(&raw)?)
}

pub fn save_dataset(dataset: &SirnDataset, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, dataset_to_json(dataset)?)?;
    tracing::info!("Saved {} cities to {}", dataset.roster.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times_of(dataset: &SirnDataset, city: &str) -> Vec<f64> {
        dataset
            .entries
            .iter()
            .filter(|entry| entry.city == city)
            .map(|entry| entry.time.value())
            .collect()
    }

    #[test]
    fn test_times_sort_numerically_and_roster_is_numeric() {
        let raw = r#"{
            "10": {"0": [1, 0, 0, 1]},
            "2": {"100": [1, 0, 0, 1], "20": [1, 0, 0, 1], "3": [1, 0, 0, 1]}
        }"#;
        let dataset = parse_dataset(raw, 0.05).unwrap();

        assert_eq!(dataset.roster, vec!["2", "10"]);
        assert_eq!(times_of(&dataset, "2"), vec![3.0, 20.0, 100.0]);
    }

    #[test]
    fn test_non_numeric_roster_is_lexicographic() {
        let raw = r#"{"b": {"0": [1, 0, 0, 1]}, "10": {"0": [1, 0, 0, 1]}, "a": {}}"#;
        let dataset = parse_dataset(raw, 0.05).unwrap();
        assert_eq!(dataset.roster, vec!["10", "a", "b"]);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            r#"{"0": {"abc": [1, 0, 0, 1]}}"#,
            r#"{"0": {"0": [1, 0, 1]}}"#,
            r#"{"0": {"0": [1, "x", 0, 1]}}"#,
            r#"{"0": {"0": [1, 0, 0, 50]}}"#,
            r#"[1, 2, 3]"#,
        ];
        for raw in cases {
            assert!(
                matches!(parse_dataset(raw, 0.05), Err(VisualizerError::MalformedData(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = load_dataset(Path::new("/nonexistent/sirn.json"), 0.05).unwrap_err();
        assert!(matches!(err, VisualizerError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_saved_dataset_loads_back() {
        let raw = r#"{"0": {"0": [99, 1, 0, 100], "10": [80.5, 15, 4.5, 100]}, "1": {}}"#;
        let dataset = parse_dataset(raw, 0.05).unwrap();

        let path = std::env::temp_dir().join(format!("sirn-loader-{}.json", std::process::id()));
        save_dataset(&dataset, &path).unwrap();
        let loaded = load_dataset(&path, 0.05).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, dataset);
    }
}
