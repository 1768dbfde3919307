use crate::domain::chart::Compartment;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VisualizerConfig {
    pub layout: LayoutSettings,
    pub render: RenderSettings,
    pub data: DataSettings,
    pub playback: PlaybackSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutSettings {
    /// Panels per row.
    pub columns: u16,
    /// Lines per panel.
    pub panel_height: u16,
    pub heatmap_max_rows: u16,
    /// Lines moved per wheel notch or arrow key.
    pub scroll_step: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            columns: 3,
            panel_height: 6,
            heatmap_max_rows: 12,
            scroll_step: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderSettings {
    /// Relative S+I+R vs N mismatch above which a chart is flagged.
    pub sum_tolerance: f64,
    pub heatmap_metric: Compartment,
    pub frame_interval_ms: u64,
    /// How long a footer notice stays up.
    pub notice_ttl_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sum_tolerance: 1e-6,
            heatmap_metric: Compartment::Infected,
            frame_interval_ms: 50,
            notice_ttl_ms: 5000,
        }
    }
}

impl RenderSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    /// Relative S+I+R vs N mismatch above which a point is rejected.
    pub max_sum_deviation: f64,
    /// Per-city history cap; unset keeps everything.
    pub max_history: Option<usize>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            max_sum_deviation: 0.05,
            max_history: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlaybackSettings {
    pub step_delay_ms: u64,
    pub demo_cities: usize,
    pub max_time: u32,
    pub time_step: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: 500,
            demo_cities: 10,
            max_time: 100,
            time_step: 10,
        }
    }
}

impl PlaybackSettings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub file: String,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: "sirn-visualizer.log".to_string(),
            filter: "info".to_string(),
        }
    }
}

/// Optional `config/visualizer.*` file, overridden by `SIRN__SECTION__KEY` variables.
pub fn load_visualizer_config() -> anyhow::Result<VisualizerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/visualizer").required(false))
        .add_source(
            config::Environment::with_prefix("SIRN")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
