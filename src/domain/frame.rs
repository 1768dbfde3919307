// Display frame domain model
use super::chart::{HeatMap, ProportionChart};
use super::geometry::{PanelPlacement, ScreenRegions};
use super::sirn::TimeStep;
use super::view::DisplayMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Following,
    Manual,
    Dragging,
}

impl CursorMode {
    pub fn label(self) -> &'static str {
        match self {
            CursorMode::Following => "follow",
            CursorMode::Manual => "manual",
            CursorMode::Dragging => "dragging",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub city: String,
    pub title: String,
    pub placement: PanelPlacement,
    /// `None` when the city has no data at the selected time.
    pub chart: Option<ProportionChart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliderView {
    pub selected_index: Option<usize>,
    pub selected_time: Option<TimeStep>,
    pub axis_len: usize,
}

impl SliderView {
    /// Fraction of the track covered by the selection.
    pub fn progress(&self) -> f64 {
        match self.selected_index {
            Some(index) if self.axis_len > 1 => index as f64 / (self.axis_len - 1) as f64,
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub title: String,
    pub mode: DisplayMode,
    pub cursor: CursorMode,
    pub regions: ScreenRegions,
    pub scroll_offset: u32,
    pub max_scroll: u32,
    /// Only panels that intersect the viewport.
    pub panels: Vec<PanelView>,
    pub heatmap: HeatMap,
    /// First heat-map row shown; follows the first visible panel.
    pub heatmap_first_row: usize,
    pub slider: SliderView,
    pub notice: Option<String>,
}

impl DisplayFrame {
    pub fn status_line(&self) -> String {
        let time = self
            .slider
            .selected_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let position = self
            .slider
            .selected_index
            .map(|i| format!("{}/{}", i + 1, self.slider.axis_len))
            .unwrap_or_else(|| "0/0".to_string());
        let mode = match self.mode {
            DisplayMode::Static => "static",
            DisplayMode::Dynamic => "dynamic",
        };
        format!(
            "{}  [{}]  t={} ({})  cursor={}  scroll={}/{}",
            self.title,
            mode,
            time,
            position,
            self.cursor.label(),
            self.scroll_offset,
            self.max_scroll
        )
    }
}
