// View state and input vocabulary
use super::chart::Compartment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// All data is loaded before the first redraw.
    Static,
    /// Data may keep arriving while the display is open.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    Scrolling,
    Scrubbing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub mode: DisplayMode,
    /// Index into the global time axis; `None` while the axis is empty.
    pub selected_index: Option<usize>,
    /// First visible line of the panel area.
    pub scroll_offset: u32,
    /// Keep the selection on the newest time (dynamic mode only).
    pub follow_latest: bool,
    pub heatmap_metric: Compartment,
}

impl ViewState {
    pub fn new(mode: DisplayMode, heatmap_metric: Compartment) -> Self {
        Self {
            mode,
            selected_index: None,
            scroll_offset: 0,
            follow_latest: mode == DisplayMode::Dynamic,
            heatmap_metric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse wheel or arrow key; positive scrolls down.
    Wheel { steps: i32 },
    PageUp,
    PageDown,
    Home,
    End,
    /// Position along the slider track, 0.0 (first time) to 1.0 (last time).
    SliderPress { position: f64 },
    SliderDrag { position: f64 },
    SliderRelease,
    StepTime { delta: i32 },
    JumpToLatest,
    CycleMetric,
    Resize { width: u16, height: u16 },
}
