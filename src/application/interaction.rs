// Interaction controller - owns the view state and the dirty flag
use crate::application::data_store::AxisDelta;
use crate::application::layout::LayoutManager;
use crate::domain::chart::Compartment;
use crate::domain::error::{Result, VisualizerError};
use crate::domain::frame::CursorMode;
use crate::domain::sirn::TimeStep;
use crate::domain::view::{DisplayMode, InputEvent, InteractionPhase, ViewState};

#[derive(Debug, Clone)]
pub struct InteractionController {
    view: ViewState,
    phase: InteractionPhase,
    scroll_step: u32,
    dirty: bool,
}

impl InteractionController {
    pub fn new(mode: DisplayMode, metric: Compartment, scroll_step: u32) -> Self {
        Self {
            view: ViewState::new(mode, metric),
            phase: InteractionPhase::Idle,
            scroll_step: scroll_step.max(1),
            // first frame always draws
            dirty: true,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    pub fn cursor_mode(&self) -> CursorMode {
        if self.phase == InteractionPhase::Scrubbing {
            CursorMode::Dragging
        } else if self.view.mode == DisplayMode::Dynamic && self.view.follow_latest {
            CursorMode::Following
        } else {
            CursorMode::Manual
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag; true at most once per change burst.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Apply one input event. Returns whether the view state changed.
    pub fn handle(&mut self, event: InputEvent, layout: &LayoutManager, axis: &[TimeStep]) -> bool {
        let before = self.view.clone();
        let phase_before = self.phase;

        match event {
            InputEvent::Wheel { steps } => {
                self.phase = InteractionPhase::Scrolling;
                let delta = steps as i64 * self.scroll_step as i64;
                self.scroll_to(layout, self.view.scroll_offset as i64 + delta);
                self.phase = InteractionPhase::Idle;
            }
            InputEvent::PageUp | InputEvent::PageDown => {
                self.phase = InteractionPhase::Scrolling;
                let page = layout.viewport_height().max(1) as i64;
                let delta = if event == InputEvent::PageUp { -page } else { page };
                self.scroll_to(layout, self.view.scroll_offset as i64 + delta);
                self.phase = InteractionPhase::Idle;
            }
            InputEvent::Home => self.scroll_to(layout, 0),
            InputEvent::End => self.scroll_to(layout, layout.max_scroll() as i64),
            InputEvent::SliderPress { position } | InputEvent::SliderDrag { position } => {
                self.phase = InteractionPhase::Scrubbing;
                if let Some(index) = slider_index(axis, position) {
                    self.select_index(index, axis.len());
                }
            }
            InputEvent::SliderRelease => {
                if self.phase == InteractionPhase::Scrubbing {
                    self.phase = InteractionPhase::Idle;
                    self.settle_after_scrub(axis.len());
                }
            }
            InputEvent::StepTime { delta } => {
                if let Some(current) = self.view.selected_index {
                    let last = axis.len().saturating_sub(1) as i64;
                    let target = (current as i64 + delta as i64).clamp(0, last);
                    self.select_index(target as usize, axis.len());
                }
            }
            InputEvent::JumpToLatest => self.jump_to_latest(axis.len()),
            InputEvent::CycleMetric => {
                self.view.heatmap_metric = self.view.heatmap_metric.next();
            }
            InputEvent::Resize { .. } => self.reclamp(layout),
        }

        let changed = self.view != before || self.phase != phase_before;
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Programmatic jump, same effect as a slider jump.
    pub fn set_time_index(&mut self, index: usize, axis_len: usize) -> Result<()> {
        if index >= axis_len {
            return Err(VisualizerError::out_of_range(format!(
                "time index {index} outside [0, {axis_len})"
            )));
        }
        self.select_index(index, axis_len);
        Ok(())
    }

    pub fn jump_to_latest(&mut self, axis_len: usize) {
        if axis_len == 0 {
            return;
        }
        self.select_index(axis_len - 1, axis_len);
        if self.view.mode == DisplayMode::Dynamic {
            self.view.follow_latest = true;
        }
        self.dirty = true;
    }

    pub fn set_mode(&mut self, mode: DisplayMode, axis_len: usize) {
        self.view.mode = mode;
        match mode {
            DisplayMode::Dynamic => {
                self.view.follow_latest = true;
                if axis_len > 0 {
                    self.view.selected_index = Some(axis_len - 1);
                }
            }
            DisplayMode::Static => {
                self.view.follow_latest = false;
                if self.view.selected_index.is_none() && axis_len > 0 {
                    self.view.selected_index = Some(0);
                }
            }
        }
        self.dirty = true;
    }

    /// Put the cursor where a freshly loaded axis starts: the first time in static mode,
    /// the newest (following) in dynamic mode.
    pub fn reset_selection(&mut self, axis_len: usize) {
        self.view.selected_index = match (axis_len, self.view.mode) {
            (0, _) => None,
            (_, DisplayMode::Static) => Some(0),
            (len, DisplayMode::Dynamic) => Some(len - 1),
        };
        self.view.follow_latest = self.view.mode == DisplayMode::Dynamic;
        self.dirty = true;
    }

    /// Keep the selection consistent with an axis that just grew or shrank.
    ///
    /// Following cursors snap to the newest time. A manual cursor keeps pointing at the
    /// same time: inserts and evictions before it shift its index.
    pub fn on_axis_changed(&mut self, delta: &AxisDelta, axis_len: usize) {
        let before = self.view.selected_index;

        if axis_len == 0 {
            self.view.selected_index = None;
        } else if self.is_following() {
            self.view.selected_index = Some(axis_len - 1);
        } else {
            let mut index = match before {
                Some(index) => {
                    let mut index = index;
                    if delta.inserted.is_some_and(|inserted| inserted <= index) {
                        index += 1;
                    }
                    let removed_before = delta.removed.iter().filter(|r| **r < index).count();
                    index - removed_before
                }
                None => match self.view.mode {
                    DisplayMode::Static => 0,
                    DisplayMode::Dynamic => axis_len - 1,
                },
            };
            index = index.min(axis_len - 1);
            self.view.selected_index = Some(index);
        }

        if self.view.selected_index != before {
            self.dirty = true;
        }
    }

    /// Re-apply the scroll clamp after a resize or roster change.
    pub fn reclamp(&mut self, layout: &LayoutManager) {
        self.scroll_to(layout, self.view.scroll_offset as i64);
    }

    fn is_following(&self) -> bool {
        self.view.mode == DisplayMode::Dynamic
            && self.view.follow_latest
            && self.phase != InteractionPhase::Scrubbing
    }

    fn scroll_to(&mut self, layout: &LayoutManager, offset: i64) {
        let clamped = layout.clamp_scroll(offset);
        if clamped != self.view.scroll_offset {
            self.view.scroll_offset = clamped;
            self.dirty = true;
        }
    }

    /// A scrub released on the newest time resumes following, which may have to catch
    /// up with times that arrived while the knob was held.
    fn settle_after_scrub(&mut self, axis_len: usize) {
        if self.is_following() && axis_len > 0 && self.view.selected_index != Some(axis_len - 1) {
            self.view.selected_index = Some(axis_len - 1);
            self.dirty = true;
        }
    }

    fn select_index(&mut self, index: usize, axis_len: usize) {
        self.view.selected_index = Some(index);
        // picking anything but the newest time turns auto-follow off
        self.view.follow_latest = self.view.mode == DisplayMode::Dynamic && index + 1 == axis_len;
        self.dirty = true;
    }
}

/// Axis index under a 0..1 slider position. The track is spaced by index, the
/// same way the fill is drawn, so ties go to the later index.
pub fn slider_index(axis: &[TimeStep], position: f64) -> Option<usize> {
    let last = axis.len().checked_sub(1)?;
    let position = if position.is_finite() {
        position.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(((position * last as f64).round() as usize).min(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::SliderView;
    use crate::domain::geometry::Extent;
    use crate::infrastructure::config::LayoutSettings;

    fn axis(values: &[f64]) -> Vec<TimeStep> {
        values.iter().map(|v| TimeStep::new(*v).unwrap()).collect()
    }

    fn layout(cities: usize) -> LayoutManager {
        let mut layout = LayoutManager::new(LayoutSettings::default());
        layout.set_screen(Extent::new(90, 20));
        layout.set_city_count(cities);
        layout
    }

    fn dynamic() -> InteractionController {
        InteractionController::new(DisplayMode::Dynamic, Compartment::Infected, 2)
    }

    fn grow(controller: &mut InteractionController, inserted: usize, len: usize) {
        let delta = AxisDelta {
            inserted: Some(inserted),
            removed: Vec::new(),
        };
        controller.on_axis_changed(&delta, len);
    }

    #[test]
    fn test_slider_index_spaced_by_index() {
        let times = axis(&[0.0, 10.0, 20.0, 100.0]);
        assert_eq!(slider_index(&times, 0.0), Some(0));
        assert_eq!(slider_index(&times, 0.16), Some(0));
        assert_eq!(slider_index(&times, 0.17), Some(1));
        assert_eq!(slider_index(&times, 0.5), Some(2));
        assert_eq!(slider_index(&times, 0.83), Some(2));
        assert_eq!(slider_index(&times, 0.84), Some(3));
        assert_eq!(slider_index(&times, 2.0), Some(3));
        assert_eq!(slider_index(&times, f64::NAN), Some(0));
        assert_eq!(slider_index(&[], 0.5), None);
        assert_eq!(slider_index(&axis(&[5.0]), 0.7), Some(0));

        // exact midpoint between two indices picks the later one
        assert_eq!(slider_index(&axis(&[0.0, 1.0]), 0.5), Some(1));
    }

    #[test]
    fn test_press_on_drawn_knob_keeps_selection() {
        let layout = layout(2);
        let times = axis(&[0.0, 10.0, 20.0, 100.0]);
        let mut controller = InteractionController::new(DisplayMode::Static, Compartment::Infected, 2);

        for index in 0..times.len() {
            controller.select_index(index, times.len());
            let drawn = SliderView {
                axis_len: times.len(),
                selected_index: Some(index),
                selected_time: Some(times[index]),
            };
            controller.handle(
                InputEvent::SliderPress {
                    position: drawn.progress(),
                },
                &layout,
                &times,
            );
            controller.handle(InputEvent::SliderRelease, &layout, &times);
            assert_eq!(controller.view().selected_index, Some(index));
        }
    }

    #[test]
    fn test_wheel_and_keys_stay_clamped() {
        let layout = layout(10);
        let mut controller = dynamic();

        controller.handle(InputEvent::Wheel { steps: -3 }, &layout, &[]);
        assert_eq!(controller.view().scroll_offset, 0);

        controller.handle(InputEvent::Wheel { steps: 4 }, &layout, &[]);
        assert_eq!(controller.view().scroll_offset, 8);

        controller.handle(InputEvent::End, &layout, &[]);
        assert_eq!(controller.view().scroll_offset, layout.max_scroll());

        controller.handle(InputEvent::Wheel { steps: 50 }, &layout, &[]);
        assert_eq!(controller.view().scroll_offset, layout.max_scroll());

        controller.handle(InputEvent::Home, &layout, &[]);
        assert_eq!(controller.view().scroll_offset, 0);
        assert_eq!(controller.phase(), InteractionPhase::Idle);
    }

    #[test]
    fn test_roster_shrink_reclamps() {
        let mut layout = layout(10);
        let mut controller = dynamic();
        controller.handle(InputEvent::End, &layout, &[]);
        assert!(controller.view().scroll_offset > 0);

        layout.set_city_count(1);
        controller.reclamp(&layout);
        assert_eq!(controller.view().scroll_offset, 0);
    }

    #[test]
    fn test_dirty_flag_consumed_once() {
        let layout = layout(10);
        let mut controller = dynamic();
        assert!(controller.take_dirty());
        assert!(!controller.take_dirty());

        controller.handle(InputEvent::Wheel { steps: 1 }, &layout, &[]);
        controller.handle(InputEvent::Wheel { steps: 1 }, &layout, &[]);
        assert!(controller.take_dirty());
        assert!(!controller.take_dirty());

        // no-op scroll at the top does not dirty the display
        controller.handle(InputEvent::Home, &layout, &[]);
        controller.take_dirty();
        controller.handle(InputEvent::Wheel { steps: -1 }, &layout, &[]);
        assert!(!controller.is_dirty());
    }

    #[test]
    fn test_auto_follow_until_manual_scrub() {
        let layout = layout(2);
        let mut controller = dynamic();

        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);
        assert_eq!(controller.view().selected_index, Some(1));
        assert_eq!(controller.cursor_mode(), CursorMode::Following);

        let times = axis(&[0.0, 10.0]);
        controller.handle(InputEvent::SliderPress { position: 0.0 }, &layout, &times);
        assert_eq!(controller.cursor_mode(), CursorMode::Dragging);
        controller.handle(InputEvent::SliderRelease, &layout, &times);
        assert_eq!(controller.view().selected_index, Some(0));
        assert_eq!(controller.cursor_mode(), CursorMode::Manual);

        grow(&mut controller, 2, 3);
        assert_eq!(controller.view().selected_index, Some(0));

        controller.handle(InputEvent::JumpToLatest, &layout, &axis(&[0.0, 10.0, 20.0]));
        assert_eq!(controller.view().selected_index, Some(2));
        grow(&mut controller, 3, 4);
        assert_eq!(controller.view().selected_index, Some(3));
    }

    #[test]
    fn test_no_follow_while_dragging() {
        let layout = layout(2);
        let mut controller = dynamic();
        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);

        let times = axis(&[0.0, 10.0]);
        controller.handle(InputEvent::SliderPress { position: 1.0 }, &layout, &times);
        grow(&mut controller, 2, 3);
        assert_eq!(controller.view().selected_index, Some(1));
    }

    #[test]
    fn test_release_at_latest_catches_up_with_growth() {
        let layout = layout(2);
        let mut controller = dynamic();
        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);

        controller.handle(InputEvent::SliderPress { position: 1.0 }, &layout, &axis(&[0.0, 10.0]));
        grow(&mut controller, 2, 3);
        assert_eq!(controller.view().selected_index, Some(1));

        controller.handle(InputEvent::SliderRelease, &layout, &axis(&[0.0, 10.0, 20.0]));
        assert_eq!(controller.view().selected_index, Some(2));
        assert!(controller.view().follow_latest);
        assert_eq!(controller.cursor_mode(), CursorMode::Following);

        grow(&mut controller, 3, 4);
        assert_eq!(controller.view().selected_index, Some(3));
    }

    #[test]
    fn test_release_off_latest_stays_manual() {
        let layout = layout(2);
        let mut controller = dynamic();
        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);
        grow(&mut controller, 2, 3);

        let times = axis(&[0.0, 10.0, 20.0]);
        controller.handle(InputEvent::SliderPress { position: 0.5 }, &layout, &times);
        controller.handle(InputEvent::SliderRelease, &layout, &times);
        assert_eq!(controller.view().selected_index, Some(1));
        assert!(!controller.view().follow_latest);
        assert_eq!(controller.cursor_mode(), CursorMode::Manual);
    }

    #[test]
    fn test_manual_cursor_keeps_its_time_across_inserts() {
        let layout = layout(2);
        let mut controller = dynamic();
        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);
        grow(&mut controller, 2, 3);

        // axis [0, 10, 20]: select 10
        controller.handle(InputEvent::StepTime { delta: -1 }, &layout, &axis(&[0.0, 10.0, 20.0]));
        assert_eq!(controller.view().selected_index, Some(1));

        // 5 arrives late, before the selection
        grow(&mut controller, 1, 4);
        assert_eq!(controller.view().selected_index, Some(2));

        // eviction of t=0 shifts it back
        controller.on_axis_changed(
            &AxisDelta {
                inserted: None,
                removed: vec![0],
            },
            3,
        );
        assert_eq!(controller.view().selected_index, Some(1));
    }

    #[test]
    fn test_set_time_index_range() {
        let mut controller = dynamic();
        assert!(matches!(
            controller.set_time_index(3, 3),
            Err(VisualizerError::OutOfRange(_))
        ));
        controller.set_time_index(0, 3).unwrap();
        assert_eq!(controller.view().selected_index, Some(0));
        assert!(!controller.view().follow_latest);

        controller.set_time_index(2, 3).unwrap();
        assert!(controller.view().follow_latest);
    }

    #[test]
    fn test_static_mode_starts_at_first_time_and_never_follows() {
        let mut controller =
            InteractionController::new(DisplayMode::Static, Compartment::Infected, 2);
        grow(&mut controller, 0, 1);
        grow(&mut controller, 1, 2);
        assert_eq!(controller.view().selected_index, Some(0));
        assert_eq!(controller.cursor_mode(), CursorMode::Manual);
    }

    #[test]
    fn test_cycle_metric() {
        let layout = layout(1);
        let mut controller = dynamic();
        controller.handle(InputEvent::CycleMetric, &layout, &[]);
        assert_eq!(controller.view().heatmap_metric, Compartment::Recovered);
    }
}
