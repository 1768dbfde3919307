// Visualizer facade - the shared handle producers, input and the render loop talk to
use crate::application::chart_renderer::ChartRenderer;
use crate::application::data_store::{DataStore, InsertOutcome, StoreSnapshot};
use crate::application::drawing_surface::DrawingSurface;
use crate::application::frame_composer::{FrameInputs, compose_frame};
use crate::application::frame_painter::paint_frame;
use crate::application::interaction::InteractionController;
use crate::application::layout::LayoutManager;
use crate::domain::chart::ProportionChart;
use crate::domain::dataset::SirnDataset;
use crate::domain::error::{Result, VisualizerError};
use crate::domain::geometry::{CellRect, Extent};
use crate::domain::sirn::{SirnPoint, TimeStep};
use crate::domain::view::{DisplayMode, InputEvent, ViewState};
use crate::infrastructure::config::VisualizerConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const MAX_NOTICES: usize = 5;

/// Cheaply cloneable handle; every clone drives the same display.
#[derive(Clone)]
pub struct SirnVisualizer {
    inner: Arc<Inner>,
}

struct Inner {
    // lock order: store, then view
    store: RwLock<DataStore>,
    view: Mutex<ViewCell>,
    renderer: ChartRenderer,
    max_sum_deviation: f64,
    frame_interval: Duration,
    notice_ttl: Duration,
    closed: watch::Sender<bool>,
}

struct ViewCell {
    layout: LayoutManager,
    controller: InteractionController,
    notices: VecDeque<(Instant, String)>,
}

impl ViewCell {
    fn apply(&mut self, store: &DataStore, outcome: &InsertOutcome) {
        if outcome.new_city && self.layout.set_city_count(store.roster().len()) {
            self.controller.reclamp(&self.layout);
        }
        self.controller.on_axis_changed(&outcome.axis, store.axis().len());
        if outcome.is_visible_change() {
            self.controller.mark_dirty();
        }
    }

    fn sync_roster(&mut self, store: &DataStore) {
        self.layout.set_city_count(store.roster().len());
        self.controller.reclamp(&self.layout);
        self.controller.mark_dirty();
    }

    fn push_notice(&mut self, notice: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back((Instant::now(), notice));
        self.controller.mark_dirty();
    }

    /// Drop notices older than `ttl`; the footer falls back to the help line once all are gone.
    fn expire_notices(&mut self, ttl: Duration) {
        let before = self.notices.len();
        self.notices.retain(|(posted, _)| posted.elapsed() < ttl);
        if self.notices.len() != before {
            self.controller.mark_dirty();
        }
    }
}

impl SirnVisualizer {
    pub fn new(config: &VisualizerConfig, mode: DisplayMode) -> Self {
        let (closed, _) = watch::channel(false);
        let inner = Inner {
            store: RwLock::new(DataStore::new(config.data.max_history)),
            view: Mutex::new(ViewCell {
                layout: LayoutManager::new(config.layout.clone()),
                controller: InteractionController::new(
                    mode,
                    config.render.heatmap_metric,
                    config.layout.scroll_step,
                ),
                notices: VecDeque::new(),
            }),
            renderer: ChartRenderer::new(config.render.sum_tolerance),
            max_sum_deviation: config.data.max_sum_deviation,
            frame_interval: config.render.frame_interval(),
            notice_ttl: config.render.notice_ttl(),
            closed,
        };
        tracing::info!("Visualizer created in {:?} mode", mode);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Fix the city display order. See [`DataStore::initialize`] for the rules once data exists.
    pub fn initialize(&self, cities: &[String]) -> Result<()> {
        let mut store = self.write_store();
        store.initialize(cities)?;
        self.lock_view().sync_roster(&store);
        tracing::info!("Roster initialized with {} cities", cities.len());
        Ok(())
    }

    /// Validate and insert one `[S, I, R, N]` observation.
    ///
    /// A rejected point leaves the store untouched and shows up as a footer notice.
    pub fn add_data_point(&self, city: &str, time: f64, values: &[f64]) -> Result<()> {
        let parsed = if city.is_empty() {
            Err(VisualizerError::malformed("city id must not be empty"))
        } else {
            TimeStep::new(time).and_then(|time| {
                SirnPoint::from_values(values, self.inner.max_sum_deviation)
                    .map(|point| (time, point))
            })
        };

        let (time, point) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("Rejected data point for city {} at {}: {}", city, time, err);
                self.lock_view()
                    .push_notice(format!("Rejected {city} at t={time}: {err}"));
                return Err(err);
            }
        };

        let mut store = self.write_store();
        let outcome = store.add_data_point(city, time, point);
        self.lock_view().apply(&store, &outcome);
        Ok(())
    }

    /// Bulk insert of an already validated dataset under a single write lock.
    pub fn load_dataset(&self, dataset: &SirnDataset) -> Result<()> {
        let mut store = self.write_store();
        if !dataset.roster.is_empty() {
            store.initialize(&dataset.roster)?;
        }
        let mut view = self.lock_view();
        view.sync_roster(&store);
        for entry in &dataset.entries {
            let outcome = store.add_data_point(&entry.city, entry.time, entry.point);
            view.apply(&store, &outcome);
        }
        view.controller.reset_selection(store.axis().len());
        tracing::info!(
            "Loaded {} points for {} cities over {} times",
            dataset.len(),
            store.roster().len(),
            store.axis().len()
        );
        Ok(())
    }

    pub fn set_mode(&self, mode: DisplayMode) {
        let store = self.read_store();
        self.lock_view()
            .controller
            .set_mode(mode, store.axis().len());
        tracing::info!("Display mode set to {:?}", mode);
    }

    /// Returns whether the view changed.
    pub fn handle_input(&self, event: InputEvent) -> bool {
        let store = self.read_store();
        let mut view = self.lock_view();
        let cell = &mut *view;
        if let InputEvent::Resize { width, height } = event {
            cell.layout.set_screen(Extent::new(width, height));
        }
        cell.controller.handle(event, &cell.layout, store.axis())
    }

    pub fn set_time_index(&self, index: usize) -> Result<()> {
        let store = self.read_store();
        self.lock_view()
            .controller
            .set_time_index(index, store.axis().len())
    }

    /// Screen cells of the slider track under the current layout.
    pub fn slider_track(&self) -> CellRect {
        self.lock_view().layout.slider_track()
    }

    pub fn view_state(&self) -> ViewState {
        self.lock_view().controller.view().clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.read_store().snapshot()
    }

    /// Proportion chart for `city` at an axis index; `None` when the city has no point there.
    pub fn proportion_for(&self, city: &str, time_index: usize) -> Result<Option<ProportionChart>> {
        let store = self.read_store();
        let Some(time) = store.axis().get(time_index).copied() else {
            return Err(VisualizerError::out_of_range(format!(
                "time index {time_index} outside [0, {})",
                store.axis().len()
            )));
        };
        if !store.roster().iter().any(|known| known == city) {
            return Err(VisualizerError::out_of_range(format!("unknown city '{city}'")));
        }
        Ok(store
            .point(city, time)
            .map(|point| self.inner.renderer.render_proportion(point)))
    }

    /// Draw one frame if anything changed since the last one. Returns whether it drew.
    pub fn redraw_if_dirty(&self, surface: &mut dyn DrawingSurface) -> anyhow::Result<bool> {
        let extent = surface.extent();
        let (snapshot, view, cursor, layout, notice) = {
            let store = self.read_store();
            let mut guard = self.lock_view();
            let cell = &mut *guard;
            if cell.layout.set_screen(extent) {
                cell.controller.reclamp(&cell.layout);
                cell.controller.mark_dirty();
            }
            cell.expire_notices(self.inner.notice_ttl);
            if !cell.controller.take_dirty() {
                return Ok(false);
            }
            (
                store.snapshot(),
                cell.controller.view().clone(),
                cell.controller.cursor_mode(),
                cell.layout.clone(),
                cell.notices.back().map(|(_, text)| text.clone()),
            )
        };

        let frame = compose_frame(FrameInputs {
            snapshot: &snapshot,
            view: &view,
            cursor,
            layout: &layout,
            renderer: &self.inner.renderer,
            notice: notice.as_deref(),
        });
        paint_frame(&frame, surface)?;
        tracing::debug!(
            "Redrew frame at revision {} ({} panels)",
            snapshot.revision,
            frame.panels.len()
        );
        Ok(true)
    }

    /// Frame loop; redraws at most once per tick and returns once closed.
    pub async fn run(&self, surface: &mut dyn DrawingSurface) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.inner.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut closed = self.inner.closed.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.redraw_if_dirty(surface)?;
                }
                _ = closed.wait_for(|closed| *closed) => break,
            }
        }
        tracing::info!("Render loop stopped");
        Ok(())
    }

    pub fn close(&self) {
        if !self.inner.closed.send_replace(true) {
            tracing::info!("Visualizer closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub async fn wait_for_close(&self) {
        let mut closed = self.inner.closed.subscribe();
        // the sender lives in `inner`, so this only ends by seeing `true`
        let _ = closed.wait_for(|closed| *closed).await;
    }

    fn read_store(&self) -> RwLockReadGuard<'_, DataStore> {
        self.inner.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, DataStore> {
        self.inner.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewCell> {
        self.inner.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::drawing_surface::testing::RecordingSurface;
    use crate::domain::dataset::DatasetEntry;

    fn visualizer(mode: DisplayMode) -> SirnVisualizer {
        SirnVisualizer::new(&VisualizerConfig::default(), mode)
    }

    fn cities(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn selected_time(vis: &SirnVisualizer) -> Option<f64> {
        let index = vis.view_state().selected_index?;
        vis.snapshot().axis.get(index).map(|t| t.value())
    }

    #[test]
    fn test_two_city_scenario() {
        let vis = visualizer(DisplayMode::Static);
        vis.add_data_point("A", 0.0, &[100.0, 1.0, 0.0, 101.0]).unwrap();
        vis.add_data_point("B", 0.0, &[200.0, 1.0, 0.0, 201.0]).unwrap();
        vis.add_data_point("A", 10.0, &[90.0, 10.0, 1.0, 101.0]).unwrap();

        let axis: Vec<f64> = vis.snapshot().axis.iter().map(|t| t.value()).collect();
        assert_eq!(axis, vec![0.0, 10.0]);
        assert_eq!(vis.proportion_for("B", 1).unwrap(), None);

        let chart = vis.proportion_for("A", 1).unwrap().unwrap();
        let [s, i, r] = chart.proportions();
        assert!((s - 0.891).abs() < 1e-3);
        assert!((i - 0.099).abs() < 1e-3);
        assert!((r - 0.010).abs() < 1e-3);

        assert!(matches!(
            vis.proportion_for("C", 0),
            Err(VisualizerError::OutOfRange(_))
        ));
        assert!(matches!(
            vis.proportion_for("A", 2),
            Err(VisualizerError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_auto_follow_scenario() {
        let vis = visualizer(DisplayMode::Dynamic);
        for time in [0.0, 10.0, 20.0] {
            vis.add_data_point("0", time, &[99.0, 1.0, 0.0, 100.0]).unwrap();
        }
        assert_eq!(selected_time(&vis), Some(20.0));

        vis.set_time_index(0).unwrap();
        assert!(!vis.view_state().follow_latest);

        vis.add_data_point("0", 30.0, &[90.0, 8.0, 2.0, 100.0]).unwrap();
        assert_eq!(selected_time(&vis), Some(0.0));

        vis.handle_input(InputEvent::JumpToLatest);
        assert!(vis.view_state().follow_latest);
        vis.add_data_point("0", 40.0, &[80.0, 15.0, 5.0, 100.0]).unwrap();
        assert_eq!(selected_time(&vis), Some(40.0));
    }

    #[test]
    fn test_manual_selection_survives_out_of_order_insert() {
        let vis = visualizer(DisplayMode::Dynamic);
        vis.add_data_point("0", 10.0, &[99.0, 1.0, 0.0, 100.0]).unwrap();
        vis.add_data_point("0", 20.0, &[98.0, 2.0, 0.0, 100.0]).unwrap();
        vis.set_time_index(0).unwrap();

        vis.add_data_point("0", 5.0, &[100.0, 0.0, 0.0, 100.0]).unwrap();
        assert_eq!(selected_time(&vis), Some(10.0));
    }

    #[test]
    fn test_roster_reinitialization_scenario() {
        let vis = visualizer(DisplayMode::Dynamic);
        vis.initialize(&cities(&["0", "1"])).unwrap();
        vis.add_data_point("0", 0.0, &[99.0, 1.0, 0.0, 100.0]).unwrap();
        vis.add_data_point("1", 0.0, &[199.0, 1.0, 0.0, 200.0]).unwrap();

        vis.initialize(&cities(&["0", "1", "2"])).unwrap();
        assert_eq!(vis.snapshot().roster, cities(&["0", "1", "2"]));

        assert!(matches!(
            vis.initialize(&cities(&["1", "0"])),
            Err(VisualizerError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejected_point_is_reported_and_shown() {
        let vis = visualizer(DisplayMode::Dynamic);
        let mut surface = RecordingSurface::new(100, 30);

        assert!(matches!(
            vis.add_data_point("A", 0.0, &[1.0, 2.0]),
            Err(VisualizerError::MalformedData(_))
        ));
        assert!(matches!(
            vis.add_data_point("A", f64::NAN, &[1.0, 0.0, 0.0, 1.0]),
            Err(VisualizerError::MalformedData(_))
        ));
        assert!(vis.snapshot().roster.is_empty());

        assert!(vis.redraw_if_dirty(&mut surface).unwrap());
        assert!(surface.contains_text("Rejected A"));
    }

    #[test]
    fn test_rejection_notice_expires() {
        let mut config = VisualizerConfig::default();
        config.render.notice_ttl_ms = 200;
        let vis = SirnVisualizer::new(&config, DisplayMode::Dynamic);
        let mut surface = RecordingSurface::new(100, 30);

        vis.add_data_point("A", 0.0, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(vis.add_data_point("A", 1.0, &[1.0, 2.0]).is_err());
        assert!(vis.redraw_if_dirty(&mut surface).unwrap());
        assert!(surface.contains_text("Rejected A"));
        assert!(!vis.redraw_if_dirty(&mut surface).unwrap());

        std::thread::sleep(Duration::from_millis(300));

        // expiry alone is enough to redraw
        assert!(vis.redraw_if_dirty(&mut surface).unwrap());
        assert!(!surface.contains_text("Rejected"));
        assert!(surface.contains_text("q quit"));
        assert!(!vis.redraw_if_dirty(&mut surface).unwrap());
    }

    #[test]
    fn test_burst_collapses_into_one_redraw() {
        let vis = visualizer(DisplayMode::Dynamic);
        let mut surface = RecordingSurface::new(100, 30);
        for step in 0..50 {
            let infected = step as f64;
            vis.add_data_point("A", step as f64, &[100.0 - infected, infected, 0.0, 100.0])
                .unwrap();
        }

        assert!(vis.redraw_if_dirty(&mut surface).unwrap());
        assert!(!vis.redraw_if_dirty(&mut surface).unwrap());
        assert_eq!(surface.presents, 1);

        // identical re-add changes nothing
        vis.add_data_point("A", 0.0, &[100.0, 0.0, 0.0, 100.0]).unwrap();
        assert!(!vis.redraw_if_dirty(&mut surface).unwrap());
    }

    #[test]
    fn test_resize_marks_dirty() {
        let vis = visualizer(DisplayMode::Static);
        let mut surface = RecordingSurface::new(100, 30);
        assert!(vis.redraw_if_dirty(&mut surface).unwrap());

        surface.extent = Extent::new(80, 24);
        assert!(vis.redraw_if_dirty(&mut surface).unwrap());
    }

    #[test]
    fn test_static_dataset_starts_at_first_time() {
        let vis = visualizer(DisplayMode::Static);
        let point = SirnPoint::from_values(&[9.0, 1.0, 0.0, 10.0], 0.05).unwrap();
        let dataset = SirnDataset {
            roster: cities(&["0", "1"]),
            entries: [(1, 5.0), (0, 0.0), (0, 5.0)]
                .into_iter()
                .map(|(city, time)| DatasetEntry {
                    city: city.to_string(),
                    time: TimeStep::new(time).unwrap(),
                    point,
                })
                .collect(),
        };

        vis.load_dataset(&dataset).unwrap();
        let view = vis.view_state();
        assert_eq!(view.selected_index, Some(0));
        assert!(!view.follow_latest);
        assert_eq!(vis.snapshot().axis.len(), 2);
    }

    #[test]
    fn test_set_mode_dynamic_follows_latest() {
        let vis = visualizer(DisplayMode::Static);
        vis.add_data_point("0", 0.0, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        vis.add_data_point("0", 1.0, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(vis.view_state().selected_index, Some(0));

        vis.set_mode(DisplayMode::Dynamic);
        assert_eq!(vis.view_state().selected_index, Some(1));
        assert!(vis.view_state().follow_latest);
    }

    #[tokio::test]
    async fn test_wait_for_close_resolves_after_close() {
        let vis = visualizer(DisplayMode::Dynamic);
        let waiter = {
            let vis = vis.clone();
            tokio::spawn(async move { vis.wait_for_close().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        vis.close();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(vis.is_closed());
    }

    #[tokio::test]
    async fn test_run_draws_until_closed() {
        let vis = visualizer(DisplayMode::Dynamic);
        vis.add_data_point("A", 0.0, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let mut surface = RecordingSurface::new(100, 30);

        let closer = vis.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            closer.close();
        });

        tokio::time::timeout(Duration::from_secs(2), vis.run(&mut surface))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(surface.presents, 1);
    }
}
