// Frame composer - builds the display frame for one redraw
use crate::application::chart_renderer::ChartRenderer;
use crate::application::data_store::StoreSnapshot;
use crate::application::layout::LayoutManager;
use crate::domain::city::City;
use crate::domain::frame::{CursorMode, DisplayFrame, PanelView, SliderView};
use crate::domain::view::ViewState;

pub struct FrameInputs<'a> {
    pub snapshot: &'a StoreSnapshot,
    pub view: &'a ViewState,
    pub cursor: CursorMode,
    pub layout: &'a LayoutManager,
    pub renderer: &'a ChartRenderer,
    pub notice: Option<&'a str>,
}

pub fn compose_frame(inputs: FrameInputs<'_>) -> DisplayFrame {
    let FrameInputs {
        snapshot,
        view,
        cursor,
        layout,
        renderer,
        notice,
    } = inputs;

    // the view may briefly lag a shrinking axis
    let selected_index = view
        .selected_index
        .filter(|_| !snapshot.axis.is_empty())
        .map(|index| index.min(snapshot.axis.len() - 1));
    let selected_time = selected_index.map(|index| snapshot.axis[index]);

    let visible = layout.visible_panels(view.scroll_offset);
    let heatmap_first_row = visible.start;
    let panels = visible
        .filter_map(|index| {
            let city = snapshot.roster.get(index)?;
            let chart = selected_time
                .and_then(|time| snapshot.point(city, time))
                .map(|point| renderer.render_proportion(point));
            let title = match selected_time {
                Some(time) if chart.is_some() => {
                    format!("{} at Time {}", City::new(city.as_str()).name, time)
                }
                _ => City::new(city.as_str()).name,
            };
            Some(PanelView {
                city: city.clone(),
                title,
                placement: layout.placement(index),
                chart,
            })
        })
        .collect();

    let heatmap = renderer.render_heatmap(
        &snapshot.roster,
        &snapshot.axis,
        &snapshot.timelines,
        view.heatmap_metric,
    );

    DisplayFrame {
        title: "SIRN Model".to_string(),
        mode: view.mode,
        cursor,
        regions: layout.regions(),
        scroll_offset: view.scroll_offset,
        max_scroll: layout.max_scroll(),
        panels,
        heatmap,
        heatmap_first_row,
        slider: SliderView {
            selected_index,
            selected_time,
            axis_len: snapshot.axis.len(),
        },
        notice: notice.map(str::to_string),
    }
}
