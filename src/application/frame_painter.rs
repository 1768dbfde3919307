// Frame painter - lays a display frame out as rectangles and text
use crate::application::drawing_surface::DrawingSurface;
use crate::application::layout::SLIDER_LABEL_WIDTH;
use crate::domain::chart::{HeatCell, ProportionChart, Rgb};
use crate::domain::frame::{DisplayFrame, PanelView};
use crate::domain::geometry::CellRect;

const ROW_LABEL_WIDTH: u16 = 10;
const NO_DATA_GLYPH: &str = "·";
const CELL_GLYPH: &str = "█";

pub fn paint_frame(frame: &DisplayFrame, surface: &mut dyn DrawingSurface) -> anyhow::Result<()> {
    surface.clear();

    let header = frame.regions.header;
    if !header.is_empty() {
        surface.draw_text(header.x, header.y, &frame.status_line(), Rgb::WHITE);
    }

    for panel in &frame.panels {
        paint_panel(frame, panel, surface);
    }
    paint_heatmap(frame, surface);
    paint_slider(frame, surface);

    let footer = frame.regions.footer;
    if !footer.is_empty() {
        match &frame.notice {
            Some(notice) => surface.draw_text(footer.x, footer.y, notice, Rgb::YELLOW),
            None => surface.draw_text(
                footer.x,
                footer.y,
                "wheel/↑↓ scroll  Home/End  ←→ time  drag slider  L latest  m metric  q quit",
                Rgb::GRAY,
            ),
        }
    }

    surface.present()
}

fn paint_panel(frame: &DisplayFrame, panel: &PanelView, surface: &mut dyn DrawingSurface) {
    let area = frame.regions.panels;
    let placement = panel.placement;
    let inner_width = placement.width.saturating_sub(2);

    // Lines of the panel in content order; None marks a line left blank.
    let mut lines: Vec<Option<(String, Rgb)>> = vec![Some((panel.title.clone(), Rgb::WHITE))];
    match &panel.chart {
        Some(chart) => {
            lines.push(None); // stacked bar row, filled below
            for slice in &chart.slices {
                lines.push(Some((
                    format!(
                        "{} {:5.1}%",
                        slice.compartment.short_label(),
                        slice.proportion * 100.0
                    ),
                    slice.compartment.color(),
                )));
            }
            if let Some(anomaly) = &chart.anomaly {
                lines.push(Some((format!("! {}", anomaly.describe()), Rgb::YELLOW)));
            }
        }
        None => lines.push(Some(("No data".to_string(), Rgb::GRAY))),
    }

    for (line_index, line) in lines.iter().enumerate().take(placement.height as usize) {
        let content_line = placement.top + line_index as u32;
        let Some(row) = screen_row(area, frame.scroll_offset, content_line) else {
            continue;
        };
        match line {
            Some((text, color)) => {
                surface.draw_text(placement.x + 1, row, &clip(text, inner_width), *color)
            }
            None => {
                if let Some(chart) = &panel.chart {
                    paint_stacked_bar(chart, placement.x + 1, row, inner_width, surface);
                }
            }
        }
    }
}

/// Screen row for a virtual content line, if it falls inside the viewport.
fn screen_row(area: CellRect, scroll_offset: u32, content_line: u32) -> Option<u16> {
    let relative = content_line.checked_sub(scroll_offset)?;
    if relative >= area.height as u32 {
        return None;
    }
    Some(area.y + relative as u16)
}

fn paint_stacked_bar(
    chart: &ProportionChart,
    x: u16,
    y: u16,
    width: u16,
    surface: &mut dyn DrawingSurface,
) {
    let mut cursor = x;
    let mut used = 0u16;
    for (i, slice) in chart.slices.iter().enumerate() {
        // last slice takes the rounding remainder
        let cells = if i + 1 == chart.slices.len() && chart.anomaly.is_none() {
            width.saturating_sub(used)
        } else {
            ((slice.proportion * width as f64).round() as u16).min(width.saturating_sub(used))
        };
        if cells > 0 {
            surface.fill_rect(CellRect::new(cursor, y, cells, 1), slice.compartment.color());
        }
        cursor += cells;
        used += cells;
    }
}

fn paint_heatmap(frame: &DisplayFrame, surface: &mut dyn DrawingSurface) {
    let area = frame.regions.heatmap;
    if area.height < 3 {
        return;
    }
    let heatmap = &frame.heatmap;
    surface.draw_text(area.x, area.y, &clip(&heatmap.title(), area.width), Rgb::WHITE);

    let columns = area.width.saturating_sub(ROW_LABEL_WIDTH) as usize;
    let (first_col, last_col) = column_window(
        heatmap.times.len(),
        frame.slider.selected_index.unwrap_or(0),
        columns,
    );
    let rows = (area.height - 2) as usize;

    for (offset, row) in (frame.heatmap_first_row..heatmap.cities.len())
        .take(rows)
        .enumerate()
    {
        let y = area.y + 1 + offset as u16;
        surface.draw_text(
            area.x,
            y,
            &clip(&heatmap.cities[row], ROW_LABEL_WIDTH - 1),
            Rgb::GRAY,
        );
        for col in first_col..last_col {
            let x = area.x + ROW_LABEL_WIDTH + (col - first_col) as u16;
            match heatmap.cell(row, col) {
                Some(HeatCell::Value(value)) => {
                    surface.draw_text(x, y, CELL_GLYPH, heatmap.metric.shade(value))
                }
                _ => surface.draw_text(x, y, NO_DATA_GLYPH, Rgb::DARK_GRAY),
            }
        }
    }

    // selected time marker under the matrix
    if let Some(selected) = frame.slider.selected_index {
        if selected >= first_col && selected < last_col {
            let x = area.x + ROW_LABEL_WIDTH + (selected - first_col) as u16;
            surface.draw_text(x, area.y + area.height - 1, "^", Rgb::WHITE);
        }
    }
}

/// Window of `width` columns out of `len`, kept around `selected`.
fn column_window(len: usize, selected: usize, width: usize) -> (usize, usize) {
    if len <= width {
        return (0, len);
    }
    let start = selected.saturating_sub(width / 2).min(len - width);
    (start, start + width)
}

fn paint_slider(frame: &DisplayFrame, surface: &mut dyn DrawingSurface) {
    let area = frame.regions.slider;
    if area.is_empty() {
        return;
    }
    let label = match frame.slider.selected_time {
        Some(time) => format!("Time Step {time}"),
        None => "Time Step -".to_string(),
    };
    let label_width = SLIDER_LABEL_WIDTH.min(area.width);
    surface.draw_text(area.x, area.y, &clip(&label, label_width), Rgb::WHITE);

    let track = CellRect::new(
        area.x + label_width,
        area.y,
        area.width - label_width,
        1,
    );
    if track.is_empty() {
        return;
    }
    surface.fill_rect(track, Rgb::DARK_GRAY);
    let filled = (frame.slider.progress() * track.width as f64).round() as u16;
    if filled > 0 {
        surface.fill_rect(
            CellRect::new(track.x, track.y, filled.min(track.width), 1),
            Rgb(115, 160, 240),
        );
    }
}

fn clip(text: &str, width: u16) -> String {
    text.chars().take(width as usize).collect()
}
