// Layout manager - panel geometry, virtual height and the scroll clamp
use crate::domain::geometry::{CellRect, Extent, PanelPlacement, ScreenRegions};
use crate::infrastructure::config::LayoutSettings;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct LayoutManager {
    settings: LayoutSettings,
    city_count: usize,
    rows: usize,
    virtual_height: u32,
    screen: Extent,
    regions: ScreenRegions,
}

impl LayoutManager {
    pub fn new(settings: LayoutSettings) -> Self {
        let settings = LayoutSettings {
            columns: settings.columns.max(1),
            panel_height: settings.panel_height.max(1),
            ..settings
        };
        Self {
            settings,
            city_count: 0,
            rows: 0,
            virtual_height: 0,
            screen: Extent::default(),
            regions: ScreenRegions::default(),
        }
    }

    /// Recompute row geometry; a no-op unless the count actually changed.
    pub fn set_city_count(&mut self, count: usize) -> bool {
        if count == self.city_count {
            return false;
        }
        self.city_count = count;
        self.rows = count.div_ceil(self.settings.columns as usize);
        self.virtual_height = self.rows as u32 * self.settings.panel_height as u32;
        // heat map height depends on the city count too
        self.regions = self.split_screen(self.screen);
        tracing::debug!(
            "Layout recomputed for {} cities: {} rows, virtual height {}",
            count,
            self.rows,
            self.virtual_height
        );
        true
    }

    pub fn set_screen(&mut self, screen: Extent) -> bool {
        if screen == self.screen {
            return false;
        }
        self.screen = screen;
        self.regions = self.split_screen(screen);
        true
    }

    pub fn city_count(&self) -> usize {
        self.city_count
    }

    pub fn regions(&self) -> ScreenRegions {
        self.regions
    }

    pub fn virtual_height(&self) -> u32 {
        self.virtual_height
    }

    pub fn viewport_height(&self) -> u32 {
        self.regions.panels.height as u32
    }

    pub fn max_scroll(&self) -> u32 {
        self.virtual_height.saturating_sub(self.viewport_height())
    }

    /// Clamp into `[0, max(0, virtual_height - viewport_height)]`.
    pub fn clamp_scroll(&self, offset: i64) -> u32 {
        offset.clamp(0, self.max_scroll() as i64) as u32
    }

    /// Panels whose vertical span intersects `[offset, offset + viewport_height)`.
    pub fn visible_panels(&self, offset: u32) -> Range<usize> {
        let viewport = self.viewport_height();
        if self.city_count == 0 || viewport == 0 {
            return 0..0;
        }
        let panel_height = self.settings.panel_height as u32;
        let columns = self.settings.columns as usize;
        let first_row = (offset / panel_height) as usize;
        let last_row = ((offset + viewport - 1) / panel_height) as usize;

        let start = (first_row * columns).min(self.city_count);
        let end = ((last_row + 1) * columns).min(self.city_count);
        start..end
    }

    pub fn placement(&self, index: usize) -> PanelPlacement {
        let columns = self.settings.columns;
        let panel_width = self.regions.panels.width / columns;
        let column = (index % columns as usize) as u16;
        let row = (index / columns as usize) as u32;
        PanelPlacement {
            index,
            x: self.regions.panels.x + column * panel_width,
            width: panel_width,
            top: row * self.settings.panel_height as u32,
            height: self.settings.panel_height,
        }
    }

    /// Map a click column on the slider track to a 0..1 position.
    pub fn slider_position(&self, column: u16) -> f64 {
        self.slider_track().fraction_at(column)
    }

    pub fn slider_track(&self) -> CellRect {
        let slider = self.regions.slider;
        let label = SLIDER_LABEL_WIDTH.min(slider.width);
        CellRect::new(slider.x + label, slider.y, slider.width - label, slider.height)
    }

    fn split_screen(&self, screen: Extent) -> ScreenRegions {
        let width = screen.width;
        let mut remaining = screen.height;

        let header_height = remaining.min(1);
        remaining -= header_height;
        let footer_height = remaining.min(1);
        remaining -= footer_height;
        let slider_height = remaining.min(1);
        remaining -= slider_height;

        let wanted_heatmap = (self.city_count as u16).min(self.settings.heatmap_max_rows) + 2;
        let heatmap_height = if self.city_count == 0 {
            0
        } else {
            wanted_heatmap.min(remaining / 2)
        };
        let panels_height = remaining - heatmap_height;

        let header = CellRect::new(0, 0, width, header_height);
        let panels = CellRect::new(0, header.bottom(), width, panels_height);
        let heatmap = CellRect::new(0, panels.bottom(), width, heatmap_height);
        let slider = CellRect::new(0, heatmap.bottom(), width, slider_height);
        let footer = CellRect::new(0, slider.bottom(), width, footer_height);

        ScreenRegions {
            header,
            panels,
            heatmap,
            slider,
            footer,
        }
    }
}

/// Columns reserved left of the slider track for the time label.
pub const SLIDER_LABEL_WIDTH: u16 = 16;
