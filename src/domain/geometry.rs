// Screen geometry in terminal cells

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u16,
    pub height: u16,
}

impl Extent {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x && column < self.right() && row >= self.y && row < self.bottom()
    }

    /// Horizontal position of `column` across the rect, 0.0 at the left cell, 1.0 at the right.
    pub fn fraction_at(&self, column: u16) -> f64 {
        if self.width <= 1 {
            return 0.0;
        }
        let offset = column.saturating_sub(self.x).min(self.width - 1);
        offset as f64 / (self.width - 1) as f64
    }
}

/// A panel's place in the virtual (scrollable) content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelPlacement {
    pub index: usize,
    pub x: u16,
    pub width: u16,
    /// Top line in virtual content coordinates.
    pub top: u32,
    pub height: u16,
}

impl PanelPlacement {
    pub fn bottom(&self) -> u32 {
        self.top + self.height as u32
    }
}

/// Fixed split of the screen into display sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRegions {
    pub header: CellRect,
    pub panels: CellRect,
    pub heatmap: CellRect,
    pub slider: CellRect,
    pub footer: CellRect,
}
