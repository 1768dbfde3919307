// Drawing surface trait - the opaque screen the painter draws onto
use crate::domain::chart::Rgb;
use crate::domain::geometry::{CellRect, Extent};

pub trait DrawingSurface: Send {
    /// Current size in cells.
    fn extent(&self) -> Extent;

    fn clear(&mut self);

    fn fill_rect(&mut self, rect: CellRect, color: Rgb);

    /// Draw `text` starting at (x, y); text past the right edge is cut off.
    fn draw_text(&mut self, x: u16, y: u16, text: &str, color: Rgb);

    /// Push everything drawn since the last `clear` to the screen.
    fn present(&mut self) -> anyhow::Result<()>;
}
