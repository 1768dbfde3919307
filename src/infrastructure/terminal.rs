// Terminal drawing surface - ratatui buffer presented through crossterm
use crate::application::drawing_surface::DrawingSurface;
use crate::domain::chart::Rgb;
use crate::domain::geometry::{CellRect, Extent};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use std::io::{self, Stdout};

pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Back buffer; copied into ratatui's frame on `present`.
    buffer: Buffer,
    restored: bool,
}

impl TerminalSurface {
    /// Switch to raw mode on the alternate screen with mouse capture. A panic hook puts the
    /// terminal back before the panic message is printed.
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(info);
        }));

        let size = terminal.size()?;
        tracing::info!("Terminal surface ready at {}x{}", size.width, size.height);
        Ok(Self {
            terminal,
            buffer: Buffer::empty(Rect::new(0, 0, size.width, size.height)),
            restored: false,
        })
    }

    pub fn restore(&mut self) -> anyhow::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!("Failed to restore terminal: {}", err);
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

impl DrawingSurface for TerminalSurface {
    fn extent(&self) -> Extent {
        match self.terminal.size() {
            Ok(size) => Extent::new(size.width, size.height),
            Err(_) => Extent::new(self.buffer.area.width, self.buffer.area.height),
        }
    }

    fn clear(&mut self) {
        let extent = self.extent();
        self.buffer = Buffer::empty(Rect::new(0, 0, extent.width, extent.height));
    }

    fn fill_rect(&mut self, rect: CellRect, rgb: Rgb) {
        let area = self.buffer.area;
        let right = rect.right().min(area.width);
        let bottom = rect.bottom().min(area.height);
        for y in rect.y..bottom {
            for x in rect.x..right {
                if let Some(cell) = self.buffer.cell_mut((x, y)) {
                    cell.set_symbol(" ").set_bg(color(rgb));
                }
            }
        }
    }

    fn draw_text(&mut self, x: u16, y: u16, text: &str, rgb: Rgb) {
        let area = self.buffer.area;
        if x >= area.width || y >= area.height {
            return;
        }
        self.buffer
            .set_string(x, y, text, Style::default().fg(color(rgb)));
    }

    fn present(&mut self) -> anyhow::Result<()> {
        let buffer = &self.buffer;
        self.terminal.draw(|frame| {
            let area = frame.area().intersection(buffer.area);
            let target = frame.buffer_mut();
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    if let (Some(source), Some(cell)) = (buffer.cell((x, y)), target.cell_mut((x, y)))
                    {
                        *cell = source.clone();
                    }
                }
            }
        })?;
        Ok(())
    }
}
