// Terminal input - crossterm events mapped onto visualizer input events
use crate::application::visualizer::SirnVisualizer;
use crate::domain::geometry::CellRect;
use crate::domain::view::InputEvent;
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    Input(InputEvent),
    Quit,
}

/// Tracks whether a mouse drag started on the slider track.
#[derive(Debug, Default)]
pub struct InputMapper {
    scrubbing: bool,
}

impl InputMapper {
    pub fn map_event(&mut self, event: &Event, slider_track: CellRect) -> Option<UiCommand> {
        match event {
            Event::Key(key) => map_key(key),
            Event::Mouse(mouse) => self.map_mouse(mouse, slider_track),
            Event::Resize(width, height) => Some(UiCommand::Input(InputEvent::Resize {
                width: *width,
                height: *height,
            })),
            _ => None,
        }
    }

    fn map_mouse(&mut self, mouse: &MouseEvent, track: CellRect) -> Option<UiCommand> {
        let input = match mouse.kind {
            MouseEventKind::ScrollUp => InputEvent::Wheel { steps: -1 },
            MouseEventKind::ScrollDown => InputEvent::Wheel { steps: 1 },
            MouseEventKind::Down(MouseButton::Left) if track.contains(mouse.column, mouse.row) => {
                self.scrubbing = true;
                InputEvent::SliderPress {
                    position: track.fraction_at(mouse.column),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.scrubbing => InputEvent::SliderDrag {
                position: track.fraction_at(mouse.column),
            },
            MouseEventKind::Up(MouseButton::Left) if self.scrubbing => {
                self.scrubbing = false;
                InputEvent::SliderRelease
            }
            _ => return None,
        };
        Some(UiCommand::Input(input))
    }
}

fn map_key(key: &KeyEvent) -> Option<UiCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let input = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(UiCommand::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(UiCommand::Quit);
        }
        KeyCode::Up => InputEvent::Wheel { steps: -1 },
        KeyCode::Down => InputEvent::Wheel { steps: 1 },
        KeyCode::PageUp => InputEvent::PageUp,
        KeyCode::PageDown => InputEvent::PageDown,
        KeyCode::Home => InputEvent::Home,
        KeyCode::End => InputEvent::End,
        KeyCode::Left => InputEvent::StepTime { delta: -1 },
        KeyCode::Right => InputEvent::StepTime { delta: 1 },
        KeyCode::Char('l') | KeyCode::Char('L') => InputEvent::JumpToLatest,
        KeyCode::Char('m') | KeyCode::Char('M') => InputEvent::CycleMetric,
        _ => return None,
    };
    Some(UiCommand::Input(input))
}

/// Forward terminal events to `visualizer` until it closes or the user quits.
pub async fn pump_input(visualizer: SirnVisualizer) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut mapper = InputMapper::default();

    loop {
        tokio::select! {
            next = events.next() => {
                let Some(event) = next else {
                    break;
                };
                match mapper.map_event(&event?, visualizer.slider_track()) {
                    Some(UiCommand::Quit) => {
                        tracing::info!("Quit requested");
                        visualizer.close();
                        break;
                    }
                    Some(UiCommand::Input(input)) => {
                        visualizer.handle_input(input);
                    }
                    None => {}
                }
            }
            _ = visualizer.wait_for_close() => break,
        }
    }
    Ok(())
}
