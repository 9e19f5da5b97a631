use crossterm::event::Event;
use ratatui::Frame;

use super::Runtime;

/// Application driven by [`Runtime::run`].
pub trait App {
    /// Called once before the first event.
    fn init(&mut self, runtime: &mut Runtime);

    fn should_exit(&self) -> bool;

    /// Handles key, mouse and resize events.
    fn handle_event(&mut self, runtime: &mut Runtime, event: &Event);

    /// Advances the application by one tick.
    fn update(&mut self, runtime: &mut Runtime);

    fn draw(&self, frame: &mut Frame);
}
