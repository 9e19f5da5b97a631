use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use ratatui::DefaultTerminal;

use super::{
    App,
    event_loop::{EventLoop, TuiEvent},
};

const FRAME_RATE: u32 = 30;

/// Terminal runtime: owns the terminal while an [`App`] runs.
#[derive(Debug)]
pub struct Runtime {
    events: EventLoop,
}

impl Runtime {
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            events: EventLoop::new(tick_rate, FRAME_RATE),
        }
    }

    /// Sets how many times per second [`App::update`] is called.
    pub fn set_tick_rate(&mut self, rate: u32) {
        self.events.set_tick_rate(rate);
    }

    /// Runs `app` with mouse capture until it asks to exit.
    pub fn run<A>(mut self, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            execute!(io::stdout(), EnableMouseCapture)?;
            let result = self.drive(terminal, app);
            execute!(io::stdout(), DisableMouseCapture)?;
            result
        })
    }

    fn drive<A>(&mut self, terminal: &mut DefaultTerminal, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        while !app.should_exit() {
            match self.events.next()? {
                TuiEvent::Tick => app.update(self),
                TuiEvent::Render => {
                    terminal.draw(|frame| app.draw(frame))?;
                }
                TuiEvent::Input(event) => app.handle_event(self, &event),
            }
        }
        Ok(())
    }
}
