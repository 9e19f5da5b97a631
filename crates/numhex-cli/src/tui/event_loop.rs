use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event};

#[derive(Debug, Clone, derive_more::From, derive_more::IsVariant)]
pub(super) enum TuiEvent {
    Tick,
    Render,
    Input(Event),
}

/// Produces ticks at a fixed rate, renders when something changed, and
/// waits for terminal input in between.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Duration,
    frame_interval: Duration,
    next_tick: Instant,
    last_render: Option<Instant>,
    dirty: bool,
}

impl EventLoop {
    /// Ticks lagging further behind than this are dropped.
    const MAX_LAG: Duration = Duration::from_millis(250);

    pub(super) fn new(tick_rate: u32, frame_rate: u32) -> Self {
        Self {
            tick_interval: interval(tick_rate),
            frame_interval: interval(frame_rate),
            next_tick: Instant::now(),
            last_render: None,
            dirty: true,
        }
    }

    pub(super) fn set_tick_rate(&mut self, rate: u32) {
        self.tick_interval = interval(rate);
        self.next_tick = Instant::now() + self.tick_interval;
    }

    pub(super) fn next(&mut self) -> io::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if now >= self.next_tick {
                self.next_tick += self.tick_interval;
                if now.duration_since(self.next_tick) > Self::MAX_LAG {
                    self.next_tick = now + self.tick_interval;
                }
                self.dirty = true;
                return Ok(TuiEvent::Tick);
            }

            let render_at = self
                .dirty
                .then(|| self.last_render.map_or(now, |at| at + self.frame_interval));
            if render_at.is_some_and(|at| at <= now) {
                self.dirty = false;
                self.last_render = Some(now);
                return Ok(TuiEvent::Render);
            }

            let deadline = render_at.map_or(self.next_tick, |at| at.min(self.next_tick));
            if event::poll(deadline.saturating_duration_since(now))? {
                self.dirty = true;
                return Ok(event::read()?.into());
            }
        }
    }
}

fn interval(rate: u32) -> Duration {
    Duration::from_secs(1) / rate.max(1)
}
