//! Minimal tick and render loop for terminal screens.

pub use self::{app::App, runtime::Runtime};

mod app;
mod event_loop;
mod runtime;
