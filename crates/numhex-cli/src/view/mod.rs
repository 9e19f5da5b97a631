//! Widgets shared by the terminal screens.

pub use self::{grid_display::*, hud::*};

mod grid_display;
mod hud;
