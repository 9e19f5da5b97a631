pub use self::{cell::*, grid::*, target::*};

pub(crate) mod cell;
pub(crate) mod grid;
pub(crate) mod target;
