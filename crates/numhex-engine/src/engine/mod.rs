//! Game rules and session state.
//!
//! - [`LevelGenerator`] - Seeded generation of grids and target sets
//! - [`LevelBuffer`] - Look-ahead queue of generated levels
//! - [`SelectedPath`] and [`evaluate`] - Path building and arithmetic
//! - [`ScoringEngine`] - Streak, score and IQ updates
//! - [`SessionController`] - Single-player state machine
//!
//! # Session Flow
//!
//! 1. [`SessionController::request_start`] shows the tutorial once, then starts
//! 2. The player drags a path with `start_path`, `extend_path` and `finish_path`
//! 3. The host calls [`SessionController::tick`] at the configured rate
//! 4. Completing every target locks input briefly, then the level completes
//! 5. Running out of time ends the session
//!
//! # Example
//!
//! ```
//! use numhex_engine::{GameConfig, GridSeed, NoopFeedback, SessionController};
//!
//! let seed: GridSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
//! let mut session =
//!     SessionController::with_seed(GameConfig::default(), seed, Box::new(NoopFeedback)).unwrap();
//! session.start().unwrap();
//! assert!(session.state().status().is_playing());
//! assert_eq!(session.state().level_targets().len(), 5);
//! ```

pub use self::{
    badges::*, feedback::*, game_state::*, insight::*, level_buffer::*, level_generator::*,
    path::*, scoring::*, session::*, tutorial::*,
};

mod badges;
mod feedback;
mod game_state;
mod insight;
mod level_buffer;
mod level_generator;
mod path;
mod scoring;
mod session;
mod tutorial;
