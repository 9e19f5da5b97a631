use std::collections::VecDeque;

use crate::{Grid, Level, LevelGenerator};

/// Look-ahead queue of generated levels.
///
/// The buffer starts empty, so the first level of a session is generated on
/// demand. Every pop tops the queue back up to its capacity, which keeps the
/// next level ready before the current one ends.
///
/// # Example
///
/// ```
/// use numhex_engine::{GameConfig, GridSeed, LevelBuffer, LevelGenerator};
///
/// let generator = LevelGenerator::with_seed(&GameConfig::default(), GridSeed::from_u128(1));
/// let mut buffer = LevelBuffer::new(generator, 2);
/// assert_eq!(buffer.upcoming().count(), 0);
///
/// let _first = buffer.pop_next();
/// assert_eq!(buffer.upcoming().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LevelBuffer {
    generator: LevelGenerator,
    queue: VecDeque<Level>,
    capacity: usize,
}

impl LevelBuffer {
    #[must_use]
    pub fn new(generator: LevelGenerator, capacity: usize) -> Self {
        Self {
            generator,
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn fill(&mut self) {
        while self.queue.len() < self.capacity {
            let level = self.generator.generate_level();
            self.queue.push_back(level);
        }
    }

    /// Takes the next level, generating it if the queue is empty.
    pub fn pop_next(&mut self) -> Level {
        let level = self
            .queue
            .pop_front()
            .unwrap_or_else(|| self.generator.generate_level());
        self.fill();
        level
    }

    /// Generates a fresh grid for the level in progress.
    ///
    /// Targets are untouched, and queued levels are not consumed.
    pub fn regenerate_grid(&mut self) -> Grid {
        self.generator.generate_grid()
    }

    pub fn upcoming(&self) -> impl Iterator<Item = &Level> + '_ {
        self.queue.iter()
    }

    /// Drops every queued level.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
