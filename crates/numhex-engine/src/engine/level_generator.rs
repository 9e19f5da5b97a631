use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    CellKind, CellValue, GameConfig, Grid, GridConfig, LevelTargets, Operator, SeedParseError,
    TargetConfig,
};

/// Target used when sampling gives up.
const FALLBACK_TARGET: u32 = 10;

/// Odd 128-bit constant used to spread round numbers over the seed space.
const ROUND_MIX: u128 = 0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C835;

/// Seed for deterministic level generation.
///
/// A 128-bit seed written as 32 hexadecimal digits. Two generators built from
/// the same seed produce the same grids and targets, which is how both sides
/// of a duel end up on the same board.
///
/// # Example
///
/// ```
/// use numhex_engine::GridSeed;
/// use rand::Rng as _;
///
/// let seed: GridSeed = rand::rng().random();
/// let text = seed.to_string();
/// assert_eq!(text.len(), 32);
/// assert_eq!(text.parse::<GridSeed>().unwrap(), seed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSeed([u8; 16]);

impl GridSeed {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    #[must_use]
    pub const fn as_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Derives the seed of a duel round.
    ///
    /// Round 0 uses the seed itself.
    #[must_use]
    pub fn for_round(self, round: u32) -> Self {
        Self::from_u128(self.as_u128() ^ u128::from(round).wrapping_mul(ROUND_MIX))
    }
}

impl fmt::Display for GridSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.as_u128())
    }
}

impl FromStr for GridSeed {
    type Err = SeedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(SeedParseError::new(
                s,
                format!("expected 32 characters, got {}", s.len()),
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SeedParseError::new(s, "not a hexadecimal number"));
        }
        let value = u128::from_str_radix(s, 16).map_err(|e| SeedParseError::new(s, e.to_string()))?;
        Ok(Self::from_u128(value))
    }
}

impl Serialize for GridSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Distribution<GridSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GridSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        GridSeed(seed)
    }
}

/// A grid together with the targets to reach on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    grid: Grid,
    targets: LevelTargets,
}

impl Level {
    #[must_use]
    pub fn new(grid: Grid, targets: LevelTargets) -> Self {
        Self { grid, targets }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn targets(&self) -> &LevelTargets {
        &self.targets
    }

    #[must_use]
    pub fn into_parts(self) -> (Grid, LevelTargets) {
        (self.grid, self.targets)
    }
}

/// Produces grids and target sets from a seeded random source.
///
/// Grid cells follow the checkerboard rule of [`CellKind::at`]: number cells
/// get a uniform digit and operator cells a uniform operator.
///
/// Targets are built by rejection sampling two operands and an operator from
/// [`Operator::TARGET_SET`] until enough distinct values are collected.
/// Sampling is capped; when the cap is hit the remaining targets are filled
/// with `10` or the smallest unused positive value.
///
/// # Example
///
/// ```
/// use numhex_engine::{GameConfig, GridSeed, LevelGenerator};
///
/// let config = GameConfig::default();
/// let seed = GridSeed::from_u128(42);
/// let a = LevelGenerator::with_seed(&config, seed).generate_level();
/// let b = LevelGenerator::with_seed(&config, seed).generate_level();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    rng: Pcg32,
    grid: GridConfig,
    targets: TargetConfig,
}

impl LevelGenerator {
    /// Creates a generator with a random seed.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self::with_seed(config, rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(config: &GameConfig, seed: GridSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            grid: config.grid.clone(),
            targets: config.targets.clone(),
        }
    }

    /// Creates the generator for one round of a duel.
    ///
    /// Each round starts from its own derived seed, so both players see the
    /// same board even if one of them regenerated more grids earlier.
    #[must_use]
    pub fn for_round(config: &GameConfig, seed: GridSeed, round: u32) -> Self {
        Self::with_seed(config, seed.for_round(round))
    }

    pub fn generate_grid(&mut self) -> Grid {
        let rng = &mut self.rng;
        Grid::from_fn(self.grid.rows, self.grid.cols, |id| {
            match CellKind::at(id.row(), id.col()) {
                CellKind::Number => CellValue::Number(rng.random_range(0..=9)),
                CellKind::Operator => CellValue::Operator(rng.random()),
            }
        })
    }

    pub fn generate_targets(&mut self) -> LevelTargets {
        let TargetConfig {
            count,
            first_operand_max,
            second_operand_max,
            max_attempts,
        } = self.targets;

        let mut values = Vec::with_capacity(count);
        let mut attempts = 0;
        while values.len() < count && attempts < max_attempts {
            attempts += 1;
            let a = self.rng.random_range(1..=first_operand_max);
            let b = self.rng.random_range(1..=second_operand_max);
            let op = Operator::TARGET_SET[self.rng.random_range(0..Operator::TARGET_SET.len())];
            let candidate = target_value(op, a, b);
            if candidate > 0 && !values.contains(&candidate) {
                values.push(candidate);
            }
        }

        if values.len() < count {
            log::warn!(
                "target sampling gave up after {attempts} attempts with {} of {count} targets",
                values.len()
            );
            while values.len() < count {
                let fallback = fallback_target(&values);
                values.push(fallback);
            }
        }

        LevelTargets::new(values)
    }

    pub fn generate_level(&mut self) -> Level {
        let grid = self.generate_grid();
        let targets = self.generate_targets();
        Level::new(grid, targets)
    }
}

fn target_value(op: Operator, a: u32, b: u32) -> u32 {
    match op {
        Operator::Add => a.saturating_add(b),
        Operator::Sub => a.saturating_sub(b).max(1),
        Operator::Mul => a.saturating_mul(b),
        Operator::Div => a,
    }
}

fn fallback_target(taken: &[u32]) -> u32 {
    if !taken.contains(&FALLBACK_TARGET) {
        return FALLBACK_TARGET;
    }
    let mut value = 1;
    while taken.contains(&value) {
        value += 1;
    }
    value
}
