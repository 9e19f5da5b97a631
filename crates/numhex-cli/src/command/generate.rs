use std::path::PathBuf;

use numhex_engine::{GameConfig, GridSeed, Level, LevelGenerator};
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{config::CliConfig, util};

/// Levels generated from one seed, as written by `generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LevelPack {
    pub(crate) seed: GridSeed,
    pub(crate) config: GameConfig,
    pub(crate) levels: Vec<Level>,
}

impl LevelPack {
    pub(crate) fn generate(config: &GameConfig, seed: GridSeed, count: usize) -> Self {
        let mut generator = LevelGenerator::with_seed(config, seed);
        let levels = (0..count).map(|_| generator.generate_level()).collect();
        Self {
            seed,
            config: config.clone(),
            levels,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Seed for level generation (32 hex digits); random when omitted
    #[clap(long)]
    seed: Option<GridSeed>,
    /// Number of levels to generate
    #[clap(long, default_value_t = 1)]
    levels: usize,
    /// Output file path (stdout when omitted)
    #[clap(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(config: &CliConfig, arg: &GenerateArg) -> anyhow::Result<()> {
    let GenerateArg {
        seed,
        levels,
        output,
    } = arg;

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let pack = LevelPack::generate(&config.game, seed, *levels);
    eprintln!("Generated {} levels from seed {seed}", pack.levels.len());
    util::save_json(&pack, output.as_deref())?;
    Ok(())
}
