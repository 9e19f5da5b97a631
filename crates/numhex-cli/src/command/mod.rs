use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use self::{
    badges::BadgesArg, duel_sim::DuelSimArg, eval::EvalArg, generate::GenerateArg, play::PlayArg,
};
use crate::config::CliConfig;

mod badges;
mod duel_sim;
mod eval;
mod generate;
mod play;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Game configuration file (JSON); missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug messages
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Generate levels from a seed
    Generate(#[clap(flatten)] GenerateArg),
    /// Evaluate a path on a generated level
    Eval(#[clap(flatten)] EvalArg),
    /// Simulate a duel between two bots
    DuelSim(#[clap(flatten)] DuelSimArg),
    /// List badges unlocked by a set of results
    Badges(#[clap(flatten)] BadgesArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let mode = args.mode.unwrap_or(Mode::Play(PlayArg::default()));

    // the terminal UI owns stdout and stderr, so its log goes to a file
    let log_file = match &mode {
        Mode::Play(arg) => Some(arg.log_path()),
        _ => None,
    };
    init_logging(args.debug, log_file.as_deref())?;

    let config = CliConfig::load(args.config.as_deref())?;
    match mode {
        Mode::Play(arg) => play::run(&config, &arg)?,
        Mode::Generate(arg) => generate::run(&config, &arg)?,
        Mode::Eval(arg) => eval::run(&config, &arg)?,
        Mode::DuelSim(arg) => duel_sim::run(&config, &arg)?,
        Mode::Badges(arg) => badges::run(&arg)?,
    }
    Ok(())
}

fn init_logging(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if debug { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
