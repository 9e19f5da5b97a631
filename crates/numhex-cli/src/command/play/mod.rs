use std::{env, path::PathBuf};

use anyhow::Context as _;
use numhex_engine::{CannedInsight, GridSeed, KeyedInsight, LogFeedback, SessionController};

use self::app::PlayApp;
use crate::{
    config::CliConfig, insight::InsightWorker, tui::Runtime, tutorial_flag::FileTutorialFlag,
};

mod app;

const DEFAULT_STATE_DIR: &str = "./data/numhex/";
const INSIGHT_KEY_VAR: &str = "NUMHEX_INSIGHT_KEY";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Seed for level generation (32 hex digits); random when omitted
    #[clap(long)]
    seed: Option<GridSeed>,
    /// Directory for the tutorial flag and the log file
    #[clap(long, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            seed: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl PlayArg {
    pub(crate) fn log_path(&self) -> PathBuf {
        self.state_dir.join("numhex.log")
    }
}

pub(crate) fn run(config: &CliConfig, arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg { seed, state_dir } = arg;

    let game = config.game.clone();
    let feedback = Box::new(LogFeedback);
    let session = match seed {
        Some(seed) => SessionController::with_seed(game, *seed, feedback)?,
        None => SessionController::new(game, feedback)?,
    };
    let tick_rate = session.config().session.tick_rate;

    let api_key = env::var(INSIGHT_KEY_VAR).ok().filter(|key| !key.is_empty());
    if api_key.is_none() {
        log::info!("{INSIGHT_KEY_VAR} is not set; level commentary uses the fallback line");
    }
    let insight = InsightWorker::spawn(KeyedInsight::new(api_key, CannedInsight));
    let flag = FileTutorialFlag::open(state_dir);

    let mut app = PlayApp::new(session, flag, insight);
    Runtime::new(tick_rate)
        .run(&mut app)
        .context("Terminal session failed")?;

    let state = app.session().state();
    log::info!(
        "left with score {} at level {}",
        state.total_score(),
        state.level()
    );
    Ok(())
}
