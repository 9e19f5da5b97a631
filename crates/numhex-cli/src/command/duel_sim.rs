use anyhow::Context as _;
use numhex_duel::{
    DuelConfig, DuelCoordinator, DuelEvent, DuelMode, DuelOutcome, JoinOutcome, MatchStore as _,
    MemoryStore, PlayerId, ProfileRecord,
};
use numhex_engine::{GameConfig, GridSeed, LevelGenerator};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::config::CliConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ModeArg {
    /// First to the target score wins
    #[default]
    Standard,
    /// Best of five rounds
    Blitz,
}

impl From<ModeArg> for DuelMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standard => DuelMode::Standard,
            ModeArg::Blitz => DuelMode::Blitz,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DuelSimArg {
    /// Duel mode
    #[clap(long, value_enum, default_value_t = ModeArg::Standard)]
    mode: ModeArg,
    /// Seed for the bots' pace and the match grid
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// The joining bot leaves after this many seconds
    #[clap(long)]
    quit_after: Option<u32>,
    /// Stop after this many simulated seconds
    #[clap(long, default_value_t = 600)]
    max_secs: u32,
}

/// Seconds a bot needs per target.
const THINK_SECS: std::ops::RangeInclusive<u64> = 2..=8;
/// Seconds a bot waits before marking itself ready for the next round.
const READY_SECS: std::ops::RangeInclusive<u64> = 1..=3;

#[derive(Debug)]
struct Bot {
    name: &'static str,
    duel: DuelCoordinator<MemoryStore>,
    rng: Pcg32,
    /// Ticks until the next target is solved while a round is played.
    solving: Option<u64>,
    ready_in: Option<u64>,
    round_targets: u32,
    total_targets: u32,
    left: bool,
}

impl Bot {
    fn new(name: &'static str, store: &MemoryStore, config: DuelConfig, seed: u64) -> Self {
        Self {
            name,
            duel: DuelCoordinator::new(store.clone(), PlayerId::new(name), config),
            rng: Pcg32::seed_from_u64(seed),
            solving: None,
            ready_in: None,
            round_targets: 0,
            total_targets: 0,
            left: false,
        }
    }

    fn is_done(&self) -> bool {
        self.left || self.duel.outcome().is_some() || self.duel.current().is_none()
    }

    fn think_ticks(&mut self, tick_rate: u32, secs: std::ops::RangeInclusive<u64>) -> u64 {
        self.rng.random_range(secs) * u64::from(tick_rate)
    }
}

#[derive(Debug)]
struct SimReport {
    lines: Vec<String>,
    outcomes: [(&'static str, Option<DuelOutcome>); 2],
}

#[derive(Debug)]
struct Simulation<'a> {
    game: &'a GameConfig,
    duel: DuelConfig,
    targets_per_level: u32,
    tick: u64,
    lines: Vec<String>,
}

impl Simulation<'_> {
    fn log(&mut self, who: &str, message: impl AsRef<str>) {
        let rate = u64::from(self.duel.tick_rate);
        let secs = self.tick / rate;
        let hundredths = self.tick % rate * 100 / rate;
        self.lines
            .push(format!("{secs:>4}.{hundredths:02}s {who:>5}: {}", message.as_ref()));
    }

    fn react(&mut self, bot: &mut Bot, event: DuelEvent) {
        self.log(bot.name, format!("{event:?}"));
        match event {
            DuelEvent::LaunchRound { round, seed } => {
                let level = LevelGenerator::with_seed(self.game, seed).generate_level();
                let targets = level.targets().values().collect::<Vec<_>>();
                self.log(bot.name, format!("plays round {round}, targets {targets:?}"));
                bot.round_targets = 0;
                bot.solving = Some(bot.think_ticks(self.duel.tick_rate, THINK_SECS));
            }
            DuelEvent::RoundAdvanced { .. } => {
                bot.solving = None;
                bot.round_targets = 0;
                bot.ready_in = Some(bot.think_ticks(self.duel.tick_rate, READY_SECS));
            }
            DuelEvent::Finished(_) | DuelEvent::Cancelled => {
                bot.solving = None;
                bot.ready_in = None;
            }
            DuelEvent::MatchStarted { .. }
            | DuelEvent::OpponentReady
            | DuelEvent::BothReady { .. }
            | DuelEvent::ScoreChanged { .. } => {}
        }
    }

    fn step(&mut self, bot: &mut Bot) -> anyhow::Result<()> {
        if let Some(ticks) = &mut bot.ready_in {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                bot.ready_in = None;
                let accepted = bot.duel.set_ready()?;
                self.log(bot.name, format!("ready (accepted: {accepted})"));
            }
        }

        let Some(ticks) = &mut bot.solving else {
            return Ok(());
        };
        *ticks = ticks.saturating_sub(1);
        if *ticks > 0 {
            return Ok(());
        }
        bot.round_targets += 1;
        bot.total_targets += 1;
        bot.solving = Some(bot.think_ticks(self.duel.tick_rate, THINK_SECS));

        let Some(record) = bot.duel.current() else {
            return Ok(());
        };
        let (mode, round) = (record.mode, record.current_round);
        match mode {
            DuelMode::Standard => {
                self.log(bot.name, format!("solved target #{}", bot.total_targets));
                bot.duel.report_targets(bot.total_targets)?;
            }
            DuelMode::Blitz if bot.round_targets >= self.targets_per_level => {
                bot.solving = None;
                let claimed = bot.duel.claim_round(round)?;
                self.log(
                    bot.name,
                    format!("cleared round {round} (first: {claimed})"),
                );
            }
            DuelMode::Blitz => {}
        }
        Ok(())
    }
}

fn simulate(config: &CliConfig, arg: &DuelSimArg) -> anyhow::Result<SimReport> {
    let DuelSimArg {
        mode,
        seed,
        quit_after,
        max_secs,
    } = arg;
    let duel = config.duel;
    let mode = DuelMode::from(*mode);

    let store = MemoryStore::new();
    // bob's profile is created on first use
    store.insert_profile(ProfileRecord::fallback(&PlayerId::new("alice")))?;
    let mut alice = Bot::new("alice", &store, duel, *seed);
    let mut bob = Bot::new("bob", &store, duel, seed.wrapping_add(1));

    let mut sim = Simulation {
        game: &config.game,
        duel,
        targets_per_level: u32::try_from(config.game.targets.count)?,
        tick: 0,
        lines: vec![],
    };

    let grid_seed = GridSeed::from_u128(u128::from(*seed));
    let hosted = alice.duel.host(mode, grid_seed)?;
    sim.log(alice.name, format!("hosts {mode} match {}", hosted.id));
    let open = bob.duel.open_matches(mode)?;
    let target = open.first().context("no open match to join")?;
    match bob.duel.join(&target.id)? {
        JoinOutcome::Joined(record) => sim.log(bob.name, format!("joins {}", record.id)),
        JoinOutcome::Unavailable => anyhow::bail!("match {} could not be joined", target.id),
    }

    let quit_tick = quit_after.map(|secs| u64::from(secs) * u64::from(duel.tick_rate));
    let max_ticks = u64::from(*max_secs) * u64::from(duel.tick_rate);
    while sim.tick < max_ticks && !(alice.is_done() && bob.is_done()) {
        sim.tick += 1;
        if quit_tick == Some(sim.tick) && !bob.is_done() {
            bob.duel.leave()?;
            bob.left = true;
            sim.log(bob.name, "leaves the match");
        }
        for bot in [&mut alice, &mut bob] {
            if bot.left {
                continue;
            }
            bot.duel.tick();
            for event in bot.duel.poll() {
                sim.react(bot, event);
            }
            sim.step(bot)?;
        }
    }
    if sim.tick >= max_ticks {
        sim.log("sim", "time limit reached");
    }

    Ok(SimReport {
        lines: sim.lines,
        outcomes: [
            (alice.name, alice.duel.outcome()),
            (bob.name, bob.duel.outcome()),
        ],
    })
}

pub(crate) fn run(config: &CliConfig, arg: &DuelSimArg) -> anyhow::Result<()> {
    let report = simulate(config, arg)?;
    for line in &report.lines {
        println!("{line}");
    }
    println!();
    for (name, outcome) in report.outcomes {
        match outcome {
            Some(outcome) => {
                let result = if outcome.won { "won" } else { "lost" };
                let how = if outcome.abandonment {
                    " by abandonment"
                } else {
                    ""
                };
                println!(
                    "{name}: {result}{how} {}-{}",
                    outcome.mine, outcome.theirs
                );
            }
            None => println!("{name}: no result"),
        }
    }
    Ok(())
}
