use std::mem;

use crate::{
    CellId, ConfigError, ExtendRejection, FeedbackCue, FeedbackSink, GameConfig, GameState, Grid,
    GridSeed, InsightRequest, InsightTicket, LevelBuffer, LevelGenerator, MIN_PATH_LEN,
    ScoringEngine, SelectedPath, SessionStatus, StartDecision, TransitionError, Tutorial,
    TutorialFlag, TutorialStep, evaluate, judge,
};

/// Something the session did, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    PathStarted(CellId),
    PathExtended(CellId),
    /// A path was dropped without being scored.
    PathDiscarded,
    TargetMatched {
        value: i64,
        points: u64,
        streak: u32,
    },
    Missed {
        value: Option<i64>,
    },
    GridRegenerated,
    /// The last target of the level was matched; input is locked until the level completes.
    VictoryLocked,
    SecondElapsed {
        time_left: u32,
    },
    LevelCompleted {
        level: u32,
    },
    LevelStarted {
        level: u32,
    },
    GameOver,
    Quit,
    TutorialOpened,
    TutorialAdvanced(TutorialStep),
    TutorialFinished,
    InsightReady(InsightTicket),
}

/// Result of releasing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum PathOutcome {
    /// No path was being built.
    NoPath,
    /// The path was too short to evaluate and was dropped without penalty.
    Discarded,
    Matched {
        value: i64,
        points: u64,
        level_completed: bool,
    },
    Missed {
        value: Option<i64>,
    },
}

/// Single-player state machine.
///
/// The controller owns the grid, the path being dragged, the countdown and
/// the level buffer. It never sleeps: the host drives time by calling
/// [`tick`](Self::tick) `tick_rate` times per second, and reads what happened
/// through [`drain_events`](Self::drain_events).
///
/// # State machine
///
/// ```text
/// Idle --start--> Playing --all targets + victory delay--> LevelComplete
///                    |                                        |
///                    +--time up--> GameOver      next_level --+--> Playing
/// ```
///
/// `quit` returns to `Idle` from anywhere; `restart` starts over from any
/// state but `Idle`.
#[derive(Debug)]
pub struct SessionController {
    config: GameConfig,
    scoring: ScoringEngine,
    levels: LevelBuffer,
    state: GameState,
    grid: Option<Grid>,
    path: SelectedPath,
    second_ticks: u32,
    victory_ticks: Option<u64>,
    tutorial: Option<Tutorial>,
    insight: Option<String>,
    pending_insight: Option<InsightTicket>,
    next_ticket: u64,
    insight_requests: Vec<InsightRequest>,
    events: Vec<SessionEvent>,
    feedback: Box<dyn FeedbackSink>,
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.feedback.dispose();
    }
}

impl SessionController {
    /// Creates an idle session with a random seed.
    pub fn new(config: GameConfig, feedback: Box<dyn FeedbackSink>) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = LevelGenerator::new(&config);
        Ok(Self::build(config, generator, feedback))
    }

    /// Like [`Self::new`], but levels come from a seeded generator.
    pub fn with_seed(
        config: GameConfig,
        seed: GridSeed,
        feedback: Box<dyn FeedbackSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = LevelGenerator::with_seed(&config, seed);
        Ok(Self::build(config, generator, feedback))
    }

    fn build(
        config: GameConfig,
        generator: LevelGenerator,
        mut feedback: Box<dyn FeedbackSink>,
    ) -> Self {
        feedback.init();
        Self {
            scoring: ScoringEngine::new(config.scoring.clone()),
            levels: LevelBuffer::new(generator, config.session.level_buffer_size),
            state: GameState::new(&config.scoring, config.session.initial_time_secs),
            grid: None,
            path: SelectedPath::new(),
            second_ticks: 0,
            victory_ticks: None,
            tutorial: None,
            insight: None,
            pending_insight: None,
            next_ticket: 0,
            insight_requests: Vec::new(),
            events: Vec::new(),
            feedback,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Grid of the level in progress; `None` before the first start.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    #[must_use]
    pub fn path(&self) -> &SelectedPath {
        &self.path
    }

    #[must_use]
    pub fn tutorial(&self) -> Option<&Tutorial> {
        self.tutorial.as_ref()
    }

    /// Latest delivered commentary, cleared whenever a new one is requested.
    #[must_use]
    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    /// Whether the pause after the last target of a level is running.
    #[must_use]
    pub fn is_victory_locked(&self) -> bool {
        self.victory_ticks.is_some()
    }

    /// Whether gestures are currently refused.
    #[must_use]
    pub fn is_input_locked(&self) -> bool {
        !self.state.status.is_playing() || self.victory_ticks.is_some() || self.tutorial.is_some()
    }

    /// Takes every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        mem::take(&mut self.events)
    }

    /// Takes the commentary requests queued by level or game end.
    pub fn take_insight_requests(&mut self) -> Vec<InsightRequest> {
        mem::take(&mut self.insight_requests)
    }

    /// Stores commentary for the latest request.
    ///
    /// Answers to earlier requests are dropped; returns whether `text` was kept.
    pub fn deliver_insight(&mut self, ticket: InsightTicket, text: String) -> bool {
        if self.pending_insight != Some(ticket) {
            log::debug!("dropping stale insight {ticket}");
            return false;
        }
        self.pending_insight = None;
        self.insight = Some(text);
        self.events.push(SessionEvent::InsightReady(ticket));
        true
    }

    fn play(&mut self, cue: FeedbackCue) {
        self.feedback.play(cue);
    }

    /// Starts the session, or opens the tutorial if it was never completed.
    pub fn request_start(
        &mut self,
        flag: &dyn TutorialFlag,
    ) -> Result<StartDecision, TransitionError> {
        self.ensure_startable("start")?;
        if flag.is_completed() {
            self.start()?;
            return Ok(StartDecision::Started);
        }
        self.open_tutorial();
        Ok(StartDecision::ShowTutorial)
    }

    /// Shows the tutorial from its first step.
    pub fn open_tutorial(&mut self) {
        self.tutorial = Some(Tutorial::new());
        self.play(FeedbackCue::UiClick);
        self.events.push(SessionEvent::TutorialOpened);
    }

    /// Moves the tutorial forward and returns the new step.
    ///
    /// Passing the last step closes the tutorial, marks `flag` and, unless a
    /// session is already running, starts one. Returns `None` then, or when
    /// no tutorial is open.
    pub fn advance_tutorial(&mut self, flag: &mut dyn TutorialFlag) -> Option<TutorialStep> {
        let tutorial = self.tutorial.as_mut()?;
        if tutorial.advance() {
            let step = tutorial.step();
            self.play(FeedbackCue::Tick);
            self.events.push(SessionEvent::TutorialAdvanced(step));
            return Some(step);
        }

        self.tutorial = None;
        flag.mark_completed();
        self.events.push(SessionEvent::TutorialFinished);
        if self.ensure_startable("start").is_ok() {
            self.begin();
        }
        None
    }

    fn ensure_startable(&self, action: &'static str) -> Result<(), TransitionError> {
        match self.state.status {
            SessionStatus::Idle | SessionStatus::GameOver => Ok(()),
            status => Err(TransitionError::new(action, status)),
        }
    }

    /// Starts a fresh session from `Idle` or `GameOver`.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.ensure_startable("start")?;
        self.begin();
        Ok(())
    }

    /// Abandons the current session and starts a fresh one.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        if self.state.status.is_idle() {
            return Err(TransitionError::new("restart", self.state.status));
        }
        self.begin();
        Ok(())
    }

    fn begin(&mut self) {
        self.state = GameState::new(&self.config.scoring, self.config.session.initial_time_secs);
        self.levels.clear();
        let (grid, targets) = self.levels.pop_next().into_parts();
        self.grid = Some(grid);
        self.state.targets = targets;
        self.state.status = SessionStatus::Playing;
        self.path.clear();
        self.second_ticks = 0;
        self.victory_ticks = None;
        self.tutorial = None;
        self.insight = None;
        self.pending_insight = None;
        self.play(FeedbackCue::UiClick);
        self.events.push(SessionEvent::Started);
        log::info!(
            "session started with {} seconds and {} targets",
            self.state.time_left,
            self.state.targets.len()
        );
    }

    /// Moves from `LevelComplete` to the next level, keeping the remaining time.
    pub fn next_level(&mut self) -> Result<(), TransitionError> {
        if !self.state.status.is_level_complete() {
            return Err(TransitionError::new("start the next level", self.state.status));
        }
        self.scoring.start_next_level(&mut self.state);
        let (grid, targets) = self.levels.pop_next().into_parts();
        self.grid = Some(grid);
        self.state.targets = targets;
        self.state.status = SessionStatus::Playing;
        self.second_ticks = 0;
        self.insight = None;
        self.pending_insight = None;
        self.play(FeedbackCue::UiClick);
        self.events.push(SessionEvent::LevelStarted {
            level: self.state.level,
        });
        log::info!(
            "level {} started with {} seconds left",
            self.state.level,
            self.state.time_left
        );
        Ok(())
    }

    /// Returns to `Idle`, dropping any path and pending commentary.
    pub fn quit(&mut self) {
        self.state.status = SessionStatus::Idle;
        self.path.clear();
        self.victory_ticks = None;
        self.tutorial = None;
        self.pending_insight = None;
        self.play(FeedbackCue::Reset);
        self.events.push(SessionEvent::Quit);
    }

    fn ensure_input(&self) -> Result<(), ExtendRejection> {
        if self.is_input_locked() {
            return Err(ExtendRejection::InputLocked);
        }
        Ok(())
    }

    /// Begins a drag on `id`, which must be a number cell.
    pub fn start_path(&mut self, id: CellId) -> Result<(), ExtendRejection> {
        self.ensure_input()?;
        let grid = self.grid.as_ref().ok_or(ExtendRejection::InputLocked)?;
        self.path.try_start(grid, id)?;
        self.play(FeedbackCue::Select);
        self.events.push(SessionEvent::PathStarted(id));
        Ok(())
    }

    /// Adds `id` to the drag in progress.
    pub fn extend_path(&mut self, id: CellId) -> Result<(), ExtendRejection> {
        self.ensure_input()?;
        let grid = self.grid.as_ref().ok_or(ExtendRejection::InputLocked)?;
        self.path.try_extend(grid, self.config.grid.topology, id)?;
        self.play(FeedbackCue::Tick);
        self.events.push(SessionEvent::PathExtended(id));
        Ok(())
    }

    /// Drops the drag in progress without scoring it.
    pub fn cancel_path(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.path.clear();
        self.play(FeedbackCue::Reset);
        self.events.push(SessionEvent::PathDiscarded);
    }

    /// Ends the drag and scores the path.
    ///
    /// Paths shorter than [`MIN_PATH_LEN`] are dropped with no penalty.
    pub fn finish_path(&mut self) -> PathOutcome {
        if self.path.is_empty() {
            return PathOutcome::NoPath;
        }
        let ids = self.path.take();
        if self.is_input_locked() {
            return PathOutcome::NoPath;
        }
        if ids.len() < MIN_PATH_LEN {
            self.play(FeedbackCue::Reset);
            self.events.push(SessionEvent::PathDiscarded);
            return PathOutcome::Discarded;
        }
        let Some(grid) = self.grid.as_ref() else {
            return PathOutcome::NoPath;
        };

        let value = evaluate(grid, &ids);
        let evaluation = judge(value, &self.state.targets);
        let report = self.scoring.apply_outcome(&mut self.state, evaluation);
        if !report.matched {
            self.play(FeedbackCue::Error);
            self.events.push(SessionEvent::Missed { value });
            log::debug!("path {ids:?} evaluated to {value:?}, no target");
            return PathOutcome::Missed { value };
        }

        let value = value.unwrap_or_default();
        self.play(FeedbackCue::Success);
        self.events.push(SessionEvent::TargetMatched {
            value,
            points: report.points,
            streak: self.state.streak,
        });
        if report.level_completed {
            self.lock_for_victory();
        } else {
            self.grid = Some(self.levels.regenerate_grid());
            self.events.push(SessionEvent::GridRegenerated);
        }
        PathOutcome::Matched {
            value,
            points: report.points,
            level_completed: report.level_completed,
        }
    }

    fn lock_for_victory(&mut self) {
        let ticks = self
            .config
            .session
            .ticks_for_millis(self.config.session.victory_delay_ms);
        self.events.push(SessionEvent::VictoryLocked);
        if ticks == 0 {
            self.complete_level();
        } else {
            self.victory_ticks = Some(ticks);
        }
    }

    /// Advances time by one tick.
    ///
    /// The countdown only runs while playing, and is held during the pause
    /// after a level's final target.
    pub fn tick(&mut self) {
        if !self.state.status.is_playing() {
            return;
        }
        if let Some(remaining) = self.victory_ticks {
            if remaining <= 1 {
                self.victory_ticks = None;
                self.complete_level();
            } else {
                self.victory_ticks = Some(remaining - 1);
            }
            return;
        }

        self.second_ticks += 1;
        if self.second_ticks < self.config.session.tick_rate {
            return;
        }
        self.second_ticks = 0;
        self.state.time_left = self.state.time_left.saturating_sub(1);
        self.state.elapsed_secs += 1;
        self.events.push(SessionEvent::SecondElapsed {
            time_left: self.state.time_left,
        });
        if self.state.time_left == 0 {
            self.end_game();
        }
    }

    fn complete_level(&mut self) {
        let level = self.state.level;
        self.scoring.finish_level(&mut self.state);
        self.state.status = SessionStatus::LevelComplete;
        self.path.clear();
        self.events.push(SessionEvent::LevelCompleted { level });
        log::info!(
            "level {level} completed: score {}, {} seconds left",
            self.state.total_score,
            self.state.time_left
        );
        self.request_insight();
    }

    fn end_game(&mut self) {
        self.state.status = SessionStatus::GameOver;
        self.path.clear();
        self.victory_ticks = None;
        self.events.push(SessionEvent::GameOver);
        log::info!(
            "game over at level {} with score {}",
            self.state.level,
            self.state.total_score
        );
        self.request_insight();
    }

    fn request_insight(&mut self) {
        let ticket = InsightTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending_insight = Some(ticket);
        self.insight = None;
        self.insight_requests.push(InsightRequest {
            ticket,
            score: self.state.total_score,
            level: self.state.level,
            time_left: self.state.time_left,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{Cell, CellValue, LevelTargets, MemoryTutorialFlag, Operator, Topology};

    #[derive(Debug, Default, Clone)]
    struct Recorder {
        cues: Arc<Mutex<Vec<FeedbackCue>>>,
        lifecycle: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Recorder {
        fn cues(&self) -> Vec<FeedbackCue> {
            self.cues.lock().unwrap().clone()
        }
    }

    impl FeedbackSink for Recorder {
        fn init(&mut self) {
            self.lifecycle.lock().unwrap().push("init");
        }

        fn dispose(&mut self) {
            self.lifecycle.lock().unwrap().push("dispose");
        }

        fn play(&mut self, cue: FeedbackCue) {
            self.cues.lock().unwrap().push(cue);
        }
    }

    fn config() -> GameConfig {
        let mut config = GameConfig::default();
        config.grid.rows = 3;
        config.grid.cols = 3;
        config.grid.topology = Topology::Rectilinear;
        config
    }

    /// ```text
    /// 8 ÷ 0
    /// - 4 ×
    /// 2 + 6
    /// ```
    fn fixed_grid() -> Grid {
        let values = [
            CellValue::Number(8),
            CellValue::Operator(Operator::Div),
            CellValue::Number(0),
            CellValue::Operator(Operator::Sub),
            CellValue::Number(4),
            CellValue::Operator(Operator::Mul),
            CellValue::Number(2),
            CellValue::Operator(Operator::Add),
            CellValue::Number(6),
        ];
        let cells = (0..3)
            .flat_map(|row| (0..3).map(move |col| CellId::new(row, col)))
            .zip(values)
            .map(|(id, value)| Cell::new(id, value))
            .collect();
        Grid::from_cells(3, 3, cells).unwrap()
    }

    /// Started session on the fixed grid with the given targets.
    fn session(targets: &[u32]) -> (SessionController, Recorder) {
        let recorder = Recorder::default();
        let mut session =
            SessionController::with_seed(config(), GridSeed::from_u128(11), Box::new(recorder.clone()))
                .unwrap();
        session.start().unwrap();
        session.grid = Some(fixed_grid());
        session.state.targets = LevelTargets::new(targets.iter().copied());
        session.drain_events();
        (session, recorder)
    }

    fn drag(session: &mut SessionController, cells: &[&str]) -> PathOutcome {
        let mut ids = cells.iter().map(|s| s.parse::<CellId>().unwrap());
        if let Some(first) = ids.next() {
            session.start_path(first).unwrap();
        }
        for id in ids {
            session.extend_path(id).unwrap();
        }
        session.finish_path()
    }

    // 8 ÷ 4
    const TWO: [&str; 3] = ["0-0", "0-1", "1-1"];
    // 2 + 6
    const EIGHT: [&str; 3] = ["2-0", "2-1", "2-2"];
    // 4 × 6
    const TWENTY_FOUR: [&str; 3] = ["1-1", "1-2", "2-2"];

    fn tick_seconds(session: &mut SessionController, seconds: u32) {
        for _ in 0..seconds * session.config().session.tick_rate {
            session.tick();
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn test_start_generates_first_level() {
            let mut session =
                SessionController::new(GameConfig::default(), Box::new(crate::NoopFeedback)).unwrap();
            assert!(session.state().status().is_idle());
            assert!(session.grid().is_none());
            session.start().unwrap();
            assert!(session.state().status().is_playing());
            assert_eq!(session.grid().unwrap().cells().len(), 35);
            assert_eq!(session.state().level_targets().len(), 5);
            assert_eq!(session.state().time_left(), 60);
            assert_eq!(session.drain_events(), [SessionEvent::Started]);
        }

        #[test]
        fn test_cannot_start_twice() {
            let (mut session, _) = session(&[2]);
            let err = session.start().unwrap_err();
            assert_eq!(err.from_status(), SessionStatus::Playing);
            assert!(session.next_level().is_err());
        }

        #[test]
        fn test_invalid_config_is_rejected() {
            let mut config = config();
            config.session.tick_rate = 0;
            assert!(SessionController::new(config, Box::new(crate::NoopFeedback)).is_err());
        }

        #[test]
        fn test_quit_returns_to_idle() {
            let (mut session, recorder) = session(&[2]);
            session.start_path("0-0".parse().unwrap()).unwrap();
            session.quit();
            assert!(session.state().status().is_idle());
            assert!(session.path().is_empty());
            assert_eq!(recorder.cues().last(), Some(&FeedbackCue::Reset));
            assert!(session.restart().is_err());
            assert!(session.start().is_ok());
        }

        #[test]
        fn test_same_seed_same_first_level() {
            let a = {
                let mut s = SessionController::with_seed(
                    config(),
                    GridSeed::from_u128(5),
                    Box::new(crate::NoopFeedback),
                )
                .unwrap();
                s.start().unwrap();
                (s.grid().cloned(), s.state().level_targets().clone())
            };
            let b = {
                let mut s = SessionController::with_seed(
                    config(),
                    GridSeed::from_u128(5),
                    Box::new(crate::NoopFeedback),
                )
                .unwrap();
                s.start().unwrap();
                (s.grid().cloned(), s.state().level_targets().clone())
            };
            assert_eq!(a, b);
        }

        #[test]
        fn test_feedback_lifecycle() {
            let (session, recorder) = session(&[2]);
            drop(session);
            assert_eq!(*recorder.lifecycle.lock().unwrap(), ["init", "dispose"]);
        }
    }

    mod gestures {
        use super::*;

        #[test]
        fn test_match_scores_and_regenerates_grid() {
            let (mut session, recorder) = session(&[2, 8]);
            let outcome = drag(&mut session, &TWO);
            assert_eq!(
                outcome,
                PathOutcome::Matched {
                    value: 2,
                    points: 5,
                    level_completed: false
                }
            );
            assert_eq!(session.state().total_score(), 5);
            assert_eq!(session.state().streak(), 1);
            assert!(session.state().level_targets().as_slice()[0].is_completed());
            assert!(session.path().is_empty());
            assert!(session.drain_events().contains(&SessionEvent::GridRegenerated));
            assert_eq!(
                recorder.cues(),
                [
                    FeedbackCue::UiClick,
                    FeedbackCue::Select,
                    FeedbackCue::Tick,
                    FeedbackCue::Tick,
                    FeedbackCue::Success
                ]
            );
        }

        #[test]
        fn test_miss_penalizes() {
            let (mut session, recorder) = session(&[2, 8]);
            assert_eq!(
                drag(&mut session, &TWENTY_FOUR),
                PathOutcome::Missed { value: Some(24) }
            );
            assert_eq!(session.state().streak(), 0);
            assert!(!session.state().last_level_perfect());
            assert!((session.state().estimated_iq() - 98.5).abs() < 1e-9);
            assert_eq!(recorder.cues().last(), Some(&FeedbackCue::Error));
            assert_eq!(session.grid(), Some(&fixed_grid()));
        }

        #[test]
        fn test_short_path_is_discarded_without_penalty() {
            let (mut session, recorder) = session(&[2]);
            assert_eq!(drag(&mut session, &["0-0", "0-1"]), PathOutcome::Discarded);
            assert!((session.state().estimated_iq() - 100.0).abs() < f64::EPSILON);
            assert!(session.state().last_level_perfect());
            assert_eq!(recorder.cues().last(), Some(&FeedbackCue::Reset));
            assert_eq!(session.finish_path(), PathOutcome::NoPath);
        }

        #[test]
        fn test_rejections_leave_path_untouched() {
            let (mut session, _) = session(&[2]);
            let id = |s: &str| s.parse::<CellId>().unwrap();
            assert_eq!(
                session.start_path(id("0-1")),
                Err(ExtendRejection::NotNumber)
            );
            session.start_path(id("0-0")).unwrap();
            assert_eq!(
                session.extend_path(id("1-1")),
                Err(ExtendRejection::SameKind)
            );
            assert_eq!(
                session.extend_path(id("2-1")),
                Err(ExtendRejection::NotAdjacent)
            );
            assert_eq!(session.path().ids(), &[id("0-0")]);
            session.cancel_path();
            assert!(session.path().is_empty());
        }

        #[test]
        fn test_input_refused_when_not_playing() {
            let mut session =
                SessionController::new(config(), Box::new(crate::NoopFeedback)).unwrap();
            assert_eq!(
                session.start_path(CellId::new(0, 0)),
                Err(ExtendRejection::InputLocked)
            );
        }
    }

    mod timing {
        use super::*;

        #[test]
        fn test_victory_lock_then_level_complete() {
            let (mut session, _) = session(&[2]);
            let outcome = drag(&mut session, &TWO);
            assert!(matches!(
                outcome,
                PathOutcome::Matched {
                    level_completed: true,
                    ..
                }
            ));
            assert!(session.is_victory_locked());
            assert_eq!(
                session.start_path(CellId::new(2, 0)),
                Err(ExtendRejection::InputLocked)
            );

            // 1200 ms at 60 ticks per second
            for _ in 0..71 {
                session.tick();
            }
            assert!(session.state().status().is_playing());
            session.tick();
            assert!(session.state().status().is_level_complete());
            assert_eq!(session.state().level(), 2);
            assert_eq!(session.state().streak(), 0);
            assert_eq!(session.state().time_left(), 60);
            assert!(
                session
                    .drain_events()
                    .contains(&SessionEvent::LevelCompleted { level: 1 })
            );
        }

        #[test]
        fn test_countdown_ends_the_game() {
            let (mut session, _) = session(&[2]);
            tick_seconds(&mut session, 59);
            assert_eq!(session.state().time_left(), 1);
            assert!(session.state().status().is_playing());
            tick_seconds(&mut session, 1);
            assert!(session.state().status().is_game_over());
            assert_eq!(session.state().elapsed_secs(), 60);
            let requests = session.take_insight_requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].time_left, 0);

            // no more time passes after game over
            tick_seconds(&mut session, 5);
            assert_eq!(session.state().elapsed_secs(), 60);
        }

        #[test]
        fn test_time_carries_over_to_next_level() {
            let (mut session, _) = session(&[8]);
            tick_seconds(&mut session, 10);
            drag(&mut session, &EIGHT);
            tick_seconds(&mut session, 3);
            assert!(session.state().status().is_level_complete());
            assert_eq!(session.state().time_left(), 50);

            session.next_level().unwrap();
            assert!(session.state().status().is_playing());
            assert_eq!(session.state().time_left(), 50);
            assert_eq!(session.state().base_points(), 6);
            assert_eq!(session.state().level(), 2);
        }

        #[test]
        fn test_imperfect_level_keeps_start_base_points() {
            let (mut session, _) = session(&[8]);
            drag(&mut session, &TWENTY_FOUR);
            drag(&mut session, &EIGHT);
            tick_seconds(&mut session, 2);
            session.next_level().unwrap();
            assert_eq!(session.state().base_points(), 5);
        }
    }

    mod insight {
        use super::*;

        fn complete_level(session: &mut SessionController) {
            drag(session, &EIGHT);
            tick_seconds(session, 2);
        }

        #[test]
        fn test_request_on_level_complete() {
            let (mut session, _) = session(&[8]);
            complete_level(&mut session);
            let requests = session.take_insight_requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].level, 2);
            assert_eq!(requests[0].score, 5);
            assert!(session.take_insight_requests().is_empty());

            assert!(session.deliver_insight(requests[0].ticket, "nice".to_owned()));
            assert_eq!(session.insight(), Some("nice"));
        }

        #[test]
        fn test_stale_ticket_is_ignored() {
            let (mut session, _) = session(&[8]);
            complete_level(&mut session);
            let stale = session.take_insight_requests()[0].ticket;
            session.next_level().unwrap();
            session.quit();
            session.start().unwrap();
            tick_seconds(&mut session, 60);
            let fresh = session.take_insight_requests()[0].ticket;
            assert_ne!(stale, fresh);

            assert!(!session.deliver_insight(stale, "old".to_owned()));
            assert_eq!(session.insight(), None);
            assert!(session.deliver_insight(fresh, "new".to_owned()));
            assert_eq!(session.insight(), Some("new"));
        }
    }

    mod tutorial {
        use super::*;

        #[test]
        fn test_first_start_shows_tutorial() {
            let mut session =
                SessionController::new(config(), Box::new(crate::NoopFeedback)).unwrap();
            let mut flag = MemoryTutorialFlag::default();
            assert_eq!(
                session.request_start(&flag),
                Ok(StartDecision::ShowTutorial)
            );
            assert!(session.state().status().is_idle());
            assert_eq!(session.tutorial().unwrap().step(), TutorialStep::Welcome);

            let mut steps = Vec::new();
            while let Some(step) = session.advance_tutorial(&mut flag) {
                steps.push(step);
            }
            assert_eq!(steps, &TutorialStep::ALL[1..]);
            assert!(flag.is_completed());
            assert!(session.tutorial().is_none());
            assert!(session.state().status().is_playing());
        }

        #[test]
        fn test_completed_flag_starts_directly() {
            let mut session =
                SessionController::new(config(), Box::new(crate::NoopFeedback)).unwrap();
            let flag = MemoryTutorialFlag::new(true);
            assert_eq!(session.request_start(&flag), Ok(StartDecision::Started));
            assert!(session.state().status().is_playing());
        }

        #[test]
        fn test_tutorial_during_play_only_closes() {
            let (mut session, _) = session(&[2]);
            let mut flag = MemoryTutorialFlag::default();
            session.open_tutorial();
            assert!(session.is_input_locked());
            while session.advance_tutorial(&mut flag).is_some() {}
            assert!(session.state().status().is_playing());
            assert_eq!(session.state().level_targets().values().collect::<Vec<_>>(), [2]);
            assert!(!session.is_input_locked());
        }
    }
}
