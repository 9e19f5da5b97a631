/// Persistent "tutorial completed" flag.
///
/// Storage failures are the implementation's concern; a flag that cannot be
/// written simply shows the tutorial again next time.
pub trait TutorialFlag {
    fn is_completed(&self) -> bool;

    fn mark_completed(&mut self);
}

/// Flag kept in memory for the lifetime of the value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryTutorialFlag {
    completed: bool,
}

impl MemoryTutorialFlag {
    #[must_use]
    pub fn new(completed: bool) -> Self {
        Self { completed }
    }
}

impl TutorialFlag for MemoryTutorialFlag {
    fn is_completed(&self) -> bool {
        self.completed
    }

    fn mark_completed(&mut self) {
        self.completed = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum TutorialStep {
    #[display("Welcome")]
    Welcome,
    #[display("Connection rules")]
    ConnectionRules,
    #[display("The power of the streak")]
    Streak,
    #[display("Time and carry-over")]
    CarryOver,
    #[display("IQ ranking")]
    IqRanking,
}

impl TutorialStep {
    pub const ALL: [Self; 5] = [
        Self::Welcome,
        Self::ConnectionRules,
        Self::Streak,
        Self::CarryOver,
        Self::IqRanking,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Welcome => {
                "Connect numbers and operators on the grid to produce every target shown above it."
            }
            Self::ConnectionRules => {
                "Start on a number and keep alternating: number, operator, number. \
                 Two numbers or two operators can never touch in a path."
            }
            Self::Streak => {
                "Each consecutive hit doubles the points (5, 10, 20, 40, 80). \
                 A miss resets the streak and the base points."
            }
            Self::CarryOver => {
                "You start with 60 seconds. Time you save on a level carries over to the next one."
            }
            Self::IqRanking => {
                "Speed and accuracy feed an estimated IQ between 70 and 200. Climb as high as you can."
            }
        }
    }
}

/// Position in the tutorial flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tutorial {
    step: TutorialStep,
}

impl Default for Tutorial {
    fn default() -> Self {
        Self::new()
    }
}

impl Tutorial {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: TutorialStep::Welcome,
        }
    }

    #[must_use]
    pub fn step(&self) -> TutorialStep {
        self.step
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.step.next().is_none()
    }

    /// Moves to the next step; returns `false` once the last step is passed.
    pub fn advance(&mut self) -> bool {
        match self.step.next() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }
}

/// What [`SessionController::request_start`](crate::SessionController::request_start) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StartDecision {
    Started,
    ShowTutorial,
}
