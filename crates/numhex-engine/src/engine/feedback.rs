use std::fmt;

/// Audio or visual cue emitted by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FeedbackCue {
    #[display("select")]
    Select,
    #[display("tick")]
    Tick,
    #[display("success")]
    Success,
    #[display("error")]
    Error,
    #[display("reset")]
    Reset,
    #[display("ui-click")]
    UiClick,
}

/// Receiver of fire-and-forget feedback cues.
///
/// The session calls [`init`](Self::init) once when it is built and
/// [`dispose`](Self::dispose) when it is dropped.
pub trait FeedbackSink: fmt::Debug {
    fn init(&mut self) {}

    fn dispose(&mut self) {}

    fn play(&mut self, cue: FeedbackCue);
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn play(&mut self, _cue: FeedbackCue) {}
}

/// Writes cues to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn init(&mut self) {
        log::debug!("feedback ready");
    }

    fn dispose(&mut self) {
        log::debug!("feedback disposed");
    }

    fn play(&mut self, cue: FeedbackCue) {
        log::debug!("cue: {cue}");
    }
}
