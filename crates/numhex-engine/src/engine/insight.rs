use crate::InsightError;

/// Commentary used whenever the provider fails.
pub const FALLBACK_INSIGHT: &str = "Great challenge! Push past your limits.";

/// Commentary used when the provider answers with nothing.
pub const EMPTY_INSIGHT: &str = "Keep going, your mind is quick!";

/// Identifies one insight request of a session.
///
/// Tickets only grow, so an answer to an older request can be recognized and
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("#{_0}")]
pub struct InsightTicket(pub(crate) u64);

/// Performance summary sent to the commentary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightRequest {
    pub ticket: InsightTicket,
    pub score: u64,
    pub level: u32,
    pub time_left: u32,
}

/// Source of post-level commentary.
pub trait InsightProvider {
    fn insight(&self, request: &InsightRequest) -> Result<String, InsightError>;
}

/// Asks `provider` for commentary, degrading to a canned line on failure.
///
/// Never fails.
pub fn resolve_insight(provider: &dyn InsightProvider, request: &InsightRequest) -> String {
    match provider.insight(request) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => EMPTY_INSIGHT.to_owned(),
        Err(e) => {
            log::warn!("insight {} unavailable: {e}", request.ticket);
            FALLBACK_INSIGHT.to_owned()
        }
    }
}

/// Local provider picking a line from performance bands.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedInsight;

impl InsightProvider for CannedInsight {
    fn insight(&self, request: &InsightRequest) -> Result<String, InsightError> {
        let line = match (request.level, request.score) {
            (level, _) if level >= 10 => "Ten levels deep. Few minds keep this pace.",
            (_, score) if score >= 5000 => "A score like this takes real arithmetic instinct.",
            (level, _) if level >= 5 => "Solid logic under pressure. Keep the streak alive.",
            (_, _) if request.time_left >= 30 => "Fast and precise. Carry that time forward.",
            (_, score) if score >= 1000 => "Good rhythm. Chain more hits for bigger points.",
            _ => "Every path sharpens the mind. Try again!",
        };
        Ok(line.to_owned())
    }
}

/// Provider that requires an API key before answering.
///
/// Without a key every request fails with
/// [`InsightError::MissingCredentials`].
#[derive(Debug, Clone)]
pub struct KeyedInsight<P> {
    api_key: Option<String>,
    inner: P,
}

impl<P> KeyedInsight<P> {
    #[must_use]
    pub fn new(api_key: Option<String>, inner: P) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Self { api_key, inner }
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

impl<P: InsightProvider> InsightProvider for KeyedInsight<P> {
    fn insight(&self, request: &InsightRequest) -> Result<String, InsightError> {
        if self.api_key.is_none() {
            return Err(InsightError::MissingCredentials);
        }
        self.inner.insight(request)
    }
}
