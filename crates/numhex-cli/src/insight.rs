use std::thread::{self, JoinHandle};

use async_channel::{Receiver, Sender};
use numhex_engine::{InsightProvider, InsightRequest, InsightTicket, resolve_insight};

/// Resolves insight requests on a background thread.
///
/// Answers are collected without blocking with [`InsightWorker::answers`],
/// so a slow provider never stalls the game loop.
#[derive(Debug)]
pub struct InsightWorker {
    requests: Sender<InsightRequest>,
    answers: Receiver<(InsightTicket, String)>,
    handle: Option<JoinHandle<()>>,
}

impl InsightWorker {
    pub fn spawn<P>(provider: P) -> Self
    where
        P: InsightProvider + Send + 'static,
    {
        let (requests, request_rx) = async_channel::unbounded::<InsightRequest>();
        let (answer_tx, answers) = async_channel::unbounded();
        let handle = thread::spawn(move || {
            while let Ok(request) = request_rx.recv_blocking() {
                let text = resolve_insight(&provider, &request);
                if answer_tx.send_blocking((request.ticket, text)).is_err() {
                    break;
                }
            }
        });
        Self {
            requests,
            answers,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, request: InsightRequest) {
        if let Err(e) = self.requests.try_send(request) {
            log::warn!("cannot queue insight {}: {e}", request.ticket);
        }
    }

    /// Answers received since the last call.
    pub fn answers(&self) -> Vec<(InsightTicket, String)> {
        std::iter::from_fn(|| self.answers.try_recv().ok()).collect()
    }
}

impl Drop for InsightWorker {
    fn drop(&mut self) {
        self.requests.close();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("insight worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use numhex_engine::{CannedInsight, FALLBACK_INSIGHT, KeyedInsight, SessionController};

    use super::*;

    fn request_from_finished_level() -> InsightRequest {
        use numhex_engine::{GameConfig, GridSeed, NoopFeedback};

        let mut config = GameConfig::default();
        config.session.initial_time_secs = 1;
        config.session.tick_rate = 1;
        let mut session =
            SessionController::with_seed(config, GridSeed::from_u128(1), Box::new(NoopFeedback))
                .unwrap();
        session.start().unwrap();
        session.tick();
        let mut requests = session.take_insight_requests();
        assert_eq!(requests.len(), 1);
        requests.remove(0)
    }

    #[test]
    fn test_answers_arrive_in_order() {
        let worker = InsightWorker::spawn(CannedInsight);
        let request = request_from_finished_level();
        worker.submit(request);
        let (ticket, text) = worker.answers.recv_blocking().unwrap();
        assert_eq!(ticket, request.ticket);
        assert!(!text.is_empty());
        assert!(worker.answers().is_empty());
    }

    #[test]
    fn test_missing_key_falls_back() {
        let worker = InsightWorker::spawn(KeyedInsight::new(None, CannedInsight));
        worker.submit(request_from_finished_level());
        let (_, text) = worker.answers.recv_blocking().unwrap();
        assert_eq!(text, FALLBACK_INSIGHT);
    }
}
