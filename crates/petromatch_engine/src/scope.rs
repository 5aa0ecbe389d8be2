use std::future::Future;

use petromatch_core::Epoch;
use tokio_util::sync::CancellationToken;

/// Cancellation scope for the activities of the current epoch.
///
/// Only one epoch is live at a time: asking for a newer epoch cancels the
/// previous token, and older epochs never get a live token again.
#[derive(Debug)]
pub(crate) struct EpochScope {
    epoch: Epoch,
    token: CancellationToken,
}

impl EpochScope {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Epoch::default(),
            token: CancellationToken::new(),
        }
    }

    /// Token for an activity started under `epoch`, or `None` if that epoch is over.
    pub(crate) fn token_for(&mut self, epoch: Epoch) -> Option<CancellationToken> {
        if epoch < self.epoch {
            return None;
        }
        if epoch > self.epoch {
            self.token.cancel();
            self.epoch = epoch;
            self.token = CancellationToken::new();
        }
        Some(self.token.child_token())
    }

    pub(crate) fn cancel(&mut self, epoch: Epoch) {
        if epoch >= self.epoch {
            self.token.cancel();
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        self.token.cancel();
    }
}

/// Runs `future` unless `token` fires first.
pub(crate) async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    future: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}
