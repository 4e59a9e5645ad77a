//! Local speech engine contract (tier 2).
//!
//! A local engine speaks through the platform's own audio path, so there is
//! no tappable sample stream. It reports lifecycle through events instead;
//! the orchestrator pairs those with the synthetic lip-sync driver.

use crate::error::Result;
use crate::synth::VoiceOptions;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Lifecycle events emitted by a speaking local engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// The engine actually started producing sound.
    Started,
    /// The utterance ran to completion.
    Finished,
    /// The engine failed mid-utterance.
    Error(String),
}

/// A local utterance in flight.
///
/// Dropping the handle does not stop the engine; call [`LocalUtterance::stop`]
/// to interrupt it.
pub struct LocalUtterance {
    events: mpsc::UnboundedReceiver<UtteranceEvent>,
    cancel: CancellationToken,
}

impl LocalUtterance {
    /// Pair a handle with the sender the engine keeps.
    pub fn new(cancel: CancellationToken) -> (Self, mpsc::UnboundedSender<UtteranceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { events: rx, cancel }, tx)
    }

    /// Wait for the next lifecycle event. `None` once the engine side is gone.
    pub async fn next_event(&mut self) -> Option<UtteranceEvent> {
        self.events.recv().await
    }

    /// Interrupt the utterance.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the engine for this utterance.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// An embedded speech engine that plays audio itself.
pub trait LocalSpeechEngine: Send + Sync {
    /// Start speaking `text`. Returns immediately with a handle; the engine
    /// reports `Started`/`Finished`/`Error` through it.
    ///
    /// # Errors
    ///
    /// [`crate::error::AnimError::SynthesisUnsupported`] when the engine is
    /// not available on this platform, so the caller can fall to the next
    /// tier.
    fn speak(&self, text: &str, options: &VoiceOptions) -> Result<LocalUtterance>;
}
