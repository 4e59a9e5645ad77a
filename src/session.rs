//! One in-flight utterance from request to completion/cancellation.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A speech session: the requested text plus the cancellation token every
/// loop and await belonging to the session observes.
///
/// At most one session drives the mouth parameter at any time; a session
/// is superseded (cancelled) when a newer utterance starts before it ends.
#[derive(Debug, Clone)]
pub struct SpeechSession {
    pub id: Uuid,
    pub text: String,
    pub started_at: std::time::Instant,
    cancel: CancellationToken,
}

impl SpeechSession {
    /// Begin a new session for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            started_at: std::time::Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed by everything spawned for this session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel this session (used when a newer utterance supersedes it).
    pub fn supersede(&self) {
        self.cancel.cancel();
    }

    /// Whether the session has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
