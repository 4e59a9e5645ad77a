//! Speech orchestration: one utterance at a time, three provider tiers.
//!
//! `speak` supersedes whatever is in flight, asks the remote synthesizer
//! first, falls back to a local speech engine, and finally to a silent
//! fixed-timeout animation so the avatar always reacts to a reply. The
//! orchestrator owns the idle animator and suspends it for the whole of a
//! speaking session; every per-session task observes the session's
//! cancellation token, so a superseded session can never write a parameter
//! after its successor starts.

use crate::audio::{AudioOutput, AudioTap, PlaybackEvent};
use crate::avatar::{AvatarSurface, MotionPriority};
use crate::config::AnimatorConfig;
use crate::error::Result;
use crate::events::AnimatorEvent;
use crate::idle::IdleAnimator;
use crate::lipsync::{self, LipSyncHandle, SyntheticBound};
use crate::motion;
use crate::overlay::{self, OverlayHandle};
use crate::session::SpeechSession;
use crate::synth::{LocalSpeechEngine, Synthesizer, SynthesisTier, UtteranceEvent, VoiceOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coarse state of the animation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// Nothing in flight; the idle loop runs.
    Idle,
    /// Synthesis has been requested but no tier has started producing yet.
    Requesting,
    /// A session is animating the avatar.
    Speaking,
}

/// Handles belonging to the session currently allowed to animate.
struct ActiveSession {
    session: SpeechSession,
    lipsync: Option<LipSyncHandle>,
    overlay: Option<OverlayHandle>,
    playback: Option<crate::audio::PlaybackHandle>,
    local_cancel: Option<CancellationToken>,
}

impl ActiveSession {
    fn new(session: SpeechSession) -> Self {
        Self {
            session,
            lipsync: None,
            overlay: None,
            playback: None,
            local_cancel: None,
        }
    }

    /// Stop everything this session spawned. Lip-sync stop closes the
    /// mouth; overlay stop restores its baselines.
    fn teardown(&self) {
        if let Some(playback) = &self.playback {
            playback.stop();
        }
        if let Some(local) = &self.local_cancel {
            local.cancel();
        }
        if let Some(lipsync) = &self.lipsync {
            lipsync.stop();
        }
        if let Some(overlay) = &self.overlay {
            overlay.stop();
        }
    }
}

/// Drives speech sessions end to end.
pub struct SpeechOrchestrator {
    surface: Arc<dyn AvatarSurface>,
    remote: Arc<dyn Synthesizer>,
    local: Option<Arc<dyn LocalSpeechEngine>>,
    output: Arc<dyn AudioOutput>,
    config: AnimatorConfig,
    idle: IdleAnimator,
    state: Mutex<AnimationState>,
    active: Mutex<Option<ActiveSession>>,
    events: broadcast::Sender<AnimatorEvent>,
}

impl SpeechOrchestrator {
    /// Build the orchestrator and start the idle loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        surface: Arc<dyn AvatarSurface>,
        remote: Arc<dyn Synthesizer>,
        local: Option<Arc<dyn LocalSpeechEngine>>,
        output: Arc<dyn AudioOutput>,
        config: AnimatorConfig,
    ) -> Self {
        let idle = IdleAnimator::spawn(Arc::clone(&surface), &config.idle);
        let (events, _) = broadcast::channel(256);
        Self {
            surface,
            remote,
            local,
            output,
            config,
            idle,
            state: Mutex::new(AnimationState::Idle),
            active: Mutex::new(None),
            events,
        }
    }

    /// Subscribe to animator events.
    pub fn subscribe(&self) -> broadcast::Receiver<AnimatorEvent> {
        self.events.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> AnimationState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(AnimationState::Idle)
    }

    /// Speak `text`: supersede any in-flight session, then walk the tier
    /// chain until one produces a speaking session.
    ///
    /// Returns once the session has ended (naturally or superseded). The
    /// silent tier always succeeds, so a reply is never left unanimated.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for callers that
    /// need to surface setup failures.
    pub async fn speak(&self, text: &str) -> Result<()> {
        let session = SpeechSession::new(text);
        info!(session = %session.id, "speech requested");
        self.begin_session(&session);
        self.run_tiers(&session).await;
        Ok(())
    }

    /// Stop the in-flight session, if any. Synchronous: when this returns
    /// the mouth is closed, overlay baselines are restored and the idle
    /// loop is running again.
    pub fn stop(&self) {
        let taken = self.active.lock().ok().and_then(|mut a| a.take());
        if let Some(active) = taken {
            active.session.supersede();
            active.teardown();
            self.idle.resume();
            self.set_state(AnimationState::Idle);
            let _ = self.events.send(AnimatorEvent::SpeechEnd {
                session_id: active.session.id,
                interrupted: true,
            });
        }
    }

    /// Stop everything, including the idle loop.
    pub fn shutdown(&self) {
        self.stop();
        self.idle.shutdown();
    }

    /// Supersede the previous session and install the new one, all before
    /// the first await of the new session.
    fn begin_session(&self, session: &SpeechSession) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if let Some(old) = active.take() {
            old.session.supersede();
            old.teardown();
            let _ = self.events.send(AnimatorEvent::SpeechEnd {
                session_id: old.session.id,
                interrupted: true,
            });
        }
        *active = Some(ActiveSession::new(session.clone()));
        drop(active);
        self.set_state(AnimationState::Requesting);
    }

    async fn run_tiers(&self, session: &SpeechSession) {
        let options = VoiceOptions {
            voice: self.config.synthesis.voice.clone(),
            pitch: self.config.synthesis.pitch,
            speed: self.config.synthesis.speed,
        };

        // Tier 1: remote synthesis with tappable playback.
        match self.remote.synthesize(&session.text, &options).await {
            Ok(audio) => {
                if session.is_cancelled() {
                    return;
                }
                if self.run_remote_playback(session, &audio).await {
                    return;
                }
            }
            Err(e) => {
                warn!(session = %session.id, "remote synthesis unavailable: {e}");
            }
        }
        if session.is_cancelled() {
            return;
        }

        // Tier 2: local speech engine, synthetic mouth on its events.
        if let Some(engine) = &self.local {
            match engine.speak(&session.text, &options) {
                Ok(utterance) => {
                    if self.run_local_utterance(session, utterance).await {
                        return;
                    }
                }
                Err(e) => {
                    warn!(session = %session.id, "local speech unavailable: {e}");
                }
            }
        }
        if session.is_cancelled() {
            return;
        }

        // Tier 3: silent. Fixed-timeout mouth animation, always succeeds.
        self.run_silent(session).await;
    }

    /// Play remote audio. Returns `true` when the tier handled the session
    /// (including a mid-playback error) and `false` when playback could not
    /// start at all, so the caller falls to the next tier.
    async fn run_remote_playback(
        &self,
        session: &SpeechSession,
        audio: &crate::audio::DecodedAudio,
    ) -> bool {
        let tap = AudioTap::new(self.config.lipsync.window_size);
        let (tx, mut rx) = mpsc::unbounded_channel::<PlaybackEvent>();
        let handle = match self.output.play(audio, Some(&tap), tx) {
            Ok(h) => h,
            Err(e) => {
                warn!(session = %session.id, "playback did not start: {e}");
                return false;
            }
        };
        let tapped = handle.tapped();
        let cancel = session.cancel_token();
        self.attach(session, |a| a.playback = Some(handle));

        // Animation starts on the stream's Started event, not on decode.
        loop {
            tokio::select! {
                () = cancel.cancelled() => return true,
                event = rx.recv() => match event {
                    Some(PlaybackEvent::Started) => break,
                    Some(PlaybackEvent::Error(e)) => {
                        warn!(session = %session.id, "playback failed before start: {e}");
                        return false;
                    }
                    None => {
                        warn!(session = %session.id, "playback thread exited before start");
                        return false;
                    }
                    Some(_) => {}
                },
            }
        }

        if !self.enter_speaking(session, SynthesisTier::Remote) {
            return true;
        }
        let driver = if tapped {
            lipsync::spawn_amplitude(
                Arc::clone(&self.surface),
                tap,
                &self.config.lipsync,
                Some(self.events.clone()),
            )
        } else {
            lipsync::spawn_synthetic(
                Arc::clone(&self.surface),
                &self.config.lipsync,
                SyntheticBound::Duration(audio.duration()),
                Some(self.events.clone()),
            )
        };
        self.attach(session, |a| a.lipsync = Some(driver));

        loop {
            tokio::select! {
                () = cancel.cancelled() => return true,
                event = rx.recv() => match event {
                    Some(PlaybackEvent::Finished | PlaybackEvent::Stopped) | None => break,
                    Some(PlaybackEvent::Error(message)) => {
                        warn!(session = %session.id, "playback error: {message}");
                        let _ = self.events.send(AnimatorEvent::PlaybackError {
                            session_id: session.id,
                            message,
                        });
                        break;
                    }
                    Some(PlaybackEvent::Started) => {}
                },
            }
        }
        self.end_session(session, false);
        true
    }

    /// Drive a local-engine utterance. Returns `false` when the engine
    /// never started producing sound, so the caller falls to the next tier.
    async fn run_local_utterance(
        &self,
        session: &SpeechSession,
        mut utterance: crate::synth::LocalUtterance,
    ) -> bool {
        let cancel = session.cancel_token();
        self.attach(session, |a| a.local_cancel = Some(utterance.cancel_token()));

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    utterance.stop();
                    return true;
                }
                event = utterance.next_event() => match event {
                    Some(UtteranceEvent::Started) => break,
                    Some(UtteranceEvent::Error(e)) => {
                        warn!(session = %session.id, "local engine failed to start: {e}");
                        return false;
                    }
                    None | Some(UtteranceEvent::Finished) => return false,
                },
            }
        }

        if !self.enter_speaking(session, SynthesisTier::Local) {
            utterance.stop();
            return true;
        }
        let driver = lipsync::spawn_synthetic(
            Arc::clone(&self.surface),
            &self.config.lipsync,
            SyntheticBound::External,
            Some(self.events.clone()),
        );
        self.attach(session, |a| a.lipsync = Some(driver));

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    utterance.stop();
                    return true;
                }
                event = utterance.next_event() => match event {
                    Some(UtteranceEvent::Finished) | None => break,
                    Some(UtteranceEvent::Error(message)) => {
                        warn!(session = %session.id, "local engine error: {message}");
                        let _ = self.events.send(AnimatorEvent::PlaybackError {
                            session_id: session.id,
                            message,
                        });
                        break;
                    }
                    Some(UtteranceEvent::Started) => {}
                },
            }
        }
        self.end_session(session, false);
        true
    }

    /// No audio at all: oscillate the mouth for a fixed window so the
    /// avatar still visibly reacts.
    async fn run_silent(&self, session: &SpeechSession) {
        if !self.enter_speaking(session, SynthesisTier::Silent) {
            return;
        }
        let window = Duration::from_millis(self.config.lipsync.synthetic_fallback_ms);
        let driver = lipsync::spawn_synthetic(
            Arc::clone(&self.surface),
            &self.config.lipsync,
            SyntheticBound::Duration(window),
            Some(self.events.clone()),
        );
        self.attach(session, |a| a.lipsync = Some(driver));

        let cancel = session.cancel_token();
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(window) => {}
        }
        self.end_session(session, false);
    }

    /// Flip the avatar into speaking posture for this session: suspend
    /// idle, trigger an intent motion, start the expressive overlay, and
    /// announce the transition. Returns `false` when the session was
    /// superseded in the meantime.
    fn enter_speaking(&self, session: &SpeechSession, tier: SynthesisTier) -> bool {
        if session.is_cancelled() {
            return false;
        }
        self.idle.suspend();

        let intent = crate::intent::classify(&session.text);
        let mut rng = rand::thread_rng();
        motion::trigger(&self.surface, intent, MotionPriority::Normal, &mut rng);

        let overlay = overlay::spawn(Arc::clone(&self.surface), &self.config.overlay);
        self.attach(session, |a| a.overlay = Some(overlay));

        self.set_state(AnimationState::Speaking);
        let _ = self.events.send(AnimatorEvent::SpeechStart {
            session_id: session.id,
            tier,
        });
        info!(session = %session.id, ?tier, ?intent, "speaking");
        true
    }

    /// End a session that ran to completion. A superseded session skips
    /// this entirely; its successor already owns the idle loop and state.
    fn end_session(&self, session: &SpeechSession, interrupted: bool) {
        if session.is_cancelled() {
            return;
        }
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        let Some(current) = active.as_ref() else {
            return;
        };
        if current.session.id != session.id {
            return;
        }
        let current = active.take();
        drop(active);
        if let Some(current) = current {
            current.teardown();
        }
        self.idle.resume();
        self.set_state(AnimationState::Idle);
        let _ = self.events.send(AnimatorEvent::SpeechEnd {
            session_id: session.id,
            interrupted,
        });
        info!(session = %session.id, "speech ended");
    }

    /// Store a handle on the active session, or stop it straight away when
    /// the session has already been superseded.
    fn attach<F>(&self, session: &SpeechSession, store: F)
    where
        F: FnOnce(&mut ActiveSession),
    {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        match active.as_mut() {
            Some(a) if a.session.id == session.id && !session.is_cancelled() => store(a),
            _ => {
                // Lost the race against a superseding session: park the
                // handle in a throwaway slot and tear it down.
                let mut orphan = ActiveSession::new(session.clone());
                store(&mut orphan);
                orphan.teardown();
            }
        }
    }

    fn set_state(&self, state: AnimationState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
        let _ = self.events.send(AnimatorEvent::State { state });
    }
}
