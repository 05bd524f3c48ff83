//! Live conversation surfaces
//!
//! A surface owns one ordered message log. User submissions are appended at
//! once; the engine's reply follows after a simulated typing delay. Tearing a
//! surface down aborts every pending reply. The closed flag is set and
//! checked under the log lock, so a timer that already fired still cannot
//! write once `close` has returned.
//!
//! Surfaces that see no traffic for the configured idle timeout are swept
//! out of `Sessions` and closed.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::conversation::{Category, Conversation, MediaAttachment, Message};

use super::content;
use super::engine::{self, ResponseEngine};
use super::random::RandomSource;

/// Typing delay: `base_ms` plus a uniform jitter in `0..jitter_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPacing {
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_base_ms() -> u64 {
    1000
}

fn default_jitter_ms() -> u64 {
    1000
}

impl Default for TypingPacing {
    fn default() -> Self {
        Self {
            base_ms: default_base_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl TypingPacing {
    pub fn delay(&self, random: &dyn RandomSource) -> Duration {
        let upper = usize::try_from(self.jitter_ms).unwrap_or(usize::MAX);
        let jitter = random.below(upper) as u64;
        Duration::from_millis(self.base_ms.saturating_add(jitter))
    }
}

/// How long an untouched session survives, and how often the sweeper runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExpiry {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for SessionExpiry {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SessionExpiry {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Never zero; `tokio::time::interval` rejects a zero period
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Decrement without wrapping below zero
fn release(pending: &AtomicUsize) {
    let _ = pending.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Message must contain text or an attachment")]
    EmptySubmission,

    #[error("Session is closed")]
    Closed,

    #[error("Session not found: {0}")]
    NotFound(Uuid),
}

/// Time-of-day greeting, with the user's name when known
pub fn greeting(hour: u32, name: Option<&str>) -> String {
    let salutation = match hour {
        5..=11 => "Bom dia",
        12..=17 => "Boa tarde",
        _ => "Boa noite",
    };

    match name {
        Some(name) => format!("{}, {}", salutation, name),
        None => salutation.to_string(),
    }
}

/// Opening lines shown when a surface is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opening {
    pub greeting: String,
    pub question: String,
}

pub struct ConversationSurface {
    id: Uuid,
    engine: Arc<ResponseEngine>,
    pacing: TypingPacing,
    log: Arc<Mutex<Conversation>>,
    pending: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    last_active: Mutex<Instant>,
}

impl ConversationSurface {
    pub fn new(engine: Arc<ResponseEngine>, pacing: TypingPacing) -> Self {
        let log = Conversation::new();
        Self {
            id: log.id,
            engine,
            pacing,
            log: Arc::new(Mutex::new(log)),
            pending: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn opening(&self) -> Opening {
        let hour = chrono::Local::now().hour();
        let name = self.engine.display_name().await;
        Opening {
            greeting: greeting(hour, name.as_deref()),
            question: content::OPENING_QUESTION.to_string(),
        }
    }

    /// Append the user's message and schedule the engine's reply.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        text: &str,
        media: Option<MediaAttachment>,
    ) -> Result<Message, SessionError> {
        if text.trim().is_empty() && media.is_none() {
            return Err(SessionError::EmptySubmission);
        }

        let message = {
            let mut log = self.lock_log();
            if self.is_closed() {
                return Err(SessionError::Closed);
            }
            log.add_user(text, media).clone()
        };

        let delay = self.pacing.delay(self.engine.random().as_ref());
        let engine = Arc::clone(&self.engine);
        let log = Arc::clone(&self.log);
        let pending = Arc::clone(&self.pending);
        let closed = Arc::clone(&self.closed);
        let input = text.to_string();
        let session_id = self.id;

        pending.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !closed.load(Ordering::SeqCst) {
                let reply = engine.respond(&input).await;
                let mut log = log.lock().unwrap_or_else(|e| e.into_inner());
                if !closed.load(Ordering::SeqCst) {
                    log.add_reply(&reply.text, reply.category);
                    tracing::debug!(%session_id, category = reply.category.as_str(), "reply appended");
                }
            }

            release(&pending);
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);

        Ok(message)
    }

    /// Append a random insight right away
    pub fn request_insight(&self) -> Result<Message, SessionError> {
        let text = self.engine.insight_on_demand();
        self.append_now(text, Category::Insight)
    }

    /// Append a random tip right away
    pub fn request_tip(&self) -> Result<Message, SessionError> {
        let text = self.engine.tip_on_demand();
        self.append_now(text, Category::Tip)
    }

    pub fn trigger_emergency(&self) -> Result<Message, SessionError> {
        let reply = engine::emergency_acknowledgment();
        tracing::warn!(session_id = %self.id, "emergency contact requested");
        self.append_now(&reply.text, reply.category)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock_log().messages.clone()
    }

    pub fn is_typing(&self) -> bool {
        !self.is_closed() && self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.lock_log().clear();
    }

    /// Tear down: pending replies are dropped and never appended
    pub fn close(&self) {
        {
            let _log = self.lock_log();
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
        }

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for task in tasks.drain(..) {
            task.abort();
        }
        self.pending.store(0, Ordering::SeqCst);
        tracing::debug!(session_id = %self.id, "session closed");
    }

    /// Mark the surface as in use, postponing idle expiry
    pub fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    fn append_now(&self, text: &str, category: Category) -> Result<Message, SessionError> {
        let mut log = self.lock_log();
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(log.add_reply(text, category).clone())
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ConversationSurface {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open surfaces, keyed by id
pub struct Sessions {
    engine: Arc<ResponseEngine>,
    pacing: TypingPacing,
    surfaces: RwLock<HashMap<Uuid, Arc<ConversationSurface>>>,
}

impl Sessions {
    pub fn new(engine: Arc<ResponseEngine>, pacing: TypingPacing) -> Self {
        Self {
            engine,
            pacing,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(&self) -> Arc<ConversationSurface> {
        let surface = Arc::new(ConversationSurface::new(Arc::clone(&self.engine), self.pacing));
        self.surfaces
            .write()
            .await
            .insert(surface.id(), Arc::clone(&surface));
        tracing::info!(session_id = %surface.id(), "session opened");
        surface
    }

    /// Look up a surface and mark it active
    pub async fn get(&self, id: Uuid) -> Result<Arc<ConversationSurface>, SessionError> {
        let surface = self
            .surfaces
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;
        surface.touch();
        Ok(surface)
    }

    pub async fn close(&self, id: Uuid) -> Result<(), SessionError> {
        let surface = self
            .surfaces
            .write()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        surface.close();
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.surfaces.read().await.len()
    }

    /// Close and drop every surface idle for at least `idle`.
    /// Returns how many were removed.
    pub async fn sweep(&self, idle: Duration) -> usize {
        let mut surfaces = self.surfaces.write().await;
        let before = surfaces.len();

        surfaces.retain(|id, surface| {
            if surface.idle_for() < idle {
                return true;
            }
            surface.close();
            tracing::info!(session_id = %id, "session expired");
            false
        });

        before - surfaces.len()
    }

    /// Run `sweep` on a fixed interval until the registry is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, expiry: SessionExpiry) -> JoinHandle<()> {
        let sessions = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(expiry.sweep_interval());
            tracing::info!(
                idle_timeout_secs = expiry.idle_timeout_secs,
                "session sweeper started"
            );

            loop {
                interval.tick().await;

                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                let expired = sessions.sweep(expiry.idle_timeout()).await;
                if expired > 0 {
                    tracing::debug!(expired, "expired idle sessions");
                }
            }
        })
    }
}
