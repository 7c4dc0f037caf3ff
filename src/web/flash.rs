//! One-shot messages carried across a redirect.
//!
//! A `todos_session` cookie names a server-side queue. Redirecting handlers
//! push onto it and the next rendered page drains it.
//!
//! Clients that never send the cookie back leave their queue behind, so
//! queues expire after a TTL and the number of live queues is capped; the
//! oldest queue is dropped first.

use axum::http::{HeaderMap, header};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::handlers::Message;

pub const SESSION_COOKIE: &str = "todos_session";

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Slot {
    created: Instant,
    messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct FlashStore {
    slots: Arc<Mutex<HashMap<Uuid, Slot>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl FlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues older than `ttl` are discarded; at most `capacity` are kept
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        // A poisoned slot map still holds usable messages
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, session: Uuid, message: Message) {
        let now = Instant::now();
        let mut slots = self.slots();
        slots.retain(|_, slot| now.duration_since(slot.created) < self.ttl);

        if !slots.contains_key(&session) {
            while slots.len() >= self.capacity {
                let oldest = slots
                    .iter()
                    .min_by_key(|(_, slot)| slot.created)
                    .map(|(id, _)| *id);
                match oldest {
                    Some(id) => slots.remove(&id),
                    None => break,
                };
            }
        }

        slots
            .entry(session)
            .or_insert_with(|| Slot {
                created: now,
                messages: Vec::new(),
            })
            .messages
            .push(message);
    }

    /// Remove and return every message queued for `session`
    pub fn take(&self, session: Uuid) -> Vec<Message> {
        match self.slots().remove(&session) {
            Some(slot) if slot.created.elapsed() < self.ttl => slot.messages,
            _ => Vec::new(),
        }
    }

    /// Number of sessions with queued messages
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read the session id from the request's `Cookie` headers
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
