//! OAuth `state` tokens handed out at login and checked on the redirect.
//!
//! The store is owned by whoever wires up the web layer: create it at startup,
//! start [`AuthorizedStates::spawn_sweeper`] and abort the handle on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

#[derive(Debug)]
struct PendingState {
    session_id: String,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct AuthorizedStates {
    states: Arc<RwLock<HashMap<String, PendingState>>>,
    ttl: Duration,
}

impl AuthorizedStates {
    pub fn new(ttl: Duration) -> AuthorizedStates {
        AuthorizedStates {
            states: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Binds a fresh state token to `session_id` and returns it.
    pub async fn issue(&self, session_id: impl Into<String>) -> String {
        let state = Uuid::new_v4().to_string();
        let pending = PendingState {
            session_id: session_id.into(),
            expires_at: Instant::now() + self.ttl,
        };
        self.states.write().await.insert(state.clone(), pending);
        state
    }

    /// Consumes `state`. Valid only once, before expiry, and for the session
    /// it was issued to.
    pub async fn verify(&self, state: &str, session_id: &str) -> bool {
        let Some(pending) = self.states.write().await.remove(state) else {
            return false;
        };
        pending.expires_at > Instant::now() && pending.session_id == session_id
    }

    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, pending| pending.expires_at > now);
        before - states.len()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }

    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let states = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let evicted = states.evict_expired().await;
                if evicted > 0 {
                    debug!("Evicted {} expired OAuth states", evicted);
                }
            }
        })
    }
}
