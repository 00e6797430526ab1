//! Server-side sessions
//!
//! Cookie chỉ chứa một UUID v4; actor và flash messages nằm trong
//! [`SessionStore`] (DashMap). Flash là one-shot: đọc xong thì mất.
//!
//! An entry exists only while it holds an actor or pending flashes, so
//! anonymous traffic never grows the store.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use barangay_core::Actor;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct SessionData {
    actor: Option<Actor>,
    flashes: Vec<String>,
}

/// Token → session data
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.inner.contains_key(id)
    }

    fn handle(&self, id: Uuid) -> Session {
        Session {
            id,
            store: self.clone(),
        }
    }

    /// Drop the entry once it holds nothing.
    fn prune(&self, id: &Uuid) {
        self.inner
            .remove_if(id, |_, data| data.actor.is_none() && data.flashes.is_empty());
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Handle to the current request's session, placed in request extensions
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn actor(&self) -> Option<Actor> {
        self.store.inner.get(&self.id).and_then(|data| data.actor)
    }

    pub fn sign_in(&self, actor: Actor) {
        self.store.inner.entry(self.id).or_default().actor = Some(actor);
    }

    /// Drop the actor; pending flashes survive so the login page can show them.
    pub fn sign_out(&self) {
        if let Some(mut data) = self.store.inner.get_mut(&self.id) {
            data.actor = None;
        }
        self.store.prune(&self.id);
    }

    pub fn flash(&self, message: impl Into<String>) {
        self.store
            .inner
            .entry(self.id)
            .or_default()
            .flashes
            .push(message.into());
    }

    pub fn take_flashes(&self) -> Vec<String> {
        let flashes = self
            .store
            .inner
            .get_mut(&self.id)
            .map(|mut data| std::mem::take(&mut data.flashes))
            .unwrap_or_default();
        self.store.prune(&self.id);
        flashes
    }
}

fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Attach a [`Session`] to every request. A missing or stale cookie gets a
/// fresh id that is only stored, and sent back in `Set-Cookie`, once the
/// handler writes something to it.
pub async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let sessions = state.sessions();
    let existing = cookie_value(req.headers(), state.cookie_name())
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .filter(|id| sessions.contains(id));

    let (id, fresh) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };
    req.extensions_mut().insert(sessions.handle(id));

    let mut response = next.run(req).await;

    if fresh && sessions.contains(&id) {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", state.cookie_name(), id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "Invalid session cookie header"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashes_are_one_shot() {
        let store = SessionStore::new();
        let session = store.handle(Uuid::new_v4());

        session.flash("Request submitted");
        session.flash("Second");
        assert_eq!(session.take_flashes(), vec!["Request submitted", "Second"]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_sign_out_keeps_flashes() {
        let store = SessionStore::new();
        let session = store.handle(Uuid::new_v4());

        session.sign_in(Actor::resident(4));
        assert_eq!(session.actor(), Some(Actor::resident(4)));

        session.flash("Logged out");
        session.sign_out();
        assert_eq!(session.actor(), None);
        assert_eq!(store.len(), 1);
        assert_eq!(session.take_flashes(), vec!["Logged out"]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_sessions_are_not_kept() {
        let store = SessionStore::new();

        for _ in 0..1000 {
            let session = store.handle(Uuid::new_v4());
            assert_eq!(session.actor(), None);
            assert!(session.take_flashes().is_empty());
        }
        assert!(store.is_empty());

        for id in 0..1000 {
            let session = store.handle(Uuid::new_v4());
            session.sign_in(Actor::resident(id));
            session.sign_out();
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; barangay_session=abc; other=1"),
        );
        assert_eq!(cookie_value(&headers, "barangay_session"), Some("abc"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
