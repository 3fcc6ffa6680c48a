//! Bounded per-session conversation history.
//!
//! Each session has its own mutex; the map-level lock is held only long
//! enough to find or create the handle. Two requests on the same session
//! therefore append in a strict order while different sessions never block
//! each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::core::Turn;

/// Default number of turns kept per session.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

type SessionHandle = Arc<Mutex<Vec<Turn>>>;

/// In-process session store.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    max_turns: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TURNS)
    }
}

impl SessionStore {
    /// Creates a store keeping at most `max_turns` turns per session.
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Generates a fresh session id (UUID v4).
    #[must_use]
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Cap on turns per session.
    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Returns a copy of the session's turns, oldest first.
    ///
    /// Unknown sessions have an empty history.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Vec<Turn> {
        let handle = self.sessions.read().get(session_id).cloned();
        handle.map(|h| h.lock().clone()).unwrap_or_default()
    }

    /// Appends a user/assistant pair, then drops the oldest pairs beyond
    /// the cap.
    ///
    /// Eviction removes whole pairs, so history always opens with a user
    /// turn. An odd cap therefore keeps one turn fewer than it allows.
    pub fn append(&self, session_id: &str, user: Turn, assistant: Turn) {
        let handle = self.handle(session_id);
        let mut turns = handle.lock();
        turns.push(user);
        turns.push(assistant);
        if turns.len() > self.max_turns {
            let excess = (turns.len() - self.max_turns)
                .next_multiple_of(2)
                .min(turns.len());
            turns.drain(..excess);
        }
    }

    /// Number of sessions seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn handle(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(session_id) {
            return Arc::clone(handle);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Vec::new()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TurnRole;
    use proptest::prelude::*;

    #[test]
    fn test_unknown_session_is_empty() {
        let store = SessionStore::default();
        assert!(store.get("nope").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::default();
        store.append("s", Turn::user("hi"), Turn::assistant("hello"));
        store.append("s", Turn::user("order?"), Turn::assistant("shipped"));
        let turns = store.get("s");
        let texts: Vec<&str> = turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello", "order?", "shipped"]);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    fn texts(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_sixth_pair_evicts_the_first() {
        let store = SessionStore::default();
        for i in 0..6 {
            store.append("s", Turn::user(format!("u{i}")), Turn::assistant(format!("a{i}")));
        }
        let turns = store.get("s");
        assert_eq!(
            texts(&turns),
            vec!["u1", "a1", "u2", "a2", "u3", "a3", "u4", "a4", "u5", "a5"]
        );
        assert!(turns
            .chunks(2)
            .all(|p| p[0].role == TurnRole::User && p[1].role == TurnRole::Assistant));
    }

    #[test]
    fn test_odd_cap_evicts_whole_pairs() {
        let store = SessionStore::new(3);
        store.append("s", Turn::user("u0"), Turn::assistant("a0"));
        store.append("s", Turn::user("u1"), Turn::assistant("a1"));
        let turns = store.get("s");
        assert_eq!(texts(&turns), vec!["u1", "a1"]);
        assert_eq!(turns[0].role, TurnRole::User);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::default();
        store.append("a", Turn::user("a1"), Turn::assistant("a2"));
        store.append("b", Turn::user("b1"), Turn::assistant("b2"));
        store.append("b", Turn::user("b3"), Turn::assistant("b4"));
        let before = store.get("b");

        for i in 0..8 {
            store.append("a", Turn::user(format!("more{i}")), Turn::assistant("ok"));
        }

        assert_eq!(store.get("b"), before);
        assert_eq!(texts(&store.get("b")), vec!["b1", "b2", "b3", "b4"]);
        assert_eq!(store.get("a")[0].text, "more3");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_new_session_ids_are_unique_uuids() {
        let a = SessionStore::new_session_id();
        let b = SessionStore::new_session_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_concurrent_appends_are_serialised() {
        let store = Arc::new(SessionStore::new(1000));
        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..25 {
                        store.append(
                            "shared",
                            Turn::user(format!("u{t}-{i}")),
                            Turn::assistant(format!("a{t}-{i}")),
                        );
                    }
                });
            }
        });

        let turns = store.get("shared");
        assert_eq!(turns.len(), 200);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, TurnRole::User);
            assert_eq!(pair[1].role, TurnRole::Assistant);
            assert_eq!(pair[0].text[1..], pair[1].text[1..]);
        }
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_cap(pairs in 0usize..40, cap in 1usize..16) {
            let store = SessionStore::new(cap);
            for i in 0..pairs {
                store.append("s", Turn::user(format!("u{i}")), Turn::assistant(format!("a{i}")));
            }
            let turns = store.get("s");
            prop_assert!(turns.len() <= cap);
            prop_assert_eq!(turns.len(), (pairs * 2).min(cap - cap % 2));
            if let Some(first) = turns.first() {
                prop_assert_eq!(first.role, TurnRole::User);
                prop_assert_eq!(&turns[turns.len() - 1].text, &format!("a{}", pairs - 1));
            }
        }
    }
}
