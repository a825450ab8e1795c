use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, TryLockError};

use chrono::{DateTime, Duration, Utc};
use intake_core::config::SessionConfig;
use intake_core::{EmotionResult, Session, Speaker, Turn};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;

type SharedSession = Arc<Mutex<Session>>;

/// A freshly appended turn with the history it was appended to.
#[derive(Debug, Clone)]
pub struct Appended {
    pub turn: Turn,
    /// Turns before `turn`; `prior.len() == turn.sequence`.
    pub prior: Vec<Turn>,
    pub language: String,
}

fn push_turn(
    session: &mut Session,
    speaker: Speaker,
    text: String,
    emotion: Option<EmotionResult>,
) -> Turn {
    let now = Utc::now();
    let timestamp = session
        .turns
        .last()
        .map_or(now, |prev| prev.timestamp.max(now));
    let turn = Turn {
        sequence: session.turns.len() as u64,
        speaker,
        text,
        timestamp,
        emotion,
    };
    session.turns.push(turn.clone());
    session.last_activity_at = timestamp;

    debug!(
        session_id = %session.id,
        sequence = turn.sequence,
        speaker = speaker.as_str(),
        "Turn appended"
    );
    turn
}

/// Concurrency-safe owner of every live session.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store holding at most `max_sessions` live sessions.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_sessions)
    }

    /// Create an empty session and return its id.
    pub fn create_session(
        &self,
        language: &str,
        patient_info: serde_json::Value,
    ) -> Result<Uuid, SessionError> {
        let session = Session::new(language, patient_info);
        let id = session.id;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        if sessions.len() >= self.max_sessions {
            return Err(SessionError::CapacityReached(self.max_sessions));
        }
        sessions.insert(id, Arc::new(Mutex::new(session)));
        drop(sessions);

        info!(session_id = %id, language, "Session created");
        Ok(id)
    }

    /// Look up a session handle. The map lock is released before returning.
    fn entry(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        sessions.get(&id).cloned().ok_or(SessionError::NotFound(id))
    }

    /// Append a turn after every existing turn and return it.
    ///
    /// The timestamp never precedes the previous turn's, even if the wall
    /// clock steps backwards.
    pub fn append_turn(
        &self,
        id: Uuid,
        speaker: Speaker,
        text: impl Into<String>,
        emotion: Option<EmotionResult>,
    ) -> Result<Turn, SessionError> {
        let handle = self.entry(id)?;
        let mut session = handle
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        Ok(push_turn(&mut session, speaker, text.into(), emotion))
    }

    /// Append a turn and, under the same lock, capture the turns that
    /// preceded it and the session language.
    pub fn append_with_history(
        &self,
        id: Uuid,
        speaker: Speaker,
        text: impl Into<String>,
        emotion: Option<EmotionResult>,
    ) -> Result<Appended, SessionError> {
        let handle = self.entry(id)?;
        let mut session = handle
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        let prior = session.turns.clone();
        let turn = push_turn(&mut session, speaker, text.into(), emotion);
        Ok(Appended {
            turn,
            prior,
            language: session.language.clone(),
        })
    }

    /// Snapshot of a session's turns in order.
    pub fn get_history(&self, id: Uuid) -> Result<Vec<Turn>, SessionError> {
        let handle = self.entry(id)?;
        let session = handle
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        Ok(session.turns.clone())
    }

    /// Snapshot of the whole session.
    pub fn get_session(&self, id: Uuid) -> Result<Session, SessionError> {
        let handle = self.entry(id)?;
        let session = handle
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        Ok(session.clone())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entry(id).is_ok()
    }

    pub fn delete_session(&self, id: Uuid) -> Result<(), SessionError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Remove sessions idle for longer than `ttl`. Returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> Result<usize, SessionError> {
        self.purge_expired_at(Utc::now(), ttl)
    }

    /// As [`purge_expired`](Self::purge_expired), measured from `now`.
    ///
    /// A session whose mutex is currently held is in use and is kept.
    pub fn purge_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, SessionError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))?;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => now - session.last_activity_at <= ttl,
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired sessions purged");
        }
        Ok(removed)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{AlertLevel, PrimaryEmotion, Sentiment, VaderScores};
    use serde_json::json;

    fn emotion() -> EmotionResult {
        EmotionResult {
            primary_emotion: PrimaryEmotion::Anxious,
            sentiment: Sentiment::Negative,
            sentiment_score: 0.4,
            alert_level: AlertLevel::Low,
            vader_scores: VaderScores::default(),
            vader_description: "Patient expresses mild concern".into(),
            recommendations: vec![],
        }
    }

    #[test]
    fn test_create_session_is_empty() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({})).unwrap();
        assert!(store.get_history(id).unwrap().is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.contains(id));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let store = SessionStore::default();
        let a = store.create_session("en-US", json!({})).unwrap();
        let b = store.create_session("en-US", json!({})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_append_preserves_order_and_sequence() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({})).unwrap();
        store
            .append_turn(id, Speaker::Patient, "I have a headache", Some(emotion()))
            .unwrap();
        store
            .append_turn(id, Speaker::Doctor, "Where does it hurt?", None)
            .unwrap();
        let third = store
            .append_turn(id, Speaker::Patient, "Behind my eyes", Some(emotion()))
            .unwrap();
        assert_eq!(third.sequence, 2);

        let history = store.get_history(id).unwrap();
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["I have a headache", "Where does it hurt?", "Behind my eyes"]);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(history[1].emotion.is_none());
    }

    #[test]
    fn test_append_refreshes_last_activity() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({})).unwrap();
        let turn = store.append_turn(id, Speaker::Patient, "hello", None).unwrap();
        let session = store.get_session(id).unwrap();
        assert_eq!(session.last_activity_at, turn.timestamp);
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        assert!(matches!(store.get_history(id), Err(SessionError::NotFound(_))));
        assert!(matches!(
            store.append_turn(id, Speaker::Patient, "x", None),
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(store.delete_session(id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({})).unwrap();
        store.append_turn(id, Speaker::Patient, "one", None).unwrap();
        let snapshot = store.get_history(id).unwrap();
        store.append_turn(id, Speaker::Patient, "two", None).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get_history(id).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_session() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({"age": 30})).unwrap();
        store.delete_session(id).unwrap();
        assert!(!store.contains(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity_limit() {
        let store = SessionStore::new(2);
        store.create_session("en-US", json!({})).unwrap();
        store.create_session("en-US", json!({})).unwrap();
        let result = store.create_session("en-US", json!({}));
        assert!(matches!(result, Err(SessionError::CapacityReached(2))));
    }

    #[test]
    fn test_purge_expired_removes_every_idle_session() {
        let store = SessionStore::default();
        let idle = store.create_session("en-US", json!({})).unwrap();
        let active = store.create_session("en-US", json!({})).unwrap();

        let ttl = Duration::minutes(120);
        assert_eq!(store.purge_expired(ttl).unwrap(), 0);

        // Three hours from now, both are idle past the TTL.
        let later = Utc::now() + Duration::hours(3);
        store.append_turn(active, Speaker::Patient, "still here", None).unwrap();
        assert_eq!(store.purge_expired_at(later, ttl).unwrap(), 2);
        assert!(!store.contains(idle));
        assert!(!store.contains(active));
    }

    #[test]
    fn test_purge_keeps_recent_sessions() {
        let store = SessionStore::default();
        let id = store.create_session("en-US", json!({})).unwrap();
        let soon = Utc::now() + Duration::minutes(30);
        assert_eq!(store.purge_expired_at(soon, Duration::minutes(120)).unwrap(), 0);
        assert!(store.contains(id));
    }

    #[test]
    fn test_concurrent_appends_keep_every_turn() {
        let store = Arc::new(SessionStore::default());
        let id = store.create_session("en-US", json!({})).unwrap();
        let other = store.create_session("en-US", json!({})).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..25 {
                        let target = if worker % 2 == 0 { id } else { other };
                        store
                            .append_turn(target, Speaker::Patient, format!("{worker}-{i}"), None)
                            .unwrap();
                    }
                });
            }
        });

        for sid in [id, other] {
            let history = store.get_history(sid).unwrap();
            assert_eq!(history.len(), 100);
            for (i, turn) in history.iter().enumerate() {
                assert_eq!(turn.sequence, i as u64);
            }
            assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }

    #[test]
    fn test_append_with_history_returns_preceding_turns() {
        let store = SessionStore::default();
        let id = store.create_session("hi-IN", json!({})).unwrap();
        store.append_turn(id, Speaker::Patient, "one", None).unwrap();
        let appended = store
            .append_with_history(id, Speaker::Doctor, "two", None)
            .unwrap();
        assert_eq!(appended.turn.sequence, 1);
        assert_eq!(appended.prior.len(), 1);
        assert_eq!(appended.prior[0].text, "one");
        assert_eq!(appended.language, "hi-IN");
    }

    #[test]
    fn test_interleaved_appends_see_consistent_history() {
        let store = Arc::new(SessionStore::default());
        let id = store.create_session("en-US", json!({})).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..25 {
                        let text = format!("{worker}-{i}");
                        let appended = store
                            .append_with_history(id, Speaker::Patient, text.clone(), None)
                            .unwrap();
                        assert_eq!(appended.prior.len() as u64, appended.turn.sequence);
                        assert!(appended.prior.iter().all(|t| t.text != text));
                    }
                });
            }
        });
        assert_eq!(store.get_history(id).unwrap().len(), 200);
    }

    #[test]
    fn test_locked_session_does_not_block_another() {
        let store = SessionStore::default();
        let a = store.create_session("en-US", json!({})).unwrap();
        let b = store.create_session("en-US", json!({})).unwrap();

        let handle_a = store.entry(a).unwrap();
        let guard = handle_a.lock().unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            let store = &store;
            scope.spawn(move || {
                let sequence = store
                    .append_turn(b, Speaker::Patient, "hello", None)
                    .map(|t| t.sequence);
                let _ = tx.send(sequence);
            });
            let sequence = rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("append to b stalled behind a");
            assert_eq!(sequence.unwrap(), 0);
            assert!(handle_a.try_lock().is_err());
        });

        drop(guard);
        assert_eq!(store.get_history(b).unwrap().len(), 1);
        assert!(store.get_history(a).unwrap().is_empty());
    }
}
