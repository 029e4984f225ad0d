/// Session-scoped store for the latest analysis report.
///
/// A follow-up query (the chat collaborator) must be answered from the report
/// of the same session that uploaded the sheet, never from another user's
/// upload. Reports are therefore keyed by `SessionId`; within one session
/// the last stored report wins.
///
/// Entries expire `ttl` after they were stored, and the store holds at most
/// `max_sessions` entries, evicting the oldest first.
///
/// # Clock injection
/// The `*_at` methods take `now` explicitly so expiry is deterministic in
/// tests; `put` and `get` are wrappers over the real clock.

use crate::config::AnalysisConfig;
use crate::logging::{self, Component};
use crate::model::AnalysisReport;
use crate::summary;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Opaque token identifying one client session or request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        SessionId(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(token: &str) -> Self {
        SessionId::new(token)
    }
}

struct Entry {
    report: Arc<AnalysisReport>,
    stored_at: DateTime<Utc>,
}

pub struct ResultStore {
    ttl: Duration,
    max_sessions: usize,
    entries: Mutex<HashMap<SessionId, Entry>>,
}

impl ResultStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            ttl,
            max_sessions: max_sessions.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(Duration::minutes(config.cache_ttl_minutes), config.cache_max_sessions)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.stored_at > self.ttl
    }

    /// Stores `report` as the latest result of `session`, replacing any
    /// previous one for that session only.
    pub fn put_at(
        &self,
        session: &SessionId,
        report: AnalysisReport,
        now: DateTime<Utc>,
    ) -> Arc<AnalysisReport> {
        let report = Arc::new(report);
        let mut entries = self.lock();

        if !entries.contains_key(session) && entries.len() >= self.max_sessions {
            entries.retain(|_, e| now - e.stored_at <= self.ttl);
            if entries.len() >= self.max_sessions {
                let oldest = entries
                    .iter()
                    .min_by_key(|(id, e)| (e.stored_at, (*id).clone()))
                    .map(|(id, _)| id.clone());
                if let Some(oldest) = oldest {
                    logging::debug(
                        Component::Store,
                        None,
                        &format!("evicting session {} at capacity", oldest.as_str()),
                    );
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            session.clone(),
            Entry {
                report: Arc::clone(&report),
                stored_at: now,
            },
        );
        report
    }

    /// Latest unexpired report of `session`.
    pub fn get_at(&self, session: &SessionId, now: DateTime<Utc>) -> Option<Arc<AnalysisReport>> {
        let mut entries = self.lock();
        match entries.get(session) {
            Some(entry) if !self.is_expired(entry, now) => return Some(Arc::clone(&entry.report)),
            Some(_) => {}
            None => return None,
        }
        entries.remove(session);
        None
    }

    pub fn put(&self, session: &SessionId, report: AnalysisReport) -> Arc<AnalysisReport> {
        self.put_at(session, report, Utc::now())
    }

    pub fn get(&self, session: &SessionId) -> Option<Arc<AnalysisReport>> {
        self.get_at(session, Utc::now())
    }

    /// Drops every expired entry; returns how many were dropped.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now - e.stored_at <= self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text summary of the session's latest report, for the chat collaborator.
    pub fn context_for_at(&self, session: &SessionId, now: DateTime<Utc>) -> Option<String> {
        self.get_at(session, now).map(|report| summary::summarize_report(&report))
    }

    pub fn context_for(&self, session: &SessionId) -> Option<String> {
        self.context_for_at(session, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
