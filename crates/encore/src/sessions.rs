//! Per-session progress tracking.
//!
//! A session is named by the `x-session-id` header. Each one keeps the id of
//! the report it last produced and a log of scores and practice time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const HIGH_SCORE_ACHIEVEMENT: &str = "Achieved a score of 9 or higher!";
pub const PRACTICE_TIME_ACHIEVEMENT: &str = "Practiced for a total of 20 hours or more!";
pub const CONSISTENCY_ACHIEVEMENT: &str = "Maintained a score of 7 or higher consistently!";

const HIGH_SCORE: f64 = 9.0;
const CONSISTENT_SCORE: f64 = 7.0;
const PRACTICE_MINUTES_GOAL: u64 = 20 * 60;

/// One line of the progress log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEntry {
    pub recorded_at: DateTime<Utc>,
    /// Mean of the visual and audio scores, when the entry came from a report.
    pub score: Option<f64>,
    pub practice_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub current_report: Option<Uuid>,
    pub progress: Vec<ProgressEntry>,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_seen: now,
            current_report: None,
            progress: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.last_seen
    }

    pub fn total_practice_minutes(&self) -> u64 {
        self.progress
            .iter()
            .map(|entry| u64::from(entry.practice_minutes))
            .sum()
    }

    /// Milestones reached so far, in a fixed order.
    pub fn achievements(&self) -> Vec<&'static str> {
        let scores: Vec<f64> = self.progress.iter().filter_map(|e| e.score).collect();
        let mut achievements = Vec::new();

        if scores.iter().any(|&s| s >= HIGH_SCORE) {
            achievements.push(HIGH_SCORE_ACHIEVEMENT);
        }
        if self.total_practice_minutes() >= PRACTICE_MINUTES_GOAL {
            achievements.push(PRACTICE_TIME_ACHIEVEMENT);
        }
        if !scores.is_empty() && scores.iter().all(|&s| s >= CONSISTENT_SCORE) {
            achievements.push(CONSISTENCY_ACHIEVEMENT);
        }
        achievements
    }

    pub fn progress_report(&self) -> ProgressReport {
        ProgressReport {
            session_id: self.id.clone(),
            current_report: self.current_report,
            total_practice_minutes: self.total_practice_minutes(),
            entries: self.progress.clone(),
            achievements: self.achievements(),
        }
    }
}

/// Wire view of a session's progress.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub session_id: String,
    pub current_report: Option<Uuid>,
    pub total_practice_minutes: u64,
    pub entries: Vec<ProgressEntry>,
    pub achievements: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session named by `hint`, creating it if needed. Without a
    /// hint a fresh id is generated.
    #[instrument(skip_all, fields(session_id_hint = ?hint))]
    pub fn get_or_create(&self, hint: Option<&str>) -> String {
        match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(id) => match self.sessions.entry(id.to_string()) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().touch();
                    debug!(session_id = %id, "Resumed session");
                    id.to_string()
                }
                Entry::Vacant(entry) => {
                    entry.insert(Session::new(id.to_string()));
                    info!(session_id = %id, "Created session with client-supplied id");
                    id.to_string()
                }
            },
            None => {
                let id = Uuid::new_v4().to_string();
                self.sessions.insert(id.clone(), Session::new(id.clone()));
                info!(session_id = %id, "Created new session");
                id
            }
        }
    }

    /// Remember a freshly graded report and log its score.
    #[instrument(skip(self, session_id), fields(session_id = %session_id))]
    pub fn record_report(&self, session_id: &str, report_id: Uuid, score: f64) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.touch();
            session.current_report = Some(report_id);
            session.progress.push(ProgressEntry {
                recorded_at: Utc::now(),
                score: Some(score),
                practice_minutes: 0,
                report_id: Some(report_id),
            });
        }
    }

    /// Log practice time, optionally with a self-reported score.
    #[instrument(skip(self, session_id), fields(session_id = %session_id))]
    pub fn log_practice(
        &self,
        session_id: &str,
        minutes: u32,
        score: Option<f64>,
    ) -> Option<ProgressEntry> {
        let mut session = self.sessions.get_mut(session_id)?;
        session.touch();
        let entry = ProgressEntry {
            recorded_at: Utc::now(),
            score,
            practice_minutes: minutes,
            report_id: None,
        };
        session.progress.push(entry.clone());
        info!(
            minutes,
            total = session.total_practice_minutes(),
            "Practice logged"
        );
        Some(entry)
    }

    pub fn progress(&self, session_id: &str) -> Option<ProgressReport> {
        self.sessions
            .get(session_id)
            .map(|session| session.progress_report())
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let max_idle = TimeDelta::from_std(max_idle).unwrap_or(TimeDelta::MAX);
        let now = Utc::now();
        let before = self.sessions.len();

        self.sessions
            .retain(|_, session| session.idle_for(now) <= max_idle);

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!(
                removed,
                remaining = self.sessions.len(),
                "Session cleanup completed"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically drop stale sessions until `cancel` fires.
pub fn spawn_cleanup_task(
    store: SessionStore,
    interval: Duration,
    max_idle: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session cleanup task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    store.cleanup(max_idle);
                }
            }
        }
    })
}
