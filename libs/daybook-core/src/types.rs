//! Persisted record types shared across the collections.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Free-form journal entry, bucketed under one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    /// Calendar day the entry belongs to, fixed at creation.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub content: String,
}

impl JournalEntry {
    pub fn new(content: impl Into<String>, day: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            date: day,
            created_at,
            content: content.into(),
        }
    }
}

/// Daily goal with a 0-100 progress value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub date: NaiveDate,
    pub text: String,
    pub progress: u8,
    pub completed: bool,
}

impl Goal {
    pub fn new(text: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            id: new_id(),
            date: day,
            text: text.into(),
            progress: 0,
            completed: false,
        }
    }
}

/// Study note, optionally filed under a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

impl Lesson {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        subject_id: Option<String>,
        day: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            date: day,
            created_at,
            title: title.into(),
            content: content.into(),
            subject_id,
        }
    }
}

/// Grouping bucket for lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }
}

/// Scheduled task spanning one or more calendar days.
///
/// A task without times is an all-day task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

impl ScheduledTask {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            start_date,
            end_date,
            start_time,
            end_time,
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start_time.is_none()
    }

    pub fn is_multi_day(&self) -> bool {
        self.start_date != self.end_date
    }

    /// Whether the task is "on" `day`: inclusive on both ends.
    pub fn spans(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Review urgency, derived from the review date and today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Normal,
    Warning,
    Overdue,
}

impl Default for ReminderStatus {
    fn default() -> Self {
        Self::Normal
    }
}

/// Scheduled re-exposure to a lesson on the fixed review-interval ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReminder {
    pub id: String,
    pub lesson_id: String,
    /// Title snapshot taken when the lesson was scheduled; intentionally
    /// not kept in sync with later lesson edits.
    pub lesson_title: String,
    /// Day the lesson entered the review schedule. Immutable.
    pub original_date: NaiveDate,
    /// Day of the next scheduled review.
    pub review_date: NaiveDate,
    /// Index into the interval table; only ever moves forward.
    pub stage: usize,
    pub status: ReminderStatus,
}

/// Goal completion over an inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionRate {
    pub total: usize,
    pub completed: usize,
    pub percentage: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_task_is_not_multi_day() {
        let task = ScheduledTask::new("standup", date(2024, 1, 2), date(2024, 1, 2), None, None);
        assert!(!task.is_multi_day());
        assert!(task.is_all_day());
    }

    #[test]
    fn task_span_is_inclusive() {
        let task = ScheduledTask::new("offsite", date(2024, 1, 1), date(2024, 1, 3), None, None);
        assert!(task.spans(date(2024, 1, 1)));
        assert!(task.spans(date(2024, 1, 2)));
        assert!(task.spans(date(2024, 1, 3)));
        assert!(!task.spans(date(2023, 12, 31)));
        assert!(!task.spans(date(2024, 1, 4)));
    }

    #[test]
    fn reminder_status_serializes_snake_case() {
        let json = serde_json::to_string(&ReminderStatus::Overdue).unwrap();
        assert_eq!(json, r#""overdue""#);
    }
}
