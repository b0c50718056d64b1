//! Spaced-repetition review engine.
//!
//! Reminders climb a fixed ladder of review intervals. Completing a review
//! advances the stage; finishing the last stage retires the reminder (no
//! terminal state is kept). Status is derived from how far past the review
//! date today is, and is only materialized by the overdue check.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::ReminderSource;
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::storage::{KeyValueStore, StorageError};
use crate::types::{ReminderStatus, ReviewReminder};

/// Day gaps before each successive review.
pub const DEFAULT_INTERVALS: [u32; 5] = [1, 7, 21, 50, 120];

const STORAGE_KEY: &str = "sr-reminders";

/// Review counts over a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

/// What happened to a reminder after a completed review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Advanced to `stage` with the next review on `next_review`.
    Scheduled {
        stage: usize,
        next_review: NaiveDate,
    },
    /// All stages done; the reminder was removed.
    Mastered,
}

/// Owns the active review reminders and the interval table.
#[derive(Debug)]
pub struct SpacedRepetitionEngine<S: KeyValueStore, C: Clock> {
    backend: S,
    clock: C,
    intervals: Vec<u32>,
    reminders: Vec<ReviewReminder>,
}

impl<S: KeyValueStore, C: Clock> SpacedRepetitionEngine<S, C> {
    /// Open the engine with the default interval table.
    pub fn open(backend: S, clock: C) -> Result<Self> {
        Self::with_intervals(backend, clock, DEFAULT_INTERVALS.to_vec())
    }

    /// Open the engine with a custom interval table.
    pub fn with_intervals(backend: S, clock: C, intervals: Vec<u32>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(CoreError::Validation(
                "interval table must not be empty".to_string(),
            ));
        }
        let mut reminders: Vec<ReviewReminder> = match backend.load(STORAGE_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(StorageError::from)?,
            None => Vec::new(),
        };
        // A snapshot written under a longer table could carry stages past the
        // end of this one; clamp to the last stage so the bound holds.
        let last_stage = intervals.len() - 1;
        for reminder in &mut reminders {
            if reminder.stage > last_stage {
                reminder.stage = last_stage;
            }
        }
        Ok(Self {
            backend,
            clock,
            intervals,
            reminders,
        })
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.reminders).map_err(StorageError::from)?;
        self.backend.save(STORAGE_KEY, &json)?;
        Ok(())
    }

    fn find_index(&self, id: &str) -> Result<usize> {
        self.reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("reminder {id} not found")))
    }

    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewReminder> {
        self.reminders.iter()
    }

    /// Put a lesson on the review schedule: stage 0, first review after
    /// `intervals[0]` days. Rejects lessons without an id.
    pub fn add_lesson(&mut self, lesson_id: &str, lesson_title: &str) -> Result<ReviewReminder> {
        if lesson_id.is_empty() {
            return Err(CoreError::Validation(
                "lesson has no id; cannot schedule reviews".to_string(),
            ));
        }
        let today = self.clock.today();
        let reminder = ReviewReminder {
            id: Uuid::new_v4().to_string(),
            lesson_id: lesson_id.to_string(),
            lesson_title: lesson_title.to_string(),
            original_date: today,
            review_date: today + Duration::days(self.intervals[0] as i64),
            stage: 0,
            status: ReminderStatus::Normal,
        };
        self.reminders.push(reminder.clone());
        self.persist()?;
        tracing::debug!(lesson_id, review = %reminder.review_date, "scheduled first review");
        Ok(reminder)
    }

    /// Mark a review done. Advances the stage, or retires the reminder when
    /// the interval table is exhausted.
    pub fn complete_reminder(&mut self, id: &str) -> Result<ReviewOutcome> {
        let index = self.find_index(id)?;
        let next_stage = self.reminders[index].stage + 1;

        if next_stage >= self.intervals.len() {
            let retired = self.reminders.remove(index);
            self.persist()?;
            tracing::info!(lesson_id = %retired.lesson_id, "lesson mastered, reminder retired");
            return Ok(ReviewOutcome::Mastered);
        }

        let next_review = self.clock.today() + Duration::days(self.intervals[next_stage] as i64);
        let reminder = &mut self.reminders[index];
        reminder.stage = next_stage;
        reminder.review_date = next_review;
        reminder.status = ReminderStatus::Normal;
        self.persist()?;
        Ok(ReviewOutcome::Scheduled {
            stage: next_stage,
            next_review,
        })
    }

    /// Defer a review to tomorrow without advancing the stage.
    pub fn reschedule_reminder(&mut self, id: &str) -> Result<NaiveDate> {
        let tomorrow = self.clock.today() + Duration::days(1);
        let index = self.find_index(id)?;
        let reminder = &mut self.reminders[index];
        reminder.review_date = tomorrow;
        reminder.status = ReminderStatus::Normal;
        self.persist()?;
        Ok(tomorrow)
    }

    pub fn delete_reminder(&mut self, id: &str) -> Result<ReviewReminder> {
        let index = self.find_index(id)?;
        let removed = self.reminders.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Cascade hook for lesson deletion: drop every reminder pointing at the
    /// lesson. Returns how many were removed.
    pub fn remove_reminders_for_lesson(&mut self, lesson_id: &str) -> Result<usize> {
        let before = self.reminders.len();
        self.reminders.retain(|r| r.lesson_id != lesson_id);
        let removed = before - self.reminders.len();
        if removed > 0 {
            self.persist()?;
            tracing::debug!(lesson_id, removed, "cascaded reminder removal");
        }
        Ok(removed)
    }

    /// Classify every reminder against today and snooze the badly late ones.
    ///
    /// One day late is a warning; two or more days late marks the reminder
    /// overdue and pushes the review out by the current stage's interval
    /// (it does not advance the stage). A snoozed reminder keeps its overdue
    /// marker until the user completes, reschedules, or deletes it, which
    /// also makes re-running the check without time passing a no-op.
    pub fn check_overdue_reminders(&mut self) -> Result<()> {
        let today = self.clock.today();
        let mut changed = false;

        for reminder in &mut self.reminders {
            let days_late = (today - reminder.review_date).num_days();
            match days_late {
                d if d >= 2 => {
                    reminder.status = ReminderStatus::Overdue;
                    reminder.review_date =
                        today + Duration::days(self.intervals[reminder.stage] as i64);
                    changed = true;
                }
                1 => {
                    if reminder.status != ReminderStatus::Warning {
                        reminder.status = ReminderStatus::Warning;
                        changed = true;
                    }
                }
                _ => {
                    if reminder.status == ReminderStatus::Warning {
                        reminder.status = ReminderStatus::Normal;
                        changed = true;
                    }
                }
            }
        }

        if changed {
            self.persist()?;
        }
        Ok(())
    }

    /// Reminders whose review falls on the given calendar day.
    pub fn reminders_for_date(&self, day: NaiveDate) -> Vec<ReviewReminder> {
        self.reminders
            .iter()
            .filter(|r| r.review_date == day)
            .cloned()
            .collect()
    }

    /// Reminders due today or earlier.
    pub fn due(&self) -> Vec<ReviewReminder> {
        let today = self.clock.today();
        self.reminders
            .iter()
            .filter(|r| r.review_date <= today)
            .cloned()
            .collect()
    }

    /// Future reminders, soonest first.
    pub fn upcoming(&self) -> Vec<ReviewReminder> {
        let today = self.clock.today();
        let mut upcoming: Vec<ReviewReminder> = self
            .reminders
            .iter()
            .filter(|r| r.review_date > today)
            .cloned()
            .collect();
        upcoming.sort_by_key(|r| r.review_date);
        upcoming
    }

    /// Review counts for a reporting window.
    ///
    /// `completed` is an approximation: the stage sum over currently existing
    /// reminders, since each stage advance was one completed review. Retired
    /// reminders no longer exist, so lifetime completions are undercounted,
    /// and the window does not narrow the estimate.
    pub fn review_stats(&self, _start: NaiveDate, _end: NaiveDate) -> ReviewStats {
        let today = self.clock.today();
        ReviewStats {
            completed: self.reminders.iter().map(|r| r.stage).sum(),
            pending: self.reminders.len(),
            overdue: self
                .reminders
                .iter()
                .filter(|r| r.review_date < today)
                .count(),
        }
    }
}

impl<S: KeyValueStore, C: Clock> ReminderSource for SpacedRepetitionEngine<S, C> {
    fn reminders_for_date(&self, day: NaiveDate) -> Vec<ReviewReminder> {
        SpacedRepetitionEngine::reminders_for_date(self, day)
    }

    fn review_stats(&self, start: NaiveDate, end: NaiveDate) -> ReviewStats {
        SpacedRepetitionEngine::review_stats(self, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine_at(
        day: NaiveDate,
    ) -> (
        SpacedRepetitionEngine<MemoryStore, ManualClock>,
        ManualClock,
    ) {
        let clock = ManualClock::at_midnight(day);
        let engine = SpacedRepetitionEngine::open(MemoryStore::new(), clock.clone()).unwrap();
        (engine, clock)
    }

    #[test]
    fn empty_interval_table_is_rejected() {
        let clock = ManualClock::at_midnight(date(2024, 1, 1));
        let err =
            SpacedRepetitionEngine::with_intervals(MemoryStore::new(), clock, Vec::new())
                .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn lesson_without_id_is_rejected() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        let err = engine.add_lesson("", "untitled").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(engine.is_empty());
    }

    #[test]
    fn first_review_lands_one_day_out() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();
        assert_eq!(reminder.stage, 0);
        assert_eq!(reminder.original_date, date(2024, 1, 1));
        assert_eq!(reminder.review_date, date(2024, 1, 2));
        assert_eq!(reminder.status, ReminderStatus::Normal);
    }

    #[test]
    fn completing_walks_the_interval_ladder_and_retires() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();

        // Stage bound holds through every completion; the fifth retires.
        for (completions, expected_stage) in (1..=4).zip(1..=4usize) {
            clock.advance_days(1);
            let outcome = engine.complete_reminder(&reminder.id).unwrap();
            let expected_review = clock.today() + Duration::days(DEFAULT_INTERVALS[expected_stage] as i64);
            assert_eq!(
                outcome,
                ReviewOutcome::Scheduled {
                    stage: expected_stage,
                    next_review: expected_review,
                },
                "after {completions} completions"
            );
            let current = engine.iter().next().unwrap();
            assert!(current.stage < engine.intervals().len());
        }

        let outcome = engine.complete_reminder(&reminder.id).unwrap();
        assert_eq!(outcome, ReviewOutcome::Mastered);
        assert!(engine.is_empty());
    }

    #[test]
    fn completing_from_stage_zero_schedules_seven_days_out() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();
        let outcome = engine.complete_reminder(&reminder.id).unwrap();
        assert_eq!(
            outcome,
            ReviewOutcome::Scheduled {
                stage: 1,
                next_review: date(2024, 1, 8),
            }
        );
    }

    #[test]
    fn completing_unknown_reminder_is_not_found() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        let err = engine.complete_reminder("missing").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn reschedule_defers_to_tomorrow_without_advancing() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();
        clock.advance_days(5);

        let next = engine.reschedule_reminder(&reminder.id).unwrap();
        assert_eq!(next, date(2024, 1, 7));
        let current = engine.iter().next().unwrap();
        assert_eq!(current.stage, 0);
        assert_eq!(current.status, ReminderStatus::Normal);
    }

    #[test]
    fn one_day_late_is_a_warning() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();

        // Review was due on the 2nd; it is now the 3rd.
        clock.advance_days(2);
        engine.check_overdue_reminders().unwrap();

        let current = engine.iter().next().unwrap();
        assert_eq!(current.status, ReminderStatus::Warning);
        assert_eq!(current.review_date, reminder.review_date);
    }

    #[test]
    fn two_days_late_snoozes_by_the_current_stage_interval() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        engine.add_lesson("lesson-1", "Ownership").unwrap();

        // Review was due on the 2nd; it is now the 4th.
        clock.advance_days(3);
        engine.check_overdue_reminders().unwrap();

        let current = engine.iter().next().unwrap();
        assert_eq!(current.status, ReminderStatus::Overdue);
        assert_eq!(current.stage, 0);
        // Snoozed by intervals[0], not advanced to the next stage.
        assert_eq!(current.review_date, date(2024, 1, 5));
    }

    #[test]
    fn overdue_check_is_idempotent() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        engine.add_lesson("lesson-1", "Ownership").unwrap();
        clock.advance_days(3);

        engine.check_overdue_reminders().unwrap();
        let after_first = engine.iter().next().unwrap().clone();

        engine.check_overdue_reminders().unwrap();
        let after_second = engine.iter().next().unwrap().clone();

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn due_today_is_not_late() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        engine.add_lesson("lesson-1", "Ownership").unwrap();
        clock.advance_days(1);
        engine.check_overdue_reminders().unwrap();
        assert_eq!(engine.iter().next().unwrap().status, ReminderStatus::Normal);
    }

    #[test]
    fn warning_clears_after_a_reschedule() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();
        clock.advance_days(2);
        engine.check_overdue_reminders().unwrap();
        assert_eq!(engine.iter().next().unwrap().status, ReminderStatus::Warning);

        engine.reschedule_reminder(&reminder.id).unwrap();
        engine.check_overdue_reminders().unwrap();
        assert_eq!(engine.iter().next().unwrap().status, ReminderStatus::Normal);
    }

    #[test]
    fn cascade_removes_only_the_lessons_reminders() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        engine.add_lesson("lesson-1", "Ownership").unwrap();
        engine.add_lesson("lesson-1", "Ownership again").unwrap();
        engine.add_lesson("lesson-2", "Borrowing").unwrap();

        let removed = engine.remove_reminders_for_lesson("lesson-1").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.iter().next().unwrap().lesson_id, "lesson-2");
    }

    #[test]
    fn reminders_for_date_matches_review_day_only() {
        let (mut engine, _clock) = engine_at(date(2024, 1, 1));
        engine.add_lesson("lesson-1", "Ownership").unwrap();

        assert_eq!(engine.reminders_for_date(date(2024, 1, 2)).len(), 1);
        assert!(engine.reminders_for_date(date(2024, 1, 1)).is_empty());
        assert!(engine.reminders_for_date(date(2024, 1, 3)).is_empty());
    }

    #[test]
    fn due_and_upcoming_partition_the_reminders() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let first = engine.add_lesson("lesson-1", "Ownership").unwrap();
        engine.complete_reminder(&first.id).unwrap(); // review on Jan 8
        engine.add_lesson("lesson-2", "Borrowing").unwrap(); // review on Jan 2

        clock.advance_days(1); // Jan 2
        let due = engine.due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].lesson_id, "lesson-2");

        let upcoming = engine.upcoming();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].lesson_id, "lesson-1");
    }

    #[test]
    fn stats_count_stage_sum_and_overdue() {
        let (mut engine, clock) = engine_at(date(2024, 1, 1));
        let first = engine.add_lesson("lesson-1", "Ownership").unwrap();
        engine.complete_reminder(&first.id).unwrap(); // stage 1
        engine.add_lesson("lesson-2", "Borrowing").unwrap(); // stage 0, due Jan 2

        clock.advance_days(3); // Jan 4: lesson-2 review is in the past
        let stats = engine.review_stats(date(2024, 1, 1), date(2024, 1, 7));
        assert_eq!(
            stats,
            ReviewStats {
                completed: 1,
                pending: 2,
                overdue: 1,
            }
        );
    }

    #[test]
    fn reminders_survive_reopen() {
        let backend = MemoryStore::new();
        let clock = ManualClock::at_midnight(date(2024, 1, 1));
        {
            let mut engine =
                SpacedRepetitionEngine::open(backend.clone(), clock.clone()).unwrap();
            engine.add_lesson("lesson-1", "Ownership").unwrap();
        }
        let engine = SpacedRepetitionEngine::open(backend, clock).unwrap();
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.iter().next().unwrap().lesson_title, "Ownership");
    }

    #[test]
    fn shorter_table_clamps_persisted_stages() {
        let backend = MemoryStore::new();
        let clock = ManualClock::at_midnight(date(2024, 1, 1));
        {
            let mut engine =
                SpacedRepetitionEngine::open(backend.clone(), clock.clone()).unwrap();
            let reminder = engine.add_lesson("lesson-1", "Ownership").unwrap();
            for _ in 0..3 {
                engine.complete_reminder(&reminder.id).unwrap();
            }
        }
        let engine =
            SpacedRepetitionEngine::with_intervals(backend, clock, vec![1, 7]).unwrap();
        assert_eq!(engine.iter().next().unwrap().stage, 1);
    }
}
