//! Read-only, point-in-time aggregation keyed by calendar date.
//!
//! `DayAggregator` joins the independent collections into one per-day
//! snapshot; `CalendarIndex` derives the month-grid presence flags from the
//! same queries. Everything here is a total function: empty collections
//! yield empty lists and zero-valued aggregates.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::clock::{month_of, week_of};
use crate::repetition::ReviewStats;
use crate::types::{
    CompletionRate, Goal, JournalEntry, Lesson, ReminderStatus, ReviewReminder, ScheduledTask,
};

/// Journal collaborator contract.
pub trait JournalSource {
    fn entries_for_date(&self, day: NaiveDate) -> Vec<JournalEntry>;
    fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<JournalEntry>;
}

/// Goals collaborator contract.
pub trait GoalSource {
    fn goals_for_date(&self, day: NaiveDate) -> Vec<Goal>;
    fn completion_rate(&self, start: NaiveDate, end: NaiveDate) -> CompletionRate;
}

/// Lessons collaborator contract.
pub trait LessonSource {
    fn lessons_for_date(&self, day: NaiveDate) -> Vec<Lesson>;
    fn lessons_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Lesson>;
}

/// Task collaborator contract (inclusive range match for multi-day tasks).
pub trait TaskSource {
    fn tasks_for_date(&self, day: NaiveDate) -> Vec<ScheduledTask>;
}

/// Review-reminder collaborator contract.
pub trait ReminderSource {
    fn reminders_for_date(&self, day: NaiveDate) -> Vec<ReviewReminder>;
    fn review_stats(&self, start: NaiveDate, end: NaiveDate) -> ReviewStats;
}

/// Ephemeral snapshot of everything relevant to one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub journal: Vec<JournalEntry>,
    pub goals: Vec<Goal>,
    /// Rounded mean of the day's goal progress; 0 when the day has no goals.
    pub goal_progress: u8,
    pub lessons: Vec<Lesson>,
    pub tasks: Vec<ScheduledTask>,
    pub reminders: Vec<ReviewReminder>,
}

/// Presence flags for decorating one cell of a month grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalendarFlags {
    pub has_journal: bool,
    pub has_goal: bool,
    pub has_lesson: bool,
    pub has_task: bool,
    pub has_multi_day_task: bool,
    pub has_reminder: bool,
    pub has_overdue_reminder: bool,
}

/// Week rollup combining review stats and goal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reviews: ReviewStats,
    pub goals: CompletionRate,
}

/// Month rollup; additionally counts journal entries and lessons created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reviews: ReviewStats,
    pub goals: CompletionRate,
    pub journal_entries: usize,
    pub lessons_created: usize,
}

/// Rounded mean of goal progress, 0 for no goals. Used wherever a day's
/// overall progress is shown.
pub fn aggregate_progress(goals: &[Goal]) -> u8 {
    if goals.is_empty() {
        return 0;
    }
    let total: u32 = goals.iter().map(|g| g.progress as u32).sum();
    (total as f64 / goals.len() as f64).round() as u8
}

/// Read-side join over the five collaborators. Owns no data; every call
/// recomputes from the current collections.
pub struct DayAggregator<'a> {
    journal: &'a dyn JournalSource,
    goals: &'a dyn GoalSource,
    lessons: &'a dyn LessonSource,
    tasks: &'a dyn TaskSource,
    reminders: &'a dyn ReminderSource,
}

impl<'a> DayAggregator<'a> {
    pub fn new(
        journal: &'a dyn JournalSource,
        goals: &'a dyn GoalSource,
        lessons: &'a dyn LessonSource,
        tasks: &'a dyn TaskSource,
        reminders: &'a dyn ReminderSource,
    ) -> Self {
        Self {
            journal,
            goals,
            lessons,
            tasks,
            reminders,
        }
    }

    /// Everything on `day`, under each collection's own date-matching rule.
    pub fn day_summary(&self, day: NaiveDate) -> DaySummary {
        let goals = self.goals.goals_for_date(day);
        DaySummary {
            date: day,
            journal: self.journal.entries_for_date(day),
            goal_progress: aggregate_progress(&goals),
            goals,
            lessons: self.lessons.lessons_for_date(day),
            tasks: self.tasks.tasks_for_date(day),
            reminders: self.reminders.reminders_for_date(day),
        }
    }

    /// Presence flags for `day`, without materializing full content.
    pub fn calendar_flags(&self, day: NaiveDate) -> CalendarFlags {
        let tasks = self.tasks.tasks_for_date(day);
        let reminders = self.reminders.reminders_for_date(day);
        CalendarFlags {
            has_journal: !self.journal.entries_for_date(day).is_empty(),
            has_goal: !self.goals.goals_for_date(day).is_empty(),
            has_lesson: !self.lessons.lessons_for_date(day).is_empty(),
            has_task: !tasks.is_empty(),
            has_multi_day_task: tasks.iter().any(|t| t.is_multi_day()),
            has_reminder: !reminders.is_empty(),
            has_overdue_reminder: reminders
                .iter()
                .any(|r| r.status == ReminderStatus::Overdue),
        }
    }

    /// Rollup for the Sunday-to-Saturday week containing `today`.
    pub fn weekly_summary(&self, today: NaiveDate) -> WeeklySummary {
        let (start, end) = week_of(today);
        WeeklySummary {
            start,
            end,
            reviews: self.reminders.review_stats(start, end),
            goals: self.goals.completion_rate(start, end),
        }
    }

    /// Rollup for the month containing `today`.
    pub fn monthly_summary(&self, today: NaiveDate) -> MonthlySummary {
        let (start, end) = month_of(today);
        MonthlySummary {
            start,
            end,
            reviews: self.reminders.review_stats(start, end),
            goals: self.goals.completion_rate(start, end),
            journal_entries: self.journal.entries_in_range(start, end).len(),
            lessons_created: self.lessons.lessons_in_range(start, end).len(),
        }
    }
}

/// Month-grid decorator over a `DayAggregator`.
pub struct CalendarIndex<'a> {
    aggregator: &'a DayAggregator<'a>,
}

impl<'a> CalendarIndex<'a> {
    pub fn new(aggregator: &'a DayAggregator<'a>) -> Self {
        Self { aggregator }
    }

    /// Flags for every day of the given month, in order.
    pub fn month(&self, year: i32, month: u32) -> Vec<(NaiveDate, CalendarFlags)> {
        let mut days = Vec::new();
        let Some(mut day) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return days;
        };
        while day.month() == month {
            days.push((day, self.aggregator.calendar_flags(day)));
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}
