//! Core library for a single-user personal planner: journal entries, daily
//! goals, lessons with spaced-repetition review reminders, and a simple
//! day-scheduler, persisted through a synchronous key-value store.
//!
//! Provides:
//! - Persisted collections with write-through snapshots (`EntityStore`)
//! - The fixed-interval review engine (`SpacedRepetitionEngine`)
//! - Per-day aggregation and month-grid flags (`DayAggregator`, `CalendarIndex`)
//! - An assembled facade over one backend and clock (`Daybook`)

pub mod aggregate;
pub mod app;
pub mod clock;
pub mod error;
pub mod repetition;
pub mod storage;
pub mod store;
pub mod types;

pub use aggregate::{
    CalendarFlags, CalendarIndex, DayAggregator, DaySummary, GoalSource, JournalSource,
    LessonSource, MonthlySummary, ReminderSource, TaskSource, WeeklySummary,
};
pub use app::Daybook;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use repetition::{
    ReviewOutcome, ReviewStats, SpacedRepetitionEngine, DEFAULT_INTERVALS,
};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{
    EntityStore, GoalStore, JournalStore, LessonStore, Record, SubjectStore, TaskStore,
};
pub use types::{
    CompletionRate, Goal, JournalEntry, Lesson, ReminderStatus, ReviewReminder, ScheduledTask,
    Subject,
};
