//! Generic persisted collections and their date queries.
//!
//! `EntityStore` holds one homogeneous collection in memory and writes the
//! whole snapshot through to the key-value backend after every mutation.
//! Collection-specific behavior (date matching, goal progress rules, task
//! validation) lives in per-record impl blocks below.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::aggregate::{GoalSource, JournalSource, LessonSource, TaskSource};
use crate::error::{CoreError, Result};
use crate::storage::{KeyValueStore, StorageError};
use crate::types::{CompletionRate, Goal, JournalEntry, Lesson, ScheduledTask, Subject};

/// A record that can live in an `EntityStore`.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Backend key the collection snapshot is saved under.
    const STORAGE_KEY: &'static str;
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

impl Record for JournalEntry {
    const STORAGE_KEY: &'static str = "journal-entries";
    const KIND: &'static str = "journal entry";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Goal {
    const STORAGE_KEY: &'static str = "goals";
    const KIND: &'static str = "goal";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Lesson {
    const STORAGE_KEY: &'static str = "lessons";
    const KIND: &'static str = "lesson";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Subject {
    const STORAGE_KEY: &'static str = "subjects";
    const KIND: &'static str = "subject";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for ScheduledTask {
    const STORAGE_KEY: &'static str = "scheduled-tasks";
    const KIND: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Persisted collection with create/update/delete/list operations.
pub struct EntityStore<T: Record, S: KeyValueStore> {
    backend: S,
    records: Vec<T>,
}

pub type JournalStore<S> = EntityStore<JournalEntry, S>;
pub type GoalStore<S> = EntityStore<Goal, S>;
pub type LessonStore<S> = EntityStore<Lesson, S>;
pub type SubjectStore<S> = EntityStore<Subject, S>;
pub type TaskStore<S> = EntityStore<ScheduledTask, S>;

impl<T: Record, S: KeyValueStore> EntityStore<T, S> {
    /// Load the saved collection, or start empty if nothing was saved yet.
    pub fn open(backend: S) -> Result<Self> {
        let records = match backend.load(T::STORAGE_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(StorageError::from)?,
            None => Vec::new(),
        };
        Ok(Self { backend, records })
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.records).map_err(StorageError::from)?;
        self.backend.save(T::STORAGE_KEY, &json)?;
        Ok(())
    }

    fn not_found(id: &str) -> CoreError {
        CoreError::NotFound(format!("{} {} not found", T::KIND, id))
    }

    pub fn insert(&mut self, record: T) -> Result<T> {
        self.records.push(record.clone());
        self.persist()?;
        Ok(record)
    }

    /// Apply `f` to the record with `id` and write the collection through.
    pub fn update<F: FnOnce(&mut T)>(&mut self, id: &str, f: F) -> Result<T> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        f(record);
        let updated = record.clone();
        self.persist()?;
        Ok(updated)
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        let removed = self.records.remove(index);
        self.persist()?;
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<S: KeyValueStore> JournalStore<S> {
    pub fn add_entry(
        &mut self,
        content: impl Into<String>,
        day: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<JournalEntry> {
        self.insert(JournalEntry::new(content, day, created_at))
    }

    /// Entries whose calendar day equals `day`.
    pub fn entries_for_date(&self, day: NaiveDate) -> Vec<JournalEntry> {
        self.records.iter().filter(|e| e.date == day).cloned().collect()
    }

    /// Entries within the inclusive `start..=end` day range.
    pub fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<JournalEntry> {
        self.records
            .iter()
            .filter(|e| start <= e.date && e.date <= end)
            .cloned()
            .collect()
    }
}

impl<S: KeyValueStore> GoalStore<S> {
    pub fn add_goal(&mut self, text: impl Into<String>, day: NaiveDate) -> Result<Goal> {
        self.insert(Goal::new(text, day))
    }

    /// Set progress (clamped to 100). Full progress marks the goal completed,
    /// anything less clears the completed flag.
    pub fn set_progress(&mut self, id: &str, progress: u8) -> Result<Goal> {
        let progress = progress.min(100);
        self.update(id, |goal| {
            goal.progress = progress;
            goal.completed = progress == 100;
        })
    }

    /// Flip the completed flag. Completing forces progress to 100;
    /// uncompleting keeps whatever progress was there.
    pub fn toggle(&mut self, id: &str) -> Result<Goal> {
        self.update(id, |goal| {
            goal.completed = !goal.completed;
            if goal.completed {
                goal.progress = 100;
            }
        })
    }

    pub fn goals_for_date(&self, day: NaiveDate) -> Vec<Goal> {
        self.records.iter().filter(|g| g.date == day).cloned().collect()
    }

    /// Completed-vs-total ratio over the inclusive `start..=end` day range.
    pub fn completion_rate(&self, start: NaiveDate, end: NaiveDate) -> CompletionRate {
        let in_range: Vec<&Goal> = self
            .records
            .iter()
            .filter(|g| start <= g.date && g.date <= end)
            .collect();
        let total = in_range.len();
        let completed = in_range.iter().filter(|g| g.completed).count();
        let percentage = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        } else {
            0
        };
        CompletionRate {
            total,
            completed,
            percentage,
        }
    }
}

impl<S: KeyValueStore> LessonStore<S> {
    pub fn add_lesson(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        subject_id: Option<String>,
        day: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<Lesson> {
        self.insert(Lesson::new(title, content, subject_id, day, created_at))
    }

    pub fn lessons_for_date(&self, day: NaiveDate) -> Vec<Lesson> {
        self.records.iter().filter(|l| l.date == day).cloned().collect()
    }

    pub fn lessons_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Lesson> {
        self.records
            .iter()
            .filter(|l| start <= l.date && l.date <= end)
            .cloned()
            .collect()
    }
}

impl<S: KeyValueStore> SubjectStore<S> {
    pub fn add_subject(&mut self, name: impl Into<String>) -> Result<Subject> {
        self.insert(Subject::new(name))
    }
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Add a task after validating its date and time ranges. Timed tasks need
    /// both a start and an end time.
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<ScheduledTask> {
        if end_date < start_date {
            return Err(CoreError::Validation(format!(
                "task ends before it starts: {end_date} < {start_date}"
            )));
        }
        match (start_time, end_time) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(CoreError::Validation(
                    "timed tasks need both a start and an end time".to_string(),
                ));
            }
            (Some(start), Some(end)) if start_date == end_date && end < start => {
                return Err(CoreError::Validation(format!(
                    "task ends before it starts: {end} < {start}"
                )));
            }
            _ => {}
        }
        self.insert(ScheduledTask::new(
            name, start_date, end_date, start_time, end_time,
        ))
    }

    /// Tasks "on" `day`: inclusive range match, so multi-day tasks show up on
    /// every day they span.
    pub fn tasks_for_date(&self, day: NaiveDate) -> Vec<ScheduledTask> {
        self.records.iter().filter(|t| t.spans(day)).cloned().collect()
    }
}

impl<S: KeyValueStore> JournalSource for JournalStore<S> {
    fn entries_for_date(&self, day: NaiveDate) -> Vec<JournalEntry> {
        JournalStore::entries_for_date(self, day)
    }

    fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<JournalEntry> {
        JournalStore::entries_in_range(self, start, end)
    }
}

impl<S: KeyValueStore> GoalSource for GoalStore<S> {
    fn goals_for_date(&self, day: NaiveDate) -> Vec<Goal> {
        GoalStore::goals_for_date(self, day)
    }

    fn completion_rate(&self, start: NaiveDate, end: NaiveDate) -> CompletionRate {
        GoalStore::completion_rate(self, start, end)
    }
}

impl<S: KeyValueStore> LessonSource for LessonStore<S> {
    fn lessons_for_date(&self, day: NaiveDate) -> Vec<Lesson> {
        LessonStore::lessons_for_date(self, day)
    }

    fn lessons_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Lesson> {
        LessonStore::lessons_in_range(self, start, end)
    }
}

impl<S: KeyValueStore> TaskSource for TaskStore<S> {
    fn tasks_for_date(&self, day: NaiveDate) -> Vec<ScheduledTask> {
        TaskStore::tasks_for_date(self, day)
    }
}
