//! `Daybook` wires the five collections and the review engine over one
//! shared backend and clock, and carries the cross-collection rules the
//! pieces cannot enforce alone (reminder cascade on lesson deletion, the
//! periodic overdue tick).

use chrono::{NaiveDate, NaiveTime};

use crate::aggregate::{
    CalendarFlags, CalendarIndex, DayAggregator, DaySummary, MonthlySummary, WeeklySummary,
};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::repetition::{ReviewOutcome, SpacedRepetitionEngine};
use crate::storage::KeyValueStore;
use crate::store::{GoalStore, JournalStore, LessonStore, SubjectStore, TaskStore};
use crate::types::{Goal, JournalEntry, Lesson, ReviewReminder, ScheduledTask, Subject};

/// The assembled application core.
pub struct Daybook<S: KeyValueStore + Clone, C: Clock + Clone> {
    clock: C,
    journal: JournalStore<S>,
    goals: GoalStore<S>,
    lessons: LessonStore<S>,
    subjects: SubjectStore<S>,
    tasks: TaskStore<S>,
    repetition: SpacedRepetitionEngine<S, C>,
}

impl<S: KeyValueStore + Clone, C: Clock + Clone> Daybook<S, C> {
    /// Load every collection from the shared backend.
    pub fn open(backend: S, clock: C) -> Result<Self> {
        Ok(Self {
            journal: JournalStore::open(backend.clone())?,
            goals: GoalStore::open(backend.clone())?,
            lessons: LessonStore::open(backend.clone())?,
            subjects: SubjectStore::open(backend.clone())?,
            tasks: TaskStore::open(backend.clone())?,
            repetition: SpacedRepetitionEngine::open(backend, clock.clone())?,
            clock,
        })
    }

    pub fn journal(&self) -> &JournalStore<S> {
        &self.journal
    }

    pub fn goals(&self) -> &GoalStore<S> {
        &self.goals
    }

    pub fn lessons(&self) -> &LessonStore<S> {
        &self.lessons
    }

    pub fn subjects(&self) -> &SubjectStore<S> {
        &self.subjects
    }

    pub fn tasks(&self) -> &TaskStore<S> {
        &self.tasks
    }

    pub fn repetition(&self) -> &SpacedRepetitionEngine<S, C> {
        &self.repetition
    }

    // ----- journal -----

    pub fn add_journal_entry(&mut self, content: &str, day: NaiveDate) -> Result<JournalEntry> {
        self.journal.add_entry(content, day, self.clock.now())
    }

    pub fn edit_journal_entry(&mut self, id: &str, content: &str) -> Result<JournalEntry> {
        self.journal.update(id, |entry| entry.content = content.to_string())
    }

    pub fn delete_journal_entry(&mut self, id: &str) -> Result<JournalEntry> {
        self.journal.remove(id)
    }

    // ----- goals -----

    pub fn add_goal(&mut self, text: &str, day: NaiveDate) -> Result<Goal> {
        self.goals.add_goal(text, day)
    }

    pub fn set_goal_progress(&mut self, id: &str, progress: u8) -> Result<Goal> {
        self.goals.set_progress(id, progress)
    }

    pub fn toggle_goal(&mut self, id: &str) -> Result<Goal> {
        self.goals.toggle(id)
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<Goal> {
        self.goals.remove(id)
    }

    // ----- subjects and lessons -----

    pub fn add_subject(&mut self, name: &str) -> Result<Subject> {
        self.subjects.add_subject(name)
    }

    pub fn add_lesson(
        &mut self,
        title: &str,
        content: &str,
        subject_id: Option<&str>,
        day: NaiveDate,
    ) -> Result<Lesson> {
        if let Some(subject_id) = subject_id {
            if self.subjects.get(subject_id).is_none() {
                return Err(CoreError::NotFound(format!(
                    "subject {subject_id} not found"
                )));
            }
        }
        self.lessons.add_lesson(
            title,
            content,
            subject_id.map(str::to_string),
            day,
            self.clock.now(),
        )
    }

    /// Delete a lesson and cascade away its review reminders.
    pub fn delete_lesson(&mut self, id: &str) -> Result<Lesson> {
        let lesson = self.lessons.remove(id)?;
        self.repetition.remove_reminders_for_lesson(&lesson.id)?;
        Ok(lesson)
    }

    /// Put an existing lesson on the spaced-repetition schedule.
    pub fn schedule_review(&mut self, lesson_id: &str) -> Result<ReviewReminder> {
        let (id, title) = match self.lessons.get(lesson_id) {
            Some(lesson) => (lesson.id.clone(), lesson.title.clone()),
            None => {
                return Err(CoreError::NotFound(format!("lesson {lesson_id} not found")));
            }
        };
        self.repetition.add_lesson(&id, &title)
    }

    // ----- tasks -----

    pub fn add_task(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<ScheduledTask> {
        self.tasks.add_task(name, start_date, end_date, start_time, end_time)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<ScheduledTask> {
        self.tasks.remove(id)
    }

    // ----- reminders -----

    pub fn complete_reminder(&mut self, id: &str) -> Result<ReviewOutcome> {
        self.repetition.complete_reminder(id)
    }

    pub fn reschedule_reminder(&mut self, id: &str) -> Result<NaiveDate> {
        self.repetition.reschedule_reminder(id)
    }

    pub fn delete_reminder(&mut self, id: &str) -> Result<ReviewReminder> {
        self.repetition.delete_reminder(id)
    }

    /// Periodic maintenance body: re-run the idempotent overdue check.
    /// Safe to call on any coarse timer or at session start.
    pub fn tick(&mut self) -> Result<()> {
        self.repetition.check_overdue_reminders()
    }

    // ----- read side -----

    fn aggregator(&self) -> DayAggregator<'_> {
        DayAggregator::new(
            &self.journal,
            &self.goals,
            &self.lessons,
            &self.tasks,
            &self.repetition,
        )
    }

    pub fn day_summary(&self, day: NaiveDate) -> DaySummary {
        self.aggregator().day_summary(day)
    }

    pub fn calendar_flags(&self, day: NaiveDate) -> CalendarFlags {
        self.aggregator().calendar_flags(day)
    }

    pub fn month_flags(&self, year: i32, month: u32) -> Vec<(NaiveDate, CalendarFlags)> {
        let aggregator = self.aggregator();
        CalendarIndex::new(&aggregator).month(year, month)
    }

    pub fn weekly_summary(&self) -> WeeklySummary {
        self.aggregator().weekly_summary(self.clock.today())
    }

    pub fn monthly_summary(&self) -> MonthlySummary {
        self.aggregator().monthly_summary(self.clock.today())
    }
}
