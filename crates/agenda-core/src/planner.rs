//! [`PlannerStore`] — subjects and assignments for all users, filtered per
//! owner at read time.
//!
//! Both lists live in memory and every mutation rewrites them to the backing
//! store in a single batch before returning.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::{Assignment, NewAssignment},
  kv::{KeyValueStore, Persistence, keys},
  prompt::Prompt,
  subject::{NewSubject, Subject},
};

/// Question asked before an assignment is removed.
pub const CONFIRM_REMOVE: &str = "Are you sure you want to delete this assignment?";

pub struct PlannerStore<S> {
  db:          Persistence<S>,
  subjects:    Vec<Subject>,
  assignments: Vec<Assignment>,
}

impl<S: KeyValueStore> PlannerStore<S> {
  /// Load both lists from `db`; absent or unparsable lists start empty.
  pub async fn open(db: Persistence<S>) -> Result<Self> {
    let subjects = db.get_or_default(keys::SUBJECTS).await?;
    let assignments = db.get_or_default(keys::ASSIGNMENTS).await?;
    Ok(Self { db, subjects, assignments })
  }

  /// Write `subjects` and `assignments` in one batch. Callers commit the
  /// lists to `self` only after this succeeds, so memory never runs ahead
  /// of the store.
  async fn flush(&self, subjects: &[Subject], assignments: &[Assignment]) -> Result<()> {
    self
      .db
      .set_batch(vec![
        (keys::SUBJECTS, serde_json::to_value(subjects)?),
        (keys::ASSIGNMENTS, serde_json::to_value(assignments)?),
      ])
      .await?;
    tracing::debug!(
      subjects = subjects.len(),
      assignments = assignments.len(),
      "flushed planner"
    );
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create a subject for `owner_id`. Codes are upper-cased and need not be
  /// unique.
  pub async fn add_subject(&mut self, owner_id: Uuid, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      id: Uuid::new_v4(),
      owner_id,
      name: input.name,
      code: input.code.to_uppercase(),
      term: input.term,
      created_at: Utc::now(),
    };
    let mut subjects = self.subjects.clone();
    subjects.push(subject.clone());
    self.flush(&subjects, &self.assignments).await?;
    self.subjects = subjects;
    Ok(subject)
  }

  /// Create an assignment for `owner_id`.
  ///
  /// Returns [`Error::SubjectNotFound`] unless `input.subject_id` names a
  /// subject owned by the same user.
  pub async fn add_assignment(
    &mut self,
    owner_id: Uuid,
    input: NewAssignment,
  ) -> Result<Assignment> {
    let owns_subject = self
      .subjects
      .iter()
      .any(|s| s.id == input.subject_id && s.owner_id == owner_id);
    if !owns_subject {
      return Err(Error::SubjectNotFound(input.subject_id));
    }

    let assignment = Assignment {
      id: Uuid::new_v4(),
      owner_id,
      subject_id: input.subject_id,
      title: input.title,
      description: input.description,
      due_date: input.due_date,
      priority: input.priority,
      done: false,
      created_at: Utc::now(),
    };
    let mut assignments = self.assignments.clone();
    assignments.push(assignment.clone());
    self.flush(&self.subjects, &assignments).await?;
    self.assignments = assignments;
    Ok(assignment)
  }

  /// Flip the `done` flag. Returns the new value, or `None` (and writes
  /// nothing) if no assignment has that id.
  pub async fn toggle_done(&mut self, assignment_id: Uuid) -> Result<Option<bool>> {
    let mut assignments = self.assignments.clone();
    let Some(assignment) = assignments.iter_mut().find(|a| a.id == assignment_id) else {
      return Ok(None);
    };
    assignment.done = !assignment.done;
    let done = assignment.done;
    self.flush(&self.subjects, &assignments).await?;
    self.assignments = assignments;
    Ok(Some(done))
  }

  /// Remove an assignment after asking `prompt` for confirmation. Returns
  /// whether anything was removed; a declined confirmation changes nothing.
  pub async fn remove_assignment(
    &mut self,
    assignment_id: Uuid,
    prompt: &impl Prompt,
  ) -> Result<bool> {
    if !prompt.confirm(CONFIRM_REMOVE) {
      return Ok(false);
    }
    let assignments: Vec<Assignment> = self
      .assignments
      .iter()
      .filter(|a| a.id != assignment_id)
      .cloned()
      .collect();
    self.flush(&self.subjects, &assignments).await?;
    let removed = assignments.len() != self.assignments.len();
    self.assignments = assignments;
    Ok(removed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Subjects owned by `owner_id`, in insertion order.
  pub fn subjects_for(&self, owner_id: Uuid) -> Vec<&Subject> {
    self.subjects.iter().filter(|s| s.owner_id == owner_id).collect()
  }

  /// Assignments owned by `owner_id` under `subject_id`, in insertion order.
  pub fn assignments_for(&self, owner_id: Uuid, subject_id: Uuid) -> Vec<&Assignment> {
    self
      .assignments
      .iter()
      .filter(|a| a.owner_id == owner_id && a.subject_id == subject_id)
      .collect()
  }

  /// `(id, "CODE - Name")` pairs for the add-assignment subject picker.
  pub fn subject_options(&self, owner_id: Uuid) -> Vec<(Uuid, String)> {
    self
      .subjects_for(owner_id)
      .into_iter()
      .map(|s| (s.id, s.label()))
      .collect()
  }

  pub fn assignment(&self, assignment_id: Uuid) -> Option<&Assignment> {
    self.assignments.iter().find(|a| a.id == assignment_id)
  }
}
