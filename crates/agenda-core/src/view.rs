//! Read-only projection of the session and planner into what the user sees.
//!
//! Never stored, always derived. Urgency is a display hint only.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  assignment::{Assignment, Priority},
  kv::KeyValueStore,
  planner::PlannerStore,
  subject::Subject,
  user::Session,
};

pub const NO_SUBJECTS: &str = "No subjects yet. Add your first subject.";
pub const NO_ASSIGNMENTS: &str = "No assignments";
pub const NO_DESCRIPTION: &str = "No description";

/// Days a due date lies beyond `today`; negative once it has passed.
pub fn days_remaining(due_date: NaiveDate, today: NaiveDate) -> i64 {
  due_date.signed_duration_since(today).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
  Normal,
  /// Due today or within the next three days.
  Upcoming,
  Overdue,
}

impl Urgency {
  pub fn classify(days_remaining: i64) -> Self {
    match days_remaining {
      d if d < 0 => Self::Overdue,
      0..=3 => Self::Upcoming,
      _ => Self::Normal,
    }
  }
}

/// A user-triggerable action attached to a rendered assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum Action {
  ToggleDone(Uuid),
  Remove(Uuid),
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRow {
  pub id:             Uuid,
  pub title:          String,
  /// The description, or [`NO_DESCRIPTION`].
  pub description:    String,
  pub due_date:       NaiveDate,
  pub days_remaining: i64,
  pub urgency:        Urgency,
  pub priority:       Priority,
  pub done:           bool,
  pub actions:        [Action; 2],
}

impl AssignmentRow {
  fn build(a: &Assignment, today: NaiveDate) -> Self {
    let days = days_remaining(a.due_date, today);
    Self {
      id:             a.id,
      title:          a.title.clone(),
      description:    if a.description.is_empty() {
        NO_DESCRIPTION.to_owned()
      } else {
        a.description.clone()
      },
      due_date:       a.due_date,
      days_remaining: days,
      urgency:        Urgency::classify(days),
      priority:       a.priority.clone(),
      done:           a.done,
      actions:        [Action::ToggleDone(a.id), Action::Remove(a.id)],
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectCard {
  pub id:          Uuid,
  pub name:        String,
  pub code:        String,
  pub term:        String,
  /// Empty means "show [`NO_ASSIGNMENTS`]".
  pub assignments: Vec<AssignmentRow>,
}

/// The authenticated screen.
#[derive(Debug, Clone, Serialize)]
pub struct PlannerView {
  /// Identifier of the logged-in user, shown in the header.
  pub identifier: String,
  /// Picker entries for the add-assignment form.
  pub options:    Vec<(Uuid, String)>,
  /// Empty means "show [`NO_SUBJECTS`]".
  pub subjects:   Vec<SubjectCard>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "lowercase")]
pub enum Screen {
  Login,
  Planner(PlannerView),
}

fn card<S: KeyValueStore>(
  store: &PlannerStore<S>,
  owner_id: Uuid,
  subject: &Subject,
  today: NaiveDate,
) -> SubjectCard {
  SubjectCard {
    id:          subject.id,
    name:        subject.name.clone(),
    code:        subject.code.clone(),
    term:        subject.term.clone(),
    assignments: store
      .assignments_for(owner_id, subject.id)
      .into_iter()
      .map(|a| AssignmentRow::build(a, today))
      .collect(),
  }
}

/// Project `session` and `store` into a [`Screen`] as of `today`.
pub fn render<S: KeyValueStore>(
  session: Option<&Session>,
  store: &PlannerStore<S>,
  today: NaiveDate,
) -> Screen {
  let Some(session) = session else {
    return Screen::Login;
  };
  let owner_id = session.user_id;

  Screen::Planner(PlannerView {
    identifier: session.identifier.clone(),
    options:    store.subject_options(owner_id),
    subjects:   store
      .subjects_for(owner_id)
      .into_iter()
      .map(|s| card(store, owner_id, s, today))
      .collect(),
  })
}
