//! Plain-text rendering of a [`Screen`].

use std::fmt::Write as _;

use agenda_core::view::{
  AssignmentRow, NO_ASSIGNMENTS, NO_SUBJECTS, PlannerView, Screen, SubjectCard, Urgency,
};

/// Render the whole screen as text.
pub fn draw(screen: &Screen) -> String {
  match screen {
    Screen::Login => "Not logged in. Use `agenda login <identifier>` or `agenda register <identifier>`.\n".to_string(),
    Screen::Planner(view) => draw_planner(view),
  }
}

fn draw_planner(view: &PlannerView) -> String {
  let mut out = format!("Logged in as {}\n\n", view.identifier);
  if view.subjects.is_empty() {
    out.push_str(NO_SUBJECTS);
    out.push('\n');
    return out;
  }
  for card in &view.subjects {
    draw_card(&mut out, card);
  }
  out
}

fn draw_card(out: &mut String, card: &SubjectCard) {
  let _ = writeln!(out, "{}  [{} - Sem {}]  ({})", card.name, card.code, card.term, card.id);
  if card.assignments.is_empty() {
    let _ = writeln!(out, "  {NO_ASSIGNMENTS}");
  }
  for row in &card.assignments {
    draw_row(out, row);
  }
  out.push('\n');
}

fn draw_row(out: &mut String, row: &AssignmentRow) {
  let status = if row.done { "[x]" } else { "[ ]" };
  let flag = match row.urgency {
    Urgency::Overdue => " OVERDUE",
    Urgency::Upcoming => " DUE SOON",
    Urgency::Normal => "",
  };
  let _ = writeln!(out, "  {status} {} ({} priority){flag}", row.title, row.priority);
  let _ = writeln!(out, "      {}", row.description);
  let _ = writeln!(
    out,
    "      Due: {} ({} days)  id: {}",
    row.due_date.format("%Y-%m-%d"),
    row.days_remaining,
    row.id
  );
}

/// Render the subject picker as `id  CODE - Name` lines.
pub fn draw_options(options: &[(uuid::Uuid, String)]) -> String {
  if options.is_empty() {
    return format!("{NO_SUBJECTS}\n");
  }
  options
    .iter()
    .map(|(id, label)| format!("{id}  {label}\n"))
    .collect()
}

#[cfg(test)]
mod tests {
  use agenda_core::{assignment::Priority, view::Action};
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;

  fn row(title: &str, days: i64, done: bool) -> AssignmentRow {
    let id = Uuid::new_v4();
    AssignmentRow {
      id,
      title: title.into(),
      description: "desc".into(),
      due_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
      days_remaining: days,
      urgency: Urgency::classify(days),
      priority: Priority::High,
      done,
      actions: [Action::ToggleDone(id), Action::Remove(id)],
    }
  }

  #[test]
  fn login_screen_has_instructions() {
    assert!(draw(&Screen::Login).contains("agenda login"));
  }

  #[test]
  fn empty_planner_shows_empty_state() {
    let view = PlannerView { identifier: "AB1".into(), options: vec![], subjects: vec![] };
    let text = draw(&Screen::Planner(view));
    assert!(text.contains("Logged in as AB1"));
    assert!(text.contains(NO_SUBJECTS));
  }

  #[test]
  fn cards_show_rows_and_flags() {
    let card = SubjectCard {
      id:          Uuid::new_v4(),
      name:        "Calculus".into(),
      code:        "MAT1".into(),
      term:        "2".into(),
      assignments: vec![row("late", -2, false), row("soon", 1, true)],
    };
    let empty = SubjectCard { assignments: vec![], name: "Empty".into(), ..card.clone() };
    let view = PlannerView {
      identifier: "AB1".into(),
      options:    vec![],
      subjects:   vec![card, empty],
    };
    let text = draw(&Screen::Planner(view));
    assert!(text.contains("Calculus  [MAT1 - Sem 2]"));
    assert!(text.contains("[ ] late (high priority) OVERDUE"));
    assert!(text.contains("[x] soon (high priority) DUE SOON"));
    assert!(text.contains("(-2 days)"));
    assert!(text.contains(NO_ASSIGNMENTS));
  }

  #[test]
  fn options_list_ids_and_labels() {
    let id = Uuid::new_v4();
    let text = draw_options(&[(id, "MAT1 - Calculus".into())]);
    assert_eq!(text, format!("{id}  MAT1 - Calculus\n"));
    assert!(draw_options(&[]).contains(NO_SUBJECTS));
  }
}
