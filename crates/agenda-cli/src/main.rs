//! `agenda` — command-line academic planner.
//!
//! Every invocation behaves like one page load: the user directory is loaded,
//! the persisted session restored, and then exactly one form or action runs.
//!
//! # Usage
//!
//! ```
//! agenda login mh230747
//! agenda subject add --name Calculus --code mat101 --term 2
//! agenda assignment add --subject <id> --title "Sheet 1" --due 2024-10-01 --priority high
//! agenda show
//! ```

mod config;
mod directory;
mod prompt;
mod ui;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  process::ExitCode,
};

use agenda_core::{
  App,
  forms::{AssignmentForm, Form, LoginForm, RecoveryForm, RegisterForm, SubjectForm},
  kv::Persistence,
  view::Action,
};
use agenda_store_sqlite::SqliteStore;
use anyhow::Context as _;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::{config::Settings, directory::AnySource, prompt::TerminalPrompt};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "agenda", version, about = "Academic planner: subjects and assignments")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "agenda.toml")]
  config: PathBuf,

  /// Database file (overrides `store_path`).
  #[arg(long)]
  store: Option<PathBuf>,

  /// User directory URL or file (overrides `directory_source`).
  #[arg(long)]
  directory: Option<String>,

  /// Skip loading the user directory.
  #[arg(long, conflicts_with = "directory")]
  no_directory: bool,

  /// Answer every confirmation with yes.
  #[arg(short, long)]
  yes: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Log in; the password is read from stdin unless given.
  Login {
    identifier: String,
    #[arg(long)]
    password:   Option<String>,
  },
  /// Register a new user; passwords are read from stdin unless given.
  Register {
    identifier: String,
    #[arg(long)]
    password:   Option<String>,
    #[arg(long)]
    confirm:    Option<String>,
  },
  /// End the current session.
  Logout,
  /// Print the logged-in identifier.
  Whoami,
  /// Draw the planner.
  Show,
  #[command(subcommand)]
  Subject(SubjectCommand),
  #[command(subcommand)]
  Assignment(AssignmentCommand),
  /// Ask for a password-recovery email.
  Recover { identifier: String },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[derive(Subcommand)]
enum SubjectCommand {
  /// Add a subject.
  Add {
    #[arg(long)]
    name: String,
    #[arg(long)]
    code: String,
    #[arg(long)]
    term: String,
  },
  /// List subjects as picker entries.
  List,
}

#[derive(Subcommand)]
enum AssignmentCommand {
  /// Add an assignment to one of your subjects.
  Add {
    #[arg(long)]
    subject:     String,
    #[arg(long)]
    title:       String,
    #[arg(long, default_value = "")]
    description: String,
    /// Due date, `YYYY-MM-DD`.
    #[arg(long)]
    due:         String,
    #[arg(long, default_value = "medium")]
    priority:    String,
  },
  /// Toggle an assignment between done and pending.
  Done { id: Uuid },
  /// Delete an assignment (asks for confirmation).
  Rm { id: Uuid },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  let cli = Cli::parse();
  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = &cli.store {
    settings.store_path = store.clone();
  }
  if let Some(directory) = &cli.directory {
    settings.directory_source = directory.clone();
  }
  if cli.no_directory {
    settings.directory_source.clear();
  }

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(
          settings
            .log_level
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::WARN)
            .into(),
        )
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let hasher = settings.hasher()?;

  // Helper mode: hash a password and exit.
  if let Command::HashPassword = cli.command {
    let password = read_line("Password: ")?;
    println!("{}", hasher.hash(&password)?);
    return Ok(ExitCode::SUCCESS);
  }

  let store_path = settings.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let db = Persistence::new(store);

  let mut app = match settings.directory() {
    Some(location) => {
      let source = AnySource::from_location(location)?;
      App::start_with_directory(db, hasher, &source, settings.directory_policy).await?
    }
    None => App::start(db, hasher).await?,
  };

  let prompt = TerminalPrompt { assume_yes: cli.yes };
  let ok = run(&mut app, cli.command, &prompt).await?;
  Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn run(
  app: &mut App<SqliteStore>,
  command: Command,
  prompt: &TerminalPrompt,
) -> anyhow::Result<bool> {
  let form = match command {
    Command::Login { identifier, password } => Form::Login(LoginForm {
      identifier,
      secret: secret_or_stdin(password, "Password: ")?,
    }),
    Command::Register { identifier, password, confirm } => {
      let secret = secret_or_stdin(password, "Password: ")?;
      let confirm_secret = secret_or_stdin(confirm, "Confirm password: ")?;
      Form::Register(RegisterForm { identifier, secret, confirm_secret })
    }
    Command::Subject(SubjectCommand::Add { name, code, term }) => {
      Form::AddSubject(SubjectForm { name, code, term })
    }
    Command::Assignment(AssignmentCommand::Add {
      subject,
      title,
      description,
      due,
      priority,
    }) => Form::AddAssignment(AssignmentForm {
      subject_id: subject,
      title,
      description,
      due_date: due,
      priority,
    }),
    Command::Recover { identifier } => {
      return app
        .submit(Form::Recover(RecoveryForm { identifier }), prompt)
        .await
        .map_err(Into::into);
    }
    Command::Assignment(AssignmentCommand::Done { id }) => {
      return act(app, Action::ToggleDone(id), prompt).await;
    }
    Command::Assignment(AssignmentCommand::Rm { id }) => {
      return act(app, Action::Remove(id), prompt).await;
    }
    Command::Logout => {
      app.logout().await?;
      print!("{}", ui::draw(&app.screen(today())));
      return Ok(true);
    }
    Command::Whoami => {
      return Ok(match app.session().current() {
        Some(session) => {
          println!("{}", session.identifier);
          true
        }
        None => {
          println!("Not logged in.");
          false
        }
      });
    }
    Command::Show => {
      print!("{}", ui::draw(&app.screen(today())));
      return Ok(app.session().is_authenticated());
    }
    Command::Subject(SubjectCommand::List) => {
      let Ok(owner) = app.session().require_user() else {
        print!("{}", ui::draw(&app.screen(today())));
        return Ok(false);
      };
      print!("{}", ui::draw_options(&app.planner().subject_options(owner)));
      return Ok(true);
    }
    Command::HashPassword => anyhow::bail!("hash-password does not need a store"),
  };

  let redraw = !matches!(form, Form::Register(_));
  let ok = app.submit(form, prompt).await?;
  if ok && redraw {
    print!("{}", ui::draw(&app.screen(today())));
  }
  Ok(ok)
}

async fn act(
  app: &mut App<SqliteStore>,
  action: Action,
  prompt: &TerminalPrompt,
) -> anyhow::Result<bool> {
  let changed = app.dispatch(action, prompt).await?;
  if changed {
    print!("{}", ui::draw(&app.screen(today())));
  } else if app.session().is_authenticated() {
    println!("Nothing changed.");
  }
  Ok(changed)
}

fn today() -> chrono::NaiveDate { Local::now().date_naive() }

fn secret_or_stdin(given: Option<String>, label: &str) -> anyhow::Result<String> {
  match given {
    Some(secret) => Ok(secret),
    None => read_line(label),
  }
}

/// Read one line from stdin (echoed), without its line terminator.
fn read_line(label: &str) -> anyhow::Result<String> {
  print!("{label}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
