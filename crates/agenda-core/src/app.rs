//! [`App`] — the composed application object.
//!
//! Owns the session manager and the planner store over one shared
//! persistence backend. Forms are submitted through [`App::submit`] and view
//! actions through [`App::dispatch`]; both report user-facing outcomes through
//! an injected [`Prompt`] and only return infrastructure errors.

use chrono::NaiveDate;

use crate::{
  Result,
  directory::{self, DirectorySource, ReconcilePolicy},
  forms::Form,
  kv::{KeyValueStore, Persistence},
  planner::PlannerStore,
  prompt::Prompt,
  recovery,
  secret::SecretHasher,
  session::SessionManager,
  view::{self, Action, Screen},
};

pub const REGISTERED: &str = "Registration successful. You can now log in.";

pub struct App<S> {
  session: SessionManager<S>,
  planner: PlannerStore<S>,
}

impl<S: KeyValueStore> App<S> {
  /// Start from persisted state only (no directory document).
  pub async fn start(db: Persistence<S>, hasher: SecretHasher) -> Result<Self> {
    let users = directory::stored_users(&db).await?;
    Self::assemble(db, hasher, users).await
  }

  /// Load the user directory first, then restore the session and planner.
  pub async fn start_with_directory<D: DirectorySource>(
    db: Persistence<S>,
    hasher: SecretHasher,
    source: &D,
    policy: ReconcilePolicy,
  ) -> Result<Self> {
    let users = directory::load(source, &db, &hasher, policy).await?;
    Self::assemble(db, hasher, users).await
  }

  async fn assemble(
    db: Persistence<S>,
    hasher: SecretHasher,
    users: Vec<crate::user::User>,
  ) -> Result<Self> {
    let planner = PlannerStore::open(db.clone()).await?;
    let session = SessionManager::restore(db, hasher, users).await?;
    Ok(Self { session, planner })
  }

  pub fn session(&self) -> &SessionManager<S> { &self.session }

  pub fn planner(&self) -> &PlannerStore<S> { &self.planner }

  /// What the user should currently see.
  pub fn screen(&self, today: NaiveDate) -> Screen {
    view::render(self.session.current(), &self.planner, today)
  }

  pub async fn logout(&mut self) -> Result<()> { self.session.logout().await }

  /// Handle one form submission. Validation, duplicate, authentication and
  /// ownership failures are reported through `prompt` and leave state
  /// untouched; the return value is `Ok(false)` in that case.
  pub async fn submit(&mut self, form: Form, prompt: &impl Prompt) -> Result<bool> {
    match self.apply(form, prompt).await {
      Ok(()) => Ok(true),
      Err(e) if e.is_user_facing() => {
        prompt.notify(&e.to_string());
        Ok(false)
      }
      Err(e) => Err(e),
    }
  }

  async fn apply(&mut self, form: Form, prompt: &impl Prompt) -> Result<()> {
    match form {
      Form::Login(f) => {
        f.validate()?;
        self.session.login(&f.identifier, &f.secret).await?;
      }
      Form::Register(f) => {
        f.validate()?;
        self
          .session
          .register(&f.identifier, &f.secret, &f.confirm_secret)
          .await?;
        prompt.notify(REGISTERED);
      }
      Form::AddSubject(f) => {
        let owner = self.session.require_user()?;
        let input = f.validate()?;
        self.planner.add_subject(owner, input).await?;
      }
      Form::AddAssignment(f) => {
        let owner = self.session.require_user()?;
        let input = f.validate()?;
        self.planner.add_assignment(owner, input).await?;
      }
      Form::Recover(f) => {
        let outcome = recovery::check(&f.identifier)?;
        prompt.notify(outcome.message());
      }
    }
    Ok(())
  }

  /// Run an action from the rendered view. Actions on assignments the
  /// current user does not own are ignored like unknown ids. Returns whether
  /// anything changed.
  pub async fn dispatch(&mut self, action: Action, prompt: &impl Prompt) -> Result<bool> {
    let owner = match self.session.require_user() {
      Ok(owner) => owner,
      Err(e) => {
        prompt.notify(&e.to_string());
        return Ok(false);
      }
    };

    let (Action::ToggleDone(id) | Action::Remove(id)) = action;
    if self.planner.assignment(id).is_none_or(|a| a.owner_id != owner) {
      return Ok(false);
    }

    match action {
      Action::ToggleDone(id) => Ok(self.planner.toggle_done(id).await?.is_some()),
      Action::Remove(id) => self.planner.remove_assignment(id, prompt).await,
    }
  }
}
