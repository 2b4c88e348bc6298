//! Core types and components for the agenda academic planner.
//!
//! Users log in with an identifier and a password, create subjects, and
//! attach assignments with due dates and priorities. All state lives in a
//! [`kv::KeyValueStore`]; this crate is free of HTTP and database
//! dependencies.

pub mod app;
pub mod assignment;
pub mod directory;
pub mod error;
pub mod forms;
pub mod kv;
pub mod planner;
pub mod prompt;
pub mod recovery;
pub mod secret;
pub mod session;
pub mod subject;
pub mod user;
pub mod view;

pub use app::App;
pub use error::{Error, Result};
