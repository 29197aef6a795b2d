//! # Domain Module
//!
//! Business rules of the van tracker, independent of storage backend and of
//! the REST surface.
//!
//! ## Module Organization
//!
//! - **roster_service**: adding students and the guarded read-modify-write loop
//! - **ledger_service**: applying payments and reading payment history
//! - **notification_service**: the per-school notice log
//! - **credential_service**: admin and parent login matching
//! - **parent_service**: the parent's read-only dashboard
//! - **session**: per-user login state and the token registry
//! - **id_assigner**: student id generation
//!
//! ## Business Rules
//!
//! - Every school is an independent partition; unknown schools are rejected
//! - Student ids are `S####`, sequential within a school
//! - A balance never goes below zero; overpayments are absorbed
//! - Roster saves based on a stale load are retried, then reported as a
//!   concurrent modification
//! - A storage failure is never reported as "no data" or as a failed login

pub mod commands;
pub mod credential_service;
pub mod error;
pub mod id_assigner;
pub mod ledger_service;
pub mod models;
pub mod notification_service;
pub mod parent_service;
pub mod roster_service;
pub mod school_directory;
pub mod session;

pub use credential_service::{hash_password, CredentialService};
pub use error::{TrackerError, TrackerResult};
pub use id_assigner::next_student_id;
pub use ledger_service::LedgerService;
pub use notification_service::NotificationService;
pub use parent_service::ParentService;
pub use roster_service::RosterService;
pub use school_directory::SchoolDirectory;
pub use session::{SessionController, SessionState, SessionStore};
