//! Login matching for administrators and parents.
//!
//! Administrators are a static mapping of username to Argon2 password hash.
//! Parents have no account: any `(parent_name, parent_contact)` pair found on
//! a roster logs in, scoped to the first configured school where it matches.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::models::Identity;
use crate::domain::school_directory::SchoolDirectory;
use crate::storage::{Connection, StudentStorage};

/// Hash a password into a PHC string suitable for the admin configuration
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

fn verify_password(password: &str, phc_hash: &str) -> bool {
    match PasswordHash::new(phc_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("Stored admin password hash is unreadable: {}", e);
            false
        }
    }
}

#[derive(Clone)]
pub struct CredentialService<C: Connection> {
    student_repository: C::StudentRepository,
    schools: SchoolDirectory,
    admins: Arc<HashMap<String, String>>,
    /// Verified against when the username is not an admin, so both paths cost one hash
    decoy_hash: Option<Arc<String>>,
}

impl<C: Connection> CredentialService<C> {
    pub fn new(connection: Arc<C>, schools: SchoolDirectory, admins: HashMap<String, String>) -> Self {
        let decoy_hash = match hash_password("van-tracker-decoy") {
            Ok(phc) => Some(Arc::new(phc)),
            Err(e) => {
                warn!("Failed to prepare decoy password hash: {}", e);
                None
            }
        };

        Self {
            student_repository: connection.create_student_repository(),
            schools,
            admins: Arc::new(admins),
            decoy_hash,
        }
    }

    /// Check the admin password, spending the same work for unknown usernames
    fn verify_admin(&self, username: &str, password: &str) -> bool {
        match self.admins.get(username) {
            Some(phc_hash) => verify_password(password, phc_hash),
            None => {
                if let Some(decoy) = &self.decoy_hash {
                    let _ = verify_password(password, decoy);
                }
                false
            }
        }
    }

    /// Match a username/password pair against admins, then parents.
    ///
    /// A storage failure while scanning rosters is an error, not a failed
    /// login, so an outage never looks like bad credentials.
    pub async fn authenticate(&self, username: &str, password: &str) -> TrackerResult<Identity> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(TrackerError::InvalidCredentials);
        }

        if self.verify_admin(username, password) {
            info!("Admin {} logged in", username);
            return Ok(Identity::Admin {
                username: username.to_string(),
            });
        }

        for school in self.schools.names() {
            let roster = self.student_repository.load_students(school).await?;
            if let Some(student) = roster.students.iter().find(|s| s.parent_matches(username, password)) {
                info!("Parent {} logged in to {}", student.parent_name, school);
                return Ok(Identity::Parent {
                    name: username.trim().to_string(),
                    contact: password.trim().to_string(),
                    school: school.clone(),
                });
            }
        }

        warn!("Failed login for {}", username);
        Err(TrackerError::InvalidCredentials)
    }
}
