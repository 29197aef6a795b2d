//! Login sessions.
//!
//! A `SessionController` is the per-user state machine. The REST layer keeps
//! live controllers in a `SessionStore` keyed by an opaque bearer token;
//! nothing is persisted and sessions end with the process.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::credential_service::CredentialService;
use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::models::Identity;
use crate::storage::Connection;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    Authenticated(Identity),
}

#[derive(Debug, Clone, Default)]
pub struct SessionController {
    state: SessionState,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::LoggedOut => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Authenticate and enter the matched role. Any failure leaves the
    /// controller logged out, even if it was authenticated before.
    pub async fn login<C: Connection>(
        &mut self,
        credentials: &CredentialService<C>,
        username: &str,
        password: &str,
    ) -> TrackerResult<&Identity> {
        self.state = SessionState::LoggedOut;
        let identity = credentials.authenticate(username, password).await?;
        self.state = SessionState::Authenticated(identity);
        self.identity().ok_or(TrackerError::Unauthorized)
    }

    pub fn logout(&mut self) {
        self.state = SessionState::LoggedOut;
    }

    /// The identity if it is an admin
    pub fn require_admin(&self) -> TrackerResult<&Identity> {
        match self.identity() {
            Some(identity @ Identity::Admin { .. }) => Ok(identity),
            Some(_) => Err(TrackerError::Forbidden("Admin access required".to_string())),
            None => Err(TrackerError::Unauthorized),
        }
    }

    /// The identity if it is a parent
    pub fn require_parent(&self) -> TrackerResult<&Identity> {
        match self.identity() {
            Some(identity @ Identity::Parent { .. }) => Ok(identity),
            Some(_) => Err(TrackerError::Forbidden("Parent access required".to_string())),
            None => Err(TrackerError::Unauthorized),
        }
    }
}

/// Live sessions keyed by bearer token
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionController>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in and register the session under a fresh token
    pub async fn login<C: Connection>(
        &self,
        credentials: &CredentialService<C>,
        username: &str,
        password: &str,
    ) -> TrackerResult<(String, Identity)> {
        let mut controller = SessionController::new();
        let identity = controller.login(credentials, username, password).await?.clone();

        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), controller);
        info!("Opened {} session for {}", identity.role(), identity.username());
        Ok((token, identity))
    }

    /// Identity behind a token
    pub async fn get(&self, token: &str) -> TrackerResult<SessionController> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(TrackerError::Unauthorized)
    }

    /// End a session; unknown tokens are an error
    pub async fn logout(&self, token: &str) -> TrackerResult<Identity> {
        let mut controller = self
            .sessions
            .write()
            .await
            .remove(token)
            .ok_or(TrackerError::Unauthorized)?;
        let identity = controller.identity().cloned().ok_or(TrackerError::Unauthorized)?;
        controller.logout();
        info!("Closed session for {}", identity.username());
        Ok(identity)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credential_service::hash_password;
    use crate::domain::school_directory::SchoolDirectory;
    use crate::storage::csv::test_utils::{sample_student, RepositoryTestHelper};
    use crate::storage::csv::CsvConnection;
    use shared::Role;

    async fn setup_test() -> (CredentialService<CsvConnection>, RepositoryTestHelper) {
        let helper = RepositoryTestHelper::new().unwrap();
        helper
            .seed_students("School B", vec![sample_student("S0001", "Riya", "Mrs. Patil", "0222333444")])
            .await
            .unwrap();
        let schools = SchoolDirectory::new(vec!["School A".to_string(), "School B".to_string()]);
        let mut admins = HashMap::new();
        admins.insert("gholape".to_string(), hash_password("gholape").unwrap());
        let credentials = CredentialService::new(Arc::new(helper.env.connection.clone()), schools, admins);
        (credentials, helper)
    }

    #[tokio::test]
    async fn test_controller_transitions() {
        let (credentials, _helper) = setup_test().await;
        let mut controller = SessionController::new();
        assert_eq!(controller.state(), &SessionState::LoggedOut);

        let identity = controller.login(&credentials, "Mrs. Patil", "0222333444").await.unwrap();
        assert_eq!(identity.role(), Role::Parent);
        assert!(controller.require_parent().is_ok());
        assert!(matches!(controller.require_admin(), Err(TrackerError::Forbidden(_))));

        controller.logout();
        assert_eq!(controller.state(), &SessionState::LoggedOut);
        assert!(matches!(controller.require_parent(), Err(TrackerError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_controller_logged_out() {
        let (credentials, _helper) = setup_test().await;
        let mut controller = SessionController::new();
        controller.login(&credentials, "gholape", "gholape").await.unwrap();

        let result = controller.login(&credentials, "gholape", "wrong").await;
        assert!(matches!(result, Err(TrackerError::InvalidCredentials)));
        assert!(!controller.is_logged_in());
    }

    #[tokio::test]
    async fn test_store_issues_and_revokes_tokens() {
        let (credentials, _helper) = setup_test().await;
        let store = SessionStore::new();

        let (token, identity) = store.login(&credentials, "gholape", "gholape").await.unwrap();
        assert_eq!(identity.role(), Role::Admin);
        assert_eq!(store.len().await, 1);
        assert!(store.get(&token).await.unwrap().require_admin().is_ok());

        store.logout(&token).await.unwrap();
        assert!(matches!(store.get(&token).await, Err(TrackerError::Unauthorized)));
        assert!(matches!(store.logout(&token).await, Err(TrackerError::Unauthorized)));

        assert!(store.login(&credentials, "nobody", "nothing").await.is_err());
        assert_eq!(store.len().await, 0);
    }
}
