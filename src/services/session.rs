use crate::backend::AuthService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    SignedIn(String),
    SignedOut,
    /// The lookup itself failed; carries a user-facing message.
    Failed(String),
}

impl SessionOutcome {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            SessionOutcome::SignedIn(id) => Some(id),
            _ => None,
        }
    }
}

/// Reads the current session once. No retry.
pub async fn current_user_id(auth: &dyn AuthService) -> SessionOutcome {
    match auth.current_session().await {
        Ok(Some(session)) => {
            tracing::debug!(user_id = %session.user_id, "session active");
            SessionOutcome::SignedIn(session.user_id)
        }
        Ok(None) => {
            tracing::info!("no active session");
            SessionOutcome::SignedOut
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to read session");
            SessionOutcome::Failed(e.to_string())
        }
    }
}
