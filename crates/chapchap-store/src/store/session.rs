//! Session marker: at most one logged-in user.

use super::Store;
use chapchap_core::{error::ChapchapError, types::User};
use uuid::Uuid;

const DEFAULT_USER_NAME: &str = "Demo User";

impl Store {
    /// The logged-in user, if any.
    pub async fn current_user(&self) -> Result<Option<User>, ChapchapError> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, name, email FROM session_user LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ChapchapError::Store(format!("session lookup failed: {e}")))?;

        Ok(row.map(|(id, name, email)| User { id, name, email }))
    }

    /// Start a session for `email`, replacing any previous one.
    pub async fn login(&self, email: &str, name: Option<&str>) -> Result<User, ChapchapError> {
        let simple = Uuid::new_v4().simple().to_string();
        let user = User {
            id: format!("usr_{}", &simple[..8]),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_USER_NAME)
                .to_string(),
            email: email.trim().to_string(),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChapchapError::Store(format!("login failed: {e}")))?;

        sqlx::query("DELETE FROM session_user")
            .execute(&mut *tx)
            .await
            .map_err(|e| ChapchapError::Store(format!("login failed: {e}")))?;

        sqlx::query("INSERT INTO session_user (id, name, email) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .execute(&mut *tx)
            .await
            .map_err(|e| ChapchapError::Store(format!("login failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| ChapchapError::Store(format!("login failed: {e}")))?;

        tracing::info!("session started for {}", user.email);
        Ok(user)
    }

    /// End the session. Instance records are kept.
    pub async fn logout(&self) -> Result<(), ChapchapError> {
        sqlx::query("DELETE FROM session_user")
            .execute(&self.pool)
            .await
            .map_err(|e| ChapchapError::Store(format!("logout failed: {e}")))?;
        Ok(())
    }
}
