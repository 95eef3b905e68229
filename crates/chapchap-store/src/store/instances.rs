//! Instance record CRUD. Remote instance names are unique.

use super::Store;
use chapchap_core::{
    error::ChapchapError,
    types::{ConnectionStatus, Instance},
};

type InstanceRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
);

const SELECT_INSTANCE: &str = "SELECT id, name, evo_instance_name, evo_auth_token, status, \
     phone, profile_pic_url, created_at FROM instances";

fn from_row(row: InstanceRow) -> Instance {
    let (id, name, evo_instance_name, evo_auth_token, status, phone, profile_pic_url, created_at) =
        row;
    Instance {
        id,
        name,
        evo_instance_name,
        evo_auth_token,
        status: ConnectionStatus::from_gateway(&status),
        phone,
        profile_pic_url,
        created_at: Some(created_at),
    }
}

impl Store {
    /// All instances, oldest first.
    pub async fn instances(&self) -> Result<Vec<Instance>, ChapchapError> {
        let rows: Vec<InstanceRow> =
            sqlx::query_as(&format!("{SELECT_INSTANCE} ORDER BY created_at ASC, rowid ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ChapchapError::Store(format!("list instances failed: {e}")))?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    pub async fn instance(&self, id: &str) -> Result<Option<Instance>, ChapchapError> {
        let row: Option<InstanceRow> = sqlx::query_as(&format!("{SELECT_INSTANCE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ChapchapError::Store(format!("get instance failed: {e}")))?;

        Ok(row.map(from_row))
    }

    /// Resolve a user-supplied selector: exact id, then a unique id prefix,
    /// then an exact friendly name.
    pub async fn find_instance(&self, selector: &str) -> Result<Option<Instance>, ChapchapError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Ok(None);
        }
        if let Some(found) = self.instance(selector).await? {
            return Ok(Some(found));
        }

        let all = self.instances().await?;
        let mut by_prefix = all.iter().filter(|i| i.id.starts_with(selector));
        if let (Some(only), None) = (by_prefix.next(), by_prefix.next()) {
            return Ok(Some(only.clone()));
        }

        Ok(all.into_iter().find(|i| i.name == selector))
    }

    /// Insert an instance unless one with the same remote name exists.
    ///
    /// Returns whether a row was inserted. A missing `created_at` becomes now.
    pub async fn add_instance(&self, instance: &Instance) -> Result<bool, ChapchapError> {
        let created_at = instance
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let result = sqlx::query(
            "INSERT INTO instances (id, name, evo_instance_name, evo_auth_token, status, \
             phone, profile_pic_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(evo_instance_name) DO NOTHING",
        )
        .bind(&instance.id)
        .bind(&instance.name)
        .bind(&instance.evo_instance_name)
        .bind(&instance.evo_auth_token)
        .bind(instance.status.as_str())
        .bind(&instance.phone)
        .bind(&instance.profile_pic_url)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ChapchapError::Store(format!("add instance failed: {e}")))?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            tracing::info!(
                "instance dedup: {} already recorded",
                instance.evo_instance_name
            );
        }
        Ok(inserted)
    }

    /// Update the status (and phone, when given) of a record.
    ///
    /// Returns whether the record exists.
    pub async fn update_instance_status(
        &self,
        id: &str,
        status: ConnectionStatus,
        phone: Option<&str>,
    ) -> Result<bool, ChapchapError> {
        let result = sqlx::query(
            "UPDATE instances SET status = ?, phone = COALESCE(?, phone) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(phone.filter(|p| !p.is_empty()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ChapchapError::Store(format!("update instance failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a record. Returns whether a row was removed.
    pub async fn remove_instance(&self, id: &str) -> Result<bool, ChapchapError> {
        let result = sqlx::query("DELETE FROM instances WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ChapchapError::Store(format!("remove instance failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
