use super::DBClient;
use crate::models::{Notification, NotificationType};

/// Notification feed operations. Append and delete only; entries are never
/// updated.
pub trait NotificationExt {
    async fn save_notification(
        &self,
        message: &str,
        kind: NotificationType,
        duration: Option<i32>,
    ) -> Result<Notification, sqlx::Error>;

    /// Newest first.
    async fn list_notifications(&self) -> Result<Vec<Notification>, sqlx::Error>;

    async fn delete_notification(&self, id: i64) -> Result<(), sqlx::Error>;
}

impl NotificationExt for DBClient {
    async fn save_notification(
        &self,
        message: &str,
        kind: NotificationType,
        duration: Option<i32>,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (message, type, duration) VALUES ($1, $2, $3) \
             RETURNING id, message, type, duration, created_at",
        )
        .bind(message)
        .bind(kind)
        .bind(duration)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "SELECT id, message, type, duration, created_at \
             FROM notifications ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_notification(&self, id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
