use super::DBClient;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Notifications older than this are swept by the nightly job. The feed is
/// an activity log, not an archive.
const RETENTION_DAYS: i32 = 30;

impl DBClient {
    pub async fn start_cleanup_task(&self) {
        let sched = JobScheduler::new().await.unwrap();
        let pool = self.pool.clone();

        let job = Job::new_async("0 0 1 * * *", move |uuid, _l| {
            let pool = pool.clone();
            Box::pin(async move {
                tracing::info!("Running notification cleanup job {:?}", uuid);

                let result = sqlx::query(
                    "DELETE FROM notifications WHERE created_at < NOW() - make_interval(days => $1)",
                )
                .bind(RETENTION_DAYS)
                .execute(&pool)
                .await;

                match result {
                    Ok(r) => {
                        tracing::info!(
                            "Notification cleanup job {:?} finished, deleted {} rows",
                            uuid,
                            r.rows_affected()
                        );
                    }
                    Err(e) => {
                        tracing::error!("Notification cleanup job {:?} failed: {:?}", uuid, e);
                    }
                }
            })
        })
        .unwrap();

        sched.add(job).await.unwrap();
        // start() spawns its own task; it doesn't block.
        sched.start().await.unwrap();
    }
}
