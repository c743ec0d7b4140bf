use sqlx::PgConnection;

use crate::pkg::internal::adaptors::applications::spec::ApplicationEntry;
use crate::prelude::Result;

pub struct ApplicationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationSelector { pool }
    }

    /// Best-effort duplicate guard; not transactional with the insert that
    /// follows it, so a concurrent submission for the same pair can still
    /// slip through.
    pub async fn exists_for_job_and_email(&mut self, job_id: i32, email: &str) -> Result<bool> {
        let row = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM applications WHERE job_id = $1 AND email = $2 LIMIT 1",
        )
        .bind(job_id)
        .bind(email)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn get_by_job(&mut self, job_id: i32) -> Result<Vec<ApplicationEntry>> {
        let rows = sqlx::query_as::<_, ApplicationEntry>(
            "SELECT id, job_id, job_title, full_name, email, phone, cover_letter,
                    resume_url, submitted_at
             FROM applications WHERE job_id = $1 ORDER BY submitted_at DESC",
        )
        .bind(job_id)
        .fetch_all(&mut *self.pool)
        .await?;

        Ok(rows)
    }
}
