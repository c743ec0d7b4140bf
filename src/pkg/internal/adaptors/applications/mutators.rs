use sqlx::PgConnection;

use crate::pkg::internal::adaptors::applications::spec::ApplicationEntry;
use crate::prelude::Result;

pub struct CreateApplicationData {
    pub job_id: i32,
    pub job_title: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: String,
}

pub struct ApplicationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationMutator { pool }
    }

    pub async fn create(&mut self, data: CreateApplicationData) -> Result<ApplicationEntry> {
        let row = sqlx::query_as::<_, ApplicationEntry>(
            r#"
            INSERT INTO applications (job_id, job_title, full_name, email, phone, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, job_id, job_title, full_name, email, phone, cover_letter, resume_url, submitted_at
            "#,
        )
        .bind(data.job_id)
        .bind(&data.job_title)
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.cover_letter)
        .bind(&data.resume_url)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&mut self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
