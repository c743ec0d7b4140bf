use sqlx::PgConnection;

use crate::{
    pkg::{internal::adaptors::jobs::spec::JobEntry, server::handlers::jobs::JobSort},
    prelude::Result,
};

pub struct JobSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: i32) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(
            "SELECT id, title, description, company, location, created_at
             FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_all(&mut self, search: Option<&str>, sort: JobSort) -> Result<Vec<JobEntry>> {
        let mut query =
            String::from("SELECT id, title, description, company, location, created_at FROM jobs");
        if search.is_some() {
            query.push_str(
                " WHERE title ILIKE $1 OR description ILIKE $1 \
                 OR company ILIKE $1 OR location ILIKE $1",
            );
        }
        query.push_str(match sort {
            JobSort::Newest => " ORDER BY created_at DESC",
            JobSort::Oldest => " ORDER BY created_at ASC",
        });

        let mut q = sqlx::query_as::<_, JobEntry>(&query);
        if let Some(term) = search {
            q = q.bind(contains_pattern(term));
        }
        let rows = q.fetch_all(&mut *self.pool).await?;
        Ok(rows)
    }
}

/// ILIKE pattern matching the term as a literal substring.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn test_contains_pattern_wraps_term() {
        assert_eq!(contains_pattern("rust"), "%rust%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("100%_remote"), "%100\\%\\_remote%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
