use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    error::AppResult,
    models::{Catalog, Problem},
    services::{catalog::canonical_tags, providers::CatalogRepository},
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Debug, FromRow)]
struct ProblemRow {
    id: String,
    name: String,
    rating: Option<i32>,
    tags: Vec<String>,
}

impl From<ProblemRow> for Problem {
    fn from(row: ProblemRow) -> Self {
        Problem {
            problem_id: row.id,
            problem_name: row.name,
            problem_rating: row.rating,
            problem_tags: canonical_tags(row.tags),
        }
    }
}

/// Problem catalog persisted in the `problems` table
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn load_persisted(&self) -> AppResult<Vec<Problem>> {
        let rows = sqlx::query_as::<_, ProblemRow>(
            r#"
            SELECT id, name, rating, tags
            FROM problems
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(rows = rows.len(), "Loaded persisted problems");

        Ok(rows.into_iter().map(Problem::from).collect())
    }

    async fn persist(&self, catalog: &Catalog) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM problems").execute(&mut *tx).await?;

        for (position, problem) in catalog.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO problems (id, position, name, rating, tags)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&problem.problem_id)
            .bind(position as i32)
            .bind(&problem.problem_name)
            .bind(problem.problem_rating)
            .bind(&problem.problem_tags)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(problems = catalog.len(), "Persisted problem catalog");

        Ok(())
    }
}
