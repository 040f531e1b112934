use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::StoreError;
use crate::features::roster::models::{Roster, RosterEntry};

/// Read access to the teacher and coordinator rosters
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Users holding a grade-level teaching assignment, optionally for one grade
    async fn teachers(&self, grade_level_id: Option<i64>) -> Result<Vec<RosterEntry>, StoreError>;

    /// Users holding a coordinator assignment
    async fn coordinators(&self) -> Result<Vec<RosterEntry>, StoreError>;
}

/// Load the complete roster used for recipient classification
pub async fn load_roster(source: &dyn RosterSource) -> Result<Roster, StoreError> {
    let teachers = source.teachers(None).await?;
    let coordinators = source.coordinators().await?;
    Ok(Roster::new(teachers, coordinators))
}

/// Postgres-backed roster
pub struct RosterService {
    pool: PgPool,
}

impl RosterService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterSource for RosterService {
    async fn teachers(&self, grade_level_id: Option<i64>) -> Result<Vec<RosterEntry>, StoreError> {
        sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT u.id, u.name, u.role, t.grade_level_id
            FROM users u
            JOIN teacher_grade_assignments t ON t.user_id = u.id
            WHERE ($1::BIGINT IS NULL OR t.grade_level_id = $1)
            ORDER BY u.name, u.id
            "#,
        )
        .bind(grade_level_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list teachers: {:?}", e);
            StoreError::Database(e)
        })
    }

    async fn coordinators(&self) -> Result<Vec<RosterEntry>, StoreError> {
        sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT u.id, u.name, u.role, c.grade_level_id
            FROM users u
            JOIN coordinator_assignments c ON c.user_id = u.id
            ORDER BY u.name, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list coordinators: {:?}", e);
            StoreError::Database(e)
        })
    }
}
