use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::StoreError;
use crate::features::assignments::models::{
    AssignmentPatch, NewAssignment, ReportAssignment, Submission, SubmissionStatus,
};

/// Write-side persistence for assignments and their submissions
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn create_assignment(&self, assignment: &NewAssignment) -> Result<i64, StoreError>;

    async fn update_assignment(&self, id: i64, patch: &AssignmentPatch) -> Result<(), StoreError>;

    /// Idempotent; setting the same parent twice is a no-op
    async fn set_parent(&self, child_id: i64, parent_id: i64) -> Result<(), StoreError>;

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, StoreError>;

    async fn upsert_submission(
        &self,
        assignment_id: i64,
        recipient_id: i64,
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    async fn remove_submission(&self, assignment_id: i64, recipient_id: i64)
        -> Result<(), StoreError>;
}

/// Read-side lookups over existing assignments
#[async_trait]
pub trait AssignmentHistory: Send + Sync {
    /// Assignments the user holds a submission on
    async fn assignments_for_recipient(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReportAssignment>, StoreError>;

    async fn assignments_given_by(&self, user_id: i64)
        -> Result<Vec<ReportAssignment>, StoreError>;

    async fn assignment_by_id(&self, id: i64) -> Result<Option<ReportAssignment>, StoreError>;

    async fn children_of(&self, parent_id: i64) -> Result<Vec<ReportAssignment>, StoreError>;

    /// The rows written in the same fan-out batch as `assignment`, itself included
    async fn subject_siblings(
        &self,
        assignment: &ReportAssignment,
    ) -> Result<Vec<ReportAssignment>, StoreError>;
}

const ASSIGNMENT_COLUMNS: &str = r#"
    ra.id, ra.category_id, ra.sub_category_id, ra.given_by, ra.coordinator_user_id,
    ra.parent_report_assignment_id, ra.title, ra.instruction, ra.from_date, ra.to_date,
    ra.allow_late, ra.max_submission_count, ra.is_given, ra.is_archived, ra.year_id,
    ra.quarter, ra.grade_level_id, ra.subject_id, ra.distribution_batch_id,
    ra.created_at, ra.updated_at
"#;

/// Postgres-backed assignment store and history
pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_assignments(
        &self,
        sql: &str,
        user_or_parent_id: i64,
        what: &str,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        sqlx::query_as::<_, ReportAssignment>(sql)
            .bind(user_or_parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {}: {:?}", what, e);
                StoreError::Database(e)
            })
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn create_assignment(&self, assignment: &NewAssignment) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO report_assignments (
                category_id, sub_category_id, given_by, coordinator_user_id,
                parent_report_assignment_id, title, instruction, from_date, to_date,
                allow_late, max_submission_count, is_given, year_id, quarter,
                grade_level_id, subject_id, distribution_batch_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(assignment.category_id)
        .bind(assignment.sub_category_id)
        .bind(assignment.given_by)
        .bind(assignment.coordinator_user_id)
        .bind(assignment.parent_report_assignment_id)
        .bind(&assignment.title)
        .bind(&assignment.instruction)
        .bind(assignment.from_date)
        .bind(assignment.to_date)
        .bind(assignment.allow_late)
        .bind(assignment.max_submission_count)
        .bind(assignment.is_given)
        .bind(assignment.year_id)
        .bind(assignment.quarter)
        .bind(assignment.grade_level_id)
        .bind(assignment.subject_id)
        .bind(assignment.distribution_batch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report assignment: {:?}", e);
            StoreError::Database(e)
        })?;

        Ok(id)
    }

    async fn update_assignment(&self, id: i64, patch: &AssignmentPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE report_assignments
            SET title = COALESCE($2, title),
                instruction = CASE WHEN $3 THEN $4 ELSE instruction END,
                from_date = COALESCE($5, from_date),
                to_date = COALESCE($6, to_date),
                allow_late = COALESCE($7, allow_late),
                max_submission_count = CASE WHEN $8 THEN $9 ELSE max_submission_count END,
                is_given = COALESCE($10, is_given),
                coordinator_user_id = CASE WHEN $11 THEN $12 ELSE coordinator_user_id END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(patch.instruction.is_some())
        .bind(patch.instruction.clone().flatten())
        .bind(patch.from_date)
        .bind(patch.to_date)
        .bind(patch.allow_late)
        .bind(patch.max_submission_count.is_some())
        .bind(patch.max_submission_count.flatten())
        .bind(patch.is_given)
        .bind(patch.coordinator_user_id.is_some())
        .bind(patch.coordinator_user_id.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update report assignment: {:?}", e);
            StoreError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "Report assignment {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn set_parent(&self, child_id: i64, parent_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE report_assignments
            SET parent_report_assignment_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(child_id)
        .bind(parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set parent assignment: {:?}", e);
            StoreError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "Report assignment {} not found",
                child_id
            )));
        }
        Ok(())
    }

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, report_assignment_id, submitted_by, status, rejection_reason,
                   fields, date_submitted
            FROM submissions
            WHERE report_assignment_id = $1
            ORDER BY id
            "#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list submissions: {:?}", e);
            StoreError::Database(e)
        })
    }

    async fn upsert_submission(
        &self,
        assignment_id: i64,
        recipient_id: i64,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        // Never moves a submission backwards
        sqlx::query(
            r#"
            INSERT INTO submissions (report_assignment_id, submitted_by, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (report_assignment_id, submitted_by)
            DO UPDATE SET status = EXCLUDED.status
            WHERE submissions.status < EXCLUDED.status
              AND submissions.status < 2
            "#,
        )
        .bind(assignment_id)
        .bind(recipient_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert submission: {:?}", e);
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn remove_submission(
        &self,
        assignment_id: i64,
        recipient_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM submissions WHERE report_assignment_id = $1 AND submitted_by = $2")
            .bind(assignment_id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to remove submission: {:?}", e);
                StoreError::Database(e)
            })?;

        Ok(())
    }
}

#[async_trait]
impl AssignmentHistory for PgAssignmentStore {
    async fn assignments_for_recipient(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM report_assignments ra
            JOIN submissions s ON s.report_assignment_id = ra.id
            WHERE s.submitted_by = $1 AND NOT ra.is_archived
            ORDER BY ra.created_at DESC, ra.id DESC
            "#
        );
        self.fetch_assignments(&sql, user_id, "received assignments")
            .await
    }

    async fn assignments_given_by(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM report_assignments ra
            WHERE ra.given_by = $1 AND NOT ra.is_archived
            ORDER BY ra.created_at DESC, ra.id DESC
            "#
        );
        self.fetch_assignments(&sql, user_id, "given assignments")
            .await
    }

    async fn assignment_by_id(&self, id: i64) -> Result<Option<ReportAssignment>, StoreError> {
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM report_assignments ra WHERE ra.id = $1");
        sqlx::query_as::<_, ReportAssignment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get report assignment: {:?}", e);
                StoreError::Database(e)
            })
    }

    async fn children_of(&self, parent_id: i64) -> Result<Vec<ReportAssignment>, StoreError> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM report_assignments ra
            WHERE ra.parent_report_assignment_id = $1 AND NOT ra.is_archived
            ORDER BY ra.id
            "#
        );
        self.fetch_assignments(&sql, parent_id, "child assignments")
            .await
    }

    async fn subject_siblings(
        &self,
        assignment: &ReportAssignment,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        let Some(batch_id) = assignment.distribution_batch_id else {
            return Ok(vec![assignment.clone()]);
        };

        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM report_assignments ra
            WHERE ra.distribution_batch_id = $1 AND NOT ra.is_archived
            ORDER BY ra.id
            "#
        );
        sqlx::query_as::<_, ReportAssignment>(&sql)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list subject siblings: {:?}", e);
                StoreError::Database(e)
            })
    }
}
