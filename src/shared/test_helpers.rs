use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{NaiveDate, Utc};
use fake::faker::name::en::Name;
use fake::Fake;

use crate::core::error::StoreError;
use crate::features::assignments::models::{
    AssignmentPatch, NewAssignment, ReportAssignment, Submission, SubmissionStatus,
};
use crate::features::assignments::services::{AssignmentHistory, AssignmentStore};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::catalog::models::{Category, CategoryProfile, SubCategory, Subject};
use crate::features::catalog::services::Catalog;
use crate::features::roster::models::RosterEntry;
use crate::features::roster::services::RosterSource;

pub const PRINCIPAL_ID: i64 = 1;
pub const COORDINATOR_ID: i64 = 20;
pub const OTHER_COORDINATOR_ID: i64 = 21;
pub const TEACHER_IDS: [i64; 3] = [10, 11, 12];

pub const ACCOMPLISHMENT: i64 = 1;
pub const LAEMPL_MPS: i64 = 2;
pub const LAEMPL: i64 = 21;
pub const MPS: i64 = 22;
pub const GRADE_3: i64 = 3;
pub const MATH: i64 = 301;
pub const ENGLISH: i64 = 302;
pub const SCIENCE: i64 = 303;

pub fn create_user(user_id: i64, role: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id,
        sub: format!("test-sub-{}", user_id),
        roles: vec![role.to_string()],
    }
}

/// Layer that authenticates every request as `user`
pub fn with_user_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(move |mut request: Request, next: Next| {
        let user = user.clone();
        async move {
            request.extensions_mut().insert(user);
            let response: Response = next.run(request).await;
            response
        }
    }))
}

pub fn assignment(given_by: i64, category_id: i64, sub_category_id: Option<i64>) -> ReportAssignment {
    let now = Utc::now();
    ReportAssignment {
        id: 0,
        category_id,
        sub_category_id,
        given_by,
        coordinator_user_id: None,
        parent_report_assignment_id: None,
        title: "Accomplishment Report".to_string(),
        instruction: None,
        from_date: date(2025, 1, 6),
        to_date: date(2025, 3, 28),
        allow_late: false,
        max_submission_count: None,
        is_given: true,
        is_archived: false,
        year_id: 2025,
        quarter: 1,
        grade_level_id: None,
        subject_id: None,
        distribution_batch_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn new_assignment(given_by: i64, category_id: i64) -> NewAssignment {
    NewAssignment {
        category_id,
        sub_category_id: None,
        given_by,
        coordinator_user_id: None,
        parent_report_assignment_id: None,
        title: "Accomplishment Report".to_string(),
        instruction: None,
        from_date: date(2025, 1, 6),
        to_date: date(2025, 3, 28),
        allow_late: false,
        max_submission_count: None,
        is_given: true,
        year_id: 2025,
        quarter: 1,
        grade_level_id: None,
        subject_id: None,
        distribution_batch_id: None,
    }
}

pub fn submission(assignment_id: i64, submitted_by: i64, status: SubmissionStatus) -> Submission {
    Submission {
        id: 0,
        report_assignment_id: assignment_id,
        submitted_by,
        status,
        rejection_reason: None,
        fields: None,
        date_submitted: None,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct State {
    next_assignment_id: i64,
    next_submission_id: i64,
    assignments: Vec<ReportAssignment>,
    submissions: Vec<Submission>,
    teachers: Vec<RosterEntry>,
    coordinators: Vec<RosterEntry>,
    categories: Vec<Category>,
    sub_categories: Vec<SubCategory>,
    subjects: Vec<Subject>,
    fail_create_subjects: Vec<i64>,
    fail_submission_recipients: Vec<i64>,
    fail_set_parent: bool,
    fail_history: bool,
    history_delay: Option<Duration>,
    set_parent_calls: usize,
}

/// In-memory stand-in for every storage trait, with failure injection
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small school: principal 1, coordinators 20 and 21, grade 3 teachers
    /// 10-12, and the report catalog
    pub fn school() -> Self {
        let store = Self::new();
        {
            let mut s = store.state.lock().unwrap();
            s.teachers = TEACHER_IDS
                .iter()
                .map(|&id| roster_entry(id, "teacher", Some(GRADE_3)))
                .collect();
            s.coordinators = vec![
                roster_entry(COORDINATOR_ID, "coordinator", Some(GRADE_3)),
                roster_entry(OTHER_COORDINATOR_ID, "coordinator", None),
            ];
            s.categories = vec![
                category(ACCOMPLISHMENT, "Accomplishment Report", "accomplishment"),
                category(LAEMPL_MPS, "LAEMPL & MPS", "laempl"),
                category(3, "Classification of Grades", "classification_of_grades"),
            ];
            s.sub_categories = vec![
                SubCategory {
                    id: LAEMPL,
                    category_id: LAEMPL_MPS,
                    name: "LAEMPL".to_string(),
                    report_kind: Some("laempl".to_string()),
                },
                SubCategory {
                    id: MPS,
                    category_id: LAEMPL_MPS,
                    name: "MPS".to_string(),
                    report_kind: Some("mps".to_string()),
                },
            ];
            s.subjects = vec![
                subject(MATH, "Math", Some(GRADE_3)),
                subject(ENGLISH, "English", Some(GRADE_3)),
                subject(SCIENCE, "Science", Some(GRADE_3)),
                subject(401, "Filipino", Some(4)),
            ];
        }
        store
    }

    pub fn insert_assignment(&self, mut assignment: ReportAssignment, recipients: &[i64]) -> i64 {
        let mut s = self.state.lock().unwrap();
        s.next_assignment_id += 1;
        assignment.id = s.next_assignment_id;
        let id = assignment.id;
        let status = SubmissionStatus::initial(assignment.is_given);
        s.assignments.push(assignment);
        for &recipient in recipients {
            s.next_submission_id += 1;
            let mut sub = submission(id, recipient, status);
            sub.id = s.next_submission_id;
            s.submissions.push(sub);
        }
        id
    }

    pub fn get(&self, id: i64) -> Option<ReportAssignment> {
        let s = self.state.lock().unwrap();
        s.assignments.iter().find(|a| a.id == id).cloned()
    }

    pub fn all_assignments(&self) -> Vec<ReportAssignment> {
        self.state.lock().unwrap().assignments.clone()
    }

    pub fn assignment_count(&self) -> usize {
        self.state.lock().unwrap().assignments.len()
    }

    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.get(id).and_then(|a| a.parent_report_assignment_id)
    }

    pub fn recipients_of(&self, assignment_id: i64) -> Vec<i64> {
        let s = self.state.lock().unwrap();
        s.submissions
            .iter()
            .filter(|sub| sub.report_assignment_id == assignment_id)
            .map(|sub| sub.submitted_by)
            .collect()
    }

    pub fn status_of(&self, assignment_id: i64, recipient_id: i64) -> Option<SubmissionStatus> {
        let s = self.state.lock().unwrap();
        s.submissions
            .iter()
            .find(|sub| sub.report_assignment_id == assignment_id && sub.submitted_by == recipient_id)
            .map(|sub| sub.status)
    }

    pub fn set_status(&self, assignment_id: i64, recipient_id: i64, status: SubmissionStatus) {
        let mut s = self.state.lock().unwrap();
        if let Some(sub) = s
            .submissions
            .iter_mut()
            .find(|sub| sub.report_assignment_id == assignment_id && sub.submitted_by == recipient_id)
        {
            sub.status = status;
        }
    }

    pub fn set_parent_calls(&self) -> usize {
        self.state.lock().unwrap().set_parent_calls
    }

    pub fn fail_create_for_subject(&self, subject_id: i64) {
        self.state.lock().unwrap().fail_create_subjects.push(subject_id);
    }

    pub fn fail_submissions_for(&self, recipient_id: i64) {
        self.state
            .lock()
            .unwrap()
            .fail_submission_recipients
            .push(recipient_id);
    }

    pub fn fail_set_parent(&self) {
        self.state.lock().unwrap().fail_set_parent = true;
    }

    pub fn fail_history_lookups(&self) {
        self.state.lock().unwrap().fail_history = true;
    }

    pub fn delay_history_lookups(&self, delay: Duration) {
        self.state.lock().unwrap().history_delay = Some(delay);
    }

    /// Clear every injected failure
    pub fn recover(&self) {
        let mut s = self.state.lock().unwrap();
        s.fail_create_subjects.clear();
        s.fail_submission_recipients.clear();
        s.fail_set_parent = false;
        s.fail_history = false;
        s.history_delay = None;
    }

    async fn history_gate(&self) -> Result<(), StoreError> {
        let (fail, delay) = {
            let s = self.state.lock().unwrap();
            (s.fail_history, s.history_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn roster_entry(id: i64, role: &str, grade_level_id: Option<i64>) -> RosterEntry {
    RosterEntry {
        id,
        name: Name().fake(),
        role: role.to_string(),
        grade_level_id,
    }
}

fn category(id: i64, name: &str, kind: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        report_kind: kind.to_string(),
    }
}

fn subject(id: i64, name: &str, grade_level_id: Option<i64>) -> Subject {
    Subject {
        id,
        name: name.to_string(),
        grade_level_id,
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn create_assignment(&self, new: &NewAssignment) -> Result<i64, StoreError> {
        let mut s = self.state.lock().unwrap();
        if new
            .subject_id
            .is_some_and(|id| s.fail_create_subjects.contains(&id))
        {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        s.next_assignment_id += 1;
        let now = Utc::now();
        let row = ReportAssignment {
            id: s.next_assignment_id,
            category_id: new.category_id,
            sub_category_id: new.sub_category_id,
            given_by: new.given_by,
            coordinator_user_id: new.coordinator_user_id,
            parent_report_assignment_id: new.parent_report_assignment_id,
            title: new.title.clone(),
            instruction: new.instruction.clone(),
            from_date: new.from_date,
            to_date: new.to_date,
            allow_late: new.allow_late,
            max_submission_count: new.max_submission_count,
            is_given: new.is_given,
            is_archived: false,
            year_id: new.year_id,
            quarter: new.quarter,
            grade_level_id: new.grade_level_id,
            subject_id: new.subject_id,
            distribution_batch_id: new.distribution_batch_id,
            created_at: now,
            updated_at: now,
        };
        s.assignments.push(row);
        Ok(s.next_assignment_id)
    }

    async fn update_assignment(&self, id: i64, patch: &AssignmentPatch) -> Result<(), StoreError> {
        let mut s = self.state.lock().unwrap();
        let row = s
            .assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Report assignment {} not found", id)))?;
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn set_parent(&self, child_id: i64, parent_id: i64) -> Result<(), StoreError> {
        let mut s = self.state.lock().unwrap();
        s.set_parent_calls += 1;
        if s.fail_set_parent {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let row = s
            .assignments
            .iter_mut()
            .find(|a| a.id == child_id)
            .ok_or_else(|| {
                StoreError::NotFound(format!("Report assignment {} not found", child_id))
            })?;
        row.parent_report_assignment_id = Some(parent_id);
        Ok(())
    }

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.submissions
            .iter()
            .filter(|sub| sub.report_assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn upsert_submission(
        &self,
        assignment_id: i64,
        recipient_id: i64,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_submission_recipients.contains(&recipient_id) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        if let Some(sub) = s
            .submissions
            .iter_mut()
            .find(|sub| sub.report_assignment_id == assignment_id && sub.submitted_by == recipient_id)
        {
            if sub.status < status && sub.status < SubmissionStatus::Submitted {
                sub.status = status;
            }
            return Ok(());
        }

        s.next_submission_id += 1;
        let mut sub = submission(assignment_id, recipient_id, status);
        sub.id = s.next_submission_id;
        s.submissions.push(sub);
        Ok(())
    }

    async fn remove_submission(
        &self,
        assignment_id: i64,
        recipient_id: i64,
    ) -> Result<(), StoreError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_submission_recipients.contains(&recipient_id) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        s.submissions
            .retain(|sub| !(sub.report_assignment_id == assignment_id && sub.submitted_by == recipient_id));
        Ok(())
    }
}

#[async_trait]
impl AssignmentHistory for InMemoryStore {
    async fn assignments_for_recipient(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        self.history_gate().await?;
        let s = self.state.lock().unwrap();
        let mut rows: Vec<ReportAssignment> = s
            .assignments
            .iter()
            .filter(|a| {
                s.submissions
                    .iter()
                    .any(|sub| sub.report_assignment_id == a.id && sub.submitted_by == user_id)
            })
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn assignments_given_by(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        self.history_gate().await?;
        let s = self.state.lock().unwrap();
        let mut rows: Vec<ReportAssignment> = s
            .assignments
            .iter()
            .filter(|a| a.given_by == user_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn assignment_by_id(&self, id: i64) -> Result<Option<ReportAssignment>, StoreError> {
        Ok(self.get(id))
    }

    async fn children_of(&self, parent_id: i64) -> Result<Vec<ReportAssignment>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.assignments
            .iter()
            .filter(|a| a.parent_report_assignment_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn subject_siblings(
        &self,
        assignment: &ReportAssignment,
    ) -> Result<Vec<ReportAssignment>, StoreError> {
        let Some(batch_id) = assignment.distribution_batch_id else {
            return Ok(vec![assignment.clone()]);
        };
        let s = self.state.lock().unwrap();
        Ok(s.assignments
            .iter()
            .filter(|a| a.distribution_batch_id == Some(batch_id) && !a.is_archived)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RosterSource for InMemoryStore {
    async fn teachers(&self, grade_level_id: Option<i64>) -> Result<Vec<RosterEntry>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.teachers
            .iter()
            .filter(|t| grade_level_id.is_none() || t.grade_level_id == grade_level_id)
            .cloned()
            .collect())
    }

    async fn coordinators(&self) -> Result<Vec<RosterEntry>, StoreError> {
        Ok(self.state.lock().unwrap().coordinators.clone())
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.state.lock().unwrap().categories.clone())
    }

    async fn sub_categories(&self) -> Result<Vec<SubCategory>, StoreError> {
        Ok(self.state.lock().unwrap().sub_categories.clone())
    }

    async fn subjects(&self, grade_level_id: Option<i64>) -> Result<Vec<Subject>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.subjects
            .iter()
            .filter(|sub| {
                grade_level_id.is_none()
                    || sub.grade_level_id.is_none()
                    || sub.grade_level_id == grade_level_id
            })
            .cloned()
            .collect())
    }

    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| s.subjects.iter().find(|sub| sub.id == *id).cloned())
            .collect())
    }

    async fn category_profile(
        &self,
        category_id: i64,
        sub_category_id: Option<i64>,
    ) -> Result<CategoryProfile, StoreError> {
        let s = self.state.lock().unwrap();
        let category = s
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .ok_or_else(|| StoreError::NotFound(format!("Category {} not found", category_id)))?;
        let sub = match sub_category_id {
            Some(id) => Some(
                s.sub_categories
                    .iter()
                    .find(|sc| sc.id == id && sc.category_id == category_id)
                    .ok_or_else(|| StoreError::NotFound(format!("Sub-category {} not found", id)))?,
            ),
            None => None,
        };
        Ok(CategoryProfile::from_rows(category, sub))
    }
}
