use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Database model for a report category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub report_kind: String,
}

/// Database model for a report sub-category
#[derive(Debug, Clone, FromRow)]
pub struct SubCategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    /// Overrides the parent category's kind when set
    pub report_kind: Option<String>,
}

/// Database model for a subject taught at a grade level
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub grade_level_id: Option<i64>,
}

/// Report family, which decides the fan-out shape of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Accomplishment,
    Laempl,
    Mps,
    ClassificationOfGrades,
    General,
}

impl ReportKind {
    /// Categories a coordinator also files for themselves
    pub fn is_self_scoping(&self) -> bool {
        matches!(self, ReportKind::Accomplishment | ReportKind::Laempl)
    }

    /// Categories split into one assignment per selected subject
    pub fn requires_subject_fan_out(&self) -> bool {
        matches!(self, ReportKind::Laempl | ReportKind::Mps)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Accomplishment => write!(f, "accomplishment"),
            ReportKind::Laempl => write!(f, "laempl"),
            ReportKind::Mps => write!(f, "mps"),
            ReportKind::ClassificationOfGrades => write!(f, "classification_of_grades"),
            ReportKind::General => write!(f, "general"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accomplishment" => Ok(ReportKind::Accomplishment),
            "laempl" => Ok(ReportKind::Laempl),
            "mps" => Ok(ReportKind::Mps),
            "classification_of_grades" => Ok(ReportKind::ClassificationOfGrades),
            "general" => Ok(ReportKind::General),
            other => Err(format!("Unknown report kind: {}", other)),
        }
    }
}

/// Everything the distribution pipeline needs to know about a (category, sub-category) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProfile {
    pub category_id: i64,
    pub category_name: String,
    pub sub_category_id: Option<i64>,
    pub sub_category_name: Option<String>,
    pub kind: ReportKind,
}

impl CategoryProfile {
    pub fn from_rows(category: &Category, sub_category: Option<&SubCategory>) -> Self {
        let kind = sub_category
            .and_then(|s| s.report_kind.as_deref())
            .unwrap_or(&category.report_kind)
            .parse::<ReportKind>()
            .unwrap_or_else(|e| {
                tracing::warn!("Category {}: {}, treating as general", category.id, e);
                ReportKind::General
            });

        Self {
            category_id: category.id,
            category_name: category.name.clone(),
            sub_category_id: sub_category.map(|s| s.id),
            sub_category_name: sub_category.map(|s| s.name.clone()),
            kind,
        }
    }

    /// Title used when the author leaves it blank
    pub fn default_title(&self) -> String {
        self.sub_category_name
            .clone()
            .unwrap_or_else(|| self.category_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(kind: &str) -> Category {
        Category {
            id: 2,
            name: "LAEMPL & MPS".to_string(),
            report_kind: kind.to_string(),
        }
    }

    #[test]
    fn test_sub_category_kind_overrides_category() {
        let sub = SubCategory {
            id: 5,
            category_id: 2,
            name: "MPS".to_string(),
            report_kind: Some("mps".to_string()),
        };
        let profile = CategoryProfile::from_rows(&category("laempl"), Some(&sub));
        assert_eq!(profile.kind, ReportKind::Mps);
        assert_eq!(profile.default_title(), "MPS");
    }

    #[test]
    fn test_unknown_kind_is_general() {
        let profile = CategoryProfile::from_rows(&category("bulletin"), None);
        assert_eq!(profile.kind, ReportKind::General);
        assert_eq!(profile.default_title(), "LAEMPL & MPS");
    }

    #[test]
    fn test_fan_out_and_self_scoping_families() {
        assert!(ReportKind::Laempl.requires_subject_fan_out());
        assert!(ReportKind::Laempl.is_self_scoping());
        assert!(ReportKind::Mps.requires_subject_fan_out());
        assert!(!ReportKind::Mps.is_self_scoping());
        assert!(ReportKind::Accomplishment.is_self_scoping());
        assert!(!ReportKind::Accomplishment.requires_subject_fan_out());
    }
}
