use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::catalog::models::{Category, ReportKind, SubCategory, Subject};

/// Sub-category entry of the category tree
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryDto {
    pub id: i64,
    pub name: String,
    pub report_kind: ReportKind,
    pub subject_fan_out: bool,
}

/// Category with its sub-categories, as shown in the "Set Report" form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTreeDto {
    pub id: i64,
    pub name: String,
    pub report_kind: ReportKind,
    pub subject_fan_out: bool,
    pub sub_categories: Vec<SubCategoryDto>,
}

impl CategoryTreeDto {
    /// Group a flat list of sub-categories under their categories
    pub fn build_tree(categories: Vec<Category>, sub_categories: Vec<SubCategory>) -> Vec<Self> {
        categories
            .into_iter()
            .map(|category| {
                let kind = parse_kind(&category.report_kind);
                let subs = sub_categories
                    .iter()
                    .filter(|s| s.category_id == category.id)
                    .map(|s| {
                        let sub_kind = s.report_kind.as_deref().map(parse_kind).unwrap_or(kind);
                        SubCategoryDto {
                            id: s.id,
                            name: s.name.clone(),
                            report_kind: sub_kind,
                            subject_fan_out: sub_kind.requires_subject_fan_out(),
                        }
                    })
                    .collect();

                CategoryTreeDto {
                    id: category.id,
                    name: category.name,
                    report_kind: kind,
                    subject_fan_out: kind.requires_subject_fan_out(),
                    sub_categories: subs,
                }
            })
            .collect()
    }
}

fn parse_kind(raw: &str) -> ReportKind {
    raw.parse().unwrap_or(ReportKind::General)
}

/// Response DTO for a subject
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDto {
    pub id: i64,
    pub name: String,
    pub grade_level_id: Option<i64>,
}

impl From<Subject> for SubjectDto {
    fn from(s: Subject) -> Self {
        Self {
            id: s.id,
            name: s.name,
            grade_level_id: s.grade_level_id,
        }
    }
}

/// Query params for listing subjects
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SubjectQuery {
    pub grade_level_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tree_groups_and_inherits_kind() {
        let categories = vec![
            Category {
                id: 1,
                name: "Accomplishment Report".to_string(),
                report_kind: "accomplishment".to_string(),
            },
            Category {
                id: 2,
                name: "LAEMPL & MPS".to_string(),
                report_kind: "laempl".to_string(),
            },
        ];
        let subs = vec![
            SubCategory {
                id: 21,
                category_id: 2,
                name: "LAEMPL".to_string(),
                report_kind: None,
            },
            SubCategory {
                id: 22,
                category_id: 2,
                name: "MPS".to_string(),
                report_kind: Some("mps".to_string()),
            },
        ];

        let tree = CategoryTreeDto::build_tree(categories, subs);

        assert_eq!(tree.len(), 2);
        assert!(tree[0].sub_categories.is_empty());
        assert!(!tree[0].subject_fan_out);
        assert_eq!(tree[1].sub_categories.len(), 2);
        assert_eq!(tree[1].sub_categories[0].report_kind, ReportKind::Laempl);
        assert_eq!(tree[1].sub_categories[1].report_kind, ReportKind::Mps);
        assert!(tree[1].sub_categories[1].subject_fan_out);
    }
}
