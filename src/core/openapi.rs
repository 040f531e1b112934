use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::assignments::{
    dtos as assignments_dtos, engine as assignments_engine, handlers as assignments_handlers,
    models as assignments_models,
};
use crate::features::auth;
use crate::features::catalog::{
    dtos as catalog_dtos, handlers as catalog_handlers, models as catalog_models,
};
use crate::features::roster::{
    dtos as roster_dtos, handlers as roster_handlers, models as roster_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Roster
        roster_handlers::list_teachers,
        roster_handlers::list_coordinators,
        // Catalog
        catalog_handlers::list_categories,
        catalog_handlers::list_subjects,
        // Report assignments
        assignments_handlers::submit_assignment,
        assignments_handlers::update_assignment,
        assignments_handlers::distribute_assignment,
        assignments_handlers::link_parent,
        assignments_handlers::get_assignment,
        assignments_handlers::list_given,
        assignments_handlers::list_received,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dto::MeResponseDto,
            auth::model::UserRole,
            // Roster
            roster_dtos::RosterEntryDto,
            roster_models::RecipientRole,
            // Catalog
            catalog_dtos::CategoryTreeDto,
            catalog_dtos::SubCategoryDto,
            catalog_dtos::SubjectDto,
            catalog_models::ReportKind,
            // Report assignments
            assignments_dtos::SubmitAction,
            assignments_dtos::SubmitAssignmentDto,
            assignments_dtos::UpdateAssignmentDto,
            assignments_dtos::DistributeAssignmentDto,
            assignments_dtos::LinkParentDto,
            assignments_dtos::AssignmentResponseDto,
            assignments_dtos::SubmissionDto,
            assignments_dtos::AssignmentDetailDto,
            assignments_dtos::SpecState,
            assignments_dtos::DistributionStatus,
            assignments_dtos::SpecOutcomeDto,
            assignments_dtos::DistributionOutcomeDto,
            assignments_dtos::UpdateOutcomeDto,
            assignments_dtos::SubmitOutcomeDto,
            assignments_engine::SpecBatch,
            assignments_engine::OwnershipOutcome,
            assignments_engine::RouteDecision,
            assignments_models::SubmissionStatus,
            // Response wrappers
            ApiResponse<auth::dto::MeResponseDto>,
            ApiResponse<Vec<roster_dtos::RosterEntryDto>>,
            ApiResponse<Vec<catalog_dtos::CategoryTreeDto>>,
            ApiResponse<Vec<catalog_dtos::SubjectDto>>,
            ApiResponse<assignments_dtos::SubmitOutcomeDto>,
            ApiResponse<assignments_dtos::UpdateOutcomeDto>,
            ApiResponse<assignments_dtos::DistributionOutcomeDto>,
            ApiResponse<assignments_dtos::AssignmentResponseDto>,
            ApiResponse<assignments_dtos::AssignmentDetailDto>,
            ApiResponse<Vec<assignments_dtos::AssignmentResponseDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Authenticated user identity"),
        (name = "roster", description = "Teacher and coordinator rosters (recipient pickers)"),
        (name = "catalog", description = "Report categories, sub-categories and subjects"),
        (name = "report-assignments", description = "Create, distribute and track report assignments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Report Assignment API",
        version = "0.1.0",
        description = "API documentation for school report distribution",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
