use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use access_cell::{authorize, AdminResource, Session};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    CreateCollaboratorRequest, CreateInstitutionRequest, CreateServiceRequest,
    InstitutionSearchQuery, ServiceCategory, ServiceFilter, SyncInstitutionsRequest,
    UpdateCollaboratorRequest, UpdateInstitutionRequest, UpdateServiceRequest,
};
use crate::services::{
    categories, CollaboratorService, InstitutionService, LinkageService, ServiceCatalog,
};

// Catalog (any session with a profile)

#[axum::debug_handler]
pub async fn list_categories(Extension(_session): Extension<Session>) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "categories": categories() })))
}

#[axum::debug_handler]
pub async fn list_services_in_category(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Path(category): Path<String>,
) -> Result<Json<Value>, AppError> {
    let category: ServiceCategory = category.parse()?;
    let services = ServiceCatalog::new(state.store.clone())
        .services_by_category(category)
        .await?;

    Ok(Json(json!({
        "category": category,
        "label": category.label(),
        "services": services,
    })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ServiceCatalog::new(state.store.clone())
        .require(&service_id)
        .await?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn search_service_institutions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(service_id): Path<String>,
    Query(query): Query<InstitutionSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let institutions = InstitutionService::new(state.store.clone())
        .search_institutions(
            &service_id,
            query.q.as_deref(),
            &session.profile.pinned_institutions,
        )
        .await?;

    Ok(Json(json!({
        "institutions": institutions,
        "total": institutions.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_institution(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Path(institution_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let institution = InstitutionService::new(state.store.clone())
        .require(&institution_id)
        .await?;

    Ok(Json(json!(institution)))
}

// Institution management (admin+)

#[axum::debug_handler]
pub async fn admin_list_institutions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let institutions = InstitutionService::new(state.store.clone()).list().await?;
    Ok(Json(json!({
        "institutions": institutions,
        "total": institutions.len(),
    })))
}

#[axum::debug_handler]
pub async fn admin_get_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(institution_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let institution = InstitutionService::new(state.store.clone())
        .require(&institution_id)
        .await?;
    Ok(Json(json!(institution)))
}

#[axum::debug_handler]
pub async fn admin_create_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateInstitutionRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let institution = InstitutionService::new(state.store.clone())
        .create(request)
        .await?;
    Ok(Json(json!(institution)))
}

#[axum::debug_handler]
pub async fn admin_update_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(institution_id): Path<String>,
    Json(request): Json<UpdateInstitutionRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let institution = InstitutionService::new(state.store.clone())
        .update(&institution_id, request)
        .await?;
    Ok(Json(json!(institution)))
}

#[axum::debug_handler]
pub async fn admin_delete_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(institution_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    InstitutionService::new(state.store.clone())
        .delete(&institution_id)
        .await?;
    Ok(Json(json!({ "deleted": true, "id": institution_id })))
}

#[axum::debug_handler]
pub async fn admin_link_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((institution_id, service_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let service = InstitutionService::new(state.store.clone());
    service.link_service(&institution_id, &service_id).await?;
    let institution = service.require(&institution_id).await?;
    Ok(Json(json!(institution)))
}

#[axum::debug_handler]
pub async fn admin_unlink_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((institution_id, service_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Institutions).await?;

    let service = InstitutionService::new(state.store.clone());
    service.unlink_service(&institution_id, &service_id).await?;
    let institution = service.require(&institution_id).await?;
    Ok(Json(json!(institution)))
}

// Service management (supervisor+)

#[axum::debug_handler]
pub async fn admin_list_services(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let services = ServiceCatalog::new(state.store.clone()).list(&filter).await?;
    Ok(Json(json!({
        "services": services,
        "total": services.len(),
    })))
}

#[axum::debug_handler]
pub async fn admin_get_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let service = ServiceCatalog::new(state.store.clone())
        .require(&service_id)
        .await?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn admin_create_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let service = ServiceCatalog::new(state.store.clone())
        .create(request)
        .await?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn admin_update_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let service = ServiceCatalog::new(state.store.clone())
        .update(&service_id, request)
        .await?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn admin_delete_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    ServiceCatalog::new(state.store.clone())
        .delete(&service_id)
        .await?;
    Ok(Json(json!({ "deleted": true, "id": service_id })))
}

#[axum::debug_handler]
pub async fn admin_service_institutions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let institutions = InstitutionService::new(state.store.clone())
        .institutions_by_service(&service_id)
        .await?;
    Ok(Json(json!({
        "institutions": institutions,
        "total": institutions.len(),
    })))
}

#[axum::debug_handler]
pub async fn admin_sync_service_institutions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
    Json(request): Json<SyncInstitutionsRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Services).await?;

    let report = LinkageService::new(state.store.clone())
        .sync_service_institutions(&service_id, &request.institution_ids)
        .await?;
    Ok(Json(json!(report)))
}

// Collaborator management (owner)

#[axum::debug_handler]
pub async fn admin_list_collaborators(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Collaborators).await?;

    let collaborators = CollaboratorService::new(state.store.clone(), state.identity.clone())
        .list()
        .await?;
    Ok(Json(json!({
        "collaborators": collaborators,
        "total": collaborators.len(),
    })))
}

#[axum::debug_handler]
pub async fn admin_get_collaborator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Collaborators).await?;

    let collaborator = CollaboratorService::new(state.store.clone(), state.identity.clone())
        .require(&collaborator_id)
        .await?;
    Ok(Json(json!(collaborator)))
}

#[axum::debug_handler]
pub async fn admin_create_collaborator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCollaboratorRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Collaborators).await?;

    let collaborator = CollaboratorService::new(state.store.clone(), state.identity.clone())
        .create(request)
        .await?;
    Ok(Json(json!(collaborator)))
}

#[axum::debug_handler]
pub async fn admin_update_collaborator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(collaborator_id): Path<String>,
    Json(request): Json<UpdateCollaboratorRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Collaborators).await?;

    let collaborator = CollaboratorService::new(state.store.clone(), state.identity.clone())
        .update(&collaborator_id, request)
        .await?;
    Ok(Json(json!(collaborator)))
}

#[axum::debug_handler]
pub async fn admin_delete_collaborator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Collaborators).await?;

    CollaboratorService::new(state.store.clone(), state.identity.clone())
        .delete(&collaborator_id)
        .await?;
    Ok(Json(json!({ "deleted": true, "id": collaborator_id })))
}
