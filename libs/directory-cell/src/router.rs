use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use access_cell::session_middleware;
use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

/// Mounted under `/catalog`.
pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{category}/services", get(list_services_in_category))
        .route("/services/{id}", get(get_service))
        .route("/services/{id}/institutions", get(search_service_institutions))
        .route("/institutions/{id}", get(get_institution))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn directory_admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/institutions", get(admin_list_institutions).post(admin_create_institution))
        .route(
            "/institutions/{id}",
            get(admin_get_institution)
                .put(admin_update_institution)
                .delete(admin_delete_institution),
        )
        .route(
            "/institutions/{id}/services/{service_id}",
            post(admin_link_service).delete(admin_unlink_service),
        )
        .route("/services", get(admin_list_services).post(admin_create_service))
        .route(
            "/services/{id}",
            get(admin_get_service)
                .put(admin_update_service)
                .delete(admin_delete_service),
        )
        .route(
            "/services/{id}/institutions",
            get(admin_service_institutions).put(admin_sync_service_institutions),
        )
        .route("/collaborators", get(admin_list_collaborators).post(admin_create_collaborator))
        .route(
            "/collaborators/{id}",
            get(admin_get_collaborator)
                .put(admin_update_collaborator)
                .delete(admin_delete_collaborator),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
