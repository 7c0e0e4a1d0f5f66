use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use access_cell::{authorize, AdminResource, Session};
use directory_cell::services::InstitutionService;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AdminBookingFilter, AvailabilityQuery, Booking, BookingError, CreateBookingRequest,
    RescheduleRequest,
};
use crate::services::{available_dates, can_manage, AvailabilityService, BookingService, DashboardService};

fn booking_service(state: &AppState) -> BookingService {
    BookingService::new(state.store.clone(), &state.config)
}

/// Loads a booking the caller owns, or any booking for attendants and above.
async fn managed_booking(
    state: &AppState,
    session: &Session,
    booking_id: &str,
) -> Result<Booking, AppError> {
    let booking = booking_service(state).require(booking_id).await?;

    if !can_manage(&booking, session.subject_id(), session.role()) {
        warn!(
            "{} tried to manage booking {} of {}",
            session.subject_id(),
            booking.id,
            booking.user_id
        );
        return Err(BookingError::Forbidden.into());
    }
    Ok(booking)
}

// Citizen bookings

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = booking_service(&state)
        .book(session.subject_id(), request)
        .await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let bookings = booking_service(&state)
        .list_active(session.subject_id())
        .await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len(),
    })))
}

#[axum::debug_handler]
pub async fn list_my_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let bookings = booking_service(&state)
        .list_history(session.subject_id())
        .await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = managed_booking(&state, &session, &booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    managed_booking(&state, &session, &booking_id).await?;

    let booking = booking_service(&state).cancel(&booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    managed_booking(&state, &session, &booking_id).await?;

    let outcome = booking_service(&state).reschedule(&booking_id, request).await?;
    Ok(Json(json!(outcome)))
}

// Availability

#[axum::debug_handler]
pub async fn list_available_dates(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let dates = available_dates(Utc::now().date_naive(), state.config.booking_window_days);

    Ok(Json(json!({
        "dates": dates,
        "total": dates.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_slot_availability(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let institution = InstitutionService::new(state.store.clone())
        .require(&query.institution_id)
        .await?;

    let slots = AvailabilityService::new(state.store.clone(), state.config.default_slot_capacity)
        .slot_availability(&institution, query.date, query.category)
        .await?;

    Ok(Json(json!({
        "institutionId": institution.id,
        "date": query.date,
        "category": query.category,
        "slots": slots,
    })))
}

// Admin (attendant+)

#[axum::debug_handler]
pub async fn admin_dashboard_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Dashboard).await?;

    let stats = DashboardService::new(state.store.clone()).stats().await?;
    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn admin_list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filter): Query<AdminBookingFilter>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Bookings).await?;

    let bookings = booking_service(&state).list_all_active().await?;
    let dashboard = DashboardService::new(state.store.clone());
    let entries = DashboardService::filter(dashboard.enrich(bookings).await, &filter);

    Ok(Json(json!({
        "bookings": entries,
        "total": entries.len(),
    })))
}

#[axum::debug_handler]
pub async fn admin_complete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Bookings).await?;

    let booking = booking_service(&state).complete(&booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn admin_delete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&state, &user, AdminResource::Bookings).await?;

    booking_service(&state).delete(&booking_id).await?;
    Ok(Json(json!({ "deleted": booking_id })))
}
