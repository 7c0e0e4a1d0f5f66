use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use booking_cell::{booking_admin_routes, booking_routes};
use directory_cell::services::{InstitutionService, ServiceCatalog};
use directory_cell::{CreateInstitutionRequest, CreateServiceRequest, ServiceCategory};
use shared_database::{Collection, DocumentStore};
use shared_models::Role;
use shared_utils::test_utils::{bearer, test_state, TestUser};
use shared_utils::AppState;

async fn seed_directory(state: &AppState) -> (String, String) {
    let service = ServiceCatalog::new(state.store.clone())
        .create(CreateServiceRequest {
            name: "Vacinação".to_string(),
            category: ServiceCategory::Personal,
            average_duration: 15,
            max_capacity: 10,
            requirements: Vec::new(),
            institution_ids: Vec::new(),
        })
        .await
        .unwrap();

    let institution = InstitutionService::new(state.store.clone())
        .create(CreateInstitutionRequest {
            name: "Hospital Central".to_string(),
            address: "Luanda".to_string(),
            coordinates: Default::default(),
            service_ids: vec![service.id.clone()],
            available_slots: Vec::new(),
            max_capacity: 10,
            operating_hours: None,
            image_url: None,
        })
        .await
        .unwrap();

    (service.id, institution.id)
}

async fn send(app: &Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", bearer(token));
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn citizen_books_lists_and_cancels() {
    let state = test_state();
    let (service_id, institution_id) = seed_directory(&state).await;
    let citizen = TestUser::citizen("004512345LA042");
    let token = citizen.seed(&state).await.unwrap();
    let app = booking_routes(state);

    let (status, created) = send(
        &app,
        "POST",
        "/",
        &token,
        Some(json!({
            "serviceId": service_id,
            "institutionId": institution_id,
            "date": "2024-06-10",
            "timeSlot": "09:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "scheduled");
    assert_eq!(created["institutionName"], "Hospital Central");
    let booking_id = created["id"].as_str().unwrap().to_string();

    let (status, active) = send(&app, "GET", "/", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["total"], 1);

    let (status, cancelled) = send(&app, "POST", &format!("/{}/cancel", booking_id), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (_, history) = send(&app, "GET", "/history", &token, None).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["bookings"][0]["id"], booking_id.as_str());

    let (status, _) = send(&app, "POST", &format!("/{}/complete", booking_id), &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_slot_is_a_bad_request() {
    let state = test_state();
    let (service_id, institution_id) = seed_directory(&state).await;
    let token = TestUser::citizen("004512345LA042").seed(&state).await.unwrap();
    let app = booking_routes(state);

    let (status, body) = send(
        &app,
        "POST",
        "/",
        &token,
        Some(json!({
            "serviceId": service_id,
            "institutionId": institution_id,
            "date": "2024-06-10",
            "timeSlot": "12:30",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("12:30"));
}

#[tokio::test]
async fn citizens_cannot_touch_each_others_bookings() {
    let state = test_state();
    let (service_id, institution_id) = seed_directory(&state).await;
    let owner_token = TestUser::citizen("004512345LA042").seed(&state).await.unwrap();
    let other_token = TestUser::citizen("009876543LA011").seed(&state).await.unwrap();
    let attendant_token = TestUser::staff("balcao@gov.ao", Role::Attendant)
        .seed(&state)
        .await
        .unwrap();
    let app = booking_routes(state);

    let (_, created) = send(
        &app,
        "POST",
        "/",
        &owner_token,
        Some(json!({
            "serviceId": service_id,
            "institutionId": institution_id,
            "date": "2024-06-10",
            "timeSlot": "09:00",
        })),
    )
    .await;
    let booking_id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", &format!("/{}/cancel", booking_id), &other_token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["redirect"], "/admin");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}/reschedule", booking_id),
        &attendant_token,
        Some(json!({ "date": "2024-06-11", "timeSlot": "10:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"]["status"], "rescheduled");
    assert_eq!(body["current"]["status"], "scheduled");
    assert_eq!(body["current"]["rescheduledFrom"], booking_id.as_str());
}

#[tokio::test]
async fn availability_endpoints() {
    let state = test_state();
    let (_, institution_id) = seed_directory(&state).await;
    let token = TestUser::citizen("004512345LA042").seed(&state).await.unwrap();
    let app = booking_routes(state);

    let (status, dates) = send(&app, "GET", "/dates", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dates["total"].as_u64().unwrap() >= 20);

    let uri = format!(
        "/availability?institution_id={}&date=2024-06-10&category=documentacao-pessoal",
        institution_id
    );
    let (status, body) = send(&app, "GET", &uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"].as_array().unwrap().len(), 16);
    assert_eq!(body["slots"][0]["time"], "08:00");
    assert_eq!(body["slots"][0]["maxCapacity"], 10);
}

#[tokio::test]
async fn token_without_profile_is_no_session() {
    let state = test_state();
    let (_, institution_id) = seed_directory(&state).await;
    let citizen = TestUser::citizen("004512345LA042");
    let token = citizen.seed(&state).await.unwrap();
    let app = booking_routes(state.clone());

    let (status, _) = send(&app, "GET", "/", &token, None).await;
    assert_eq!(status, StatusCode::OK);

    state.store.delete(Collection::Users, &citizen.id).await.unwrap();

    let availability = format!(
        "/availability?institution_id={}&date=2024-06-10&category=documentacao-pessoal",
        institution_id
    );
    for uri in ["/", "/history", "/dates", availability.as_str()] {
        let (status, body) = send(&app, "GET", uri, &token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["redirect"], "/");
    }
}

#[tokio::test]
async fn admin_booking_routes_require_attendant() {
    let state = test_state();
    let (service_id, institution_id) = seed_directory(&state).await;
    let citizen = TestUser::citizen("004512345LA042");
    let citizen_token = citizen.seed(&state).await.unwrap();
    let attendant_token = TestUser::staff("balcao@gov.ao", Role::Attendant)
        .seed(&state)
        .await
        .unwrap();
    let citizen_app = booking_routes(state.clone());
    let admin_app = booking_admin_routes(state);

    let (_, created) = send(
        &citizen_app,
        "POST",
        "/",
        &citizen_token,
        Some(json!({
            "serviceId": service_id,
            "institutionId": institution_id,
            "date": "2024-06-10",
            "timeSlot": "09:00",
        })),
    )
    .await;
    let booking_id = created["id"].as_str().unwrap().to_string();

    for uri in ["/stats", "/bookings"] {
        let (status, body) = send(&admin_app, "GET", uri, &citizen_token, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["redirect"], "/admin");
    }

    let (status, stats) = send(&admin_app, "GET", "/stats", &attendant_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["scheduledBookings"], 1);

    let (status, list) = send(&admin_app, "GET", "/bookings?search=LA042", &attendant_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["bookings"][0]["userProfile"]["nationalId"], "004512345LA042");

    let (status, completed) = send(
        &admin_app,
        "POST",
        &format!("/bookings/{}/complete", booking_id),
        &attendant_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");

    let (status, _) = send(
        &admin_app,
        "DELETE",
        &format!("/bookings/{}", booking_id),
        &citizen_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &admin_app,
        "DELETE",
        &format!("/bookings/{}", booking_id),
        &attendant_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&admin_app, "POST", &format!("/bookings/{}/complete", booking_id), &attendant_token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
