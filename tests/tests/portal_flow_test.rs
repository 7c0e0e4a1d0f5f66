use axum::http::StatusCode;
use serde_json::{json, Value};

use endpoint_integration_tests::ApiTestClient;
use shared_models::Role;
use shared_utils::test_utils::{test_state, TestUser};
use shared_utils::AppState;

struct Portal {
    state: AppState,
    anonymous: ApiTestClient,
}

impl Portal {
    fn new() -> Self {
        let state = test_state();
        let anonymous = ApiTestClient::new(state.clone());
        Self { state, anonymous }
    }

    async fn owner(&self) -> ApiTestClient {
        let token = TestUser::staff("dono@gov.ao", Role::Owner)
            .seed(&self.state)
            .await
            .unwrap();
        self.anonymous.with_token(&token)
    }

    async fn register_citizen(&self, national_id: &str) -> ApiTestClient {
        let response = self
            .anonymous
            .post(
                "/auth/citizen/register",
                json!({
                    "nationalId": national_id,
                    "fullName": "Maria Cidadã",
                    "password": "segredo1",
                    "confirmPassword": "segredo1",
                    "phone": "923000000",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        self.anonymous.with_token(token_of(&response.body))
    }
}

fn token_of(body: &Value) -> &str {
    body["token"].as_str().unwrap()
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

/// Owner sets up a service offered at one institution.
async fn seed_directory(owner: &ApiTestClient) -> (String, String) {
    let service = owner
        .post(
            "/admin/services",
            json!({
                "name": "Bilhete de Identidade",
                "category": "documentacao-pessoal",
                "averageDuration": 30,
                "requirements": ["Certidão de nascimento"],
            }),
        )
        .await;
    assert_eq!(service.status, StatusCode::OK, "{}", service.body);
    let service_id = id_of(&service.body);

    let institution = owner
        .post(
            "/admin/institutions",
            json!({
                "name": "Hospital Central",
                "address": "Luanda",
                "maxCapacity": 5,
            }),
        )
        .await;
    assert_eq!(institution.status, StatusCode::OK, "{}", institution.body);
    let institution_id = id_of(&institution.body);

    let linked = owner
        .post_empty(&format!(
            "/admin/institutions/{}/services/{}",
            institution_id, service_id
        ))
        .await;
    assert_eq!(linked.status, StatusCode::OK, "{}", linked.body);
    assert_eq!(linked.body["serviceIds"], json!([service_id]));

    (service_id, institution_id)
}

#[tokio::test]
async fn citizen_books_and_staff_completes() {
    let portal = Portal::new();
    let owner = portal.owner().await;
    let (service_id, institution_id) = seed_directory(&owner).await;

    let citizen = portal.register_citizen("004512345LA042").await;

    let categories = citizen.get("/catalog/categories").await;
    assert_eq!(categories.status, StatusCode::OK);

    let offered = citizen
        .get(&format!("/catalog/services/{}/institutions", service_id))
        .await;
    assert_eq!(offered.status, StatusCode::OK);
    assert_eq!(offered.body["total"], 1);
    assert_eq!(offered.body["institutions"][0]["name"], "Hospital Central");
    assert_eq!(offered.body["institutions"][0]["pinned"], false);

    let pinned = citizen
        .post_empty(&format!("/profile/me/pins/{}", institution_id))
        .await;
    assert_eq!(pinned.status, StatusCode::OK);
    let offered = citizen
        .get(&format!("/catalog/services/{}/institutions", service_id))
        .await;
    assert_eq!(offered.body["institutions"][0]["pinned"], true);

    let booked = citizen
        .post(
            "/bookings",
            json!({
                "serviceId": service_id,
                "institutionId": institution_id,
                "date": "2024-06-10",
                "timeSlot": "09:00",
            }),
        )
        .await;
    assert_eq!(booked.status, StatusCode::OK, "{}", booked.body);
    assert_eq!(booked.body["status"], "scheduled");
    assert_eq!(booked.body["serviceType"], "Bilhete de Identidade");
    assert_eq!(booked.body["institutionName"], "Hospital Central");
    let booking_id = id_of(&booked.body);

    let active = citizen.get("/bookings").await;
    assert_eq!(active.body["total"], 1);

    let stats = owner.get("/admin/stats").await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalBookings"], 1);
    assert_eq!(stats.body["scheduledBookings"], 1);

    let listed = owner.get("/admin/bookings?search=maria").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);
    assert_eq!(listed.body["bookings"][0]["userProfile"]["nationalId"], "004512345LA042");

    let completed = owner
        .post_empty(&format!("/admin/bookings/{}/complete", booking_id))
        .await;
    assert_eq!(completed.status, StatusCode::OK, "{}", completed.body);
    assert_eq!(completed.body["status"], "completed");

    let active = citizen.get("/bookings").await;
    assert_eq!(active.body["total"], 0);
    let history = citizen.get("/bookings/history").await;
    assert_eq!(history.body["total"], 1);
    assert_eq!(history.body["bookings"][0]["status"], "completed");

    // A completed booking can no longer be cancelled.
    let cancelled = citizen
        .post_empty(&format!("/bookings/{}/cancel", booking_id))
        .await;
    assert_eq!(cancelled.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn collaborator_onboarding_and_role_changes() {
    let portal = Portal::new();
    let owner = portal.owner().await;

    let created = owner
        .post(
            "/admin/collaborators",
            json!({
                "fullName": "João Atendente",
                "email": "Joao@Gov.ao",
                "phone": "923444555",
                "role": "attendant",
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let collaborator_id = id_of(&created.body);

    let login = portal
        .anonymous
        .post(
            "/auth/staff/login",
            json!({ "email": "joao@gov.ao", "password": "qualquer" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login.body["first_login_required"], true);

    let first = portal
        .anonymous
        .post(
            "/auth/staff/first-login",
            json!({
                "email": "joao@gov.ao",
                "password": "abcdef",
                "confirmPassword": "abcdef",
            }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.body["profile"]["role"], "attendant");
    let attendant = portal.anonymous.with_token(token_of(&first.body));

    let navigation = attendant.get("/admin/navigation").await;
    assert_eq!(navigation.status, StatusCode::OK);
    assert_eq!(
        navigation.body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["resource"].as_str().unwrap())
            .collect::<Vec<_>>(),
        vec!["dashboard", "bookings"]
    );

    let denied = attendant.get("/admin/institutions").await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["redirect"], "/admin");
    let denied = attendant.get("/admin/services").await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let promoted = owner
        .put(
            &format!("/admin/collaborators/{}", collaborator_id),
            json!({ "role": "supervisor" }),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK, "{}", promoted.body);

    // The role is read on every request, so the same session now sees services.
    let services = attendant.get("/admin/services").await;
    assert_eq!(services.status, StatusCode::OK, "{}", services.body);
    let still_denied = attendant.get("/admin/collaborators").await;
    assert_eq!(still_denied.status, StatusCode::FORBIDDEN);

    let me = attendant.get("/profile/me").await;
    assert_eq!(me.body["role"], "supervisor");
    assert_eq!(me.body["fullName"], "João Atendente");

    let categories = attendant.get("/catalog/categories").await;
    assert_eq!(categories.status, StatusCode::OK);

    let removed = owner
        .delete(&format!("/admin/collaborators/{}", collaborator_id))
        .await;
    assert_eq!(removed.status, StatusCode::OK, "{}", removed.body);

    // The token is still valid, but without a profile it is no session.
    for path in ["/catalog/categories", "/bookings", "/admin/bookings"] {
        let response = attendant.get(path).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(response.body["redirect"], "/");
    }
}

#[tokio::test]
async fn citizens_stay_out_of_admin_and_staff_login() {
    let portal = Portal::new();
    let citizen = portal.register_citizen("004512345LA042").await;

    let denied = citizen.get("/admin/stats").await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let navigation = citizen.get("/admin/navigation").await;
    assert_eq!(navigation.status, StatusCode::FORBIDDEN);

    let staff_login = portal
        .anonymous
        .post(
            "/auth/staff/login",
            json!({ "email": "004512345LA042@gov.ao", "password": "segredo1" }),
        )
        .await;
    assert_eq!(staff_login.status, StatusCode::UNAUTHORIZED);
    assert_eq!(staff_login.body["error"], "Invalid credentials or unauthorized access");
}

#[tokio::test]
async fn contact_edits_and_logout() {
    let portal = Portal::new();
    let citizen = portal.register_citizen("004512345LA042").await;

    let updated = citizen
        .patch("/profile/me", json!({ "phone": "923999888", "email": "maria@exemplo.ao" }))
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["phone"], "923999888");
    assert_eq!(updated.body["email"], "maria@exemplo.ao");
    assert_eq!(updated.body["nationalId"], "004512345LA042");

    let session = citizen.get("/auth/session").await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.body["profile"]["phone"], "923999888");

    let out = citizen.post_empty("/auth/logout").await;
    assert_eq!(out.status, StatusCode::OK);

    let after = citizen.get("/bookings").await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.body["redirect"], "/");
}
