use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{Collection, StoreError};
use shared_models::auth::User;
use shared_models::Role;

use crate::jwt::issue_token;
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

pub struct TestConfig {
    pub jwt_secret: String,
    pub citizen_email_domain: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            citizen_email_domain: "gov.ao".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::for_memory(&self.jwt_secret);
        config.citizen_email_domain = self.citizen_email_domain.clone();
        config
    }

    /// Fresh in-memory state: empty store, empty identity provider.
    pub fn to_state(&self) -> AppState {
        AppState::in_memory(self.to_app_config())
    }
}

pub fn test_state() -> AppState {
    TestConfig::default().to_state()
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            national_id: String::new(),
            role,
        }
    }

    pub fn citizen(national_id: &str) -> Self {
        let mut user = Self::new(&format!("{}@gov.ao", national_id), Role::Citizen);
        user.national_id = national_id.to_string();
        user.full_name = "Maria Cidadã".to_string();
        user
    }

    pub fn staff(email: &str, role: Role) -> Self {
        Self::new(email, role)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            created_at: None,
        }
    }

    pub fn profile_json(&self) -> Value {
        json!({
            "uid": self.id,
            "nationalId": self.national_id,
            "fullName": self.full_name,
            "email": self.email,
            "role": self.role,
            "pinnedInstitutions": [],
        })
    }

    pub fn token(&self, secret: &str) -> String {
        issue_token(&self.id, Some(&self.email), secret, 1).unwrap_or_default()
    }

    /// Writes this user's profile and returns a bearer token for it.
    pub async fn seed(&self, state: &AppState) -> Result<String, StoreError> {
        state
            .store
            .set(Collection::Users, &self.id, self.profile_json())
            .await?;
        Ok(self.token(&state.config.jwt_secret))
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn profile_row(user: &TestUser) -> Value {
        let mut row = user.profile_json();
        row["id"] = json!(user.id);
        row
    }

    pub fn institution_row(id: &str, name: &str, service_ids: &[&str]) -> Value {
        json!({
            "id": id,
            "name": name,
            "address": "Rua Principal, Luanda",
            "coordinates": { "lat": -8.8383, "lng": 13.2344 },
            "serviceIds": service_ids,
            "availableSlots": [],
            "maxCapacity": 10,
        })
    }

    pub fn booking_row(id: &str, user_id: &str, date: &str, slot: &str) -> Value {
        json!({
            "id": id,
            "userId": user_id,
            "serviceCategory": "documentacao-pessoal",
            "serviceType": "Bilhete de Identidade",
            "institutionId": "inst-1",
            "institutionName": "Hospital Central",
            "date": date,
            "timeSlot": slot,
            "status": "scheduled",
            "createdAt": "2024-06-01T10:00:00Z",
            "updatedAt": "2024-06-01T10:00:00Z",
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
