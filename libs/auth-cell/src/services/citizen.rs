use tracing::{debug, error, warn};

use profile_cell::{NewCitizenProfile, ProfileService};
use shared_utils::AppState;

use crate::models::{AuthError, AuthResponse, CitizenLoginRequest, CitizenRegisterRequest};
use crate::services::session::{citizen_identifier, start_session, validate_new_password};

pub struct CitizenAuthService<'a> {
    state: &'a AppState,
}

impl<'a> CitizenAuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn identifier(&self, national_id: &str) -> String {
        citizen_identifier(national_id, &self.state.config.citizen_email_domain)
    }

    pub async fn register(&self, request: CitizenRegisterRequest) -> Result<AuthResponse, AuthError> {
        if request.national_id.trim().is_empty() {
            return Err(AuthError::ValidationError("National id is required".to_string()));
        }
        if request.full_name.trim().is_empty() {
            return Err(AuthError::ValidationError("Full name is required".to_string()));
        }
        validate_new_password(&request.password, &request.confirm_password)?;

        let identifier = self.identifier(&request.national_id);
        let subject_id = self.state.identity.sign_up(&identifier, &request.password).await?;

        let created = ProfileService::new(self.state.store.clone())
            .create_citizen_profile(
                &subject_id,
                NewCitizenProfile {
                    national_id: request.national_id,
                    full_name: request.full_name,
                    phone: request.phone,
                    email: request.email,
                },
            )
            .await;

        let profile = match created {
            Ok(profile) => profile,
            Err(e) => {
                error!("Profile for new citizen {} not written: {}", subject_id, e);
                if let Err(cleanup) = self.state.identity.remove_account(&subject_id).await {
                    warn!("Account {} left without profile: {}", subject_id, cleanup);
                }
                return Err(e.into());
            }
        };

        start_session(self.state, profile)
    }

    pub async fn login(&self, request: CitizenLoginRequest) -> Result<AuthResponse, AuthError> {
        let identifier = self.identifier(&request.national_id);

        let subject_id = match self.state.identity.sign_in(&identifier, &request.password).await {
            Ok(subject_id) => subject_id,
            Err(e) if e.is_credential_failure() => {
                debug!("Citizen login rejected for {}", identifier);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        match ProfileService::new(self.state.store.clone())
            .get_profile(&subject_id)
            .await?
        {
            Some(profile) => start_session(self.state, profile),
            None => {
                warn!("Subject {} signed in without a profile", subject_id);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
