use chrono::Utc;
use tracing::{error, info, warn};

use directory_cell::services::collaborator::normalize_email;
use directory_cell::services::CollaboratorService;
use profile_cell::{Profile, ProfileService};
use shared_models::Role;
use shared_utils::AppState;

use crate::models::{AuthError, AuthResponse, FirstLoginRequest, StaffLoginRequest};
use crate::services::session::{start_session, validate_new_password};

pub struct StaffAuthService<'a> {
    state: &'a AppState,
}

impl<'a> StaffAuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn collaborators(&self) -> CollaboratorService {
        CollaboratorService::new(self.state.store.clone(), self.state.identity.clone())
    }

    /// Email/password login for the admin panel.
    ///
    /// Citizens are signed out again and get the generic denial. A failed
    /// login for a collaborator who never set a password reports
    /// `FirstLoginRequired` instead.
    pub async fn login(&self, request: StaffLoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);

        let subject_id = match self.state.identity.sign_in(&email, &request.password).await {
            Ok(subject_id) => subject_id,
            Err(e) if e.is_credential_failure() => {
                return match self.collaborators().find_by_email(&email).await? {
                    Some(collaborator) if collaborator.subject_id.is_none() => {
                        info!("First login pending for collaborator {}", collaborator.id);
                        Err(AuthError::FirstLoginRequired { email })
                    }
                    _ => {
                        warn!("Staff login rejected for {}", email);
                        Err(AuthError::InvalidCredentials)
                    }
                };
            }
            Err(e) => return Err(e.into()),
        };

        let profile = ProfileService::new(self.state.store.clone())
            .get_profile(&subject_id)
            .await?;

        match profile {
            Some(profile) if profile.role.is_staff() => start_session(self.state, profile),
            Some(_) => {
                warn!("Citizen {} attempted staff login", subject_id);
                if let Err(e) = self.state.identity.sign_out(&subject_id).await {
                    warn!("Sign-out after denied staff login failed: {}", e);
                }
                Err(AuthError::InvalidCredentials)
            }
            None => {
                warn!("Subject {} signed in without a profile", subject_id);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Sets the password of a pre-registered collaborator and writes its profile.
    pub async fn first_login(&self, request: FirstLoginRequest) -> Result<AuthResponse, AuthError> {
        validate_new_password(&request.password, &request.confirm_password)?;

        let email = normalize_email(&request.email);
        let collaborators = self.collaborators();
        let collaborator = collaborators
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::CollaboratorNotFound(email.clone()))?;

        if collaborator.subject_id.is_some() {
            return Err(AuthError::AlreadyProvisioned(email));
        }

        let subject_id = self.state.identity.sign_up(&email, &request.password).await?;

        let profile = Profile {
            subject_id: subject_id.clone(),
            national_id: String::new(),
            full_name: collaborator.full_name,
            phone: collaborator.phone,
            email: Some(collaborator.email),
            role: collaborator.role,
            pinned_institutions: Vec::new(),
            created_at: Some(Utc::now()),
        };
        let profiles = ProfileService::new(self.state.store.clone());
        let provisioned: Result<(), AuthError> = async {
            profiles.write_profile(&profile).await?;
            collaborators
                .mark_provisioned(&collaborator.id, &subject_id)
                .await?;
            Ok(())
        }
        .await;

        // Undo the account so the collaborator can retry the first login.
        if let Err(e) = provisioned {
            error!("Provisioning of collaborator {} failed: {}", collaborator.id, e);
            if let Err(cleanup) = profiles.delete_profile(&subject_id).await {
                warn!("Profile {} left behind: {}", subject_id, cleanup);
            }
            if let Err(cleanup) = self.state.identity.remove_account(&subject_id).await {
                warn!("Account {} left without collaborator link: {}", subject_id, cleanup);
            }
            return Err(e);
        }

        info!("Collaborator {} provisioned as {}", collaborator.id, subject_id);
        start_session(self.state, profile)
    }
}

/// Makes sure the configured administrator can log in with an admin profile.
pub async fn bootstrap_admin(
    state: &AppState,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<Profile, AuthError> {
    let email = normalize_email(email);

    let subject_id = match state.identity.sign_in(&email, password).await {
        Ok(subject_id) => subject_id,
        Err(e) if e.is_credential_failure() => {
            info!("Creating bootstrap admin account {}", email);
            state.identity.sign_up(&email, password).await?
        }
        Err(e) => return Err(e.into()),
    };

    let profiles = ProfileService::new(state.store.clone());
    if let Some(existing) = profiles.get_profile(&subject_id).await? {
        if existing.role.meets_minimum(Role::Admin) {
            return Ok(existing);
        }
    }

    let profile = Profile {
        subject_id,
        national_id: String::new(),
        full_name: full_name.to_string(),
        phone: None,
        email: Some(email),
        role: Role::Admin,
        pinned_institutions: Vec::new(),
        created_at: Some(Utc::now()),
    };
    profiles.write_profile(&profile).await?;
    info!("Bootstrap admin profile ready for {}", profile.subject_id);
    Ok(profile)
}
