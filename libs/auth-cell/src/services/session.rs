use tracing::{info, warn};

use profile_cell::Profile;
use shared_models::auth::{SessionEvent, User};
use shared_utils::jwt::issue_token;
use shared_utils::AppState;

use crate::models::{AuthError, AuthResponse, MIN_PASSWORD_LEN};

/// Identity-provider login for a citizen: the national id as a pseudo-email.
pub fn citizen_identifier(national_id: &str, domain: &str) -> String {
    format!("{}@{}", national_id.trim(), domain)
}

/// Password rules shared by registration and first login. Runs before any
/// account or profile is written.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password != confirmation {
        return Err(AuthError::ValidationError("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationError(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn start_session(state: &AppState, profile: Profile) -> Result<AuthResponse, AuthError> {
    let ttl_hours = state.config.session_ttl_hours;
    let token = issue_token(
        &profile.subject_id,
        profile.email.as_deref(),
        &state.config.jwt_secret,
        ttl_hours,
    )
    .map_err(AuthError::Token)?;

    state.publish(SessionEvent::SignedIn {
        subject_id: profile.subject_id.clone(),
    });
    info!("Session started for {} ({})", profile.subject_id, profile.role);

    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: ttl_hours * 3600,
        profile,
    })
}

/// Revokes the presented token and tells the identity provider.
pub async fn end_session(state: &AppState, user: &User, token: &str) {
    state.revoke_token(token).await;

    if let Err(e) = state.identity.sign_out(&user.id).await {
        warn!("Identity provider sign-out failed for {}: {}", user.id, e);
    }

    state.publish(SessionEvent::SignedOut {
        subject_id: user.id.clone(),
    });
    info!("Session ended for {}", user.id);
}
