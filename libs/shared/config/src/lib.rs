use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub storage_backend: StorageBackend,
    pub citizen_email_domain: String,
    pub booking_window_days: u32,
    pub default_slot_capacity: u32,
    pub enforce_slot_capacity: bool,
    pub port: u16,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials of the first administrator, seeded at startup when present.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_anon_key = env::var("SUPABASE_ANON_PUBLIC_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            });
        let supabase_service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_SERVICE_ROLE_KEY not set, account removal will be skipped");
                String::new()
            });
        let jwt_secret = env::var("PORTAL_JWT_SECRET")
            .or_else(|_| env::var("SUPABASE_JWT_SECRET"))
            .unwrap_or_else(|_| {
                warn!("PORTAL_JWT_SECRET not set, using empty value");
                String::new()
            });

        let storage_backend = match env::var("PORTAL_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("supabase") => StorageBackend::Supabase,
            Ok(other) => {
                warn!("Unknown PORTAL_BACKEND '{}', falling back to detection", other);
                detect_backend(&supabase_url, &supabase_anon_key)
            }
            Err(_) => detect_backend(&supabase_url, &supabase_anon_key),
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                email,
                password,
                full_name: env::var("BOOTSTRAP_ADMIN_NAME")
                    .unwrap_or_else(|_| "Administrador".to_string()),
            }),
            _ => None,
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            supabase_service_role_key,
            jwt_secret,
            session_ttl_hours: parse_or("PORTAL_SESSION_TTL_HOURS", 24),
            storage_backend,
            citizen_email_domain: env::var("CITIZEN_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "gov.ao".to_string()),
            booking_window_days: parse_or("BOOKING_WINDOW_DAYS", 30),
            default_slot_capacity: parse_or("BOOKING_DEFAULT_CAPACITY", 10),
            enforce_slot_capacity: parse_or("BOOKING_ENFORCE_CAPACITY", false),
            port: parse_or("PORTAL_PORT", 3000),
            bootstrap_admin,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Configuration for tests and local runs: in-memory backend, fixed secret.
    pub fn for_memory(jwt_secret: &str) -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            jwt_secret: jwt_secret.to_string(),
            session_ttl_hours: 24,
            storage_backend: StorageBackend::Memory,
            citizen_email_domain: "gov.ao".to_string(),
            booking_window_days: 30,
            default_slot_capacity: 10,
            enforce_slot_capacity: false,
            port: 3000,
            bootstrap_admin: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        if self.jwt_secret.is_empty() {
            return false;
        }
        match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => self.is_supabase_configured(),
        }
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn detect_backend(url: &str, anon_key: &str) -> StorageBackend {
    if url.is_empty() || anon_key.is_empty() {
        warn!("Supabase not configured, using in-memory storage");
        StorageBackend::Memory
    } else {
        StorageBackend::Supabase
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
