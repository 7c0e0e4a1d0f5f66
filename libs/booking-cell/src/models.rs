use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use directory_cell::{DirectoryError, ServiceCategory};
use profile_cell::{Profile, ProfileError};
use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// BOOKING
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl BookingStatus {
    /// States that only show up in a citizen's history.
    pub const HISTORY: [BookingStatus; 3] = [
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Rescheduled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != BookingStatus::Scheduled
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citizen's appointment at one institution, date and time of day.
///
/// `serviceType` and `institutionName` are copied when the booking is made
/// and are not refreshed if the service or institution is renamed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    /// Missing on rows written before the service id was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub service_category: ServiceCategory,
    pub service_type: String,
    pub institution_id: String,
    pub institution_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescheduled_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescheduled_to: Option<String>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Scheduled
    }
}

/// Fully resolved booking input, display names included.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: String,
    pub service_id: Option<String>,
    pub service_category: ServiceCategory,
    pub service_type: String,
    pub institution_id: String,
    pub institution_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub institution_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time_slot: String,
    /// Defaults to the booking's current institution.
    #[serde(default)]
    pub institution_id: Option<String>,
}

/// Both rows touched by a reschedule.
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleOutcome {
    pub previous: Booking,
    pub current: Booking,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub institution_id: String,
    pub date: NaiveDate,
    pub category: ServiceCategory,
}

// ==============================================================================
// ADMIN VIEWS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBookingFilter {
    /// Matches citizen name, national id, service or institution name.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact service display name.
    #[serde(default)]
    pub service: Option<String>,
    /// Exact institution display name.
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub user_profile: Option<Profile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bookings: usize,
    pub scheduled_bookings: usize,
    pub services: usize,
    pub institutions: usize,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Booking cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Invalid time slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid booking date: {0}")]
    InvalidDate(String),

    #[error("No capacity left at {time_slot} on {date}")]
    SlotFull { date: NaiveDate, time_slot: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not allowed to manage this booking")]
    Forbidden,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) => AppError::NotFound(err.to_string()),
            BookingError::InvalidStatusTransition { .. } | BookingError::SlotFull { .. } => {
                AppError::Conflict(err.to_string())
            }
            BookingError::InvalidSlot(_) | BookingError::InvalidDate(_) => {
                AppError::ValidationError(err.to_string())
            }
            BookingError::ValidationError(msg) => AppError::ValidationError(msg),
            BookingError::Forbidden => AppError::Forbidden(err.to_string()),
            BookingError::Directory(e) => e.into(),
            BookingError::Profile(e) => e.into(),
            BookingError::Store(e) => e.into(),
        }
    }
}
