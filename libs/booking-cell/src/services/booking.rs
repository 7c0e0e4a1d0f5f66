use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};

use directory_cell::services::{InstitutionService, ServiceCatalog};
use directory_cell::Institution;
use shared_config::AppConfig;
use shared_database::store::{encode, fetch_all, fetch_one};
use shared_database::{Collection, Direction, DocumentStore, Query};
use shared_models::Role;

use crate::models::{
    Booking, BookingError, BookingStatus, CreateBookingRequest, NewBooking, RescheduleOutcome,
    RescheduleRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::lifecycle::{check_transition, Transition};

/// The owner of a booking and attendants or above may change it.
pub fn can_manage(booking: &Booking, subject_id: &str, role: Role) -> bool {
    booking.user_id == subject_id || role.meets_minimum(Role::Attendant)
}

fn by_date_then_slot(a: &Booking, b: &Booking) -> std::cmp::Ordering {
    a.date.cmp(&b.date).then_with(|| a.time_slot.cmp(&b.time_slot))
}

pub struct BookingService {
    store: Arc<dyn DocumentStore>,
    availability: AvailabilityService,
    enforce_capacity: bool,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), config.default_slot_capacity),
            enforce_capacity: config.enforce_slot_capacity,
            store,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Booking>, BookingError> {
        Ok(fetch_one(self.store.as_ref(), Collection::Bookings, id).await?)
    }

    pub async fn require(&self, id: &str) -> Result<Booking, BookingError> {
        self.get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(id.to_string()))
    }

    /// Resolves the service and institution a citizen picked, then books.
    pub async fn book(
        &self,
        user_id: &str,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let catalog = ServiceCatalog::new(self.store.clone());
        let institutions = InstitutionService::new(self.store.clone());
        let (service, institution) = tokio::try_join!(
            catalog.require(&request.service_id),
            institutions.require(&request.institution_id),
        )?;

        if !institution.offers(&service.id) {
            return Err(BookingError::ValidationError(format!(
                "{} does not offer {}",
                institution.name, service.name
            )));
        }

        let new_booking = NewBooking {
            user_id: user_id.to_string(),
            service_id: Some(service.id.clone()),
            service_category: service.category,
            service_type: service.name,
            institution_id: institution.id.clone(),
            institution_name: institution.name.clone(),
            date: request.date,
            time_slot: request.time_slot,
        };
        self.insert(&institution, new_booking, None).await
    }

    pub async fn create(&self, new_booking: NewBooking) -> Result<Booking, BookingError> {
        let institution = InstitutionService::new(self.store.clone())
            .require(&new_booking.institution_id)
            .await?;
        self.insert(&institution, new_booking, None).await
    }

    async fn insert(
        &self,
        institution: &Institution,
        new_booking: NewBooking,
        rescheduled_from: Option<String>,
    ) -> Result<Booking, BookingError> {
        let capacity =
            self.availability
                .slot_capacity(institution, new_booking.date, &new_booking.time_slot)?;

        if self.enforce_capacity {
            // Read-then-write: concurrent requests can still overshoot by a few.
            let taken = self
                .availability
                .count_at(
                    &institution.id,
                    new_booking.date,
                    new_booking.service_category,
                    &new_booking.time_slot,
                )
                .await?;
            if taken >= capacity as usize {
                warn!(
                    "Slot {} {} at {} is full ({}/{})",
                    new_booking.date, new_booking.time_slot, institution.id, taken, capacity
                );
                return Err(BookingError::SlotFull {
                    date: new_booking.date,
                    time_slot: new_booking.time_slot,
                });
            }
        }

        let now = Utc::now();
        let mut booking = Booking {
            id: String::new(),
            user_id: new_booking.user_id,
            service_id: new_booking.service_id,
            service_category: new_booking.service_category,
            service_type: new_booking.service_type,
            institution_id: new_booking.institution_id,
            institution_name: new_booking.institution_name,
            date: new_booking.date,
            time_slot: new_booking.time_slot,
            status: BookingStatus::Scheduled,
            created_at: now,
            updated_at: now,
            rescheduled_from,
            rescheduled_to: None,
        };

        booking.id = self
            .store
            .create(Collection::Bookings, encode(&booking)?)
            .await?;

        info!(
            "Booking {} created for {} at {} on {} {}",
            booking.id, booking.user_id, booking.institution_id, booking.date, booking.time_slot
        );
        Ok(booking)
    }

    /// Upcoming bookings of one citizen, soonest first.
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let query = Query::new()
            .eq("userId", user_id)
            .eq("status", BookingStatus::Scheduled.as_str())
            .order_by("date", Direction::Asc);
        let mut bookings: Vec<Booking> =
            fetch_all(self.store.as_ref(), Collection::Bookings, &query).await?;
        bookings.sort_by(by_date_then_slot);

        debug!("{} active bookings for {}", bookings.len(), user_id);
        Ok(bookings)
    }

    /// Everything no longer scheduled, most recent date first.
    pub async fn list_history(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let query = Query::new()
            .eq("userId", user_id)
            .any_of("status", BookingStatus::HISTORY.map(BookingStatus::as_str))
            .order_by("date", Direction::Desc);
        let mut bookings: Vec<Booking> =
            fetch_all(self.store.as_ref(), Collection::Bookings, &query).await?;
        bookings.sort_by(|a, b| by_date_then_slot(b, a));

        debug!("{} past bookings for {}", bookings.len(), user_id);
        Ok(bookings)
    }

    pub async fn list_all_active(&self) -> Result<Vec<Booking>, BookingError> {
        let query = Query::new()
            .eq("status", BookingStatus::Scheduled.as_str())
            .order_by("date", Direction::Asc);
        let mut bookings: Vec<Booking> =
            fetch_all(self.store.as_ref(), Collection::Bookings, &query).await?;
        bookings.sort_by(by_date_then_slot);
        Ok(bookings)
    }

    pub async fn cancel(&self, id: &str) -> Result<Booking, BookingError> {
        self.mark(id, BookingStatus::Cancelled).await
    }

    pub async fn complete(&self, id: &str) -> Result<Booking, BookingError> {
        self.mark(id, BookingStatus::Completed).await
    }

    async fn mark(&self, id: &str, target: BookingStatus) -> Result<Booking, BookingError> {
        let mut booking = self.require(id).await?;

        if check_transition(booking.status, target)? == Transition::AlreadyApplied {
            return Ok(booking);
        }

        let now = Utc::now();
        self.store
            .update(
                Collection::Bookings,
                id,
                json!({ "status": target, "updatedAt": now }),
            )
            .await?;

        booking.status = target;
        booking.updated_at = now;
        info!("Booking {} marked {}", id, target);
        Ok(booking)
    }

    /// Moves a scheduled booking to a new slot.
    ///
    /// A new scheduled booking is created first; the original then becomes a
    /// `rescheduled` history entry pointing at it. If the original cannot be
    /// updated the new booking is removed again.
    pub async fn reschedule(
        &self,
        id: &str,
        request: RescheduleRequest,
    ) -> Result<RescheduleOutcome, BookingError> {
        let mut previous = self.require(id).await?;
        check_transition(previous.status, BookingStatus::Rescheduled)?;

        let institution_id = request
            .institution_id
            .unwrap_or_else(|| previous.institution_id.clone());
        let institution = InstitutionService::new(self.store.clone())
            .require(&institution_id)
            .await?;

        let service_id = self.resolve_service_id(&previous).await?;
        if institution.id != previous.institution_id {
            let offered = service_id
                .as_deref()
                .is_some_and(|service_id| institution.offers(service_id));
            if !offered {
                warn!(
                    "Reschedule of {} refused: {} does not offer {}",
                    id, institution.id, previous.service_type
                );
                return Err(BookingError::ValidationError(format!(
                    "{} does not offer {}",
                    institution.name, previous.service_type
                )));
            }
        }

        let new_booking = NewBooking {
            user_id: previous.user_id.clone(),
            service_id,
            service_category: previous.service_category,
            service_type: previous.service_type.clone(),
            institution_id: institution.id.clone(),
            institution_name: institution.name.clone(),
            date: request.date,
            time_slot: request.time_slot,
        };
        let current = self
            .insert(&institution, new_booking, Some(previous.id.clone()))
            .await?;

        let now = Utc::now();
        let patch = json!({
            "status": BookingStatus::Rescheduled,
            "rescheduledTo": current.id,
            "updatedAt": now,
        });
        if let Err(e) = self.store.update(Collection::Bookings, id, patch).await {
            error!("Failed to close booking {} after reschedule: {}", id, e);
            if let Err(cleanup) = self.store.delete(Collection::Bookings, &current.id).await {
                error!("Orphaned booking {} left behind: {}", current.id, cleanup);
            }
            return Err(e.into());
        }

        previous.status = BookingStatus::Rescheduled;
        previous.rescheduled_to = Some(current.id.clone());
        previous.updated_at = now;

        info!("Booking {} rescheduled to {}", previous.id, current.id);
        Ok(RescheduleOutcome { previous, current })
    }

    /// Service behind a booking; older rows only carry the category and name.
    async fn resolve_service_id(&self, booking: &Booking) -> Result<Option<String>, BookingError> {
        if booking.service_id.is_some() {
            return Ok(booking.service_id.clone());
        }
        let service_id = ServiceCatalog::new(self.store.clone())
            .services_by_category(booking.service_category)
            .await?
            .into_iter()
            .find(|service| service.name == booking.service_type)
            .map(|service| service.id);
        Ok(service_id)
    }

    pub async fn delete(&self, id: &str) -> Result<(), BookingError> {
        self.require(id).await?;
        self.store.delete(Collection::Bookings, id).await?;
        info!("Booking {} deleted", id);
        Ok(())
    }
}
