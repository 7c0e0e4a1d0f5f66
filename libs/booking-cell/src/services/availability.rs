use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use directory_cell::{Institution, ServiceCategory, TimeSlot};
use shared_database::store::fetch_all;
use shared_database::{Collection, DocumentStore, Query};

use crate::models::{Booking, BookingError, BookingStatus};

const DAY_START_HOUR: u32 = 8;
const DAY_END_HOUR: u32 = 17;
const LUNCH_HOUR: u32 = 12;
const SLOT_MINUTES: [u32; 2] = [0, 30];

/// Default times of day: 08:00 to 16:30 every half hour, minus the lunch hour.
pub fn default_grid() -> Vec<String> {
    (DAY_START_HOUR..DAY_END_HOUR)
        .filter(|hour| *hour != LUNCH_HOUR)
        .flat_map(|hour| SLOT_MINUTES.map(|minute| format!("{:02}:{:02}", hour, minute)))
        .collect()
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Bookable dates: from tomorrow up to `window_days` ahead, weekends skipped.
pub fn available_dates(today: NaiveDate, window_days: u32) -> Vec<NaiveDate> {
    (1..=i64::from(window_days))
        .map(|offset| today + Duration::days(offset))
        .filter(|date| is_business_day(*date))
        .collect()
}

fn scheduled_at(institution_id: &str, date: NaiveDate, category: ServiceCategory) -> Query {
    Query::new()
        .eq("institutionId", institution_id)
        .eq("date", date.to_string())
        .eq("serviceCategory", category.as_str())
        .eq("status", BookingStatus::Scheduled.as_str())
}

pub struct AvailabilityService {
    store: Arc<dyn DocumentStore>,
    default_capacity: u32,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn DocumentStore>, default_capacity: u32) -> Self {
        Self {
            store,
            default_capacity,
        }
    }

    fn capacity_of(&self, institution: &Institution) -> u32 {
        if institution.max_capacity > 0 {
            institution.max_capacity
        } else {
            self.default_capacity
        }
    }

    /// Times of day an institution takes bookings, with per-slot capacity.
    /// A stored schedule replaces the default grid.
    pub fn schedule_for(&self, institution: &Institution) -> Vec<(String, u32)> {
        let fallback = self.capacity_of(institution);
        if institution.has_custom_schedule() {
            institution
                .available_slots
                .iter()
                .map(|slot| {
                    let capacity = if slot.max_capacity > 0 { slot.max_capacity } else { fallback };
                    (slot.time.clone(), capacity)
                })
                .collect()
        } else {
            default_grid().into_iter().map(|time| (time, fallback)).collect()
        }
    }

    /// Checks that the date is a business day and the time is on the
    /// institution's schedule, returning the slot capacity.
    pub fn slot_capacity(
        &self,
        institution: &Institution,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<u32, BookingError> {
        if !is_business_day(date) {
            return Err(BookingError::InvalidDate(format!("{} is not a business day", date)));
        }

        self.schedule_for(institution)
            .into_iter()
            .find(|(time, _)| time == time_slot)
            .map(|(_, capacity)| capacity)
            .ok_or_else(|| {
                BookingError::InvalidSlot(format!("{} is not offered by {}", time_slot, institution.name))
            })
    }

    pub async fn count_for_slot(
        &self,
        institution_id: &str,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> Result<usize, BookingError> {
        let query = scheduled_at(institution_id, date, category);
        Ok(self.store.count(Collection::Bookings, &query).await?)
    }

    pub async fn count_at(
        &self,
        institution_id: &str,
        date: NaiveDate,
        category: ServiceCategory,
        time_slot: &str,
    ) -> Result<usize, BookingError> {
        let query = scheduled_at(institution_id, date, category).eq("timeSlot", time_slot);
        Ok(self.store.count(Collection::Bookings, &query).await?)
    }

    /// The day's slots at one institution with live occupancy.
    pub async fn slot_availability(
        &self,
        institution: &Institution,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let query = scheduled_at(&institution.id, date, category);
        let bookings: Vec<Booking> =
            fetch_all(self.store.as_ref(), Collection::Bookings, &query).await?;

        let mut occupancy: HashMap<&str, u32> = HashMap::new();
        for booking in &bookings {
            *occupancy.entry(booking.time_slot.as_str()).or_default() += 1;
        }

        let slots: Vec<TimeSlot> = self
            .schedule_for(institution)
            .into_iter()
            .map(|(time, max_capacity)| {
                let current_bookings = occupancy.get(time.as_str()).copied().unwrap_or(0);
                TimeSlot {
                    available: current_bookings < max_capacity,
                    time,
                    current_bookings,
                    max_capacity,
                }
            })
            .collect();

        debug!(
            "{} slots for {} on {} ({} booked)",
            slots.len(),
            institution.id,
            date,
            bookings.len()
        );
        Ok(slots)
    }
}
