use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use profile_cell::{Profile, ProfileService};
use shared_database::{Collection, DocumentStore, Query};

use crate::models::{AdminBookingFilter, Booking, BookingError, BookingStatus, DashboardStats, EnrichedBooking};

fn matches_filter(entry: &EnrichedBooking, filter: &AdminBookingFilter) -> bool {
    let booking = &entry.booking;

    if let Some(service) = filter.service.as_deref().filter(|s| !s.is_empty()) {
        if booking.service_type != service {
            return false;
        }
    }
    if let Some(institution) = filter.institution.as_deref().filter(|s| !s.is_empty()) {
        if booking.institution_name != institution {
            return false;
        }
    }

    let term = match filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(term) => term.to_lowercase(),
        None => return true,
    };
    let (name, national_id) = entry
        .user_profile
        .as_ref()
        .map(|p| (p.full_name.to_lowercase(), p.national_id.to_lowercase()))
        .unwrap_or_default();

    name.contains(&term)
        || national_id.contains(&term)
        || booking.service_type.to_lowercase().contains(&term)
        || booking.institution_name.to_lowercase().contains(&term)
}

pub struct DashboardService {
    store: Arc<dyn DocumentStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn stats(&self) -> Result<DashboardStats, BookingError> {
        let all = Query::new();
        let scheduled = Query::new().eq("status", BookingStatus::Scheduled.as_str());

        let (total_bookings, scheduled_bookings, services, institutions) = tokio::try_join!(
            self.store.count(Collection::Bookings, &all),
            self.store.count(Collection::Bookings, &scheduled),
            self.store.count(Collection::Services, &all),
            self.store.count(Collection::Institutions, &all),
        )?;

        Ok(DashboardStats {
            total_bookings,
            scheduled_bookings,
            services,
            institutions,
        })
    }

    /// Attaches each citizen's profile. A profile that fails to load is
    /// reported as missing instead of failing the whole list.
    pub async fn enrich(&self, bookings: Vec<Booking>) -> Vec<EnrichedBooking> {
        let user_ids: Vec<String> = bookings
            .iter()
            .map(|b| b.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let profiles = ProfileService::new(self.store.clone());
        let fetched = join_all(user_ids.iter().map(|id| profiles.get_profile(id))).await;

        let mut by_user: HashMap<String, Option<Profile>> = HashMap::new();
        for (user_id, result) in user_ids.into_iter().zip(fetched) {
            let profile = result.unwrap_or_else(|e| {
                warn!("Could not load profile {}: {}", user_id, e);
                None
            });
            by_user.insert(user_id, profile);
        }

        bookings
            .into_iter()
            .map(|booking| EnrichedBooking {
                user_profile: by_user.get(&booking.user_id).cloned().flatten(),
                booking,
            })
            .collect()
    }

    pub fn filter(entries: Vec<EnrichedBooking>, filter: &AdminBookingFilter) -> Vec<EnrichedBooking> {
        let total = entries.len();
        let kept: Vec<EnrichedBooking> = entries
            .into_iter()
            .filter(|entry| matches_filter(entry, filter))
            .collect();
        debug!("Admin booking filter kept {}/{}", kept.len(), total);
        kept
    }
}
