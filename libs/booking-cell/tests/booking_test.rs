use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use booking_cell::services::{AvailabilityService, BookingService, DashboardService};
use booking_cell::{
    AdminBookingFilter, BookingError, BookingStatus, CreateBookingRequest, NewBooking,
    RescheduleRequest,
};
use directory_cell::services::{InstitutionService, ServiceCatalog};
use directory_cell::{
    CreateInstitutionRequest, CreateServiceRequest, DirectoryError, Institution, Service,
    ServiceCategory, TimeSlot,
};
use shared_config::AppConfig;
use shared_database::{Collection, DocumentStore, InMemoryStore, Query, StoreError};
use shared_utils::test_utils::{test_state, TestConfig, TestUser};
use shared_utils::AppState;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn institution_request(name: &str, service_ids: Vec<String>, max_capacity: u32) -> CreateInstitutionRequest {
    CreateInstitutionRequest {
        name: name.to_string(),
        address: "Rua Amílcar Cabral, Luanda".to_string(),
        coordinates: Default::default(),
        service_ids,
        available_slots: Vec::new(),
        max_capacity,
        operating_hours: Some("08:00-17:00".to_string()),
        image_url: None,
    }
}

struct Fixture {
    state: AppState,
    service: Service,
    institution: Institution,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_state(test_state()).await
    }

    async fn with_state(state: AppState) -> Self {
        Self::with_store(state.store.clone(), state).await
    }

    async fn with_store(store: Arc<dyn DocumentStore>, state: AppState) -> Self {
        let service = ServiceCatalog::new(store.clone())
            .create(CreateServiceRequest {
                name: "Bilhete de Identidade".to_string(),
                category: ServiceCategory::Personal,
                average_duration: 30,
                max_capacity: 10,
                requirements: vec!["Certidão de nascimento".to_string()],
                institution_ids: Vec::new(),
            })
            .await
            .unwrap();

        let institution = InstitutionService::new(store)
            .create(institution_request("Hospital Central", vec![service.id.clone()], 10))
            .await
            .unwrap();

        Self {
            state,
            service,
            institution,
        }
    }

    fn bookings(&self) -> BookingService {
        BookingService::new(self.state.store.clone(), &self.state.config)
    }

    fn request(&self, day: &str, slot: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            service_id: self.service.id.clone(),
            institution_id: self.institution.id.clone(),
            date: date(day),
            time_slot: slot.to_string(),
        }
    }
}

#[tokio::test]
async fn booking_completes_and_moves_to_history() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();

    let booking = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Scheduled);
    assert_eq!(booking.created_at, booking.updated_at);
    assert_eq!(booking.service_type, "Bilhete de Identidade");
    assert_eq!(booking.institution_name, "Hospital Central");
    assert_eq!(booking.service_category, ServiceCategory::Personal);

    let completed = service.complete(&booking.id).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert!(completed.updated_at >= booking.updated_at);

    assert!(service.list_active("citizen-1").await.unwrap().is_empty());
    let history = service.list_history("citizen-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, booking.id);
    assert_eq!(history[0].status, BookingStatus::Completed);
}

#[tokio::test]
async fn booking_is_stored_with_calendar_date_and_slot() {
    let fixture = Fixture::new().await;
    let booking = fixture
        .bookings()
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    let stored = fixture
        .state
        .store
        .get(Collection::Bookings, &booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["date"], "2024-06-10");
    assert_eq!(stored["timeSlot"], "09:00");
    assert_eq!(stored["status"], "scheduled");
    assert_eq!(stored["serviceCategory"], "documentacao-pessoal");
}

#[tokio::test]
async fn invalid_bookings_are_rejected_before_writing() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();

    // Saturday
    assert_matches!(
        service.book("citizen-1", fixture.request("2024-06-08", "09:00")).await,
        Err(BookingError::InvalidDate(_))
    );
    assert_matches!(
        service.book("citizen-1", fixture.request("2024-06-10", "12:00")).await,
        Err(BookingError::InvalidSlot(_))
    );
    assert_matches!(
        service.book("citizen-1", fixture.request("2024-06-10", "17:00")).await,
        Err(BookingError::InvalidSlot(_))
    );

    let mut unknown_service = fixture.request("2024-06-10", "09:00");
    unknown_service.service_id = "missing".to_string();
    assert_matches!(
        service.book("citizen-1", unknown_service).await,
        Err(BookingError::Directory(DirectoryError::ServiceNotFound(_)))
    );

    let elsewhere = InstitutionService::new(fixture.state.store.clone())
        .create(institution_request("Conservatória do Registo Civil", Vec::new(), 10))
        .await
        .unwrap();
    let mut not_offered = fixture.request("2024-06-10", "09:00");
    not_offered.institution_id = elsewhere.id;
    assert_matches!(
        service.book("citizen-1", not_offered).await,
        Err(BookingError::ValidationError(_))
    );

    let stored = fixture
        .state
        .store
        .count(Collection::Bookings, &Query::new())
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn repeated_terminal_marks_are_no_ops() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();
    let booking = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    let first = service.cancel(&booking.id).await.unwrap();
    let second = service.cancel(&booking.id).await.unwrap();
    assert_eq!(second.status, BookingStatus::Cancelled);
    assert_eq!(second.updated_at, first.updated_at);

    assert_matches!(
        service.complete(&booking.id).await,
        Err(BookingError::InvalidStatusTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Completed,
        })
    );
    assert_matches!(
        service
            .reschedule(
                &booking.id,
                RescheduleRequest {
                    date: date("2024-06-11"),
                    time_slot: "10:00".to_string(),
                    institution_id: None,
                },
            )
            .await,
        Err(BookingError::InvalidStatusTransition { .. })
    );

    let stored = service.require(&booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();

    assert_matches!(service.cancel("nope").await, Err(BookingError::NotFound(_)));
    assert_matches!(service.complete("nope").await, Err(BookingError::NotFound(_)));
    assert_matches!(service.delete("nope").await, Err(BookingError::NotFound(_)));
}

#[tokio::test]
async fn active_and_history_partition_a_citizens_bookings() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();

    let mut ids = Vec::new();
    for (day, slot) in [
        ("2024-06-12", "10:00"),
        ("2024-06-10", "14:30"),
        ("2024-06-10", "08:30"),
        ("2024-06-11", "09:00"),
        ("2024-06-13", "16:00"),
    ] {
        let booking = service
            .book("citizen-1", fixture.request(day, slot))
            .await
            .unwrap();
        ids.push(booking.id);
    }
    service
        .book("citizen-2", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    service.cancel(&ids[0]).await.unwrap();
    service.complete(&ids[3]).await.unwrap();
    service
        .reschedule(
            &ids[4],
            RescheduleRequest {
                date: date("2024-06-14"),
                time_slot: "11:00".to_string(),
                institution_id: None,
            },
        )
        .await
        .unwrap();

    let active = service.list_active("citizen-1").await.unwrap();
    let history = service.list_history("citizen-1").await.unwrap();

    let active_ids: HashSet<_> = active.iter().map(|b| b.id.clone()).collect();
    let history_ids: HashSet<_> = history.iter().map(|b| b.id.clone()).collect();
    assert!(active_ids.is_disjoint(&history_ids));

    let all: Vec<Value> = fixture
        .state
        .store
        .list(Collection::Bookings, &Query::new().eq("userId", "citizen-1"))
        .await
        .unwrap();
    assert_eq!(active_ids.len() + history_ids.len(), all.len());
    assert_eq!(all.len(), 6);

    assert!(active.iter().all(|b| b.status == BookingStatus::Scheduled));
    assert!(history.iter().all(|b| b.status != BookingStatus::Scheduled));

    // Soonest first, same day ordered by time.
    let order: Vec<(String, String)> = active
        .iter()
        .map(|b| (b.date.to_string(), b.time_slot.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2024-06-10".to_string(), "08:30".to_string()),
            ("2024-06-10".to_string(), "14:30".to_string()),
            ("2024-06-14".to_string(), "11:00".to_string()),
        ]
    );

    let history_dates: Vec<String> = history.iter().map(|b| b.date.to_string()).collect();
    assert_eq!(history_dates, vec!["2024-06-13", "2024-06-12", "2024-06-11"]);
}

#[tokio::test]
async fn reschedule_keeps_original_as_history_pointer() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();
    let original = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    let other = InstitutionService::new(fixture.state.store.clone())
        .create(institution_request("Loja do Cidadão", vec![fixture.service.id.clone()], 10))
        .await
        .unwrap();

    let outcome = service
        .reschedule(
            &original.id,
            RescheduleRequest {
                date: date("2024-06-12"),
                time_slot: "15:00".to_string(),
                institution_id: Some(other.id.clone()),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.previous.status, BookingStatus::Rescheduled);
    assert_eq!(outcome.previous.rescheduled_to.as_deref(), Some(outcome.current.id.as_str()));
    assert_eq!(outcome.previous.time_slot, "09:00");

    assert_eq!(outcome.current.status, BookingStatus::Scheduled);
    assert_eq!(outcome.current.rescheduled_from.as_deref(), Some(original.id.as_str()));
    assert_eq!(outcome.current.institution_name, "Loja do Cidadão");
    assert_eq!(outcome.current.service_type, original.service_type);
    assert_eq!(outcome.current.date, date("2024-06-12"));

    let stored = service.require(&original.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Rescheduled);
    assert_eq!(stored.date, date("2024-06-10"));

    assert_matches!(
        service
            .reschedule(
                &original.id,
                RescheduleRequest {
                    date: date("2024-06-13"),
                    time_slot: "15:00".to_string(),
                    institution_id: None,
                },
            )
            .await,
        Err(BookingError::InvalidStatusTransition {
            from: BookingStatus::Rescheduled,
            to: BookingStatus::Rescheduled,
        })
    );
}

#[tokio::test]
async fn reschedule_to_invalid_slot_changes_nothing() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();
    let original = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    assert_matches!(
        service
            .reschedule(
                &original.id,
                RescheduleRequest {
                    date: date("2024-06-15"),
                    time_slot: "09:00".to_string(),
                    institution_id: None,
                },
            )
            .await,
        Err(BookingError::InvalidDate(_))
    );

    assert_eq!(service.require(&original.id).await.unwrap().status, BookingStatus::Scheduled);
    assert_eq!(service.list_active("citizen-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn reschedule_needs_an_institution_offering_the_service() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();
    let original = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();
    assert_eq!(original.service_id.as_deref(), Some(fixture.service.id.as_str()));

    let elsewhere = InstitutionService::new(fixture.state.store.clone())
        .create(institution_request("Conservatória do Registo Predial", Vec::new(), 10))
        .await
        .unwrap();

    assert_matches!(
        service
            .reschedule(
                &original.id,
                RescheduleRequest {
                    date: date("2024-06-12"),
                    time_slot: "10:00".to_string(),
                    institution_id: Some(elsewhere.id.clone()),
                },
            )
            .await,
        Err(BookingError::ValidationError(_))
    );
    assert_eq!(service.require(&original.id).await.unwrap().status, BookingStatus::Scheduled);
    assert_eq!(service.list_active("citizen-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn reschedule_of_a_row_without_service_id_uses_the_service_name() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();
    let original = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();
    fixture
        .state
        .store
        .update(Collection::Bookings, &original.id, json!({ "serviceId": null }))
        .await
        .unwrap();

    let offering = InstitutionService::new(fixture.state.store.clone())
        .create(institution_request("Loja do Cidadão", vec![fixture.service.id.clone()], 10))
        .await
        .unwrap();
    let outcome = service
        .reschedule(
            &original.id,
            RescheduleRequest {
                date: date("2024-06-12"),
                time_slot: "10:00".to_string(),
                institution_id: Some(offering.id.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.current.service_id.as_deref(), Some(fixture.service.id.as_str()));

    let elsewhere = InstitutionService::new(fixture.state.store.clone())
        .create(institution_request("Conservatória do Registo Predial", Vec::new(), 10))
        .await
        .unwrap();
    fixture
        .state
        .store
        .update(Collection::Bookings, &outcome.current.id, json!({ "serviceId": null }))
        .await
        .unwrap();
    assert_matches!(
        service
            .reschedule(
                &outcome.current.id,
                RescheduleRequest {
                    date: date("2024-06-13"),
                    time_slot: "10:00".to_string(),
                    institution_id: Some(elsewhere.id),
                },
            )
            .await,
        Err(BookingError::ValidationError(_))
    );
}

/// Store whose booking updates always fail.
struct RejectingUpdates {
    inner: Arc<InMemoryStore>,
}

#[async_trait]
impl DocumentStore for RejectingUpdates {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.inner.list(collection, query).await
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<usize, StoreError> {
        self.inner.count(collection, query).await
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        self.inner.create(collection, data).await
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError> {
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<(), StoreError> {
        if collection == Collection::Bookings {
            return Err(StoreError::Backend("update rejected".to_string()));
        }
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.inner.array_union(collection, id, field, value).await
    }

    async fn array_remove(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.inner.array_remove(collection, id, field, value).await
    }
}

#[tokio::test]
async fn failed_reschedule_removes_the_new_booking() {
    let inner = Arc::new(InMemoryStore::new());
    let store: Arc<dyn DocumentStore> = Arc::new(RejectingUpdates { inner: inner.clone() });
    let fixture = Fixture::with_store(store.clone(), test_state()).await;
    let config = TestConfig::default().to_app_config();
    let service = BookingService::new(store, &config);

    let original = service
        .book("citizen-1", fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();

    assert_matches!(
        service
            .reschedule(
                &original.id,
                RescheduleRequest {
                    date: date("2024-06-11"),
                    time_slot: "10:00".to_string(),
                    institution_id: None,
                },
            )
            .await,
        Err(BookingError::Store(StoreError::Backend(_)))
    );

    let remaining: Vec<Value> = inner.list(Collection::Bookings, &Query::new()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["status"], "scheduled");
    assert_eq!(remaining[0]["timeSlot"], "09:00");
}

#[tokio::test]
async fn capacity_is_not_enforced_by_default() {
    let state = test_state();
    let fixture = Fixture::with_state(state).await;
    InstitutionService::new(fixture.state.store.clone())
        .update(
            &fixture.institution.id,
            directory_cell::UpdateInstitutionRequest {
                max_capacity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let service = fixture.bookings();
    service.book("citizen-1", fixture.request("2024-06-10", "09:00")).await.unwrap();
    service.book("citizen-2", fixture.request("2024-06-10", "09:00")).await.unwrap();

    let availability = AvailabilityService::new(fixture.state.store.clone(), 10);
    let count = availability
        .count_for_slot(&fixture.institution.id, date("2024-06-10"), ServiceCategory::Personal)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn capacity_check_can_be_switched_on() {
    let mut config: AppConfig = TestConfig::default().to_app_config();
    config.enforce_slot_capacity = true;
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let fixture = Fixture::with_store(store.clone(), test_state()).await;

    InstitutionService::new(store.clone())
        .update(
            &fixture.institution.id,
            directory_cell::UpdateInstitutionRequest {
                max_capacity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let service = BookingService::new(store, &config);
    let first = service.book("citizen-1", fixture.request("2024-06-10", "09:00")).await.unwrap();
    assert_matches!(
        service.book("citizen-2", fixture.request("2024-06-10", "09:00")).await,
        Err(BookingError::SlotFull { .. })
    );

    // A cancelled booking frees its place.
    service.cancel(&first.id).await.unwrap();
    service.book("citizen-2", fixture.request("2024-06-10", "09:00")).await.unwrap();
    service.book("citizen-3", fixture.request("2024-06-10", "09:30")).await.unwrap();
}

#[tokio::test]
async fn slot_availability_counts_only_scheduled_bookings() {
    let fixture = Fixture::new().await;
    let service = fixture.bookings();

    let a = service.book("citizen-1", fixture.request("2024-06-10", "09:00")).await.unwrap();
    service.book("citizen-2", fixture.request("2024-06-10", "09:00")).await.unwrap();
    service.book("citizen-3", fixture.request("2024-06-10", "10:00")).await.unwrap();
    service.book("citizen-4", fixture.request("2024-06-11", "09:00")).await.unwrap();
    service.cancel(&a.id).await.unwrap();

    let institution = InstitutionService::new(fixture.state.store.clone())
        .require(&fixture.institution.id)
        .await
        .unwrap();
    let slots = AvailabilityService::new(fixture.state.store.clone(), 10)
        .slot_availability(&institution, date("2024-06-10"), ServiceCategory::Personal)
        .await
        .unwrap();

    assert_eq!(slots.len(), 16);
    let nine = slots.iter().find(|s| s.time == "09:00").unwrap();
    assert_eq!(nine.current_bookings, 1);
    assert_eq!(nine.max_capacity, 10);
    assert!(nine.available);
    let ten = slots.iter().find(|s| s.time == "10:00").unwrap();
    assert_eq!(ten.current_bookings, 1);
    assert!(slots.iter().filter(|s| s.current_bookings == 0).count() == 14);
}

#[tokio::test]
async fn custom_schedule_replaces_default_grid() {
    let fixture = Fixture::new().await;
    let mut institution = fixture.institution.clone();
    institution.available_slots = vec![
        TimeSlot {
            time: "09:00".to_string(),
            available: true,
            current_bookings: 0,
            max_capacity: 1,
        },
        TimeSlot {
            time: "18:00".to_string(),
            available: true,
            current_bookings: 0,
            max_capacity: 0,
        },
    ];
    let availability = AvailabilityService::new(fixture.state.store.clone(), 10);

    assert_eq!(
        availability.schedule_for(&institution),
        vec![("09:00".to_string(), 1), ("18:00".to_string(), 10)]
    );
    assert_eq!(availability.slot_capacity(&institution, date("2024-06-10"), "18:00").unwrap(), 10);
    assert_matches!(
        availability.slot_capacity(&institution, date("2024-06-10"), "10:00"),
        Err(BookingError::InvalidSlot(_))
    );

    let created = BookingService::new(fixture.state.store.clone(), &fixture.state.config)
        .create(NewBooking {
            user_id: "citizen-1".to_string(),
            service_id: Some(fixture.service.id.clone()),
            service_category: ServiceCategory::Personal,
            service_type: "Bilhete de Identidade".to_string(),
            institution_id: institution.id.clone(),
            institution_name: institution.name.clone(),
            date: date("2024-06-10"),
            time_slot: "09:00".to_string(),
        })
        .await
        .unwrap();

    let slots = availability
        .slot_availability(&institution, date("2024-06-10"), ServiceCategory::Personal)
        .await
        .unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].current_bookings, 1);
    assert!(!slots[0].available);
    assert!(slots[1].available);
    assert_eq!(created.status, BookingStatus::Scheduled);
}

#[tokio::test]
async fn dashboard_counts_and_filters_bookings() {
    let fixture = Fixture::new().await;
    let citizen = TestUser::citizen("004512345LA042");
    citizen.seed(&fixture.state).await.unwrap();

    let service = fixture.bookings();
    let mine = service
        .book(&citizen.id, fixture.request("2024-06-10", "09:00"))
        .await
        .unwrap();
    service
        .book("ghost", fixture.request("2024-06-11", "09:00"))
        .await
        .unwrap();
    let done = service
        .book(&citizen.id, fixture.request("2024-06-12", "09:00"))
        .await
        .unwrap();
    service.complete(&done.id).await.unwrap();

    let dashboard = DashboardService::new(fixture.state.store.clone());
    let stats = dashboard.stats().await.unwrap();
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.scheduled_bookings, 2);
    assert_eq!(stats.services, 1);
    assert_eq!(stats.institutions, 1);

    let entries = dashboard.enrich(service.list_all_active().await.unwrap()).await;
    assert_eq!(entries.len(), 2);
    assert!(entries[1].user_profile.is_none());

    let by_national_id = DashboardService::filter(
        entries.clone(),
        &AdminBookingFilter {
            search: Some("la042".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(by_national_id.len(), 1);
    assert_eq!(by_national_id[0].booking.id, mine.id);

    let by_institution = DashboardService::filter(
        entries.clone(),
        &AdminBookingFilter {
            institution: Some("Hospital Central".to_string()),
            search: Some("identidade".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(by_institution.len(), 2);

    let none = DashboardService::filter(
        entries,
        &AdminBookingFilter {
            service: Some("Passaporte".to_string()),
            ..Default::default()
        },
    );
    assert!(none.is_empty());
}
