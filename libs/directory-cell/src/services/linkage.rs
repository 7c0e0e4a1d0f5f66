use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use shared_database::{Collection, DocumentStore};

use crate::models::{DirectoryError, LinkSyncReport};
use crate::services::institution::{InstitutionService, SERVICE_IDS_FIELD};

/// Maintains the institution side of the service/institution relation.
pub struct LinkageService {
    store: Arc<dyn DocumentStore>,
    institutions: InstitutionService,
}

impl LinkageService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            institutions: InstitutionService::new(store.clone()),
            store,
        }
    }

    async fn linked_institution_ids(&self, service_id: &str) -> Result<BTreeSet<String>, DirectoryError> {
        Ok(self
            .institutions
            .institutions_by_service(service_id)
            .await?
            .into_iter()
            .map(|institution| institution.id)
            .collect())
    }

    /// Reconciles the institutions offering `service_id` with `desired`.
    ///
    /// Adds and removals run concurrently. Links applied before a failure
    /// stay applied; the failure lists the institutions that did not change.
    pub async fn sync_service_institutions(
        &self,
        service_id: &str,
        desired: &[String],
    ) -> Result<LinkSyncReport, DirectoryError> {
        if self.store.get(Collection::Services, service_id).await?.is_none() {
            return Err(DirectoryError::ServiceNotFound(service_id.to_string()));
        }

        let current = self.linked_institution_ids(service_id).await?;
        let desired: BTreeSet<String> = desired.iter().cloned().collect();

        let to_add: Vec<String> = desired.difference(&current).cloned().collect();
        let to_remove: Vec<String> = current.difference(&desired).cloned().collect();

        let adds = to_add.iter().map(|institution_id| async move {
            let result = self
                .store
                .array_union(Collection::Institutions, institution_id, SERVICE_IDS_FIELD, service_id)
                .await;
            (institution_id.clone(), result.map_err(DirectoryError::from))
        });
        let removes = to_remove.iter().map(|institution_id| async move {
            let result = self.institutions.unlink_service(institution_id, service_id).await;
            (institution_id.clone(), result)
        });

        let (added, removed) = futures::join!(join_all(adds), join_all(removes));

        let mut report = LinkSyncReport::default();
        let mut failed = Vec::new();
        for (institution_id, result) in added {
            match result {
                Ok(()) => report.added.push(institution_id),
                Err(e) => {
                    warn!("Linking {} to {} failed: {}", service_id, institution_id, e);
                    failed.push(institution_id);
                }
            }
        }
        for (institution_id, result) in removed {
            match result {
                Ok(()) => report.removed.push(institution_id),
                Err(e) => {
                    warn!("Unlinking {} from {} failed: {}", service_id, institution_id, e);
                    failed.push(institution_id);
                }
            }
        }

        if !failed.is_empty() {
            error!(
                "Link sync for service {}: {} failed of {}",
                service_id,
                failed.len(),
                to_add.len() + to_remove.len()
            );
            return Err(DirectoryError::PartialSync {
                service_id: service_id.to_string(),
                applied: report.added.len() + report.removed.len(),
                failed,
            });
        }

        info!(
            "Service {} links synced: +{} -{}",
            service_id,
            report.added.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// Removes `service_id` from every institution referencing it.
    pub async fn unlink_everywhere(&self, service_id: &str) -> Result<usize, DirectoryError> {
        let linked = self.linked_institution_ids(service_id).await?;

        let results = join_all(linked.iter().map(|institution_id| async move {
            let result = self.institutions.unlink_service(institution_id, service_id).await;
            (institution_id.clone(), result)
        }))
        .await;

        let failed: Vec<String> = results
            .into_iter()
            .filter_map(|(institution_id, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!("Unlinking {} from {} failed: {}", service_id, institution_id, e);
                    Some(institution_id)
                }
            })
            .collect();

        if !failed.is_empty() {
            error!("Cleanup of service {} failed for {:?}", service_id, failed);
            return Err(DirectoryError::CleanupFailed {
                service_id: service_id.to_string(),
                failed,
            });
        }

        Ok(linked.len())
    }
}
