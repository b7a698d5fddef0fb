use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use nomination_portal::config::PortalConfig;
use nomination_portal::workflows::nomination::{
    AccessGate, AdminSessions, DraftRegistry, MemoryBlobStore, MemoryNotifier, MemoryRepository,
    NominationService, PortalState,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

pub(crate) type MemoryPortalState = PortalState<MemoryRepository, MemoryBlobStore, MemoryNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory stand-ins for the record store, upload bucket, and mail relay.
pub(crate) struct MemoryBackends {
    pub(crate) repository: Arc<MemoryRepository>,
    pub(crate) blobs: Arc<MemoryBlobStore>,
    pub(crate) notifier: Arc<MemoryNotifier>,
}

impl MemoryBackends {
    pub(crate) fn new(storage_base_url: &str) -> Self {
        Self {
            repository: Arc::new(MemoryRepository::default()),
            blobs: Arc::new(MemoryBlobStore::new(storage_base_url)),
            notifier: Arc::new(MemoryNotifier::default()),
        }
    }
}

pub(crate) fn portal_state(config: &PortalConfig, backends: &MemoryBackends) -> MemoryPortalState {
    let service = NominationService::new(
        backends.repository.clone(),
        backends.blobs.clone(),
        backends.notifier.clone(),
        config.settings(),
    );

    PortalState {
        service: Arc::new(service),
        drafts: Arc::new(DraftRegistry::new(config.draft_ttl)),
        sessions: Arc::new(AdminSessions::new(config.session_ttl)),
        gate: Arc::new(AccessGate::new(
            config.admin_password.clone(),
            config.form_access_code.clone(),
        )),
    }
}

/// Expire idle drafts and admin sessions; returns how many of each were dropped.
pub(crate) fn expire_idle(state: &MemoryPortalState, now: DateTime<Utc>) -> (usize, usize) {
    let drafts = state.drafts.sweep_idle(now);
    let sessions = state.sessions.purge_expired(now);
    if drafts > 0 || sessions > 0 {
        debug!(drafts, sessions, "expired idle portal state");
    }
    (drafts, sessions)
}

pub(crate) fn spawn_sweeper(state: MemoryPortalState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            expire_idle(&state, Utc::now());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomination_portal::workflows::nomination::{ClaimCategory, FileUpload};

    fn config() -> PortalConfig {
        PortalConfig {
            public_base_url: "http://localhost:3000".to_string(),
            storage_base_url: "http://localhost:3000/storage/v1/object/public/tops-uploads"
                .to_string(),
            admin_password: "review-panel".to_string(),
            form_access_code: None,
            session_ttl: chrono::Duration::minutes(10),
            draft_ttl: chrono::Duration::minutes(5),
        }
    }

    #[test]
    fn expire_idle_drops_stale_drafts_and_sessions() {
        let backends = MemoryBackends::new(&config().storage_base_url);
        let state = portal_state(&config(), &backends);

        let draft = state.drafts.open(state.service.upload_tracker());
        state
            .drafts
            .with_draft(&draft, |draft| {
                draft.upload_certificate(
                    ClaimCategory::Community,
                    FileUpload::new("cleanup.pdf", "application/pdf", b"%PDF".to_vec()),
                )
            })
            .expect("draft open")
            .expect("stored");
        state
            .sessions
            .login(&state.gate, "review-panel")
            .expect("login");

        assert_eq!(expire_idle(&state, Utc::now()), (0, 0));
        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(expire_idle(&state, later), (1, 1));
        assert!(backends.blobs.is_empty());
    }
}
