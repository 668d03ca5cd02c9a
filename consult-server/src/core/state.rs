//! Server state
//!
//! [`ServerState`] holds the shared service singletons behind `Arc`, so
//! cloning it into every request handler is cheap.

use std::path::Path;
use std::sync::Arc;

use crate::booking::{BookingManager, BookingStorage};
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::services::{CatalogService, MeetLinkProvisioner, MeetingProvisioner};

/// Shared server state
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | catalog | Consultant directory (read-mostly) |
/// | manager | Booking state machine + slot ledger |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub catalog: Arc<CatalogService>,
    pub manager: Arc<BookingManager>,
}

impl ServerState {
    /// Initialize the server state
    ///
    /// 1. ensure the work directory layout
    /// 2. open the booking database at `work_dir/database/consult.redb`
    /// 3. load the consultant catalog from `CATALOG_PATH` (a missing seed
    ///    only logs a warning: the engine still serves booking queries)
    /// 4. wire the meeting-link provisioner
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("consult.redb");
        let storage = BookingStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Booking database opened");

        let catalog = Arc::new(CatalogService::new());
        match &config.catalog_path {
            Some(path) => {
                catalog.load_file(Path::new(path))?;
            }
            None => {
                tracing::warn!("CATALOG_PATH not set, starting with an empty consultant catalog");
            }
        }

        let meetings: Arc<dyn MeetingProvisioner> = Arc::new(MeetLinkProvisioner::default());
        let manager = Arc::new(BookingManager::new(
            storage,
            catalog.clone(),
            meetings,
            config.hold_ttl_secs,
        ));

        Ok(Self {
            config: config.clone(),
            catalog,
            manager,
        })
    }

    /// Construct state from already-built services (for testing)
    pub fn with_services(
        config: Config,
        catalog: Arc<CatalogService>,
        manager: Arc<BookingManager>,
    ) -> Self {
        Self {
            config,
            catalog,
            manager,
        }
    }

    /// Register the engine's background tasks
    ///
    /// Currently one periodic task: the hold-expiry sweep. It must go
    /// through the ledger so expiry races against `commit_hold` stay inside
    /// one write transaction.
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let manager = self.manager.clone();
        let interval_secs = self.config.sweep_interval_secs;
        let token = tasks.shutdown_token();

        tasks.spawn("hold_expiry_sweep", TaskKind::Periodic, async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        match manager.sweep_expired_holds(chrono::Utc::now()) {
                            Ok(0) => {}
                            Ok(count) => {
                                tracing::debug!(count, "Hold sweep reclaimed slots");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Hold sweep failed");
                            }
                        }
                    }
                }
            }
        });
    }
}
