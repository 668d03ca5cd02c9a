//! Catalog service — in-memory consultant directory
//!
//! Consultants are managed by an external process; this engine only reads
//! them. The directory is loaded once at startup from a JSON seed file and
//! kept behind an RwLock so the booking path never touches the filesystem.

use parking_lot::RwLock;
use shared::models::{Consultant, ConsultantSummary, Service};
use std::collections::HashMap;
use std::path::Path;

/// Read-mostly consultant directory
pub struct CatalogService {
    consultants: RwLock<HashMap<String, Consultant>>,
}

impl CatalogService {
    /// Empty catalog
    pub fn new() -> Self {
        Self {
            consultants: RwLock::new(HashMap::new()),
        }
    }

    /// Load (or reload) consultants from a JSON file
    ///
    /// The file holds a plain `[Consultant, ...]` array. Returns how many
    /// entries were loaded.
    pub fn load_file(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<Consultant> = serde_json::from_str(&raw)?;
        let count = entries.len();

        let mut map = self.consultants.write();
        for consultant in entries {
            map.insert(consultant.id.clone(), consultant);
        }

        tracing::info!(count, path = %path.display(), "Consultant catalog loaded");
        Ok(count)
    }

    /// Insert or replace a consultant (used by the loader and by tests)
    pub fn upsert(&self, consultant: Consultant) {
        self.consultants
            .write()
            .insert(consultant.id.clone(), consultant);
    }

    /// Get a consultant by id
    pub fn get_consultant(&self, consultant_id: &str) -> Option<Consultant> {
        self.consultants.read().get(consultant_id).cloned()
    }

    /// List all consultants as summaries, ordered by id
    pub fn list_consultants(&self) -> Vec<ConsultantSummary> {
        let map = self.consultants.read();
        let mut summaries: Vec<ConsultantSummary> = map.values().map(Consultant::summary).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Look up a service tier, enforcing that it belongs to the consultant
    pub fn get_service(&self, consultant_id: &str, service_id: &str) -> Option<Service> {
        self.consultants
            .read()
            .get(consultant_id)
            .and_then(|c| c.service(service_id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.consultants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.consultants.read().is_empty()
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
