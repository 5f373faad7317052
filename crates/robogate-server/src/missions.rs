// crates/robogate-server/src/missions.rs
// ============================================================================
// Module: Mission Store
// Description: In-memory mission CRUD and the run-lifecycle bookkeeping
//              the HTTP layer needs to find a mission's active run.
// Purpose: Missions are an external collaborator the spec only sketches the
//          shape of (§1); this gives the server crate one.
// Dependencies: robogate-core, robogate-runtime
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use robogate_core::Mission;
use robogate_core::MissionId;
use robogate_core::Point2;
use robogate_core::RunId;
use robogate_runtime::IdGenerator;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::ApiError;

/// Body of `POST /missions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMissionRequest {
    /// Natural-language title/goal description.
    pub title: String,
    /// Navigation goal the mission's runs drive toward.
    pub goal: Point2,
}

/// Body of `PATCH /missions/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMissionRequest {
    /// Replacement title, if given.
    pub title: Option<String>,
    /// Replacement goal, if given.
    pub goal: Option<Point2>,
}

/// A mission plus the most recent run started for it, if any.
#[derive(Debug, Clone, Serialize)]
pub struct MissionRecord {
    /// The mission itself.
    #[serde(flatten)]
    pub mission: Mission,
    /// The run most recently started for this mission.
    pub active_run_id: Option<RunId>,
}

/// In-memory, process-lifetime mission registry.
///
/// Holds no run state of its own beyond `active_run_id`; lifecycle and
/// status live in [`robogate_runtime::RunRegistry`].
pub struct MissionStore {
    ids: IdGenerator,
    missions: Mutex<HashMap<MissionId, MissionRecord>>,
}

impl MissionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { ids: IdGenerator::new("mission"), missions: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MissionId, MissionRecord>> {
        self.missions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new mission and returns its record.
    pub fn create(&self, request: CreateMissionRequest) -> MissionRecord {
        let id = MissionId::new(self.ids.issue());
        let record =
            MissionRecord { mission: Mission { id: id.clone(), title: request.title, goal: request.goal }, active_run_id: None };
        self.lock().insert(id, record.clone());
        record
    }

    /// Lists every mission this store currently knows about.
    #[must_use]
    pub fn list(&self) -> Vec<MissionRecord> {
        self.lock().values().cloned().collect()
    }

    /// Fetches one mission's record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
    pub fn get(&self, id: &MissionId) -> Result<MissionRecord, ApiError> {
        self.lock().get(id).cloned().ok_or_else(|| ApiError::MissionNotFound(id.to_string()))
    }

    /// Applies a partial update to an existing mission.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
    pub fn update(&self, id: &MissionId, request: UpdateMissionRequest) -> Result<MissionRecord, ApiError> {
        let mut missions = self.lock();
        let record = missions.get_mut(id).ok_or_else(|| ApiError::MissionNotFound(id.to_string()))?;
        if let Some(title) = request.title {
            record.mission.title = title;
        }
        if let Some(goal) = request.goal {
            record.mission.goal = goal;
        }
        Ok(record.clone())
    }

    /// Deletes a mission.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
    pub fn delete(&self, id: &MissionId) -> Result<(), ApiError> {
        self.lock().remove(id).map(|_| ()).ok_or_else(|| ApiError::MissionNotFound(id.to_string()))
    }

    /// Records the run most recently started for `id`.
    pub fn set_active_run(&self, id: &MissionId, run_id: RunId) {
        if let Some(record) = self.lock().get_mut(id) {
            record.active_run_id = Some(run_id);
        }
    }
}

impl Default for MissionStore {
    fn default() -> Self {
        Self::new()
    }
}
