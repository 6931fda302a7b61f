use std::sync::Arc;

use tracing::info;

use shelterline_core::Volunteer;
use shelterline_storage::{NewVolunteer, VolunteerStore};

use crate::error::{EngineError, Result};

/// Volunteer intake. Registrations start `pending` until staff screening.
pub struct VolunteerService {
    store: Arc<dyn VolunteerStore>,
}

impl VolunteerService {
    pub fn new(store: Arc<dyn VolunteerStore>) -> Self {
        Self { store }
    }

    /// Register a volunteer.
    ///
    /// # Errors
    ///
    /// `Validation` when the name or phone is missing; nothing is
    /// inserted.
    pub async fn register(&self, volunteer: NewVolunteer) -> Result<Volunteer> {
        if volunteer.name.trim().is_empty() {
            return Err(EngineError::validation("volunteer name is required"));
        }
        if volunteer.phone.trim().is_empty() {
            return Err(EngineError::validation("volunteer phone is required"));
        }

        let registered = self.store.insert_volunteer(volunteer).await?;
        info!(id = registered.id, name = %registered.name, "volunteer registered");
        Ok(registered)
    }

    pub async fn list(&self) -> Result<Vec<Volunteer>> {
        Ok(self.store.list_volunteers().await?)
    }
}
