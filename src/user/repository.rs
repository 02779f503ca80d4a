use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::UserRecord;
use crate::shared::{AppError, ParticipantId};

/// Store of long-lived user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the record, creating it on first interaction
    ///
    /// A non-empty `display_name` that differs from the stored one replaces it.
    async fn get_or_create(
        &self,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> Result<UserRecord, AppError>;

    async fn get(&self, participant_id: ParticipantId) -> Result<Option<UserRecord>, AppError>;

    /// Stores the record's stats
    ///
    /// A non-empty stored display name is kept, so names change only
    /// through `get_or_create`.
    async fn save(&self, record: UserRecord) -> Result<(), AppError>;

    async fn list(&self) -> Result<Vec<UserRecord>, AppError>;
}

/// In-memory implementation of UserRepository
/// Uses RwLock for concurrent access with read optimization
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<ParticipantId, UserRecord>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_or_create(
        &self,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> Result<UserRecord, AppError> {
        let mut users = self.users.write().await;

        let record = users.entry(participant_id).or_insert_with(|| {
            info!(participant_id, display_name = %display_name, "Created user record");
            UserRecord::new(participant_id, display_name.to_string())
        });

        if !display_name.is_empty() && record.display_name != display_name {
            debug!(participant_id, display_name = %display_name, "Updated display name");
            record.display_name = display_name.to_string();
        }

        Ok(record.clone())
    }

    async fn get(&self, participant_id: ParticipantId) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&participant_id).cloned())
    }

    async fn save(&self, mut record: UserRecord) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if let Some(stored) = users.get(&record.participant_id) {
            if !stored.display_name.is_empty() {
                record.display_name = stored.display_name.clone();
            }
        }
        users.insert(record.participant_id, record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}
