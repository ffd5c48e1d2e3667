//! Participant-local entity storage.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::SagaKey;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::{ParticipantError, Result};

/// An entity owned by exactly one participant, keyed by saga identity.
pub trait SagaEntity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Storage discriminator; distinct per entity type.
    const KIND: &'static str;

    fn key(&self) -> &SagaKey;
}

/// Persistence boundary of a participant.
#[async_trait]
pub trait Repository<T: SagaEntity>: Send + Sync {
    /// Returns true if an entity exists for the key.
    async fn exists(&self, key: &SagaKey) -> Result<bool>;

    /// Stores a new entity, claiming its key.
    ///
    /// Check and create are one atomic step: when two callers race on a key,
    /// exactly one wins and the other gets `DuplicateTransaction`.
    async fn insert(&self, entity: T) -> Result<T>;

    /// Inserts or replaces the entity for its key.
    async fn save(&self, entity: T) -> Result<T>;

    /// Drops the entity for a key, if any.
    async fn remove(&self, key: &SagaKey) -> Result<()>;

    /// Loads the entity for a key.
    async fn find_by_key(&self, key: &SagaKey) -> Result<Option<T>>;
}

/// In-memory repository for tests and single-process deployments.
#[derive(Clone)]
pub struct InMemoryRepository<T: SagaEntity> {
    entities: Arc<RwLock<HashMap<SagaKey, T>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl<T: SagaEntity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            fail_on_save: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<T: SagaEntity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail until reset.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(ParticipantError::Storage(format!(
                "{} store unavailable",
                T::KIND
            )));
        }
        Ok(())
    }

    /// Returns the number of stored entities.
    pub async fn count(&self) -> usize {
        self.entities.read().await.len()
    }
}

#[async_trait]
impl<T: SagaEntity> Repository<T> for InMemoryRepository<T> {
    async fn exists(&self, key: &SagaKey) -> Result<bool> {
        Ok(self.entities.read().await.contains_key(key))
    }

    async fn insert(&self, entity: T) -> Result<T> {
        self.check_available()?;
        match self.entities.write().await.entry(entity.key().clone()) {
            Entry::Occupied(occupied) => {
                Err(ParticipantError::DuplicateTransaction(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    async fn save(&self, entity: T) -> Result<T> {
        self.check_available()?;
        self.entities
            .write()
            .await
            .insert(entity.key().clone(), entity.clone());
        Ok(entity)
    }

    async fn remove(&self, key: &SagaKey) -> Result<()> {
        self.entities.write().await.remove(key);
        Ok(())
    }

    async fn find_by_key(&self, key: &SagaKey) -> Result<Option<T>> {
        Ok(self.entities.read().await.get(key).cloned())
    }
}
