//! In-memory session registry
//!
//! Maps session ids to their pipeline controller. Sessions idle for longer
//! than the configured timeout are evicted lazily on create and lookup.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::model::SessionConfig;
use crate::service::llm::ModelClient;
use crate::service::normalizer::ContentNormalizer;
use crate::service::pipeline::PipelineController;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Session limit of {0} reached")]
    Full(usize),
}

/// Session settings the registry cannot run with
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryConfigError {
    #[error("sessions.idle_timeout_minutes must be a positive number of minutes, got {0}")]
    IdleTimeout(i64),
}

struct SessionEntry {
    controller: Arc<PipelineController>,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

/// Handle to a registered session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub controller: Arc<PipelineController>,
}

pub struct SessionRegistry {
    llm_client: Arc<dyn ModelClient>,
    normalizer: ContentNormalizer,
    idle_timeout: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(
        llm_client: Arc<dyn ModelClient>,
        normalizer: ContentNormalizer,
        config: &SessionConfig,
    ) -> Result<Self, RegistryConfigError> {
        let minutes = config.idle_timeout_minutes;
        let idle_timeout = Duration::try_minutes(minutes)
            .filter(|_| minutes > 0)
            .ok_or(RegistryConfigError::IdleTimeout(minutes))?;

        Ok(Self {
            llm_client,
            normalizer,
            idle_timeout,
            max_sessions: config.max_sessions,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn create(&self) -> Result<SessionHandle, RegistryError> {
        self.create_at(Utc::now())
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, RegistryError> {
        self.get_at(id, Utc::now())
    }

    /// Drop a session; its in-flight requests finish against the detached controller
    pub fn remove(&self, id: Uuid) -> Result<(), RegistryError> {
        match self.sessions.write().remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(RegistryError::NotFound(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_sessions
    }

    fn create_at(&self, now: DateTime<Utc>) -> Result<SessionHandle, RegistryError> {
        let mut sessions = self.sessions.write();
        self.evict_idle(&mut sessions, now);

        if sessions.len() >= self.max_sessions {
            tracing::warn!(max_sessions = self.max_sessions, "Session limit reached");
            return Err(RegistryError::Full(self.max_sessions));
        }

        let id = Uuid::new_v4();
        let controller = Arc::new(PipelineController::new(
            Arc::clone(&self.llm_client),
            self.normalizer.clone(),
        ));
        sessions.insert(
            id,
            SessionEntry {
                controller: Arc::clone(&controller),
                created_at: now,
                last_access: now,
            },
        );

        tracing::info!(session_id = %id, active_sessions = sessions.len(), "Session created");

        Ok(SessionHandle {
            id,
            created_at: now,
            controller,
        })
    }

    fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> Result<SessionHandle, RegistryError> {
        let mut sessions = self.sessions.write();
        self.evict_idle(&mut sessions, now);

        let entry = sessions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        entry.last_access = now;

        Ok(SessionHandle {
            id,
            created_at: entry.created_at,
            controller: Arc::clone(&entry.controller),
        })
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_access < self.idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Evicted idle sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::pipeline::PipelineState;
    use crate::service::testing::StubModelClient;

    fn registry(max_sessions: usize) -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(StubModelClient::new()),
            ContentNormalizer::default(),
            &SessionConfig {
                idle_timeout_minutes: 30,
                max_sessions,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_idle_timeout_must_be_positive_and_representable() {
        for minutes in [0, -5, i64::MAX] {
            let result = SessionRegistry::new(
                Arc::new(StubModelClient::new()),
                ContentNormalizer::default(),
                &SessionConfig {
                    idle_timeout_minutes: minutes,
                    max_sessions: 10,
                },
            );
            assert_eq!(
                result.err(),
                Some(RegistryConfigError::IdleTimeout(minutes)),
                "{minutes}"
            );
        }
    }

    #[test]
    fn test_create_and_get() {
        let registry = registry(10);
        let handle = registry.create().unwrap();

        let found = registry.get(handle.id).unwrap();

        assert!(Arc::ptr_eq(&handle.controller, &found.controller));
        assert_eq!(found.controller.state(), PipelineState::Idle);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_session() {
        let registry = registry(10);
        let id = Uuid::new_v4();

        assert_eq!(registry.get(id).err(), Some(RegistryError::NotFound(id)));
        assert_eq!(registry.remove(id), Err(RegistryError::NotFound(id)));
    }

    #[test]
    fn test_remove() {
        let registry = registry(10);
        let handle = registry.create().unwrap();

        registry.remove(handle.id).unwrap();

        assert!(registry.is_empty());
        assert!(registry.get(handle.id).is_err());
    }

    #[test]
    fn test_full_registry() {
        let registry = registry(2);
        registry.create().unwrap();
        registry.create().unwrap();

        assert_eq!(registry.create().err(), Some(RegistryError::Full(2)));
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let registry = registry(1);
        let start = Utc::now();
        let stale = registry.create_at(start).unwrap();

        let later = start + Duration::minutes(31);
        assert_eq!(
            registry.get_at(stale.id, later).err(),
            Some(RegistryError::NotFound(stale.id))
        );

        // eviction frees capacity
        assert!(registry.create_at(later).is_ok());
    }

    #[test]
    fn test_access_refreshes_idle_timer() {
        let registry = registry(10);
        let start = Utc::now();
        let handle = registry.create_at(start).unwrap();

        registry
            .get_at(handle.id, start + Duration::minutes(20))
            .unwrap();
        let found = registry.get_at(handle.id, start + Duration::minutes(40));

        assert!(found.is_ok());
    }
}
