//! Master-key session state
//!
//! Tracks whether the backend store has been initialized and whether the
//! user has unlocked it. Backend failures read as "no": a failed check
//! leaves the user at the unlock screen instead of surfacing an error.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::AuthBackend;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Master key must not be empty")]
    EmptyMasterKey,
}

impl serde::Serialize for AuthError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub is_initialized: bool,
    pub is_authenticated: bool,
}

pub struct AuthSession {
    backend: Arc<dyn AuthBackend>,
    state: RwLock<AuthState>,
}

impl AuthSession {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> AuthState {
        *self.state.read()
    }

    pub async fn check_initialization(&self) -> bool {
        let initialized = match self.backend.is_initialized().await {
            Ok(initialized) => initialized,
            Err(e) => {
                warn!("Failed to check initialization: {}", e);
                false
            }
        };
        self.state.write().is_initialized = initialized;
        initialized
    }

    /// Set up the store with a new master key; unlocks on success
    pub async fn initialize(&self, master_key: &str) -> Result<bool, AuthError> {
        if master_key.is_empty() {
            return Err(AuthError::EmptyMasterKey);
        }

        let ok = match self.backend.initialize_app(master_key).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!("Failed to initialize store: {}", e);
                false
            }
        };

        if ok {
            let mut state = self.state.write();
            state.is_initialized = true;
            state.is_authenticated = true;
            info!("Store initialized");
        }
        Ok(ok)
    }

    pub async fn login(&self, master_key: &str) -> Result<bool, AuthError> {
        if master_key.is_empty() {
            return Err(AuthError::EmptyMasterKey);
        }

        let ok = match self.backend.authenticate(master_key).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!("Authentication call failed: {}", e);
                false
            }
        };

        self.state.write().is_authenticated = ok;
        if ok {
            info!("Store unlocked");
        } else {
            info!("Unlock rejected");
        }
        Ok(ok)
    }

    pub fn logout(&self) {
        self.state.write().is_authenticated = false;
        info!("Store locked");
    }
}
