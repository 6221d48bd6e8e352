//! Shared context for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::changefeed::ChangeEmitter;
use crate::config::Config;
use crate::gateway::WhatsAppClient;
use crate::photos::PhotoStore;

/// Shared context for all routes and middleware. Built once at startup;
/// everything a handler talks to hangs off this.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Connection>>,
    pub gateway: Arc<WhatsAppClient>,
    pub changefeed: Arc<ChangeEmitter>,
    pub photos: Arc<PhotoStore>,
}

impl AppContext {
    pub fn new(config: Config, conn: Connection) -> Self {
        let gateway = WhatsAppClient::new(&config);
        let changefeed = ChangeEmitter::new(&config);
        let photos = PhotoStore::new(config.photo_dir.clone(), &config.public_app_url);

        Self {
            config: Arc::new(config),
            db: Arc::new(Mutex::new(conn)),
            gateway: Arc::new(gateway),
            changefeed: Arc::new(changefeed),
            photos: Arc::new(photos),
        }
    }

    /// Lock the store connection. Guards must be dropped before any
    /// `.await` in the calling handler.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
