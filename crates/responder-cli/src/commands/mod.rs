use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use responder_core::logging_facility;
use responder_core::{CoreError, ResponderStore};
use responder_engine::{EventEmitter, JsonLinesPublisher, ResponderService, ServiceConfig};
use tokio::runtime::Runtime;

pub mod admin;
pub mod replay;

/// Everything a command needs, built once from configuration
pub struct Context {
    pub config: ServiceConfig,
    pub store: Arc<dyn ResponderStore>,
    pub emitter: EventEmitter,
    runtime: Runtime,
}

impl Context {
    pub fn open(config_path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = ServiceConfig::load(config_path).map_err(CoreError::from)?;
        if db.is_some() {
            config.store.path = db;
        }
        logging_facility::init(config.logging.profile);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let store = config.store.open()?;
        let publisher = Arc::new(JsonLinesPublisher::new(std::io::stdout()));
        let emitter = EventEmitter::new(publisher, runtime.handle().clone());

        Ok(Self {
            config,
            store,
            emitter,
            runtime,
        })
    }

    pub fn service(&self) -> ResponderService {
        ResponderService::new(
            Arc::clone(&self.store),
            self.emitter.clone(),
            self.config.destinations.clone(),
        )
    }

    /// Give pending completion observers a moment, then stop the runtime
    pub fn close(self) {
        self.runtime.shutdown_timeout(Duration::from_millis(250));
    }
}

/// Write one JSON value as a line on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
