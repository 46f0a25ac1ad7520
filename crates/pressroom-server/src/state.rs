use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pressroom_core::config::Config;
use pressroom_core::store::Store;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub store: Arc<Store>,
    pub config: Config,
    pub event_tx: broadcast::Sender<()>,
    /// Abort handles for detached run tasks, keyed by engine name. Supports
    /// cooperative cancellation; the task itself stands down if its job is
    /// already terminal when it completes.
    pub run_tasks: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        let store = Store::open(&root)?;
        let recovered = store.startup_recovery()?;
        if recovered > 0 {
            tracing::warn!(count = recovered, "cancelled jobs orphaned by a previous process");
        }

        let config = match Config::load(&root) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "no usable config; falling back to defaults");
                Config::new("pressroom")
            }
        };

        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            root,
            store: Arc::new(store),
            config,
            event_tx,
            run_tasks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Broadcast a change notification to SSE subscribers. Send errors only
    /// mean nobody is listening.
    pub fn notify(&self) {
        let _ = self.event_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_state_opens_store_and_defaults_config() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.root, dir.path());
        assert_eq!(state.config.engine.heartbeat_timeout_ms, 60_000);
    }

    #[test]
    fn new_state_reads_saved_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new("shop");
        config.engine.heartbeat_timeout_ms = 30_000;
        config.save(dir.path()).unwrap();

        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.config.project, "shop");
        assert_eq!(state.config.engine.heartbeat_timeout_ms, 30_000);
    }
}
