//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SharedConfig;
use crate::refresh::RefreshTrigger;

/// Watches the configuration file and reports route-table reload results
/// to the refresh controller.
pub struct ConfigWatcher {
    path: PathBuf,
    shared: SharedConfig,
    trigger_tx: mpsc::UnboundedSender<RefreshTrigger>,
}

impl ConfigWatcher {
    pub fn new(
        path: &Path,
        shared: SharedConfig,
        trigger_tx: mpsc::UnboundedSender<RefreshTrigger>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            shared,
            trigger_tx,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// A successful reload swaps the shared config before the trigger is
    /// sent; a failed reload keeps the current configuration and reports
    /// `success: false` so the registry snapshot stays untouched.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx.clone();
        let path = self.path.clone();
        let shared = self.shared.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                shared.store(new_config);
                                let _ = tx.send(RefreshTrigger::RouteTableReloaded {
                                    success: true,
                                });
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                                let _ = tx.send(RefreshTrigger::RouteTableReloaded {
                                    success: false,
                                });
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
