//! The composer service: owner of the driver and of the single client slot.

use std::sync::Arc;
use std::time::Duration;

use novade_buffer_manager::HandleImporter;
use novade_core::config::ComposerConfig;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::client::ComposerClient;
use crate::driver::{query_sized, DisplayDriver};
use crate::error::{ComposerError, ComposerResult};
use crate::types::Capability;
use crate::writeback::WritebackPipeline;

pub struct Composer {
    pub(crate) driver: Arc<dyn DisplayDriver>,
    pub(crate) importer: Arc<dyn HandleImporter>,
    pub(crate) config: ComposerConfig,
    /// Serializes whole command batches against hardware commits, across
    /// displays and clients.
    pub(crate) command_lock: Arc<Mutex<()>>,
    pub(crate) writeback: Arc<WritebackPipeline>,
    client_alive: Mutex<bool>,
    client_gone: Condvar,
}

impl Composer {
    pub fn new(driver: Arc<dyn DisplayDriver>, importer: Arc<dyn HandleImporter>, config: &ComposerConfig) -> Arc<Self> {
        let writeback = Arc::new(WritebackPipeline::new(
            driver.clone(),
            importer.clone(),
            config.writeback.thread_name_prefix.clone(),
        ));
        info!(
            handover_timeout_ms = config.client.handover_timeout_ms,
            "Composer service created"
        );
        Arc::new(Self {
            driver,
            importer,
            config: config.clone(),
            command_lock: Arc::new(Mutex::new(())),
            writeback,
            client_alive: Mutex::new(false),
            client_gone: Condvar::new(),
        })
    }

    /// Creates the client. Only one client may be alive; a new one waits for
    /// the previous one to be dropped.
    ///
    /// # Errors
    ///
    /// `NoResources` if the previous client is still alive after the
    /// configured handover timeout.
    pub fn create_client(self: &Arc<Self>) -> ComposerResult<ComposerClient> {
        {
            let mut alive = self.client_alive.lock();
            if *alive {
                debug!("Waiting for the previous client to be destroyed");
                let timeout = Duration::from_millis(self.config.client.handover_timeout_ms);
                self.client_gone.wait_while_for(&mut alive, |alive| *alive, timeout);
                if *alive {
                    warn!("Previous client still alive, refusing a new one");
                    return Err(ComposerError::NoResources);
                }
            }
            *alive = true;
        }
        Ok(ComposerClient::new(self.clone()))
    }

    pub(crate) fn on_client_destroyed(&self) {
        *self.client_alive.lock() = false;
        self.client_gone.notify_all();
    }

    /// Capabilities of the driver this composer knows about.
    ///
    /// # Errors
    ///
    /// `Unsupported` if the driver reports none.
    pub fn capabilities(&self) -> ComposerResult<Vec<Capability>> {
        let raw: Vec<i32> = query_sized(|out| Ok(self.driver.capabilities(out)))?;
        if raw.is_empty() {
            return Err(ComposerError::Unsupported);
        }
        let capabilities: Vec<Capability> = Capability::ALL
            .iter()
            .copied()
            .filter(|capability| raw.contains(&capability.raw()))
            .collect();
        debug!(?raw, ?capabilities, "Driver capabilities");
        Ok(capabilities)
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }
}
