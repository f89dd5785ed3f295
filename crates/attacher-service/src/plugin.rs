// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! World plugin entry point.

use std::sync::Arc;

use attacher_core::plugin::{PluginError, WorldPlugin};
use attacher_core::service::ServiceTransport;
use attacher_core::world::SimulationWorld;

use crate::attacher::LinkAttacher;
use crate::config::AttacherConfig;
use crate::handlers::{handle_attach, handle_detach, service_callback, Handler};

/// The link attacher as a loadable world plugin.
pub struct LinkAttacherPlugin {
    config: AttacherConfig,
    attacher: Option<Arc<LinkAttacher>>,
    services: Vec<String>,
}

impl LinkAttacherPlugin {
    /// Name of the plugin and of its scene configuration section.
    pub const NAME: &'static str = "link_attacher";

    /// Creates an unloaded plugin.
    pub fn new(config: AttacherConfig) -> Self {
        Self {
            config,
            attacher: None,
            services: Vec::new(),
        }
    }

    /// The attacher, once the plugin is loaded.
    pub fn attacher(&self) -> Option<&Arc<LinkAttacher>> {
        self.attacher.as_ref()
    }

    /// Resolved names of the services this plugin advertised.
    pub fn services(&self) -> &[String] {
        &self.services
    }
}

impl Default for LinkAttacherPlugin {
    fn default() -> Self {
        Self::new(AttacherConfig::default())
    }
}

impl WorldPlugin for LinkAttacherPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load(
        &mut self,
        world: Arc<dyn SimulationWorld>,
        transport: &dyn ServiceTransport,
    ) -> Result<(), PluginError> {
        if !transport.is_initialized() {
            log::error!(
                "A transport node for the simulator has not been initialized, unable to load plugin. \
                 Initialize the host's service transport before loading world plugins."
            );
            return Err(PluginError::TransportNotInitialized);
        }

        let attacher = Arc::new(LinkAttacher::new(world, self.config.detach_policy));
        let node = self.config.node_name.as_str();
        let services: [(&str, &str, Handler); 2] = [
            ("Attach", self.config.attach_service.as_str(), handle_attach),
            ("Detach", self.config.detach_service.as_str(), handle_detach),
        ];
        let mut advertised = Vec::with_capacity(services.len());
        for (label, service, handler) in services {
            let resolved = transport.resolve_name(node, service);
            let callback = service_callback(Arc::clone(&attacher), resolved, handler);
            match transport.advertise(node, service, callback) {
                Ok(name) => {
                    log::info!("{label} service at: {name}");
                    advertised.push(name);
                }
                Err(err) => {
                    // A half-loaded plugin must not keep serving requests.
                    for name in &advertised {
                        transport.unadvertise(name);
                        log::warn!("Withdrew service {name} after failed load");
                    }
                    return Err(err.into());
                }
            }
        }

        self.services = advertised;
        self.attacher = Some(attacher);
        log::info!("Link attacher node initialized.");
        Ok(())
    }
}
