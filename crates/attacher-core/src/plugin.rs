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

//! Traits for plugins loaded into a running simulation host.

use std::sync::Arc;

use crate::service::{ServiceTransport, TransportError};
use crate::world::SimulationWorld;

/// Errors that abort a plugin's initialisation.
///
/// A failed load only disables the plugin; the host keeps running.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The middleware node the plugin depends on is not up yet.
    #[error("transport node not initialized; start the host's transport before loading plugins")]
    TransportNotInitialized,
    /// A service could not be advertised.
    #[error("failed to advertise service: {0}")]
    Advertise(#[from] TransportError),
}

/// The lifecycle interface a host drives for each world plugin.
///
/// There is no teardown hook: services a plugin advertises live as long as
/// the host's transport does.
pub trait WorldPlugin: Send + Sync {
    /// Returns the plugin's name, also the key of its configuration section.
    fn name(&self) -> &str;

    /// Called once at world startup with the world the plugin will act on.
    fn load(
        &mut self,
        world: Arc<dyn SimulationWorld>,
        transport: &dyn ServiceTransport,
    ) -> Result<(), PluginError>;
}
