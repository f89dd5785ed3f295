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

//! # Service Contracts
//!
//! The request/response transport a host exposes to plugins, and the
//! messages exchanged by the `attach` and `detach` services.

mod messages;

pub use messages::{AttachRequest, AttachResponse, Point};

/// A registered service callback.
///
/// Payloads travel as JSON values so the transport stays agnostic of the
/// message types a plugin defines.
pub type ServiceCallback =
    Box<dyn Fn(serde_json::Value) -> Result<serde_json::Value, TransportError> + Send + Sync>;

/// Errors raised by the service transport itself.
///
/// These describe delivery problems only; a service reports the outcome of
/// the work it did inside its response payload.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport node was never initialised.
    #[error("transport node is not initialized")]
    NotInitialized,
    /// A service with this resolved name is already advertised.
    #[error("service '{0}' is already advertised")]
    AlreadyAdvertised(String),
    /// No service is advertised under this name.
    #[error("no service advertised at '{0}'")]
    UnknownService(String),
    /// The request or response payload did not match the service's message type.
    #[error("invalid payload for '{service}': {source}")]
    InvalidPayload {
        /// The resolved service name.
        service: String,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// The dispatcher went away before answering.
    #[error("service dispatcher disconnected")]
    Disconnected,
}

/// Interface contract for the host's request/response middleware.
pub trait ServiceTransport: Send + Sync {
    /// Returns `true` once the middleware node backing this transport is up.
    fn is_initialized(&self) -> bool;

    /// Resolves a service name inside a node's namespace.
    fn resolve_name(&self, node: &str, service: &str) -> String;

    /// Advertises `callback` under `node`/`service` and returns the resolved name.
    fn advertise(
        &self,
        node: &str,
        service: &str,
        callback: ServiceCallback,
    ) -> Result<String, TransportError>;

    /// Withdraws the service advertised under the resolved `name`.
    ///
    /// Returns `false` if nothing was advertised there.
    fn unadvertise(&self, name: &str) -> bool;
}
