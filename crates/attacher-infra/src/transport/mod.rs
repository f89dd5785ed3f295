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

//! In-process implementation of the service transport.
//!
//! Callbacks are advertised under `/<node>/<service>`. Calls are either
//! dispatched directly on the caller's thread ([`LocalServiceBus::call`]) or
//! queued over a channel to whichever thread runs [`LocalServiceBus::serve`],
//! which then plays the role of the host's request-dispatch thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attacher_core::service::{ServiceCallback, ServiceTransport, TransportError};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

type Reply = Result<serde_json::Value, TransportError>;

enum Dispatch {
    Call {
        service: String,
        payload: serde_json::Value,
        reply: flume::Sender<Reply>,
    },
    Shutdown,
}

/// A process-local request/response bus.
pub struct LocalServiceBus {
    initialized: AtomicBool,
    services: RwLock<HashMap<String, Arc<ServiceCallback>>>,
    sender: flume::Sender<Dispatch>,
    receiver: flume::Receiver<Dispatch>,
}

impl Default for LocalServiceBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalServiceBus {
    /// Creates a bus whose node is not yet initialised.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            initialized: AtomicBool::new(false),
            services: RwLock::new(HashMap::new()),
            sender,
            receiver,
        }
    }

    /// Brings the bus's node up. Plugins refuse to load before this.
    pub fn init(&self) {
        self.initialized.store(true, Ordering::Release);
        log::info!("Local service bus initialized.");
    }

    /// Returns the resolved names of every advertised service, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invokes a service synchronously on the calling thread.
    pub fn call(&self, service: &str, payload: serde_json::Value) -> Reply {
        let callback = self
            .services
            .read()
            .get(service)
            .cloned()
            .ok_or_else(|| TransportError::UnknownService(service.to_string()))?;
        log::trace!("Dispatching call to '{service}'.");
        callback(payload)
    }

    /// Returns a client that queues calls for the dispatch thread.
    pub fn client(&self) -> ServiceClient {
        ServiceClient {
            sender: self.sender.clone(),
        }
    }

    /// Runs the dispatch loop until a client requests shutdown.
    ///
    /// Requests are served one at a time, in arrival order.
    pub fn serve(&self) {
        log::debug!("Service dispatcher running.");
        while let Ok(message) = self.receiver.recv() {
            match message {
                Dispatch::Call {
                    service,
                    payload,
                    reply,
                } => {
                    let result = self.call(&service, payload);
                    if reply.send(result).is_err() {
                        log::warn!("Caller of '{service}' went away before the reply.");
                    }
                }
                Dispatch::Shutdown => break,
            }
        }
        log::debug!("Service dispatcher stopped.");
    }
}

impl ServiceTransport for LocalServiceBus {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn resolve_name(&self, node: &str, service: &str) -> String {
        let node = node.trim_matches('/');
        let service = service.trim_start_matches('/');
        if node.is_empty() {
            format!("/{service}")
        } else {
            format!("/{node}/{service}")
        }
    }

    fn advertise(
        &self,
        node: &str,
        service: &str,
        callback: ServiceCallback,
    ) -> Result<String, TransportError> {
        if !self.is_initialized() {
            return Err(TransportError::NotInitialized);
        }
        let name = self.resolve_name(node, service);
        let mut services = self.services.write();
        if services.contains_key(&name) {
            return Err(TransportError::AlreadyAdvertised(name));
        }
        services.insert(name.clone(), Arc::new(callback));
        Ok(name)
    }

    fn unadvertise(&self, name: &str) -> bool {
        self.services.write().remove(name).is_some()
    }
}

/// A cloneable handle for calling services through the dispatch thread.
#[derive(Clone)]
pub struct ServiceClient {
    sender: flume::Sender<Dispatch>,
}

impl ServiceClient {
    /// Sends a raw JSON request and blocks until the dispatcher answers.
    pub fn call(&self, service: &str, payload: serde_json::Value) -> Reply {
        let (reply, response) = flume::bounded(1);
        self.sender
            .send(Dispatch::Call {
                service: service.to_string(),
                payload,
                reply,
            })
            .map_err(|_| TransportError::Disconnected)?;
        response.recv().map_err(|_| TransportError::Disconnected)?
    }

    /// Sends a typed request and decodes the typed response.
    pub fn call_typed<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        service: &str,
        request: &Req,
    ) -> Result<Resp, TransportError> {
        let invalid = |source| TransportError::InvalidPayload {
            service: service.to_string(),
            source,
        };
        let payload = serde_json::to_value(request).map_err(invalid)?;
        let response = self.call(service, payload)?;
        serde_json::from_value(response).map_err(invalid)
    }

    /// Asks the dispatch loop to stop after the requests already queued.
    pub fn shutdown(&self) {
        if self.sender.send(Dispatch::Shutdown).is_err() {
            log::warn!("Service dispatcher already stopped.");
        }
    }
}
