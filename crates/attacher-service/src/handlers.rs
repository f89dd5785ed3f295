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

//! Request handlers for the `attach` and `detach` services.
//!
//! Handlers always succeed at the transport level: the outcome is the `ok`
//! field of the response.

use std::sync::Arc;

use attacher_core::service::{AttachRequest, AttachResponse, ServiceCallback, TransportError};

use crate::attacher::LinkAttacher;

/// Signature shared by the two handlers.
pub type Handler = fn(&LinkAttacher, &AttachRequest) -> AttachResponse;

/// Serves one `attach` request.
pub fn handle_attach(attacher: &LinkAttacher, req: &AttachRequest) -> AttachResponse {
    log::info!(
        "Received request to attach model: '{}' using link: '{}' with model: '{}' using link: '{}'",
        req.model_name_1,
        req.link_name_1,
        req.model_name_2,
        req.link_name_2
    );
    let ok = attacher.attach(
        &req.model_name_1,
        &req.link_name_1,
        &req.model_name_2,
        &req.link_name_2,
        req.offset.to_vec3(),
    );
    if ok {
        log::info!("Attach was successful");
    } else {
        log::error!("Could not make the attach.");
    }
    AttachResponse { ok }
}

/// Serves one `detach` request.
pub fn handle_detach(attacher: &LinkAttacher, req: &AttachRequest) -> AttachResponse {
    log::info!(
        "Received request to detach model: '{}' using link: '{}' with model: '{}' using link: '{}'",
        req.model_name_1,
        req.link_name_1,
        req.model_name_2,
        req.link_name_2
    );
    let ok = attacher.detach(
        &req.model_name_1,
        &req.link_name_1,
        &req.model_name_2,
        &req.link_name_2,
        req.offset.to_vec3(),
    );
    if ok {
        log::info!("Detach was successful");
    } else {
        log::error!("Could not make the detach.");
    }
    AttachResponse { ok }
}

/// Wraps a handler into a transport callback that decodes the JSON request
/// and encodes the response.
pub fn service_callback(
    attacher: Arc<LinkAttacher>,
    service: String,
    handler: Handler,
) -> ServiceCallback {
    Box::new(move |payload| {
        let invalid = |source| TransportError::InvalidPayload {
            service: service.clone(),
            source,
        };
        let request: AttachRequest = serde_json::from_value(payload).map_err(invalid)?;
        let response = handler(&attacher, &request);
        serde_json::to_value(response).map_err(invalid)
    })
}
