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

//! Plugin configuration.

use serde::{Deserialize, Serialize};

/// What `detach` does with the record of the pair it released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachPolicy {
    /// Keep the record so a later attach reuses the same joint object.
    #[default]
    Retain,
    /// Drop the record. A later attach then builds a second joint between
    /// the same links, which some physics engines do not tolerate.
    Release,
}

/// Configuration of the link attacher plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttacherConfig {
    /// Transport node the services are advertised under.
    pub node_name: String,
    /// Name of the attach service inside the node.
    pub attach_service: String,
    /// Name of the detach service inside the node.
    pub detach_service: String,
    /// Record handling on detach.
    pub detach_policy: DetachPolicy,
}

impl Default for AttacherConfig {
    fn default() -> Self {
        Self {
            node_name: "link_attacher_node".to_string(),
            attach_service: "attach".to_string(),
            detach_service: "detach".to_string(),
            detach_policy: DetachPolicy::Retain,
        }
    }
}
