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

//! Opaque handles into the host's object graph.

use serde::{Deserialize, Serialize};

/// Opaque handle to a model in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle(pub u64);

/// Opaque handle to a link (rigid body) in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkHandle(pub u64);

/// Opaque handle to a joint in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointHandle(pub u64);

/// Anything addressable by name in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A model.
    Model(ModelHandle),
    /// A link.
    Link(LinkHandle),
    /// A joint.
    Joint(JointHandle),
}

impl Entity {
    /// Returns the link handle if this entity is a link.
    pub fn as_link(&self) -> Option<LinkHandle> {
        match self {
            Entity::Link(link) => Some(*link),
            _ => None,
        }
    }
}

/// Joint kinds a host may be asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    /// One rotational axis.
    Revolute,
    /// One translational axis.
    Prismatic,
    /// No degrees of freedom.
    Fixed,
}

/// Mass properties of a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertial {
    /// Mass in kg.
    pub mass: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_as_link() {
        assert_eq!(Entity::Link(LinkHandle(7)).as_link(), Some(LinkHandle(7)));
        assert_eq!(Entity::Model(ModelHandle(7)).as_link(), None);
        assert_eq!(Entity::Joint(JointHandle(1)).as_link(), None);
    }
}
