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

//! # Host World Abstractions
//!
//! Capability traits through which the link attacher reaches into a running
//! simulation. The host owns every model, link and joint; the plugin only
//! ever holds the opaque handles defined here.

mod handles;

pub use handles::{Entity, Inertial, JointHandle, JointKind, LinkHandle, ModelHandle};

use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::math::Pose;

/// The host's recursive physics update lock.
///
/// The host's stepping thread holds it for the duration of every physics
/// step; anything that must not be observed half-applied by the solver takes
/// it too.
pub type PhysicsUpdateLock = Arc<ReentrantMutex<()>>;

/// Scoped-name separator between a model and one of its links (`model::link`).
pub const SCOPE_DELIMITER: &str = "::";

/// Builds the fully qualified name of a link inside a model.
pub fn scoped_name(model: &str, link: &str) -> String {
    format!("{model}{SCOPE_DELIMITER}{link}")
}

/// Errors raised by host world operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The model handle no longer refers to a live model.
    #[error("unknown model handle {0:?}")]
    UnknownModel(ModelHandle),
    /// The link handle no longer refers to a live link.
    #[error("unknown link handle {0:?}")]
    UnknownLink(LinkHandle),
    /// The joint handle no longer refers to a live joint.
    #[error("unknown joint handle {0:?}")]
    UnknownJoint(JointHandle),
    /// The joint kind cannot be created by this host.
    #[error("joint kind {0:?} is not supported by this host")]
    UnsupportedJoint(JointKind),
    /// The joint has no such axis.
    #[error("joint {joint:?} has no axis {axis}")]
    InvalidAxis {
        /// The joint that was addressed.
        joint: JointHandle,
        /// The requested axis index.
        axis: usize,
    },
    /// The joint was used before its links were attached.
    #[error("joint {0:?} has no attached links")]
    JointNotAttached(JointHandle),
}

/// Interface contract for a running simulation world, as seen by plugins.
///
/// Every method takes `&self`: the world is shared with the host's stepping
/// thread, so implementations synchronise internally.
pub trait SimulationWorld: Send + Sync {
    /// Resolves a model by its unique name.
    fn model_by_name(&self, name: &str) -> Option<ModelHandle>;

    /// Resolves a link by name inside a model.
    fn link_by_name(&self, model: ModelHandle, name: &str) -> Option<LinkHandle>;

    /// Resolves any entity by its fully qualified name (`model` or `model::link`).
    fn entity_by_name(&self, scoped_name: &str) -> Option<Entity>;

    /// Returns the short name of a link.
    fn link_name(&self, link: LinkHandle) -> Option<String>;

    /// Returns the inertial properties of a link, if it has any.
    fn link_inertial(&self, link: LinkHandle) -> Option<Inertial>;

    /// Returns the current world pose of a link.
    fn link_world_pose(&self, link: LinkHandle) -> Option<Pose>;

    /// Teleports a link to a world pose.
    fn set_link_world_pose(&self, link: LinkHandle, pose: Pose) -> Result<(), WorldError>;

    /// Returns `true` while the simulation is paused.
    fn is_paused(&self) -> bool;

    /// Pauses or resumes the simulation.
    fn set_paused(&self, paused: bool);

    /// Returns the host's recursive physics update lock.
    fn physics_update_lock(&self) -> PhysicsUpdateLock;

    /// Creates a new, unattached joint owned by `model`.
    fn create_joint(&self, kind: JointKind, model: ModelHandle) -> Result<JointHandle, WorldError>;

    /// Couples `parent` and `child` through `joint`.
    ///
    /// On an initialised joint this re-engages the physical constraint.
    fn attach_joint(
        &self,
        joint: JointHandle,
        parent: LinkHandle,
        child: LinkHandle,
    ) -> Result<(), WorldError>;

    /// Releases the physical coupling of `joint` while keeping the joint alive.
    fn detach_joint(&self, joint: JointHandle) -> Result<(), WorldError>;

    /// Loads the joint geometry; `pose` is the joint frame relative to `child`.
    fn load_joint(
        &self,
        joint: JointHandle,
        parent: LinkHandle,
        child: LinkHandle,
        pose: Pose,
    ) -> Result<(), WorldError>;

    /// Re-parents the joint to `model`.
    fn set_joint_model(&self, joint: JointHandle, model: ModelHandle) -> Result<(), WorldError>;

    /// Sets the upper travel limit of one joint axis.
    fn set_joint_upper_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError>;

    /// Sets the lower travel limit of one joint axis.
    fn set_joint_lower_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError>;

    /// Finalises the joint and engages it in the physics engine.
    fn init_joint(&self, joint: JointHandle) -> Result<(), WorldError>;
}
