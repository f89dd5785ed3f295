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

//! Core attach / detach logic.
//!
//! Every public operation reports a plain `bool`; the reason for a failure
//! goes to the log, which is the only diagnostic channel callers get.

use std::sync::Arc;

use attacher_core::math::{Pose, Vec3};
use attacher_core::world::{
    scoped_name, JointKind, LinkHandle, ModelHandle, PhysicsUpdateLock, SimulationWorld,
    WorldError,
};
use parking_lot::Mutex;

use crate::config::DetachPolicy;
use crate::registry::{JoinedPair, JointRegistry, PairKey};

/// Reference names that denote the inertial frame.
const INERTIAL_FRAMES: [&str; 4] = ["", "world", "map", "/map"];

/// Axis of the coupling joint whose travel is clamped to zero.
const LOCKED_AXIS: usize = 0;

#[derive(Debug, thiserror::Error)]
enum AlignError {
    #[error("link [{0}] does not exist")]
    ChildNotFound(String),
    #[error("reference frame [{0}] is not a valid entity name")]
    InvalidReference(String),
    #[error("reference link [{0}] has no world pose")]
    ReferenceUnposed(String),
    #[error(transparent)]
    World(#[from] WorldError),
}

#[derive(Debug, thiserror::Error)]
enum AttachError {
    #[error("link alignment failed: {0}")]
    Align(#[from] AlignError),
    #[error("{0} model was not found")]
    ModelNotFound(String),
    #[error("{link} link was not found in model {model}")]
    LinkNotFound { model: String, link: String },
    #[error(
        "{model1}::{link1} is already the child of a joint to {model2}::{link2}; \
         attach with the existing parent/child order"
    )]
    RolesSwapped {
        model1: String,
        link1: String,
        model2: String,
        link2: String,
    },
    #[error("no joint registered for this pair")]
    NotAttached,
    #[error("joint operation failed: {0}")]
    World(#[from] WorldError),
}

/// Joins and separates links of a host world.
///
/// The attacher owns the [`JointRegistry`]; the world, its links and its
/// joints stay owned by the host.
pub struct LinkAttacher {
    world: Arc<dyn SimulationWorld>,
    physics_lock: PhysicsUpdateLock,
    joints: Mutex<JointRegistry>,
    policy: DetachPolicy,
}

impl LinkAttacher {
    /// Creates an attacher acting on `world`.
    pub fn new(world: Arc<dyn SimulationWorld>, policy: DetachPolicy) -> Self {
        let physics_lock = world.physics_update_lock();
        Self {
            world,
            physics_lock,
            joints: Mutex::new(JointRegistry::new()),
            policy,
        }
    }

    /// Rigidly attaches `model2::link2` to `model1::link1`, placing it at
    /// `offset` relative to the parent link first.
    ///
    /// A pair that was attached before reuses its joint.
    pub fn attach(&self, model1: &str, link1: &str, model2: &str, link2: &str, offset: Vec3) -> bool {
        match self.try_attach(model1, link1, model2, link2, offset) {
            Ok(()) => true,
            Err(err) => {
                log::error!("{err}");
                false
            }
        }
    }

    /// Releases the joint between the pair and re-places `model2::link2` at
    /// `offset` relative to `model1::link1`.
    ///
    /// Fails if the pair was never attached.
    pub fn detach(&self, model1: &str, link1: &str, model2: &str, link2: &str, offset: Vec3) -> bool {
        match self.try_detach(model1, link1, model2, link2, offset) {
            Ok(()) => true,
            Err(err) => {
                log::error!("{err}");
                false
            }
        }
    }

    /// Looks up the record for the exact ordered pair.
    pub fn get_joint(&self, model1: &str, link1: &str, model2: &str, link2: &str) -> Option<JoinedPair> {
        self.joints.lock().find(model1, link1, model2, link2).cloned()
    }

    /// Number of records in the registry.
    pub fn joint_count(&self) -> usize {
        self.joints.lock().len()
    }

    /// Moves the link named `child_link` to `pose`, expressed relative to the
    /// link named `parent_link`, or to the world frame when `parent_link` is
    /// empty, `world`, `map` or `/map`.
    ///
    /// The simulation is paused for the duration of the pose change.
    pub fn align_links(&self, child_link: &str, parent_link: &str, pose: Pose) -> bool {
        match self.try_align(child_link, parent_link, pose) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Updating link state: {err}");
                false
            }
        }
    }

    fn try_attach(
        &self,
        model1: &str,
        link1: &str,
        model2: &str,
        link2: &str,
        offset: Vec3,
    ) -> Result<(), AttachError> {
        // Never build a second joint between two coupled links.
        if let Some(pair) = self.get_joint(model1, link1, model2, link2) {
            log::info!("Joint already existed, reusing it.");
            self.realign(&pair, offset)?;
            if pair.initialized {
                self.world.attach_joint(pair.joint, pair.link1, pair.link2)?;
            } else {
                log::warn!(
                    "Joint {:?} never finished initialising, configuring it again",
                    pair.joint
                );
                self.configure_joint(&pair)?;
            }
            return Ok(());
        }

        let key = PairKey::new(model1, link1, model2, link2);
        if self.joints.lock().get(&key.reversed()).is_some() {
            return Err(AttachError::RolesSwapped {
                model1: model1.to_string(),
                link1: link1.to_string(),
                model2: model2.to_string(),
                link2: link2.to_string(),
            });
        }
        log::info!("Creating new joint.");

        let offset = Pose::from_translation(offset);
        self.try_align(&scoped_name(model2, link2), &scoped_name(model1, link1), offset)?;

        log::debug!("Resolving models '{model1}' and '{model2}'");
        let m1 = self.resolve_model(model1)?;
        let m2 = self.resolve_model(model2)?;
        let l1 = self.resolve_link(m1, model1, link1)?;
        let l2 = self.resolve_link(m2, model2, link2)?;
        if log::log_enabled!(log::Level::Debug) {
            let name = |link| self.world.link_name(link).unwrap_or_default();
            log::debug!("Links are: {} and {}", name(l1), name(l2));
        }

        log::debug!("Creating revolute joint on model: '{model1}'");
        let joint = self.world.create_joint(JointKind::Revolute, m1)?;
        let pair = JoinedPair {
            key,
            offset,
            model1: m1,
            model2: m2,
            link1: l1,
            link2: l2,
            joint,
            initialized: false,
        };
        self.joints.lock().push(pair.clone());
        self.configure_joint(&pair)?;
        log::info!("Attach finished.");
        Ok(())
    }

    /// Couples the pair's links and brings the joint up as a locked revolute.
    ///
    /// The registry entry is flagged only after `init_joint` succeeds.
    fn configure_joint(&self, pair: &JoinedPair) -> Result<(), AttachError> {
        let (joint, l1, l2) = (pair.joint, pair.link1, pair.link2);
        log::debug!("Attach");
        self.world.attach_joint(joint, l1, l2)?;
        log::debug!("Loading links");
        self.world.load_joint(joint, l1, l2, Pose::IDENTITY)?;
        // The joint must belong to the child's model, not the one it was created on.
        self.world.set_joint_model(joint, pair.model2)?;
        self.world.set_joint_upper_limit(joint, LOCKED_AXIS, 0.0)?;
        self.world.set_joint_lower_limit(joint, LOCKED_AXIS, 0.0)?;
        self.world.init_joint(joint)?;
        self.joints.lock().mark_initialized(&pair.key);
        Ok(())
    }

    fn try_detach(
        &self,
        model1: &str,
        link1: &str,
        model2: &str,
        link2: &str,
        offset: Vec3,
    ) -> Result<(), AttachError> {
        let pair = self
            .get_joint(model1, link1, model2, link2)
            .ok_or(AttachError::NotAttached)?;

        {
            let _physics = self.physics_lock.lock();
            self.world.detach_joint(pair.joint)?;
        }

        if self.policy == DetachPolicy::Release {
            let mut joints = self.joints.lock();
            joints.remove(&pair.key);
            log::debug!("Released record of joint {:?}", pair.joint);
            if joints.is_empty() {
                log::debug!("No joined pairs left");
            }
        }

        self.realign(&pair, offset)
    }

    /// Re-places the child of an existing pair at `offset` from its parent.
    fn realign(&self, pair: &JoinedPair, offset: Vec3) -> Result<(), AttachError> {
        let key = &pair.key;
        self.try_align(
            &scoped_name(&key.model2, &key.link2),
            &scoped_name(&key.model1, &key.link1),
            Pose::from_translation(offset),
        )?;
        Ok(())
    }

    fn resolve_model(&self, name: &str) -> Result<ModelHandle, AttachError> {
        self.world
            .model_by_name(name)
            .ok_or_else(|| AttachError::ModelNotFound(name.to_string()))
    }

    fn resolve_link(
        &self,
        model: ModelHandle,
        model_name: &str,
        name: &str,
    ) -> Result<LinkHandle, AttachError> {
        log::debug!("Getting link: '{name}' from model: '{model_name}'");
        let link = self
            .world
            .link_by_name(model, name)
            .ok_or_else(|| AttachError::LinkNotFound {
                model: model_name.to_string(),
                link: name.to_string(),
            })?;
        match self.world.link_inertial(link) {
            Some(inertial) => log::debug!("{name} inertial mass is {}", inertial.mass),
            None => log::warn!("{name} link has no inertial"),
        }
        Ok(link)
    }

    fn try_align(&self, child_link: &str, parent_link: &str, pose: Pose) -> Result<(), AlignError> {
        log::debug!("Aligning '{child_link}' to '{parent_link}'");

        let body = self
            .world
            .entity_by_name(child_link)
            .and_then(|entity| entity.as_link())
            .ok_or_else(|| AlignError::ChildNotFound(child_link.to_string()))?;

        let target = if INERTIAL_FRAMES.contains(&parent_link) {
            log::info!("Reference frame is empty/world/map, using inertial frame");
            pose
        } else {
            let frame = self
                .world
                .entity_by_name(parent_link)
                .and_then(|entity| entity.as_link())
                .ok_or_else(|| AlignError::InvalidReference(parent_link.to_string()))?;
            let frame_pose = self
                .world
                .link_world_pose(frame)
                .ok_or_else(|| AlignError::ReferenceUnposed(parent_link.to_string()))?;
            pose.relative_to(&frame_pose)
        };

        // Never move a body in the middle of an integration step.
        let was_paused = self.world.is_paused();
        if !was_paused {
            self.world.set_paused(true);
        }
        let moved = self.world.set_link_world_pose(body, target);
        self.world.set_paused(was_paused);
        moved?;

        log::debug!("Link alignment successful.");
        Ok(())
    }
}
