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

//! Rapier implementation of the simulation world.

mod conversions;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attacher_core::math::{Pose, Vec3};
use attacher_core::world::{
    Entity, Inertial, JointHandle, JointKind, LinkHandle, ModelHandle, PhysicsUpdateLock,
    SimulationWorld, WorldError, SCOPE_DELIMITER,
};
use parking_lot::{Mutex, ReentrantMutex};
use rapier3d::prelude::*;

use crate::scene::{BodyKind, LinkDesc, ModelDesc, SceneDesc, SceneError};
use conversions::{to_rapier_quat, to_rapier_vec};
use state::{LinkRecord, ModelRecord, PhysicsState};

/// A named-entity simulation world backed by the Rapier3D physics engine.
///
/// Models group links; each link is a rigid body with a box collider.
/// Stepping takes the physics update lock, so anything holding that lock
/// sees the solver at rest.
pub struct RapierWorld {
    state: Mutex<PhysicsState>,
    physics_lock: PhysicsUpdateLock,
    paused: AtomicBool,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, -9.81))
    }
}

impl RapierWorld {
    /// Creates an empty, running world with the given gravity.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            state: Mutex::new(PhysicsState::new(to_rapier_vec(gravity))),
            physics_lock: Arc::new(ReentrantMutex::new(())),
            paused: AtomicBool::new(false),
        }
    }

    /// Validates a scene description, then builds a world and spawns every
    /// model in it.
    pub fn from_scene(scene: &SceneDesc) -> Result<Self, SceneError> {
        scene.validate()?;
        let world = Self::new(scene.gravity);
        for model in &scene.models {
            world.spawn_model(model);
        }
        world.set_paused(scene.paused);
        log::info!(
            "Rapier world ready with {} model(s){}",
            scene.models.len(),
            if scene.paused { " (paused)" } else { "" }
        );
        Ok(world)
    }

    /// Spawns a model and its links. Link poses are relative to the model pose.
    pub fn spawn_model(&self, desc: &ModelDesc) -> ModelHandle {
        let mut state = self.state.lock();
        let handle = ModelHandle(state.models.len() as u64);
        let mut links = Vec::with_capacity(desc.links.len());
        for link in &desc.links {
            links.push(Self::spawn_link(&mut state, desc.pose, link));
        }
        log::debug!("Spawned model '{}' with {} link(s)", desc.name, links.len());
        state.models.push(ModelRecord {
            name: desc.name.clone(),
            links,
        });
        handle
    }

    fn spawn_link(state: &mut PhysicsState, model_pose: Pose, desc: &LinkDesc) -> LinkHandle {
        let rb_type = match desc.body_type {
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let pose = desc.pose.relative_to(&model_pose);

        let rigid_body = RigidBodyBuilder::new(rb_type)
            .translation(to_rapier_vec(pose.position))
            .rotation(to_rapier_quat(pose.rotation).scaled_axis())
            .build();
        let body = state.rigid_body_set.insert(rigid_body);

        let half = desc.half_extents;
        let mut collider = ColliderBuilder::cuboid(half.x, half.y, half.z);
        if let Some(mass) = desc.mass {
            collider = collider.mass(mass);
        }
        state
            .collider_set
            .insert_with_parent(collider.build(), body, &mut state.rigid_body_set);

        let handle = LinkHandle(state.links.len() as u64);
        state.links.push(LinkRecord {
            name: desc.name.clone(),
            body,
            inertial: desc.mass.map(|mass| Inertial { mass }),
        });
        handle
    }

    /// Advances the simulation by `dt` seconds unless paused.
    ///
    /// Holds the physics update lock for the whole step.
    pub fn step(&self, dt: f32) {
        if self.is_paused() {
            return;
        }
        let _guard = self.physics_lock.lock();
        self.state.lock().step(dt);
    }

    /// Returns `true` while `joint` physically couples its two links.
    pub fn is_joint_engaged(&self, joint: JointHandle) -> bool {
        self.state
            .lock()
            .joint(joint)
            .is_ok_and(|j| j.constraint.is_some())
    }

    /// Returns the number of joints ever created in this world.
    pub fn joint_count(&self) -> usize {
        self.state.lock().joints.len()
    }
}

impl SimulationWorld for RapierWorld {
    fn model_by_name(&self, name: &str) -> Option<ModelHandle> {
        self.state.lock().model_by_name(name)
    }

    fn link_by_name(&self, model: ModelHandle, name: &str) -> Option<LinkHandle> {
        self.state.lock().link_by_name(model, name)
    }

    fn entity_by_name(&self, scoped_name: &str) -> Option<Entity> {
        let state = self.state.lock();
        match scoped_name.split_once(SCOPE_DELIMITER) {
            Some((model, rest)) => {
                let model = state.model_by_name(model)?;
                state
                    .link_by_name(model, rest)
                    .map(Entity::Link)
                    .or_else(|| state.joint_by_name(scoped_name).map(Entity::Joint))
            }
            None => state.model_by_name(scoped_name).map(Entity::Model),
        }
    }

    fn link_name(&self, link: LinkHandle) -> Option<String> {
        self.state.lock().link(link).ok().map(|l| l.name.clone())
    }

    fn link_inertial(&self, link: LinkHandle) -> Option<Inertial> {
        self.state.lock().link(link).ok().and_then(|l| l.inertial)
    }

    fn link_world_pose(&self, link: LinkHandle) -> Option<Pose> {
        self.state.lock().body_pose(link).ok()
    }

    fn set_link_world_pose(&self, link: LinkHandle, pose: Pose) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        let body = state.link(link)?.body;
        let rb = state
            .rigid_body_set
            .get_mut(body)
            .ok_or(WorldError::UnknownLink(link))?;
        rb.set_translation(to_rapier_vec(pose.position), true);
        rb.set_rotation(to_rapier_quat(pose.rotation), true);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    fn physics_update_lock(&self) -> PhysicsUpdateLock {
        Arc::clone(&self.physics_lock)
    }

    fn create_joint(&self, kind: JointKind, model: ModelHandle) -> Result<JointHandle, WorldError> {
        self.state.lock().create_joint(kind, model)
    }

    fn attach_joint(
        &self,
        joint: JointHandle,
        parent: LinkHandle,
        child: LinkHandle,
    ) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        state.link(parent)?;
        state.link(child)?;
        let record = state.joint_mut(joint)?;
        record.parent = Some(parent);
        record.child = Some(child);
        if record.initialized {
            state.engage(joint)?;
        }
        Ok(())
    }

    fn detach_joint(&self, joint: JointHandle) -> Result<(), WorldError> {
        self.state.lock().release(joint)
    }

    fn load_joint(
        &self,
        joint: JointHandle,
        parent: LinkHandle,
        child: LinkHandle,
        pose: Pose,
    ) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        state.link(parent)?;
        state.link(child)?;
        let record = state.joint_mut(joint)?;
        record.parent = Some(parent);
        record.child = Some(child);
        record.anchor = pose;
        Ok(())
    }

    fn set_joint_model(&self, joint: JointHandle, model: ModelHandle) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        state.model(model)?;
        state.joint_mut(joint)?.model = model;
        Ok(())
    }

    fn set_joint_upper_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        state.check_axis(joint, axis)?;
        state.joint_mut(joint)?.upper[axis] = value;
        Ok(())
    }

    fn set_joint_lower_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        state.check_axis(joint, axis)?;
        state.joint_mut(joint)?.lower[axis] = value;
        Ok(())
    }

    fn init_joint(&self, joint: JointHandle) -> Result<(), WorldError> {
        let mut state = self.state.lock();
        let record = state.joint(joint)?;
        let owner = state.model(record.model)?.name.clone();
        log::debug!(
            "Initialising {:?} joint '{}' owned by model '{}'",
            record.kind,
            record.name,
            owner
        );
        state.joint_mut(joint)?.initialized = true;
        state.engage(joint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn box_link(name: &str, z: f32, body_type: BodyKind) -> LinkDesc {
        LinkDesc {
            name: name.to_string(),
            pose: Pose::from_translation(Vec3::new(0.0, 0.0, z)),
            body_type,
            mass: Some(1.0),
            half_extents: Vec3::new(0.05, 0.05, 0.05),
        }
    }

    fn two_model_world() -> RapierWorld {
        let world = RapierWorld::default();
        world.spawn_model(&ModelDesc {
            name: "robot".to_string(),
            pose: Pose::IDENTITY,
            links: vec![box_link("arm", 1.0, BodyKind::Static)],
        });
        world.spawn_model(&ModelDesc {
            name: "box".to_string(),
            pose: Pose::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            links: vec![box_link("box_link", 1.0, BodyKind::Dynamic)],
        });
        world
    }

    #[test]
    fn test_from_scene_rejects_duplicate_names() {
        let mut scene = SceneDesc::default();
        for _ in 0..2 {
            scene.models.push(ModelDesc {
                name: "robot".to_string(),
                pose: Pose::IDENTITY,
                links: vec![box_link("arm", 1.0, BodyKind::Static)],
            });
        }
        assert!(matches!(
            RapierWorld::from_scene(&scene),
            Err(SceneError::DuplicateName(name)) if name == "robot"
        ));

        scene.models.pop();
        let world = RapierWorld::from_scene(&scene).unwrap();
        assert!(world.model_by_name("robot").is_some());
    }

    #[test]
    fn test_degenerate_rotation_does_not_poison_pose() {
        let world = two_model_world();
        let model = world.model_by_name("box").unwrap();
        let link = world.link_by_name(model, "box_link").unwrap();

        let target = Pose::new(
            Vec3::new(0.0, 0.0, 3.0),
            attacher_core::math::Quaternion::new(0.0, 0.0, 0.0, 0.0),
        );
        world.set_link_world_pose(link, target).unwrap();
        world.step(1.0 / 60.0);

        let pose = world.link_world_pose(link).unwrap();
        assert!(pose.position.z.is_finite());
        assert!(pose
            .rotation
            .same_rotation(attacher_core::math::Quaternion::IDENTITY, 1e-4));
    }

    #[test]
    fn test_entity_lookup() {
        let world = two_model_world();
        assert!(matches!(world.entity_by_name("robot"), Some(Entity::Model(_))));
        assert!(matches!(
            world.entity_by_name("robot::arm"),
            Some(Entity::Link(_))
        ));
        assert!(world.entity_by_name("robot::missing").is_none());
        assert!(world.entity_by_name("ghost::arm").is_none());
    }

    #[test]
    fn test_link_poses_follow_model_pose() {
        let world = two_model_world();
        let model = world.model_by_name("box").unwrap();
        let link = world.link_by_name(model, "box_link").unwrap();
        let pose = world.link_world_pose(link).unwrap();
        assert_abs_diff_eq!(pose.position, Vec3::new(2.0, 0.0, 1.0), epsilon = 1e-4);
        assert_eq!(world.link_name(link).as_deref(), Some("box_link"));
        assert_eq!(world.link_inertial(link), Some(Inertial { mass: 1.0 }));
    }

    #[test]
    fn test_paused_world_does_not_step() {
        let world = two_model_world();
        let model = world.model_by_name("box").unwrap();
        let link = world.link_by_name(model, "box_link").unwrap();

        world.set_paused(true);
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let z = world.link_world_pose(link).unwrap().position.z;
        assert_abs_diff_eq!(z, 1.0, epsilon = 1e-4);

        world.set_paused(false);
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!(world.link_world_pose(link).unwrap().position.z < 1.0);
    }

    #[test]
    fn test_only_revolute_joints_are_supported() {
        let world = two_model_world();
        let model = world.model_by_name("robot").unwrap();
        assert_eq!(
            world.create_joint(JointKind::Fixed, model),
            Err(WorldError::UnsupportedJoint(JointKind::Fixed))
        );
        let joint = world.create_joint(JointKind::Revolute, model).unwrap();
        assert!(matches!(
            world.entity_by_name("robot::attacher_joint_0"),
            Some(Entity::Joint(j)) if j == joint
        ));
        assert_eq!(
            world.set_joint_upper_limit(joint, 1, 0.0),
            Err(WorldError::InvalidAxis { joint, axis: 1 })
        );
    }

    #[test]
    fn test_init_without_links_fails() {
        let world = two_model_world();
        let model = world.model_by_name("robot").unwrap();
        let joint = world.create_joint(JointKind::Revolute, model).unwrap();
        assert_eq!(
            world.init_joint(joint),
            Err(WorldError::JointNotAttached(joint))
        );
    }

    #[test]
    fn test_detach_keeps_joint_record() {
        let world = two_model_world();
        let robot = world.model_by_name("robot").unwrap();
        let boxm = world.model_by_name("box").unwrap();
        let arm = world.link_by_name(robot, "arm").unwrap();
        let cube = world.link_by_name(boxm, "box_link").unwrap();

        let joint = world.create_joint(JointKind::Revolute, robot).unwrap();
        world.attach_joint(joint, arm, cube).unwrap();
        assert!(!world.is_joint_engaged(joint));
        world.init_joint(joint).unwrap();
        assert!(world.is_joint_engaged(joint));

        world.detach_joint(joint).unwrap();
        assert!(!world.is_joint_engaged(joint));
        assert_eq!(world.joint_count(), 1);

        world.attach_joint(joint, arm, cube).unwrap();
        assert!(world.is_joint_engaged(joint));
        assert_eq!(world.joint_count(), 1);
    }
}
