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

//! A recording in-memory world for exercising the attacher without a
//! physics engine.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attacher_core::math::Pose;
use attacher_core::world::{
    Entity, Inertial, JointHandle, JointKind, LinkHandle, ModelHandle, PhysicsUpdateLock,
    SimulationWorld, WorldError,
};
use parking_lot::{Mutex, ReentrantMutex};

pub struct FakeLink {
    pub name: String,
    pub model: ModelHandle,
    pub pose: Pose,
    pub inertial: Option<Inertial>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeJoint {
    pub kind: JointKind,
    pub model: ModelHandle,
    pub parent: Option<LinkHandle>,
    pub child: Option<LinkHandle>,
    pub anchor: Option<Pose>,
    pub lower: Option<f32>,
    pub upper: Option<f32>,
    pub initialized: bool,
    pub engaged: bool,
    pub attach_calls: usize,
}

#[derive(Default)]
pub struct FakeState {
    pub models: Vec<(String, Vec<LinkHandle>)>,
    pub links: Vec<FakeLink>,
    pub joints: Vec<FakeJoint>,
    /// Every name passed to `entity_by_name`, in call order.
    pub resolved_names: Vec<String>,
    /// Every pose write: link, pose, and whether the world was paused at the time.
    pub pose_writes: Vec<(LinkHandle, Pose, bool)>,
    /// For every `detach_joint` call, whether the physics lock was held.
    pub detach_lock_held: Vec<bool>,
    /// When set, `init_joint` fails without touching the joint.
    pub fail_init: bool,
    /// Models `model_by_name` pretends not to know; scoped lookups still find them.
    pub unlisted_models: Vec<String>,
    /// `(model, link)` pairs `link_by_name` pretends not to know.
    pub unlisted_links: Vec<(String, String)>,
}

impl FakeState {
    fn find_model(&self, name: &str) -> Option<ModelHandle> {
        self.models
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| ModelHandle(i as u64))
    }

    fn find_link(&self, model: ModelHandle, name: &str) -> Option<LinkHandle> {
        let (_, links) = self.models.get(model.0 as usize)?;
        links
            .iter()
            .copied()
            .find(|l| self.links[l.0 as usize].name == name)
    }
}

pub struct FakeWorld {
    state: Mutex<FakeState>,
    lock: PhysicsUpdateLock,
    paused: AtomicBool,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            lock: Arc::new(ReentrantMutex::new(())),
            paused: AtomicBool::new(false),
        }
    }

    /// The robot/arm + box/box_link world used throughout the tests.
    pub fn robot_and_box() -> Arc<Self> {
        let world = Self::new();
        world.add_model("robot", &[("arm", Pose::IDENTITY, Some(2.0))]);
        world.add_model("box", &[("box_link", Pose::IDENTITY, Some(0.5))]);
        Arc::new(world)
    }

    pub fn add_model(&self, name: &str, links: &[(&str, Pose, Option<f32>)]) -> ModelHandle {
        let mut state = self.state.lock();
        let model = ModelHandle(state.models.len() as u64);
        let mut handles = Vec::new();
        for (link, pose, mass) in links {
            handles.push(LinkHandle(state.links.len() as u64));
            state.links.push(FakeLink {
                name: link.to_string(),
                model,
                pose: *pose,
                inertial: mass.map(|mass| Inertial { mass }),
            });
        }
        state.models.push((name.to_string(), handles));
        model
    }

    pub fn set_pose(&self, model: &str, link: &str, pose: Pose) {
        let handle = self.link(model, link);
        self.state.lock().links[handle.0 as usize].pose = pose;
    }

    pub fn link(&self, model: &str, link: &str) -> LinkHandle {
        let state = self.state.lock();
        let model = state.find_model(model).expect("model exists");
        state.find_link(model, link).expect("link exists")
    }

    pub fn pose_of(&self, model: &str, link: &str) -> Pose {
        let handle = self.link(model, link);
        self.state.lock().links[handle.0 as usize].pose
    }

    pub fn joint(&self, joint: JointHandle) -> FakeJoint {
        self.state.lock().joints[joint.0 as usize].clone()
    }

    pub fn joints_created(&self) -> usize {
        self.state.lock().joints.len()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        let state = self.state.lock();
        f(&*state)
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.state.lock().fail_init = fail;
    }

    /// Hides `model` from `model_by_name` while `entity_by_name` still resolves it.
    pub fn unlist_model(&self, model: &str) {
        self.state.lock().unlisted_models.push(model.to_string());
    }

    /// Hides `model::link` from `link_by_name` while `entity_by_name` still resolves it.
    pub fn unlist_link(&self, model: &str, link: &str) {
        self.state
            .lock()
            .unlisted_links
            .push((model.to_string(), link.to_string()));
    }

    pub fn clear_records(&self) {
        let mut state = self.state.lock();
        state.resolved_names.clear();
        state.pose_writes.clear();
        state.detach_lock_held.clear();
    }

    fn with_joint<R>(
        &self,
        joint: JointHandle,
        f: impl FnOnce(&mut FakeJoint) -> R,
    ) -> Result<R, WorldError> {
        let mut state = self.state.lock();
        state
            .joints
            .get_mut(joint.0 as usize)
            .map(f)
            .ok_or(WorldError::UnknownJoint(joint))
    }
}

impl SimulationWorld for FakeWorld {
    fn model_by_name(&self, name: &str) -> Option<ModelHandle> {
        let state = self.state.lock();
        if state.unlisted_models.iter().any(|m| m == name) {
            return None;
        }
        state.find_model(name)
    }

    fn link_by_name(&self, model: ModelHandle, name: &str) -> Option<LinkHandle> {
        let state = self.state.lock();
        let (model_name, _) = state.models.get(model.0 as usize)?;
        if state
            .unlisted_links
            .iter()
            .any(|(m, l)| m == model_name && l == name)
        {
            return None;
        }
        state.find_link(model, name)
    }

    fn entity_by_name(&self, scoped_name: &str) -> Option<Entity> {
        let mut state = self.state.lock();
        state.resolved_names.push(scoped_name.to_string());
        match scoped_name.split_once("::") {
            Some((model, link)) => {
                let model = state.find_model(model)?;
                state.find_link(model, link).map(Entity::Link)
            }
            None => state.find_model(scoped_name).map(Entity::Model),
        }
    }

    fn link_name(&self, link: LinkHandle) -> Option<String> {
        self.state
            .lock()
            .links
            .get(link.0 as usize)
            .map(|l| l.name.clone())
    }

    fn link_inertial(&self, link: LinkHandle) -> Option<Inertial> {
        self.state
            .lock()
            .links
            .get(link.0 as usize)
            .and_then(|l| l.inertial)
    }

    fn link_world_pose(&self, link: LinkHandle) -> Option<Pose> {
        self.state.lock().links.get(link.0 as usize).map(|l| l.pose)
    }

    fn set_link_world_pose(&self, link: LinkHandle, pose: Pose) -> Result<(), WorldError> {
        let paused = self.is_paused();
        let mut state = self.state.lock();
        state.pose_writes.push((link, pose, paused));
        state
            .links
            .get_mut(link.0 as usize)
            .map(|l| l.pose = pose)
            .ok_or(WorldError::UnknownLink(link))
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    fn physics_update_lock(&self) -> PhysicsUpdateLock {
        Arc::clone(&self.lock)
    }

    fn create_joint(&self, kind: JointKind, model: ModelHandle) -> Result<JointHandle, WorldError> {
        let mut state = self.state.lock();
        if model.0 as usize >= state.models.len() {
            return Err(WorldError::UnknownModel(model));
        }
        state.joints.push(FakeJoint {
            kind,
            model,
            parent: None,
            child: None,
            anchor: None,
            lower: None,
            upper: None,
            initialized: false,
            engaged: false,
            attach_calls: 0,
        });
        Ok(JointHandle(state.joints.len() as u64 - 1))
    }

    fn attach_joint(
        &self,
        joint: JointHandle,
        parent: LinkHandle,
        child: LinkHandle,
    ) -> Result<(), WorldError> {
        self.with_joint(joint, |j| {
            j.parent = Some(parent);
            j.child = Some(child);
            j.attach_calls += 1;
            j.engaged = j.initialized;
        })
    }

    fn detach_joint(&self, joint: JointHandle) -> Result<(), WorldError> {
        let held = self.lock.is_locked();
        self.state.lock().detach_lock_held.push(held);
        self.with_joint(joint, |j| j.engaged = false)
    }

    fn load_joint(
        &self,
        joint: JointHandle,
        _parent: LinkHandle,
        _child: LinkHandle,
        pose: Pose,
    ) -> Result<(), WorldError> {
        self.with_joint(joint, |j| j.anchor = Some(pose))
    }

    fn set_joint_model(&self, joint: JointHandle, model: ModelHandle) -> Result<(), WorldError> {
        self.with_joint(joint, |j| j.model = model)
    }

    fn set_joint_upper_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError> {
        if axis != 0 {
            return Err(WorldError::InvalidAxis { joint, axis });
        }
        self.with_joint(joint, |j| j.upper = Some(value))
    }

    fn set_joint_lower_limit(
        &self,
        joint: JointHandle,
        axis: usize,
        value: f32,
    ) -> Result<(), WorldError> {
        if axis != 0 {
            return Err(WorldError::InvalidAxis { joint, axis });
        }
        self.with_joint(joint, |j| j.lower = Some(value))
    }

    fn init_joint(&self, joint: JointHandle) -> Result<(), WorldError> {
        if self.state.lock().fail_init {
            return Err(WorldError::JointNotAttached(joint));
        }
        self.with_joint(joint, |j| {
            j.initialized = true;
            j.engaged = true;
        })
    }
}
