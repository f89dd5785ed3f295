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

//! Bookkeeping behind [`RapierWorld`](super::RapierWorld): the rapier sets plus
//! the model, link and joint records that give them names.

use attacher_core::math::Pose;
use attacher_core::world::{
    Inertial, JointHandle, JointKind, LinkHandle, ModelHandle, WorldError,
};
use rapier3d::prelude::*;

use super::conversions::{from_rapier_isometry, to_rapier_isometry};

/// Number of axes a revolute joint exposes to limit setters.
const REVOLUTE_AXES: usize = 1;

pub(super) struct ModelRecord {
    pub name: String,
    pub links: Vec<LinkHandle>,
}

pub(super) struct LinkRecord {
    pub name: String,
    pub body: RigidBodyHandle,
    pub inertial: Option<Inertial>,
}

pub(super) struct JointRecord {
    pub name: String,
    pub kind: JointKind,
    pub model: ModelHandle,
    pub parent: Option<LinkHandle>,
    pub child: Option<LinkHandle>,
    /// Joint frame relative to the child link.
    pub anchor: Pose,
    pub lower: [f32; REVOLUTE_AXES],
    pub upper: [f32; REVOLUTE_AXES],
    pub initialized: bool,
    /// Live rapier constraint, present only while the joint couples its links.
    pub constraint: Option<ImpulseJointHandle>,
}

impl JointRecord {
    fn new(name: String, kind: JointKind, model: ModelHandle) -> Self {
        Self {
            name,
            kind,
            model,
            parent: None,
            child: None,
            anchor: Pose::IDENTITY,
            lower: [0.0; REVOLUTE_AXES],
            upper: [0.0; REVOLUTE_AXES],
            initialized: false,
            constraint: None,
        }
    }
}

pub(super) struct PhysicsState {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: BroadPhaseMultiSap,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub models: Vec<ModelRecord>,
    pub links: Vec<LinkRecord>,
    pub joints: Vec<JointRecord>,
}

impl PhysicsState {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity,
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            models: Vec::new(),
            links: Vec::new(),
            joints: Vec::new(),
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    pub fn model(&self, handle: ModelHandle) -> Result<&ModelRecord, WorldError> {
        self.models
            .get(handle.0 as usize)
            .ok_or(WorldError::UnknownModel(handle))
    }

    pub fn link(&self, handle: LinkHandle) -> Result<&LinkRecord, WorldError> {
        self.links
            .get(handle.0 as usize)
            .ok_or(WorldError::UnknownLink(handle))
    }

    pub fn joint(&self, handle: JointHandle) -> Result<&JointRecord, WorldError> {
        self.joints
            .get(handle.0 as usize)
            .ok_or(WorldError::UnknownJoint(handle))
    }

    pub fn joint_mut(&mut self, handle: JointHandle) -> Result<&mut JointRecord, WorldError> {
        self.joints
            .get_mut(handle.0 as usize)
            .ok_or(WorldError::UnknownJoint(handle))
    }

    pub fn model_by_name(&self, name: &str) -> Option<ModelHandle> {
        self.models
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModelHandle(i as u64))
    }

    pub fn link_by_name(&self, model: ModelHandle, name: &str) -> Option<LinkHandle> {
        let record = self.model(model).ok()?;
        record
            .links
            .iter()
            .copied()
            .find(|l| self.links.get(l.0 as usize).is_some_and(|r| r.name == name))
    }

    pub fn joint_by_name(&self, name: &str) -> Option<JointHandle> {
        self.joints
            .iter()
            .position(|j| j.name == name)
            .map(|i| JointHandle(i as u64))
    }

    pub fn body_pose(&self, link: LinkHandle) -> Result<Pose, WorldError> {
        let record = self.link(link)?;
        self.rigid_body_set
            .get(record.body)
            .map(|rb| from_rapier_isometry(rb.position()))
            .ok_or(WorldError::UnknownLink(link))
    }

    pub fn create_joint(
        &mut self,
        kind: JointKind,
        model: ModelHandle,
    ) -> Result<JointHandle, WorldError> {
        if kind != JointKind::Revolute {
            return Err(WorldError::UnsupportedJoint(kind));
        }
        let model_name = self.model(model)?.name.clone();
        let handle = JointHandle(self.joints.len() as u64);
        let name = format!("{model_name}::attacher_joint_{}", handle.0);
        self.joints.push(JointRecord::new(name, kind, model));
        Ok(handle)
    }

    pub fn check_axis(&self, joint: JointHandle, axis: usize) -> Result<(), WorldError> {
        self.joint(joint)?;
        if axis < REVOLUTE_AXES {
            Ok(())
        } else {
            Err(WorldError::InvalidAxis { joint, axis })
        }
    }

    /// Inserts the rapier constraint for `joint`, freezing the child at its
    /// current pose relative to the parent.
    pub fn engage(&mut self, joint: JointHandle) -> Result<(), WorldError> {
        self.release(joint)?;

        let record = self.joint(joint)?;
        let (parent, child) = match (record.parent, record.child) {
            (Some(p), Some(c)) => (p, c),
            _ => return Err(WorldError::JointNotAttached(joint)),
        };
        let anchor = record.anchor;
        let (lower, upper) = (record.lower[0], record.upper[0]);

        let parent_pose = self.body_pose(parent)?;
        let child_pose = self.body_pose(child)?;
        let frame_in_parent = anchor.relative_to(&child_pose).in_frame_of(&parent_pose);

        let data = GenericJointBuilder::new(JointAxesMask::LOCKED_REVOLUTE_AXES)
            .limits(JointAxis::AngX, [lower, upper])
            .local_frame1(to_rapier_isometry(frame_in_parent))
            .local_frame2(to_rapier_isometry(anchor))
            .build();

        let parent_body = self.link(parent)?.body;
        let child_body = self.link(child)?.body;
        let constraint = self
            .impulse_joint_set
            .insert(parent_body, child_body, data, true);
        self.joint_mut(joint)?.constraint = Some(constraint);
        Ok(())
    }

    /// Removes the rapier constraint of `joint`, if any, keeping the record.
    pub fn release(&mut self, joint: JointHandle) -> Result<(), WorldError> {
        if let Some(constraint) = self.joint_mut(joint)?.constraint.take() {
            self.impulse_joint_set.remove(constraint, true);
        }
        Ok(())
    }
}
