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

//! Rigid poses (translation + rotation) and their composition.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use super::{Quaternion, Vec3, EPSILON};

/// A rigid transform made of a translation and a unit-quaternion rotation.
///
/// Poses compose as frames do: [`Pose::relative_to`] expresses `self` in the
/// frame described by another pose, which is how an offset is placed against
/// a reference link.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Translation component.
    pub position: Vec3,
    /// Rotation component.
    #[serde(default)]
    pub rotation: Quaternion,
}

impl Pose {
    /// The pose with zero translation and no rotation.
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
    };

    /// Creates a pose from a translation and a rotation.
    #[inline]
    pub fn new(position: Vec3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    /// Creates a pure translation.
    #[inline]
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quaternion::IDENTITY,
        }
    }

    /// Returns the pose obtained by applying `self` inside the frame `reference`.
    ///
    /// `result.position = reference.rotation * self.position + reference.position`
    /// and `result.rotation = reference.rotation * self.rotation`.
    pub fn relative_to(&self, reference: &Pose) -> Pose {
        Pose {
            position: reference.rotation * self.position + reference.position,
            rotation: (reference.rotation * self.rotation).normalize(),
        }
    }

    /// Returns the inverse transform, so that `p.inverse().relative_to(&p)` is the identity.
    pub fn inverse(&self) -> Pose {
        let inv_rot = self.rotation.normalize().conjugate();
        Pose {
            position: inv_rot * (-self.position),
            rotation: inv_rot,
        }
    }

    /// Expresses the world pose `self` in the local frame of `reference`.
    pub fn in_frame_of(&self, reference: &Pose) -> Pose {
        self.relative_to(&reference.inverse())
    }
}

impl AbsDiffEq for Pose {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.position.abs_diff_eq(&other.position, epsilon)
            && self.rotation.same_rotation(other.rotation, epsilon)
    }
}
