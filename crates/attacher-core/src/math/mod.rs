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

//! Rigid-body placement math: vectors, unit quaternions, and poses that
//! compose the way a host simulator composes frames. Angles are in radians.

pub mod pose;
pub mod quaternion;
pub mod vector;

pub use self::pose::Pose;
pub use self::quaternion::Quaternion;
pub use self::vector::Vec3;

pub use std::f32::consts::{FRAC_PI_2, PI};

/// Tolerance used by the approximate comparisons of the math types.
pub const EPSILON: f32 = 1e-5;

/// Shorthand for [`Quaternion`].
pub type Quat = Quaternion;
