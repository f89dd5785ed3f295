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

//! Wire messages of the `attach` and `detach` services.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A point in 3D space, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Narrows the point to the simulator's `f32` vector.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Request shared by `attach` and `detach`.
///
/// Link 2 of model 2 is the child that gets moved; link 1 of model 1 is the
/// reference it is placed against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttachRequest {
    /// Name of the parent model.
    pub model_name_1: String,
    /// Name of the parent link inside `model_name_1`.
    pub link_name_1: String,
    /// Name of the child model.
    pub model_name_2: String,
    /// Name of the child link inside `model_name_2`.
    pub link_name_2: String,
    /// Translation of the child relative to the parent link.
    #[serde(default)]
    pub offset: Point,
}

impl AttachRequest {
    /// Builds a request with a zero offset.
    pub fn new(
        model_name_1: impl Into<String>,
        link_name_1: impl Into<String>,
        model_name_2: impl Into<String>,
        link_name_2: impl Into<String>,
    ) -> Self {
        Self {
            model_name_1: model_name_1.into(),
            link_name_1: link_name_1.into(),
            model_name_2: model_name_2.into(),
            link_name_2: link_name_2.into(),
            offset: Point::default(),
        }
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }
}

/// Response shared by `attach` and `detach`.
///
/// `ok` carries the outcome; the transport call itself succeeds either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttachResponse {
    /// `true` when the operation succeeded.
    pub ok: bool,
}
