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

//! # Attacher Service
//!
//! The link attacher world plugin. Once loaded into a host it advertises an
//! `attach` and a `detach` service that rigidly join, or separate, two links
//! of a running simulation, and it remembers every pair it has joined so a
//! repeated attach reuses the joint it already built.

pub mod attacher;
pub mod config;
pub mod handlers;
pub mod plugin;
pub mod registry;

pub use attacher::LinkAttacher;
pub use config::{AttacherConfig, DetachPolicy};
pub use plugin::LinkAttacherPlugin;
pub use registry::{JoinedPair, JointRegistry, PairKey};
