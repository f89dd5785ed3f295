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

//! The record of every link pair the plugin has joined.

use attacher_core::math::Pose;
use attacher_core::world::{JointHandle, LinkHandle, ModelHandle};

/// The ordered `(model1, link1, model2, link2)` identity of a joined pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    /// Parent model name.
    pub model1: String,
    /// Parent link name.
    pub link1: String,
    /// Child model name.
    pub model2: String,
    /// Child link name.
    pub link2: String,
}

impl PairKey {
    /// Builds a key from the four names.
    pub fn new(model1: &str, link1: &str, model2: &str, link2: &str) -> Self {
        Self {
            model1: model1.to_string(),
            link1: link1.to_string(),
            model2: model2.to_string(),
            link2: link2.to_string(),
        }
    }

    /// Returns the key with parent and child swapped.
    pub fn reversed(&self) -> Self {
        Self {
            model1: self.model2.clone(),
            link1: self.link2.clone(),
            model2: self.model1.clone(),
            link2: self.link1.clone(),
        }
    }

    fn matches(&self, model1: &str, link1: &str, model2: &str, link2: &str) -> bool {
        self.model1 == model1 && self.link1 == link1 && self.model2 == model2 && self.link2 == link2
    }
}

/// A pair of links coupled by a joint the plugin created.
///
/// Handles are borrowed from the host, which owns the objects behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPair {
    /// Identity of the pair.
    pub key: PairKey,
    /// Offset the child was placed at when the joint was created.
    pub offset: Pose,
    /// Parent model.
    pub model1: ModelHandle,
    /// Child model.
    pub model2: ModelHandle,
    /// Parent link.
    pub link1: LinkHandle,
    /// Child link.
    pub link2: LinkHandle,
    /// The coupling joint.
    pub joint: JointHandle,
    /// Set once the joint has been fully configured and initialised.
    pub initialized: bool,
}

/// Ordered list of joined pairs, searched linearly.
///
/// Only a handful of pairs are ever attached at once, so a scan beats
/// maintaining an index.
#[derive(Debug, Default)]
pub struct JointRegistry {
    pairs: Vec<JoinedPair>,
}

impl JointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Finds the pair with exactly this ordered key.
    pub fn find(&self, model1: &str, link1: &str, model2: &str, link2: &str) -> Option<&JoinedPair> {
        self.pairs
            .iter()
            .find(|p| p.key.matches(model1, link1, model2, link2))
    }

    /// Finds the pair registered under `key`.
    pub fn get(&self, key: &PairKey) -> Option<&JoinedPair> {
        self.find(&key.model1, &key.link1, &key.model2, &key.link2)
    }

    /// Appends a pair. Callers look the key up first.
    pub fn push(&mut self, pair: JoinedPair) {
        self.pairs.push(pair);
    }

    /// Marks the joint of the pair under `key` as initialised.
    pub fn mark_initialized(&mut self, key: &PairKey) {
        if let Some(pair) = self.pairs.iter_mut().find(|p| &p.key == key) {
            pair.initialized = true;
        }
    }

    /// Removes and returns the pair registered under `key`.
    pub fn remove(&mut self, key: &PairKey) -> Option<JoinedPair> {
        let index = self.pairs.iter().position(|p| &p.key == key)?;
        Some(self.pairs.remove(index))
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pair is registered.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
