// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Identifier types shared by the store, the AIM records and the controller

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identifies a running AI Workflow.
///
/// The index addresses a slot in the controller's workflow arena, the generation
/// is bumped every time the slot is reused. A handle kept after its workflow was
/// destroyed therefore never resolves to a later workflow in the same slot.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AiwId {
    index: usize,
    generation: u32,
}

impl AiwId {
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for AiwId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "W{}.{}", self.index, self.generation)
    }
}

/// Identifies a consumer of a message store. Every AIM record owns exactly one.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriberId(usize);

impl SubscriberId {
    /// Allocate a subscriber id that is unique within the process
    pub fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<usize> for SubscriberId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<SubscriberId> for usize {
    fn from(value: SubscriberId) -> Self {
        value.0
    }
}

impl Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Identifies one message store instance; used to reject channel handles of another store
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct StoreId(usize);

impl StoreId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}
