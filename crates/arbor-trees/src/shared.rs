//! Thread-shared tree drawer behind a single coarse lock.
//!
//! The simulation thread places, removes and fells trees while the render
//! thread plans passes. Every operation takes the same mutex for its whole
//! duration, which keeps add/remove/invalidate ordering within a square
//! serialized.

use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Vec3;

use crate::TreeError;
use crate::camera::ViewCamera;
use crate::drawer::TreeDrawer;
use crate::instance::TreeInstance;
use crate::plan::FramePlan;
use crate::visibility::GridVisibility;

/// A [`TreeDrawer`] that can be shared between threads.
pub struct SharedTreeDrawer {
    inner: Mutex<TreeDrawer>,
}

impl SharedTreeDrawer {
    /// Wrap a drawer.
    pub fn new(drawer: TreeDrawer) -> Self {
        Self {
            inner: Mutex::new(drawer),
        }
    }

    /// Take the lock. A panic while holding it leaves the drawer
    /// structurally intact, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, TreeDrawer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the drawer.
    pub fn with<R>(&self, f: impl FnOnce(&mut TreeDrawer) -> R) -> R {
        f(&mut self.lock())
    }

    /// See [`TreeDrawer::add_tree`].
    pub fn add_tree(&self, tree_type: u8, position: Vec3) -> Result<Option<TreeInstance>, TreeError> {
        self.lock().add_tree(tree_type, position)
    }

    /// See [`TreeDrawer::delete_tree`].
    pub fn delete_tree(&self, position: Vec3) -> Result<Option<TreeInstance>, TreeError> {
        self.lock().delete_tree(position)
    }

    /// See [`TreeDrawer::add_falling_tree`].
    pub fn add_falling_tree(
        &self,
        position: Vec3,
        impact: Vec3,
        tree_type: u8,
    ) -> Result<bool, TreeError> {
        self.lock().add_falling_tree(position, impact, tree_type)
    }

    /// See [`TreeDrawer::update`].
    pub fn update(&self) -> usize {
        self.lock().update()
    }

    /// See [`TreeDrawer::draw`].
    pub fn draw(
        &self,
        camera: &dyn ViewCamera,
        visibility: &dyn GridVisibility,
        tree_distance: f32,
        reflection: bool,
        frame: u32,
    ) -> FramePlan {
        self.lock()
            .draw(camera, visibility, tree_distance, reflection, frame)
    }

    /// See [`TreeDrawer::draw_shadow_pass`].
    pub fn draw_shadow_pass(
        &self,
        camera: &dyn ViewCamera,
        visibility: &dyn GridVisibility,
        frame: u32,
    ) -> FramePlan {
        self.lock().draw_shadow_pass(camera, visibility, frame)
    }

    /// Unwrap the drawer.
    pub fn into_inner(self) -> TreeDrawer {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
