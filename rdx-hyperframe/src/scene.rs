//! The render collaborator.
//!
//! The scheduler never looks inside a scene. Components add and remove nodes
//! from their hooks; the scheduler only forwards resizes and asks for one draw
//! per frame.

use crate::common::FrameInfo;
use std::collections::BTreeMap;
use tracing::trace;

/// An opaque reference to a node owned by a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Output surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; a zero height is treated as one pixel.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

pub trait Scene: Send {
    fn add_node(&mut self, label: &str) -> NodeHandle;

    /// Returns `false` if the node was not part of the scene.
    fn remove_node(&mut self, node: NodeHandle) -> bool;

    /// Called before `draw` whenever the viewport changed since the last frame.
    fn resize(&mut self, _viewport: Viewport) {}

    fn draw(&mut self, frame: &FrameInfo);
}

/// A scene that renders nothing but keeps an accurate node list.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_node: u64,
    nodes: BTreeMap<NodeHandle, String>,
    viewport: Option<Viewport>,
    draws: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.values().map(String::as_str)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Scene for HeadlessScene {
    fn add_node(&mut self, label: &str) -> NodeHandle {
        let handle = NodeHandle(self.next_node);
        self.next_node += 1;
        self.nodes.insert(handle, label.to_string());
        handle
    }

    fn remove_node(&mut self, node: NodeHandle) -> bool {
        self.nodes.remove(&node).is_some()
    }

    fn resize(&mut self, viewport: Viewport) {
        trace!(
            width = viewport.width,
            height = viewport.height,
            aspect = viewport.aspect_ratio(),
            "headless scene resized"
        );
        self.viewport = Some(viewport);
    }

    fn draw(&mut self, frame: &FrameInfo) {
        self.draws += 1;
        trace!(frame = frame.frame, nodes = self.nodes.len(), "headless draw");
    }
}
