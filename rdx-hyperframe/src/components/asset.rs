//! A scene node backed by an asynchronously loaded asset.

use crate::assets::AssetSource;
use crate::component::{Component, Dispose, InitTask, Start, Started, Update};
use crate::context::Context;
use crate::error::HookError;
use crate::scene::NodeHandle;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Loads an asset during `start` and owns one scene node while it is active.
///
/// The node is only added on the first update, once the load has settled. A
/// failed load is never disposed, so nothing may be allocated before it.
pub struct AssetNode {
    identifier: String,
    source: Arc<dyn AssetSource>,
    payload: Arc<Mutex<Option<Vec<u8>>>>,
    node: Option<NodeHandle>,
}

impl AssetNode {
    pub fn new(source: Arc<dyn AssetSource>, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source,
            payload: Arc::new(Mutex::new(None)),
            node: None,
        }
    }

    /// Size of the loaded payload, once it has arrived.
    pub fn payload_len(&self) -> Option<usize> {
        self.payload
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Vec::len)
    }

    /// A shared view of the payload slot, filled when loading succeeds.
    pub fn payload(&self) -> Arc<Mutex<Option<Vec<u8>>>> {
        self.payload.clone()
    }
}

impl Start for AssetNode {
    fn start(&mut self, _ctx: &mut Context<'_>) -> Result<Started, HookError> {
        let source = Arc::clone(&self.source);
        let slot = self.payload.clone();
        let identifier = self.identifier.clone();
        Ok(Started::Pending(InitTask::spawn(async move {
            let bytes = source.load_async(&identifier).await?;
            debug!(asset = %identifier, bytes = bytes.len(), "asset loaded");
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes);
            anyhow::Ok(())
        })))
    }
}

impl Update for AssetNode {
    fn update(&mut self, ctx: &mut Context<'_>, _delta: f64) -> Result<(), HookError> {
        if self.node.is_none() {
            self.node = Some(ctx.scene().add_node(&self.identifier));
        }
        Ok(())
    }
}

impl Dispose for AssetNode {
    fn dispose(&mut self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        if let Some(node) = self.node.take() {
            ctx.scene().remove_node(node);
        }
        Ok(())
    }
}

impl Component for AssetNode {
    fn as_start(&mut self) -> Option<&mut dyn Start> {
        Some(self)
    }

    fn as_update(&mut self) -> Option<&mut dyn Update> {
        Some(self)
    }

    fn as_dispose(&mut self) -> Option<&mut dyn Dispose> {
        Some(self)
    }
}
