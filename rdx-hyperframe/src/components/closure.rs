//! A component assembled from closures.

use crate::component::{Component, Dispose, InitTask, Start, Started, Update};
use crate::context::Context;
use crate::error::HookError;

type SyncStart = Box<dyn FnMut(&mut Context<'_>) -> Result<(), HookError> + Send>;
type AsyncStart = Box<dyn FnMut(&mut Context<'_>) -> Result<InitTask, HookError> + Send>;
type UpdateFn = Box<dyn FnMut(&mut Context<'_>, f64) -> Result<(), HookError> + Send>;
type DisposeFn = Box<dyn FnMut(&mut Context<'_>) -> Result<(), HookError> + Send>;

enum StartHook {
    Sync(SyncStart),
    Async(AsyncStart),
}

/// A component whose capabilities are exactly the closures it was given.
///
/// ```rust
/// use hyperframe::components::FnComponent;
///
/// let mut frames = 0u32;
/// let counter = FnComponent::new().on_update(move |_ctx, _delta| {
///     frames += 1;
///     Ok(())
/// });
/// # let _ = counter;
/// ```
#[derive(Default)]
pub struct FnComponent {
    start: Option<StartHook>,
    update: Option<UpdateFn>,
    dispose: Option<DisposeFn>,
}

impl FnComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a synchronous start hook, replacing any previous one.
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> Result<(), HookError> + Send + 'static,
    {
        self.start = Some(StartHook::Sync(Box::new(hook)));
        self
    }

    /// Sets a start hook that hands back an in-flight task.
    pub fn on_start_async<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> Result<InitTask, HookError> + Send + 'static,
    {
        self.start = Some(StartHook::Async(Box::new(hook)));
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Context<'_>, f64) -> Result<(), HookError> + Send + 'static,
    {
        self.update = Some(Box::new(hook));
        self
    }

    pub fn on_dispose<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> Result<(), HookError> + Send + 'static,
    {
        self.dispose = Some(Box::new(hook));
        self
    }
}

impl Start for FnComponent {
    fn start(&mut self, ctx: &mut Context<'_>) -> Result<Started, HookError> {
        match &mut self.start {
            Some(StartHook::Sync(hook)) => hook(ctx).map(|()| Started::Ready),
            Some(StartHook::Async(hook)) => hook(ctx).map(Started::Pending),
            None => Ok(Started::Ready),
        }
    }
}

impl Update for FnComponent {
    fn update(&mut self, ctx: &mut Context<'_>, delta: f64) -> Result<(), HookError> {
        match &mut self.update {
            Some(hook) => hook(ctx, delta),
            None => Ok(()),
        }
    }
}

impl Dispose for FnComponent {
    fn dispose(&mut self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        match &mut self.dispose {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }
}

impl Component for FnComponent {
    fn as_start(&mut self) -> Option<&mut dyn Start> {
        if self.start.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_update(&mut self) -> Option<&mut dyn Update> {
        if self.update.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_dispose(&mut self) -> Option<&mut dyn Dispose> {
        if self.dispose.is_some() {
            Some(self)
        } else {
            None
        }
    }
}
