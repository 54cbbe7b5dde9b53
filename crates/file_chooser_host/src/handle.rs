//! Caller-owned chooser handles, result callbacks, and the per-element handle slot.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{ChangeResult, ChooserError};

/// Handle returned by `create_file_chooser`.
///
/// The handle owns one acquisition surface (or one click binding) until [`ChooserHandle::destroy`]
/// consumes it. Dropping a handle without destroying it leaves the surface mounted.
pub struct ChooserHandle {
    id: String,
    active: Rc<Cell<bool>>,
    trigger: Rc<dyn Fn()>,
    release: Box<dyn FnOnce()>,
}

impl ChooserHandle {
    pub(crate) fn new(
        id: String,
        active: Rc<Cell<bool>>,
        trigger: Rc<dyn Fn()>,
        release: Box<dyn FnOnce()>,
    ) -> Self {
        Self {
            id,
            active,
            trigger,
            release,
        }
    }

    /// Id of the owned acquisition surface.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opens the picker programmatically.
    pub fn trigger(&self) {
        if self.active.get() {
            (self.trigger)();
        }
    }

    /// Releases listeners and elements created for this handle.
    ///
    /// Callbacks of attempts still in flight are suppressed after this call.
    pub fn destroy(self) {
        self.active.set(false);
        (self.release)();
    }
}

impl std::fmt::Debug for ChooserHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChooserHandle")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish_non_exhaustive()
    }
}

/// Success callback.
pub type ChangedCallback = Rc<dyn Fn(ChangeResult)>;
/// Failure callback.
pub type FailedCallback = Rc<dyn Fn(ChooserError)>;

#[derive(Clone, Default)]
/// `on_changed` / `on_failed` pair for repeating choosers.
///
/// Exactly one of the two runs per attempt.
pub struct ChooserCallbacks {
    on_changed: Option<ChangedCallback>,
    on_failed: Option<FailedCallback>,
}

impl ChooserCallbacks {
    /// Creates an empty callback pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the success callback.
    pub fn on_changed(mut self, callback: impl Fn(ChangeResult) + 'static) -> Self {
        self.on_changed = Some(Rc::new(callback));
        self
    }

    /// Sets the failure callback.
    pub fn on_failed(mut self, callback: impl Fn(ChooserError) + 'static) -> Self {
        self.on_failed = Some(Rc::new(callback));
        self
    }

    /// Dispatches one attempt outcome to the matching callback.
    pub fn settle(&self, outcome: Result<ChangeResult, ChooserError>) {
        match outcome {
            Ok(result) => {
                if let Some(callback) = &self.on_changed {
                    callback(result);
                }
            }
            Err(err) => {
                if let Some(callback) = &self.on_failed {
                    callback(err);
                }
            }
        }
    }
}

#[derive(Default)]
/// Per-element storage for a directive-created handle.
///
/// Attaching is asynchronous, so a detach can arrive before the handle exists. Each attach
/// takes a generation number; a handle stored for a stale generation, or after detach, is
/// destroyed on arrival.
pub struct HandleSlot {
    handle: RefCell<Option<ChooserHandle>>,
    generation: Cell<u64>,
    detached: Cell<bool>,
}

impl HandleSlot {
    /// Starts a new attach and returns its generation.
    pub fn begin_attach(&self) -> u64 {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        self.detached.set(false);
        next
    }

    /// Stores `handle` for `generation`. Returns `false` (after destroying the handle) when the
    /// attach was superseded or the element was detached meanwhile.
    pub fn store(&self, generation: u64, handle: ChooserHandle) -> bool {
        if self.detached.get() || generation != self.generation.get() {
            handle.destroy();
            return false;
        }
        let previous = self.handle.borrow_mut().replace(handle);
        if let Some(previous) = previous {
            previous.destroy();
        }
        true
    }

    /// Destroys the stored handle and marks the element detached.
    pub fn release(&self) {
        self.detached.set(true);
        self.generation.set(self.generation.get().wrapping_add(1));
        let handle = self.handle.borrow_mut().take();
        if let Some(handle) = handle {
            handle.destroy();
        }
    }

    /// Triggers the stored handle. Returns `false` when none is stored.
    pub fn trigger(&self) -> bool {
        match self.handle.borrow().as_ref() {
            Some(handle) => {
                handle.trigger();
                true
            }
            None => false,
        }
    }

    /// Returns whether a live handle is stored.
    pub fn is_attached(&self) -> bool {
        self.handle.borrow().is_some()
    }
}
