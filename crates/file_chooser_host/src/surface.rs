//! DOM-like primitives the browser backend builds acquisition surfaces from.

use std::rc::Rc;

use crate::{handle::HandleSlot, id::new_surface_id, CaptureMode, ChooserFile, ChooserOptions};

/// Class carried by surfaces mounted inside a target element.
pub const SCOPED_SURFACE_CLASS: &str = "file-chooser-input";
/// Class carried by the process-wide one-shot surface.
pub const HIDDEN_SURFACE_CLASS: &str = "file-chooser-input-hidden";

/// Listener invoked with the new selection when a surface reports a change.
pub type ChangeListener = Rc<dyn Fn(Vec<ChooserFile>)>;

/// Listener invoked when a target element is clicked.
pub type ClickListener = Rc<dyn Fn()>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Attributes of one file-input surface.
pub struct SurfaceSpec {
    /// DOM id.
    pub id: String,
    /// Accept filter.
    pub accept: String,
    /// Whether multiple files may be picked.
    pub multiple: bool,
    /// Capture hint.
    pub capture: Option<CaptureMode>,
    /// Whether this is the detached one-shot surface.
    pub hidden: bool,
}

impl SurfaceSpec {
    /// Builds a spec for a surface mounted inside a target element.
    pub fn scoped(options: &ChooserOptions) -> Self {
        Self::from_options(options, false)
    }

    /// Builds a spec for the process-wide hidden surface.
    pub fn hidden(options: &ChooserOptions) -> Self {
        Self::from_options(options, true)
    }

    fn from_options(options: &ChooserOptions, hidden: bool) -> Self {
        Self {
            id: options.id.clone().unwrap_or_else(new_surface_id),
            accept: options.accept().to_string(),
            multiple: options.is_multiple(),
            capture: options.capture,
            hidden,
        }
    }

    /// Returns the class name the surface element carries.
    pub const fn class_name(&self) -> &'static str {
        if self.hidden {
            HIDDEN_SURFACE_CLASS
        } else {
            SCOPED_SURFACE_CLASS
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Registration key returned by [`ChooserTarget::add_click_listener`].
pub struct ListenerKey(pub u64);

/// One file-input element.
pub trait AcquisitionSurface {
    /// DOM id of the surface.
    fn id(&self) -> String;

    /// Updates accept/multiple/capture attributes in place.
    fn apply_spec(&self, spec: &SurfaceSpec);

    /// Replaces the change listener; `None` detaches it.
    fn set_change_listener(&self, listener: Option<ChangeListener>);

    /// Opens the picker programmatically.
    fn activate(&self);

    /// Clears the selected value so the same selection fires a new change.
    fn reset(&self);

    /// Removes the surface from its parent.
    fn remove(&self);
}

/// Element a scoped chooser attaches to.
pub trait ChooserTarget {
    /// Creates a surface inside this element.
    fn mount_surface(&self, spec: &SurfaceSpec) -> Result<Rc<dyn AcquisitionSurface>, String>;

    /// Adds a click listener; the event stops propagating before `listener` runs.
    fn add_click_listener(&self, listener: ClickListener) -> Result<ListenerKey, String>;

    /// Removes a listener added with [`ChooserTarget::add_click_listener`].
    fn remove_click_listener(&self, key: ListenerKey);

    /// Slot the directive binding stores its handle in.
    fn handle_slot(&self) -> &HandleSlot;
}

/// Document-level access to the one-shot hidden surface.
pub trait ChooserDocument {
    /// Returns the hidden surface when one was mounted earlier.
    fn hidden_surface(&self) -> Option<Rc<dyn AcquisitionSurface>>;

    /// Mounts the hidden surface at the document root.
    fn mount_hidden_surface(
        &self,
        spec: &SurfaceSpec,
    ) -> Result<Rc<dyn AcquisitionSurface>, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_keeps_caller_id_or_generates_one() {
        let named = SurfaceSpec::scoped(&ChooserOptions::default().with_id("avatar"));
        assert_eq!(named.id, "avatar");
        assert_eq!(named.class_name(), SCOPED_SURFACE_CLASS);

        let generated = SurfaceSpec::hidden(&ChooserOptions::defaults());
        assert!(generated.id.starts_with("fc-"));
        assert_eq!(generated.class_name(), HIDDEN_SURFACE_CLASS);
        assert!(!generated.multiple);
    }
}
