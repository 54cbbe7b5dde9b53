//! Framework-independent attach/detach hooks for declarative chooser bindings.

use std::rc::Rc;

use leptos::logging;

use crate::{
    ChangeResult, ChooserCallbacks, ChooserError, ChooserOptions, ChooserTarget,
    FileChooserService,
};

/// Event name emitted on a successful selection.
pub const CHANGE_EVENT: &str = "fileChooserChange";
/// Event name emitted on a failed selection.
pub const ERROR_EVENT: &str = "fileChooserError";

#[derive(Debug, Clone)]
/// Outcome forwarded to the component owning a bound element.
pub enum ChooserEvent {
    /// Selection processed successfully.
    Changed(ChangeResult),
    /// Selection failed validation, compression, or acquisition.
    Failed(ChooserError),
}

impl ChooserEvent {
    /// Returns the event name the owning component listens for.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Changed(_) => CHANGE_EVENT,
            Self::Failed(_) => ERROR_EVENT,
        }
    }
}

/// Receiver for [`ChooserEvent`]s of one bound element.
pub trait ChooserEventSink {
    /// Delivers one event.
    fn emit(&self, event: ChooserEvent);
}

impl<F> ChooserEventSink for F
where
    F: Fn(ChooserEvent),
{
    fn emit(&self, event: ChooserEvent) {
        self(event)
    }
}

/// Creates a chooser for `target` and stores its handle in the target's slot.
///
/// A detach that happens while the chooser is still being created wins: the late handle is
/// destroyed instead of stored.
///
/// # Errors
///
/// Returns the error of `create_file_chooser`; nothing is stored in that case.
pub async fn on_attach(
    service: &FileChooserService,
    target: Rc<dyn ChooserTarget>,
    options: &ChooserOptions,
    sink: Rc<dyn ChooserEventSink>,
) -> Result<(), ChooserError> {
    let generation = target.handle_slot().begin_attach();
    let changed = sink.clone();
    let callbacks = ChooserCallbacks::new()
        .on_changed(move |result| changed.emit(ChooserEvent::Changed(result)))
        .on_failed(move |err| sink.emit(ChooserEvent::Failed(err)));

    let handle = service
        .create_file_chooser(target.clone(), options, callbacks)
        .await?;
    if !target.handle_slot().store(generation, handle) {
        logging::log!("file chooser element detached before attach completed");
    }
    Ok(())
}

/// Destroys the handle stored for `target`, if any.
pub fn on_detach(target: &dyn ChooserTarget) {
    target.handle_slot().release();
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        memory::{MemoryFile, MemoryHost, MemoryTarget},
        ChooserErrorKind, ChooserFile,
    };

    fn file(name: &str, size: usize) -> ChooserFile {
        Rc::new(MemoryFile::new(name, "", vec![1; size]))
    }

    fn recording_sink() -> (Rc<dyn ChooserEventSink>, Rc<RefCell<Vec<&'static str>>>) {
        let names = Rc::new(RefCell::new(Vec::new()));
        let seen = names.clone();
        let sink: Rc<dyn ChooserEventSink> =
            Rc::new(move |event: ChooserEvent| seen.borrow_mut().push(event.name()));
        (sink, names)
    }

    #[test]
    fn attached_element_emits_named_events() {
        let host = MemoryHost::new();
        let service = FileChooserService::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (sink, names) = recording_sink();
        let options = ChooserOptions {
            max_size: Some(1),
            data: Some(json!("avatar")),
            ..ChooserOptions::default().with_id("bound")
        };

        host.run_until(on_attach(&service, target.clone(), &options, sink))
            .expect("attach");
        let surface = target.surface("bound").expect("mounted surface");
        surface.queue_selection(vec![file("ok.txt", 10)]);
        assert!(target.handle_slot().trigger());
        host.run_until_stalled();
        surface.select(vec![file("big.txt", 4096)]);
        host.run_until_stalled();

        assert_eq!(*names.borrow(), vec![CHANGE_EVENT, ERROR_EVENT]);
    }

    #[test]
    fn detach_destroys_stored_handle() {
        let host = MemoryHost::new();
        let service = FileChooserService::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (sink, _) = recording_sink();

        host.run_until(on_attach(
            &service,
            target.clone(),
            &ChooserOptions::default(),
            sink,
        ))
        .expect("attach");
        assert!(target.handle_slot().is_attached());
        assert_eq!(target.surface_ids().len(), 1);

        on_detach(target.as_ref());

        assert!(!target.handle_slot().is_attached());
        assert!(target.surface_ids().is_empty());
        assert_eq!(target.click_listener_count(), 0);
        on_detach(target.as_ref());
    }

    #[test]
    fn failed_attach_stores_nothing() {
        let host = MemoryHost::new();
        let service = FileChooserService::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        target.fail_mounts(true);
        let (sink, names) = recording_sink();

        let err = host
            .run_until(on_attach(
                &service,
                target.clone(),
                &ChooserOptions::default(),
                sink,
            ))
            .expect_err("mount failure");

        assert_eq!(err.kind(), ChooserErrorKind::Other);
        assert!(!target.handle_slot().is_attached());
        assert!(names.borrow().is_empty());
    }

    #[test]
    fn reattach_replaces_previous_binding() {
        let host = MemoryHost::new();
        let service = FileChooserService::new(host.services());
        let target = Rc::new(MemoryTarget::default());

        for _ in 0..2 {
            let (sink, _) = recording_sink();
            host.run_until(on_attach(
                &service,
                target.clone(),
                &ChooserOptions::default(),
                sink,
            ))
            .expect("attach");
        }

        assert_eq!(target.surface_ids().len(), 1);
        assert_eq!(target.click_listener_count(), 1);
    }
}
