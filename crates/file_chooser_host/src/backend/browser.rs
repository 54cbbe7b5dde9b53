//! Generic-browser backend built on file-input surfaces.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use futures::channel::oneshot;
use leptos::logging;

use super::{spawn_task, ChangeResult, ChooserFuture, FileChooserBackend};
use crate::{
    compress::process_selection, AcquisitionSurface, ChangeListener, ChooserCallbacks,
    ChooserError, ChooserFile, ChooserHandle, ChooserOptions, ChooserServices, ChooserTarget,
    SurfaceSpec,
};

type Outcome = Result<ChangeResult, ChooserError>;
type Delivery = Rc<dyn Fn(Outcome)>;
type PendingRequest = Option<(u64, oneshot::Sender<Outcome>)>;

/// Browser backend: one file input per handle plus a shared hidden input for one-shot picks.
pub struct BrowserBackend {
    services: ChooserServices,
    pending: Rc<RefCell<PendingRequest>>,
    next_ticket: Cell<u64>,
}

impl BrowserBackend {
    /// Creates the backend over the given collaborators.
    pub fn new(services: ChooserServices) -> Self {
        Self {
            services,
            pending: Rc::new(RefCell::new(None)),
            next_ticket: Cell::new(0),
        }
    }

    fn hidden_surface(
        &self,
        spec: &SurfaceSpec,
    ) -> Result<Rc<dyn AcquisitionSurface>, ChooserError> {
        let document = &self.services.document;
        let surface = match document.hidden_surface() {
            Some(surface) => surface,
            None => document
                .mount_hidden_surface(spec)
                .map_err(ChooserError::other)?,
        };
        surface.apply_spec(spec);
        Ok(surface)
    }

    async fn open(&self, options: ChooserOptions) -> Outcome {
        let spec = SurfaceSpec::hidden(&options);
        let surface = self.hidden_surface(&spec)?;

        let ticket = self.next_ticket.get().wrapping_add(1);
        self.next_ticket.set(ticket);
        let (tx, rx) = oneshot::channel();
        let superseded = self.pending.borrow_mut().replace((ticket, tx));
        if let Some((_, previous)) = superseded {
            logging::warn!("pending one-shot file chooser request superseded");
            let _ = previous.send(Err(ChooserError::other(
                "superseded by a newer file chooser request",
            )));
        }

        let pending = self.pending.clone();
        let deliver: Delivery = Rc::new(move |outcome: Outcome| {
            let sender = {
                let mut slot = pending.borrow_mut();
                match slot.take() {
                    Some((current, tx)) if current == ticket => Some(tx),
                    other => {
                        *slot = other;
                        None
                    }
                }
            };
            if let Some(tx) = sender {
                let _ = tx.send(outcome);
            }
        });
        surface.set_change_listener(Some(selection_listener(
            self.services.clone(),
            Rc::new(options),
            Rc::downgrade(&surface),
            deliver,
        )));
        surface.activate();

        rx.await
            .map_err(|_| ChooserError::other("file chooser request was dropped"))?
    }

    async fn create(
        &self,
        target: Rc<dyn ChooserTarget>,
        options: ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> Result<ChooserHandle, ChooserError> {
        let spec = SurfaceSpec::scoped(&options);
        let surface = target.mount_surface(&spec).map_err(ChooserError::other)?;

        let active = Rc::new(Cell::new(true));
        let deliver: Delivery = {
            let active = active.clone();
            Rc::new(move |outcome: Outcome| {
                if active.get() {
                    callbacks.settle(outcome);
                }
            })
        };
        surface.set_change_listener(Some(selection_listener(
            self.services.clone(),
            Rc::new(options.clone()),
            Rc::downgrade(&surface),
            deliver,
        )));

        let click_key = if options.is_clickable() {
            let weak = Rc::downgrade(&surface);
            let forwarded = target.add_click_listener(Rc::new(move || {
                if let Some(surface) = weak.upgrade() {
                    surface.activate();
                }
            }));
            match forwarded {
                Ok(key) => Some(key),
                Err(err) => {
                    surface.set_change_listener(None);
                    surface.remove();
                    return Err(ChooserError::other(err));
                }
            }
        } else {
            None
        };

        let trigger_surface = surface.clone();
        let trigger = Rc::new(move || trigger_surface.activate());
        let release = Box::new(move || {
            if let Some(key) = click_key {
                target.remove_click_listener(key);
            }
            surface.set_change_listener(None);
            surface.remove();
        });

        Ok(ChooserHandle::new(spec.id, active, trigger, release))
    }
}

impl FileChooserBackend for BrowserBackend {
    fn open_file_chooser<'a>(
        &'a self,
        options: ChooserOptions,
    ) -> ChooserFuture<'a, Result<ChangeResult, ChooserError>> {
        Box::pin(self.open(options))
    }

    fn create_file_chooser<'a>(
        &'a self,
        target: Rc<dyn ChooserTarget>,
        options: ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> ChooserFuture<'a, Result<ChooserHandle, ChooserError>> {
        Box::pin(self.create(target, options, callbacks))
    }
}

/// Change listener that validates, compresses, delivers, and then resets the surface.
fn selection_listener(
    services: ChooserServices,
    options: Rc<ChooserOptions>,
    surface: Weak<dyn AcquisitionSurface>,
    deliver: Delivery,
) -> ChangeListener {
    Rc::new(move |files: Vec<ChooserFile>| {
        let task_services = services.clone();
        let options = options.clone();
        let surface = surface.clone();
        let deliver = deliver.clone();
        spawn_task(&services.spawner, async move {
            let outcome = process_selection(
                &files,
                &options,
                task_services.compressor.as_ref(),
                task_services.files.as_ref(),
            )
            .await
            .map(|processed| ChangeResult::new(&options, processed));
            deliver(outcome);
            if let Some(surface) = surface.upgrade() {
                surface.reset();
            }
        });
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        memory::{MemoryFile, MemoryHost, MemoryTarget},
        ChooserErrorKind,
    };

    fn file(name: &str, size: usize) -> ChooserFile {
        Rc::new(MemoryFile::new(name, "", vec![1; size]))
    }

    fn recording_callbacks() -> (ChooserCallbacks, Rc<RefCell<Vec<Outcome>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let changed = seen.clone();
        let failed = seen.clone();
        let callbacks = ChooserCallbacks::new()
            .on_changed(move |result| changed.borrow_mut().push(Ok(result)))
            .on_failed(move |err| failed.borrow_mut().push(Err(err)));
        (callbacks, seen)
    }

    #[test]
    fn trigger_round_trips_to_on_changed_with_data_echo() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (callbacks, seen) = recording_callbacks();
        let options = ChooserOptions {
            data: Some(json!({"tag": "x"})),
            ..ChooserOptions::defaults()
        };

        let handle = block_on(backend.create_file_chooser(target.clone(), options, callbacks))
            .expect("create chooser");
        let surface = target.surface(handle.id()).expect("mounted surface");
        surface.queue_selection(vec![file("notes.txt", 3)]);
        handle.trigger();
        host.run_until_stalled();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        let result = seen[0].as_ref().expect("change result");
        assert_eq!(result.data, Some(json!({"tag": "x"})));
        assert_eq!(result.file_names(), vec!["notes.txt"]);
        assert_eq!(surface.activations(), 1);
    }

    #[test]
    fn identical_reselection_fires_again_after_reset() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (callbacks, seen) = recording_callbacks();

        let handle = block_on(backend.create_file_chooser(
            target.clone(),
            ChooserOptions::defaults(),
            callbacks,
        ))
        .expect("create chooser");
        let surface = target.surface(handle.id()).expect("mounted surface");
        let selection = vec![file("a.txt", 1)];

        assert!(surface.select(selection.clone()));
        assert!(!surface.select(selection.clone()));
        host.run_until_stalled();
        assert!(surface.value_names().is_empty());
        assert!(surface.select(selection));
        host.run_until_stalled();

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(surface.resets(), 2);
    }

    #[test]
    fn failed_attempt_keeps_handle_usable() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (callbacks, seen) = recording_callbacks();
        let options = ChooserOptions {
            max_size: Some(1),
            ..ChooserOptions::defaults()
        };

        let handle = block_on(backend.create_file_chooser(target.clone(), options, callbacks))
            .expect("create chooser");
        let surface = target.surface(handle.id()).expect("mounted surface");
        surface.select(vec![file("big.txt", 4096)]);
        host.run_until_stalled();
        surface.select(vec![file("small.txt", 10)]);
        host.run_until_stalled();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].as_ref().expect_err("size error").kind(),
            ChooserErrorKind::InvalidSize
        );
        assert!(seen[1].is_ok());
    }

    #[test]
    fn clickable_target_forwards_clicks_and_destroy_cleans_up() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());

        let handle = block_on(backend.create_file_chooser(
            target.clone(),
            ChooserOptions::defaults(),
            ChooserCallbacks::new(),
        ))
        .expect("create chooser");
        let id = handle.id().to_string();
        let surface = target.surface(&id).expect("mounted surface");

        target.click();
        assert_eq!(surface.activations(), 1);
        assert_eq!(target.click_listener_count(), 1);
        assert_eq!(target.surface_ids(), vec![id.clone()]);

        handle.destroy();
        target.click();
        assert_eq!(surface.activations(), 1);
        assert_eq!(target.click_listener_count(), 0);
        assert!(target.surface_ids().is_empty());
    }

    #[test]
    fn non_clickable_target_gets_no_listener() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let options = ChooserOptions {
            clickable: Some(false),
            ..ChooserOptions::defaults()
        };

        let _handle = block_on(backend.create_file_chooser(
            target.clone(),
            options,
            ChooserCallbacks::new(),
        ))
        .expect("create chooser");

        assert_eq!(target.click_listener_count(), 0);
    }

    #[test]
    fn callbacks_do_not_fire_after_destroy() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        let (callbacks, seen) = recording_callbacks();

        let handle = block_on(backend.create_file_chooser(
            target.clone(),
            ChooserOptions::defaults(),
            callbacks,
        ))
        .expect("create chooser");
        let surface = target.surface(handle.id()).expect("mounted surface");
        surface.select(vec![file("a.txt", 1)]);
        handle.destroy();
        host.run_until_stalled();

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn mount_failure_surfaces_as_other() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let target = Rc::new(MemoryTarget::default());
        target.fail_mounts(true);

        let err = block_on(backend.create_file_chooser(
            target,
            ChooserOptions::defaults(),
            ChooserCallbacks::new(),
        ))
        .expect_err("mount failure");

        assert_eq!(err.kind(), ChooserErrorKind::Other);
    }

    #[test]
    fn one_shot_reuses_single_hidden_surface() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let options = ChooserOptions {
            data: Some(json!(7)),
            ..ChooserOptions::defaults()
        };

        host.document().queue_hidden_selection(vec![file("a.txt", 1)]);
        let first = host
            .run_until(backend.open_file_chooser(options.clone()))
            .expect("first pick");
        host.document().queue_hidden_selection(vec![file("b.txt", 1)]);
        let second = host
            .run_until(backend.open_file_chooser(options))
            .expect("second pick");

        assert_eq!(first.file_names(), vec!["a.txt"]);
        assert_eq!(second.file_names(), vec!["b.txt"]);
        assert_eq!(second.data, Some(json!(7)));
        assert_eq!(host.document().hidden_mounts(), 1);
    }

    #[test]
    fn one_shot_rejects_validation_failures() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());
        let options = ChooserOptions {
            file_type_limits: Some(vec!["png".into()]),
            ..ChooserOptions::defaults()
        };

        host.document().queue_hidden_selection(vec![file("a.txt", 1)]);
        let err = host
            .run_until(backend.open_file_chooser(options))
            .expect_err("type failure");

        assert_eq!(err.kind(), ChooserErrorKind::InvalidType);
    }

    #[test]
    fn newer_one_shot_supersedes_pending_one() {
        let host = MemoryHost::new();
        let backend = BrowserBackend::new(host.services());

        let first = backend.open_file_chooser(ChooserOptions::defaults());
        let second = backend.open_file_chooser(ChooserOptions::defaults());
        let (first, second) = host.run_until(async move {
            let mut first = first;
            let first_result = futures::poll!(first.as_mut());
            let mut second = second;
            let _ = futures::poll!(second.as_mut());
            let first_result = match first_result {
                std::task::Poll::Ready(result) => result,
                std::task::Poll::Pending => first.await,
            };
            (first_result, second)
        });

        let err = first.expect_err("superseded");
        assert_eq!(err.kind(), ChooserErrorKind::Other);

        host.document()
            .hidden_memory_surface()
            .expect("hidden surface")
            .select(vec![file("c.txt", 1)]);
        let result = host.run_until(second).expect("second pick");
        assert_eq!(result.file_names(), vec!["c.txt"]);
    }
}
