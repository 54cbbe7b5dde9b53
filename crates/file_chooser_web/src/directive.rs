//! Leptos `use:file_chooser` directive.

use std::rc::Rc;

use file_chooser_host::{
    on_attach, on_detach, ChangeResult, ChooserError, ChooserEvent, ChooserEventSink,
    ChooserOptions, ChooserTarget,
};
use leptos::{html::AnyElement, logging, on_cleanup, Callable, Callback, HtmlElement};

use crate::{file_chooser_service, spawn::spawn_local_task, WebTarget};

#[derive(Clone, Default)]
/// Directive argument: chooser options plus the component's event handlers.
///
/// `on_change` receives `fileChooserChange` events and `on_error` receives
/// `fileChooserError` events.
pub struct FileChooserBinding {
    /// Options merged over the process-wide defaults.
    pub options: ChooserOptions,
    /// Handler for successful selections.
    pub on_change: Option<Callback<ChangeResult>>,
    /// Handler for failed selections.
    pub on_error: Option<Callback<ChooserError>>,
}

impl FileChooserBinding {
    /// Creates a binding without handlers.
    pub fn new(options: ChooserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Sets the success handler.
    pub fn on_change(mut self, callback: impl Into<Callback<ChangeResult>>) -> Self {
        self.on_change = Some(callback.into());
        self
    }

    /// Sets the failure handler.
    pub fn on_error(mut self, callback: impl Into<Callback<ChooserError>>) -> Self {
        self.on_error = Some(callback.into());
        self
    }

    /// Routes one chooser event to the matching handler.
    pub fn dispatch(&self, event: ChooserEvent) {
        match event {
            ChooserEvent::Changed(result) => {
                if let Some(callback) = &self.on_change {
                    callback.call(result);
                }
            }
            ChooserEvent::Failed(err) => {
                if let Some(callback) = &self.on_error {
                    callback.call(err);
                }
            }
        }
    }
}

impl From<ChooserOptions> for FileChooserBinding {
    fn from(options: ChooserOptions) -> Self {
        Self::new(options)
    }
}

/// Binds a chooser to the element for as long as it is mounted.
///
/// ```ignore
/// let binding = FileChooserBinding::new(options).on_change(handler);
/// view! { <div use:file_chooser=binding>"Upload"</div> }
/// ```
pub fn file_chooser(el: HtmlElement<AnyElement>, binding: FileChooserBinding) {
    let element: &web_sys::HtmlElement = &el;
    let target: Rc<dyn ChooserTarget> = Rc::new(WebTarget::new(element.clone()));
    let attach_target = target.clone();
    let options = binding.options.clone();
    let sink: Rc<dyn ChooserEventSink> =
        Rc::new(move |event: ChooserEvent| binding.dispatch(event));

    spawn_local_task(async move {
        let service = file_chooser_service();
        if let Err(err) = on_attach(&service, attach_target, &options, sink).await {
            logging::warn!("file chooser directive could not attach: {err}");
        }
    });
    on_cleanup(move || on_detach(target.as_ref()));
}
