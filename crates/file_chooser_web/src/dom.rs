//! File-input surfaces, target elements, and the document-level hidden input.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use file_chooser_host::{
    AcquisitionSurface, ChangeListener, ChooserDocument, ChooserFile, ChooserTarget,
    ClickListener, HandleSlot, ListenerKey, SurfaceSpec,
};
use wasm_bindgen::{closure::Closure, JsCast};

use crate::{adapters::is_ios_user_agent, adapters::user_agent, file::WebFile};

/// Attribute list for a surface input element.
///
/// `capture` is left out on iOS, where it would force the camera.
pub fn surface_attributes(spec: &SurfaceSpec, ios: bool) -> Vec<(&'static str, String)> {
    let mut attributes = vec![
        ("id", spec.id.clone()),
        ("class", spec.class_name().to_string()),
        ("type", "file".to_string()),
        ("accept", spec.accept.clone()),
    ];
    if spec.multiple {
        attributes.push(("multiple", "multiple".to_string()));
    }
    if let Some(capture) = spec.capture.filter(|_| !ios) {
        attributes.push(("capture", capture.as_str().to_string()));
    }
    attributes.push(("readonly", "true".to_string()));
    attributes
}

fn document() -> Result<web_sys::Document, String> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| "document unavailable".to_string())
}

fn running_on_ios() -> bool {
    user_agent().is_some_and(|agent| is_ios_user_agent(&agent))
}

/// One `<input type="file">` element.
pub struct WebSurface {
    input: web_sys::HtmlInputElement,
    on_change: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>>,
    _on_click: Closure<dyn FnMut(web_sys::Event)>,
}

impl WebSurface {
    /// Creates a detached input element for `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is unavailable or the element cannot be created.
    pub fn create(spec: &SurfaceSpec) -> Result<Self, String> {
        let input = document()?
            .create_element("input")
            .map_err(|err| format!("failed to create file input: {err:?}"))?
            .dyn_into::<web_sys::HtmlInputElement>()
            .map_err(|_| "failed to cast file input".to_string())?;
        for (name, value) in surface_attributes(spec, running_on_ios()) {
            input
                .set_attribute(name, &value)
                .map_err(|err| format!("failed to set `{name}` on file input: {err:?}"))?;
        }
        input.set_hidden(true);

        let on_click = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            |event: web_sys::Event| event.stop_propagation(),
        ));
        input
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(|err| format!("failed to bind file input click: {err:?}"))?;

        Ok(Self {
            input,
            on_change: RefCell::new(None),
            _on_click: on_click,
        })
    }

    fn selected_files(input: &web_sys::HtmlInputElement) -> Vec<ChooserFile> {
        let Some(list) = input.files() else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .map(|file| Rc::new(WebFile::from_file(file)) as ChooserFile)
            .collect()
    }
}

impl AcquisitionSurface for WebSurface {
    fn id(&self) -> String {
        self.input.id()
    }

    fn apply_spec(&self, spec: &SurfaceSpec) {
        self.input.set_accept(&spec.accept);
        self.input.set_multiple(spec.multiple);
        match spec.capture.filter(|_| !running_on_ios()) {
            Some(capture) => {
                let _ = self.input.set_attribute("capture", capture.as_str());
            }
            None => {
                let _ = self.input.remove_attribute("capture");
            }
        }
    }

    fn set_change_listener(&self, listener: Option<ChangeListener>) {
        let closure = listener.map(|listener| {
            let input = self.input.clone();
            Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_| {
                listener(Self::selected_files(&input));
            }))
        });
        self.input
            .set_onchange(closure.as_ref().map(|c| c.as_ref().unchecked_ref()));
        *self.on_change.borrow_mut() = closure;
    }

    fn activate(&self) {
        self.input.click();
    }

    fn reset(&self) {
        self.input.set_value("");
    }

    fn remove(&self) {
        self.input.set_onchange(None);
        self.input.remove();
    }
}

/// Element a scoped chooser is bound to.
pub struct WebTarget {
    element: web_sys::HtmlElement,
    listeners: RefCell<HashMap<u64, Closure<dyn FnMut(web_sys::MouseEvent)>>>,
    next_key: Cell<u64>,
    slot: HandleSlot,
}

impl WebTarget {
    /// Wraps `element`, making it the positioning parent of its surface.
    pub fn new(element: web_sys::HtmlElement) -> Self {
        if let Err(err) = element.style().set_property("position", "relative") {
            leptos::logging::warn!("file chooser target could not be positioned: {err:?}");
        }
        Self {
            element,
            listeners: RefCell::new(HashMap::new()),
            next_key: Cell::new(0),
            slot: HandleSlot::default(),
        }
    }
}

impl ChooserTarget for WebTarget {
    fn mount_surface(&self, spec: &SurfaceSpec) -> Result<Rc<dyn AcquisitionSurface>, String> {
        let surface = WebSurface::create(spec)?;
        self.element
            .append_child(&surface.input)
            .map_err(|err| format!("failed to mount file input: {err:?}"))?;
        Ok(Rc::new(surface))
    }

    fn add_click_listener(&self, listener: ClickListener) -> Result<ListenerKey, String> {
        let closure = Closure::<dyn FnMut(web_sys::MouseEvent)>::wrap(Box::new(
            move |event: web_sys::MouseEvent| {
                event.stop_propagation();
                listener();
            },
        ));
        self.element
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(|err| format!("failed to bind target click: {err:?}"))?;
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.listeners.borrow_mut().insert(key, closure);
        Ok(ListenerKey(key))
    }

    fn remove_click_listener(&self, key: ListenerKey) {
        if let Some(closure) = self.listeners.borrow_mut().remove(&key.0) {
            let _ = self
                .element
                .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        }
    }

    fn handle_slot(&self) -> &HandleSlot {
        &self.slot
    }
}

#[derive(Default)]
/// Document body access for the one-shot hidden input.
pub struct WebDocument {
    hidden: RefCell<Option<Rc<WebSurface>>>,
}

impl ChooserDocument for WebDocument {
    fn hidden_surface(&self) -> Option<Rc<dyn AcquisitionSurface>> {
        self.hidden
            .borrow()
            .clone()
            .map(|surface| surface as Rc<dyn AcquisitionSurface>)
    }

    fn mount_hidden_surface(
        &self,
        spec: &SurfaceSpec,
    ) -> Result<Rc<dyn AcquisitionSurface>, String> {
        let body = document()?
            .body()
            .ok_or_else(|| "document body unavailable".to_string())?;
        let surface = Rc::new(WebSurface::create(spec)?);
        body.append_child(&surface.input)
            .map_err(|err| format!("failed to mount hidden file input: {err:?}"))?;
        *self.hidden.borrow_mut() = Some(surface.clone());
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use file_chooser_host::{CaptureMode, ChooserOptions, SCOPED_SURFACE_CLASS};
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec() -> SurfaceSpec {
        SurfaceSpec::scoped(&ChooserOptions {
            accept: Some("image/*".into()),
            multiple: Some(true),
            capture: Some(CaptureMode::Camera),
            ..ChooserOptions::default().with_id("avatar")
        })
    }

    #[test]
    fn attributes_mirror_surface_spec() {
        assert_eq!(
            surface_attributes(&spec(), false),
            vec![
                ("id", "avatar".to_string()),
                ("class", SCOPED_SURFACE_CLASS.to_string()),
                ("type", "file".to_string()),
                ("accept", "image/*".to_string()),
                ("multiple", "multiple".to_string()),
                ("capture", "camera".to_string()),
                ("readonly", "true".to_string()),
            ]
        );
    }

    #[test]
    fn ios_drops_capture_attribute() {
        let attributes = surface_attributes(&spec(), true);
        assert!(attributes.iter().all(|(name, _)| *name != "capture"));
    }
}
