//! Native-bridge backend for embedded webviews with a host image picker.

use std::{cell::Cell, rc::Rc};

use leptos::logging;

use super::{spawn_task, ChangeResult, ChooserFuture, FileChooserBackend};
use crate::{
    bridge::decode_local_data, compress::process_selection, file::extension_for_mime,
    id::new_surface_id, ChooseImageRequest, ChooserCallbacks, ChooserError, ChooserHandle,
    ChooserOptions, ChooserServices, ChooserTarget, NativeImageBridge,
};

/// Backend that acquires images through a [`NativeImageBridge`].
pub struct NativeBridgeBackend {
    services: ChooserServices,
    bridge: Rc<dyn NativeImageBridge>,
}

impl NativeBridgeBackend {
    /// Creates the backend over the given collaborators and bridge.
    pub fn new(services: ChooserServices, bridge: Rc<dyn NativeImageBridge>) -> Self {
        Self { services, bridge }
    }

    async fn create(
        &self,
        target: Rc<dyn ChooserTarget>,
        options: ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> Result<ChooserHandle, ChooserError> {
        let id = options.id.clone().unwrap_or_else(new_surface_id);
        let active = Rc::new(Cell::new(true));
        let clickable = options.is_clickable();

        let trigger: Rc<dyn Fn()> = {
            let services = self.services.clone();
            let bridge = self.bridge.clone();
            let options = Rc::new(options);
            let active = active.clone();
            Rc::new(move || {
                let task_services = services.clone();
                let bridge = bridge.clone();
                let options = options.clone();
                let active = active.clone();
                let callbacks = callbacks.clone();
                spawn_task(&services.spawner, async move {
                    let outcome = acquire(&task_services, bridge.as_ref(), &options).await;
                    if active.get() {
                        callbacks.settle(outcome);
                    }
                });
            })
        };

        let click_key = if clickable {
            let forward = trigger.clone();
            Some(
                target
                    .add_click_listener(Rc::new(move || forward()))
                    .map_err(ChooserError::other)?,
            )
        } else {
            None
        };

        let release = Box::new(move || {
            if let Some(key) = click_key {
                target.remove_click_listener(key);
            }
        });

        Ok(ChooserHandle::new(id, active, trigger, release))
    }
}

impl FileChooserBackend for NativeBridgeBackend {
    fn open_file_chooser<'a>(
        &'a self,
        options: ChooserOptions,
    ) -> ChooserFuture<'a, Result<ChangeResult, ChooserError>> {
        Box::pin(async move { acquire(&self.services, self.bridge.as_ref(), &options).await })
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

/// Picks images through the bridge, decodes them, then validates and compresses the batch.
async fn acquire(
    services: &ChooserServices,
    bridge: &dyn NativeImageBridge,
    options: &ChooserOptions,
) -> Result<ChangeResult, ChooserError> {
    let request = ChooseImageRequest::from_options(options);
    let local_ids = bridge
        .choose_images(&request)
        .await
        .map_err(ChooserError::other)?;

    let mut files = Vec::with_capacity(local_ids.len());
    for (index, local_id) in local_ids.iter().enumerate() {
        let encoded = bridge.local_image_data(local_id).await.map_err(|err| {
            logging::warn!("native image `{local_id}` could not be resolved: {err}");
            ChooserError::other(err)
        })?;
        let (bytes, mime_type) = decode_local_data(&encoded).map_err(ChooserError::other)?;
        let name = format!("image-{}.{}", index + 1, extension_for_mime(&mime_type));
        let file = services
            .files
            .from_bytes(bytes, &name, &mime_type)
            .map_err(ChooserError::other)?;
        files.push(file);
    }

    let processed = process_selection(
        &files,
        options,
        services.compressor.as_ref(),
        services.files.as_ref(),
    )
    .await?;
    Ok(ChangeResult::new(options, processed))
}
