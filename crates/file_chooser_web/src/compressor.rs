//! Image compressor delegating to a JavaScript function.

use file_chooser_host::{
    ChooserFile, CompressFuture, CompressOptions, CompressedImage, ImageCompressor,
};
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::file::{as_web_file, WebFile};

/// Global function looked up by [`JsImageCompressor::from_global`].
pub const COMPRESS_GLOBAL: &str = "fileChooserCompress";

#[derive(Debug, Clone)]
/// Compressor calling `compress(file, options)`, which resolves to
/// `{ file: Blob | File, origin: { name } }`.
pub struct JsImageCompressor {
    compress: Function,
}

impl JsImageCompressor {
    /// Wraps an already resolved compress function.
    pub fn new(compress: Function) -> Self {
        Self { compress }
    }

    /// Looks up [`COMPRESS_GLOBAL`] on the global object.
    pub fn from_global() -> Option<Self> {
        #[cfg(target_arch = "wasm32")]
        {
            let value =
                Reflect::get(&js_sys::global(), &JsValue::from_str(COMPRESS_GLOBAL)).ok()?;
            value.dyn_into::<Function>().ok().map(Self::new)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    async fn run(
        &self,
        file: &ChooserFile,
        options: &CompressOptions,
    ) -> Result<CompressedImage, String> {
        let source = as_web_file(file)?;
        let options = options
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| e.to_string())?;
        let returned = self
            .compress
            .call2(&JsValue::NULL, &source.to_js(), &options)
            .map_err(js_error_to_string)?;
        let resolved = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(js_error_to_string)?;

        let origin_name = Reflect::get(&resolved, &JsValue::from_str("origin"))
            .and_then(|origin| Reflect::get(&origin, &JsValue::from_str("name")))
            .ok()
            .and_then(|name| name.as_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| file.name());
        let blob = Reflect::get(&resolved, &JsValue::from_str("file"))
            .map_err(js_error_to_string)?
            .dyn_into::<web_sys::Blob>()
            .map_err(|_| "compressor did not return a file".to_string())?;

        Ok(CompressedImage {
            file: std::rc::Rc::new(WebFile::from_blob(
                blob,
                origin_name.clone(),
                file_chooser_host::unix_time_ms_now(),
            )),
            origin_name,
        })
    }
}

impl ImageCompressor for JsImageCompressor {
    fn compress<'a>(
        &'a self,
        file: &'a ChooserFile,
        options: &'a CompressOptions,
    ) -> CompressFuture<'a, Result<CompressedImage, String>> {
        Box::pin(self.run(file, options))
    }
}

pub(crate) fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}
