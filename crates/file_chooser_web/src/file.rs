//! `File`/`Blob` backed file values and their constructor.

use std::{any::Any, rc::Rc};

use file_chooser_host::{ChooserFile, FileFactory, FileFuture, FileLike, FileLikeKind};
use js_sys::{Array, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Clone)]
enum Representation {
    File(web_sys::File),
    Blob {
        blob: web_sys::Blob,
        name: String,
        last_modified_ms: u64,
    },
}

#[derive(Debug, Clone)]
/// Browser file value: a native `File`, or a `Blob` stamped with a name and timestamp.
pub struct WebFile {
    inner: Representation,
}

impl WebFile {
    /// Wraps a native `File`.
    pub fn from_file(file: web_sys::File) -> Self {
        Self {
            inner: Representation::File(file),
        }
    }

    /// Wraps a `Blob`, keeping it as a `File` when it already is one.
    pub fn from_blob(
        blob: web_sys::Blob,
        name: impl Into<String>,
        last_modified_ms: u64,
    ) -> Self {
        match blob.dyn_into::<web_sys::File>() {
            Ok(file) => Self::from_file(file),
            Err(blob) => Self {
                inner: Representation::Blob {
                    blob,
                    name: name.into(),
                    last_modified_ms,
                },
            },
        }
    }

    /// Returns the underlying blob (a `File` is a `Blob`).
    pub fn as_blob(&self) -> &web_sys::Blob {
        match &self.inner {
            Representation::File(file) => file.as_ref(),
            Representation::Blob { blob, .. } => blob,
        }
    }

    /// Returns the value handed to JavaScript collaborators.
    pub fn to_js(&self) -> JsValue {
        self.as_blob().clone().into()
    }
}

impl FileLike for WebFile {
    fn name(&self) -> String {
        match &self.inner {
            Representation::File(file) => file.name(),
            Representation::Blob { name, .. } => name.clone(),
        }
    }

    fn size(&self) -> u64 {
        self.as_blob().size().max(0.0) as u64
    }

    fn mime_type(&self) -> String {
        self.as_blob().type_()
    }

    fn last_modified_ms(&self) -> u64 {
        match &self.inner {
            Representation::File(file) => file.last_modified().max(0.0) as u64,
            Representation::Blob {
                last_modified_ms, ..
            } => *last_modified_ms,
        }
    }

    fn kind(&self) -> FileLikeKind {
        match self.inner {
            Representation::File(_) => FileLikeKind::File,
            Representation::Blob { .. } => FileLikeKind::Blob,
        }
    }

    fn read_bytes(&self) -> FileFuture<'_, Result<Vec<u8>, String>> {
        Box::pin(async move {
            let buffer = JsFuture::from(self.as_blob().array_buffer())
                .await
                .map_err(|err| format!("failed to read `{}`: {err:?}", self.name()))?;
            Ok(Uint8Array::new(&buffer).to_vec())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcasts a chooser file produced by this crate.
pub(crate) fn as_web_file(source: &ChooserFile) -> Result<&WebFile, String> {
    source
        .as_any()
        .downcast_ref::<WebFile>()
        .ok_or_else(|| format!("`{}` is not a browser file", source.name()))
}

#[derive(Debug, Clone, Copy, Default)]
/// [`FileFactory`] over the `File` and `Blob` constructors.
pub struct WebFileFactory;

impl WebFileFactory {
    fn file_from_parts(
        parts: &Array,
        name: &str,
        mime_type: &str,
    ) -> Result<web_sys::File, String> {
        let bag = web_sys::FilePropertyBag::new();
        bag.set_type(mime_type);
        web_sys::File::new_with_blob_sequence_and_options(parts, name, &bag)
            .map_err(|err| format!("File constructor failed: {err:?}"))
    }

    fn blob_from_parts(parts: &Array, mime_type: &str) -> Result<web_sys::Blob, String> {
        let bag = web_sys::BlobPropertyBag::new();
        bag.set_type(mime_type);
        web_sys::Blob::new_with_blob_sequence_and_options(parts, &bag)
            .map_err(|err| format!("Blob constructor failed: {err:?}"))
    }
}

impl FileFactory for WebFileFactory {
    fn from_bytes(
        &self,
        bytes: Vec<u8>,
        name: &str,
        mime_type: &str,
    ) -> Result<ChooserFile, String> {
        let parts = Array::of1(&Uint8Array::from(bytes.as_slice()));
        match Self::file_from_parts(&parts, name, mime_type) {
            Ok(file) => Ok(Rc::new(WebFile::from_file(file))),
            Err(err) => {
                leptos::logging::warn!("{err}; keeping `{name}` as a blob");
                let blob = Self::blob_from_parts(&parts, mime_type)?;
                Ok(Rc::new(WebFile::from_blob(
                    blob,
                    name,
                    file_chooser_host::unix_time_ms_now(),
                )))
            }
        }
    }

    fn to_file(&self, source: &ChooserFile, name: &str) -> Result<ChooserFile, String> {
        let blob = as_web_file(source)?.as_blob();
        let parts = Array::of1(blob);
        let file = Self::file_from_parts(&parts, name, &blob.type_())?;
        Ok(Rc::new(WebFile::from_file(file)))
    }

    fn to_blob(
        &self,
        source: &ChooserFile,
        name: &str,
        last_modified_ms: u64,
    ) -> Result<ChooserFile, String> {
        let blob = as_web_file(source)?.as_blob();
        let copy = Self::blob_from_parts(&Array::of1(blob), &blob.type_())?;
        Ok(Rc::new(WebFile::from_blob(copy, name, last_modified_ms)))
    }
}
