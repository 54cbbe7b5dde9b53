//! Native image-picking bridge contract used by the miniapp/webview backend.

use std::{future::Future, pin::Pin};

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::ChooserOptions;

/// Object-safe boxed future used by [`NativeImageBridge`].
pub type BridgeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Default number of images the native picker allows at once.
pub const DEFAULT_NATIVE_IMAGE_COUNT: u32 = 9;

/// Mime type assumed for bridge payloads that carry no data-URL header.
pub const DEFAULT_NATIVE_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Image variants the native picker may return.
pub enum ImageSizeType {
    /// Untouched original.
    Original,
    /// Host-compressed copy.
    Compressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Sources the native picker may offer.
pub enum ImageSourceType {
    /// Photo album.
    Album,
    /// Camera capture.
    Camera,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Constraints passed to the native picker.
pub struct ChooseImageRequest {
    /// Maximum images per pick.
    pub count: u32,
    /// Accepted variants.
    pub size_type: Vec<ImageSizeType>,
    /// Offered sources.
    pub source_type: Vec<ImageSourceType>,
}

impl ChooseImageRequest {
    /// Derives picker constraints from chooser options.
    pub fn from_options(options: &ChooserOptions) -> Self {
        let count = if options.is_multiple() {
            options
                .max_count()
                .and_then(|count| u32::try_from(count).ok())
                .unwrap_or(DEFAULT_NATIVE_IMAGE_COUNT)
        } else {
            1
        };
        let source_type = if options.capture.is_some() {
            vec![ImageSourceType::Camera]
        } else {
            vec![ImageSourceType::Album, ImageSourceType::Camera]
        };
        Self {
            count,
            size_type: vec![ImageSizeType::Original, ImageSizeType::Compressed],
            source_type,
        }
    }
}

/// Host picker that returns local references, each resolvable to encoded image data.
pub trait NativeImageBridge {
    /// Opens the native picker and returns local references for the picked images.
    fn choose_images<'a>(
        &'a self,
        request: &'a ChooseImageRequest,
    ) -> BridgeFuture<'a, Result<Vec<String>, String>>;

    /// Resolves one local reference to base64 data (raw or `data:` URL).
    fn local_image_data<'a>(&'a self, local_id: &'a str)
        -> BridgeFuture<'a, Result<String, String>>;
}

/// Decodes bridge image data into bytes plus its mime type.
///
/// # Errors
///
/// Returns an error when the payload is not valid base64.
pub fn decode_local_data(encoded: &str) -> Result<(Vec<u8>, String), String> {
    let (mime_type, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "malformed data url from image bridge".to_string())?;
            let mime = header
                .split(';')
                .next()
                .filter(|mime| !mime.is_empty())
                .unwrap_or(DEFAULT_NATIVE_MIME_TYPE);
            (mime.to_string(), data)
        }
        None => (DEFAULT_NATIVE_MIME_TYPE.to_string(), encoded),
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| format!("invalid image data from bridge: {e}"))?;
    Ok((bytes, mime_type))
}
