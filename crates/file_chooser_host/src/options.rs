//! Chooser options, compressor options, and the deep override-wins merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default JPEG/PNG re-encode quality handed to the compressor.
pub const DEFAULT_COMPRESS_QUALITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Native capture source hint for the acquisition surface.
pub enum CaptureMode {
    /// Still camera.
    Camera,
    /// Video camera.
    Camcorder,
}

impl CaptureMode {
    /// Returns the HTML `capture` attribute token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Camcorder => "camcorder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Options forwarded verbatim to the image compressor.
pub struct CompressOptions {
    /// Re-encode quality in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    /// Maximum output width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    /// Maximum output height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
    /// Output mime type override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Compressor-specific fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompressOptions {
    /// Returns a new value with `overlay` fields taking precedence over `self`.
    pub fn merged_with(&self, overlay: &CompressOptions) -> CompressOptions {
        let mut extra = self.extra.clone();
        for (key, value) in &overlay.extra {
            let merged = match extra.get(key) {
                Some(base) => merge_json(base, value),
                None => value.clone(),
            };
            extra.insert(key.clone(), merged);
        }
        CompressOptions {
            quality: overlay.quality.or(self.quality),
            max_width: overlay.max_width.or(self.max_width),
            max_height: overlay.max_height.or(self.max_height),
            mime_type: overlay.mime_type.clone().or_else(|| self.mime_type.clone()),
            extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Per-invocation chooser configuration.
///
/// Every field is optional so a caller can pass a partial value that is merged over the
/// process-wide defaults with [`ChooserOptions::merged_with`].
pub struct ChooserOptions {
    /// Mime/extension filter for the acquisition UI (`image/*,.pdf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    /// Native capture source hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureMode>,
    /// Whether more than one file may be selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    /// Maximum number of files; only checked when `multiple` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
    /// Minimum file size in kilobytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Maximum file size in kilobytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Acquisition surface id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Allowed extensions without the leading dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type_limits: Option<Vec<String>>,
    /// Opaque caller payload echoed back in [`crate::ChangeResult::data`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Whether a click on the target element opens the chooser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickable: Option<bool>,
    /// Options forwarded to the image compressor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<CompressOptions>,
}

impl ChooserOptions {
    /// Built-in defaults used to seed the process-wide configuration.
    pub fn defaults() -> Self {
        Self {
            accept: Some(String::new()),
            multiple: Some(false),
            file_type_limits: Some(Vec::new()),
            compress: Some(CompressOptions {
                quality: Some(DEFAULT_COMPRESS_QUALITY),
                ..CompressOptions::default()
            }),
            clickable: Some(true),
            ..Self::default()
        }
    }

    /// Parses options from their camelCase JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON does not match the options shape.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    /// Returns a new value with `overlay` fields taking precedence over `self`.
    ///
    /// Nested objects (`data`, `compress`) are merged key by key; lists and scalars are
    /// replaced wholesale. Neither input is modified.
    pub fn merged_with(&self, overlay: &ChooserOptions) -> ChooserOptions {
        let data = match (&self.data, &overlay.data) {
            (Some(base), Some(top)) => Some(merge_json(base, top)),
            (base, top) => top.clone().or_else(|| base.clone()),
        };
        let compress = match (&self.compress, &overlay.compress) {
            (Some(base), Some(top)) => Some(base.merged_with(top)),
            (base, top) => top.clone().or_else(|| base.clone()),
        };
        ChooserOptions {
            accept: overlay.accept.clone().or_else(|| self.accept.clone()),
            capture: overlay.capture.or(self.capture),
            multiple: overlay.multiple.or(self.multiple),
            max_count: overlay.max_count.or(self.max_count),
            min_size: overlay.min_size.or(self.min_size),
            max_size: overlay.max_size.or(self.max_size),
            id: overlay.id.clone().or_else(|| self.id.clone()),
            file_type_limits: overlay
                .file_type_limits
                .clone()
                .or_else(|| self.file_type_limits.clone()),
            data,
            clickable: overlay.clickable.or(self.clickable),
            compress,
        }
    }

    /// Returns a copy with the surface id replaced.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the accept filter, empty when unset.
    pub fn accept(&self) -> &str {
        self.accept.as_deref().unwrap_or_default()
    }

    /// Returns whether multi-selection is enabled.
    pub fn is_multiple(&self) -> bool {
        self.multiple.unwrap_or(false)
    }

    /// Returns whether the target element forwards clicks to the chooser.
    pub fn is_clickable(&self) -> bool {
        self.clickable.unwrap_or(true)
    }

    /// Returns the count limit; zero counts as unset.
    pub fn max_count(&self) -> Option<usize> {
        self.max_count.filter(|count| *count > 0)
    }

    /// Returns the lower size bound in bytes; zero counts as unset.
    pub fn min_size_bytes(&self) -> Option<u64> {
        self.min_size
            .filter(|kb| *kb > 0)
            .map(|kb| kb.saturating_mul(1024))
    }

    /// Returns the upper size bound in bytes; zero counts as unset.
    pub fn max_size_bytes(&self) -> Option<u64> {
        self.max_size
            .filter(|kb| *kb > 0)
            .map(|kb| kb.saturating_mul(1024))
    }

    /// Returns the allowed extensions, empty when unrestricted.
    pub fn file_type_limits(&self) -> &[String] {
        self.file_type_limits.as_deref().unwrap_or_default()
    }

    /// Returns the compressor options, defaulted when unset.
    pub fn compress_options(&self) -> CompressOptions {
        self.compress.clone().unwrap_or_default()
    }
}

/// Recursively merges two JSON values; objects merge per key and `top` wins otherwise.
pub fn merge_json(base: &Value, top: &Value) -> Value {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            let mut merged = base.clone();
            for (key, value) in top {
                let next = match merged.get(key) {
                    Some(existing) => merge_json(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, top) => top.clone(),
    }
}
