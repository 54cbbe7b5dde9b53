//! Target-independent file chooser core.
//!
//! This crate owns the chooser options model, the validation rules, the image compression
//! pipeline, and the two backend variants (file-input surfaces for plain browsers, and a native
//! image bridge for embedded webviews). Browser collaborators live in `file_chooser_web`; the
//! [`memory`] module provides in-memory collaborators for tests and non-browser hosts.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod bridge;
pub mod compress;
pub mod directive;
pub mod error;
pub mod file;
pub mod format;
pub mod handle;
pub mod id;
pub mod memory;
pub mod options;
pub mod service;
pub mod services;
pub mod surface;
pub mod time;
pub mod validate;

pub use backend::{
    BrowserBackend, ChangeResult, ChooserBackend, ChooserFuture, FileChooserBackend,
    NativeBridgeBackend,
};
pub use bridge::{
    decode_local_data, BridgeFuture, ChooseImageRequest, ImageSizeType, ImageSourceType,
    NativeImageBridge, DEFAULT_NATIVE_IMAGE_COUNT, DEFAULT_NATIVE_MIME_TYPE,
};
pub use compress::{
    compress_files, process_selection, CompressFuture, CompressedImage, ImageCompressor,
    PassthroughCompressor,
};
pub use directive::{
    on_attach, on_detach, ChooserEvent, ChooserEventSink, CHANGE_EVENT, ERROR_EVENT,
};
pub use error::{ChooserError, ChooserErrorKind};
pub use file::{
    extension_for_mime, file_extension, is_image_name, matches_extensions, rewrap_file,
    ChooserFile, FileFactory, FileFuture, FileLike, FileLikeKind, IMAGE_EXTENSIONS,
};
pub use format::format_bytes;
pub use handle::{ChangedCallback, ChooserCallbacks, ChooserHandle, FailedCallback, HandleSlot};
pub use id::{new_id, new_surface_id, SURFACE_ID_LEN};
pub use options::{
    merge_json, CaptureMode, ChooserOptions, CompressOptions, DEFAULT_COMPRESS_QUALITY,
};
pub use service::{ChooserConfig, FileChooserService};
pub use services::{ChooserServices, PlatformKind};
pub use surface::{
    AcquisitionSurface, ChangeListener, ChooserDocument, ChooserTarget, ClickListener,
    ListenerKey, SurfaceSpec, HIDDEN_SURFACE_CLASS, SCOPED_SURFACE_CLASS,
};
pub use time::unix_time_ms_now;
pub use validate::validate_files;
