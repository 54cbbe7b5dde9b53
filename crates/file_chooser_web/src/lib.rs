//! Browser (`wasm32`) implementations of [`file_chooser_host`] collaborators.
//!
//! This crate wires file-input surfaces, `File`/`Blob` values, a JavaScript compressor hook, the
//! WeChat JS-SDK image bridge, and a Leptos directive to the target-independent chooser core.
//!
//! The WeChat bridge is split under `bridge/` into a shared facade and `bridge::interop`
//! (wasm bindings plus a non-wasm fallback).

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Runtime detection and the process-wide chooser service.
pub mod adapters;
mod bridge;
pub mod compressor;
pub mod directive;
pub mod dom;
pub mod file;
pub mod spawn;

pub use adapters::{
    build_chooser_services, configure, create_file_chooser, file_chooser_service,
    is_ios_user_agent, open_file_chooser, platform_for_user_agent, user_agent,
    WECHAT_USER_AGENT_MARKER,
};
pub use bridge::WechatImageBridge;
pub use compressor::{JsImageCompressor, COMPRESS_GLOBAL};
pub use directive::{file_chooser, FileChooserBinding};
pub use dom::{surface_attributes, WebDocument, WebSurface, WebTarget};
pub use file::{WebFile, WebFileFactory};
pub use spawn::{spawn_local_task, WasmSpawner};
