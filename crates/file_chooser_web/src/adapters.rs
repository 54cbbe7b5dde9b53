//! Runtime detection and the process-wide chooser service for the browser.

use std::rc::Rc;

use file_chooser_host::{
    ChangeResult, ChooserCallbacks, ChooserError, ChooserHandle, ChooserOptions, ChooserServices,
    FileChooserService, ImageCompressor, NativeImageBridge, PassthroughCompressor, PlatformKind,
};
use leptos::logging;

use crate::{
    JsImageCompressor, WasmSpawner, WebDocument, WebFileFactory, WebTarget, WechatImageBridge,
    COMPRESS_GLOBAL,
};

/// User-agent marker of the WeChat in-app browser.
pub const WECHAT_USER_AGENT_MARKER: &str = "MicroMessenger";

/// Returns the browser user agent, `None` outside `wasm32`.
pub fn user_agent() -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window().and_then(|window| window.navigator().user_agent().ok())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

/// Returns the platform a user agent implies.
pub fn platform_for_user_agent(agent: &str) -> PlatformKind {
    if agent.contains(WECHAT_USER_AGENT_MARKER) {
        PlatformKind::NativeBridge
    } else {
        PlatformKind::GenericBrowser
    }
}

/// Returns whether a user agent belongs to an iOS device.
pub fn is_ios_user_agent(agent: &str) -> bool {
    ["iPhone", "iPad", "iPod"]
        .iter()
        .any(|device| agent.contains(device))
}

fn native_bridge_for_runtime() -> Option<Rc<dyn NativeImageBridge>> {
    let agent = user_agent()?;
    if platform_for_user_agent(&agent) != PlatformKind::NativeBridge {
        return None;
    }
    match WechatImageBridge::detect() {
        Some(bridge) => Some(Rc::new(bridge)),
        None => {
            logging::warn!("WeChat user agent detected but the JS-SDK is not loaded");
            None
        }
    }
}

fn compressor_for_runtime() -> Rc<dyn ImageCompressor> {
    match JsImageCompressor::from_global() {
        Some(compressor) => Rc::new(compressor),
        None => {
            logging::log!("`{COMPRESS_GLOBAL}` not found; images are kept uncompressed");
            Rc::new(PassthroughCompressor)
        }
    }
}

/// Builds the browser collaborator bundle for the current page.
pub fn build_chooser_services() -> ChooserServices {
    ChooserServices {
        compressor: compressor_for_runtime(),
        files: Rc::new(WebFileFactory),
        document: Rc::new(WebDocument::default()),
        native_bridge: native_bridge_for_runtime(),
        spawner: Rc::new(WasmSpawner),
    }
}

thread_local! {
    static FILE_CHOOSER_SERVICE: Rc<FileChooserService> =
        Rc::new(FileChooserService::new(build_chooser_services()));
}

/// Returns the process-wide chooser service.
pub fn file_chooser_service() -> Rc<FileChooserService> {
    FILE_CHOOSER_SERVICE.with(Rc::clone)
}

/// Deep-merges `options` into the process-wide defaults.
pub fn configure(options: &ChooserOptions) {
    file_chooser_service().configure(options);
}

/// Opens the chooser once with the process-wide service.
///
/// # Errors
///
/// Returns the validation, compression, or backend error of the attempt.
pub async fn open_file_chooser(options: &ChooserOptions) -> Result<ChangeResult, ChooserError> {
    file_chooser_service().open_file_chooser(options).await
}

/// Binds a repeating chooser to `element` with the process-wide service.
///
/// # Errors
///
/// Returns `Other` when the element rejects the binding.
pub async fn create_file_chooser(
    element: web_sys::HtmlElement,
    options: &ChooserOptions,
    callbacks: ChooserCallbacks,
) -> Result<ChooserHandle, ChooserError> {
    file_chooser_service()
        .create_file_chooser(Rc::new(WebTarget::new(element)), options, callbacks)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const WECHAT_ANDROID: &str = "Mozilla/5.0 (Linux; Android 13) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/116.0 Mobile Safari/537.36 MicroMessenger/8.0.40";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn user_agent_selects_platform() {
        assert_eq!(
            platform_for_user_agent(WECHAT_ANDROID),
            PlatformKind::NativeBridge
        );
        assert_eq!(
            platform_for_user_agent(SAFARI_IPHONE),
            PlatformKind::GenericBrowser
        );
    }

    #[test]
    fn ios_detection_matches_apple_devices_only() {
        assert!(is_ios_user_agent(SAFARI_IPHONE));
        assert!(!is_ios_user_agent(WECHAT_ANDROID));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_services_fall_back_to_generic_browser() {
        assert_eq!(user_agent(), None);
        let services = build_chooser_services();
        assert!(services.native_bridge.is_none());
        assert_eq!(services.detected_platform(), PlatformKind::GenericBrowser);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn process_wide_service_is_shared() {
        let first = file_chooser_service();
        configure(&ChooserOptions {
            max_count: Some(4),
            ..ChooserOptions::default()
        });

        assert!(Rc::ptr_eq(&first, &file_chooser_service()));
        assert_eq!(first.config().default_options.max_count, Some(4));
    }
}
