//! WeChat JS-SDK image bridge.
//!
//! Calls go through `interop`, which binds `wx.chooseImage`/`wx.getLocalImgData` on `wasm32`
//! and reports the bridge as unavailable elsewhere.

mod interop;

use file_chooser_host::{BridgeFuture, ChooseImageRequest, NativeImageBridge};

#[derive(Debug, Clone, Copy, Default)]
/// [`NativeImageBridge`] over the WeChat JS-SDK.
pub struct WechatImageBridge;

impl WechatImageBridge {
    /// Returns the bridge when the JS-SDK is loaded in this page.
    pub fn detect() -> Option<Self> {
        interop::wx_available().then_some(Self)
    }
}

impl NativeImageBridge for WechatImageBridge {
    fn choose_images<'a>(
        &'a self,
        request: &'a ChooseImageRequest,
    ) -> BridgeFuture<'a, Result<Vec<String>, String>> {
        Box::pin(interop::choose_image(request))
    }

    fn local_image_data<'a>(
        &'a self,
        local_id: &'a str,
    ) -> BridgeFuture<'a, Result<String, String>> {
        Box::pin(interop::get_local_img_data(local_id))
    }
}
