//! Target-split transport for the WeChat JS-SDK calls.

use file_chooser_host::ChooseImageRequest;

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub fn wx_available() -> bool {
    imp::wx_available()
}

pub async fn choose_image(request: &ChooseImageRequest) -> Result<Vec<String>, String> {
    imp::choose_image(request).await
}

pub async fn get_local_img_data(local_id: &str) -> Result<String, String> {
    imp::get_local_img_data(local_id).await
}
