use js_sys::Promise;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::*;
use crate::compressor::js_error_to_string;

#[wasm_bindgen(inline_js = r#"
function sdk() {
  if (typeof wx === 'undefined' || !wx) {
    throw new Error('WeChat JS-SDK is not loaded');
  }
  return wx;
}

function bridgeError(err, fallback) {
  return new Error((err && err.errMsg) || fallback);
}

export function jsWxAvailable() {
  return typeof wx !== 'undefined'
    && !!wx
    && typeof wx.chooseImage === 'function'
    && typeof wx.getLocalImgData === 'function';
}

export function jsWxChooseImage(request) {
  return new Promise((resolve, reject) => {
    sdk().chooseImage({
      count: request.count,
      sizeType: request.sizeType,
      sourceType: request.sourceType,
      success: (res) => resolve((res.localIds || []).map((id) => String(id))),
      fail: (err) => reject(bridgeError(err, 'chooseImage:fail')),
      cancel: () => reject(new Error('chooseImage:cancel')),
    });
  });
}

export function jsWxGetLocalImgData(localId) {
  return new Promise((resolve, reject) => {
    sdk().getLocalImgData({
      localId,
      success: (res) => resolve(String(res.localData || '')),
      fail: (err) => reject(bridgeError(err, 'getLocalImgData:fail')),
    });
  });
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsWxAvailable)]
    fn js_wx_available() -> bool;
    #[wasm_bindgen(js_name = jsWxChooseImage, catch)]
    fn js_wx_choose_image(request: JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(js_name = jsWxGetLocalImgData, catch)]
    fn js_wx_get_local_img_data(local_id: &str) -> Result<Promise, JsValue>;
}

async fn await_promise(promise: Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(js_error_to_string)
}

pub fn wx_available() -> bool {
    js_wx_available()
}

pub async fn choose_image(request: &ChooseImageRequest) -> Result<Vec<String>, String> {
    let request = to_value(request).map_err(|e| e.to_string())?;
    let promise = js_wx_choose_image(request).map_err(js_error_to_string)?;
    let value = await_promise(promise).await?;
    from_value(value).map_err(|e| e.to_string())
}

pub async fn get_local_img_data(local_id: &str) -> Result<String, String> {
    let promise = js_wx_get_local_img_data(local_id).map_err(js_error_to_string)?;
    await_promise(promise)
        .await?
        .as_string()
        .ok_or_else(|| "getLocalImgData returned non-string data".to_string())
}
