use super::*;

fn unsupported() -> String {
    "WeChat JS-SDK is only available when compiled for wasm32".to_string()
}

pub fn wx_available() -> bool {
    false
}

pub async fn choose_image(_request: &ChooseImageRequest) -> Result<Vec<String>, String> {
    Err(unsupported())
}

pub async fn get_local_img_data(_local_id: &str) -> Result<String, String> {
    Err(unsupported())
}
