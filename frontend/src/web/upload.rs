//! 文件选择框 -> [`Upload`]

use siteadmin_shared::Upload;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, File, HtmlInputElement};

/// 取出 `<input type="file">` 中选中的第一个文件
pub fn selected_file(ev: &Event) -> Option<File> {
    let input = ev.target()?.dyn_into::<HtmlInputElement>().ok()?;
    input.files()?.get(0)
}

/// 读取文件内容
pub async fn read_upload(file: File) -> Option<Upload> {
    let buffer = match JsFuture::from(file.array_buffer()).await {
        Ok(buffer) => buffer,
        Err(e) => {
            tracing::warn!(error = ?e, file = %file.name(), "failed to read file");
            return None;
        }
    };
    Some(Upload {
        file_name: file.name(),
        content_type: file.type_(),
        bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
    })
}
