//! HTTP 传输层
//!
//! 基于 `gloo-net` 的浏览器 fetch，实现核心库的 [`HttpClient`]。
//! 只负责把请求发出去并取回状态码与响应体，错误语义交给 `ApiClient`。

use gloo_net::http::{Method, RequestBuilder};
use siteadmin::request::{FormValue, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
use siteadmin::{AdminError, AdminResult, HttpClient};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, FormData};

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn js_error(context: &str, e: JsValue) -> AdminError {
    AdminError::network(format!("{}: {:?}", context, e))
}

/// 构造 FormData；Content-Type 与 boundary 由浏览器填写
fn form_data(form: &MultipartForm) -> AdminResult<FormData> {
    let data = FormData::new().map_err(|e| js_error("创建 FormData 失败", e))?;

    for (name, value) in &form.parts {
        match value {
            FormValue::Text(text) => data
                .append_with_str(name, text)
                .map_err(|e| js_error("写入表单字段失败", e))?,
            FormValue::File(upload) => {
                let bytes = js_sys::Uint8Array::from(upload.bytes.as_slice());
                let parts = js_sys::Array::of1(&bytes);
                let opts = BlobPropertyBag::new();
                opts.set_type(&upload.content_type);
                let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &opts)
                    .map_err(|e| js_error("创建 Blob 失败", e))?;
                data.append_with_blob_and_filename(name, &blob, &upload.file_name)
                    .map_err(|e| js_error("写入上传文件失败", e))?;
            }
        }
    }
    Ok(data)
}

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> AdminResult<HttpResponse> {
        let mut builder = RequestBuilder::new(&req.url).method(method(req.method));
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match &req.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(json) => builder.body(json.as_str()),
            RequestBody::Multipart(form) => builder.body(form_data(form)?),
        }
        .map_err(|e| AdminError::network(format!("请求构建失败: {}", e)).in_op("fetch.build"))?;

        let response = request
            .send()
            .await
            .map_err(|e| AdminError::network(format!("网络错误: {}", e)).in_op("fetch.send"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdminError::network(format!("响应读取失败: {}", e)).in_op("fetch.text"))?;

        Ok(HttpResponse { status, body })
    }
}
