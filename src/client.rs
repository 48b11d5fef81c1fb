//! API 客户端
//!
//! 所有出站请求都经过 [`ApiClient::execute`]：拼接基础地址、附加 Bearer token、
//! 把非 2xx 响应转换为 [`AdminError`]。不做重试，也不改写错误语义。

use crate::error::{AdminError, AdminResult};
use crate::request::{HttpClient, HttpRequest, RequestBody};
use crate::token::TokenStore;
use siteadmin_shared::HEADER_AUTHORIZATION;
use siteadmin_shared::protocol::ApiRequest;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ApiClient<C, T> {
    base_url: Rc<str>,
    http: C,
    tokens: T,
}

impl<C: HttpClient, T: TokenStore> ApiClient<C, T> {
    pub fn new(base_url: &str, http: C, tokens: T) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            base_url: Rc::from(base_url),
            http,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 请求拦截：存在持久化 token 时附加认证头
    fn intercept(&self, req: HttpRequest) -> HttpRequest {
        let req = match self.tokens.load() {
            Some(token) => req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token)),
            None => req,
        };
        // multipart 的 Content-Type 需要带 boundary，交给传输层
        if matches!(req.body, RequestBody::Json(_)) {
            req.with_header("Content-Type", "application/json")
        } else {
            req
        }
    }

    /// 发送一个 API 请求并解码响应
    pub async fn execute<R: ApiRequest>(&self, request: &R) -> AdminResult<R::Response> {
        let path = request.path();
        let body = request.body()?;
        let req = self.intercept(HttpRequest::new(&self.url(&path), R::METHOD).with_body(body));

        debug!(method = R::METHOD.as_str(), url = %req.url, "api request");

        let resp = self
            .http
            .send(req)
            .await
            .map_err(|e| e.in_op_with("client.execute", path.clone()))?;

        if !resp.ok() {
            warn!(status = resp.status, path = %path, "api request failed");
            return Err(AdminError::from_response(resp.status, &resp.body)
                .in_op_with("client.execute", path));
        }

        // 空响应体按 JSON null 处理
        let text = if resp.body.trim().is_empty() {
            "null"
        } else {
            resp.body.as_str()
        };
        serde_json::from_str(text)
            .map_err(|e| AdminError::from(e).in_op_with("client.decode", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminErrorStatus;
    use crate::request::{HttpMethod, MockHttpClient};
    use crate::token::MemoryTokenStore;
    use serde_json::json;
    use siteadmin_shared::protocol::{
        CreateProject, DeleteProject, ListProjects, LoginRequest,
    };
    use siteadmin_shared::ProjectDraft;

    const BASE: &str = "http://api.test";

    fn client(tokens: MemoryTokenStore) -> (Rc<MockHttpClient>, ApiClient<Rc<MockHttpClient>, MemoryTokenStore>) {
        let http = Rc::new(MockHttpClient::new());
        let api = ApiClient::new("http://api.test/", http.clone(), tokens);
        (http, api)
    }

    #[tokio::test]
    async fn test_attaches_bearer_token_when_persisted() {
        let (http, api) = client(MemoryTokenStore::with_token("tok-1"));
        http.mock_response(HttpMethod::Get, &format!("{BASE}/projects"), 200, json!([]));

        let list = api.execute(&ListProjects).await.unwrap();
        assert!(list.into_vec().is_empty());

        let reqs = http.requests_to(HttpMethod::Get, &format!("{BASE}/projects"));
        assert_eq!(reqs[0].header("authorization"), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_no_auth_header_without_token() {
        let (http, api) = client(MemoryTokenStore::new());
        http.mock_response(
            HttpMethod::Post,
            &format!("{BASE}/auth/login"),
            200,
            json!({ "token": "t", "user": { "id": "1", "email": "a@b.co", "role": "ADMIN" } }),
        );

        let req = LoginRequest {
            email: "a@b.co".into(),
            password: "pw".into(),
        };
        api.execute(&req).await.unwrap();

        let sent = &http.requests.borrow()[0];
        assert_eq!(sent.header("Authorization"), None);
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(sent.json()["email"], json!("a@b.co"));
    }

    #[tokio::test]
    async fn test_multipart_leaves_content_type_to_transport() {
        let (http, api) = client(MemoryTokenStore::with_token("t"));
        http.mock_response(HttpMethod::Post, &format!("{BASE}/projects"), 201, json!({ "id": "p1" }));

        let draft = ProjectDraft {
            title: "A".into(),
            slug: "a".into(),
            description: "d".into(),
            ..Default::default()
        };
        api.execute(&CreateProject { draft: &draft }).await.unwrap();

        let sent = &http.requests.borrow()[0];
        assert_eq!(sent.header("Content-Type"), None);
        assert!(matches!(sent.body, RequestBody::Multipart(_)));
    }

    #[tokio::test]
    async fn test_http_errors_propagate_with_status() {
        let (http, api) = client(MemoryTokenStore::with_token("t"));
        http.mock_response(
            HttpMethod::Delete,
            &format!("{BASE}/projects/9"),
            401,
            json!({ "message": "jwt expired" }),
        );
        http.mock_response(HttpMethod::Get, &format!("{BASE}/projects"), 500, json!({}));

        let err = api.execute(&DeleteProject { id: "9" }).await.unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Unauthorized);
        assert_eq!(err.message(), "jwt expired");

        let err = api.execute(&ListProjects).await.unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Server);
        assert_eq!(err.http_status, Some(500));
        // 不重试
        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn test_network_error_and_empty_ack() {
        let (http, api) = client(MemoryTokenStore::new());
        http.mock_failure(HttpMethod::Get, &format!("{BASE}/projects"), "offline");
        let err = api.execute(&ListProjects).await.unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Network);

        http.requests.borrow_mut().clear();
        let resp_url = format!("{BASE}/projects/1");
        http.mock_response(HttpMethod::Delete, &resp_url, 204, json!(null));
        assert!(api.execute(&DeleteProject { id: "1" }).await.is_ok());
    }

    #[tokio::test]
    async fn test_decode_error_is_serialization() {
        let (http, api) = client(MemoryTokenStore::new());
        http.mock_response(HttpMethod::Get, &format!("{BASE}/projects"), 200, json!({ "nope": 1 }));
        let err = api.execute(&ListProjects).await.unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Serialization);
    }
}
