use crate::error::AdminResult;
use std::collections::HashMap;
use std::rc::Rc;

pub use siteadmin_shared::protocol::{FormValue, HttpMethod, MultipartForm, RequestBody};

#[cfg(test)]
use std::cell::RefCell;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 客户端特性 (Trait)
///
/// 浏览器环境下 fetch 的 Future 不是 Send 的，因此使用 `?Send`。
/// 传输层只负责把请求发出去：非 2xx 状态也按 Ok 返回，由上层解释。
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> AdminResult<HttpResponse>;
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient + ?Sized> HttpClient for Rc<C> {
    async fn send(&self, req: HttpRequest) -> AdminResult<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
pub enum MockReply {
    Status(u16, String),
    /// 模拟网络层失败
    Fail(String),
    /// 由测试手动放行的响应，用于构造请求交错
    Deferred(futures::channel::oneshot::Receiver<(u16, String)>),
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

#[cfg(test)]
impl RecordedRequest {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        match &self.body {
            RequestBody::Json(s) => serde_json::from_str(s).unwrap(),
            _ => serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MockHttpClient {
    // (Method, URL) -> 依次返回的响应，最后一个会一直保留
    responses: RefCell<HashMap<(HttpMethod, String), std::collections::VecDeque<MockReply>>>,
    // 最后一个响应已被返回过的接口；再次 mock 时替换掉它
    served: RefCell<std::collections::HashSet<(HttpMethod, String)>>,
    // 记录发出的请求
    pub requests: RefCell<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, url: &str, reply: MockReply) {
        let key = (method, url.to_string());
        let mut responses = self.responses.borrow_mut();
        let queue = responses.entry(key.clone()).or_default();
        if self.served.borrow_mut().remove(&key) {
            queue.clear();
        }
        queue.push_back(reply);
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.push(method, url, MockReply::Status(status, body.to_string()));
    }

    pub fn mock_failure(&self, method: HttpMethod, url: &str, message: &str) {
        self.push(method, url, MockReply::Fail(message.to_string()));
    }

    pub fn mock_deferred(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> futures::channel::oneshot::Sender<(u16, String)> {
        let (tx, rx) = futures::channel::oneshot::channel();
        self.push(method, url, MockReply::Deferred(rx));
        tx
    }

    pub fn requests_to(&self, method: HttpMethod, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn next_reply(&self, method: HttpMethod, url: &str) -> Option<MockReply> {
        let key = (method, url.to_string());
        let mut responses = self.responses.borrow_mut();
        let queue = responses.get_mut(&key)?;
        if queue.len() > 1 {
            return queue.pop_front();
        }
        let reply = match queue.front()? {
            MockReply::Status(status, body) => MockReply::Status(*status, body.clone()),
            MockReply::Fail(msg) => MockReply::Fail(msg.clone()),
            MockReply::Deferred(_) => return queue.pop_front(),
        };
        self.served.borrow_mut().insert(key);
        Some(reply)
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> AdminResult<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            method: req.method,
            url: req.url.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        // 借用在 await 之前释放
        let reply = self.next_reply(req.method, &req.url);
        match reply {
            Some(MockReply::Status(status, body)) => Ok(HttpResponse { status, body }),
            Some(MockReply::Fail(msg)) => Err(crate::error::AdminError::network(msg)),
            Some(MockReply::Deferred(rx)) => match rx.await {
                Ok((status, body)) => Ok(HttpResponse { status, body }),
                Err(_) => Err(crate::error::AdminError::network("request dropped")),
            },
            None => Ok(HttpResponse {
                status: 404,
                body: r#"{"message":"Not Found"}"#.to_string(),
            }),
        }
    }
}
