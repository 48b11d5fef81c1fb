use std::fmt;

use siteadmin_shared::ValidationErrors;

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误状态枚举
/// 对应前端可区分的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminErrorStatus {
    /// 网络不可达 / 请求未能发出
    Network,
    /// 401: 凭据无效或 token 过期
    Unauthorized,
    /// 403: 角色权限不足（本地能力检查或后端拒绝）
    Forbidden,
    /// 400 / 422: 客户端或服务端校验失败
    Validation,
    /// 404: 资源未找到
    NotFound,
    /// 409: 资源冲突
    Conflict,
    /// 后端没有对应接口，请求不会发出
    Unsupported,
    /// 5xx 及其他未分类的 HTTP 错误
    Server,
    /// 响应体无法解析或请求体无法序列化
    Serialization,
}

impl AdminErrorStatus {
    /// 由 HTTP 状态码映射
    pub fn from_http(status: u16) -> Self {
        match status {
            400 | 422 => AdminErrorStatus::Validation,
            401 => AdminErrorStatus::Unauthorized,
            403 => AdminErrorStatus::Forbidden,
            404 => AdminErrorStatus::NotFound,
            409 => AdminErrorStatus::Conflict,
            _ => AdminErrorStatus::Server,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AdminErrorStatus::Network => "NETWORK_ERROR",
            AdminErrorStatus::Unauthorized => "UNAUTHORIZED",
            AdminErrorStatus::Forbidden => "FORBIDDEN",
            AdminErrorStatus::Validation => "VALIDATION_ERROR",
            AdminErrorStatus::NotFound => "RESOURCE_NOT_FOUND",
            AdminErrorStatus::Conflict => "RESOURCE_CONFLICT",
            AdminErrorStatus::Unsupported => "UNSUPPORTED_OPERATION",
            AdminErrorStatus::Server => "SERVER_ERROR",
            AdminErrorStatus::Serialization => "JSON_PARSE_ERROR",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 操作名称，如 "session.login", "projects.delete"
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// - status: 错误类别
/// - http_status: 原始 HTTP 状态码（网络错误时为 None）
/// - message: 面向用户的消息，服务端返回的 message 原样保留
/// - source: 原始错误（可选，用于错误链）
/// - spans: 结构化的调用追踪栈
#[derive(Debug)]
pub struct AdminError {
    pub status: AdminErrorStatus,
    pub http_status: Option<u16>,
    pub message: String,
    /// message 是否来自服务端响应体
    from_server: bool,
    source: Option<Box<dyn std::error::Error + 'static>>,
    spans: Vec<ErrorSpan>,
}

impl AdminError {
    pub fn new(status: AdminErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            http_status: None,
            message: message.into(),
            from_server: false,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AdminErrorStatus::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AdminErrorStatus::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(AdminErrorStatus::Forbidden, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AdminErrorStatus::Validation, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(AdminErrorStatus::Serialization, message)
    }

    /// 由非 2xx 响应构造
    ///
    /// 优先使用响应体中的 `message` / `error` 字段，否则退回状态码描述。
    pub fn from_response(status: u16, body: &str) -> Self {
        let server = server_message(body);
        let from_server = server.is_some();
        let message =
            server.unwrap_or_else(|| format!("Request failed with status {}", status));
        Self {
            http_status: Some(status),
            from_server,
            ..Self::new(AdminErrorStatus::from_http(status), message)
        }
    }

    // --- Context builders (Builder Pattern) ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    /// 设置原始错误源
    pub fn with_source<E: std::error::Error + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 服务端在响应体中给出的消息
    pub fn server_message(&self) -> Option<&str> {
        self.from_server.then_some(self.message.as_str())
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == AdminErrorStatus::Unauthorized
    }
}

/// 提取服务端错误消息
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for AdminError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref()
    }
}

pub type AdminResult<T> = std::result::Result<T, AdminError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for AdminError {
    fn from(e: serde_json::Error) -> Self {
        AdminError::serialization(e.to_string()).with_source(e)
    }
}

impl From<ValidationErrors> for AdminError {
    fn from(e: ValidationErrors) -> Self {
        AdminError::validation(e.to_string()).with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_keeps_server_message() {
        let err = AdminError::from_response(422, r#"{"message":"Slug already taken"}"#);
        assert_eq!(err.status, AdminErrorStatus::Validation);
        assert_eq!(err.http_status, Some(422));
        assert_eq!(err.message(), "Slug already taken");
        assert_eq!(err.server_message(), Some("Slug already taken"));

        let err = AdminError::from_response(403, r#"{"error":"Admins only"}"#);
        assert_eq!(err.status, AdminErrorStatus::Forbidden);
        assert_eq!(err.message(), "Admins only");
    }

    #[test]
    fn test_from_response_without_json_body() {
        let err = AdminError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.status, AdminErrorStatus::Server);
        assert_eq!(err.message(), "Request failed with status 502");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_display_with_spans() {
        let err = AdminError::unauthorized("Token expired")
            .in_op("client.execute")
            .in_op_with("session.initialize", "/auth/me");
        assert_eq!(
            err.to_string(),
            "[UNAUTHORIZED] Token expired | trace: client.execute -> session.initialize(/auth/me)"
        );
        assert!(err.is_auth_failure());
    }
}
