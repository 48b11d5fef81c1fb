use crate::token::TokenPolicy;

// =========================================================
// 运行时配置 (Runtime Configuration)
// =========================================================

/// 未提供 API_BASE_URL 时使用的默认后端地址
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// 视为本地开发环境的主机名
const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "[::1]", "::1"];

/// 应用配置
///
/// 后端地址在启动时固定；cookie 的 Secure 标记由当前页面的主机名决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub token_policy: TokenPolicy,
}

impl AppConfig {
    /// # Arguments
    /// * `api_base_url` - 外部提供的后端地址，None 或空串时使用默认值
    /// * `hostname` - 当前页面主机名，用于判断是否本地开发
    pub fn new(api_base_url: Option<&str>, hostname: &str) -> Self {
        let api_base_url = api_base_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            api_base_url,
            token_policy: TokenPolicy {
                secure: !is_local_development(hostname),
                ..TokenPolicy::default()
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(None, "localhost")
    }
}

pub fn is_local_development(hostname: &str) -> bool {
    let host = hostname.trim().to_ascii_lowercase();
    LOCAL_HOSTS.contains(&host.as_str()) || host.ends_with(".localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_defaults_and_trimming() {
        let cfg = AppConfig::new(None, "localhost");
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!cfg.token_policy.secure);

        let cfg = AppConfig::new(Some(" https://api.example.com/v1/ "), "admin.example.com");
        assert_eq!(cfg.api_base_url, "https://api.example.com/v1");
        assert!(cfg.token_policy.secure);

        let cfg = AppConfig::new(Some(""), "127.0.0.1");
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_local_development_hosts() {
        assert!(is_local_development("LOCALHOST"));
        assert!(is_local_development("app.localhost"));
        assert!(!is_local_development("localhost.example.com"));
    }
}
