//! 浏览器环境下的客户端装配

use crate::web::{CookieTokenStore, FetchClient};
use siteadmin::{ApiClient, AppConfig, SessionStore};

pub type BrowserApi = ApiClient<FetchClient, CookieTokenStore>;
pub type BrowserSession = SessionStore<FetchClient, CookieTokenStore>;

/// 编译期注入的后端地址：`API_BASE_URL=https://... trunk build`
const API_BASE_URL: Option<&str> = option_env!("API_BASE_URL");

fn hostname() -> String {
    web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}

pub fn load_config() -> AppConfig {
    AppConfig::new(API_BASE_URL, &hostname())
}

pub fn build_session(config: &AppConfig) -> BrowserSession {
    tracing::info!(api = %config.api_base_url, secure_cookie = config.token_policy.secure, "api configured");
    let tokens = CookieTokenStore::new(config.token_policy.clone());
    SessionStore::new(ApiClient::new(&config.api_base_url, FetchClient, tokens))
}
