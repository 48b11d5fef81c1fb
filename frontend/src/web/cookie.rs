//! Cookie 中的 token
//!
//! 通过 `document.cookie` 读写，写入策略（名称、过期时间、Secure）来自 [`TokenPolicy`]。

use siteadmin::{TokenPolicy, TokenStore};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

fn html_document() -> Option<HtmlDocument> {
    web_sys::window()?.document()?.dyn_into::<HtmlDocument>().ok()
}

#[derive(Debug, Clone)]
pub struct CookieTokenStore {
    policy: TokenPolicy,
}

impl CookieTokenStore {
    pub fn new(policy: TokenPolicy) -> Self {
        Self { policy }
    }

    fn write(&self, cookie: &str) {
        let Some(doc) = html_document() else {
            tracing::warn!("document unavailable, token cookie not written");
            return;
        };
        if let Err(e) = doc.set_cookie(cookie) {
            tracing::warn!(error = ?e, "failed to write token cookie");
        }
    }
}

impl TokenStore for CookieTokenStore {
    fn load(&self) -> Option<String> {
        let cookies = html_document()?.cookie().ok()?;
        self.policy.read_cookie(&cookies)
    }

    fn save(&self, token: &str) {
        self.write(&self.policy.set_cookie(token));
    }

    fn clear(&self) {
        self.write(&self.policy.clear_cookie());
    }
}
