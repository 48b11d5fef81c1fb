//! Token 持久化
//!
//! 浏览器中 token 写入带过期时间的 cookie；测试和非浏览器环境使用内存实现。

use siteadmin_shared::{TOKEN_COOKIE_NAME, TOKEN_TTL_DAYS};
use std::cell::RefCell;
use std::rc::Rc;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// 持久化 token 的写入策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    pub cookie_name: String,
    pub ttl_days: u32,
    /// 本地开发（http://localhost）之外一律加 Secure
    pub secure: bool,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            cookie_name: TOKEN_COOKIE_NAME.to_string(),
            ttl_days: TOKEN_TTL_DAYS,
            secure: true,
        }
    }
}

impl TokenPolicy {
    pub fn max_age_secs(&self) -> u64 {
        u64::from(self.ttl_days) * SECONDS_PER_DAY
    }

    /// 生成写入 `document.cookie` 的字符串
    pub fn set_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path=/; SameSite=Strict",
            self.cookie_name,
            encode_cookie_value(token),
            self.max_age_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// 生成删除 cookie 的字符串
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Max-Age=0; Path=/; SameSite=Strict",
            self.cookie_name
        )
    }

    /// 从 `document.cookie`（`a=1; b=2`）中读取 token
    pub fn read_cookie(&self, cookie_header: &str) -> Option<String> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| decode_cookie_value(value))
            .filter(|value| !value.is_empty())
    }
}

// cookie 值里不能出现 `;` `,` 空白等字符；JWT 本身只含 URL 安全字符，这里只转义少数保留字符
fn encode_cookie_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ';' | ',' | ' ' | '"' | '\\' | '%' => out.push_str(&format!("%{:02X}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

fn decode_cookie_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Token 存储
///
/// 同步接口：cookie 与内存的读写都不需要等待。
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

impl<T: TokenStore + ?Sized> TokenStore for Rc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }
    fn save(&self, token: &str) {
        (**self).save(token)
    }
    fn clear(&self) {
        (**self).clear()
    }
}

/// 内存实现，clone 后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Rc<RefCell<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.save(token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn save(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.borrow_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_policy_production() {
        let policy = TokenPolicy::default();
        assert_eq!(
            policy.set_cookie("abc.def"),
            "token=abc.def; Max-Age=604800; Path=/; SameSite=Strict; Secure"
        );
        assert_eq!(policy.clear_cookie(), "token=; Max-Age=0; Path=/; SameSite=Strict");
    }

    #[test]
    fn test_cookie_policy_local_development() {
        let policy = TokenPolicy {
            secure: false,
            ..Default::default()
        };
        assert!(!policy.set_cookie("t").contains("Secure"));
    }

    #[test]
    fn test_read_cookie() {
        let policy = TokenPolicy::default();
        assert_eq!(
            policy.read_cookie("theme=dark; token=eyJ.x.y; other=1"),
            Some("eyJ.x.y".to_string())
        );
        assert_eq!(policy.read_cookie("tokenx=1; theme=dark"), None);
        assert_eq!(policy.read_cookie("token="), None);
        assert_eq!(policy.read_cookie(""), None);
    }

    #[test]
    fn test_cookie_value_escaping() {
        let policy = TokenPolicy::default();
        let cookie = policy.set_cookie("a;b c%");
        assert!(cookie.starts_with("token=a%3Bb%20c%25;"));
        let header = cookie.split(';').next().unwrap();
        assert_eq!(policy.read_cookie(header), Some("a;b c%".to_string()));
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryTokenStore::new();
        let other = store.clone();
        store.save("t1");
        assert_eq!(other.load(), Some("t1".to_string()));
        other.clear();
        assert_eq!(store.load(), None);
    }
}
