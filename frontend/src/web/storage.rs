//! LocalStorage 封装
//!
//! 只保存方便用户的非敏感信息（上次登录的邮箱），token 不进 LocalStorage。

use gloo_storage::{LocalStorage, Storage};

const STORAGE_EMAIL_KEY: &str = "siteadmin_last_email";

/// 上次成功登录使用的邮箱
pub fn remembered_email() -> Option<String> {
    LocalStorage::get(STORAGE_EMAIL_KEY).ok()
}

pub fn remember_email(email: &str) {
    if let Err(e) = LocalStorage::set(STORAGE_EMAIL_KEY, email) {
        tracing::debug!(error = %e, "could not remember email");
    }
}
