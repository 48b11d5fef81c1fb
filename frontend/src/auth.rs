//! 认证模块
//!
//! 核心库的 `SessionStore` 是唯一的会话数据源；这里把它的状态镜像到 Leptos signal，
//! 供路由守卫和各页面响应式读取。修改只能经由 `login` / `logout`。

use crate::api::{BrowserApi, BrowserSession, build_session, load_config};
use crate::web::storage;
use leptos::prelude::*;
use leptos::task::spawn_local;
use siteadmin::{AdminResult, SessionState};
use siteadmin_shared::{Permissions, User};
use std::rc::Rc;

/// 认证上下文
///
/// 通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    /// 会话状态（只读）
    pub state: ReadSignal<SessionState>,
    store: StoredValue<Rc<BrowserSession>, LocalStorage>,
}

impl AuthContext {
    /// 创建会话存储并把状态接到 signal 上
    pub fn new() -> Self {
        let store = Rc::new(build_session(&load_config()));
        let (state, set_state) = signal(store.state());

        store.subscribe(move |s| {
            // 根组件卸载后 signal 已被释放，忽略即可
            let _ = set_state.try_set(s.clone());
        });

        Self {
            state,
            store: StoredValue::new_local(store),
        }
    }

    pub fn permissions(&self) -> Permissions {
        self.state.with_untracked(SessionState::permissions)
    }

    /// 携带当前 token 的 API 客户端
    pub fn api(&self) -> BrowserApi {
        self.store.with_value(|s| s.api().clone())
    }

    pub fn clear_error(&self) {
        self.store.with_value(|s| s.clear_error());
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 启动时恢复会话（cookie 中的 token 交给后端确认）
pub fn init_auth(ctx: &AuthContext) {
    let store = ctx.store.get_value();
    spawn_local(async move {
        store.initialize().await;
    });
}

/// 登录；成功后记住邮箱方便下次填写
///
/// 导航由路由守卫监听会话变化后自动完成。
pub async fn login(ctx: AuthContext, email: String, password: String) -> AdminResult<User> {
    let store = ctx.store.get_value();
    let user = store.login(&email, &password).await?;
    storage::remember_email(&user.email);
    Ok(user)
}

/// 注销并清除状态
pub fn logout(ctx: &AuthContext) {
    ctx.store.with_value(|s| s.logout());
}
