//! 会话存储
//!
//! 管理"当前登录的是谁"以及 Bearer token，是整个应用唯一的共享可变状态。
//! 页面只读取状态；修改只能通过 `initialize` / `login` / `logout`。
//!
//! 每个操作开始时领取一个 epoch。异步操作完成时如果 epoch 已被更新的操作取代，
//! 其结果直接丢弃：慢速的 token 校验不会在登出后把用户"复活"。

use crate::client::ApiClient;
use crate::error::{AdminError, AdminResult};
use crate::request::HttpClient;
use crate::token::TokenStore;
use crate::watch::{StateCell, Subscription};
use siteadmin_shared::protocol::{CurrentUserRequest, LoginRequest};
use siteadmin_shared::{DraftMode, Permissions, User, Validate};
use std::cell::Cell;
use tracing::{debug, info, warn};

/// 登录失败且服务端没有给出消息时的提示
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// 会话状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// 有会话操作正在进行
    pub loading: bool,
    /// 启动时的 token 校验已经结束
    pub initialized: bool,
    /// 最近一次登录失败的消息
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
            initialized: false,
            error: None,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// 由角色推导出的能力集合；未登录时全部为 false
    pub fn permissions(&self) -> Permissions {
        self.user
            .as_ref()
            .map(|u| Permissions::for_role(u.role))
            .unwrap_or_else(Permissions::none)
    }
}

/// 进行中的操作计数，drop 时归还
///
/// 即使 future 在中途被丢弃，loading 也会被正确恢复。
struct LoadingGuard<'a> {
    state: &'a StateCell<SessionState>,
    in_flight: &'a Cell<u32>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a StateCell<SessionState>, in_flight: &'a Cell<u32>) -> Self {
        in_flight.set(in_flight.get() + 1);
        state.update(|s| s.loading = true);
        Self { state, in_flight }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let remaining = self.in_flight.get().saturating_sub(1);
        self.in_flight.set(remaining);
        self.state.update(|s| s.loading = remaining > 0);
    }
}

pub struct SessionStore<C, T> {
    api: ApiClient<C, T>,
    state: StateCell<SessionState>,
    epoch: Cell<u64>,
    in_flight: Cell<u32>,
    init_started: Cell<bool>,
}

impl<C: HttpClient, T: TokenStore> SessionStore<C, T> {
    pub fn new(api: ApiClient<C, T>) -> Self {
        Self {
            api,
            state: StateCell::new(SessionState::default()),
            epoch: Cell::new(0),
            in_flight: Cell::new(0),
            init_started: Cell::new(false),
        }
    }

    pub fn api(&self) -> &ApiClient<C, T> {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn permissions(&self) -> Permissions {
        self.state.with(SessionState::permissions)
    }

    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) -> Subscription {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.state.unsubscribe(subscription);
    }

    fn next_epoch(&self) -> u64 {
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    /// 启动时恢复会话
    ///
    /// 读取持久化 token 并向后端确认身份；任何失败（过期、无效、网络错误）都清空会话。
    /// 只执行一次，重复调用直接返回。
    pub async fn initialize(&self) {
        if self.init_started.replace(true) {
            return;
        }

        let ticket = self.next_epoch();
        let loading = LoadingGuard::enter(&self.state, &self.in_flight);

        let Some(token) = self.api.tokens().load() else {
            debug!("no persisted token, starting logged out");
            self.state.update(|s| s.initialized = true);
            drop(loading);
            return;
        };

        let verified = self.api.execute(&CurrentUserRequest).await;

        if !self.is_current(ticket) {
            debug!("session verification superseded, result discarded");
        } else {
            match verified {
                Ok(resp) => {
                    let user = resp.into_user();
                    info!(email = %user.email, role = %user.role, "session restored");
                    self.state.update(|s| {
                        s.user = Some(user);
                        s.token = Some(token);
                    });
                }
                Err(e) => {
                    warn!(error = %e.in_op("session.initialize"), "session verification failed");
                    self.api.tokens().clear();
                    self.state.update(|s| {
                        s.user = None;
                        s.token = None;
                    });
                }
            }
        }

        self.state.update(|s| s.initialized = true);
        drop(loading);
    }

    /// 登录
    ///
    /// 成功时持久化 token 并写入用户；失败时记录错误消息并把错误返回给调用方。
    pub async fn login(&self, email: &str, password: &str) -> AdminResult<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        if let Err(errors) = request.validate(DraftMode::Create) {
            let err = AdminError::from(errors).in_op("session.login");
            self.state.update(|s| s.error = Some(err.message.clone()));
            return Err(err);
        }

        let ticket = self.next_epoch();
        let _loading = LoadingGuard::enter(&self.state, &self.in_flight);
        self.state.update(|s| s.error = None);

        let result = self.api.execute(&request).await;

        if !self.is_current(ticket) {
            debug!("login superseded, result discarded");
            return Err(AdminError::unauthorized("Login was superseded").in_op("session.login"));
        }

        match result {
            Ok(resp) => {
                self.api.tokens().save(&resp.token);
                info!(email = %resp.user.email, role = %resp.user.role, "logged in");
                let user = resp.user;
                let session_user = user.clone();
                self.state.update(move |s| {
                    s.user = Some(session_user);
                    s.token = Some(resp.token);
                    s.error = None;
                });
                Ok(user)
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .unwrap_or(LOGIN_FAILED_MESSAGE)
                    .to_string();
                warn!(error = %e, "login failed");
                self.state.update(|s| {
                    s.user = None;
                    s.token = None;
                    s.error = Some(message);
                });
                Err(e.in_op("session.login"))
            }
        }
    }

    /// 注销：无条件清除持久化 token 与内存会话，不会失败
    ///
    /// 导航由路由守卫监听会话变化后自动完成。
    pub fn logout(&self) {
        self.next_epoch();
        self.api.tokens().clear();
        self.state.update(|s| {
            s.user = None;
            s.token = None;
            s.error = None;
        });
        info!("logged out");
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }
}

#[cfg(test)]
mod tests;
