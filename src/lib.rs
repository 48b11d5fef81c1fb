//! SiteAdmin 客户端核心
//!
//! 与传输层无关：浏览器前端注入基于 fetch 的 `HttpClient` 与 cookie `TokenStore`，
//! 测试注入 `MockHttpClient` 与 `MemoryTokenStore`。
//!
//! - `session`: 会话存储（唯一的共享可变状态）
//! - `route`: 路由定义与守卫
//! - `client`: 带 Bearer 拦截的 API 客户端
//! - `services`: 各资源的 REST 服务
//! - `crud`: 通用列表 + 弹窗页面控制器

pub mod client;
pub mod config;
pub mod crud;
pub mod error;
pub mod request;
pub mod route;
pub mod services;
pub mod session;
pub mod token;
pub mod watch;

pub use client::ApiClient;
pub use config::AppConfig;
pub use crud::{CrudController, Modal, PageState};
pub use error::{AdminError, AdminErrorStatus, AdminResult};
pub use request::{HttpClient, HttpRequest, HttpResponse};
pub use route::{GuardDecision, NavItem, Route, guard, navigation};
pub use services::{
    BrochureService, CareerService, ClientService, ContactService, DashboardService,
    ProjectService, ResourceCount, ResourceService, TestimonialService, UserService,
};
pub use session::{SessionState, SessionStore};
pub use token::{MemoryTokenStore, TokenPolicy, TokenStore};
pub use watch::Subscription;

pub use siteadmin_shared as shared;
