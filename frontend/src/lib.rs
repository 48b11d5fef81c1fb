//! 站点后台前端应用
//!
//! 采用 Context-Driven 的架构：
//! - `auth`: 会话状态镜像（核心库 `SessionStore` 为唯一数据源）
//! - `web::router`: 路由服务，守卫规则来自核心库
//! - `components`: UI 组件层，资源页共用一个通用 CRUD 组件

mod api;
mod auth;
mod components {
    pub mod crud;
    pub mod dashboard;
    mod icons;
    pub mod layout;
    pub mod login;
    pub mod resources;
    pub mod toast;
}

use crate::auth::{AuthContext, init_auth};
use crate::components::crud::ResourcePage;
use crate::components::dashboard::DashboardPage;
use crate::components::layout::Layout;
use crate::components::login::LoginPage;
use crate::components::resources::{
    BrochuresView, CareersView, ClientsView, ContactsView, ProjectsView, TestimonialsView,
    UsersView,
};
use crate::components::toast::provide_toasts;

use leptos::prelude::*;
use siteadmin::Route;

// 浏览器 API 的适配层：网络、cookie、本地存储、文件读取与 History 路由
pub(crate) mod web {
    mod cookie;
    mod http;
    pub mod router;
    pub mod storage;
    pub mod upload;

    pub use cookie::CookieTokenStore;
    pub use http::FetchClient;
}

use web::router::{Link, Router, RouterOutlet};

/// 路由匹配函数
///
/// 只会收到守卫放行的路由。
fn route_matcher(route: Route) -> AnyView {
    match route {
        Route::Login => view! { <LoginPage /> }.into_any(),
        Route::Dashboard => view! { <Layout><DashboardPage /></Layout> }.into_any(),
        Route::Projects => view! { <Layout><ResourcePage entity=ProjectsView /></Layout> }.into_any(),
        Route::Clients => view! { <Layout><ResourcePage entity=ClientsView /></Layout> }.into_any(),
        Route::Testimonials => {
            view! { <Layout><ResourcePage entity=TestimonialsView /></Layout> }.into_any()
        }
        Route::Contacts => view! { <Layout><ResourcePage entity=ContactsView /></Layout> }.into_any(),
        Route::Careers => view! { <Layout><ResourcePage entity=CareersView /></Layout> }.into_any(),
        Route::Brochures => {
            view! { <Layout><ResourcePage entity=BrochuresView /></Layout> }.into_any()
        }
        Route::Users => view! { <Layout><ResourcePage entity=UsersView /></Layout> }.into_any(),
        Route::NotFound => view! {
            <Layout>
                <div class="text-center py-16">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to=Route::Dashboard class="btn btn-primary mt-6">
                        "Back to dashboard"
                    </Link>
                </div>
            </Layout>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建认证上下文
    let auth = AuthContext::new();
    provide_context(auth);
    provide_toasts();

    // 2. 用 cookie 中的 token 恢复会话
    init_auth(&auth);

    view! {
        // 3. 路由器只依赖会话状态信号
        <Router session=auth.state>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
