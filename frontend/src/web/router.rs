//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API：所有对 window.history 的操作都集中在此模块。
//! 守卫规则本身在核心库的 `route::guard` 中，这里只负责在会话或地址变化时重新求值，
//! 并把重定向落到 `replaceState` 上。

use leptos::prelude::*;
use siteadmin::{GuardDecision, Route, SessionState, guard};
use wasm_bindgen::prelude::*;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

/// 路由器服务
///
/// 通过注入的会话信号实现与认证系统的解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<Route>,
    set_route: WriteSignal<Route>,
    decision: Memo<GuardDecision>,
}

impl RouterService {
    fn new(session: ReadSignal<SessionState>) -> Self {
        let (current_route, set_route) = signal(Route::from_path(&current_path()));
        let decision = Memo::new(move |_| session.with(|s| guard(current_route.get(), s)));

        Self {
            current_route,
            set_route,
            decision,
        }
    }

    pub fn current_route(&self) -> ReadSignal<Route> {
        self.current_route
    }

    pub fn decision(&self) -> Memo<GuardDecision> {
        self.decision
    }

    /// 导航：推入 History，守卫随后在 Effect 中求值
    pub fn navigate(&self, route: Route) {
        if self.current_route.get_untracked() == route {
            return;
        }
        push_history_state(route.to_path());
        self.set_route.set(route);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;

        let closure = Closure::<dyn Fn()>::new(move || {
            set_route.set(Route::from_path(&current_path()));
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 会话或地址变化时执行守卫重定向
    ///
    /// 任何地方的登出都会因此回到登录页。
    fn setup_guard_redirect(&self) {
        let decision = self.decision;
        let set_route = self.set_route;

        Effect::new(move |_| {
            if let GuardDecision::Redirect(target) = decision.get() {
                tracing::debug!(to = %target, "guard redirect");
                replace_history_state(target.to_path());
                set_route.set(target);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(session: ReadSignal<SessionState>) -> RouterService {
    let router = RouterService::new(session);

    router.init_popstate_listener();
    router.setup_guard_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    /// 会话状态信号
    session: ReadSignal<SessionState>,
    children: Children,
) -> impl IntoView {
    provide_router(session);

    children()
}

/// 路由出口组件
///
/// 会话未确定或即将重定向时显示加载中，受保护内容不会提前渲染。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收通过守卫的路由，返回对应视图
    matcher: fn(Route) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || match router.decision().get() {
        GuardDecision::Render(route) => matcher(route),
        GuardDecision::Pending | GuardDecision::Redirect(_) => view! {
            <div class="flex items-center justify-center min-h-screen">
                <span class="loading loading-spinner loading-lg text-primary"></span>
            </div>
        }
        .into_any(),
    }
}

/// 站内链接：拦截点击，走 History 导航
#[component]
pub fn Link(
    to: Route,
    #[prop(into, optional)] class: Signal<String>,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(to);
    };

    view! {
        <a href=to.to_path() class=move || class.get() on:click=on_click>
            {children()}
        </a>
    }
}
