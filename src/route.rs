//! 路由定义与守卫 - 领域模型
//!
//! 纯业务逻辑，不依赖 DOM。前端路由服务只负责把这里的决策落到 History API 上。

use crate::session::SessionState;
use siteadmin_shared::{Action, Permissions, ResourceKind};
use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    Login,
    #[default]
    Dashboard,
    Projects,
    Clients,
    Testimonials,
    Contacts,
    Careers,
    Brochures,
    Users,
    NotFound,
}

impl Route {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match path {
            "/login" => Self::Login,
            "/" | "/dashboard" => Self::Dashboard,
            "/projects" => Self::Projects,
            "/clients" => Self::Clients,
            "/testimonials" => Self::Testimonials,
            "/contacts" => Self::Contacts,
            "/careers" => Self::Careers,
            "/brochures" => Self::Brochures,
            "/users" => Self::Users,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::Projects => "/projects",
            Self::Clients => "/clients",
            Self::Testimonials => "/testimonials",
            Self::Contacts => "/contacts",
            Self::Careers => "/careers",
            Self::Brochures => "/brochures",
            Self::Users => "/users",
            Self::NotFound => "/404",
        }
    }

    /// 除登录页外全部需要认证
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }

    /// 页面展示的资源
    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            Self::Projects => Some(ResourceKind::Projects),
            Self::Clients => Some(ResourceKind::Clients),
            Self::Testimonials => Some(ResourceKind::Testimonials),
            Self::Contacts => Some(ResourceKind::Contacts),
            Self::Careers => Some(ResourceKind::Careers),
            Self::Brochures => Some(ResourceKind::Brochures),
            Self::Users => Some(ResourceKind::Users),
            Self::Login | Self::Dashboard | Self::NotFound => None,
        }
    }

    pub fn for_resource(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Projects => Self::Projects,
            ResourceKind::Clients => Self::Clients,
            ResourceKind::Testimonials => Self::Testimonials,
            ResourceKind::Contacts => Self::Contacts,
            ResourceKind::Careers => Self::Careers,
            ResourceKind::Brochures => Self::Brochures,
            ResourceKind::Users => Self::Users,
        }
    }

    /// 当前权限能否进入该页面
    pub fn is_allowed(&self, permissions: &Permissions) -> bool {
        self.resource()
            .is_none_or(|kind| permissions.allows(kind, Action::View))
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =========================================================
// 守卫
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// 会话尚未确定，显示加载中
    Pending,
    /// 用 replaceState 跳转到目标路由
    Redirect(Route),
    Render(Route),
}

/// **核心守卫逻辑**
///
/// 每次会话或地址变化时重新求值。
pub fn guard(route: Route, session: &SessionState) -> GuardDecision {
    if !session.initialized || (session.loading && route.requires_auth()) {
        return GuardDecision::Pending;
    }

    match (&session.user, route) {
        (None, Route::Login) => GuardDecision::Render(Route::Login),
        (None, _) => GuardDecision::Redirect(Route::Login),
        (Some(_), Route::Login) => GuardDecision::Redirect(Route::Dashboard),
        (Some(_), route) if !route.is_allowed(&session.permissions()) => {
            GuardDecision::Redirect(Route::Dashboard)
        }
        (Some(_), route) => GuardDecision::Render(route),
    }
}

// =========================================================
// 导航菜单
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
}

/// 按能力过滤后的侧边栏菜单
pub fn navigation(permissions: &Permissions) -> Vec<NavItem> {
    std::iter::once(NavItem {
        route: Route::Dashboard,
        label: "Dashboard",
    })
    .chain(
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| permissions.allows(*kind, Action::View))
            .map(|kind| NavItem {
                route: Route::for_resource(kind),
                label: kind.title(),
            }),
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteadmin_shared::{Role, User};

    fn session(role: Option<Role>) -> SessionState {
        SessionState {
            user: role.map(|role| User {
                id: "u1".into(),
                email: "u@example.com".into(),
                name: None,
                role,
                created_at: None,
            }),
            token: role.map(|_| "t".into()),
            loading: false,
            initialized: true,
            error: None,
        }
    }

    #[test]
    fn test_path_round_trip() {
        assert_eq!(Route::from_path("/"), Route::Dashboard);
        assert_eq!(Route::from_path("/dashboard"), Route::Dashboard);
        assert_eq!(Route::from_path("/projects/"), Route::Projects);
        assert_eq!(Route::from_path("/contacts?page=2"), Route::Contacts);
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
        assert_eq!(Route::from_path(Route::Users.to_path()), Route::Users);
        assert_eq!(Route::Login.to_string(), "/login");
    }

    #[test]
    fn test_pending_until_initialized() {
        let state = SessionState::default();
        assert_eq!(guard(Route::Login, &state), GuardDecision::Pending);
        assert_eq!(guard(Route::Projects, &state), GuardDecision::Pending);

        // 登录提交期间登录页仍然可见
        let state = SessionState {
            loading: true,
            ..session(None)
        };
        assert_eq!(guard(Route::Login, &state), GuardDecision::Render(Route::Login));
        assert_eq!(guard(Route::Dashboard, &state), GuardDecision::Pending);
    }

    #[test]
    fn test_redirects() {
        let anon = session(None);
        assert_eq!(guard(Route::Projects, &anon), GuardDecision::Redirect(Route::Login));
        assert_eq!(guard(Route::NotFound, &anon), GuardDecision::Redirect(Route::Login));

        let editor = session(Some(Role::Editor));
        assert_eq!(guard(Route::Login, &editor), GuardDecision::Redirect(Route::Dashboard));
        assert_eq!(guard(Route::Users, &editor), GuardDecision::Redirect(Route::Dashboard));
        assert_eq!(guard(Route::Contacts, &editor), GuardDecision::Render(Route::Contacts));

        let admin = session(Some(Role::Admin));
        assert_eq!(guard(Route::Users, &admin), GuardDecision::Render(Route::Users));
        assert_eq!(guard(Route::NotFound, &admin), GuardDecision::Render(Route::NotFound));
    }

    #[test]
    fn test_navigation_by_role() {
        let routes = |role| -> Vec<Route> {
            navigation(&Permissions::for_role(role))
                .into_iter()
                .map(|item| item.route)
                .collect()
        };

        let viewer = routes(Role::Viewer);
        assert_eq!(viewer.first(), Some(&Route::Dashboard));
        assert!(viewer.contains(&Route::Brochures));
        assert!(!viewer.contains(&Route::Users));
        assert!(!routes(Role::Editor).contains(&Route::Users));
        assert_eq!(routes(Role::Admin).len(), 8);
        assert!(navigation(&Permissions::none()).iter().all(|i| i.route != Route::Users));
    }
}
