//! 权限模型
//!
//! 由角色一次性推导出能力集合（`Permissions`），页面只读取能力，
//! 不再直接比较角色字符串。
//!
//! 这只是界面层的可见性控制，后端会对每个请求重新鉴权。

use crate::Role;
use serde::{Deserialize, Serialize};

/// 管理后台中的资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Projects,
    Clients,
    Testimonials,
    Contacts,
    Careers,
    Brochures,
    Users,
}

/// 资源上的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    /// 审核 / 已读切换
    Toggle,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Projects,
        ResourceKind::Clients,
        ResourceKind::Testimonials,
        ResourceKind::Contacts,
        ResourceKind::Careers,
        ResourceKind::Brochures,
        ResourceKind::Users,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Projects => "Projects",
            ResourceKind::Clients => "Clients",
            ResourceKind::Testimonials => "Testimonials",
            ResourceKind::Contacts => "Contact Submissions",
            ResourceKind::Careers => "Career Applications",
            ResourceKind::Brochures => "Brochure Requests",
            ResourceKind::Users => "Users",
        }
    }

    /// 单数名词，用于 "Add Project" 等按钮
    pub fn noun(&self) -> &'static str {
        match self {
            ResourceKind::Projects => "Project",
            ResourceKind::Clients => "Client",
            ResourceKind::Testimonials => "Testimonial",
            ResourceKind::Contacts => "Submission",
            ResourceKind::Careers => "Application",
            ResourceKind::Brochures => "Request",
            ResourceKind::Users => "User",
        }
    }

    /// 后端是否提供该操作对应的接口
    pub fn supports(&self, action: Action) -> bool {
        use Action::*;
        use ResourceKind::*;
        match (self, action) {
            (_, View) => true,
            (Projects | Testimonials | Users, Create | Update | Delete) => true,
            (Clients, Create | Delete) => true,
            (Contacts | Careers, Update | Delete) => true,
            (Testimonials | Contacts | Careers, Toggle) => true,
            _ => false,
        }
    }

    /// 留言类资源的删除只对管理员开放
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            ResourceKind::Contacts | ResourceKind::Careers | ResourceKind::Brochures
        )
    }
}

/// 某个资源上当前用户可执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCaps {
    pub view: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub toggle: bool,
}

/// 会话级能力集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete_content: bool,
    pub can_delete_submissions: bool,
    pub can_moderate: bool,
    pub can_manage_users: bool,
}

impl Permissions {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self {
                can_create: true,
                can_update: true,
                can_delete_content: true,
                can_delete_submissions: true,
                can_moderate: true,
                can_manage_users: true,
            },
            Role::Editor => Self {
                can_create: true,
                can_update: true,
                can_delete_content: true,
                can_delete_submissions: false,
                can_moderate: true,
                can_manage_users: false,
            },
            Role::Viewer => Self::default(),
        }
    }

    /// 未登录时的能力（全部为 false）
    pub fn none() -> Self {
        Self::default()
    }

    fn role_allows(&self, kind: ResourceKind, action: Action) -> bool {
        if kind == ResourceKind::Users {
            return self.can_manage_users;
        }
        match action {
            Action::View => true,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Toggle => self.can_moderate,
            Action::Delete if kind.is_submission() => self.can_delete_submissions,
            Action::Delete => self.can_delete_content,
        }
    }

    /// 角色许可且后端支持
    pub fn allows(&self, kind: ResourceKind, action: Action) -> bool {
        kind.supports(action) && self.role_allows(kind, action)
    }

    pub fn caps(&self, kind: ResourceKind) -> ResourceCaps {
        ResourceCaps {
            view: self.allows(kind, Action::View),
            create: self.allows(kind, Action::Create),
            update: self.allows(kind, Action::Update),
            delete: self.allows(kind, Action::Delete),
            toggle: self.allows(kind, Action::Toggle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_is_read_only() {
        let perms = Permissions::for_role(Role::Viewer);
        for kind in ResourceKind::ALL {
            let caps = perms.caps(kind);
            assert!(!caps.create && !caps.update && !caps.delete && !caps.toggle);
            assert_eq!(caps.view, kind != ResourceKind::Users);
        }
    }

    #[test]
    fn test_editor_limited_delete() {
        let perms = Permissions::for_role(Role::Editor);
        assert!(perms.allows(ResourceKind::Projects, Action::Create));
        assert!(perms.allows(ResourceKind::Projects, Action::Delete));
        assert!(perms.allows(ResourceKind::Testimonials, Action::Toggle));
        assert!(perms.allows(ResourceKind::Contacts, Action::Toggle));
        assert!(!perms.allows(ResourceKind::Contacts, Action::Delete));
        assert!(!perms.allows(ResourceKind::Careers, Action::Delete));
        assert!(!perms.allows(ResourceKind::Users, Action::View));
    }

    #[test]
    fn test_admin_bounded_by_endpoints() {
        let perms = Permissions::for_role(Role::Admin);
        assert!(perms.allows(ResourceKind::Users, Action::Delete));
        assert!(perms.allows(ResourceKind::Contacts, Action::Delete));
        // 后端没有这些接口
        assert!(!perms.allows(ResourceKind::Clients, Action::Update));
        assert!(!perms.allows(ResourceKind::Brochures, Action::Delete));
        assert!(!perms.allows(ResourceKind::Contacts, Action::Create));
        assert_eq!(
            perms.caps(ResourceKind::Brochures),
            ResourceCaps {
                view: true,
                ..Default::default()
            }
        );
    }
}
