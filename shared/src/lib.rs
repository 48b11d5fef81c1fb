use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod permissions;
pub mod protocol;
pub mod slug;
pub mod validate;

pub use permissions::{Action, Permissions, ResourceCaps, ResourceKind};
pub use slug::derive_slug;
pub use validate::{DraftMode, FieldError, Validate, ValidationErrors};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const TOKEN_COOKIE_NAME: &str = "token";
pub const TOKEN_TTL_DAYS: u32 = 7;

// =========================================================
// 用户与角色 (Users & Roles)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Editor,
    /// 未知角色一律降级为只读
    #[default]
    #[serde(other)]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// 展示用名称：优先 name，否则退回 email
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 列表页与删除确认框共用的记录接口
pub trait Record {
    fn id(&self) -> &str;

    /// 删除确认等场景中用于指代该记录的简短文本
    fn label(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSubmission {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrochureRequest {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.email
    }
}

impl Record for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.title
    }
}

impl Record for Client {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for Testimonial {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for ContactSubmission {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for CareerSubmission {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for BrochureRequest {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

// =========================================================
// 表单草稿 (Drafts)
// =========================================================

/// 待上传的文件（图片 / Logo）
#[derive(Clone, PartialEq, Default)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub is_featured: bool,
    pub image: Option<Upload>,
}

impl ProjectDraft {
    /// 标题变更时同步 slug；用户手动改过 slug 后不再覆盖
    pub fn set_title(&mut self, title: String, slug_touched: bool) {
        if !slug_touched {
            self.slug = derive_slug(&title);
        }
        self.title = title;
    }
}

impl From<&Project> for ProjectDraft {
    fn from(p: &Project) -> Self {
        Self {
            title: p.title.clone(),
            slug: p.slug.clone(),
            description: p.description.clone(),
            category: p.category.clone().unwrap_or_default(),
            location: p.location.clone().unwrap_or_default(),
            is_featured: p.is_featured,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientDraft {
    pub name: String,
    pub website: String,
    pub logo: Option<Upload>,
}

impl From<&Client> for ClientDraft {
    fn from(c: &Client) -> Self {
        Self {
            name: c.name.clone(),
            website: c.website.clone().unwrap_or_default(),
            logo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialDraft {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub position: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub is_approved: bool,
}

impl Default for TestimonialDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: String::new(),
            company: String::new(),
            content: String::new(),
            rating: Some(5),
            is_approved: false,
        }
    }
}

impl From<&Testimonial> for TestimonialDraft {
    fn from(t: &Testimonial) -> Self {
        Self {
            name: t.name.clone(),
            position: t.position.clone().unwrap_or_default(),
            company: t.company.clone().unwrap_or_default(),
            content: t.content.clone(),
            rating: t.rating,
            is_approved: t.is_approved,
        }
    }
}

/// 用户表单：创建时使用全部字段，编辑时只提交角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub password: String,
    pub role: Role,
}

impl From<&User> for UserDraft {
    fn from(u: &User) -> Self {
        Self {
            email: u.email.clone(),
            name: u.name.clone().unwrap_or_default(),
            password: String::new(),
            role: u.role,
        }
    }
}

/// 已读 / 未读标记
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadPatch {
    pub is_read: bool,
}

/// 只读资源（留言、简历、资料索取）没有可编辑的表单
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoDraft;

// =========================================================
// 展示辅助
// =========================================================

/// 列表中的日期列：`2024-05-01`，缺失时为空
pub fn format_day(at: Option<DateTime<Utc>>) -> String {
    at.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// =========================================================
// 反序列化辅助
// =========================================================

/// 后端的 id 可能是字符串，也可能是数字
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_unknown_falls_back_to_viewer() {
        let role: Role = serde_json::from_value(json!("SUPERUSER")).unwrap();
        assert_eq!(role, Role::Viewer);
        let role: Role = serde_json::from_value(json!("EDITOR")).unwrap();
        assert_eq!(role, Role::Editor);
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
    }

    #[test]
    fn test_user_accepts_numeric_and_mongo_ids() {
        let user: User =
            serde_json::from_value(json!({ "id": 42, "email": "a@b.co", "role": "ADMIN" }))
                .unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.display_name(), "a@b.co");

        let project: Project =
            serde_json::from_value(json!({ "_id": "abc", "title": "T", "isFeatured": true }))
                .unwrap();
        assert_eq!(project.id, "abc");
        assert!(project.is_featured);
        assert!(project.slug.is_empty());
        assert_eq!(format_day(project.created_at), "");

        let project: Project = serde_json::from_value(
            json!({ "id": 1, "title": "T", "createdAt": "2024-05-01T10:00:00Z" }),
        )
        .unwrap();
        assert_eq!(format_day(project.created_at), "2024-05-01");
    }

    #[test]
    fn test_project_title_drives_slug_until_touched() {
        let mut draft = ProjectDraft::default();
        draft.set_title("My New Project!!".into(), false);
        assert_eq!(draft.slug, "my-new-project");

        draft.slug = "custom".into();
        draft.set_title("Another".into(), true);
        assert_eq!(draft.slug, "custom");
        assert_eq!(draft.title, "Another");
    }

    #[test]
    fn test_testimonial_draft_wire_shape() {
        let draft = TestimonialDraft {
            name: "Ann".into(),
            content: "Great".into(),
            is_approved: true,
            ..Default::default()
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["isApproved"], json!(true));
        assert!(v.get("position").is_none());
        assert_eq!(v["rating"], json!(5));
    }
}
