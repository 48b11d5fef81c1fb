//! 客户端表单校验
//!
//! 校验失败时不会发出任何网络请求。

use crate::slug::is_slug;
use crate::{ClientDraft, NoDraft, ProjectDraft, ReadPatch, TestimonialDraft, UserDraft};
use std::fmt;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// 没有错误时返回 Ok
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    fn require(&mut self, field: &'static str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{} is required", label));
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validate {
    fn validate(&self, mode: DraftMode) -> Result<(), ValidationErrors>;
}

fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

impl Validate for ProjectDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title");
        errors.require("description", &self.description, "Description");
        if !is_slug(&self.slug) {
            errors.push(
                "slug",
                "Slug may only contain lowercase letters, digits and single hyphens",
            );
        }
        errors.into_result()
    }
}

impl Validate for ClientDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name");
        let website = self.website.trim();
        if !website.is_empty()
            && !(website.starts_with("http://") || website.starts_with("https://"))
        {
            errors.push("website", "Website must start with http:// or https://");
        }
        errors.into_result()
    }
}

impl Validate for TestimonialDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name");
        errors.require("content", &self.content, "Content");
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                errors.push("rating", "Rating must be between 1 and 5");
            }
        }
        errors.into_result()
    }
}

impl Validate for UserDraft {
    fn validate(&self, mode: DraftMode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        // 编辑时只提交角色
        if mode == DraftMode::Create {
            if !looks_like_email(&self.email) {
                errors.push("email", "A valid email is required");
            }
            if self.password.len() < MIN_PASSWORD_LEN {
                errors.push(
                    "password",
                    format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
                );
            }
        }
        errors.into_result()
    }
}

impl Validate for ReadPatch {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Validate for NoDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_project_requires_fields_and_clean_slug() {
        let draft = ProjectDraft {
            slug: "Bad Slug".into(),
            ..Default::default()
        };
        let errors = draft.validate(DraftMode::Create).unwrap_err();
        assert!(errors.for_field("title").is_some());
        assert!(errors.for_field("description").is_some());
        assert!(errors.for_field("slug").is_some());

        let mut ok = ProjectDraft {
            description: "d".into(),
            ..Default::default()
        };
        ok.set_title("Harbour Bridge".into(), false);
        assert!(ok.validate(DraftMode::Create).is_ok());
    }

    #[test]
    fn test_user_password_only_checked_on_create() {
        let draft = UserDraft {
            email: "ed@example.com".into(),
            password: "123".into(),
            role: Role::Editor,
            ..Default::default()
        };
        let errors = draft.validate(DraftMode::Create).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.to_string().contains("at least 6"));
        assert!(draft.validate(DraftMode::Update).is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("plain"));
    }

    #[test]
    fn test_client_website_scheme() {
        let draft = ClientDraft {
            name: "Acme".into(),
            website: "acme.com".into(),
            logo: None,
        };
        assert!(draft.validate(DraftMode::Create).is_err());
        let draft = ClientDraft {
            website: "https://acme.com".into(),
            ..draft
        };
        assert!(draft.validate(DraftMode::Create).is_ok());
    }
}
