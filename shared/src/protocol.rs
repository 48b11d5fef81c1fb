use crate::validate::{DraftMode, Validate, ValidationErrors};
use crate::{
    BrochureRequest, CareerSubmission, Client, ClientDraft, ContactSubmission, Project,
    ProjectDraft, ReadPatch, Role, Testimonial, TestimonialDraft, Upload, User, UserDraft,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

// =========================================================
// 请求体 (Request Bodies)
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(Upload),
}

/// multipart/form-data 表单，boundary 由传输层负责
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultipartForm {
    pub parts: Vec<(String, FormValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts
            .push((name.to_string(), FormValue::Text(value.into())));
        self
    }

    /// 空字符串不提交
    pub fn text_opt(self, name: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self
        } else {
            self.text(name, value.trim())
        }
    }

    pub fn file(mut self, name: &str, upload: Option<&Upload>) -> Self {
        if let Some(upload) = upload {
            self.parts
                .push((name.to_string(), FormValue::File(upload.clone())));
        }
        self
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(k, v)| match v {
            FormValue::Text(s) if k == name => Some(s.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(RequestBody::Json(serde_json::to_string(value)?))
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;

    /// The URL path, relative to the API base URL.
    fn path(&self) -> String;

    fn body(&self) -> serde_json::Result<RequestBody> {
        Ok(RequestBody::Empty)
    }
}

/// 路径中的一个片段：RFC 3986 非保留字符之外一律百分号编码
pub struct Segment<'a>(pub &'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{b:02X}")?;
            }
        }
        Ok(())
    }
}

/// 列表接口可能直接返回数组，也可能包在 `{ "data": [...] }` 里
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

/// 只关心成功与否的接口
pub type Ack = IgnoredAny;

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/login".to_string()
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(self)
    }
}

impl Validate for LoginRequest {
    fn validate(&self, _mode: DraftMode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() || self.password.is_empty() {
            errors.push("email", "Please fill in all fields");
        }
        errors.into_result()
    }
}

/// Who am I
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentUserRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CurrentUserResponse {
    Wrapped { user: User },
    Bare(User),
}

impl CurrentUserResponse {
    pub fn into_user(self) -> User {
        match self {
            CurrentUserResponse::Wrapped { user } | CurrentUserResponse::Bare(user) => user,
        }
    }
}

impl ApiRequest for CurrentUserRequest {
    type Response = CurrentUserResponse;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/auth/me".to_string()
    }
}

pub struct RegisterUser<'a> {
    pub draft: &'a UserDraft,
}

impl ApiRequest for RegisterUser<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/register".to_string()
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(self.draft)
    }
}

pub struct ListUsers;

impl ApiRequest for ListUsers {
    type Response = Listing<User>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/auth/users".to_string()
    }
}

pub struct UpdateUserRole<'a> {
    pub id: &'a str,
    pub role: Role,
}

impl ApiRequest for UpdateUserRole<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/auth/users/{}/role", Segment(self.id))
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(&serde_json::json!({ "role": self.role }))
    }
}

pub struct DeleteUser<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteUser<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/auth/users/{}", Segment(self.id))
    }
}

// =========================================================
// Projects
// =========================================================

fn project_form(draft: &ProjectDraft) -> MultipartForm {
    MultipartForm::new()
        .text("title", draft.title.trim())
        .text("slug", draft.slug.as_str())
        .text("description", draft.description.trim())
        .text_opt("category", &draft.category)
        .text_opt("location", &draft.location)
        .text("isFeatured", draft.is_featured.to_string())
        .file("image", draft.image.as_ref())
}

pub struct ListProjects;

impl ApiRequest for ListProjects {
    type Response = Listing<Project>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/projects".to_string()
    }
}

pub struct CreateProject<'a> {
    pub draft: &'a ProjectDraft,
}

impl ApiRequest for CreateProject<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/projects".to_string()
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        Ok(RequestBody::Multipart(project_form(self.draft)))
    }
}

pub struct UpdateProject<'a> {
    pub id: &'a str,
    pub draft: &'a ProjectDraft,
}

impl ApiRequest for UpdateProject<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/projects/{}", Segment(self.id))
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        Ok(RequestBody::Multipart(project_form(self.draft)))
    }
}

pub struct DeleteProject<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteProject<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/projects/{}", Segment(self.id))
    }
}

// =========================================================
// Clients
// =========================================================

pub struct ListClients;

impl ApiRequest for ListClients {
    type Response = Listing<Client>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/clients".to_string()
    }
}

pub struct CreateClient<'a> {
    pub draft: &'a ClientDraft,
}

impl ApiRequest for CreateClient<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/clients".to_string()
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        let form = MultipartForm::new()
            .text("name", self.draft.name.trim())
            .text_opt("website", &self.draft.website)
            .file("logo", self.draft.logo.as_ref());
        Ok(RequestBody::Multipart(form))
    }
}

pub struct DeleteClient<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteClient<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/clients/{}", Segment(self.id))
    }
}

// =========================================================
// Testimonials
// =========================================================

pub struct ListTestimonials;

impl ApiRequest for ListTestimonials {
    type Response = Listing<Testimonial>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/testimonials".to_string()
    }
}

pub struct CreateTestimonial<'a> {
    pub draft: &'a TestimonialDraft,
}

impl ApiRequest for CreateTestimonial<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/testimonials".to_string()
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(self.draft)
    }
}

pub struct UpdateTestimonial<'a> {
    pub id: &'a str,
    pub draft: &'a TestimonialDraft,
}

impl ApiRequest for UpdateTestimonial<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/testimonials/{}", Segment(self.id))
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(self.draft)
    }
}

pub struct DeleteTestimonial<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteTestimonial<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/testimonials/{}", Segment(self.id))
    }
}

// =========================================================
// Submissions (contact / careers / brochure)
// =========================================================

pub struct ListContacts;

impl ApiRequest for ListContacts {
    type Response = Listing<ContactSubmission>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/contact".to_string()
    }
}

pub struct UpdateContact<'a> {
    pub id: &'a str,
    pub patch: ReadPatch,
}

impl ApiRequest for UpdateContact<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/contact/{}", Segment(self.id))
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(&self.patch)
    }
}

pub struct DeleteContact<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteContact<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/contact/{}", Segment(self.id))
    }
}

pub struct ListCareers;

impl ApiRequest for ListCareers {
    type Response = Listing<CareerSubmission>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/careers".to_string()
    }
}

pub struct UpdateCareer<'a> {
    pub id: &'a str,
    pub patch: ReadPatch,
}

impl ApiRequest for UpdateCareer<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/careers/{}", Segment(self.id))
    }

    fn body(&self) -> serde_json::Result<RequestBody> {
        RequestBody::json(&self.patch)
    }
}

pub struct DeleteCareer<'a> {
    pub id: &'a str,
}

impl ApiRequest for DeleteCareer<'_> {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/careers/{}", Segment(self.id))
    }
}

pub struct ListBrochureRequests;

impl ApiRequest for ListBrochureRequests {
    type Response = Listing<BrochureRequest>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/brochure-request".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_accepts_both_shapes() {
        let bare: Listing<Client> =
            serde_json::from_value(json!([{ "id": "1", "name": "Acme" }])).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: Listing<Client> =
            serde_json::from_value(json!({ "data": [{ "id": 2, "name": "Beta" }] })).unwrap();
        let items = wrapped.into_vec();
        assert_eq!(items[0].id, "2");
    }

    #[test]
    fn test_current_user_accepts_both_shapes() {
        let wrapped: CurrentUserResponse =
            serde_json::from_value(json!({ "user": { "id": "u1", "email": "a@b.co", "role": "EDITOR" } }))
                .unwrap();
        assert_eq!(wrapped.into_user().role, Role::Editor);

        let bare: CurrentUserResponse =
            serde_json::from_value(json!({ "id": "u1", "email": "a@b.co", "role": "ADMIN" }))
                .unwrap();
        assert_eq!(bare.into_user().role, Role::Admin);
    }

    #[test]
    fn test_project_form_skips_blank_optionals() {
        let draft = ProjectDraft {
            title: " Tower ".into(),
            slug: "tower".into(),
            description: "Tall".into(),
            category: "  ".into(),
            ..Default::default()
        };
        let RequestBody::Multipart(form) = CreateProject { draft: &draft }.body().unwrap() else {
            panic!("expected multipart body");
        };
        assert_eq!(form.get_text("title"), Some("Tower"));
        assert_eq!(form.get_text("isFeatured"), Some("false"));
        assert_eq!(form.get_text("category"), None);
        assert!(!form.parts.iter().any(|(k, _)| k == "image"));
    }

    #[test]
    fn test_paths_and_methods() {
        assert_eq!(UpdateUserRole { id: "7", role: Role::Editor }.path(), "/auth/users/7/role");
        assert_eq!(<UpdateUserRole<'static> as ApiRequest>::METHOD, HttpMethod::Put);
        assert_eq!(DeleteContact { id: "9" }.path(), "/contact/9");
        assert_eq!(ListBrochureRequests.path(), "/brochure-request");
        let body = UpdateCareer {
            id: "3",
            patch: ReadPatch { is_read: true },
        }
        .body()
        .unwrap();
        assert_eq!(body, RequestBody::Json(r#"{"isRead":true}"#.to_string()));
    }

    #[test]
    fn test_ids_are_encoded_as_one_segment() {
        assert_eq!(DeleteProject { id: "a/b?c#d" }.path(), "/projects/a%2Fb%3Fc%23d");
        assert_eq!(DeleteContact { id: "x y" }.path(), "/contact/x%20y");
        assert_eq!(
            UpdateUserRole { id: "ü-1_~.", role: Role::Admin }.path(),
            "/auth/users/%C3%BC-1_~./role"
        );
        assert_eq!(DeleteCareer { id: "66a1f0c2e4b0" }.path(), "/careers/66a1f0c2e4b0");
    }
}
