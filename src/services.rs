//! 资源服务
//!
//! 每个服务把一种资源的增删改查一一映射到 REST 接口。
//! 后端没有提供的操作走 trait 的默认实现，直接返回错误而不发请求。

use crate::client::ApiClient;
use crate::error::{AdminError, AdminErrorStatus, AdminResult};
use crate::request::HttpClient;
use crate::token::TokenStore;
use futures::join;
use serde::de::DeserializeOwned;
use siteadmin_shared::protocol::*;
use siteadmin_shared::{
    Action, BrochureRequest, CareerSubmission, Client, ClientDraft, ContactSubmission, NoDraft,
    Permissions, Project, ProjectDraft, ReadPatch, Record, ResourceKind, Testimonial,
    TestimonialDraft, User, UserDraft, Validate,
};
use tracing::{debug, warn};

fn unsupported(kind: ResourceKind, action: Action) -> AdminError {
    AdminError::new(
        AdminErrorStatus::Unsupported,
        format!("{} do not support {:?}", kind.title(), action),
    )
    .in_op("service.unsupported")
}

#[async_trait::async_trait(?Send)]
pub trait ResourceService {
    type Item: Record + Clone + PartialEq + 'static;
    type Draft: Validate + Clone + Default + 'static;

    const KIND: ResourceKind;

    async fn list(&self) -> AdminResult<Vec<Self::Item>>;

    async fn create(&self, _draft: &Self::Draft) -> AdminResult<()> {
        Err(unsupported(Self::KIND, Action::Create))
    }

    async fn update(&self, _id: &str, _draft: &Self::Draft) -> AdminResult<()> {
        Err(unsupported(Self::KIND, Action::Update))
    }

    async fn delete(&self, _id: &str) -> AdminResult<()> {
        Err(unsupported(Self::KIND, Action::Delete))
    }

    /// 审核 / 已读状态翻转
    async fn toggle(&self, _item: &Self::Item) -> AdminResult<()> {
        Err(unsupported(Self::KIND, Action::Toggle))
    }

    /// 编辑表单的初始值
    fn draft_for(_item: &Self::Item) -> Self::Draft {
        Self::Draft::default()
    }
}

/// 只关心成功与否的请求
async fn ack<C: HttpClient, T: TokenStore, R: ApiRequest>(
    api: &ApiClient<C, T>,
    request: &R,
) -> AdminResult<()> {
    api.execute(request).await.map(|_| ())
}

macro_rules! service {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<C, T> {
            api: ApiClient<C, T>,
        }

        impl<C, T> $name<C, T> {
            pub fn new(api: ApiClient<C, T>) -> Self {
                Self { api }
            }
        }
    };
}

service!(ProjectService);
service!(ClientService);
service!(
    /// toggle = 审核通过 / 撤回
    TestimonialService
);
service!(
    /// toggle = 已读 / 未读
    ContactService
);
service!(CareerService);
service!(
    /// 只读
    BrochureService
);
service!(
    /// create = 注册, update = 修改角色
    UserService
);

// =========================================================
// Projects
// =========================================================

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for ProjectService<C, T> {
    type Item = Project;
    type Draft = ProjectDraft;
    const KIND: ResourceKind = ResourceKind::Projects;

    async fn list(&self) -> AdminResult<Vec<Project>> {
        Ok(self.api.execute(&ListProjects).await?.into_vec())
    }

    async fn create(&self, draft: &ProjectDraft) -> AdminResult<()> {
        ack(&self.api, &CreateProject { draft }).await
    }

    async fn update(&self, id: &str, draft: &ProjectDraft) -> AdminResult<()> {
        ack(&self.api, &UpdateProject { id, draft }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteProject { id }).await
    }

    fn draft_for(item: &Project) -> ProjectDraft {
        ProjectDraft::from(item)
    }
}

// =========================================================
// Clients
// =========================================================

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for ClientService<C, T> {
    type Item = Client;
    type Draft = ClientDraft;
    const KIND: ResourceKind = ResourceKind::Clients;

    async fn list(&self) -> AdminResult<Vec<Client>> {
        Ok(self.api.execute(&ListClients).await?.into_vec())
    }

    async fn create(&self, draft: &ClientDraft) -> AdminResult<()> {
        ack(&self.api, &CreateClient { draft }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteClient { id }).await
    }

    fn draft_for(item: &Client) -> ClientDraft {
        ClientDraft::from(item)
    }
}

// =========================================================
// Testimonials
// =========================================================

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for TestimonialService<C, T> {
    type Item = Testimonial;
    type Draft = TestimonialDraft;
    const KIND: ResourceKind = ResourceKind::Testimonials;

    async fn list(&self) -> AdminResult<Vec<Testimonial>> {
        Ok(self.api.execute(&ListTestimonials).await?.into_vec())
    }

    async fn create(&self, draft: &TestimonialDraft) -> AdminResult<()> {
        ack(&self.api, &CreateTestimonial { draft }).await
    }

    async fn update(&self, id: &str, draft: &TestimonialDraft) -> AdminResult<()> {
        ack(&self.api, &UpdateTestimonial { id, draft }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteTestimonial { id }).await
    }

    /// 后端只有整体更新接口，带上其余字段一起提交
    async fn toggle(&self, item: &Testimonial) -> AdminResult<()> {
        let draft = TestimonialDraft {
            is_approved: !item.is_approved,
            ..TestimonialDraft::from(item)
        };
        ack(&self.api, &UpdateTestimonial { id: &item.id, draft: &draft }).await
    }

    fn draft_for(item: &Testimonial) -> TestimonialDraft {
        TestimonialDraft::from(item)
    }
}

// =========================================================
// Submissions
// =========================================================

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for ContactService<C, T> {
    type Item = ContactSubmission;
    type Draft = ReadPatch;
    const KIND: ResourceKind = ResourceKind::Contacts;

    async fn list(&self) -> AdminResult<Vec<ContactSubmission>> {
        Ok(self.api.execute(&ListContacts).await?.into_vec())
    }

    async fn update(&self, id: &str, patch: &ReadPatch) -> AdminResult<()> {
        ack(&self.api, &UpdateContact { id, patch: *patch }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteContact { id }).await
    }

    async fn toggle(&self, item: &ContactSubmission) -> AdminResult<()> {
        let patch = ReadPatch {
            is_read: !item.is_read,
        };
        self.update(&item.id, &patch).await
    }

    fn draft_for(item: &ContactSubmission) -> ReadPatch {
        ReadPatch {
            is_read: item.is_read,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for CareerService<C, T> {
    type Item = CareerSubmission;
    type Draft = ReadPatch;
    const KIND: ResourceKind = ResourceKind::Careers;

    async fn list(&self) -> AdminResult<Vec<CareerSubmission>> {
        Ok(self.api.execute(&ListCareers).await?.into_vec())
    }

    async fn update(&self, id: &str, patch: &ReadPatch) -> AdminResult<()> {
        ack(&self.api, &UpdateCareer { id, patch: *patch }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteCareer { id }).await
    }

    async fn toggle(&self, item: &CareerSubmission) -> AdminResult<()> {
        let patch = ReadPatch {
            is_read: !item.is_read,
        };
        self.update(&item.id, &patch).await
    }

    fn draft_for(item: &CareerSubmission) -> ReadPatch {
        ReadPatch {
            is_read: item.is_read,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for BrochureService<C, T> {
    type Item = BrochureRequest;
    type Draft = NoDraft;
    const KIND: ResourceKind = ResourceKind::Brochures;

    async fn list(&self) -> AdminResult<Vec<BrochureRequest>> {
        Ok(self.api.execute(&ListBrochureRequests).await?.into_vec())
    }
}

// =========================================================
// Users
// =========================================================

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, T: TokenStore> ResourceService for UserService<C, T> {
    type Item = User;
    type Draft = UserDraft;
    const KIND: ResourceKind = ResourceKind::Users;

    async fn list(&self) -> AdminResult<Vec<User>> {
        Ok(self.api.execute(&ListUsers).await?.into_vec())
    }

    async fn create(&self, draft: &UserDraft) -> AdminResult<()> {
        ack(&self.api, &RegisterUser { draft }).await
    }

    async fn update(&self, id: &str, draft: &UserDraft) -> AdminResult<()> {
        ack(&self.api, &UpdateUserRole { id, role: draft.role }).await
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        ack(&self.api, &DeleteUser { id }).await
    }

    fn draft_for(item: &User) -> UserDraft {
        UserDraft::from(item)
    }
}

// =========================================================
// Dashboard
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCount {
    pub kind: ResourceKind,
    /// 获取失败时为 None
    pub count: Option<usize>,
}

/// 首页统计
pub struct DashboardService<C, T> {
    api: ApiClient<C, T>,
}

impl<C: HttpClient, T: TokenStore> DashboardService<C, T> {
    pub fn new(api: ApiClient<C, T>) -> Self {
        Self { api }
    }

    /// 401 直接返回错误，其余失败记为未知数量
    async fn count<R, I>(
        &self,
        permissions: &Permissions,
        kind: ResourceKind,
        request: R,
    ) -> AdminResult<Option<ResourceCount>>
    where
        R: ApiRequest<Response = Listing<I>>,
        I: DeserializeOwned,
    {
        if !permissions.allows(kind, Action::View) {
            return Ok(None);
        }
        let count = match self.api.execute(&request).await {
            Ok(listing) => Some(listing.into_vec().len()),
            Err(e) if e.is_auth_failure() => {
                return Err(e.in_op_with("dashboard.count", kind.title()));
            }
            Err(e) => {
                warn!(resource = kind.title(), error = %e, "failed to count resource");
                None
            }
        };
        Ok(Some(ResourceCount { kind, count }))
    }

    /// 并发获取各资源数量，跳过当前角色不可见的资源
    ///
    /// 只有 token 失效时返回错误。
    pub async fn summary(&self, permissions: &Permissions) -> AdminResult<Vec<ResourceCount>> {
        let (projects, clients, testimonials, contacts, careers, brochures, users) = join!(
            self.count(permissions, ResourceKind::Projects, ListProjects),
            self.count(permissions, ResourceKind::Clients, ListClients),
            self.count(permissions, ResourceKind::Testimonials, ListTestimonials),
            self.count(permissions, ResourceKind::Contacts, ListContacts),
            self.count(permissions, ResourceKind::Careers, ListCareers),
            self.count(permissions, ResourceKind::Brochures, ListBrochureRequests),
            self.count(permissions, ResourceKind::Users, ListUsers),
        );

        let counts = [projects, clients, testimonials, contacts, careers, brochures, users]
            .into_iter()
            .collect::<AdminResult<Vec<_>>>()?;
        let summary: Vec<ResourceCount> = counts.into_iter().flatten().collect();
        debug!(resources = summary.len(), "dashboard summary loaded");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HttpMethod, MockHttpClient};
    use crate::token::MemoryTokenStore;
    use serde_json::json;
    use siteadmin_shared::Role;
    use std::rc::Rc;

    const BASE: &str = "http://api.test";

    fn api() -> (Rc<MockHttpClient>, ApiClient<Rc<MockHttpClient>, MemoryTokenStore>) {
        let http = Rc::new(MockHttpClient::new());
        let api = ApiClient::new(BASE, http.clone(), MemoryTokenStore::with_token("t"));
        (http, api)
    }

    fn url(path: &str) -> String {
        format!("{BASE}{path}")
    }

    #[tokio::test]
    async fn test_testimonial_toggle_sends_full_record() {
        let (http, api) = api();
        http.mock_response(HttpMethod::Put, &url("/testimonials/t1"), 200, json!({}));
        let service = TestimonialService::new(api);

        let item = Testimonial {
            id: "t1".into(),
            name: "Ana".into(),
            position: None,
            company: Some("Acme".into()),
            content: "Great".into(),
            rating: Some(4),
            is_approved: false,
            created_at: None,
        };
        service.toggle(&item).await.unwrap();

        let body = http.requests_to(HttpMethod::Put, &url("/testimonials/t1"))[0].json();
        assert_eq!(
            body,
            json!({
                "name": "Ana",
                "company": "Acme",
                "content": "Great",
                "rating": 4,
                "isApproved": true
            })
        );
    }

    #[tokio::test]
    async fn test_contact_toggle_flips_read_flag() {
        let (http, api) = api();
        http.mock_response(HttpMethod::Put, &url("/contact/c1"), 200, json!({}));
        let service = ContactService::new(api);

        let item: ContactSubmission = serde_json::from_value(json!({
            "_id": "c1", "name": "Bo", "email": "bo@x.io", "message": "hi", "isRead": true
        }))
        .unwrap();
        service.toggle(&item).await.unwrap();

        let sent = &http.requests_to(HttpMethod::Put, &url("/contact/c1"))[0];
        assert_eq!(sent.json(), json!({ "isRead": false }));
    }

    #[tokio::test]
    async fn test_unsupported_operations_skip_network() {
        let (http, api) = api();
        let clients = ClientService::new(api.clone());
        let brochures = BrochureService::new(api);

        let err = clients.update("1", &ClientDraft::default()).await.unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Unsupported);
        assert_eq!(err.message(), "Clients do not support Update");
        assert!(brochures.delete("1").await.is_err());
        assert!(brochures.create(&NoDraft).await.is_err());
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_user_update_changes_role_only() {
        let (http, api) = api();
        http.mock_response(HttpMethod::Put, &url("/auth/users/u9/role"), 200, json!({}));
        let service = UserService::new(api);

        let draft = UserDraft {
            email: "x@y.z".into(),
            role: Role::Editor,
            ..Default::default()
        };
        service.update("u9", &draft).await.unwrap();

        let sent = &http.requests_to(HttpMethod::Put, &url("/auth/users/u9/role"))[0];
        assert_eq!(sent.json(), json!({ "role": "EDITOR" }));
    }

    #[tokio::test]
    async fn test_dashboard_summary_skips_hidden_resources() {
        let (http, api) = api();
        http.mock_response(HttpMethod::Get, &url("/projects"), 200, json!([{ "id": 1, "title": "A" }]));
        http.mock_response(HttpMethod::Get, &url("/clients"), 200, json!({ "data": [] }));
        http.mock_response(HttpMethod::Get, &url("/testimonials"), 500, json!({}));
        http.mock_response(HttpMethod::Get, &url("/contact"), 200, json!([]));
        http.mock_response(HttpMethod::Get, &url("/careers"), 200, json!([]));
        http.mock_response(HttpMethod::Get, &url("/brochure-request"), 200, json!([]));

        let summary = DashboardService::new(api)
            .summary(&Permissions::for_role(Role::Editor))
            .await
            .unwrap();

        assert_eq!(summary.len(), 6);
        assert_eq!(summary[0], ResourceCount { kind: ResourceKind::Projects, count: Some(1) });
        assert_eq!(summary[1].count, Some(0));
        assert_eq!(summary[2].count, None);
        assert!(summary.iter().all(|c| c.kind != ResourceKind::Users));
        assert!(http.requests_to(HttpMethod::Get, &url("/auth/users")).is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_summary_reports_expired_token() {
        let (http, api) = api();
        http.mock_response(HttpMethod::Get, &url("/projects"), 200, json!([]));
        http.mock_response(HttpMethod::Get, &url("/clients"), 401, json!({ "message": "jwt expired" }));
        http.mock_response(HttpMethod::Get, &url("/testimonials"), 500, json!({}));

        let err = DashboardService::new(api)
            .summary(&Permissions::for_role(Role::Viewer))
            .await
            .unwrap_err();
        assert_eq!(err.status, AdminErrorStatus::Unauthorized);
        assert_eq!(err.message(), "jwt expired");
    }
}
