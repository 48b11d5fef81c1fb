//! 各资源的列、详情与表单

use crate::api::BrowserApi;
use crate::components::crud::EntityView;
use crate::web::{CookieTokenStore, FetchClient, upload};
use leptos::prelude::*;
use leptos::task::spawn_local;
use siteadmin::{
    BrochureService, CareerService, ClientService, ContactService, ProjectService,
    TestimonialService, UserService,
};
use siteadmin_shared::{
    BrochureRequest, CareerSubmission, Client, ClientDraft, ContactSubmission, DraftMode,
    NoDraft, Project, ProjectDraft, ReadPatch, Role, Testimonial, TestimonialDraft, Upload, User,
    UserDraft, format_day,
};

// =========================================================
// 表单控件
// =========================================================

fn text_field<D: Send + Sync + 'static>(
    id: &'static str,
    label: &'static str,
    draft: RwSignal<D>,
    get: fn(&D) -> String,
    set: fn(&mut D, String),
) -> impl IntoView {
    view! {
        <div class="form-control">
            <label for=id class="label">
                <span class="label-text">{label}</span>
            </label>
            <input id=id
                type="text"
                on:input=move |ev| draft.update(|d| set(d, event_target_value(&ev)))
                prop:value=move || draft.with(get)
                class="input input-bordered w-full"
            />
        </div>
    }
}

fn text_area<D: Send + Sync + 'static>(
    id: &'static str,
    label: &'static str,
    draft: RwSignal<D>,
    get: fn(&D) -> String,
    set: fn(&mut D, String),
) -> impl IntoView {
    view! {
        <div class="form-control">
            <label for=id class="label">
                <span class="label-text">{label}</span>
            </label>
            <textarea id=id
                rows="4"
                on:input=move |ev| draft.update(|d| set(d, event_target_value(&ev)))
                prop:value=move || draft.with(get)
                class="textarea textarea-bordered w-full"
            ></textarea>
        </div>
    }
}

fn check_field<D: Send + Sync + 'static>(
    label: &'static str,
    draft: RwSignal<D>,
    get: fn(&D) -> bool,
    set: fn(&mut D, bool),
) -> impl IntoView {
    view! {
        <label class="label cursor-pointer justify-start gap-3">
            <input
                type="checkbox"
                class="checkbox checkbox-primary"
                on:change=move |ev| draft.update(|d| set(d, event_target_checked(&ev)))
                prop:checked=move || draft.with(get)
            />
            <span class="label-text">{label}</span>
        </label>
    }
}

/// 文件选择：读完内容后写回草稿，编辑时不选则保留原文件
fn file_field<D: Send + Sync + 'static>(
    id: &'static str,
    label: &'static str,
    draft: RwSignal<D>,
    set: fn(&mut D, Option<Upload>),
) -> impl IntoView {
    let on_change = move |ev: leptos::web_sys::Event| {
        let Some(file) = upload::selected_file(&ev) else {
            return;
        };
        spawn_local(async move {
            let upload = upload::read_upload(file).await;
            let _ = draft.try_update(|d| set(d, upload));
        });
    };

    view! {
        <div class="form-control">
            <label for=id class="label">
                <span class="label-text">{label}</span>
            </label>
            <input id=id
                type="file"
                accept="image/*"
                on:change=on_change
                class="file-input file-input-bordered w-full"
            />
        </div>
    }
}

fn detail_row(label: &'static str, value: String) -> impl IntoView {
    view! {
        <div class="grid grid-cols-3 gap-2 text-sm">
            <span class="text-base-content/60">{label}</span>
            <span class="col-span-2 break-words whitespace-pre-wrap">{value}</span>
        </div>
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn status_badge(on: bool, yes: &'static str, no: &'static str) -> impl IntoView {
    let class = if on { "badge badge-success" } else { "badge badge-ghost" };
    view! { <span class=class>{if on { yes } else { no }}</span> }
}

fn unread_class(is_read: bool) -> &'static str {
    if is_read { "" } else { "font-semibold" }
}

fn read_label(is_read: bool) -> &'static str {
    if is_read { "Mark unread" } else { "Mark read" }
}

// =========================================================
// 项目
// =========================================================

#[derive(Clone, Copy)]
pub struct ProjectsView;

impl EntityView for ProjectsView {
    type Item = Project;
    type Draft = ProjectDraft;
    type Service = ProjectService<FetchClient, CookieTokenStore>;

    const HAS_FORM: bool = true;

    fn service(api: BrowserApi) -> Self::Service {
        ProjectService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Title", "Slug", "Category", "Featured", "Created"]
    }

    fn cells(p: &Project) -> AnyView {
        view! {
            <td class="font-medium">{p.title.clone()}</td>
            <td class="font-mono text-xs">{p.slug.clone()}</td>
            <td>{opt(&p.category)}</td>
            <td>{status_badge(p.is_featured, "Featured", "No")}</td>
            <td>{format_day(p.created_at)}</td>
        }
        .into_any()
    }

    fn detail(p: &Project) -> AnyView {
        let image = p.image_url.clone().map(|src| {
            view! { <img src=src alt="" class="rounded-box max-h-48 object-cover" /> }
        });
        view! {
            <div class="space-y-2">
                {image}
                {detail_row("Slug", p.slug.clone())}
                {detail_row("Category", opt(&p.category))}
                {detail_row("Location", opt(&p.location))}
                {detail_row("Description", p.description.clone())}
                {detail_row("Created", format_day(p.created_at))}
            </div>
        }
        .into_any()
    }

    fn form(draft: RwSignal<ProjectDraft>, mode: DraftMode) -> AnyView {
        // 编辑时已有 slug，不再随标题变化
        let slug_touched = RwSignal::new(mode == DraftMode::Update);

        view! {
            <div class="form-control">
                <label for="p_title" class="label">
                    <span class="label-text">"Title"</span>
                </label>
                <input id="p_title"
                    type="text"
                    on:input=move |ev| {
                        let title = event_target_value(&ev);
                        let touched = slug_touched.get_untracked();
                        draft.update(|d| d.set_title(title, touched));
                    }
                    prop:value=move || draft.with(|d| d.title.clone())
                    class="input input-bordered w-full"
                />
            </div>
            <div class="form-control">
                <label for="p_slug" class="label">
                    <span class="label-text">"Slug"</span>
                </label>
                <input id="p_slug"
                    type="text"
                    on:input=move |ev| {
                        slug_touched.set(true);
                        draft.update(|d| d.slug = event_target_value(&ev));
                    }
                    prop:value=move || draft.with(|d| d.slug.clone())
                    class="input input-bordered w-full font-mono"
                />
            </div>
            {text_area("p_description", "Description", draft, |d| d.description.clone(), |d, v| d.description = v)}
            <div class="grid grid-cols-2 gap-4">
                {text_field("p_category", "Category", draft, |d| d.category.clone(), |d, v| d.category = v)}
                {text_field("p_location", "Location", draft, |d| d.location.clone(), |d, v| d.location = v)}
            </div>
            {check_field("Featured on the homepage", draft, |d| d.is_featured, |d, v| d.is_featured = v)}
            {file_field("p_image", "Image", draft, |d, v| d.image = v)}
        }
        .into_any()
    }
}

// =========================================================
// 客户
// =========================================================

#[derive(Clone, Copy)]
pub struct ClientsView;

impl EntityView for ClientsView {
    type Item = Client;
    type Draft = ClientDraft;
    type Service = ClientService<FetchClient, CookieTokenStore>;

    const HAS_FORM: bool = true;

    fn service(api: BrowserApi) -> Self::Service {
        ClientService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Logo", "Name", "Website", "Created"]
    }

    fn cells(c: &Client) -> AnyView {
        let logo = c.logo_url.clone().map(|src| {
            view! { <img src=src alt="" class="h-8 w-8 object-contain" /> }
        });
        view! {
            <td>{logo}</td>
            <td class="font-medium">{c.name.clone()}</td>
            <td>{opt(&c.website)}</td>
            <td>{format_day(c.created_at)}</td>
        }
        .into_any()
    }

    fn detail(c: &Client) -> AnyView {
        view! {
            <div class="space-y-2">
                {detail_row("Website", opt(&c.website))}
                {detail_row("Logo", opt(&c.logo_url))}
                {detail_row("Created", format_day(c.created_at))}
            </div>
        }
        .into_any()
    }

    fn form(draft: RwSignal<ClientDraft>, _mode: DraftMode) -> AnyView {
        view! {
            {text_field("c_name", "Name", draft, |d| d.name.clone(), |d, v| d.name = v)}
            {text_field("c_website", "Website", draft, |d| d.website.clone(), |d, v| d.website = v)}
            {file_field("c_logo", "Logo", draft, |d, v| d.logo = v)}
        }
        .into_any()
    }
}

// =========================================================
// 客户评价
// =========================================================

#[derive(Clone, Copy)]
pub struct TestimonialsView;

impl EntityView for TestimonialsView {
    type Item = Testimonial;
    type Draft = TestimonialDraft;
    type Service = TestimonialService<FetchClient, CookieTokenStore>;

    const HAS_FORM: bool = true;

    fn service(api: BrowserApi) -> Self::Service {
        TestimonialService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Company", "Rating", "Status", "Created"]
    }

    fn cells(t: &Testimonial) -> AnyView {
        let rating = t.rating.map(|r| "★".repeat(r as usize)).unwrap_or_default();
        view! {
            <td class="font-medium">{t.name.clone()}</td>
            <td>{opt(&t.company)}</td>
            <td class="text-warning">{rating}</td>
            <td>{status_badge(t.is_approved, "Approved", "Pending")}</td>
            <td>{format_day(t.created_at)}</td>
        }
        .into_any()
    }

    fn detail(t: &Testimonial) -> AnyView {
        view! {
            <div class="space-y-2">
                {detail_row("Position", opt(&t.position))}
                {detail_row("Company", opt(&t.company))}
                {detail_row("Rating", t.rating.map(|r| format!("{r} / 5")).unwrap_or_default())}
                {detail_row("Content", t.content.clone())}
                {detail_row("Created", format_day(t.created_at))}
            </div>
        }
        .into_any()
    }

    fn form(draft: RwSignal<TestimonialDraft>, _mode: DraftMode) -> AnyView {
        view! {
            {text_field("t_name", "Name", draft, |d| d.name.clone(), |d, v| d.name = v)}
            <div class="grid grid-cols-2 gap-4">
                {text_field("t_position", "Position", draft, |d| d.position.clone(), |d, v| d.position = v)}
                {text_field("t_company", "Company", draft, |d| d.company.clone(), |d, v| d.company = v)}
            </div>
            {text_area("t_content", "Content", draft, |d| d.content.clone(), |d, v| d.content = v)}
            <div class="form-control">
                <label for="t_rating" class="label">
                    <span class="label-text">"Rating"</span>
                </label>
                <select id="t_rating"
                    class="select select-bordered w-full"
                    on:change=move |ev| {
                        let rating = event_target_value(&ev).parse::<u8>().ok();
                        draft.update(|d| d.rating = rating);
                    }
                    prop:value=move || draft.with(|d| d.rating.map(|r| r.to_string()).unwrap_or_default())
                >
                    {(1..=5u8).rev().map(|r| view! { <option value=r.to_string()>{"★".repeat(r as usize)}</option> }).collect_view()}
                </select>
            </div>
            {check_field("Approved", draft, |d| d.is_approved, |d, v| d.is_approved = v)}
        }
        .into_any()
    }

    fn toggle_label(t: &Testimonial) -> &'static str {
        if t.is_approved { "Unapprove" } else { "Approve" }
    }
}

// =========================================================
// 联系留言
// =========================================================

#[derive(Clone, Copy)]
pub struct ContactsView;

impl EntityView for ContactsView {
    type Item = ContactSubmission;
    type Draft = ReadPatch;
    type Service = ContactService<FetchClient, CookieTokenStore>;

    fn service(api: BrowserApi) -> Self::Service {
        ContactService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Email", "Subject", "Status", "Received"]
    }

    fn cells(c: &ContactSubmission) -> AnyView {
        view! {
            <td class=unread_class(c.is_read)>{c.name.clone()}</td>
            <td>{c.email.clone()}</td>
            <td>{opt(&c.subject)}</td>
            <td>{status_badge(c.is_read, "Read", "New")}</td>
            <td>{format_day(c.created_at)}</td>
        }
        .into_any()
    }

    fn detail(c: &ContactSubmission) -> AnyView {
        view! {
            <div class="space-y-2">
                {detail_row("Email", c.email.clone())}
                {detail_row("Phone", opt(&c.phone))}
                {detail_row("Subject", opt(&c.subject))}
                {detail_row("Message", c.message.clone())}
                {detail_row("Received", format_day(c.created_at))}
            </div>
        }
        .into_any()
    }

    fn toggle_label(c: &ContactSubmission) -> &'static str {
        read_label(c.is_read)
    }
}

// =========================================================
// 求职申请
// =========================================================

#[derive(Clone, Copy)]
pub struct CareersView;

impl EntityView for CareersView {
    type Item = CareerSubmission;
    type Draft = ReadPatch;
    type Service = CareerService<FetchClient, CookieTokenStore>;

    fn service(api: BrowserApi) -> Self::Service {
        CareerService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Email", "Position", "Status", "Received"]
    }

    fn cells(c: &CareerSubmission) -> AnyView {
        view! {
            <td class=unread_class(c.is_read)>{c.name.clone()}</td>
            <td>{c.email.clone()}</td>
            <td>{c.position.clone()}</td>
            <td>{status_badge(c.is_read, "Read", "New")}</td>
            <td>{format_day(c.created_at)}</td>
        }
        .into_any()
    }

    fn detail(c: &CareerSubmission) -> AnyView {
        let resume = c.resume_url.clone().map(|href| {
            view! {
                <a href=href target="_blank" rel="noopener" class="link link-primary text-sm">
                    "Open resume"
                </a>
            }
        });
        view! {
            <div class="space-y-2">
                {detail_row("Email", c.email.clone())}
                {detail_row("Phone", opt(&c.phone))}
                {detail_row("Position", c.position.clone())}
                {detail_row("Cover letter", opt(&c.cover_letter))}
                {detail_row("Received", format_day(c.created_at))}
                {resume}
            </div>
        }
        .into_any()
    }

    fn toggle_label(c: &CareerSubmission) -> &'static str {
        read_label(c.is_read)
    }
}

// =========================================================
// 资料索取
// =========================================================

#[derive(Clone, Copy)]
pub struct BrochuresView;

impl EntityView for BrochuresView {
    type Item = BrochureRequest;
    type Draft = NoDraft;
    type Service = BrochureService<FetchClient, CookieTokenStore>;

    fn service(api: BrowserApi) -> Self::Service {
        BrochureService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Email", "Company", "Requested"]
    }

    fn cells(b: &BrochureRequest) -> AnyView {
        view! {
            <td class="font-medium">{b.name.clone()}</td>
            <td>{b.email.clone()}</td>
            <td>{opt(&b.company)}</td>
            <td>{format_day(b.created_at)}</td>
        }
        .into_any()
    }

    fn detail(b: &BrochureRequest) -> AnyView {
        view! {
            <div class="space-y-2">
                {detail_row("Email", b.email.clone())}
                {detail_row("Phone", opt(&b.phone))}
                {detail_row("Company", opt(&b.company))}
                {detail_row("Requested", format_day(b.created_at))}
            </div>
        }
        .into_any()
    }
}

// =========================================================
// 后台用户
// =========================================================

#[derive(Clone, Copy)]
pub struct UsersView;

impl EntityView for UsersView {
    type Item = User;
    type Draft = UserDraft;
    type Service = UserService<FetchClient, CookieTokenStore>;

    const HAS_FORM: bool = true;

    fn service(api: BrowserApi) -> Self::Service {
        UserService::new(api)
    }

    fn columns() -> &'static [&'static str] {
        &["Email", "Name", "Role", "Created"]
    }

    fn cells(u: &User) -> AnyView {
        view! {
            <td class="font-medium">{u.email.clone()}</td>
            <td>{opt(&u.name)}</td>
            <td><span class="badge badge-neutral">{u.role.as_str()}</span></td>
            <td>{format_day(u.created_at)}</td>
        }
        .into_any()
    }

    fn detail(u: &User) -> AnyView {
        view! {
            <div class="space-y-2">
                {detail_row("Name", opt(&u.name))}
                {detail_row("Role", u.role.to_string())}
                {detail_row("Created", format_day(u.created_at))}
            </div>
        }
        .into_any()
    }

    fn form(draft: RwSignal<UserDraft>, mode: DraftMode) -> AnyView {
        // 编辑只改角色
        let account = (mode == DraftMode::Create).then(|| {
            view! {
                {text_field("u_email", "Email", draft, |d| d.email.clone(), |d, v| d.email = v)}
                {text_field("u_name", "Name", draft, |d| d.name.clone(), |d, v| d.name = v)}
                <div class="form-control">
                    <label for="u_password" class="label">
                        <span class="label-text">"Password"</span>
                    </label>
                    <input id="u_password"
                        type="password"
                        autocomplete="new-password"
                        on:input=move |ev| draft.update(|d| d.password = event_target_value(&ev))
                        prop:value=move || draft.with(|d| d.password.clone())
                        class="input input-bordered w-full"
                    />
                </div>
            }
        });
        let email = (mode == DraftMode::Update)
            .then(|| detail_row("Email", draft.with_untracked(|d| d.email.clone())));

        view! {
            {account}
            {email}
            <div class="form-control">
                <label for="u_role" class="label">
                    <span class="label-text">"Role"</span>
                </label>
                <select id="u_role"
                    class="select select-bordered w-full"
                    on:change=move |ev| {
                        if let Some(role) = Role::parse(&event_target_value(&ev)) {
                            draft.update(|d| d.role = role);
                        }
                    }
                    prop:value=move || draft.with(|d| d.role.as_str())
                >
                    {Role::ALL.iter().map(|r| view! { <option value=r.as_str()>{r.as_str()}</option> }).collect_view()}
                </select>
            </div>
        }
        .into_any()
    }
}
