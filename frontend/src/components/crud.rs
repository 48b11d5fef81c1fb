//! 通用资源页面
//!
//! 状态机在核心库的 `CrudController` 中；这里只负责把状态渲染成表格、弹窗和删除确认框，
//! 每种资源的列、表单和详情由 [`EntityView`] 提供。

use crate::api::BrowserApi;
use crate::auth::{logout, use_auth};
use crate::components::icons::{Check, Eye, Pencil, Plus, RefreshCw, Trash2};
use crate::components::toast::use_toasts;
use leptos::prelude::*;
use leptos::task::spawn_local;
use siteadmin::{CrudController, Modal, PageState, ResourceService};
use siteadmin_shared::{DraftMode, Record, Validate};
use std::rc::Rc;

/// 一种资源在界面上的呈现方式
pub trait EntityView: Copy + Send + Sync + 'static {
    type Item: Record + Clone + PartialEq + Send + Sync + 'static;
    type Draft: Validate + Clone + Default + Send + Sync + 'static;
    type Service: ResourceService<Item = Self::Item, Draft = Self::Draft> + 'static;

    /// 是否提供创建 / 编辑表单
    const HAS_FORM: bool = false;

    fn service(api: BrowserApi) -> Self::Service;

    fn columns() -> &'static [&'static str];

    /// 一行中的各个 `<td>`
    fn cells(item: &Self::Item) -> AnyView;

    fn detail(item: &Self::Item) -> AnyView;

    fn form(_draft: RwSignal<Self::Draft>, _mode: DraftMode) -> AnyView {
        ().into_any()
    }

    /// 行内切换按钮的文字
    fn toggle_label(_item: &Self::Item) -> &'static str {
        "Toggle"
    }
}

fn error_alert(message: String) -> impl IntoView {
    view! {
        <div role="alert" class="alert alert-error text-sm py-2">
            <span>{message}</span>
        </div>
    }
}

#[component]
pub fn ResourcePage<V: EntityView>(
    /// 资源的呈现方式，只用于确定类型
    entity: V,
) -> impl IntoView {
    let _ = entity;
    let auth = use_auth();
    let toasts = use_toasts();
    let kind = <V::Service as ResourceService>::KIND;

    let controller = Rc::new(CrudController::new(V::service(auth.api()), auth.permissions()));
    let caps = controller.caps();

    let (page, set_page) = signal(controller.state());
    controller.subscribe(move |s| {
        // 卸载后 signal 已释放，迟到的结果直接丢弃
        let _ = set_page.try_set(s.clone());
    });
    // token 失效：清空会话，路由守卫随后跳转登录页
    controller.on_unauthorized(move || logout(&auth));

    // 挂载即拉取
    {
        let controller = controller.clone();
        spawn_local(async move { controller.load().await });
    }

    let controller = StoredValue::new_local(controller);
    on_cleanup(move || {
        let _ = controller.try_with_value(|c| c.detach());
    });

    let draft = RwSignal::new(V::Draft::default());
    let items = Memo::new(move |_| page.with(|p| p.items().to_vec()));
    // 表单只在弹窗切换时重建，提交中和出错时保留输入状态
    let modal = Memo::new(move |_| page.with(|p| p.modal().cloned()));

    // =========================================================
    // 事件处理
    // =========================================================

    let on_reload = move |_| {
        if let Some(c) = controller.try_get_value() {
            spawn_local(async move { c.load().await });
        }
    };
    let on_create = move |_| {
        controller.with_value(|c| {
            if c.open_create().is_ok() {
                draft.set(V::Draft::default());
            }
        });
    };
    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(c) = controller.try_get_value() else {
            return;
        };
        let value = draft.get_untracked();
        spawn_local(async move {
            // 失败信息留在弹窗里
            if c.submit(value).await.is_ok() {
                toasts.success(format!("{} saved", kind.noun()));
            }
        });
    };
    let on_confirm_delete = move |_| {
        let Some(c) = controller.try_get_value() else {
            return;
        };
        spawn_local(async move {
            if c.confirm_delete().await.is_ok() {
                toasts.success(format!("{} deleted", kind.noun()));
            }
        });
    };
    let on_toggle = move |id: String| {
        let Some(c) = controller.try_get_value() else {
            return;
        };
        spawn_local(async move {
            match c.toggle(&id).await {
                Ok(()) => toasts.success("Status updated"),
                Err(e) => toasts.error(e.message().to_string()),
            }
        });
    };
    let on_edit = move |id: String| {
        controller.with_value(|c| {
            if c.open_edit(&id).is_ok() {
                draft.set(c.draft());
            }
        });
    };
    let on_view = move |id: String| {
        let _ = controller.with_value(|c| c.open_view(&id));
    };
    let on_delete = move |id: String| {
        let _ = controller.with_value(|c| c.request_delete(&id));
    };
    let on_cancel = move |_| controller.with_value(|c| c.cancel());
    let on_dismiss = move |_| controller.with_value(|c| c.dismiss_error());

    // =========================================================
    // 视图
    // =========================================================

    let busy = move || page.with(PageState::is_busy);

    let row_actions = move |item: &V::Item| {
        let id = item.id().to_string();
        let toggle_label = V::toggle_label(item);

        let toggle = caps.toggle.then(|| {
            let id = id.clone();
            view! {
                <button class="btn btn-ghost btn-sm gap-1" disabled=busy on:click=move |_| on_toggle(id.clone())>
                    <Check attr:class="h-4 w-4" />
                    {toggle_label}
                </button>
            }
        });
        let edit = (caps.update && V::HAS_FORM).then(|| {
            let id = id.clone();
            view! {
                <button class="btn btn-ghost btn-sm btn-square" title="Edit" on:click=move |_| on_edit(id.clone())>
                    <Pencil attr:class="h-4 w-4" />
                </button>
            }
        });
        let delete = caps.delete.then(|| {
            let id = id.clone();
            view! {
                <button class="btn btn-ghost btn-sm btn-square text-error" title="Delete" on:click=move |_| on_delete(id.clone())>
                    <Trash2 attr:class="h-4 w-4" />
                </button>
            }
        });

        view! {
            <div class="flex justify-end gap-1">
                <button class="btn btn-ghost btn-sm btn-square" title="View" on:click=move |_| on_view(id.clone())>
                    <Eye attr:class="h-4 w-4" />
                </button>
                {toggle}
                {edit}
                {delete}
            </div>
        }
    };

    let modal_error = move || page.with(|p| p.error().map(str::to_string)).map(error_alert);

    let form_body = move |mode: DraftMode| {
        let title = match mode {
            DraftMode::Create => format!("Add {}", kind.noun()),
            DraftMode::Update => format!("Edit {}", kind.noun()),
        };
        view! {
            <form on:submit=on_submit class="space-y-4">
                <h3 class="font-bold text-lg">{title}</h3>
                {modal_error}
                {V::form(draft, mode)}
                <div class="modal-action">
                    <button type="button" class="btn btn-ghost" on:click=on_cancel>"Cancel"</button>
                    <button type="submit" class="btn btn-primary" disabled=busy>
                        {move || if busy() { "Saving..." } else { "Save" }}
                    </button>
                </div>
            </form>
        }
        .into_any()
    };

    let modal_view = move || {
        let body = match modal.get()? {
            Modal::Create => form_body(DraftMode::Create),
            Modal::Edit(_) => form_body(DraftMode::Update),
            Modal::View(item) => view! {
                <div class="space-y-4">
                    <h3 class="font-bold text-lg">{item.label().to_string()}</h3>
                    {V::detail(&item)}
                    <div class="modal-action">
                        <button class="btn" on:click=on_cancel>"Close"</button>
                    </div>
                </div>
            }
            .into_any(),
            Modal::DeleteConfirm(item) => view! {
                <div class="space-y-4">
                    <h3 class="font-bold text-lg">{format!("Delete {}?", kind.noun())}</h3>
                    <p>
                        "This will permanently delete "
                        <span class="font-semibold">{item.label().to_string()}</span>
                        ". This cannot be undone."
                    </p>
                    {modal_error}
                    <div class="modal-action">
                        <button class="btn btn-ghost" on:click=on_cancel>"Cancel"</button>
                        <button class="btn btn-error" disabled=busy on:click=on_confirm_delete>
                            {move || if busy() { "Deleting..." } else { "Delete" }}
                        </button>
                    </div>
                </div>
            }
            .into_any(),
        };

        Some(view! {
            <div class="modal modal-open">
                <div class="modal-box max-w-2xl">{body}</div>
            </div>
        })
    };

    // 弹窗打开时错误显示在弹窗里
    let page_error = move || {
        page.with(|p| match p.modal() {
            Some(_) => None,
            None => p.error().map(str::to_string),
        })
    };
    let loading = Memo::new(move |_| page.with(PageState::is_loading));
    let is_loading = move || loading.get();
    let colspan = (V::columns().len() + 1).to_string();

    let rows = move || {
        let items = items.get();
        if is_loading() {
            return view! {
                <tr>
                    <td colspan=colspan.clone() class="text-center py-8 text-base-content/50">
                        <span class="loading loading-spinner loading-md"></span>
                        " Loading..."
                    </td>
                </tr>
            }
            .into_any();
        }
        if items.is_empty() {
            return view! {
                <tr>
                    <td colspan=colspan.clone() class="text-center py-8 text-base-content/50">
                        {format!("No {} yet.", kind.title().to_lowercase())}
                    </td>
                </tr>
            }
            .into_any();
        }
        items
            .iter()
            .map(|item| {
                view! {
                    <tr>
                        {V::cells(item)}
                        <td>{row_actions(item)}</td>
                    </tr>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <div>
                        <h3 class="card-title">{kind.title()}</h3>
                        <p class="text-base-content/70 text-sm">
                            {move || format!("{} total", items.with(Vec::len))}
                        </p>
                    </div>
                    <div class="flex gap-2">
                        <button on:click=on_reload disabled=is_loading class="btn btn-ghost btn-circle">
                            <RefreshCw attr:class=move || {
                                if is_loading() { "h-5 w-5 animate-spin" } else { "h-5 w-5" }
                            } />
                        </button>
                        {caps.create.then(|| view! {
                            <button on:click=on_create class="btn btn-primary gap-2">
                                <Plus attr:class="h-4 w-4" />
                                {format!("Add {}", kind.noun())}
                            </button>
                        })}
                    </div>
                </div>

                {move || page_error().map(|msg| view! {
                    <div role="alert" class="alert alert-error mx-6 w-auto">
                        <span class="flex-1">{msg}</span>
                        <button class="btn btn-ghost btn-xs" on:click=on_dismiss>"✕"</button>
                    </div>
                })}

                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                {V::columns().iter().map(|c| view! { <th>{*c}</th> }).collect_view()}
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                </div>
            </div>
        </div>
        {modal_view}
    }
}
