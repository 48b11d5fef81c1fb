use crate::auth::{logout, use_auth};
use crate::components::icons::RefreshCw;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use siteadmin::{DashboardService, ResourceCount, Route};

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    let (counts, set_counts) = signal(Vec::<ResourceCount>::new());
    let (loading, set_loading) = signal(true);

    let load_counts = move || {
        let service = DashboardService::new(auth.api());
        let permissions = auth.permissions();
        set_loading.set(true);
        spawn_local(async move {
            match service.summary(&permissions).await {
                // 页面可能已经卸载
                Ok(summary) => {
                    let _ = set_counts.try_set(summary);
                }
                // token 失效，守卫会跳回登录页
                Err(_) => logout(&auth),
            }
            let _ = set_loading.try_set(false);
        });
    };

    // 初始加载
    load_counts();

    let greeting = move || {
        auth.state
            .with(|s| s.user.as_ref().map(|u| format!("Welcome back, {}", u.display_name())))
            .unwrap_or_default()
    };

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <div>
                    <h2 class="text-2xl font-bold">"Dashboard"</h2>
                    <p class="text-base-content/70 text-sm">{greeting}</p>
                </div>
                <button
                    on:click=move |_| load_counts()
                    disabled=move || loading.get()
                    class="btn btn-ghost btn-circle"
                >
                    <RefreshCw attr:class=move || {
                        if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" }
                    } />
                </button>
            </div>

            <div class="grid gap-4 grid-cols-1 md:grid-cols-2 xl:grid-cols-3">
                <For
                    each=move || counts.get()
                    key=|c| (c.kind, c.count)
                    children=move |c| {
                        let value = c.count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
                        view! {
                            <div class="stat bg-base-100 shadow rounded-box">
                                <div class="stat-title">{c.kind.title()}</div>
                                <div class="stat-value text-primary">{value}</div>
                                <div class="stat-desc">
                                    <Link to=Route::for_resource(c.kind) class="link link-hover">
                                        "Manage"
                                    </Link>
                                </div>
                            </div>
                        }
                    }
                />
            </div>

            <Show when=move || loading.get() && counts.with(|c| c.is_empty())>
                <div class="text-center py-8 text-base-content/50">
                    <span class="loading loading-spinner loading-md"></span>
                    " Loading..."
                </div>
            </Show>
        </div>
    }
}
