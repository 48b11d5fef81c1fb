//! 受保护页面的外框：按角色过滤的侧边栏、当前用户与注销按钮

use crate::auth::{logout, use_auth};
use crate::components::icons::{LayoutDashboard, LogOut};
use crate::components::toast::ToastHost;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use siteadmin::navigation;

#[component]
pub fn Layout(children: Children) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let nav_items = move || auth.state.with(|s| navigation(&s.permissions()));
    let user_name = move || {
        auth.state
            .with(|s| s.user.as_ref().map(|u| u.display_name().to_string()))
            .unwrap_or_default()
    };
    let user_role = move || {
        auth.state
            .with(|s| s.user.as_ref().map(|u| u.role.as_str()))
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-base-200 font-sans flex">
            <ToastHost />

            <aside class="w-64 bg-base-100 shadow-xl hidden md:flex flex-col">
                <div class="p-6 flex items-center gap-2">
                    <LayoutDashboard attr:class="text-primary h-6 w-6" />
                    <span class="text-xl font-bold">"Site Admin"</span>
                </div>
                <ul class="menu p-4 flex-1 gap-1">
                    <For
                        each=nav_items
                        key=|item| item.route
                        children=move |item| {
                            let class = Signal::derive(move || {
                                if router.current_route().get() == item.route {
                                    "active".to_string()
                                } else {
                                    String::new()
                                }
                            });
                            view! {
                                <li>
                                    <Link to=item.route class=class>
                                        {item.label}
                                    </Link>
                                </li>
                            }
                        }
                    />
                </ul>
            </aside>

            <div class="flex-1 p-4 md:p-8 space-y-8">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2 px-2">
                        <span class="font-semibold">{user_name}</span>
                        <span class="badge badge-neutral">{user_role}</span>
                    </div>
                    <div class="flex-none">
                        <button
                            on:click=move |_| logout(&auth)
                            class="btn btn-outline btn-error gap-2"
                        >
                            <LogOut attr:class="h-4 w-4" />
                            "Sign Out"
                        </button>
                    </div>
                </div>

                {children()}
            </div>
        </div>
    }
}
