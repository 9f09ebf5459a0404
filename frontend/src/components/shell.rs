//! 页面外框：导航栏与页脚

use leptos::prelude::*;
use linkgate_shared::format_money;

use crate::api::use_api;
use crate::auth::{logout, use_auth};
use crate::components::icons::{LinkIcon, LogOut, MenuIcon};
use crate::web::layout::use_breakpoint;
use crate::web::router::Link;

#[component]
fn NavLinks(is_authenticated: Signal<bool>, is_admin: Signal<bool>) -> impl IntoView {
    view! {
        <Link to="/cpm-rates">"CPM Rates"</Link>
        <Show when=move || is_authenticated.get()>
            <Link to="/dashboard">"Dashboard"</Link>
            <Link to="/stats">"Stats"</Link>
            <Link to="/payouts">"Payouts"</Link>
            <Link to="/profile">"Profile"</Link>
        </Show>
        <Show when=move || is_admin.get()>
            <Link to="/admin">"Admin"</Link>
        </Show>
    }
}

#[component]
pub fn NavBar() -> impl IntoView {
    let auth = use_auth();
    let api = use_api();
    let breakpoint = use_breakpoint();
    let menu_open = RwSignal::new(false);

    let is_authenticated = auth.is_authenticated_signal();
    let is_admin = auth.is_admin_signal();
    let balance = move || {
        auth.session
            .with(|s| s.user.as_ref().map(|u| format_money(u.balance)))
    };

    let api = StoredValue::new_local(api);
    let on_logout = move |_| logout(auth, &api.get_value());

    view! {
        <div class="navbar bg-base-100 shadow-md px-4">
            <div class="flex-1 gap-2">
                <Link to="/" class="btn btn-ghost text-xl gap-2">
                    <LinkIcon attr:class="h-6 w-6 text-primary" />
                    "LinkGate"
                </Link>
            </div>
            <div class="flex-none gap-2">
                {move || {
                    if breakpoint.get().is_mobile() {
                        view! {
                            <button
                                class="btn btn-ghost btn-square"
                                on:click=move |_| menu_open.update(|open| *open = !*open)
                            >
                                <MenuIcon attr:class="h-5 w-5" />
                            </button>
                        }
                            .into_any()
                    } else {
                        view! {
                            <div class="menu menu-horizontal gap-1 items-center">
                                <NavLinks is_authenticated=is_authenticated is_admin=is_admin />
                            </div>
                        }
                            .into_any()
                    }
                }}
                <Show
                    when=move || is_authenticated.get()
                    fallback=|| {
                        view! {
                            <Link to="/login" class="btn btn-ghost btn-sm">"Sign in"</Link>
                            <Link to="/register" class="btn btn-primary btn-sm">"Get started"</Link>
                        }
                    }
                >
                    <span class="badge badge-success badge-outline hidden sm:inline-flex">
                        {balance}
                    </span>
                    <button on:click=on_logout class="btn btn-outline btn-error btn-sm gap-2">
                        <LogOut attr:class="h-4 w-4" />
                        "Sign out"
                    </button>
                </Show>
            </div>
        </div>
        <Show when=move || menu_open.get() && breakpoint.get().is_mobile()>
            <div
                class="menu bg-base-100 shadow-md flex flex-col gap-2 px-4 py-2"
                on:click=move |_| menu_open.set(false)
            >
                <NavLinks is_authenticated=is_authenticated is_admin=is_admin />
            </div>
        </Show>
    }
}

#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer class="footer footer-center p-6 bg-base-300 text-base-content/70 text-sm">
            <nav class="flex gap-4">
                <Link to="/terms">"Terms"</Link>
                <Link to="/contact">"Contact"</Link>
                <Link to="/cpm-rates">"Rates"</Link>
            </nav>
            <p>"LinkGate - shorten links, earn from every visit."</p>
        </footer>
    }
}

/// 页面外框，内容区撑满剩余高度
#[component]
pub fn Shell(children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen flex flex-col bg-base-200 font-sans">
            <NavBar />
            <main class="flex-1 w-full max-w-6xl mx-auto p-4 md:p-8">{children()}</main>
            <Footer />
        </div>
    }
}
