//! LinkGate 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `api`: 共享的 API 客户端
//! - `auth`: 认证状态管理
//! - `components`: UI 组件层

mod api;
mod auth;
mod components {
    pub mod admin;
    pub mod common;
    pub mod contact;
    pub mod cpm_rates;
    pub mod dashboard;
    pub mod home;
    mod icons;
    pub mod login;
    pub mod payouts;
    pub mod profile;
    pub mod register;
    pub mod shell;
    pub mod stats;
    pub mod terms;
    pub mod unlock;
    pub mod verify;
}

use crate::api::{provide_api, use_api};
use crate::auth::{AuthContext, on_session_expired, use_auth};
use crate::components::admin::AdminPage;
use crate::components::contact::ContactPage;
use crate::components::cpm_rates::CpmRatesPage;
use crate::components::dashboard::DashboardPage;
use crate::components::home::HomePage;
use crate::components::login::LoginPage;
use crate::components::payouts::PayoutsPage;
use crate::components::profile::ProfilePage;
use crate::components::register::RegisterPage;
use crate::components::shell::Shell;
use crate::components::stats::StatsPage;
use crate::components::terms::TermsPage;
use crate::components::unlock::UnlockPage;
use crate::components::verify::VerifyPage;

use leptos::prelude::*;

// 浏览器平台适配：HTTP、本地存储、定时器、路由与布局
pub(crate) mod web {
    mod http;
    pub mod layout;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use http::FetchClient;
    pub use storage::BrowserStore;
    pub use timer::BrowserScheduler;
}

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet, use_router};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    let page = match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <RegisterPage /> }.into_any(),
        AppRoute::Verify => view! { <VerifyPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::Stats => view! { <StatsPage /> }.into_any(),
        AppRoute::CpmRates => view! { <CpmRatesPage /> }.into_any(),
        AppRoute::Admin => view! { <AdminPage /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::Payouts => view! { <PayoutsPage /> }.into_any(),
        AppRoute::Terms => view! { <TermsPage /> }.into_any(),
        AppRoute::Contact => view! { <ContactPage /> }.into_any(),
        AppRoute::Unlock(code) => view! { <UnlockPage short_code=code /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center py-24">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to="/" class="btn btn-ghost mt-6">"Back to home"</Link>
                </div>
            </div>
        }
        .into_any(),
    };

    view! { <Shell>{page}</Shell> }.into_any()
}

/// 401 时清空会话并回到登录页；需要放在 `Router` 内部
#[component]
fn SessionExpiry() -> impl IntoView {
    let router = use_router();
    on_session_expired(use_auth(), &use_api(), move || router.redirect_unauthorized());
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建 API 客户端（缓存与会话存储都在其中）
    let api = provide_api();

    // 2. 从 LocalStorage 恢复会话
    let auth_ctx = AuthContext::new(&api.client());
    provide_context(auth_ctx);

    // 3. 认证信号注入路由服务，用于守卫
    let is_authenticated = auth_ctx.is_authenticated_signal();
    let is_admin = auth_ctx.is_admin_signal();

    view! {
        <Router is_authenticated=is_authenticated is_admin=is_admin>
            <SessionExpiry />
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
