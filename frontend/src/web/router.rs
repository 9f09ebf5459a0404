//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 验证 -> 处理 -> 加载"的导航流程。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::AppRoute;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 读取当前 URL 查询串中的参数
pub fn query_param(name: &str) -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;
    params.get(name).filter(|v| !v.is_empty())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

fn scroll_to_top() {
    if let Some(window) = web_sys::window() {
        window.scroll_to_with_x_and_y(0.0, 0.0);
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 认证与管理员状态以信号形式注入，与认证系统解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    is_authenticated: Signal<bool>,
    is_admin: Signal<bool>,
}

impl RouterService {
    fn new(is_authenticated: Signal<bool>, is_admin: Signal<bool>) -> Self {
        let (current_route, set_route) = signal(AppRoute::from_path(&current_path()));

        Self {
            current_route,
            set_route,
            is_authenticated,
            is_admin,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// **核心方法：导航与守卫**
    ///
    /// `path` 可以带查询串（如 `/verify?email=...`），查询串原样写入 History。
    pub fn navigate(&self, path: &str) {
        let target_route = AppRoute::from_path(path);
        self.navigate_to_route(target_route, path, true);
    }

    /// 用 replaceState 导航，不产生新的历史记录
    pub fn replace(&self, path: &str) {
        let target_route = AppRoute::from_path(path);
        self.navigate_to_route(target_route, path, false);
    }

    fn navigate_to_route(&self, target_route: AppRoute, path: &str, use_push: bool) {
        let is_auth = self.is_authenticated.get_untracked();
        let is_admin = self.is_admin.get_untracked();

        // --- Step 1: 验证目标路由 ---
        if let Some(redirect) = target_route.guard(is_auth, is_admin) {
            web_sys::console::log_1(
                &format!("[Router] Access to {} denied. Redirecting to {}.", target_route, redirect)
                    .into(),
            );
            self.commit(redirect.clone(), &redirect.to_path(), use_push);
            return;
        }

        // --- Step 2: 加载页面 (更新状态) ---
        self.commit(target_route, path, use_push);
    }

    /// 会话被服务端拒绝后离开当前页面（已在登录页时不动）
    pub fn redirect_unauthorized(&self) {
        let route = self.current_route.get_untracked();
        if let Some(target) = route.after_unauthorized() {
            web_sys::console::log_1(
                &format!("[Router] Session rejected on {}, redirecting to {}.", route, target).into(),
            );
            self.replace(&target.to_path());
        }
    }

    fn commit(&self, route: AppRoute, path: &str, use_push: bool) {
        if use_push {
            push_history_state(path);
        } else {
            replace_history_state(path);
        }
        self.set_route.set(route);
        scroll_to_top();
    }

    /// 首次加载时对当前地址执行一次守卫
    fn guard_initial_route(&self) {
        let path = current_path();
        let route = AppRoute::from_path(&path);
        if let Some(redirect) =
            route.guard(self.is_authenticated.get_untracked(), self.is_admin.get_untracked())
        {
            web_sys::console::log_1(
                &format!("[Router] Initial route {} denied. Redirecting to {}.", route, redirect)
                    .into(),
            );
            replace_history_state(&redirect.to_path());
            self.set_route.set(redirect);
        }
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let is_authenticated = self.is_authenticated;
        let is_admin = self.is_admin;

        let closure = Closure::<dyn Fn()>::new(move || {
            let target_route = AppRoute::from_path(&current_path());

            // popstate 时也执行守卫逻辑
            match target_route.guard(is_authenticated.get_untracked(), is_admin.get_untracked()) {
                Some(redirect) => {
                    replace_history_state(&redirect.to_path());
                    set_route.set(redirect);
                }
                None => set_route.set(target_route),
            }
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 设置认证状态变化时的自动重定向
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let is_authenticated = self.is_authenticated;
        let is_admin = self.is_admin;

        Effect::new(move |_| {
            let is_auth = is_authenticated.get();
            let admin = is_admin.get();
            let route = current_route.get_untracked();

            if let Some(redirect) = route.guard(is_auth, admin) {
                web_sys::console::log_1(
                    &format!(
                        "[Router] Auth state changed (authenticated: {}), redirecting to {}.",
                        is_auth, redirect
                    )
                    .into(),
                );
                push_history_state(&redirect.to_path());
                set_route.set(redirect);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(is_authenticated: Signal<bool>, is_admin: Signal<bool>) -> RouterService {
    let router = RouterService::new(is_authenticated, is_admin);

    router.guard_initial_route();
    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

/// 导航函数（返回一个可调用的闭包）
pub fn use_navigate() -> impl Fn(&str) + Clone {
    let router = use_router();
    move |to: &str| {
        router.navigate(to);
    }
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 认证状态信号
    is_authenticated: Signal<bool>,
    /// 管理员状态信号
    is_admin: Signal<bool>,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(is_authenticated, is_admin);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

/// 站内链接：拦截点击改走 History API，带修饰键时交给浏览器处理
#[component]
pub fn Link(
    /// 目标路径
    #[prop(into)]
    to: String,
    #[prop(into, optional)] class: String,
    /// 子内容
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        if ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
