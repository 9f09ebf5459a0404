//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其访问条件。

use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 首页 (默认路由)
    #[default]
    Home,
    Login,
    Register,
    /// 邮箱验证，邮箱地址放在查询串 `?email=` 中
    Verify,
    Dashboard,
    Stats,
    CpmRates,
    Admin,
    Profile,
    Payouts,
    Terms,
    Contact,
    /// 解锁页 `/l/{short_code}`
    Unlock(String),
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举（忽略查询串和末尾的 `/`）
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');

        if let Some(code) = trimmed.strip_prefix("/l/") {
            if !code.is_empty() && !code.contains('/') {
                return Self::Unlock(code.to_string());
            }
            return Self::NotFound;
        }

        match trimmed {
            "" => Self::Home,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/verify" => Self::Verify,
            "/dashboard" => Self::Dashboard,
            "/stats" => Self::Stats,
            "/cpm-rates" => Self::CpmRates,
            "/admin" => Self::Admin,
            "/profile" => Self::Profile,
            "/payouts" => Self::Payouts,
            "/terms" => Self::Terms,
            "/contact" => Self::Contact,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        let path = match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Verify => "/verify",
            Self::Dashboard => "/dashboard",
            Self::Stats => "/stats",
            Self::CpmRates => "/cpm-rates",
            Self::Admin => "/admin",
            Self::Profile => "/profile",
            Self::Payouts => "/payouts",
            Self::Terms => "/terms",
            Self::Contact => "/contact",
            Self::Unlock(code) => return format!("/l/{}", code),
            Self::NotFound => "/404",
        };
        path.to_string()
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Dashboard | Self::Stats | Self::Profile | Self::Payouts | Self::Admin
        )
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }

    /// 服务端判定会话失效（401）后的去向：除登录页外一律回到登录页
    pub fn after_unauthorized(&self) -> Option<Self> {
        match self {
            Self::Login => None,
            _ => Some(Self::auth_failure_redirect()),
        }
    }

    /// 守卫判定：返回 `Some(目标)` 表示需要重定向
    pub fn guard(&self, is_authenticated: bool, is_admin: bool) -> Option<Self> {
        if self.requires_auth() && !is_authenticated {
            return Some(Self::auth_failure_redirect());
        }
        if self.requires_admin() && !is_admin {
            return Some(Self::auth_success_redirect());
        }
        if self.should_redirect_when_authenticated() && is_authenticated {
            return Some(Self::auth_success_redirect());
        }
        None
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/dashboard/"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/cpm-rates"), AppRoute::CpmRates);
        assert_eq!(AppRoute::from_path("/verify?email=a%40b.c"), AppRoute::Verify);
        assert_eq!(
            AppRoute::from_path("/l/abc123"),
            AppRoute::Unlock("abc123".to_string())
        );
        assert_eq!(AppRoute::from_path("/l/"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/l/a/b"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn test_path_round_trip() {
        for route in [
            AppRoute::Home,
            AppRoute::Payouts,
            AppRoute::Terms,
            AppRoute::Unlock("xyz".to_string()),
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_guest_is_sent_to_login() {
        for route in [
            AppRoute::Dashboard,
            AppRoute::Stats,
            AppRoute::Profile,
            AppRoute::Payouts,
            AppRoute::Admin,
        ] {
            assert_eq!(route.guard(false, false), Some(AppRoute::Login));
        }
    }

    #[test]
    fn test_public_routes_need_no_session() {
        for route in [
            AppRoute::Home,
            AppRoute::CpmRates,
            AppRoute::Terms,
            AppRoute::Contact,
            AppRoute::Verify,
            AppRoute::Unlock("abc".to_string()),
        ] {
            assert_eq!(route.guard(false, false), None);
            assert_eq!(route.guard(true, false), None);
        }
    }

    #[test]
    fn test_expired_session_returns_to_login() {
        assert_eq!(AppRoute::CpmRates.after_unauthorized(), Some(AppRoute::Login));
        assert_eq!(AppRoute::Home.after_unauthorized(), Some(AppRoute::Login));
        assert_eq!(AppRoute::Dashboard.after_unauthorized(), Some(AppRoute::Login));
        assert_eq!(AppRoute::Login.after_unauthorized(), None);
    }

    #[test]
    fn test_admin_requires_admin_user() {
        assert_eq!(AppRoute::Admin.guard(true, false), Some(AppRoute::Dashboard));
        assert_eq!(AppRoute::Admin.guard(true, true), None);
    }

    #[test]
    fn test_signed_in_user_leaves_login_and_register() {
        assert_eq!(AppRoute::Login.guard(true, false), Some(AppRoute::Dashboard));
        assert_eq!(AppRoute::Register.guard(true, false), Some(AppRoute::Dashboard));
        assert_eq!(AppRoute::Login.guard(false, false), None);
    }
}
