//! 认证模块
//!
//! 管理用户认证状态，与路由系统解耦。
//! 路由服务通过注入的认证信号来检查认证状态。
//! 持久化由 `ApiClient` 内的 `SessionStore` 负责，这里只维护响应式副本。

use leptos::prelude::*;
use linkgate_shared::error::ApiResult;
use linkgate_shared::protocol::{
    CurrentUserRequest, LoginRequest, RegisterRequest, ResendCodeRequest, VerifyEmailRequest,
};
use linkgate_shared::{MessageResponse, Session, User};

use crate::api::Api;

/// 认证上下文
///
/// 会话信号通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub session: RwSignal<Session>,
}

impl AuthContext {
    /// 从持久化存储恢复会话
    pub fn new(api: &Api) -> Self {
        Self {
            session: RwSignal::new(api.session()),
        }
    }

    /// 获取认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(Session::is_authenticated))
    }

    pub fn is_admin_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(Session::is_admin))
    }

    pub fn user(&self) -> Option<User> {
        self.session.with(|s| s.user.clone())
    }

    fn set_user(&self, user: User) {
        self.session.update(|s| s.user = Some(user));
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 登录并保存会话
pub async fn login(ctx: AuthContext, api: &Api, email: String, password: String) -> ApiResult<()> {
    let resp = api.send(&LoginRequest { email, password }).await?;
    api.sign_in(resp.token, resp.user);
    ctx.session.set(api.session());
    Ok(())
}

/// 注册只会发送验证码，不会登录
pub async fn register(api: &Api, email: String, password: String) -> ApiResult<MessageResponse> {
    api.send(&RegisterRequest { email, password }).await
}

/// 验证邮箱，成功后直接登录
pub async fn verify_email(ctx: AuthContext, api: &Api, email: String, code: String) -> ApiResult<()> {
    let resp = api.send(&VerifyEmailRequest { email, code }).await?;
    api.sign_in(resp.token, resp.user);
    ctx.session.set(api.session());
    Ok(())
}

pub async fn resend_code(api: &Api, email: String) -> ApiResult<MessageResponse> {
    api.send(&ResendCodeRequest { email }).await
}

/// 重新拉取用户资料（余额等）
pub async fn refresh_user(ctx: AuthContext, api: &Api) -> ApiResult<User> {
    let user = api.send(&CurrentUserRequest).await?;
    api.update_user(&user);
    ctx.set_user(user.clone());
    Ok(user)
}

/// 用接口返回的新资料替换本地副本
pub fn store_user(ctx: AuthContext, api: &Api, user: User) {
    api.update_user(&user);
    ctx.set_user(user);
}

/// 服务端拒绝 token（401）时清空会话，再交给 `on_expired` 处理导航
pub fn on_session_expired(ctx: AuthContext, api: &Api, on_expired: impl Fn() + 'static) {
    let session = ctx.session;
    api.set_unauthorized_handler(move || {
        web_sys::console::log_1(&"[Auth] Session expired, signing out.".into());
        session.set(Session::default());
        on_expired();
    });
}

/// 注销并清除状态
///
/// 导航将由路由服务的认证状态监听自动处理。
pub fn logout(ctx: AuthContext, api: &Api) {
    api.sign_out();
    ctx.session.set(Session::default());
}
