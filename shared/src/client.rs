//! HTTP 客户端封装
//!
//! 在传输层 (`HttpClient`) 之上提供：
//! - 统一的 API 根地址
//! - 会话存在时附加 `Authorization: Bearer <token>`
//! - 白名单只读接口的短时缓存（默认 60 秒）与并发请求合并
//! - 401 时清空会话并通知上层（前端借此跳转登录页）
//!
//! 页面拿到的数据最多可能滞后一个缓存周期。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::config::ClientConfig;
use crate::date::{Clock, SystemClock, Timestamp};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::protocol::{self, ApiRequest};
use crate::session::{KeyValueStore, Session, SessionStore};
use crate::{HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, User};

#[cfg(test)]
mod tests;

type PendingResponse = Shared<LocalBoxFuture<'static, ApiResult<HttpResponse>>>;

/// 用户资料接口，余额等信息会随写操作变化，写操作后总是失效
const USER_PATH: &str = "/auth/me";

struct CacheEntry {
    stored_at: Timestamp,
    response: HttpResponse,
}

struct ClientInner<C, S> {
    base_url: String,
    transport: C,
    session: SessionStore<S>,
    clock: Box<dyn Clock>,
    cache_ttl: Duration,
    cache: RefCell<HashMap<String, CacheEntry>>,
    in_flight: RefCell<HashMap<String, PendingResponse>>,
    on_unauthorized: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<C, S: KeyValueStore> ClientInner<C, S> {
    fn handle_unauthorized(&self) {
        log_warn!("[Api] Session rejected by server, clearing local session");
        self.session.clear();
        self.cache.borrow_mut().clear();

        // 先取出回调再调用，回调中可能再次访问客户端
        let hook = self.on_unauthorized.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// API 客户端
///
/// 克隆开销很小（内部为 `Rc`），所有克隆共享缓存与会话。
pub struct ApiClient<C, S> {
    inner: Rc<ClientInner<C, S>>,
}

impl<C, S> Clone for ApiClient<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C, S> ApiClient<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    pub fn new(config: &ClientConfig, transport: C, store: S) -> Self {
        Self::with_clock(config, transport, store, SystemClock)
    }

    pub fn with_clock(
        config: &ClientConfig,
        transport: C,
        store: S,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                base_url: config.api_base.trim_end_matches('/').to_string(),
                transport,
                session: SessionStore::new(store),
                clock: Box::new(clock),
                cache_ttl: config.cache_ttl,
                cache: RefCell::new(HashMap::new()),
                in_flight: RefCell::new(HashMap::new()),
                on_unauthorized: RefCell::new(None),
            }),
        }
    }

    /// 注册 401 回调（只保留最后一个）
    pub fn set_unauthorized_handler(&self, handler: impl Fn() + 'static) {
        *self.inner.on_unauthorized.borrow_mut() = Some(Rc::new(handler));
    }

    // --- 会话 ---

    pub fn session(&self) -> Session {
        self.inner.session.load()
    }

    pub fn sign_in(&self, token: String, user: User) {
        self.inner.session.save(&Session {
            token: Some(token),
            user: Some(user),
        });
        self.clear_cache();
    }

    pub fn sign_out(&self) {
        self.inner.session.clear();
        self.clear_cache();
    }

    /// 更新缓存在本地的用户资料（如资料修改、重新拉取后）
    pub fn update_user(&self, user: &User) {
        self.inner.session.save_user(user);
        self.inner.cache.borrow_mut().remove(USER_PATH);
    }

    // --- 缓存 ---

    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    pub fn invalidate(&self, path: &str) {
        self.inner.cache.borrow_mut().remove(path);
    }

    fn invalidate_scope(&self, path: &str) {
        let scope = protocol::cache_scope(path);
        self.inner
            .cache
            .borrow_mut()
            .retain(|key, _| protocol::cache_scope(key) != scope && key != USER_PATH);
    }

    fn cached(&self, path: &str) -> Option<HttpResponse> {
        let now = self.inner.clock.now();
        let mut cache = self.inner.cache.borrow_mut();
        match cache.get(path) {
            Some(entry) if now - entry.stored_at < self.inner.cache_ttl => {
                Some(entry.response.clone())
            }
            Some(_) => {
                cache.remove(path);
                None
            }
            None => None,
        }
    }

    fn store(&self, path: &str, response: &HttpResponse) {
        let entry = CacheEntry {
            stored_at: self.inner.clock.now(),
            response: response.clone(),
        };
        self.inner.cache.borrow_mut().insert(path.to_string(), entry);
    }

    // --- 请求 ---

    pub async fn get(&self, path: &str) -> ApiResult<HttpResponse> {
        self.execute(HttpMethod::Get, path, None, Vec::new()).await
    }

    pub async fn post(&self, path: &str, body: Option<String>) -> ApiResult<HttpResponse> {
        self.execute(HttpMethod::Post, path, body, Vec::new()).await
    }

    pub async fn put(&self, path: &str, body: Option<String>) -> ApiResult<HttpResponse> {
        self.execute(HttpMethod::Put, path, body, Vec::new()).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<HttpResponse> {
        self.execute(HttpMethod::Delete, path, None, Vec::new()).await
    }

    /// 发送类型化请求并解析响应
    pub async fn send<R: ApiRequest>(&self, req: &R) -> ApiResult<R::Response> {
        let path = req.path();
        let body = match R::METHOD {
            HttpMethod::Get => None,
            _ => Some(serde_json::to_string(req)?),
        };
        let response = self.execute(R::METHOD, &path, body, req.headers()).await?;
        response.json::<R::Response>()
    }

    /// 只有 2xx 响应返回 Ok
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        headers: Vec<(&'static str, String)>,
    ) -> ApiResult<HttpResponse> {
        if method == HttpMethod::Get && protocol::is_cacheable(path) {
            return self.fetch_shared(path).await;
        }

        let result =
            Self::dispatch(Rc::clone(&self.inner), method, path.to_string(), body, headers).await;

        if method.is_mutation() && result.is_ok() {
            self.invalidate_scope(path);
        }
        result
    }

    /// 白名单 GET：先查缓存，再加入（或发起）进行中的同路径请求
    async fn fetch_shared(&self, path: &str) -> ApiResult<HttpResponse> {
        if let Some(hit) = self.cached(path) {
            return Ok(hit);
        }

        let pending = {
            let mut in_flight = self.inner.in_flight.borrow_mut();
            match in_flight.get(path) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = Self::dispatch(
                        Rc::clone(&self.inner),
                        HttpMethod::Get,
                        path.to_string(),
                        None,
                        Vec::new(),
                    )
                    .boxed_local()
                    .shared();
                    in_flight.insert(path.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        {
            let mut in_flight = self.inner.in_flight.borrow_mut();
            if in_flight.get(path).is_some_and(|p| p.ptr_eq(&pending)) {
                in_flight.remove(path);
            }
        }

        if let Ok(response) = &result {
            self.store(path, response);
        }
        result
    }

    async fn dispatch(
        inner: Rc<ClientInner<C, S>>,
        method: HttpMethod,
        path: String,
        body: Option<String>,
        headers: Vec<(&'static str, String)>,
    ) -> ApiResult<HttpResponse> {
        let url = format!("{}{}", inner.base_url, path);
        let mut req = HttpRequest::new(&url, method).with_header("Accept", "application/json");

        if let Some(token) = inner.session.token() {
            req = req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
        }
        for (key, value) in &headers {
            req = req.with_header(key, value);
        }
        if let Some(body) = body {
            req = req
                .with_header(HEADER_CONTENT_TYPE, "application/json")
                .with_body(body);
        }

        let response = inner.transport.send(req).await.map_err(|e| {
            log_error!("[Api] {} {} failed: {}", method.as_str(), path, e);
            e
        })?;

        if response.status == 401 {
            inner.handle_unauthorized();
            return Err(ApiError::from_response(response.status, &response.body));
        }
        if !response.ok() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        Ok(response)
    }
}
