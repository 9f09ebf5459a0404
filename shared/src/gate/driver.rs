//! 解锁门驱动
//!
//! 把 `UnlockSession` 与后端请求、倒计时、跳转延时连接起来。
//! 页面卸载时调用 `teardown`：定时任务立即取消，之后返回的请求结果被丢弃。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{
    Acknowledgement, GateRejection, REDIRECT_DELAY, Step, TICK_INTERVAL, Tick, UnlockOutcome,
    UnlockSession,
};
use crate::LinkMetadata;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::http::HttpClient;
use crate::protocol::{ResolveLinkRequest, UnlockLinkRequest};
use crate::schedule::Scheduler;
use crate::session::KeyValueStore;

/// 解锁门需要的两个后端接口
#[async_trait::async_trait(?Send)]
pub trait UnlockBackend {
    async fn resolve(&self, short_code: &str) -> ApiResult<LinkMetadata>;

    /// 返回目标地址
    async fn unlock(&self, short_code: &str, captcha_token: Option<String>) -> ApiResult<String>;
}

#[async_trait::async_trait(?Send)]
impl<C, S> UnlockBackend for ApiClient<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    async fn resolve(&self, short_code: &str) -> ApiResult<LinkMetadata> {
        self.send(&ResolveLinkRequest {
            short_code: short_code.to_string(),
        })
        .await
    }

    async fn unlock(&self, short_code: &str, captcha_token: Option<String>) -> ApiResult<String> {
        let resp = self
            .send(&UnlockLinkRequest {
                short_code: short_code.to_string(),
                captcha_token,
            })
            .await?;
        Ok(resp.url)
    }
}

type Observer = Rc<dyn Fn(&UnlockSession)>;
type RedirectHook = Rc<dyn Fn(&str)>;

struct DriverInner<B, S: Scheduler> {
    session: RefCell<UnlockSession>,
    backend: B,
    scheduler: S,
    verification_enabled: bool,
    countdown_task: RefCell<Option<S::Handle>>,
    redirect_task: RefCell<Option<S::Handle>>,
    on_change: RefCell<Option<Observer>>,
    on_redirect: RefCell<Option<RedirectHook>>,
    torn_down: Cell<bool>,
}

impl<B, S: Scheduler> DriverInner<B, S> {
    fn notify(&self) {
        if self.torn_down.get() {
            return;
        }
        let observer = self.on_change.borrow().clone();
        if let Some(observer) = observer {
            observer(&self.session.borrow());
        }
    }

    fn on_tick(&self) {
        if self.torn_down.get() {
            return;
        }
        let tick = self.session.borrow_mut().tick();
        match tick {
            Tick::Remaining(_) => {}
            Tick::Elapsed => {
                log_info!("[Gate] Countdown finished");
                self.countdown_task.borrow_mut().take();
            }
            Tick::Ignored => {
                self.countdown_task.borrow_mut().take();
            }
        }
        self.notify();
    }

    fn fire_redirect(&self, url: &str) {
        if self.torn_down.get() {
            return;
        }
        let hook = self.on_redirect.borrow().clone();
        if let Some(hook) = hook {
            log_info!("[Gate] Redirecting to destination");
            hook(url);
        }
    }
}

/// 单个解锁页面的驱动器
///
/// 克隆共享同一会话。状态变化通过 `on_change` 通知，跳转通过 `on_redirect` 执行。
pub struct GateDriver<B, S: Scheduler> {
    inner: Rc<DriverInner<B, S>>,
}

impl<B, S: Scheduler> Clone for GateDriver<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B, S> GateDriver<B, S>
where
    B: UnlockBackend + 'static,
    S: Scheduler + 'static,
{
    pub fn new(short_code: &str, backend: B, scheduler: S, verification_enabled: bool) -> Self {
        Self {
            inner: Rc::new(DriverInner {
                session: RefCell::new(UnlockSession::new(short_code)),
                backend,
                scheduler,
                verification_enabled,
                countdown_task: RefCell::new(None),
                redirect_task: RefCell::new(None),
                on_change: RefCell::new(None),
                on_redirect: RefCell::new(None),
                torn_down: Cell::new(false),
            }),
        }
    }

    pub fn on_change(&self, observer: impl Fn(&UnlockSession) + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Rc::new(observer));
    }

    pub fn on_redirect(&self, hook: impl Fn(&str) + 'static) {
        *self.inner.on_redirect.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn snapshot(&self) -> UnlockSession {
        self.inner.session.borrow().clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    /// 解析短链元数据
    pub async fn load(&self) {
        let code = self.inner.session.borrow().short_code().to_string();
        log_info!("[Gate] Resolving link {}", code);

        let result = self.inner.backend.resolve(&code).await;
        if self.inner.torn_down.get() {
            return;
        }

        {
            let mut session = self.inner.session.borrow_mut();
            match result {
                Ok(link) => session.link_loaded(link, self.inner.verification_enabled),
                Err(e) => {
                    log_warn!("[Gate] Failed to resolve link {}: {}", code, e);
                    session.link_failed(&e);
                }
            }
        }
        self.inner.notify();
    }

    pub fn acknowledge_ad(&self) -> Acknowledgement {
        if self.inner.torn_down.get() {
            return Acknowledgement::Ignored;
        }
        let ack = self.inner.session.borrow_mut().acknowledge_ad();
        match ack {
            Acknowledgement::Ignored => return ack,
            Acknowledgement::CountdownStarted => self.start_countdown(),
            Acknowledgement::Acknowledged => {}
        }
        self.inner.notify();
        ack
    }

    fn start_countdown(&self) {
        if self.inner.countdown_task.borrow().is_some() {
            return;
        }
        let weak: Weak<DriverInner<B, S>> = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.repeat(
            TICK_INTERVAL,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_tick();
                }
            }),
        );
        *self.inner.countdown_task.borrow_mut() = Some(handle);
    }

    pub fn advance_step(&self) -> Result<Step, GateRejection> {
        if self.inner.torn_down.get() {
            return Err(GateRejection::NotReady);
        }
        let step = self.inner.session.borrow_mut().advance_step()?;
        self.inner.notify();
        Ok(step)
    }

    pub fn submit_verification(&self, token: &str) {
        if self.inner.torn_down.get() {
            return;
        }
        self.inner.session.borrow_mut().submit_verification(token);
        self.inner.notify();
    }

    pub fn expire_verification(&self) {
        if self.inner.torn_down.get() {
            return;
        }
        self.inner.session.borrow_mut().expire_verification();
        self.inner.notify();
    }

    /// 请求目标地址
    ///
    /// 前置条件不满足时直接拒绝，不发请求。成功后在 `REDIRECT_DELAY` 之后跳转。
    pub async fn unlock(&self) -> Result<UnlockOutcome, GateRejection> {
        if self.inner.torn_down.get() {
            return Err(GateRejection::NotReady);
        }
        let (code, token) = {
            let mut session = self.inner.session.borrow_mut();
            let token = session.begin_unlock()?;
            (session.short_code().to_string(), token)
        };
        self.inner.notify();

        let result = self.inner.backend.unlock(&code, token).await;
        if self.inner.torn_down.get() {
            log_info!("[Gate] Page left before unlock finished, discarding result");
            return Ok(UnlockOutcome::Ignored);
        }

        let outcome = self.inner.session.borrow_mut().finish_unlock(result);
        match &outcome {
            UnlockOutcome::Unlocked(url) => self.schedule_redirect(url.clone()),
            UnlockOutcome::Rejected(message) => {
                log_warn!("[Gate] Unlock rejected: {}", message);
            }
            UnlockOutcome::Ignored => {}
        }
        self.inner.notify();
        Ok(outcome)
    }

    fn schedule_redirect(&self, url: String) {
        if self.inner.redirect_task.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.delay(
            REDIRECT_DELAY,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire_redirect(&url);
                }
            }),
        );
        *self.inner.redirect_task.borrow_mut() = Some(handle);
    }

    /// 页面卸载：取消所有定时任务，之后的回调与请求结果都不再生效
    pub fn teardown(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        self.inner.countdown_task.borrow_mut().take();
        self.inner.redirect_task.borrow_mut().take();
        self.inner.on_change.borrow_mut().take();
        self.inner.on_redirect.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::gate::{COUNTDOWN_SECONDS, FinalStepPhase, GatePhase};
    use crate::http::HttpMethod;
    use crate::http::mock::MockHttpClient;
    use crate::schedule::manual::ManualScheduler;
    use crate::session::MemoryStore;
    use futures::channel::oneshot;
    use serde_json::json;

    const BASE: &str = "https://api.test";

    type TestDriver = GateDriver<ApiClient<MockHttpClient, MemoryStore>, ManualScheduler>;

    fn setup(transport: &MockHttpClient, verification: bool) -> (TestDriver, ManualScheduler) {
        let config = ClientConfig {
            api_base: BASE.to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config, transport.clone(), MemoryStore::default());
        let scheduler = ManualScheduler::default();
        let driver = GateDriver::new("abc", client, scheduler.clone(), verification);
        (driver, scheduler)
    }

    fn mock_link(transport: &MockHttpClient) {
        transport.mock_response(
            HttpMethod::Get,
            &format!("{}/l/abc", BASE),
            200,
            json!({ "title": "Demo", "short_code": "abc" }),
        );
    }

    /// 走到第三步并完成倒计时
    fn run_to_final_step(driver: &TestDriver, scheduler: &ManualScheduler) {
        for _ in 0..2 {
            driver.acknowledge_ad();
            driver.advance_step().unwrap();
        }
        assert_eq!(driver.acknowledge_ad(), Acknowledgement::CountdownStarted);
        for _ in 0..COUNTDOWN_SECONDS {
            scheduler.fire_repeating();
        }
    }

    #[tokio::test]
    async fn test_load_failure_enters_error() {
        let transport = MockHttpClient::new();
        let (driver, _) = setup(&transport, true);

        driver.load().await;

        assert_eq!(
            driver.snapshot().phase(),
            GatePhase::Error("Not Found".to_string())
        );
        assert_eq!(driver.acknowledge_ad(), Acknowledgement::Ignored);
    }

    #[tokio::test]
    async fn test_countdown_ticks_once_per_second_and_stops() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;

        for _ in 0..2 {
            driver.acknowledge_ad();
            driver.advance_step().unwrap();
        }
        driver.acknowledge_ad();
        // 重复确认不会再启动一个计时器
        driver.acknowledge_ad();
        assert_eq!(scheduler.live_tasks(), 1);
        assert_eq!(scheduler.last_period(), Some(TICK_INTERVAL));

        scheduler.fire_repeating();
        assert_eq!(driver.snapshot().countdown(), COUNTDOWN_SECONDS - 1);

        for _ in 1..COUNTDOWN_SECONDS {
            scheduler.fire_repeating();
        }
        let session = driver.snapshot();
        assert_eq!(session.countdown(), 0);
        assert_eq!(
            session.phase(),
            GatePhase::Final(FinalStepPhase::AwaitingVerification)
        );
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[tokio::test]
    async fn test_unlock_success_redirects_after_delay() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        transport.mock_response(
            HttpMethod::Post,
            &format!("{}/l/abc/unlock", BASE),
            200,
            json!({ "url": "https://dest.example" }),
        );
        let (driver, scheduler) = setup(&transport, true);
        let redirected = Rc::new(RefCell::new(Vec::<String>::new()));
        driver.on_redirect({
            let redirected = redirected.clone();
            move |url| redirected.borrow_mut().push(url.to_string())
        });

        driver.load().await;
        run_to_final_step(&driver, &scheduler);
        driver.submit_verification("cap-token");

        let outcome = driver.unlock().await.unwrap();
        assert_eq!(
            outcome,
            UnlockOutcome::Unlocked("https://dest.example".into())
        );
        assert_eq!(driver.snapshot().phase(), GatePhase::Unlocked);
        assert!(redirected.borrow().is_empty());
        assert_eq!(scheduler.last_period(), Some(REDIRECT_DELAY));

        scheduler.fire_delayed();
        assert_eq!(*redirected.borrow(), vec!["https://dest.example".to_string()]);
    }

    #[tokio::test]
    async fn test_unlock_without_token_sends_nothing() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;
        run_to_final_step(&driver, &scheduler);

        let err = driver.unlock().await.unwrap_err();

        assert_eq!(err, GateRejection::VerificationMissing);
        // 只有解析请求
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unlock_failure_requires_new_verification() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        transport.mock_response(
            HttpMethod::Post,
            &format!("{}/l/abc/unlock", BASE),
            403,
            json!({ "error": "Captcha verification failed" }),
        );
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;
        run_to_final_step(&driver, &scheduler);
        driver.submit_verification("cap-token");

        let outcome = driver.unlock().await.unwrap();

        assert_eq!(
            outcome,
            UnlockOutcome::Rejected("Captcha verification failed".into())
        );
        let session = driver.snapshot();
        assert_eq!(session.current_step(), Step::Three);
        assert!(session.verification_token().is_none());
        assert_eq!(session.verification_generation(), 1);
        assert_eq!(
            session.unlock_error(),
            Some("Captcha verification failed")
        );
        assert_eq!(
            driver.unlock().await.unwrap_err(),
            GateRejection::VerificationMissing
        );
    }

    #[tokio::test]
    async fn test_verification_disabled_unlocks_without_token() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        transport.mock_response(
            HttpMethod::Post,
            &format!("{}/l/abc/unlock", BASE),
            200,
            json!({ "url": "https://dest.example" }),
        );
        let (driver, scheduler) = setup(&transport, false);
        driver.load().await;
        run_to_final_step(&driver, &scheduler);

        assert!(!driver.snapshot().challenge_visible());
        driver.unlock().await.unwrap();

        let req = transport.requests().pop().unwrap();
        assert!(!req.headers.contains_key(crate::HEADER_CAPTCHA_TOKEN));
    }

    #[tokio::test]
    async fn test_teardown_stops_countdown() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;
        for _ in 0..2 {
            driver.acknowledge_ad();
            driver.advance_step().unwrap();
        }
        driver.acknowledge_ad();
        scheduler.fire_repeating();

        driver.teardown();

        assert_eq!(scheduler.live_tasks(), 0);
        assert_eq!(scheduler.fire_repeating(), 0);
        assert_eq!(driver.snapshot().countdown(), COUNTDOWN_SECONDS - 1);
    }

    #[tokio::test]
    async fn test_dropping_driver_cancels_tasks() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;
        for _ in 0..2 {
            driver.acknowledge_ad();
            driver.advance_step().unwrap();
        }
        driver.acknowledge_ad();

        drop(driver);

        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[tokio::test]
    async fn test_late_unlock_result_is_ignored_after_teardown() {
        let transport = MockHttpClient::new();
        mock_link(&transport);
        transport.mock_response(
            HttpMethod::Post,
            &format!("{}/l/abc/unlock", BASE),
            200,
            json!({ "url": "https://dest.example" }),
        );
        let (driver, scheduler) = setup(&transport, true);
        driver.load().await;
        run_to_final_step(&driver, &scheduler);
        driver.submit_verification("cap-token");

        let changes = Rc::new(Cell::new(0));
        driver.on_change({
            let changes = changes.clone();
            move |_| changes.set(changes.get() + 1)
        });

        let (tx, rx) = oneshot::channel();
        transport.hold_until(rx);

        let pending = driver.unlock();
        let leave = async {
            driver.teardown();
            let _ = tx.send(());
        };
        let (outcome, _) = futures::join!(pending, leave);

        assert_eq!(outcome, Ok(UnlockOutcome::Ignored));
        let session = driver.snapshot();
        assert!(session.destination_url().is_none());
        assert_eq!(scheduler.live_tasks(), 0);
        // 只有进入 Unlocking 的那一次通知
        assert_eq!(changes.get(), 1);
    }
}
