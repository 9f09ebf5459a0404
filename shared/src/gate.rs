//! 解锁门状态机
//!
//! 访客打开短链后需要依次完成三步广告展示，最后一步还有倒计时和人机验证，
//! 之后才向后端请求目标地址：
//!
//! ```text
//! Loading -> { Error | Step1 -> Step2 -> Step3 { AwaitingAd -> Counting
//!            -> AwaitingVerification -> Unlocking } -> Unlocked }
//! ```
//!
//! `UnlockSession` 只做同步的状态转换，不接触网络和定时器；
//! 这两者由 `driver::GateDriver` 负责。

use std::fmt;
use std::time::Duration;

use crate::LinkMetadata;
use crate::error::ApiError;

pub mod driver;

#[cfg(test)]
mod tests;

pub use driver::{GateDriver, UnlockBackend};

/// 最后一步的最短停留时间（秒）
pub const COUNTDOWN_SECONDS: u32 = 20;
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// 解锁成功后停留展示成功提示的时间
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Step {
    pub const COUNT: u8 = 3;

    pub fn number(self) -> u8 {
        self as u8
    }

    fn next(self) -> Option<Step> {
        match self {
            Step::One => Some(Step::Two),
            Step::Two => Some(Step::Three),
            Step::Three => None,
        }
    }

    pub fn is_final(self) -> bool {
        self == Step::Three
    }
}

/// 第三步内部的子状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalStepPhase {
    AwaitingAd,
    Counting,
    AwaitingVerification,
    Unlocking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePhase {
    Loading,
    /// 短链解析失败，终态
    Error(String),
    /// 第一、二步
    Step(Step),
    Final(FinalStepPhase),
    /// 已拿到目标地址，终态
    Unlocked,
}

/// 被拒绝的操作。界面上对应的控件应当处于禁用状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// 仍在加载或加载失败
    NotReady,
    AdNotAcknowledged,
    /// 第三步没有"继续"，只能解锁
    FinalStep,
    CountdownPending,
    VerificationMissing,
    UnlockInFlight,
    AlreadyUnlocked,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GateRejection::NotReady => "The link is not ready yet",
            GateRejection::AdNotAcknowledged => "Please view the ad first",
            GateRejection::FinalStep => "This is the final step",
            GateRejection::CountdownPending => "Please wait for the countdown to finish",
            GateRejection::VerificationMissing => "Please complete the verification",
            GateRejection::UnlockInFlight => "Unlock already in progress",
            GateRejection::AlreadyUnlocked => "The link is already unlocked",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GateRejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// 本步已确认过或当前不可确认
    Ignored,
    /// 第一、二步："继续"按钮可用
    Acknowledged,
    /// 第三步：倒计时开始
    CountdownStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 不在倒计时中
    Ignored,
    Remaining(u32),
    Elapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// 没有进行中的解锁请求，结果被丢弃
    Ignored,
    Unlocked(String),
    Rejected(String),
}

/// 单个浏览器标签页内的解锁会话，不做持久化
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockSession {
    short_code: String,
    link: Option<LinkMetadata>,
    load_error: Option<String>,
    current_step: Step,
    ad_acknowledged: bool,
    countdown: u32,
    countdown_started: bool,
    countdown_elapsed: bool,
    verification_required: bool,
    verification_token: Option<String>,
    /// 每次需要重置验证组件时加一
    verification_generation: u32,
    unlocking: bool,
    unlock_error: Option<String>,
    destination_url: Option<String>,
}

impl UnlockSession {
    pub fn new(short_code: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            link: None,
            load_error: None,
            current_step: Step::One,
            ad_acknowledged: false,
            countdown: COUNTDOWN_SECONDS,
            countdown_started: false,
            countdown_elapsed: false,
            verification_required: true,
            verification_token: None,
            verification_generation: 0,
            unlocking: false,
            unlock_error: None,
            destination_url: None,
        }
    }

    // --- 读取 ---

    pub fn short_code(&self) -> &str {
        &self.short_code
    }

    pub fn link(&self) -> Option<&LinkMetadata> {
        self.link.as_ref()
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn ad_acknowledged(&self) -> bool {
        self.ad_acknowledged
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn countdown_elapsed(&self) -> bool {
        self.countdown_elapsed
    }

    pub fn verification_required(&self) -> bool {
        self.verification_required
    }

    pub fn verification_token(&self) -> Option<&str> {
        self.verification_token.as_deref()
    }

    pub fn verification_generation(&self) -> u32 {
        self.verification_generation
    }

    pub fn unlock_error(&self) -> Option<&str> {
        self.unlock_error.as_deref()
    }

    pub fn destination_url(&self) -> Option<&str> {
        self.destination_url.as_deref()
    }

    pub fn phase(&self) -> GatePhase {
        if let Some(message) = &self.load_error {
            return GatePhase::Error(message.clone());
        }
        if self.link.is_none() {
            return GatePhase::Loading;
        }
        if self.destination_url.is_some() {
            return GatePhase::Unlocked;
        }
        match self.current_step {
            Step::One | Step::Two => GatePhase::Step(self.current_step),
            Step::Three => GatePhase::Final(if self.unlocking {
                FinalStepPhase::Unlocking
            } else if self.countdown_elapsed {
                FinalStepPhase::AwaitingVerification
            } else if self.countdown_started {
                FinalStepPhase::Counting
            } else {
                FinalStepPhase::AwaitingAd
            }),
        }
    }

    fn is_active(&self) -> bool {
        self.link.is_some() && self.load_error.is_none() && self.destination_url.is_none()
    }

    pub fn is_counting(&self) -> bool {
        self.phase() == GatePhase::Final(FinalStepPhase::Counting)
    }

    /// 是否展示人机验证组件
    pub fn challenge_visible(&self) -> bool {
        self.is_active()
            && self.current_step.is_final()
            && self.countdown_elapsed
            && self.verification_required
    }

    pub fn check_advance(&self) -> Result<Step, GateRejection> {
        if !self.is_active() {
            return Err(GateRejection::NotReady);
        }
        let next = self.current_step.next().ok_or(GateRejection::FinalStep)?;
        if !self.ad_acknowledged {
            return Err(GateRejection::AdNotAcknowledged);
        }
        Ok(next)
    }

    pub fn check_unlock(&self) -> Result<(), GateRejection> {
        if self.destination_url.is_some() {
            return Err(GateRejection::AlreadyUnlocked);
        }
        if !self.is_active() {
            return Err(GateRejection::NotReady);
        }
        if !self.current_step.is_final() || !self.countdown_elapsed {
            return Err(GateRejection::CountdownPending);
        }
        if self.unlocking {
            return Err(GateRejection::UnlockInFlight);
        }
        if self.verification_required && self.verification_token.is_none() {
            return Err(GateRejection::VerificationMissing);
        }
        Ok(())
    }

    // --- 状态转换 ---

    /// 链接解析成功，进入第一步
    ///
    /// `verification_enabled` 为 false（未配置站点 key）或后端声明不需要验证时，
    /// 解锁不要求 token。
    pub fn link_loaded(&mut self, link: LinkMetadata, verification_enabled: bool) {
        if self.link.is_some() || self.load_error.is_some() {
            return;
        }
        self.verification_required = verification_enabled && link.captcha_required.unwrap_or(true);
        self.link = Some(link);
    }

    /// 链接解析失败，会话终止
    pub fn link_failed(&mut self, error: &ApiError) {
        if self.link.is_some() || self.load_error.is_some() {
            return;
        }
        self.load_error = Some(error.message().to_string());
    }

    /// 同一步内重复确认只生效一次
    pub fn acknowledge_ad(&mut self) -> Acknowledgement {
        if !self.is_active() || self.ad_acknowledged {
            return Acknowledgement::Ignored;
        }
        self.ad_acknowledged = true;

        if self.current_step.is_final() && !self.countdown_started {
            self.countdown_started = true;
            self.countdown = COUNTDOWN_SECONDS;
            return Acknowledgement::CountdownStarted;
        }
        Acknowledgement::Acknowledged
    }

    pub fn advance_step(&mut self) -> Result<Step, GateRejection> {
        let next = self.check_advance()?;
        self.current_step = next;
        self.ad_acknowledged = false;
        Ok(next)
    }

    pub fn tick(&mut self) -> Tick {
        if !self.is_active() || !self.is_counting() {
            return Tick::Ignored;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.countdown_elapsed = true;
            Tick::Elapsed
        } else {
            Tick::Remaining(self.countdown)
        }
    }

    /// 保存验证组件回调的 token，不触发状态转换
    pub fn submit_verification(&mut self, token: impl Into<String>) {
        if !self.is_active() {
            return;
        }
        let token = token.into();
        if token.trim().is_empty() {
            self.verification_token = None;
        } else {
            self.verification_token = Some(token);
            self.unlock_error = None;
        }
    }

    /// 验证组件报告 token 过期
    pub fn expire_verification(&mut self) {
        if self.is_active() && !self.unlocking {
            self.verification_token = None;
        }
    }

    /// 标记解锁开始，返回要随请求发送的 token
    pub fn begin_unlock(&mut self) -> Result<Option<String>, GateRejection> {
        self.check_unlock()?;
        self.unlocking = true;
        self.unlock_error = None;
        Ok(if self.verification_required {
            self.verification_token.clone()
        } else {
            None
        })
    }

    /// 应用解锁请求的结果
    ///
    /// 失败时清空 token 并要求重新验证，步骤不回退。
    pub fn finish_unlock(&mut self, result: Result<String, ApiError>) -> UnlockOutcome {
        if !self.unlocking {
            return UnlockOutcome::Ignored;
        }
        self.unlocking = false;

        match result {
            Ok(url) if !url.trim().is_empty() => {
                self.destination_url = Some(url.clone());
                self.verification_token = None;
                UnlockOutcome::Unlocked(url)
            }
            Ok(_) => self.reject("The destination is unavailable".to_string()),
            Err(e) => self.reject(e.message().to_string()),
        }
    }

    fn reject(&mut self, message: String) -> UnlockOutcome {
        self.unlock_error = Some(message.clone());
        self.verification_token = None;
        self.verification_generation = self.verification_generation.wrapping_add(1);
        UnlockOutcome::Rejected(message)
    }
}
