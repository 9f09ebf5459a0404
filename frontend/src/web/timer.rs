//! 定时器封装模块
//!
//! 用 `gloo-timers` 的 `Interval` / `Timeout` 实现共享核心的 `Scheduler`。
//! 两者被 drop 时都会清除浏览器定时器。

use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use linkgate_shared::schedule::Scheduler;

/// 只负责持有定时器，drop 时取消
#[allow(dead_code)]
pub enum TimerHandle {
    Interval(Interval),
    Timeout(Timeout),
}

#[derive(Clone, Copy, Default)]
pub struct BrowserScheduler;

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

impl Scheduler for BrowserScheduler {
    type Handle = TimerHandle;

    fn repeat(&self, period: Duration, mut task: Box<dyn FnMut()>) -> Self::Handle {
        TimerHandle::Interval(Interval::new(millis(period), move || task()))
    }

    fn delay(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle {
        TimerHandle::Timeout(Timeout::new(millis(delay), task))
    }
}
