//! 时间类型模块
//!
//! - `Timestamp`: 可序列化的毫秒时间戳，用于传输与缓存过期判断
//! - `Clock`: 时间来源抽象，缓存层通过它取当前时间，测试中可替换

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

use chrono::{DateTime, Utc};

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// 转换为 chrono 的 UTC 时间，超出范围时返回 None
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }

    /// 页面展示用的日期，如 `2024-03-01`；无效时间戳返回 `-`
    pub fn format_date(&self) -> String {
        match self.to_datetime() {
            Some(dt) if self.0 > 0 => dt.format("%Y-%m-%d").to_string(),
            _ => "-".to_string(),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_millis() as i64)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// 计算两个时间戳之间的差值，负值截断为 0
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff_ms = (self.0 - rhs.0).max(0);
        Duration::from_millis(diff_ms as u64)
    }
}

// =========================================================
// Clock - 时间来源
// =========================================================

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// 系统时间（WASM 下由 chrono 的 wasmbind 走 `Date.now()`）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(Utc::now().timestamp_millis())
    }
}
