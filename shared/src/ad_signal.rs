//! 广告交互检测
//!
//! 广告在跨域 iframe 中渲染，无法直接拿到点击事件。
//! 做法：指针进入广告区域时"布防"；布防期间窗口失焦（焦点进入了 iframe）
//! 视为一次交互，延时 `DEBOUNCE` 后确认。每个挂载周期最多确认一次。
//!
//! 这是一个启发式判断，窗口失焦的其他原因（切换标签页等）也可能误报。

use std::time::Duration;

pub const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdSignal {
    armed: bool,
    pending: bool,
    signaled: bool,
}

impl AdSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled
    }

    pub fn pointer_enter(&mut self) {
        if !self.signaled {
            self.armed = true;
        }
    }

    /// 已经在等待确认时不撤防，指针移入 iframe 本身也会触发离开
    pub fn pointer_leave(&mut self) {
        if !self.pending {
            self.armed = false;
        }
    }

    /// 返回 true 时调用方应在 `DEBOUNCE` 后调用 `debounce_elapsed`
    pub fn window_blur(&mut self) -> bool {
        if !self.armed || self.signaled || self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// 返回 true 表示本次挂载的唯一一次交互确认
    pub fn debounce_elapsed(&mut self) -> bool {
        if !self.pending || self.signaled {
            return false;
        }
        self.pending = false;
        self.armed = false;
        self.signaled = true;
        true
    }

    /// 访客点了 "已查看广告" 按钮，跳过失焦判定
    pub fn confirm(&mut self) -> bool {
        if self.signaled {
            return false;
        }
        self.pending = false;
        self.armed = false;
        self.signaled = true;
        true
    }
}
