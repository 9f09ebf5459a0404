//! 响应式布局辅助
//!
//! 断点与 Tailwind 的 `sm` / `lg` 对齐：
//! 宽度 < 640 为 Mobile，< 1024 为 Tablet，其余为 Desktop。

use leptos::prelude::*;

pub const TABLET_MIN_WIDTH: f64 = 640.0;
pub const DESKTOP_MIN_WIDTH: f64 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width: f64) -> Self {
        if width < TABLET_MIN_WIDTH {
            Self::Mobile
        } else if width < DESKTOP_MIN_WIDTH {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == Self::Mobile
    }
}

/// 按断点取值，未指定的断点回退到更小一档
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Responsive<T> {
    pub mobile: T,
    pub tablet: Option<T>,
    pub desktop: Option<T>,
}

impl<T> Responsive<T> {
    pub fn new(mobile: T) -> Self {
        Self {
            mobile,
            tablet: None,
            desktop: None,
        }
    }

    pub fn tablet(mut self, value: T) -> Self {
        self.tablet = Some(value);
        self
    }

    pub fn desktop(mut self, value: T) -> Self {
        self.desktop = Some(value);
        self
    }

    pub fn pick(&self, breakpoint: Breakpoint) -> &T {
        match breakpoint {
            Breakpoint::Mobile => &self.mobile,
            Breakpoint::Tablet => self.tablet.as_ref().unwrap_or(&self.mobile),
            Breakpoint::Desktop => self
                .desktop
                .as_ref()
                .or(self.tablet.as_ref())
                .unwrap_or(&self.mobile),
        }
    }
}

fn window_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(DESKTOP_MIN_WIDTH)
}

/// 当前断点信号，随窗口 resize 更新
pub fn use_breakpoint() -> ReadSignal<Breakpoint> {
    let (breakpoint, set_breakpoint) = signal(Breakpoint::from_width(window_width()));

    let handle = window_event_listener(leptos::ev::resize, move |_| {
        let next = Breakpoint::from_width(window_width());
        if breakpoint.get_untracked() != next {
            set_breakpoint.set(next);
        }
    });
    on_cleanup(move || handle.remove());

    breakpoint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_boundaries() {
        assert_eq!(Breakpoint::from_width(320.0), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(639.0), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(640.0), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(1023.0), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(1024.0), Breakpoint::Desktop);
    }

    #[test]
    fn test_responsive_falls_back_to_smaller() {
        let cols = Responsive::new(1).tablet(2);
        assert_eq!(*cols.pick(Breakpoint::Mobile), 1);
        assert_eq!(*cols.pick(Breakpoint::Tablet), 2);
        assert_eq!(*cols.pick(Breakpoint::Desktop), 2);

        let only_mobile = Responsive::new("stack");
        assert_eq!(*only_mobile.pick(Breakpoint::Desktop), "stack");
    }
}
