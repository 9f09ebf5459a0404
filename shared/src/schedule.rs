//! 定时任务抽象
//!
//! 解锁门需要一个每秒触发的倒计时和一个一次性的跳转延时。
//! 具体实现由平台提供（浏览器中是 `setInterval` / `setTimeout`）。
//! 返回的句柄被 drop 时任务即被取消。

use std::time::Duration;

pub trait Scheduler {
    /// 任务句柄，drop 即取消
    type Handle: 'static;

    /// 每隔 `period` 执行一次 `task`
    fn repeat(&self, period: Duration, task: Box<dyn FnMut()>) -> Self::Handle;

    /// `delay` 后执行一次 `task`
    fn delay(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle;
}

// =========================================================
// 测试工具: ManualScheduler
// =========================================================

#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    enum Job {
        Repeat(Box<dyn FnMut()>),
        Once(Option<Box<dyn FnOnce()>>),
    }

    struct Task {
        period: Duration,
        job: Job,
        cancelled: Rc<Cell<bool>>,
    }

    /// 手动触发的调度器，测试中用 `fire_repeating` / `fire_delayed` 模拟时间流逝
    #[derive(Clone, Default)]
    pub struct ManualScheduler {
        tasks: Rc<RefCell<Vec<Task>>>,
    }

    pub struct ManualHandle {
        cancelled: Rc<Cell<bool>>,
    }

    impl Drop for ManualHandle {
        fn drop(&mut self) {
            self.cancelled.set(true);
        }
    }

    impl ManualScheduler {
        fn push(&self, period: Duration, job: Job) -> ManualHandle {
            let cancelled = Rc::new(Cell::new(false));
            self.tasks.borrow_mut().push(Task {
                period,
                job,
                cancelled: cancelled.clone(),
            });
            ManualHandle { cancelled }
        }

        /// 执行一轮所有未取消的周期任务，返回执行的数量
        pub fn fire_repeating(&self) -> usize {
            self.run(|job| matches!(job, Job::Repeat(_)))
        }

        /// 执行所有未取消的一次性任务，返回执行的数量
        pub fn fire_delayed(&self) -> usize {
            self.run(|job| matches!(job, Job::Once(Some(_))))
        }

        /// 仍然有效的任务数量
        pub fn live_tasks(&self) -> usize {
            self.tasks
                .borrow()
                .iter()
                .filter(|t| !t.cancelled.get() && !matches!(t.job, Job::Once(None)))
                .count()
        }

        pub fn last_period(&self) -> Option<Duration> {
            self.tasks.borrow().last().map(|t| t.period)
        }

        fn run(&self, select: impl Fn(&Job) -> bool) -> usize {
            // 任务执行期间可能再次调度，先把列表取出来
            let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            let mut fired = 0;
            for task in tasks.iter_mut() {
                if task.cancelled.get() || !select(&task.job) {
                    continue;
                }
                fired += 1;
                match &mut task.job {
                    Job::Repeat(f) => f(),
                    Job::Once(f) => {
                        if let Some(f) = f.take() {
                            f();
                        }
                    }
                }
            }
            let mut current = self.tasks.borrow_mut();
            tasks.append(&mut current);
            *current = tasks;
            fired
        }
    }

    impl Scheduler for ManualScheduler {
        type Handle = ManualHandle;

        fn repeat(&self, period: Duration, task: Box<dyn FnMut()>) -> Self::Handle {
            self.push(period, Job::Repeat(task))
        }

        fn delay(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle {
            self.push(delay, Job::Once(Some(task)))
        }
    }

    #[test]
    fn test_dropped_handle_cancels_task() {
        let scheduler = ManualScheduler::default();
        let hits = Rc::new(Cell::new(0));
        let handle = scheduler.repeat(Duration::from_secs(1), {
            let hits = hits.clone();
            Box::new(move || hits.set(hits.get() + 1))
        });

        assert_eq!(scheduler.fire_repeating(), 1);
        drop(handle);
        assert_eq!(scheduler.fire_repeating(), 0);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.live_tasks(), 0);
    }
}
