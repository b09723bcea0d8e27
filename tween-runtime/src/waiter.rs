//! # Waiter 模块
//!
//! 延迟执行：在累计若干秒或若干帧之后调用一次动作。
//! 与 tween 共用调度器与生命周期，可以随时取消。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::{Clock, Lifecycle, PlayState, drive};
use crate::scheduler::{Drive, Scheduler, Step, TweenId};

enum Until {
    /// 累计时间
    Seconds(RefCell<Clock>),
    /// 剩余帧数
    Frames(Cell<u32>),
}

struct WaitInner {
    life: Lifecycle,
    until: Until,
}

impl Drive for WaitInner {
    fn id(&self) -> TweenId {
        self.life.id()
    }

    fn state(&self) -> PlayState {
        self.life.state()
    }

    fn advance(&self, dt: f32) -> Step {
        match &self.until {
            Until::Seconds(clock) => drive(&self.life, clock, dt, |_| Ok(())),
            Until::Frames(left) => {
                match self.life.state() {
                    PlayState::Scheduled | PlayState::Running => {}
                    PlayState::Completed => return Step::Completed,
                    PlayState::Idle | PlayState::Killed => return Step::Killed,
                }
                let remaining = left.get().saturating_sub(1);
                left.set(remaining);
                if remaining > 0 {
                    self.life.set_state(PlayState::Running);
                    return Step::Continue;
                }
                self.life.complete();
                Step::Completed
            }
        }
    }

    fn kill(&self) {
        self.life.kill();
    }
}

/// 延迟动作的构造入口
pub struct Waiter;

impl Waiter {
    /// 累计 `seconds` 秒后执行 `action`
    ///
    /// `seconds <= 0` 时在下一次 tick 执行。
    pub fn seconds(scheduler: &Scheduler, seconds: f32, action: impl FnOnce() + 'static) -> WaitHandle {
        Self::launch(
            scheduler,
            Until::Seconds(RefCell::new(Clock::new(seconds))),
            action,
        )
    }

    /// 经过 `frames` 次 tick 后执行 `action`
    ///
    /// `frames == 0` 与 `frames == 1` 相同，都在下一次 tick 执行。
    pub fn frames(scheduler: &Scheduler, frames: u32, action: impl FnOnce() + 'static) -> WaitHandle {
        Self::launch(scheduler, Until::Frames(Cell::new(frames.max(1))), action)
    }

    fn launch(scheduler: &Scheduler, until: Until, action: impl FnOnce() + 'static) -> WaitHandle {
        let inner = Rc::new(WaitInner {
            life: Lifecycle::new(),
            until,
        });
        inner.life.set_on_complete(Box::new(action));
        let driver: Rc<dyn Drive> = inner.clone();
        inner.life.launch(scheduler, driver);
        WaitHandle { inner }
    }
}

/// 延迟动作句柄
#[derive(Clone)]
pub struct WaitHandle {
    inner: Rc<WaitInner>,
}

impl std::fmt::Debug for WaitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitHandle")
            .field("id", &self.id())
            .field("state", &self.inner.life.state())
            .finish()
    }
}

impl WaitHandle {
    pub fn id(&self) -> TweenId {
        self.inner.life.id()
    }

    /// 取消，动作不会再被调用
    pub fn cancel(&self) {
        self.inner.life.kill();
    }

    /// 是否仍在等待
    pub fn is_pending(&self) -> bool {
        self.inner.life.is_playing()
    }

    /// 动作是否已执行
    pub fn is_done(&self) -> bool {
        self.inner.life.state() == PlayState::Completed
    }
}
