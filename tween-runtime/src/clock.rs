//! # Clock 模块
//!
//! 所有 tween 共用的时钟与状态机。
//!
//! ```text
//! Idle ──start──► Scheduled ──延迟结束──► Running ──elapsed ≥ duration──► Completed
//!                     │                     │
//!                     └───────kill──────────┴──────────────────────────► Killed
//! ```
//!
//! 时钟只由调度器推进，每个 tick 最多推进一次。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::accessor::AccessResult;
use crate::easing::{Ease, EaseCurve};
use crate::scheduler::{Drive, Scheduler, Step, TweenId, WeakScheduler};

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// 已创建，尚未交给调度器
    #[default]
    Idle,
    /// 已注册，等待延迟结束或第一次推进
    Scheduled,
    /// 正在播放
    Running,
    /// 已完成
    Completed,
    /// 已取消
    Killed,
}

impl PlayState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Killed)
    }
}

/// 单帧采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    /// 播放开始后经过的时间（不含延迟）
    pub elapsed: f32,
    /// 原始进度 (0.0 - 1.0)
    pub t: f32,
    /// 缓动后的进度
    pub eased: f32,
}

/// 推进一帧后的时钟状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ClockStep {
    /// 仍在延迟中
    Waiting,
    /// 播放中
    Running(Sample),
    /// 已到达时长
    Finished,
}

/// tween 时钟
#[derive(Debug, Clone)]
pub(crate) struct Clock {
    duration: f32,
    delay: f32,
    /// 已等待的延迟
    waited: f32,
    /// 播放开始后经过的时间
    elapsed: f32,
    finished: bool,
    ease: Ease,
    curve: EaseCurve,
}

impl Clock {
    /// 非有限的时长按 0 处理，第一次推进即结束
    pub fn new(duration: f32) -> Self {
        let ease = Ease::default();
        Self {
            duration: if duration.is_finite() { duration } else { 0.0 },
            delay: 0.0,
            waited: 0.0,
            elapsed: 0.0,
            finished: false,
            ease,
            curve: ease.curve(),
        }
    }

    pub fn set_delay(&mut self, delay: f32) {
        self.delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
    }

    pub fn set_ease(&mut self, ease: Ease) {
        self.ease = ease;
        self.curve = ease.curve();
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn ease(&self) -> Ease {
        self.ease
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 原始进度 (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        if self.finished {
            1.0
        } else if self.duration <= 0.0 {
            0.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// 推进时钟
    ///
    /// 延迟结束的那一帧，多出来的时间计入播放时间。
    pub fn advance(&mut self, dt: f32) -> ClockStep {
        let mut dt = dt;
        if self.waited < self.delay {
            self.waited += dt;
            if self.waited < self.delay {
                return ClockStep::Waiting;
            }
            dt = self.waited - self.delay;
        }

        self.elapsed += dt;
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            self.finished = true;
            return ClockStep::Finished;
        }

        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        ClockStep::Running(Sample {
            elapsed: self.elapsed,
            t,
            eased: (self.curve)(t),
        })
    }
}

/// 生命周期
///
/// 各类 tween 共享的状态、调度器登记与完成回调。
pub(crate) struct Lifecycle {
    id: TweenId,
    state: Cell<PlayState>,
    scheduler: RefCell<Option<WeakScheduler>>,
    on_complete: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            id: TweenId::next(),
            state: Cell::new(PlayState::Idle),
            scheduler: RefCell::new(None),
            on_complete: RefCell::new(None),
        }
    }

    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn state(&self) -> PlayState {
        self.state.get()
    }

    pub fn set_state(&self, state: PlayState) {
        self.state.set(state);
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_active()
    }

    pub fn set_on_complete(&self, callback: Box<dyn FnOnce()>) {
        *self.on_complete.borrow_mut() = Some(callback);
    }

    /// 交给调度器，进入 Scheduled
    ///
    /// 只有 Idle 状态可以启动，句柄不会被复用。
    pub fn launch(&self, scheduler: &Scheduler, driver: Rc<dyn Drive>) {
        if self.state() != PlayState::Idle {
            debug!(id = %self.id, state = ?self.state(), "tween 已启动过，忽略");
            return;
        }
        *self.scheduler.borrow_mut() = Some(scheduler.downgrade());
        self.set_state(PlayState::Scheduled);
        scheduler.register(driver);
    }

    /// 是否还允许修改配置（延迟、缓动、完成回调）
    pub fn configurable(&self, what: &'static str) -> bool {
        match self.state() {
            PlayState::Idle | PlayState::Scheduled => true,
            state => {
                warn!(id = %self.id, ?state, what, "tween 已开始播放，忽略配置");
                false
            }
        }
    }

    /// 取消
    ///
    /// 未启动或已结束时什么也不做。
    pub fn kill(&self) {
        if !self.state().is_active() {
            return;
        }
        self.set_state(PlayState::Killed);
        debug!(id = %self.id, "tween 已取消");

        let scheduler = self.scheduler.borrow_mut().take();
        if let Some(scheduler) = scheduler.and_then(|s| s.upgrade()) {
            scheduler.cancel(self.id);
        }
    }

    /// 标记完成并调用完成回调
    ///
    /// 回调先取出再调用，回调内部可以安全地访问句柄。
    pub fn complete(&self) {
        self.set_state(PlayState::Completed);
        self.scheduler.borrow_mut().take();
        let callback = self.on_complete.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// 标记为因写入失败而终止（不调用完成回调）
    pub fn abort(&self) {
        self.set_state(PlayState::Killed);
        self.scheduler.borrow_mut().take();
        self.on_complete.borrow_mut().take();
    }
}

/// 写入请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Frame {
    /// 写入插值
    At(Sample),
    /// 写入终值（或静止值）
    End,
}

/// 公共的单帧推进流程
///
/// 1. 已结束的直接返回
/// 2. 推进时钟；延迟中不写入
/// 3. 通过 `write` 写入插值或终值
/// 4. 写入失败则终止；写入回调里取消了自己则不再完成
/// 5. 到达时长则完成并调用完成回调
pub(crate) fn drive(
    life: &Lifecycle,
    clock: &RefCell<Clock>,
    dt: f32,
    write: impl FnOnce(Frame) -> AccessResult,
) -> Step {
    match life.state() {
        PlayState::Scheduled | PlayState::Running => {}
        PlayState::Completed => return Step::Completed,
        PlayState::Idle | PlayState::Killed => return Step::Killed,
    }

    let step = clock.borrow_mut().advance(dt);
    let (written, finished) = match step {
        ClockStep::Waiting => return Step::Continue,
        ClockStep::Running(sample) => {
            life.set_state(PlayState::Running);
            (write(Frame::At(sample)), false)
        }
        ClockStep::Finished => (write(Frame::End), true),
    };

    if let Err(error) = written {
        life.abort();
        return Step::Faulted(error);
    }
    if life.state() == PlayState::Killed {
        return Step::Killed;
    }
    if finished {
        life.complete();
        return Step::Completed;
    }
    Step::Continue
}
