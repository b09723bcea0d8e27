//! # Button 模块
//!
//! 按钮按下效果：二维缩放先"压扁"再回弹，结束时精确回到静止值。
//!
//! - [`ButtonTween`]: 一次性的按下动画，启动后再次启动无效
//! - [`PressButton`]: 按钮组件，每次点击创建新的 [`ButtonTween`]，
//!   上一次按下尚未结束时忽略点击

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::accessor::{AccessResult, PropertyAccessor, SharedValue};
use crate::clock::{Clock, Frame, Lifecycle, PlayState, drive};
use crate::scheduler::{Drive, Scheduler, Step, TweenId};
use crate::tween::{Writer, punch_envelope, split, writer};
use crate::value::Vec2;

/// 默认按下时长（秒）
pub const DEFAULT_PRESS_DURATION: f32 = 0.25;

/// 默认压扁幅度
pub const DEFAULT_PRESS_SIZE: f32 = -0.1;

/// 压扁幅度下限
pub const MIN_PRESS_SIZE: f32 = -0.3;

struct ButtonInner {
    life: Lifecycle,
    clock: RefCell<Clock>,
    rest: Vec2,
    size: f32,
    writer: RefCell<Writer<Vec2>>,
}

impl ButtonInner {
    fn write(&self, frame: Frame) -> AccessResult {
        let value = match frame {
            Frame::At(sample) => self.rest + Vec2::splat(self.size * punch_envelope(sample.t)),
            Frame::End => self.rest,
        };
        (self.writer.borrow_mut())(value)
    }
}

impl Drive for ButtonInner {
    fn id(&self) -> TweenId {
        self.life.id()
    }

    fn state(&self) -> PlayState {
        self.life.state()
    }

    fn advance(&self, dt: f32) -> Step {
        drive(&self.life, &self.clock, dt, |frame| self.write(frame))
    }

    fn kill(&self) {
        self.life.kill();
    }
}

/// 按下动画
///
/// 线性缓动，包络与 Punch 相同，两个轴使用同一个带符号的幅度。
#[derive(Clone)]
pub struct ButtonTween {
    inner: Rc<ButtonInner>,
}

impl std::fmt::Debug for ButtonTween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtonTween")
            .field("id", &self.id())
            .field("rest", &self.inner.rest)
            .field("size", &self.inner.size)
            .field("state", &self.state())
            .finish()
    }
}

impl ButtonTween {
    /// 创建按下动画，构造时读取静止值
    pub fn new(accessor: impl PropertyAccessor<Vec2> + 'static, duration: f32, size: f32) -> Self {
        let (rest, writer) = split(accessor);
        Self::build(rest, writer, duration, size)
    }

    /// 使用给定的静止值创建按下动画，不读取目标的当前值
    pub fn with_rest(
        accessor: impl PropertyAccessor<Vec2> + 'static,
        rest: Vec2,
        duration: f32,
        size: f32,
    ) -> Self {
        Self::build(rest, writer(accessor), duration, size)
    }

    fn build(rest: Vec2, writer: Writer<Vec2>, duration: f32, size: f32) -> Self {
        Self {
            inner: Rc::new(ButtonInner {
                life: Lifecycle::new(),
                clock: RefCell::new(Clock::new(duration)),
                rest,
                size,
                writer: RefCell::new(writer),
            }),
        }
    }

    /// 设置完成回调（启动前）
    pub fn with_on_complete(self, callback: impl FnOnce() + 'static) -> Self {
        if self.inner.life.configurable("on_complete") {
            self.inner.life.set_on_complete(Box::new(callback));
        }
        self
    }

    /// 在全局调度器上启动
    pub fn start(&self) -> &Self {
        self.start_on(&Scheduler::global())
    }

    /// 在指定调度器上启动
    ///
    /// 播放中或已结束时调用无效，不会重置包络。
    pub fn start_on(&self, scheduler: &Scheduler) -> &Self {
        let driver: Rc<dyn Drive> = self.inner.clone();
        self.inner.life.launch(scheduler, driver);
        self
    }

    /// 取消（保留当前写入的值）
    pub fn kill(&self) {
        self.inner.life.kill();
    }

    pub fn id(&self) -> TweenId {
        self.inner.life.id()
    }

    pub fn state(&self) -> PlayState {
        self.inner.life.state()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.life.is_playing()
    }

    /// 静止值
    pub fn rest(&self) -> Vec2 {
        self.inner.rest
    }
}

type Listeners = Rc<RefCell<Vec<Box<dyn FnMut()>>>>;

/// 可点击的按钮
///
/// 点击时播放按下动画，动画结束（缩放回到静止值）后通知所有监听器。
/// 静止值在创建按钮时读取一次，按下被中途取消也不会影响之后的点击。
pub struct PressButton {
    scheduler: Scheduler,
    scale: SharedValue<Vec2>,
    rest: Vec2,
    duration: f32,
    size: f32,
    current: RefCell<Option<ButtonTween>>,
    listeners: Listeners,
}

impl std::fmt::Debug for PressButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PressButton")
            .field("rest", &self.rest)
            .field("duration", &self.duration)
            .field("size", &self.size)
            .field("pressing", &self.is_pressing())
            .finish()
    }
}

impl PressButton {
    pub fn new(scheduler: &Scheduler, scale: SharedValue<Vec2>) -> Self {
        let rest = scale.value();
        Self {
            scheduler: scheduler.clone(),
            scale,
            rest,
            duration: DEFAULT_PRESS_DURATION,
            size: DEFAULT_PRESS_SIZE,
            current: RefCell::new(None),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// 设置按下时长（秒）
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    /// 设置压扁幅度，限制在 `[-0.3, 0]`
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size.clamp(MIN_PRESS_SIZE, 0.0);
        self
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// 静止值
    pub fn rest(&self) -> Vec2 {
        self.rest
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 注册点击监听器
    pub fn on_click(&self, listener: impl FnMut() + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// 是否正在播放按下动画
    pub fn is_pressing(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|tween| tween.is_playing())
    }

    /// 点击
    ///
    /// # 返回
    /// 是否开始了新的按下动画。上一次按下尚未结束时返回 `false`。
    pub fn click(&self) -> bool {
        if self.is_pressing() {
            debug!("按钮正在按下，忽略点击");
            return false;
        }

        let listeners = self.listeners.clone();
        let tween = ButtonTween::with_rest(self.scale.clone(), self.rest, self.duration, self.size)
            .with_on_complete(move || notify(&listeners));
        tween.start_on(&self.scheduler);
        *self.current.borrow_mut() = Some(tween);
        true
    }
}

/// 调用所有监听器；监听器内部注册的新监听器保留到下一次
fn notify(listeners: &Listeners) {
    let mut running = std::mem::take(&mut *listeners.borrow_mut());
    for listener in running.iter_mut() {
        listener();
    }
    let mut slot = listeners.borrow_mut();
    let added = std::mem::replace(&mut *slot, running);
    slot.extend(added);
}
