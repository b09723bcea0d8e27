//! # VirtualTween 模块
//!
//! 不绑定属性的标量 tween，每帧把插值结果交给更新回调。
//! 适合驱动由计算得到的值（例如进度条）。

use std::cell::RefCell;
use std::rc::Rc;

use crate::accessor::AccessResult;
use crate::clock::{Clock, Frame, Lifecycle, PlayState, drive};
use crate::easing::Ease;
use crate::scheduler::{Drive, Scheduler, Step, TweenId};
use crate::tween::Writer;
use crate::value::Lerp;

struct VirtualInner {
    life: Lifecycle,
    clock: RefCell<Clock>,
    from: f32,
    to: f32,
    on_update: RefCell<Writer<f32>>,
}

impl VirtualInner {
    fn write(&self, frame: Frame) -> AccessResult {
        let value = match frame {
            Frame::At(sample) => self.from.lerp(self.to, sample.eased),
            Frame::End => self.to,
        };
        (self.on_update.borrow_mut())(value)
    }
}

impl Drive for VirtualInner {
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

/// 虚拟 tween 句柄
#[derive(Clone)]
pub struct VirtualTween {
    inner: Rc<VirtualInner>,
}

impl std::fmt::Debug for VirtualTween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualTween")
            .field("id", &self.id())
            .field("from", &self.inner.from)
            .field("to", &self.inner.to)
            .field("state", &self.state())
            .finish()
    }
}

impl VirtualTween {
    /// 创建虚拟 tween（更新回调不会失败）
    pub fn new(start: f32, end: f32, duration: f32, mut on_update: impl FnMut(f32) + 'static) -> Self {
        Self::try_new(start, end, duration, move |value| {
            on_update(value);
            Ok(())
        })
    }

    /// 创建虚拟 tween（更新回调可失败）
    pub fn try_new(
        start: f32,
        end: f32,
        duration: f32,
        on_update: impl FnMut(f32) -> AccessResult + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(VirtualInner {
                life: Lifecycle::new(),
                clock: RefCell::new(Clock::new(duration)),
                from: start,
                to: end,
                on_update: RefCell::new(Box::new(on_update)),
            }),
        }
    }

    pub fn with_delay(self, delay: f32) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn with_ease(self, ease: Ease) -> Self {
        self.set_ease(ease);
        self
    }

    pub fn with_on_complete(self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete(callback);
        self
    }

    pub fn set_delay(&self, delay: f32) -> &Self {
        if self.inner.life.configurable("delay") {
            self.inner.clock.borrow_mut().set_delay(delay);
        }
        self
    }

    pub fn set_ease(&self, ease: Ease) -> &Self {
        if self.inner.life.configurable("ease") {
            self.inner.clock.borrow_mut().set_ease(ease);
        }
        self
    }

    pub fn on_complete(&self, callback: impl FnOnce() + 'static) -> &Self {
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
    pub fn start_on(&self, scheduler: &Scheduler) -> &Self {
        let driver: Rc<dyn Drive> = self.inner.clone();
        self.inner.life.launch(scheduler, driver);
        self
    }

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

    pub fn ease(&self) -> Ease {
        self.inner.clock.borrow().ease()
    }

    pub fn progress(&self) -> f32 {
        self.inner.clock.borrow().progress()
    }
}
