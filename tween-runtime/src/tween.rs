//! # Tween 模块
//!
//! 单个插值实例。构造时通过访问器捕获起始值，之后只调用 setter。
//!
//! ## 插值模式
//!
//! | 模式 | 输出 |
//! |------|------|
//! | `Scalar` / `Vector2` / `Vector3` / `Color` | 按分量线性插值 |
//! | `Angular` | 每个欧拉角分量走最短路径 |
//! | `Shake` | `sin(elapsed * speed) * power * eased`，只作用于掩码非零的 X/Y 轴 |
//! | `Punch` | `punch * sin(t·π) * (1 - t)`，结束时回到静止值 |
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let alpha = SharedValue::new(1.0_f32);
//! let tween = Tween::scalar(alpha.clone(), 0.0, 0.3)
//!     .with_ease(Ease::SineOut)
//!     .with_on_complete(|| println!("done"));
//! tween.start_on(&scheduler);
//! ```

use std::cell::RefCell;
use std::f32::consts::PI;
use std::rc::Rc;

use crate::accessor::{AccessResult, PropertyAccessor};
use crate::clock::{Clock, Frame, Lifecycle, PlayState, Sample, drive};
use crate::easing::Ease;
use crate::scheduler::{Drive, Scheduler, Step, TweenId};
use crate::value::{Color, Lerp, Vec2, Vec3};

/// 插值模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenMode {
    Scalar,
    Vector2,
    Vector3,
    Color,
    Angular,
    Shake,
    Punch,
}

/// setter 闭包
pub(crate) type Writer<V> = Box<dyn FnMut(V) -> AccessResult>;

/// 把访问器包装成 setter，并读出当前值
pub(crate) fn split<V, A>(mut accessor: A) -> (V, Writer<V>)
where
    V: 'static,
    A: PropertyAccessor<V> + 'static,
{
    let start = accessor.get();
    (start, writer(accessor))
}

/// 只取写入端，不读取当前值
pub(crate) fn writer<V, A>(mut accessor: A) -> Writer<V>
where
    V: 'static,
    A: PropertyAccessor<V> + 'static,
{
    Box::new(move |value| accessor.set(value))
}

/// 冲击包络：`sin(t·π) · (1 - t)`，两端为 0
pub(crate) fn punch_envelope(t: f32) -> f32 {
    (t * PI).sin() * (1.0 - t)
}

/// 普通插值通道
struct Lane<V> {
    from: V,
    to: V,
    writer: Writer<V>,
}

impl<V: Lerp> Lane<V> {
    fn new(from: V, to: V, writer: Writer<V>) -> Self {
        Self { from, to, writer }
    }

    fn write_at(&mut self, eased: f32) -> AccessResult {
        (self.writer)(self.from.lerp(self.to, eased))
    }

    fn write_end(&mut self) -> AccessResult {
        (self.writer)(self.to)
    }
}

/// 按模式区分的插值数据
enum Motion {
    Scalar(Lane<f32>),
    Vector2(Lane<Vec2>),
    Vector3(Lane<Vec3>),
    Color(Lane<Color>),
    Angular(Lane<Vec3>),
    Shake {
        rest: Vec3,
        axes: Vec3,
        power: f32,
        speed: f32,
        writer: Writer<Vec3>,
    },
    Punch {
        rest: Vec3,
        punch: Vec3,
        writer: Writer<Vec3>,
    },
}

impl Motion {
    fn mode(&self) -> TweenMode {
        match self {
            Motion::Scalar(_) => TweenMode::Scalar,
            Motion::Vector2(_) => TweenMode::Vector2,
            Motion::Vector3(_) => TweenMode::Vector3,
            Motion::Color(_) => TweenMode::Color,
            Motion::Angular(_) => TweenMode::Angular,
            Motion::Shake { .. } => TweenMode::Shake,
            Motion::Punch { .. } => TweenMode::Punch,
        }
    }

    fn write(&mut self, frame: Frame) -> AccessResult {
        match frame {
            Frame::At(sample) => self.write_at(sample),
            Frame::End => self.write_end(),
        }
    }

    fn write_at(&mut self, sample: Sample) -> AccessResult {
        match self {
            Motion::Scalar(lane) => lane.write_at(sample.eased),
            Motion::Vector2(lane) => lane.write_at(sample.eased),
            Motion::Vector3(lane) => lane.write_at(sample.eased),
            Motion::Color(lane) => lane.write_at(sample.eased),
            Motion::Angular(lane) => (lane.writer)(lane.from.lerp_angles(lane.to, sample.eased)),
            Motion::Shake {
                rest,
                axes,
                power,
                speed,
                writer,
            } => {
                let wave = (sample.elapsed * *speed).sin() * *power * sample.eased;
                let offset = Vec3::new(
                    if axes.x != 0.0 { wave } else { 0.0 },
                    if axes.y != 0.0 { wave } else { 0.0 },
                    0.0,
                );
                writer(*rest + offset)
            }
            Motion::Punch {
                rest,
                punch,
                writer,
            } => writer(*rest + *punch * punch_envelope(sample.t)),
        }
    }

    /// 写入终值；Shake 与 Punch 回到静止值
    fn write_end(&mut self) -> AccessResult {
        match self {
            Motion::Scalar(lane) => lane.write_end(),
            Motion::Vector2(lane) => lane.write_end(),
            Motion::Vector3(lane) => lane.write_end(),
            Motion::Color(lane) => lane.write_end(),
            Motion::Angular(lane) => lane.write_end(),
            Motion::Shake { rest, writer, .. } | Motion::Punch { rest, writer, .. } => {
                writer(*rest)
            }
        }
    }
}

struct TweenInner {
    life: Lifecycle,
    mode: TweenMode,
    clock: RefCell<Clock>,
    motion: RefCell<Motion>,
}

impl Drive for TweenInner {
    fn id(&self) -> TweenId {
        self.life.id()
    }

    fn state(&self) -> PlayState {
        self.life.state()
    }

    fn advance(&self, dt: f32) -> Step {
        drive(&self.life, &self.clock, dt, |frame| {
            self.motion.borrow_mut().write(frame)
        })
    }

    fn kill(&self) {
        self.life.kill();
    }
}

/// tween 句柄
///
/// 克隆得到的是同一个 tween 的另一个引用。调度器在 tween 活跃期间持有一份引用，
/// 所以即使调用方丢弃句柄，tween 也会播放到结束。
#[derive(Clone)]
pub struct Tween {
    inner: Rc<TweenInner>,
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id())
            .field("mode", &self.inner.mode)
            .field("state", &self.state())
            .finish()
    }
}

impl Tween {
    fn from_motion(motion: Motion, duration: f32) -> Self {
        Self {
            inner: Rc::new(TweenInner {
                life: Lifecycle::new(),
                mode: motion.mode(),
                clock: RefCell::new(Clock::new(duration)),
                motion: RefCell::new(motion),
            }),
        }
    }

    // ========== 构造 ==========

    /// 标量插值
    pub fn scalar(accessor: impl PropertyAccessor<f32> + 'static, end: f32, duration: f32) -> Self {
        let (start, writer) = split(accessor);
        Self::from_motion(Motion::Scalar(Lane::new(start, end, writer)), duration)
    }

    /// 二维向量插值
    pub fn vector2(accessor: impl PropertyAccessor<Vec2> + 'static, end: Vec2, duration: f32) -> Self {
        let (start, writer) = split(accessor);
        Self::from_motion(Motion::Vector2(Lane::new(start, end, writer)), duration)
    }

    /// 三维向量插值
    pub fn vector3(accessor: impl PropertyAccessor<Vec3> + 'static, end: Vec3, duration: f32) -> Self {
        let (start, writer) = split(accessor);
        Self::from_motion(Motion::Vector3(Lane::new(start, end, writer)), duration)
    }

    /// 颜色插值
    pub fn color(accessor: impl PropertyAccessor<Color> + 'static, end: Color, duration: f32) -> Self {
        let (start, writer) = split(accessor);
        Self::from_motion(Motion::Color(Lane::new(start, end, writer)), duration)
    }

    /// 欧拉角插值（度，每个分量走最短路径）
    pub fn angular(accessor: impl PropertyAccessor<Vec3> + 'static, end: Vec3, duration: f32) -> Self {
        let (start, writer) = split(accessor);
        Self::from_motion(Motion::Angular(Lane::new(start, end, writer)), duration)
    }

    /// 抖动
    ///
    /// # 参数
    /// - `axes`: 轴掩码，分量非零的轴参与抖动（只看 X/Y）
    /// - `power`: 振幅
    /// - `speed`: 角频率
    pub fn shake(
        accessor: impl PropertyAccessor<Vec3> + 'static,
        axes: Vec3,
        duration: f32,
        power: f32,
        speed: f32,
    ) -> Self {
        let (rest, writer) = split(accessor);
        Self::from_motion(
            Motion::Shake {
                rest,
                axes,
                power,
                speed,
                writer,
            },
            duration,
        )
    }

    /// 冲击
    pub fn punch(accessor: impl PropertyAccessor<Vec3> + 'static, duration: f32, punch: Vec3) -> Self {
        let (rest, writer) = split(accessor);
        Self::from_motion(Motion::Punch { rest, punch, writer }, duration)
    }

    // ========== 启动前配置 ==========

    /// 设置延迟（秒）
    pub fn with_delay(self, delay: f32) -> Self {
        self.set_delay(delay);
        self
    }

    /// 设置缓动函数
    pub fn with_ease(self, ease: Ease) -> Self {
        self.set_ease(ease);
        self
    }

    /// 设置完成回调
    pub fn with_on_complete(self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete(callback);
        self
    }

    /// 设置延迟（秒）
    ///
    /// 开始播放后调用无效。
    pub fn set_delay(&self, delay: f32) -> &Self {
        if self.inner.life.configurable("delay") {
            self.inner.clock.borrow_mut().set_delay(delay);
        }
        self
    }

    /// 设置缓动函数
    ///
    /// 开始播放后调用无效。
    pub fn set_ease(&self, ease: Ease) -> &Self {
        if self.inner.life.configurable("ease") {
            self.inner.clock.borrow_mut().set_ease(ease);
        }
        self
    }

    /// 设置完成回调（被取消或写入失败时不会调用）
    ///
    /// 开始播放后调用无效。
    pub fn on_complete(&self, callback: impl FnOnce() + 'static) -> &Self {
        if self.inner.life.configurable("on_complete") {
            self.inner.life.set_on_complete(Box::new(callback));
        }
        self
    }

    // ========== 控制 ==========

    /// 在全局调度器上启动
    pub fn start(&self) -> &Self {
        self.start_on(&Scheduler::global())
    }

    /// 在指定调度器上启动
    ///
    /// 已启动过的 tween 再次调用无效。
    pub fn start_on(&self, scheduler: &Scheduler) -> &Self {
        let driver: Rc<dyn Drive> = self.inner.clone();
        self.inner.life.launch(scheduler, driver);
        self
    }

    /// 取消
    ///
    /// 不会回滚已写入的值，也不会调用完成回调。
    /// 未启动或已结束时调用无效。
    pub fn kill(&self) {
        self.inner.life.kill();
    }

    // ========== 查询 ==========

    pub fn id(&self) -> TweenId {
        self.inner.life.id()
    }

    pub fn mode(&self) -> TweenMode {
        self.inner.mode
    }

    pub fn state(&self) -> PlayState {
        self.inner.life.state()
    }

    /// 是否处于 Scheduled 或 Running
    pub fn is_playing(&self) -> bool {
        self.inner.life.is_playing()
    }

    pub fn duration(&self) -> f32 {
        self.inner.clock.borrow().duration()
    }

    pub fn delay(&self) -> f32 {
        self.inner.clock.borrow().delay()
    }

    pub fn ease(&self) -> Ease {
        self.inner.clock.borrow().ease()
    }

    /// 播放开始后经过的时间（不含延迟）
    pub fn elapsed(&self) -> f32 {
        self.inner.clock.borrow().elapsed()
    }

    /// 原始进度 (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        self.inner.clock.borrow().progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{SharedValue, try_accessor};
    use crate::error::AccessorError;
    use crate::scheduler::TweenEvent;
    use std::cell::Cell;

    /// 记录每次写入的标量属性
    fn recording(initial: f32) -> (Rc<RefCell<Vec<f32>>>, impl PropertyAccessor<f32>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let acc = crate::accessor::accessor(move || initial, move |v| sink.borrow_mut().push(v));
        (log, acc)
    }

    #[test]
    fn test_scalar_linear_scenario() {
        let scheduler = Scheduler::new();
        let (log, acc) = recording(0.0);
        let tween = Tween::scalar(acc, 10.0, 2.0);
        tween.start_on(&scheduler);

        for _ in 0..4 {
            scheduler.tick(0.5).unwrap();
        }

        assert_eq!(*log.borrow(), vec![2.5, 5.0, 7.5, 10.0]);
        assert_eq!(tween.state(), PlayState::Completed);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_end_value_is_exact() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(Vec3::new(0.1, 0.2, 0.3));
        let end = Vec3::new(1.0 / 3.0, 7.7, -2.9);
        Tween::vector3(value.clone(), end, 1.0)
            .with_ease(Ease::Bounce)
            .start_on(&scheduler);

        // 1/60 的累加不会恰好等于 1.0
        for _ in 0..70 {
            scheduler.tick(1.0 / 60.0).unwrap();
        }
        assert_eq!(value.value(), end);
    }

    #[test]
    fn test_zero_duration_writes_end_once() {
        let scheduler = Scheduler::new();
        let (log, acc) = recording(3.0);
        let tween = Tween::scalar(acc, 9.0, 0.0);
        tween.start_on(&scheduler);

        scheduler.tick(0.016).unwrap();

        assert_eq!(*log.borrow(), vec![9.0]);
        assert_eq!(tween.state(), PlayState::Completed);
    }

    #[test]
    fn test_nan_duration_writes_end_once() {
        let scheduler = Scheduler::new();
        let (log, acc) = recording(3.0);
        let tween = Tween::scalar(acc, 9.0, f32::NAN);
        tween.start_on(&scheduler);

        scheduler.tick(0.016).unwrap();

        assert_eq!(*log.borrow(), vec![9.0]);
        assert_eq!(tween.state(), PlayState::Completed);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_state_transitions() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.0_f32);
        let tween = Tween::scalar(value.clone(), 1.0, 1.0).with_delay(0.5);

        assert_eq!(tween.state(), PlayState::Idle);
        assert!(!tween.is_playing());

        tween.start_on(&scheduler);
        assert_eq!(tween.state(), PlayState::Scheduled);
        assert!(tween.is_playing());

        // 延迟期间不写入
        value.replace(42.0);
        scheduler.tick(0.25).unwrap();
        assert_eq!(tween.state(), PlayState::Scheduled);
        assert_eq!(value.value(), 42.0);

        scheduler.tick(0.5).unwrap();
        assert_eq!(tween.state(), PlayState::Running);
        assert!((value.value() - 0.25).abs() < 1e-6);

        scheduler.tick(1.0).unwrap();
        assert_eq!(tween.state(), PlayState::Completed);
        assert_eq!(value.value(), 1.0);
    }

    #[test]
    fn test_kill_stops_writes_and_skips_callback() {
        let scheduler = Scheduler::new();
        let (log, acc) = recording(0.0);
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let tween = Tween::scalar(acc, 1.0, 1.0).with_on_complete(move || flag.set(true));
        tween.start_on(&scheduler);

        scheduler.tick(0.25).unwrap();
        tween.kill();
        let events = scheduler.tick(0.25).unwrap();
        scheduler.tick(1.0).unwrap();

        assert_eq!(log.borrow().len(), 1);
        assert!(!done.get());
        assert_eq!(tween.state(), PlayState::Killed);
        assert!(events.contains(&TweenEvent::Killed(tween.id())));
    }

    #[test]
    fn test_kill_is_idempotent_and_safe_before_start() {
        let scheduler = Scheduler::new();
        let tween = Tween::scalar(SharedValue::new(0.0), 1.0, 1.0);

        tween.kill();
        assert_eq!(tween.state(), PlayState::Idle);

        tween.start_on(&scheduler);
        tween.kill();
        tween.kill();
        assert_eq!(tween.state(), PlayState::Killed);

        let killed = scheduler
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, TweenEvent::Killed(_)))
            .count();
        assert_eq!(killed, 1);
    }

    #[test]
    fn test_kill_during_delay() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(5.0_f32);
        let tween = Tween::scalar(value.clone(), 0.0, 1.0).with_delay(1.0);
        tween.start_on(&scheduler);

        scheduler.tick(0.5).unwrap();
        tween.kill();
        scheduler.tick(2.0).unwrap();

        assert_eq!(value.value(), 5.0);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let scheduler = Scheduler::new();
        let tween = Tween::scalar(SharedValue::new(0.0), 1.0, 1.0);
        tween.start_on(&scheduler).start_on(&scheduler);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_config_ignored_once_running() {
        let scheduler = Scheduler::new();
        let tween = Tween::scalar(SharedValue::new(0.0), 1.0, 1.0);
        tween.start_on(&scheduler).set_ease(Ease::Sine);
        assert_eq!(tween.ease(), Ease::Sine);

        scheduler.tick(0.1).unwrap();
        tween.set_ease(Ease::Bounce).set_delay(3.0);
        assert_eq!(tween.ease(), Ease::Sine);
        assert_eq!(tween.delay(), 0.0);
    }

    #[test]
    fn test_angular_takes_short_path() {
        let scheduler = Scheduler::new();
        let rotation = SharedValue::new(Vec3::zero());
        Tween::angular(rotation.clone(), Vec3::new(0.0, 0.0, 350.0), 1.0).start_on(&scheduler);

        let mut previous = 0.0;
        for _ in 0..3 {
            scheduler.tick(0.25).unwrap();
            let z = rotation.value().z;
            assert!(z < previous, "应该反向旋转: {z}");
            assert!(z >= -10.0);
            previous = z;
        }

        scheduler.tick(0.25).unwrap();
        assert_eq!(rotation.value(), Vec3::new(0.0, 0.0, 350.0));
    }

    #[test]
    fn test_shake_respects_axis_mask() {
        let scheduler = Scheduler::new();
        let start = Vec3::new(1.0, 2.0, 3.0);
        let position = SharedValue::new(start);
        let tween = Tween::shake(position.clone(), Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0, 10.0);
        tween.start_on(&scheduler);

        // elapsed = 0 时偏移为 0
        scheduler.tick(0.0).unwrap();
        assert_eq!(position.value(), start);

        let mut moved = false;
        for _ in 0..25 {
            scheduler.tick(0.05).unwrap();
            let p = position.value();
            assert_eq!(p.y, start.y);
            assert_eq!(p.z, start.z);
            moved |= p.x != start.x;
        }
        assert!(moved);

        // 结束时回到静止值
        assert_eq!(tween.state(), PlayState::Completed);
        assert_eq!(position.value(), start);
    }

    #[test]
    fn test_punch_returns_to_rest() {
        let scheduler = Scheduler::new();
        let rest = Vec3::one();
        let scale = SharedValue::new(rest);
        Tween::punch(scale.clone(), 0.5, Vec3::new(0.5, 0.5, 0.0)).start_on(&scheduler);

        scheduler.tick(0.125).unwrap();
        let mid = scale.value();
        let expected = 0.5 * punch_envelope(0.25);
        assert!((mid.x - (1.0 + expected)).abs() < 1e-6);
        assert_eq!(mid.z, 1.0);

        for _ in 0..4 {
            scheduler.tick(0.125).unwrap();
        }
        assert_eq!(scale.value(), rest);
    }

    #[test]
    fn test_color_interpolates_per_channel() {
        let scheduler = Scheduler::new();
        let color = SharedValue::new(Color::BLACK);
        Tween::color(color.clone(), Color::rgba(1.0, 0.5, 0.0, 0.0), 1.0).start_on(&scheduler);

        scheduler.tick(0.5).unwrap();
        assert_eq!(color.value(), Color::rgba(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn test_accessor_fault_drops_only_faulting_tween() {
        let scheduler = Scheduler::new();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let failing = try_accessor(
            || 0.0_f32,
            move |_| {
                c.set(c.get() + 1);
                Err(AccessorError::rejected("测试"))
            },
        );
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let bad = Tween::scalar(failing, 1.0, 1.0).with_on_complete(move || flag.set(true));
        bad.start_on(&scheduler);

        let healthy = SharedValue::new(0.0_f32);
        Tween::scalar(healthy.clone(), 1.0, 1.0).start_on(&scheduler);

        let events = scheduler.tick(0.5).unwrap();
        assert!(events.contains(&TweenEvent::Faulted(bad.id())));
        scheduler.tick(0.5).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(!done.get());
        assert_eq!(bad.state(), PlayState::Killed);
        assert_eq!(healthy.value(), 1.0);
    }

    #[test]
    fn test_setter_can_kill_own_tween() {
        let scheduler = Scheduler::new();
        let slot: Rc<RefCell<Option<Tween>>> = Rc::new(RefCell::new(None));
        let handle = slot.clone();
        let writes = Rc::new(Cell::new(0));
        let w = writes.clone();
        let acc = crate::accessor::accessor(
            || 0.0_f32,
            move |_| {
                w.set(w.get() + 1);
                if let Some(tween) = handle.borrow().as_ref() {
                    tween.kill();
                }
            },
        );
        let tween = Tween::scalar(acc, 1.0, 1.0);
        *slot.borrow_mut() = Some(tween.clone());
        tween.start_on(&scheduler);

        let events = scheduler.tick(0.1).unwrap();
        scheduler.tick(0.1).unwrap();

        assert_eq!(writes.get(), 1);
        assert!(events.contains(&TweenEvent::Killed(tween.id())));
        slot.borrow_mut().take();
    }

    #[test]
    fn test_on_complete_can_start_new_tween() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.0_f32);
        let follow_up = Tween::scalar(value.clone(), -1.0, 1.0);
        let (s, next) = (scheduler.clone(), follow_up.clone());
        Tween::scalar(value.clone(), 1.0, 0.5)
            .with_on_complete(move || {
                next.start_on(&s);
            })
            .start_on(&scheduler);

        scheduler.tick(0.5).unwrap();
        assert_eq!(value.value(), 1.0);
        assert_eq!(follow_up.state(), PlayState::Scheduled);

        scheduler.tick(1.0).unwrap();
        assert_eq!(follow_up.state(), PlayState::Completed);
        assert_eq!(value.value(), -1.0);
    }
}
