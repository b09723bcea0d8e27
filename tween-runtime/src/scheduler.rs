//! # Scheduler 模块
//!
//! 协作式调度器：宿主每帧调用一次 [`Scheduler::tick`]，
//! 调度器把帧间隔分发给所有活跃的 tween，每个 tween 每帧最多推进一次。
//!
//! ## 设计说明
//!
//! - 单线程：所有状态都在宿主的帧线程上修改，内部使用 `Rc<RefCell<_>>`
//! - tick 期间不持有内部借用：回调里可以启动新的 tween、取消别的 tween
//! - tick 期间新注册的 tween 从下一帧开始推进
//! - 写入失败只影响出错的 tween，处理方式由 [`FaultPolicy`] 决定
//!
//! ## 全局调度器
//!
//! [`Scheduler::global`] 在第一次使用时为当前线程创建调度器，
//! 之后一直存在，直到宿主调用 [`Scheduler::shutdown_global`]。
//! 测试直接用 [`Scheduler::new`] 创建独立实例即可。

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::clock::PlayState;
use crate::config::{FaultPolicy, SchedulerConfig};
use crate::error::{AccessorError, Fault, SchedulerError, TickError, TweenResult};

/// tween 唯一标识符
///
/// 进程内递增分配，不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

static NEXT_TWEEN_ID: AtomicU64 = AtomicU64::new(1);

impl TweenId {
    /// 创建 ID（仅用于测试与比较）
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// 分配下一个 ID
    pub(crate) fn next() -> Self {
        Self(NEXT_TWEEN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TweenId({})", self.0)
    }
}

/// 调度事件
#[derive(Debug, Clone, PartialEq)]
pub enum TweenEvent {
    /// tween 已注册
    Started(TweenId),
    /// tween 已完成（终值已写入，完成回调已调用）
    Completed(TweenId),
    /// tween 被取消
    Killed(TweenId),
    /// tween 写入失败被丢弃
    Faulted(TweenId),
}

/// 单次推进的结果
#[derive(Debug)]
pub(crate) enum Step {
    /// 继续下一帧
    Continue,
    /// 已完成
    Completed,
    /// 已被取消
    Killed,
    /// 写入失败
    Faulted(AccessorError),
}

/// 可被调度器驱动的对象
pub(crate) trait Drive {
    fn id(&self) -> TweenId;

    fn state(&self) -> PlayState;

    /// 推进一帧
    fn advance(&self, dt: f32) -> Step;

    /// 取消
    fn kill(&self);
}

struct Entry {
    id: TweenId,
    driver: Rc<dyn Drive>,
}

struct SchedulerInner {
    config: SchedulerConfig,
    /// 已注册的 tween（tick 期间只包含本帧新注册的）
    entries: Vec<Entry>,
    /// 本次 tick 正在推进的批次
    in_flight: Vec<Rc<dyn Drive>>,
    /// 待返回的事件队列
    events: Vec<TweenEvent>,
    /// 已执行的 tick 数
    frame: u64,
    ticking: bool,
}

/// tween 调度器
///
/// 克隆得到的是同一个调度器的另一个引用。
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

/// 不延长调度器生命周期的引用
#[derive(Clone)]
pub(crate) struct WeakScheduler(Weak<RefCell<SchedulerInner>>);

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.0.upgrade().map(|inner| Scheduler { inner })
    }
}

thread_local! {
    static GLOBAL: RefCell<Option<Scheduler>> = const { RefCell::new(None) };
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Scheduler")
                .field("entries", &inner.entries.len())
                .field("frame", &inner.frame)
                .field("fault_policy", &inner.config.fault_policy)
                .finish(),
            Err(_) => f.write_str("Scheduler(<busy>)"),
        }
    }
}

impl Scheduler {
    /// 创建使用默认配置的调度器
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// 使用指定配置创建调度器
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                config,
                entries: Vec::new(),
                in_flight: Vec::new(),
                events: Vec::new(),
                frame: 0,
                ticking: false,
            })),
        }
    }

    // ========== 全局调度器 ==========

    /// 获取当前线程的全局调度器，不存在时以默认配置创建
    pub fn global() -> Scheduler {
        GLOBAL.with(|global| {
            global
                .borrow_mut()
                .get_or_insert_with(|| {
                    info!("创建全局调度器");
                    Scheduler::new()
                })
                .clone()
        })
    }

    /// 以指定配置安装全局调度器
    ///
    /// 必须在第一次使用 [`Scheduler::global`] 之前调用。
    pub fn install_global(config: SchedulerConfig) -> TweenResult<Scheduler> {
        config.validate()?;
        GLOBAL.with(|global| {
            let mut global = global.borrow_mut();
            if global.is_some() {
                return Err(SchedulerError::AlreadyInstalled);
            }
            info!(fault_policy = ?config.fault_policy, "安装全局调度器");
            let scheduler = Scheduler::with_config(config);
            *global = Some(scheduler.clone());
            Ok(scheduler)
        })
    }

    /// 关闭全局调度器
    ///
    /// 取消所有仍在运行的 tween（不调用完成回调），返回取消的数量。
    /// 之后再调用 [`Scheduler::global`] 会创建新的调度器。
    pub fn shutdown_global() -> usize {
        let scheduler = GLOBAL.with(|global| global.borrow_mut().take());
        match scheduler {
            Some(scheduler) => {
                let killed = scheduler.kill_all();
                info!(killed, "全局调度器已关闭");
                killed
            }
            None => 0,
        }
    }

    // ========== 注册与取消 ==========

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Rc::downgrade(&self.inner))
    }

    /// 注册 tween，从下一次 tick 开始推进
    pub(crate) fn register(&self, driver: Rc<dyn Drive>) {
        let id = driver.id();
        let mut inner = self.inner.borrow_mut();
        inner.entries.push(Entry { id, driver });
        inner.events.push(TweenEvent::Started(id));
        debug!(id = %id, "tween 已注册");
    }

    /// 移除已取消的 tween
    ///
    /// 若它正在本次 tick 的批次中，会在被推进时发现已取消并丢弃。
    pub(crate) fn cancel(&self, id: TweenId) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let pos = inner.entries.iter().position(|e| e.id == id);
            let removed = pos.map(|pos| inner.entries.remove(pos));
            if removed.is_some() {
                inner.events.push(TweenEvent::Killed(id));
            }
            removed
        };
        drop(removed);
    }

    /// 取消所有 tween，返回取消的数量
    ///
    /// 在 tick 的回调中调用时，同一批次的 tween 也会被取消：尚未推进的不再推进，
    /// 已推进的在本次 tick 结束时移除。它们的 `Killed` 事件由这次 tick 产生。
    pub fn kill_all(&self) -> usize {
        let (entries, in_flight) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.entries), inner.in_flight.clone())
        };

        let mut killed = Vec::new();
        for entry in &entries {
            if entry.driver.state().is_active() {
                entry.driver.kill();
                killed.push(entry.id);
            }
        }
        let mut count = killed.len();
        for driver in &in_flight {
            if driver.state().is_active() {
                driver.kill();
                count += 1;
            }
        }

        self.inner
            .borrow_mut()
            .events
            .extend(killed.into_iter().map(TweenEvent::Killed));
        drop(entries);
        count
    }

    // ========== 驱动 ==========

    /// 推进一帧
    ///
    /// # 参数
    /// - `dt`: 距上一帧的时间（秒）。负数与非有限值按 0 处理，
    ///   配置了 `max_delta` 时会被截断。
    ///
    /// # 返回
    /// - `Ok(events)`: 本帧（以及上一帧之后）产生的事件
    /// - `Err(TickError)`: 仅 `FaultPolicy::Propagate` 下，本帧有 tween 写入失败。
    ///   其它 tween 已正常推进，事件保留到下一次成功的 tick 或 [`Scheduler::take_events`]。
    pub fn tick(&self, dt: f32) -> Result<Vec<TweenEvent>, TickError> {
        let (batch, policy, dt) = {
            let mut inner = self.inner.borrow_mut();
            if inner.ticking {
                warn!("tick 重入，已忽略");
                return Ok(Vec::new());
            }
            inner.ticking = true;
            inner.frame += 1;
            let dt = inner.config.sanitize_delta(dt);
            let batch = std::mem::take(&mut inner.entries);
            inner.in_flight = batch.iter().map(|e| e.driver.clone()).collect();
            (batch, inner.config.fault_policy, dt)
        };

        let mut survivors = Vec::with_capacity(batch.len());
        let mut events = Vec::new();
        let mut faults = Vec::new();

        for entry in batch {
            match entry.driver.advance(dt) {
                Step::Continue => survivors.push(entry),
                Step::Completed => {
                    debug!(id = %entry.id, "tween 已完成");
                    events.push(TweenEvent::Completed(entry.id));
                }
                Step::Killed => events.push(TweenEvent::Killed(entry.id)),
                Step::Faulted(error) => {
                    events.push(TweenEvent::Faulted(entry.id));
                    match policy {
                        FaultPolicy::Swallow => {
                            warn!(id = %entry.id, error = %error, "写入失败，tween 已丢弃");
                        }
                        FaultPolicy::Propagate => {
                            debug!(id = %entry.id, error = %error, "写入失败，交由宿主处理");
                            faults.push(Fault {
                                id: entry.id,
                                error,
                            });
                        }
                    }
                }
            }
        }

        // 已推进但随后在回调中被取消的
        survivors.retain(|entry| {
            let alive = entry.driver.state().is_active();
            if !alive {
                events.push(TweenEvent::Killed(entry.id));
            }
            alive
        });

        let in_flight = {
            let mut inner = self.inner.borrow_mut();
            let added = std::mem::replace(&mut inner.entries, survivors);
            inner.entries.extend(added);
            inner.events.extend(events);
            inner.ticking = false;
            std::mem::take(&mut inner.in_flight)
        };
        drop(in_flight);

        if !faults.is_empty() {
            return Err(TickError::AccessorFaults { faults });
        }
        Ok(self.take_events())
    }

    // ========== 查询方法 ==========

    /// 取出尚未返回的事件
    pub fn take_events(&self) -> Vec<TweenEvent> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }

    /// 活跃 tween 数量
    ///
    /// tick 期间调用时包含正在推进的批次。
    pub fn active_count(&self) -> usize {
        let inner = self.inner.borrow();
        let registered = inner
            .entries
            .iter()
            .filter(|e| e.driver.state().is_active())
            .count();
        let in_flight = inner
            .in_flight
            .iter()
            .filter(|d| d.state().is_active())
            .count();
        registered + in_flight
    }

    /// 是否有活跃的 tween
    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    /// 已执行的 tick 数
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// 当前配置
    pub fn config(&self) -> SchedulerConfig {
        self.inner.borrow().config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// 测试用驱动：推进固定次数后完成
    struct Countdown {
        id: TweenId,
        left: Cell<u32>,
        state: Cell<PlayState>,
        advanced: Cell<u32>,
    }

    impl Countdown {
        fn new(frames: u32) -> Rc<Self> {
            Rc::new(Self {
                id: TweenId::next(),
                left: Cell::new(frames),
                state: Cell::new(PlayState::Scheduled),
                advanced: Cell::new(0),
            })
        }
    }

    impl Drive for Countdown {
        fn id(&self) -> TweenId {
            self.id
        }

        fn state(&self) -> PlayState {
            self.state.get()
        }

        fn advance(&self, _dt: f32) -> Step {
            if self.state.get() == PlayState::Killed {
                return Step::Killed;
            }
            self.advanced.set(self.advanced.get() + 1);
            let left = self.left.get().saturating_sub(1);
            self.left.set(left);
            if left == 0 {
                self.state.set(PlayState::Completed);
                Step::Completed
            } else {
                self.state.set(PlayState::Running);
                Step::Continue
            }
        }

        fn kill(&self) {
            self.state.set(PlayState::Killed);
        }
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.active_count(), 0);
        assert!(!scheduler.has_active());
        assert_eq!(scheduler.frame(), 0);
    }

    #[test]
    fn test_tick_advances_each_driver_once() {
        let scheduler = Scheduler::new();
        let a = Countdown::new(3);
        let b = Countdown::new(1);
        scheduler.register(a.clone());
        scheduler.register(b.clone());

        let events = scheduler.tick(0.1).unwrap();
        assert_eq!(
            events,
            vec![
                TweenEvent::Started(a.id),
                TweenEvent::Started(b.id),
                TweenEvent::Completed(b.id),
            ]
        );
        assert_eq!(a.advanced.get(), 1);
        assert_eq!(scheduler.active_count(), 1);

        scheduler.tick(0.1).unwrap();
        let events = scheduler.tick(0.1).unwrap();
        assert_eq!(events, vec![TweenEvent::Completed(a.id)]);
        assert_eq!(a.advanced.get(), 3);
        assert!(!scheduler.has_active());
        assert_eq!(scheduler.frame(), 3);
    }

    #[test]
    fn test_cancel_removes_entry() {
        let scheduler = Scheduler::new();
        let a = Countdown::new(5);
        scheduler.register(a.clone());
        scheduler.take_events();

        a.kill();
        scheduler.cancel(a.id);
        assert_eq!(scheduler.take_events(), vec![TweenEvent::Killed(a.id)]);

        scheduler.tick(0.1).unwrap();
        assert_eq!(a.advanced.get(), 0);
    }

    #[test]
    fn test_kill_all() {
        let scheduler = Scheduler::new();
        let a = Countdown::new(5);
        let b = Countdown::new(5);
        scheduler.register(a.clone());
        scheduler.register(b.clone());

        assert_eq!(scheduler.kill_all(), 2);
        assert_eq!(a.state(), PlayState::Killed);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_global_lifecycle() {
        Scheduler::shutdown_global();

        let s1 = Scheduler::global();
        let s2 = Scheduler::global();
        assert!(Rc::ptr_eq(&s1.inner, &s2.inner));

        let result = Scheduler::install_global(SchedulerConfig::default());
        assert_eq!(result.unwrap_err(), SchedulerError::AlreadyInstalled);

        s1.register(Countdown::new(10));
        assert_eq!(Scheduler::shutdown_global(), 1);

        // 关闭后重新创建
        let s3 = Scheduler::global();
        assert!(!Rc::ptr_eq(&s1.inner, &s3.inner));
        Scheduler::shutdown_global();
    }

    #[test]
    fn test_install_global_with_config() {
        Scheduler::shutdown_global();

        let config = SchedulerConfig {
            fault_policy: FaultPolicy::Propagate,
            ..SchedulerConfig::default()
        };
        let installed = Scheduler::install_global(config).unwrap();
        assert_eq!(installed.config().fault_policy, FaultPolicy::Propagate);
        assert_eq!(
            Scheduler::global().config().fault_policy,
            FaultPolicy::Propagate
        );
        Scheduler::shutdown_global();
    }
}
