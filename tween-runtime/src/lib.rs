//! # Tween Runtime
//!
//! 与属性类型无关的 tween 调度引擎。
//!
//! ## 架构概述
//!
//! `tween-runtime` 不依赖任何 IO 或渲染引擎，也不知道自己修改的是什么属性。
//! 宿主每帧调用一次 [`Scheduler::tick`]，调度器推进所有活跃的 tween，
//! tween 通过调用方提供的访问器写入插值结果：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── tick(dt) ───────────────────►│ Scheduler
//!   │                                   │   └─ Tween::advance
//!   │◄─── PropertyAccessor::set ───────│        (每帧一次)
//!   │◄─── Vec<TweenEvent> ─────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`Tween`]：插值实例（标量、向量、颜色、角度、抖动、冲击）
//! - [`VirtualTween`]：只把插值交给更新回调的标量 tween
//! - [`ButtonTween`] / [`PressButton`]：按钮按下效果
//! - [`Waiter`]：延迟执行
//! - [`Scheduler`]：协作式调度器
//! - [`PropertyAccessor`]：属性访问器
//! - [`Ease`]：缓动函数
//!
//! ## 使用示例
//!
//! ```ignore
//! use tween_runtime::{Ease, Scheduler, SharedValue, Tween};
//!
//! let scheduler = Scheduler::new();
//! let alpha = SharedValue::new(0.0_f32);
//!
//! Tween::scalar(alpha.clone(), 1.0, 0.5)
//!     .with_ease(Ease::SineOut)
//!     .with_on_complete(|| println!("淡入完成"))
//!     .start_on(&scheduler);
//!
//! // 主循环
//! loop {
//!     let events = scheduler.tick(frame_dt)?;
//!     render(alpha.value());
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`accessor`]：属性访问器与共享值
//! - [`clock`]：时钟与播放状态
//! - [`config`]：调度器配置
//! - [`easing`]：缓动函数
//! - [`error`]：错误类型定义
//! - [`scheduler`]：调度器
//! - [`tween`]：tween 句柄
//! - [`value`]：可插值的值类型

pub mod accessor;
pub mod button;
pub mod clock;
pub mod config;
pub mod easing;
pub mod error;
pub mod presets;
pub mod scheduler;
pub mod tween;
pub mod value;
pub mod virtual_tween;
pub mod waiter;

// 重导出核心类型
pub use accessor::{
    AccessResult, FnAccessor, PropertyAccessor, SharedValue, TryFnAccessor, WeakValue, accessor,
    try_accessor,
};
pub use button::{ButtonTween, PressButton};
pub use clock::PlayState;
pub use config::{FaultPolicy, SchedulerConfig};
pub use easing::Ease;
pub use error::{AccessorError, ConfigError, Fault, SchedulerError, TickError, TweenResult};
pub use presets::{DEFAULT_SHAKE_SPEED, SlideDirection};
pub use scheduler::{Scheduler, TweenEvent, TweenId};
pub use tween::{Tween, TweenMode};
pub use value::{Axis, Color, Lerp, Vec2, Vec3, lerp_angle};
pub use virtual_tween::VirtualTween;
pub use waiter::{WaitHandle, Waiter};
