//! # Presets 模块
//!
//! 常用属性动画的快捷方法：创建 tween、立即在当前调度器上启动并返回句柄。
//! 目标统一使用 [`SharedValue`]，属性含义由调用方决定。
//!
//! ```rust,ignore
//! let position = SharedValue::new(Vec3::zero());
//! scheduler.move_axis(&position, Axis::Y, 120.0, 0.4).set_ease(Ease::SineOut);
//! ```

use crate::accessor::{SharedValue, try_accessor};
use crate::error::AccessorError;
use crate::scheduler::Scheduler;
use crate::tween::Tween;
use crate::value::{Axis, Color, Vec2, Vec3};
use crate::virtual_tween::VirtualTween;

/// 抖动速度的默认档位
pub const DEFAULT_SHAKE_SPEED: u32 = 3;

/// 档位到角频率的倍率
const SHAKE_SPEED_SCALE: f32 = 10.0;

/// 移出方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    /// 从当前位置出发，沿该方向移出 `distance` 后的位置
    ///
    /// 只替换移动方向上的分量，另一个分量保持不变。
    pub fn offscreen(self, from: Vec2, distance: f32) -> Vec2 {
        match self {
            SlideDirection::Up => Vec2::new(from.x, distance),
            SlideDirection::Down => Vec2::new(from.x, -distance),
            SlideDirection::Left => Vec2::new(-distance, from.y),
            SlideDirection::Right => Vec2::new(distance, from.y),
        }
    }
}

impl Scheduler {
    fn launch(&self, tween: Tween) -> Tween {
        tween.start_on(self);
        tween
    }

    // ========== 位置 / 旋转 / 缩放 ==========

    /// 移动到目标位置
    pub fn move_to(&self, target: &SharedValue<Vec3>, end: Vec3, duration: f32) -> Tween {
        self.launch(Tween::vector3(target.clone(), end, duration))
    }

    /// 只移动一个轴，其余分量保持当前值
    pub fn move_axis(&self, target: &SharedValue<Vec3>, axis: Axis, value: f32, duration: f32) -> Tween {
        let end = target.value().with_axis(axis, value);
        self.move_to(target, end, duration)
    }

    /// 旋转到目标欧拉角（度，最短路径）
    pub fn rotate_to(&self, target: &SharedValue<Vec3>, end: Vec3, duration: f32) -> Tween {
        self.launch(Tween::angular(target.clone(), end, duration))
    }

    /// 只旋转一个轴
    pub fn rotate_axis(&self, target: &SharedValue<Vec3>, axis: Axis, degrees: f32, duration: f32) -> Tween {
        let end = target.value().with_axis(axis, degrees);
        self.rotate_to(target, end, duration)
    }

    /// 缩放到目标值
    pub fn scale_to(&self, target: &SharedValue<Vec3>, end: Vec3, duration: f32) -> Tween {
        self.launch(Tween::vector3(target.clone(), end, duration))
    }

    /// 二维锚点位置
    pub fn anchor_to(&self, target: &SharedValue<Vec2>, end: Vec2, duration: f32) -> Tween {
        self.launch(Tween::vector2(target.clone(), end, duration))
    }

    /// 把二维锚点移出可见区域
    ///
    /// `distance` 通常取画布或自身的高（上下）或宽（左右）。
    pub fn hide(
        &self,
        target: &SharedValue<Vec2>,
        direction: SlideDirection,
        distance: f32,
        duration: f32,
    ) -> Tween {
        let end = direction.offscreen(target.value(), distance);
        self.anchor_to(target, end, duration)
    }

    /// 把二维锚点移回原点，或移到给定的偏移
    pub fn show(&self, target: &SharedValue<Vec2>, offset: Option<Vec2>, duration: f32) -> Tween {
        self.anchor_to(target, offset.unwrap_or_else(Vec2::zero), duration)
    }

    // ========== 透明度 / 颜色 ==========

    /// 标量渐变（透明度、音量等）
    pub fn fade(&self, target: &SharedValue<f32>, end: f32, duration: f32) -> Tween {
        self.launch(Tween::scalar(target.clone(), end, duration))
    }

    /// 颜色渐变
    pub fn color_to(&self, target: &SharedValue<Color>, end: Color, duration: f32) -> Tween {
        self.launch(Tween::color(target.clone(), end, duration))
    }

    /// 只改变颜色的 alpha 通道
    ///
    /// 每次写入时读取当前颜色，其它通道在播放期间被修改也会保留。
    pub fn fade_alpha(&self, target: &SharedValue<Color>, alpha: f32, duration: f32) -> Tween {
        let (reader, writer) = (target.value_ref(), target.value_ref());
        let accessor = try_accessor(
            move || reader.try_borrow().map(|c| c.a).unwrap_or_default(),
            move |a| {
                let mut color = writer.try_borrow_mut().map_err(|_| AccessorError::Borrowed)?;
                color.a = a;
                Ok(())
            },
        );
        self.launch(Tween::scalar(accessor, alpha, duration))
    }

    // ========== 效果 ==========

    /// 在 X/Y 轴上抖动位置
    ///
    /// `speed` 为档位，实际角频率为 `speed * 10`。
    pub fn shake_position(&self, target: &SharedValue<Vec3>, duration: f32, intensity: f32, speed: u32) -> Tween {
        self.shake_position_axes(target, Vec3::one(), duration, intensity, speed)
    }

    /// 在指定轴上抖动位置
    pub fn shake_position_axes(
        &self,
        target: &SharedValue<Vec3>,
        axes: Vec3,
        duration: f32,
        intensity: f32,
        speed: u32,
    ) -> Tween {
        let speed = speed as f32 * SHAKE_SPEED_SCALE;
        self.launch(Tween::shake(target.clone(), axes, duration, intensity, speed))
    }

    /// 冲击缩放
    pub fn punch_scale(&self, target: &SharedValue<Vec3>, duration: f32, punch: Vec3) -> Tween {
        self.launch(Tween::punch(target.clone(), duration, punch))
    }

    // ========== 虚拟值 ==========

    /// 启动一个虚拟 tween，每帧把插值交给 `on_update`
    pub fn virtual_float(
        &self,
        start: f32,
        end: f32,
        duration: f32,
        on_update: impl FnMut(f32) + 'static,
    ) -> VirtualTween {
        let tween = VirtualTween::new(start, end, duration, on_update);
        tween.start_on(self);
        tween
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PlayState;
    use crate::tween::TweenMode;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_move_axis_keeps_other_components() {
        let scheduler = Scheduler::new();
        let position = SharedValue::new(Vec3::new(1.0, 2.0, 3.0));
        let tween = scheduler.move_axis(&position, Axis::Y, 10.0, 1.0);
        assert_eq!(tween.state(), PlayState::Scheduled);

        scheduler.tick(0.5).unwrap();
        assert_eq!(position.value(), Vec3::new(1.0, 6.0, 3.0));

        scheduler.tick(0.5).unwrap();
        assert_eq!(position.value(), Vec3::new(1.0, 10.0, 3.0));
    }

    #[test]
    fn test_hide_moves_along_one_axis() {
        let cases = [
            (SlideDirection::Up, Vec2::new(3.0, 600.0)),
            (SlideDirection::Down, Vec2::new(3.0, -600.0)),
            (SlideDirection::Left, Vec2::new(-600.0, 4.0)),
            (SlideDirection::Right, Vec2::new(600.0, 4.0)),
        ];
        for (direction, expected) in cases {
            let scheduler = Scheduler::new();
            let anchor = SharedValue::new(Vec2::new(3.0, 4.0));
            let tween = scheduler.hide(&anchor, direction, 600.0, 0.5);
            assert_eq!(tween.mode(), TweenMode::Vector2);

            scheduler.tick(0.5).unwrap();
            assert_eq!(anchor.value(), expected, "{direction:?}");
        }
    }

    #[test]
    fn test_show_returns_to_origin_or_offset() {
        let scheduler = Scheduler::new();
        let anchor = SharedValue::new(Vec2::new(0.0, 600.0));
        scheduler.show(&anchor, None, 0.4);
        scheduler.tick(0.2).unwrap();
        assert_eq!(anchor.value(), Vec2::new(0.0, 300.0));
        scheduler.tick(0.2).unwrap();
        assert_eq!(anchor.value(), Vec2::zero());

        scheduler.show(&anchor, Some(Vec2::new(10.0, -5.0)), 0.4);
        scheduler.tick(0.4).unwrap();
        assert_eq!(anchor.value(), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn test_rotate_axis_is_angular() {
        let scheduler = Scheduler::new();
        let rotation = SharedValue::new(Vec3::new(0.0, 10.0, 0.0));
        let tween = scheduler.rotate_axis(&rotation, Axis::Y, 350.0, 1.0);
        assert_eq!(tween.mode(), TweenMode::Angular);

        scheduler.tick(0.5).unwrap();
        assert_eq!(rotation.value().y, 0.0);
    }

    #[test]
    fn test_fade_alpha_keeps_rgb() {
        let scheduler = Scheduler::new();
        let color = SharedValue::new(Color::rgba(0.2, 0.4, 0.6, 1.0));
        scheduler.fade_alpha(&color, 0.0, 1.0);

        scheduler.tick(0.5).unwrap();
        // 播放期间修改 rgb
        color.replace(Color::rgba(0.9, 0.9, 0.9, color.value().a));
        scheduler.tick(0.5).unwrap();

        assert_eq!(color.value(), Color::rgba(0.9, 0.9, 0.9, 0.0));
    }

    #[test]
    fn test_shake_position_scales_speed() {
        let scheduler = Scheduler::new();
        let position = SharedValue::new(Vec3::zero());
        scheduler.shake_position(&position, 1.0, 2.0, DEFAULT_SHAKE_SPEED);

        scheduler.tick(0.1).unwrap();
        let expected = (0.1_f32 * 30.0).sin() * 2.0 * 0.1;
        let p = position.value();
        assert!((p.x - expected).abs() < 1e-5);
        assert_eq!(p.x, p.y);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_virtual_float_starts_immediately() {
        let scheduler = Scheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        scheduler.virtual_float(0.0, 100.0, 1.0, move |v| sink.borrow_mut().push(v));

        scheduler.tick(0.25).unwrap();
        scheduler.tick(1.0).unwrap();
        assert_eq!(*seen.borrow(), vec![25.0, 100.0]);
    }
}
