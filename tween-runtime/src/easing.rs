//! # Easing 模块
//!
//! 缓动函数库，把线性进度映射为缓动后的进度。
//!
//! 所有函数满足 `f(0) = 0`、`f(1) = 1`，无状态，可在所有 tween 间共享。
//! tween 在设置缓动时通过 [`Ease::curve`] 解析出函数指针，逐帧直接调用，
//! 不再逐帧查表。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动曲线（已解析的函数指针）
pub type EaseCurve = fn(f32) -> f32;

/// 缓动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 正弦缓入缓出
    Sine,
    /// 正弦缓入
    SineIn,
    /// 正弦缓出
    SineOut,
    /// 弹跳缓出
    Bounce,
}

impl Ease {
    /// 全部缓动类型
    pub const ALL: [Ease; 5] = [
        Ease::Linear,
        Ease::Sine,
        Ease::SineIn,
        Ease::SineOut,
        Ease::Bounce,
    ];

    /// 解析为缓动函数
    pub fn curve(self) -> EaseCurve {
        match self {
            Ease::Linear => linear,
            Ease::Sine => sine,
            Ease::SineIn => sine_in,
            Ease::SineOut => sine_out,
            Ease::Bounce => bounce_out,
        }
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)，超出范围会被限制
    pub fn apply(self, t: f32) -> f32 {
        (self.curve())(t.clamp(0.0, 1.0))
    }
}

fn linear(t: f32) -> f32 {
    t
}

fn sine(t: f32) -> f32 {
    0.5 - 0.5 * (PI * t).cos()
}

fn sine_in(t: f32) -> f32 {
    1.0 - (t * PI * 0.5).cos()
}

fn sine_out(t: f32) -> f32 {
    (t * PI * 0.5).sin()
}

/// 弹跳缓出
fn bounce_out(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}
