//! # Scenarios 模块
//!
//! 演示场景与固定帧步长的无窗口帧循环。
//!
//! 每个场景在 [`SharedValue`] 上创建若干 tween，并返回一组探针；
//! 帧循环每帧推进调度器后读取探针，把采样值逐行输出。

use std::fmt::Write as _;
use std::io::{self, Write};

use clap::ValueEnum;
use thiserror::Error;
use tracing::{debug, info, warn};
use tween_runtime::{
    Axis, Color, DEFAULT_SHAKE_SPEED, Ease, PressButton, Scheduler, SharedValue, TickError, Tween,
    TweenEvent, Vec2, Vec3, Waiter,
};

use crate::config::HostConfig;

/// 演示场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// 标量 0 -> 10，2 秒，线性
    Fade,
    /// 欧拉角 0 -> 350，走最短路径
    Rotate,
    /// 只在 X 轴上抖动
    Shake,
    /// 冲击缩放
    Punch,
    /// 按钮按下，播放中的重复点击被忽略
    Button,
    /// 完成回调串联、延迟动作与虚拟 tween
    Chain,
}

/// 采样探针
pub struct Probe {
    name: &'static str,
    read: Box<dyn Fn() -> String>,
}

impl Probe {
    fn new(name: &'static str, read: impl Fn() -> String + 'static) -> Self {
        Self {
            name,
            read: Box::new(read),
        }
    }

    fn scalar(name: &'static str, value: &SharedValue<f32>) -> Self {
        let value = value.clone();
        Self::new(name, move || format!("{:.3}", value.value()))
    }

    fn vec2(name: &'static str, value: &SharedValue<Vec2>) -> Self {
        let value = value.clone();
        Self::new(name, move || {
            let v = value.value();
            format!("({:.3}, {:.3})", v.x, v.y)
        })
    }

    fn vec3(name: &'static str, value: &SharedValue<Vec3>) -> Self {
        let value = value.clone();
        Self::new(name, move || {
            let v = value.value();
            format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
        })
    }

    fn color(name: &'static str, value: &SharedValue<Color>) -> Self {
        let value = value.clone();
        Self::new(name, move || {
            let c = value.value();
            format!("rgba({:.3}, {:.3}, {:.3}, {:.3})", c.r, c.g, c.b, c.a)
        })
    }
}

impl Scenario {
    /// 在调度器上布置场景，返回需要采样的探针
    pub fn setup(self, scheduler: &Scheduler) -> Vec<Probe> {
        match self {
            Scenario::Fade => {
                let value = SharedValue::new(0.0_f32);
                Tween::scalar(value.clone(), 10.0, 2.0).start_on(scheduler);
                vec![Probe::scalar("value", &value)]
            }
            Scenario::Rotate => {
                let rotation = SharedValue::new(Vec3::zero());
                scheduler
                    .rotate_axis(&rotation, Axis::Z, 350.0, 1.0)
                    .set_ease(Ease::Sine);
                vec![Probe::vec3("rotation", &rotation)]
            }
            Scenario::Shake => {
                let position = SharedValue::new(Vec3::new(5.0, 5.0, 0.0));
                scheduler.shake_position_axes(
                    &position,
                    Vec3::new(1.0, 0.0, 0.0),
                    1.0,
                    1.0,
                    DEFAULT_SHAKE_SPEED,
                );
                vec![Probe::vec3("position", &position)]
            }
            Scenario::Punch => {
                let scale = SharedValue::new(Vec3::one());
                scheduler.punch_scale(&scale, 0.5, Vec3::new(0.3, 0.3, 0.0));
                vec![Probe::vec3("scale", &scale)]
            }
            Scenario::Button => {
                let scale = SharedValue::new(Vec2::one());
                let button = PressButton::new(scheduler, scale.clone());
                button.on_click(|| info!("按钮点击完成"));
                button.click();

                // 按下过程中再次点击，应被忽略
                Waiter::frames(scheduler, 3, move || {
                    let accepted = button.click();
                    debug!(accepted, "重复点击");
                });
                vec![Probe::vec2("scale", &scale)]
            }
            Scenario::Chain => {
                let color = SharedValue::new(Color::TRANSPARENT);
                let progress = SharedValue::new(0.0_f32);

                // 淡入完成后等待 0.25 秒再淡出，淡出的起始值在启动时才读取
                let (s, target) = (scheduler.clone(), color.clone());
                scheduler
                    .color_to(&color, Color::WHITE, 0.5)
                    .on_complete(move || {
                        let inner = s.clone();
                        Waiter::seconds(&s, 0.25, move || {
                            Tween::color(target, Color::TRANSPARENT, 0.5)
                                .with_ease(Ease::SineIn)
                                .start_on(&inner);
                        });
                    });

                let sink = progress.clone();
                scheduler
                    .virtual_float(0.0, 100.0, 1.25, move |v| sink.replace(v))
                    .set_ease(Ease::SineOut);

                vec![
                    Probe::color("color", &color),
                    Probe::scalar("progress", &progress),
                ]
            }
        }
    }
}

/// 帧循环错误
#[derive(Error, Debug)]
pub enum RunError {
    #[error("帧 {frame} 推进失败: {source}")]
    Tick {
        frame: u32,
        #[source]
        source: TickError,
    },

    #[error("输出失败: {0}")]
    Io(#[from] io::Error),
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub completed: usize,
    pub killed: usize,
    pub faulted: usize,
    /// 达到最大帧数时仍有活跃的 tween
    pub truncated: bool,
}

/// 以固定帧步长推进调度器，直到没有活跃的 tween 或达到最大帧数
pub fn run(
    scheduler: &Scheduler,
    probes: &[Probe],
    host: &HostConfig,
    out: &mut impl Write,
) -> Result<RunSummary, RunError> {
    let dt = host.frame_delta();
    let mut summary = RunSummary::default();

    while scheduler.has_active() {
        if summary.frames >= host.max_frames {
            warn!(max_frames = host.max_frames, "达到最大帧数，提前结束");
            summary.truncated = true;
            break;
        }
        summary.frames += 1;

        let events = scheduler.tick(dt).map_err(|source| RunError::Tick {
            frame: summary.frames,
            source,
        })?;
        for event in &events {
            match event {
                TweenEvent::Started(_) => {}
                TweenEvent::Completed(_) => summary.completed += 1,
                TweenEvent::Killed(_) => summary.killed += 1,
                TweenEvent::Faulted(_) => summary.faulted += 1,
            }
        }

        writeln!(out, "{}", sample_line(summary.frames, dt, probes))?;
    }

    Ok(summary)
}

fn sample_line(frame: u32, dt: f32, probes: &[Probe]) -> String {
    let mut line = format!("frame {frame:>4}  t={:.3}", frame as f32 * dt);
    for probe in probes {
        let _ = write!(line, "  {}={}", probe.name, (probe.read)());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(fps: u32, max_frames: u32) -> HostConfig {
        HostConfig { fps, max_frames }
    }

    fn run_scenario(scenario: Scenario, host: &HostConfig) -> (RunSummary, Vec<String>) {
        let scheduler = Scheduler::new();
        let probes = scenario.setup(&scheduler);
        let mut out = Vec::new();
        let summary = run(&scheduler, &probes, host, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        (summary, text.lines().map(str::to_string).collect())
    }

    #[test]
    fn test_fade_scenario_samples() {
        let (summary, lines) = run_scenario(Scenario::Fade, &host(2, 100));

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.completed, 1);
        insta::assert_snapshot!(lines.join("\n"), @r"
        frame    1  t=0.500  value=2.500
        frame    2  t=1.000  value=5.000
        frame    3  t=1.500  value=7.500
        frame    4  t=2.000  value=10.000
        ");
    }

    #[test]
    fn test_every_scenario_finishes() {
        for scenario in Scenario::value_variants() {
            let (summary, lines) = run_scenario(*scenario, &host(60, 600));
            assert!(!summary.truncated, "{scenario:?} 没有结束");
            assert_eq!(summary.faulted, 0);
            assert_eq!(lines.len(), summary.frames as usize);
        }
    }

    #[test]
    fn test_rotate_scenario_ends_exactly() {
        let (_, lines) = run_scenario(Scenario::Rotate, &host(30, 600));
        let last = lines.last().unwrap();
        assert!(last.ends_with("rotation=(0.000, 0.000, 350.000)"), "{last}");
    }

    #[test]
    fn test_max_frames_truncates() {
        let (summary, lines) = run_scenario(Scenario::Fade, &host(60, 10));
        assert!(summary.truncated);
        assert_eq!(summary.frames, 10);
        assert_eq!(lines.len(), 10);
    }
}
