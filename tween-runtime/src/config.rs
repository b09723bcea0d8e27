//! # Config 模块
//!
//! 调度器配置。可以直接构造，也可以作为宿主配置文件的一部分反序列化。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 访问器写入失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// 记录警告并丢弃出错的 tween，tick 照常返回
    #[default]
    Swallow,
    /// 丢弃出错的 tween，并通过 `tick` 的 `Err` 交给宿主处理
    Propagate,
}

/// 调度器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 写入失败处理方式
    pub fault_policy: FaultPolicy,

    /// 单帧时间上限（秒）
    ///
    /// 宿主卡顿后的超长帧会被截断到该值，`None` 表示不限制。
    pub max_delta: Option<f32>,
}

impl SchedulerConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_delta
            && !(max.is_finite() && max > 0.0)
        {
            return Err(ConfigError::InvalidValue {
                field: "max_delta".to_string(),
                message: format!("必须为正数，实际为 {max}"),
            });
        }
        Ok(())
    }

    /// 规整帧间隔
    pub(crate) fn sanitize_delta(&self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.max_delta {
            Some(max) => dt.min(max),
            None => dt,
        }
    }
}
