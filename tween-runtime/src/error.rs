//! # Error 模块
//!
//! 定义 tween-runtime 中使用的错误类型。

use thiserror::Error;

use crate::scheduler::TweenId;

/// 访问器错误
///
/// 由 `PropertyAccessor::set` 或更新回调返回，表示本次写入失败。
/// 出错的 tween 会被调度器丢弃，不会影响其它 tween。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessorError {
    /// 目标已被释放
    #[error("属性目标已被释放")]
    Detached,

    /// 目标正被借用，无法写入
    #[error("属性目标正被借用，无法写入")]
    Borrowed,

    /// 回调主动拒绝写入
    #[error("写入被拒绝: {reason}")]
    Rejected { reason: String },
}

impl AccessorError {
    /// 创建拒绝错误
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// 单个 tween 的写入故障
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    /// 出错的 tween
    pub id: TweenId,
    /// 访问器返回的错误
    pub error: AccessorError,
}

/// tick 错误
///
/// 仅在 `FaultPolicy::Propagate` 下返回。同一 tick 内其它 tween 仍已正常推进。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    /// 本 tick 内有 tween 写入失败
    #[error("{} 个 tween 写入失败（首个: {}）", .faults.len(), first_fault(.faults))]
    AccessorFaults { faults: Vec<Fault> },
}

fn first_fault(faults: &[Fault]) -> String {
    faults
        .first()
        .map(|f| format!("{} - {}", f.id, f.error))
        .unwrap_or_default()
}

/// 调度器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// 全局调度器已经存在
    #[error("全局调度器已初始化，无法重复安装")]
    AlreadyInstalled,

    /// 配置无效
    #[error("调度器配置无效: {0}")]
    Config(#[from] ConfigError),
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 字段取值无效
    #[error("字段 '{field}' 的值无效 - {message}")]
    InvalidValue { field: String, message: String },
}

/// Result 类型别名
pub type TweenResult<T> = Result<T, SchedulerError>;
