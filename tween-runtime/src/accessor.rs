//! # Accessor 模块
//!
//! 属性访问器接口。引擎只通过 getter/setter 读写属性，
//! 不关心属性属于什么对象、代表什么含义。
//!
//! ## 核心概念
//!
//! - [`PropertyAccessor`]: getter + 可失败的 setter
//! - [`accessor`] / [`try_accessor`]: 用闭包对构造访问器
//! - [`SharedValue`]: `Rc<RefCell<V>>` 包装的共享值
//! - [`WeakValue`]: 弱引用访问器，目标释放后写入返回 [`AccessorError::Detached`]

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::AccessorError;

/// 写入结果
pub type AccessResult = Result<(), AccessorError>;

/// 属性访问器接口
///
/// 提供对单个属性的 getter/setter 访问。
/// getter 只在构造 tween 时调用一次（捕获起始值），之后只调用 setter。
pub trait PropertyAccessor<V> {
    /// 获取当前值
    fn get(&self) -> V;

    /// 设置新值
    fn set(&mut self, value: V) -> AccessResult;
}

/// 闭包访问器（setter 不会失败）
pub struct FnAccessor<G, S> {
    getter: G,
    setter: S,
}

/// 用 getter/setter 闭包对构造访问器
///
/// ```rust,ignore
/// let alpha = Rc::new(Cell::new(1.0));
/// let a = alpha.clone();
/// let b = alpha.clone();
/// let acc = accessor(move || a.get(), move |v| b.set(v));
/// ```
pub fn accessor<V, G, S>(getter: G, setter: S) -> FnAccessor<G, S>
where
    G: Fn() -> V,
    S: FnMut(V),
{
    FnAccessor { getter, setter }
}

impl<V, G, S> PropertyAccessor<V> for FnAccessor<G, S>
where
    G: Fn() -> V,
    S: FnMut(V),
{
    fn get(&self) -> V {
        (self.getter)()
    }

    fn set(&mut self, value: V) -> AccessResult {
        (self.setter)(value);
        Ok(())
    }
}

/// 闭包访问器（setter 可失败）
pub struct TryFnAccessor<G, S> {
    getter: G,
    setter: S,
}

/// 用 getter 与可失败的 setter 构造访问器
pub fn try_accessor<V, G, S>(getter: G, setter: S) -> TryFnAccessor<G, S>
where
    G: Fn() -> V,
    S: FnMut(V) -> AccessResult,
{
    TryFnAccessor { getter, setter }
}

impl<V, G, S> PropertyAccessor<V> for TryFnAccessor<G, S>
where
    G: Fn() -> V,
    S: FnMut(V) -> AccessResult,
{
    fn get(&self) -> V {
        (self.getter)()
    }

    fn set(&mut self, value: V) -> AccessResult {
        (self.setter)(value)
    }
}

/// 共享值
///
/// 使用 `Rc<RefCell<V>>` 包装单个值，克隆后指向同一份数据。
/// 写入时若该值正被借用，返回 [`AccessorError::Borrowed`] 而不是 panic。
pub struct SharedValue<V> {
    value: Rc<RefCell<V>>,
}

impl<V> Clone for SharedValue<V> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for SharedValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_borrow() {
            Ok(v) => f.debug_tuple("SharedValue").field(&*v).finish(),
            Err(_) => f.write_str("SharedValue(<borrowed>)"),
        }
    }
}

impl<V: Copy> SharedValue<V> {
    /// 创建新的共享值
    pub fn new(initial_value: V) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial_value)),
        }
    }

    /// 读取当前值
    pub fn value(&self) -> V {
        *self.value.borrow()
    }

    /// 直接替换当前值（不经过动画）
    pub fn replace(&self, value: V) {
        *self.value.borrow_mut() = value;
    }

    /// 获取内部引用（用于共享）
    pub fn value_ref(&self) -> Rc<RefCell<V>> {
        Rc::clone(&self.value)
    }

    /// 创建弱引用访问器
    pub fn downgrade(&self) -> WeakValue<V> {
        WeakValue {
            value: Rc::downgrade(&self.value),
        }
    }
}

impl<V: Copy> PropertyAccessor<V> for SharedValue<V> {
    fn get(&self) -> V {
        self.value()
    }

    fn set(&mut self, value: V) -> AccessResult {
        let mut slot = self
            .value
            .try_borrow_mut()
            .map_err(|_| AccessorError::Borrowed)?;
        *slot = value;
        Ok(())
    }
}

/// 弱引用访问器
///
/// 不延长目标的生命周期。目标释放后 getter 返回默认值，setter 返回错误。
pub struct WeakValue<V> {
    value: Weak<RefCell<V>>,
}

impl<V> Clone for WeakValue<V> {
    fn clone(&self) -> Self {
        Self {
            value: Weak::clone(&self.value),
        }
    }
}

impl<V> WeakValue<V> {
    /// 目标是否仍然存在
    pub fn is_alive(&self) -> bool {
        self.value.strong_count() > 0
    }
}

impl<V: Copy + Default> PropertyAccessor<V> for WeakValue<V> {
    fn get(&self) -> V {
        let Some(target) = self.value.upgrade() else {
            return V::default();
        };
        let value = target.try_borrow().map(|v| *v).unwrap_or_default();
        value
    }

    fn set(&mut self, value: V) -> AccessResult {
        let target = self.value.upgrade().ok_or(AccessorError::Detached)?;
        let mut slot = target
            .try_borrow_mut()
            .map_err(|_| AccessorError::Borrowed)?;
        *slot = value;
        Ok(())
    }
}
