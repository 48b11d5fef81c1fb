//! 可观察状态容器
//!
//! 单线程事件循环下的共享状态：通过 `update` 修改并通知订阅者。
//! 前端把订阅者接到 Leptos signal 上，实现响应式重渲染。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Listener<T> = Rc<dyn Fn(&T)>;

pub struct StateCell<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(usize, Listener<T>)>>,
    next_id: Cell<usize>,
}

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(usize);

impl<T: Clone> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// 当前值的快照
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// 修改并通知订阅者
    ///
    /// 通知时不持有任何借用，订阅者内部可以再次读取状态。
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        let snapshot = self.get();
        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.listeners
            .borrow_mut()
            .retain(|(id, _)| *id != subscription.0);
    }

    pub fn clear_listeners(&self) {
        self.listeners.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_notifies_and_unsubscribe() {
        let cell = Rc::new(StateCell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sub = {
            let seen = seen.clone();
            let inner = cell.clone();
            cell.subscribe(move |v| {
                // 订阅者内可以重新读取
                assert_eq!(inner.get(), *v);
                seen.borrow_mut().push(*v);
            })
        };

        cell.update(|v| *v = 1);
        cell.update(|v| *v += 1);
        cell.unsubscribe(sub);
        cell.update(|v| *v = 10);

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(cell.get(), 10);
    }
}
