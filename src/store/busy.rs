//! 全局忙碌信号
//!
//! 引用计数的 loading 指示：每个进行中的网络操作持有一个 [`BusyGuard`]，
//! 计数从 0 变 1 / 从 1 变 0 时通过 watch 通道广播。信号由存储层持有，
//! 不存在模块级可变状态。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// 忙碌信号
#[derive(Debug)]
pub struct BusySignal {
    count: AtomicUsize,
    tx: watch::Sender<bool>,
}

impl BusySignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            count: AtomicUsize::new(0),
            tx,
        }
    }

    /// 占用一个忙碌名额，守卫析构时自动释放
    pub fn acquire(self: &Arc<Self>) -> BusyGuard {
        let prev = self.count.fetch_add(1, Ordering::SeqCst);
        if prev == 0 {
            self.tx.send_replace(true);
        }
        BusyGuard {
            signal: Arc::clone(self),
        }
    }

    /// 当前是否有进行中的操作
    pub fn is_busy(&self) -> bool {
        *self.tx.borrow()
    }

    /// 订阅忙碌状态变化
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn release(&self) {
        let prev = self.count.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 {
            self.tx.send_replace(false);
        }
    }
}

impl Default for BusySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// 忙碌名额守卫
pub struct BusyGuard {
    signal: Arc<BusySignal>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.signal.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refcount_tracks_guards() {
        let signal = Arc::new(BusySignal::new());
        assert!(!signal.is_busy());

        let g1 = signal.acquire();
        let g2 = signal.acquire();
        assert!(signal.is_busy());

        drop(g1);
        assert!(signal.is_busy(), "仍有一个守卫在持有时应保持忙碌");

        drop(g2);
        assert!(!signal.is_busy());
    }

    #[test]
    fn test_subscriber_observes_transitions() {
        let signal = Arc::new(BusySignal::new());
        let mut rx = signal.subscribe();

        let guard = signal.acquire();
        tokio_test::block_on(rx.changed()).expect("应收到忙碌通知");
        assert!(*rx.borrow());

        drop(guard);
        tokio_test::block_on(rx.changed()).expect("应收到空闲通知");
        assert!(!*rx.borrow());
    }
}
