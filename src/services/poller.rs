//! # 定时轮询
//!
//! 仪表盘的"挂载时开始轮询、卸载时停止"在桌面端由这里实现：
//! 每个 `Poller` 持有一个 tokio 任务的 `JoinHandle`，
//! 调用 `stop` 或直接丢弃都会中止任务。
//!
//! 已经发出的请求不会被取消，中止只发生在下一个 `.await` 点。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 固定周期的轮询任务
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// 启动轮询；第一次调用立即发生
    ///
    /// # 参数
    /// - `period` - 轮询周期
    /// - `fetch` - 每个周期执行一次的异步取数
    /// - `sink` - 接收每次取数的结果
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn spawn<F, Fut, T, S>(period: Duration, mut fetch: F, mut sink: S) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        S: FnMut(T) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 一次请求超过周期时不补发
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let value = fetch().await;
                sink(value);
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 按 id 管理的一组轮询任务
///
/// 同一 id 重复注册时旧任务被中止。
#[derive(Default)]
pub struct PollerRegistry {
    pollers: Mutex<HashMap<String, Poller>>,
}

impl PollerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, poller: Poller) {
        if let Ok(mut pollers) = self.pollers.lock() {
            pollers.insert(id.into(), poller);
        }
    }

    /// 停止并移除；返回该 id 是否存在
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.pollers.lock().ok().and_then(|mut p| p.remove(id));
        match removed {
            Some(poller) => {
                poller.stop();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pollers.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_poller(period: Duration, counter: Arc<AtomicUsize>) -> Poller {
        Poller::spawn(period, || async { 1usize }, move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_dropped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = counting_poller(Duration::from_millis(100), counter.clone());

        tokio::time::sleep(Duration::from_millis(350)).await;
        let seen = counter.load(Ordering::SeqCst);
        assert!(seen >= 3, "expected at least 3 polls, got {}", seen);

        drop(poller);
        tokio::task::yield_now().await;
        let after_drop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_replaces_and_removes() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let registry = PollerRegistry::new();

        registry.insert("loggers", counting_poller(Duration::from_millis(100), first.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        registry.insert("loggers", counting_poller(Duration::from_millis(100), second.clone()));
        assert_eq!(registry.len(), 1);

        let first_count = first.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(first.load(Ordering::SeqCst), first_count);
        assert!(second.load(Ordering::SeqCst) >= 2);

        assert!(registry.remove("loggers"));
        assert!(!registry.remove("loggers"));
        assert!(registry.is_empty());
    }
}
