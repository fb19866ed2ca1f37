use crate::memory::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 手动推进的时钟，用于测试 TTL 过期而无需 sleep
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// 以给定 Unix 毫秒时间戳为起点
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
