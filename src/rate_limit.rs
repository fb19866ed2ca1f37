/// 按用户限流，由外部实现
pub trait RateLimiter: Send + Sync {
    /// 该标识当前是否允许发起请求
    fn allowed(&self, identity: &str) -> bool;
}

/// 不做任何限制
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn allowed(&self, _identity: &str) -> bool {
        true
    }
}
