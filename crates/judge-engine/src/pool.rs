//! Bounded concurrency for judging.
//!
//! [`JudgePool`] caps how many sessions run at once. Submissions beyond the
//! cap either wait for a slot or are refused, per [`OverflowPolicy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::warn;

use crate::error::{JudgeError, Result};
use crate::session::Judge;
use crate::verdict::{SubmissionRequest, Verdict};

/// Default cap on concurrently running sessions.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// What to do with a submission when every slot is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait for a slot (default).
    #[default]
    Queue,
    /// Refuse with [`JudgeError::Busy`].
    Reject,
}

impl OverflowPolicy {
    /// Parses a policy name, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "queue" => Some(Self::Queue),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    /// The policy's configuration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Reject => "reject",
        }
    }
}

impl<'de> Deserialize<'de> for OverflowPolicy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid overflow policy '{s}': expected one of 'queue', 'reject'"
            ))
        })
    }
}

impl Serialize for OverflowPolicy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A [`Judge`] behind a counting semaphore.
///
/// Cloning is cheap; clones share the same judge and the same slots.
#[derive(Debug, Clone)]
pub struct JudgePool {
    judge: Arc<Judge>,
    slots: Arc<Semaphore>,
    limit: usize,
    overflow: OverflowPolicy,
}

impl JudgePool {
    /// Creates a pool allowing `max_concurrent` sessions at once.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn new(judge: Judge, max_concurrent: usize, overflow: OverflowPolicy) -> Self {
        let limit = max_concurrent.max(1);
        Self {
            judge: Arc::new(judge),
            slots: Arc::new(Semaphore::new(limit)),
            limit,
            overflow,
        }
    }

    /// The underlying judge.
    #[must_use]
    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    /// Maximum number of concurrently running sessions.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of free slots right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Judges a submission once a slot is free.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Busy`] if the pool is full and the policy is
    /// [`OverflowPolicy::Reject`], or [`JudgeError::PoolClosed`] after
    /// [`close`](Self::close).
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<Verdict> {
        let _permit = match self.overflow {
            OverflowPolicy::Queue => self
                .slots
                .acquire()
                .await
                .map_err(|_| JudgeError::PoolClosed)?,
            OverflowPolicy::Reject => match self.slots.try_acquire() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    warn!(limit = self.limit, "Judge pool full, rejecting submission");
                    return Err(JudgeError::Busy { limit: self.limit });
                }
                Err(TryAcquireError::Closed) => return Err(JudgeError::PoolClosed),
            },
        };

        self.judge.judge(request).await
    }

    /// Stops handing out slots. Waiting submissions fail with `PoolClosed`.
    pub fn close(&self) {
        self.slots.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::JudgeOptions;

    const SOURCE: &str = r#"class X { void main() { System.out.println("Hi"); } }"#;

    fn request() -> SubmissionRequest {
        SubmissionRequest::new(SOURCE, None).unwrap()
    }

    fn slow_pool(limit: usize, overflow: OverflowPolicy) -> JudgePool {
        let judge = Judge::new(JudgeOptions::immediate().with_delay(Duration::from_millis(100)));
        JudgePool::new(judge, limit, overflow)
    }

    #[tokio::test]
    async fn test_submit_returns_verdict() {
        let pool = JudgePool::new(Judge::new(JudgeOptions::immediate()), 2, OverflowPolicy::Queue);
        let verdict = pool.submit(&request()).await.unwrap();
        assert_eq!(verdict.simulated_output(), "Hi");
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_reject_when_full() {
        let pool = slow_pool(1, OverflowPolicy::Reject);

        let busy_pool = pool.clone();
        let running = tokio::spawn(async move { busy_pool.submit(&request()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let refused = pool.submit(&request()).await;
        assert_eq!(refused.unwrap_err(), JudgeError::Busy { limit: 1 });

        assert!(running.await.unwrap().unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_queue_waits_for_slot() {
        let pool = slow_pool(1, OverflowPolicy::Queue);

        let first_pool = pool.clone();
        let first = tokio::spawn(async move { first_pool.submit(&request()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = pool.submit(&request()).await.unwrap();
        assert!(second.succeeded());
        assert!(first.await.unwrap().unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_closed_pool_refuses() {
        let pool = JudgePool::new(Judge::new(JudgeOptions::immediate()), 1, OverflowPolicy::Queue);
        pool.close();
        assert_eq!(pool.submit(&request()).await.unwrap_err(), JudgeError::PoolClosed);
    }

    #[test]
    fn test_zero_limit_raised_to_one() {
        let pool = JudgePool::new(Judge::default(), 0, OverflowPolicy::Queue);
        assert_eq!(pool.limit(), 1);
    }

    #[test]
    fn test_overflow_policy_serde() {
        let policy: OverflowPolicy = serde_json::from_str(r#""REJECT""#).unwrap();
        assert_eq!(policy, OverflowPolicy::Reject);
        assert_eq!(serde_json::to_string(&OverflowPolicy::Queue).unwrap(), r#""queue""#);
        assert!(serde_json::from_str::<OverflowPolicy>(r#""drop""#).is_err());
    }
}
