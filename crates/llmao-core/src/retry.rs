//! Bounded retry shared by query repair and structured judge parsing.
//!
//! A policy allows `max_retries` extra attempts after the first. Each attempt
//! receives its 1-based number and the previous failure, so the second call
//! can differ from the first (repair instead of generate). There is no
//! backoff: a retryable failure is retried immediately, a fatal one stops.

use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Every failed attempt in order, including the last one when the
    /// result is an error.
    pub failures: Vec<E>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub const fn once() -> Self {
        Self { max_retries: 1 }
    }

    pub const fn none() -> Self {
        Self { max_retries: 0 }
    }

    pub fn max_attempts(&self) -> u32 {
        1 + self.max_retries
    }

    pub async fn run<T, E, C, F, Fut>(&self, classify: C, mut op: F) -> RetryOutcome<T, E>
    where
        E: Clone + std::fmt::Display,
        C: Fn(&E) -> FailureClass,
        F: FnMut(u32, Option<E>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut failures: Vec<E> = Vec::new();
        let mut attempt = 1;
        loop {
            let previous = failures.last().cloned();
            match op(attempt, previous).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        failures,
                        attempts: attempt,
                    }
                }
                Err(err) => {
                    let class = classify(&err);
                    failures.push(err.clone());
                    if class == FailureClass::Fatal || attempt >= self.max_attempts() {
                        return RetryOutcome {
                            result: Err(err),
                            failures,
                            attempts: attempt,
                        };
                    }
                    tracing::debug!(
                        event = "llmao.retry.retrying",
                        attempt,
                        error = %err,
                        "retrying after recoverable failure"
                    );
                    attempt += 1;
                }
            }
        }
    }
}
