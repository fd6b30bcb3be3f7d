// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Simulated per-transaction workload.
//!
//! Synthetic load generators for controlled autoscaling experiments: a
//! memory toucher, a sleeper, and a bounded trial-division loop. Their cost
//! is deterministic for a given set of parameters, which is the whole
//! point: experiments need reproducible load, not realistic business logic.

use async_trait::async_trait;

use crate::config::WorkloadConfig;
use crate::store::TxnHandle;
use crate::traits::Processor;

/// Allocate a fresh block of `mb` megabytes and touch both ends so the
/// pages really materialize, then release it.
fn consume_memory(mb: u32) {
    if mb == 0 {
        return;
    }
    let len = mb as usize * 1_000_000;
    let mut buffer = vec![0u8; len];
    buffer[0] = b'a';
    buffer[len - 1] = b'a';
    std::hint::black_box(&buffer);
}

/// Trial-division primality-style loop: divides `n` by every candidate up
/// to `√n` or the first factor found. Bounded and repeatable.
fn consume_compute(n: u32) {
    if n < 2 {
        return;
    }
    let limit = (n as f64).sqrt() as u32;
    for i in 2..=limit {
        if n % i == 0 {
            break;
        }
    }
}

/// Apply one full workload round: memory, then sleep, then compute.
pub async fn simulate(params: &WorkloadConfig) {
    consume_memory(params.memory_mb);
    if params.sleep_ns > 0 {
        tokio::time::sleep(std::time::Duration::from_nanos(params.sleep_ns)).await;
    }
    consume_compute(params.compute);
}

/// The stock stage processor: runs the configured simulated workload for
/// every transaction and leaves the transaction untouched.
pub struct WorkloadProcessor {
    params: WorkloadConfig,
}

impl WorkloadProcessor {
    pub fn new(params: WorkloadConfig) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Processor for WorkloadProcessor {
    async fn process(&self, _txn: TxnHandle) -> anyhow::Result<()> {
        simulate(&self.params).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "workload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_touch_handles_zero_and_nonzero() {
        consume_memory(0);
        consume_memory(2);
    }

    #[test]
    fn compute_is_bounded_for_primes_and_composites() {
        consume_compute(0);
        consume_compute(1);
        consume_compute(7919); // prime: full √n sweep
        consume_compute(7918); // composite: early exit
        consume_compute(u32::MAX);
    }

    #[tokio::test]
    async fn noop_workload_completes_immediately() {
        let params = WorkloadConfig::default();
        assert!(params.is_noop());
        simulate(&params).await;
    }

    #[tokio::test]
    async fn sleep_suspends_for_roughly_the_configured_duration() {
        let params = WorkloadConfig {
            sleep_ns: 20_000_000, // 20ms
            ..WorkloadConfig::default()
        };
        let started = std::time::Instant::now();
        simulate(&params).await;
        assert!(started.elapsed() >= std::time::Duration::from_millis(20));
    }

    #[tokio::test]
    async fn processor_returns_control_with_handle_untouched() {
        let processor = WorkloadProcessor::new(WorkloadConfig::default());
        let handle = TxnHandle::from_raw(99);
        processor.process(handle).await.unwrap();
        assert_eq!(handle.into_raw(), 99);
    }
}
