/// Bounded exponential backoff for storage requests

use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u32,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 500,
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// - attempt 1 → 500ms
    /// - attempt 2 → 750ms
    /// - attempt 3 → 1125ms
    pub fn delay_after(&self, attempt: u32) -> u32 {
        let exponent = attempt.saturating_sub(1) as i32;
        (self.base_delay_ms as f64 * self.multiplier.powi(exponent)).round() as u32
    }

    /// Run `op` until it succeeds or `max_attempts` is reached.
    ///
    /// `sleep` is awaited between attempts, never after the last one. The
    /// error of the final attempt is returned.
    pub async fn run<T, E, Op, OpFut, Sleep, SleepFut>(
        &self,
        mut op: Op,
        mut sleep: Sleep,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        Op: FnMut(u32) -> OpFut,
        OpFut: Future<Output = Result<T, E>>,
        Sleep: FnMut(u32) -> SleepFut,
        SleepFut: Future<Output = ()>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    log::warn!(
                        "Attempt {}/{} failed: {}; retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Resolve after `ms` milliseconds using the page's `setTimeout`
pub async fn sleep_ms(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        } else {
            let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
