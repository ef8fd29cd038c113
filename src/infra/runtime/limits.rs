use std::time::Duration;

use crate::infra::config::ClientConfig;

/// Build a reqwest client from the configured timeouts.
pub fn make_http_client_with(cfg: &ClientConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
}

/// Exponential backoff for async ops. `retryable` decides whether an error is
/// worth another attempt; `attempts` is the number of retries after the first
/// try.
pub async fn retry_async<T, E, Fut, F, R>(mut attempts: u32, retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut try_num: u32 = 0;
    let mut delay_ms: u64 = 50;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !retryable(&e) {
                    return Err(e);
                }
                attempts -= 1;
                tracing::debug!(attempt = try_num + 1, delay_ms, "retrying upstream call");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(1_000);
                try_num += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::retry_async;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn it_retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let res: Result<i32, i32> = retry_async(3, |_| true, |_| {
            let c = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if c < 3 {
                    Err(-1)
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn it_stops_on_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let res: Result<i32, i32> = retry_async(5, |e| *e != 404, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(404) }
        })
        .await;
        assert_eq!(res.unwrap_err(), 404);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn client_builds_from_default_config() {
        let cfg = crate::infra::config::ClientConfig::default();
        assert!(super::make_http_client_with(&cfg).is_ok());
    }
}
