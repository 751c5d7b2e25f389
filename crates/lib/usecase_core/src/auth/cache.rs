//! Expiry-aware bearer token cache.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AccessTokenProvider, AuthError, TokenSource};

/// A cached token is refreshed once it is within this window of expiry.
pub const REFRESH_SKEW_MS: i64 = 60_000;

/// Lifetime assumed when the identity endpoint omits an expiry: 5 minutes.
pub const DEFAULT_LIFETIME_MS: i64 = 300_000;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// The token currently held by a [`TokenCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at_ms: i64,
}

impl CachedToken {
    /// Usable while `now < expires_at - 60s`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms - REFRESH_SKEW_MS
    }
}

/// Wraps a [`TokenSource`] and reuses its token until shortly before expiry.
///
/// Refresh is single-flight: the lock is held across the exchange, so
/// concurrent callers wait for the in-flight refresh instead of starting
/// their own. A failed exchange leaves the cache as it was; the next call
/// tries again.
pub struct TokenCache<S> {
    source: S,
    current: Mutex<Option<CachedToken>>,
    clock: Clock,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: Mutex::new(None),
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replaces the wall clock (epoch milliseconds).
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the cached token or exchanges a new one.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let mut current = self.current.lock().await;
        let now = (self.clock)();

        if let Some(token) = current.as_ref()
            && token.is_fresh(now)
        {
            return Ok(token.access_token.clone());
        }

        let acquired = self.source.fetch_token().await?;
        if acquired.access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let expires_at_ms = acquired.expires_at_ms.unwrap_or(now + DEFAULT_LIFETIME_MS);
        debug!(expires_at_ms, "acquired new access token");

        let token = acquired.access_token;
        *current = Some(CachedToken {
            access_token: token.clone(),
            expires_at_ms,
        });
        Ok(token)
    }

    /// Snapshot of the cached token, if any.
    pub async fn cached(&self) -> Option<CachedToken> {
        self.current.lock().await.clone()
    }
}

#[async_trait]
impl<S: TokenSource> AccessTokenProvider for TokenCache<S> {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.get_access_token().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    use super::*;
    use crate::auth::AcquiredToken;

    const T0: i64 = 1_700_000_000_000;

    /// Issues `token-1`, `token-2`, ... each valid for `lifetime_ms`.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        clock: Arc<AtomicI64>,
        lifetime_ms: Option<i64>,
        fail: bool,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<AcquiredToken, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AuthError::MissingToken);
            }
            Ok(AcquiredToken {
                access_token: format!("token-{n}"),
                expires_at_ms: self
                    .lifetime_ms
                    .map(|l| self.clock.load(Ordering::SeqCst) + l),
            })
        }
    }

    fn cache(lifetime_ms: Option<i64>, fail: bool) -> (TokenCache<CountingSource>, Arc<AtomicUsize>, Arc<AtomicI64>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = Arc::new(AtomicI64::new(T0));
        let source = CountingSource {
            calls: calls.clone(),
            clock: clock.clone(),
            lifetime_ms,
            fail,
        };
        let reader = clock.clone();
        let cache = TokenCache::new(source).with_clock(move || reader.load(Ordering::SeqCst));
        (cache, calls, clock)
    }

    #[tokio::test]
    async fn reuses_token_until_sixty_seconds_before_expiry() {
        let (cache, calls, clock) = cache(Some(120_000), false);

        assert_eq!(cache.get_access_token().await.unwrap(), "token-1");

        clock.store(T0 + 30_000, Ordering::SeqCst);
        assert_eq!(cache.get_access_token().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.store(T0 + 61_000, Ordering::SeqCst);
        assert_eq!(cache.get_access_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn boundary_is_exclusive() {
        let (cache, calls, clock) = cache(Some(120_000), false);
        cache.get_access_token().await.unwrap();

        clock.store(T0 + 59_999, Ordering::SeqCst);
        cache.get_access_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.store(T0 + 60_000, Ordering::SeqCst);
        cache.get_access_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_expiry_defaults_to_five_minutes() {
        let (cache, _calls, _clock) = cache(None, false);
        cache.get_access_token().await.unwrap();
        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.expires_at_ms, T0 + DEFAULT_LIFETIME_MS);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (cache, calls, _clock) = cache(Some(120_000), true);
        assert!(cache.get_access_token().await.is_err());
        assert!(cache.get_access_token().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.cached().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let (cache, calls, _clock) = cache(Some(3_600_000), false);
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_access_token().await.unwrap() })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token-1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
