//! Client-side CSRF token cache.
//!
//! The lock is held while a token is fetched, so callers that queue up behind a
//! first fetch reuse its result instead of issuing their own request.

use std::future::Future;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct CsrfCache {
    token: Mutex<Option<String>>,
}

impl CsrfCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, running `fetch` first when the cache is empty.
    ///
    /// A fetch yielding `None` leaves the cache empty, so the next call fetches again.
    pub async fn ensure<F, Fut>(&self, fetch: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let mut token = self.token.lock().await;
        if token.is_none() {
            *token = fetch().await;
        }
        token.clone()
    }

    /// Replace the cached token with a fresh fetch, even when it yields nothing.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let mut token = self.token.lock().await;
        *token = fetch().await;
        token.clone()
    }

    pub async fn current(&self) -> Option<String> {
        self.token.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: Option<&'static str>,
    ) -> impl FnOnce() -> std::future::Ready<Option<String>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(value.map(str::to_string))
        }
    }

    #[tokio::test]
    async fn ensure_fetches_once_then_reuses() {
        let cache = CsrfCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(
            cache.ensure(counting_fetch(&calls, Some("t1"))).await,
            Some("t1".to_string())
        );
        assert_eq!(
            cache.ensure(counting_fetch(&calls, Some("t2"))).await,
            Some("t1".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_on_next_ensure() {
        let cache = CsrfCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.ensure(counting_fetch(&calls, None)).await, None);
        assert_eq!(
            cache.ensure(counting_fetch(&calls, Some("t1"))).await,
            Some("t1".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_overwrites_even_with_nothing() {
        let cache = CsrfCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.ensure(counting_fetch(&calls, Some("t1"))).await;
        assert_eq!(
            cache.refresh(counting_fetch(&calls, Some("t2"))).await,
            Some("t2".to_string())
        );
        assert_eq!(cache.refresh(counting_fetch(&calls, None)).await, None);
        assert_eq!(cache.current().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn concurrent_first_fetches_are_coalesced() {
        let cache = Arc::new(CsrfCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .ensure(|| async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Some("shared".to_string())
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.ok().flatten(), Some("shared".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
