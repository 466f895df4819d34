use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CmsError, Result};

use super::recorder::{CacheKeys, IdentityRegistry};

/// A cache backend the invalidation service can flush
pub trait CacheAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Contextual caches index entries by the entities they were built from
    fn is_contextual(&self) -> bool;

    /// Drop every entry that depends on any of `keys`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn flush(&self, keys: &CacheKeys) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn flush_all(&self) -> Result<()>;
}

/// What to do when an adapter fails to flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlushFailurePolicy {
    /// Log a warning and keep going
    #[default]
    Log,
    /// Surface `CacheFlushFailure` to the caller
    Raise,
}

/// Flushes contextual caches when entities change
pub struct InvalidationService {
    adapters: Vec<Arc<dyn CacheAdapter>>,
    registry: Arc<IdentityRegistry>,
    policy: FlushFailurePolicy,
}

impl InvalidationService {
    pub fn new(registry: Arc<IdentityRegistry>, policy: FlushFailurePolicy) -> Self {
        Self {
            adapters: Vec::new(),
            registry,
            policy,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn CacheAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn policy(&self) -> FlushFailurePolicy {
        self.policy
    }

    /// Flush every contextual adapter for `keys`
    ///
    /// All adapters are attempted even when one fails.
    ///
    /// # Errors
    ///
    /// With `FlushFailurePolicy::Raise`, returns `CacheFlushFailure` for the
    /// first adapter that failed.
    pub fn invalidate(&self, keys: &CacheKeys) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut first_failure = None;
        for adapter in self.adapters.iter().filter(|a| a.is_contextual()) {
            if let Err(err) = adapter.flush(keys) {
                self.handle_failure(adapter.name(), err, &mut first_failure);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Flush all adapters, contextual or not
    ///
    /// # Errors
    ///
    /// Same policy as `invalidate`.
    pub fn flush_all(&self) -> Result<()> {
        let mut first_failure = None;
        for adapter in &self.adapters {
            if let Err(err) = adapter.flush_all() {
                self.handle_failure(adapter.name(), err, &mut first_failure);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Invalidate caches built from `entity` before it is updated
    ///
    /// # Errors
    ///
    /// Same policy as `invalidate`.
    pub fn on_pre_update<T: Any>(&self, entity: &T) -> Result<()> {
        self.invalidate_entity(entity)
    }

    /// Invalidate caches built from `entity` before it is removed
    ///
    /// # Errors
    ///
    /// Same policy as `invalidate`.
    pub fn on_pre_remove<T: Any>(&self, entity: &T) -> Result<()> {
        self.invalidate_entity(entity)
    }

    fn invalidate_entity<T: Any>(&self, entity: &T) -> Result<()> {
        match self.registry.identify(entity) {
            Some((class, id)) => {
                let mut keys = CacheKeys::new();
                keys.entry(class).or_default().insert(id);
                self.invalidate(&keys)
            }
            None => Ok(()),
        }
    }

    fn handle_failure(&self, cache: &str, err: CmsError, first_failure: &mut Option<CmsError>) {
        tracing::warn!(
            component = module_path!(),
            cache = cache,
            error = %err,
            "cache flush failed"
        );
        if self.policy == FlushFailurePolicy::Raise && first_failure.is_none() {
            *first_failure = Some(CmsError::CacheFlushFailure {
                cache: cache.to_string(),
                reason: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use std::sync::Mutex;

    struct RecordingAdapter {
        contextual: bool,
        fail: bool,
        flushed: Mutex<Vec<CacheKeys>>,
    }

    impl RecordingAdapter {
        fn new(contextual: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                contextual,
                fail,
                flushed: Mutex::new(Vec::new()),
            })
        }
    }

    impl CacheAdapter for RecordingAdapter {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_contextual(&self) -> bool {
            self.contextual
        }

        fn flush(&self, keys: &CacheKeys) -> Result<()> {
            if self.fail {
                return Err(CmsError::Internal {
                    message: "backend down".to_string(),
                });
            }
            self.flushed.lock().unwrap().push(keys.clone());
            Ok(())
        }

        fn flush_all(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_only_contextual_adapters_are_flushed() {
        let contextual = RecordingAdapter::new(true, false);
        let plain = RecordingAdapter::new(false, false);
        let service = InvalidationService::new(Arc::default(), FlushFailurePolicy::Log)
            .with_adapter(contextual.clone())
            .with_adapter(plain.clone());

        service
            .on_pre_update(&Page::new("p1", "s1", "Home", "homepage"))
            .unwrap();

        let flushed = contextual.flushed.lock().unwrap();
        assert_eq!(flushed.len(), 1);
        assert!(flushed[0]["page"].contains("p1"));
        assert!(plain.flushed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_log_policy_swallows_failures() {
        let service = InvalidationService::new(Arc::default(), FlushFailurePolicy::Log)
            .with_adapter(RecordingAdapter::new(true, true));
        assert!(service
            .on_pre_remove(&Page::new("p1", "s1", "Home", "homepage"))
            .is_ok());
    }

    #[test]
    fn test_raise_policy_reports_failure_after_trying_all() {
        let healthy = RecordingAdapter::new(true, false);
        let service = InvalidationService::new(Arc::default(), FlushFailurePolicy::Raise)
            .with_adapter(RecordingAdapter::new(true, true))
            .with_adapter(healthy.clone());

        let err = service
            .on_pre_update(&Page::new("p1", "s1", "Home", "homepage"))
            .unwrap_err();
        assert!(matches!(err, CmsError::CacheFlushFailure { .. }));
        assert_eq!(healthy.flushed.lock().unwrap().len(), 1);
    }
}
