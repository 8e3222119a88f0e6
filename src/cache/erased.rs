//! Type-erased values
//!
//! A cache holding values of different types behind one key space. Reads
//! name the expected type and get `None` when the stored value has another.

use std::any::Any;
use std::sync::Arc;

use crate::cache::{Cache, Ttl};

/// Shared, type-erased cached value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Cache storing values of any `'static` type.
pub type AnyCache = Cache<AnyValue>;

impl Cache<AnyValue> {
    /// Stores `value`, erasing its type.
    pub fn set_value<T>(&self, key: impl Into<String>, value: T, ttl: impl Into<Ttl>, tags: &[&str])
    where
        T: Any + Send + Sync,
    {
        self.set(key, Arc::new(value) as AnyValue, ttl, tags);
    }

    /// Returns the value for `key` if it is present, live and of type `T`.
    pub fn get_as<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(key)?.downcast::<T>().ok()
    }

    /// Typed get-or-compute over erased storage.
    ///
    /// Returns `None` when a live value of another type is already cached
    /// under `key`; `compute` is not called in that case.
    pub fn get_or_compute_as<T, F>(
        &self,
        key: &str,
        compute: F,
        ttl: impl Into<Ttl>,
        tags: &[&str],
    ) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.get_or_compute(key, || Arc::new(compute()) as AnyValue, ttl, tags)
            .downcast::<T>()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[derive(Debug, PartialEq)]
    struct User {
        id: u32,
        name: &'static str,
    }

    #[test]
    fn test_values_of_different_types() {
        let cache = AnyCache::with_defaults().unwrap();

        cache.set_value("user_1", User { id: 1, name: "Vlad" }, Ttl::Default, &[]);
        cache.set_value("count", 3usize, Ttl::Default, &[]);

        assert_eq!(
            cache.get_as::<User>("user_1").as_deref(),
            Some(&User { id: 1, name: "Vlad" })
        );
        assert_eq!(cache.get_as::<usize>("count").as_deref(), Some(&3));
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = AnyCache::new(Config::default()).unwrap();
        cache.set_value("count", 3usize, Ttl::Default, &[]);

        assert!(cache.get_as::<String>("count").is_none());
        assert!(cache.get_as::<usize>("absent").is_none());
    }

    #[test]
    fn test_get_or_compute_as() {
        let cache = AnyCache::with_defaults().unwrap();

        let user =
            cache.get_or_compute_as("user_1", || User { id: 1, name: "Vlad" }, Ttl::Default, &[]);
        assert_eq!(user.map(|u| u.id), Some(1));

        let mismatched = cache.get_or_compute_as::<String, _>(
            "user_1",
            || unreachable!("value is cached"),
            Ttl::Default,
            &[],
        );
        assert!(mismatched.is_none());
    }
}
