//! Cache Keys
//!
//! Derives cache keys from upstream paths and decides which keys a
//! mutation makes stale.

use serde_json::Value;

use crate::cache::ResponseCache;
use crate::error::CacheError;

/// Cache key for a GET of `path` with an optional raw query string.
pub fn cache_key(path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    }
}

/// Keys touched by a mutation of `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationScope {
    /// Collection root, e.g. `/children`
    pub collection: String,
    /// Entity root, e.g. `/children/5`; None when the collection itself was mutated
    pub entity: Option<String>,
}

/// Splits `/children/5/preferences` into collection `/children` and entity `/children/5`.
///
/// Returns None for the root path, which names no resource.
pub fn invalidation_scope(path: &str) -> Option<InvalidationScope> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let collection = format!("/{}", segments.next()?);
    let entity = segments.next().map(|id| format!("{}/{}", collection, id));

    Some(InvalidationScope { collection, entity })
}

/// Evicts every cached read derived from the resource `path` mutated.
///
/// The entity and everything below it goes, along with the collection
/// listing. Matching is anchored at the start of the key, so sibling
/// entities whose id merely shares a prefix (`/children/50` for
/// `/children/5`) and nested routes of other collections
/// (`/parents/1/children/5`) are left alone. Reads of these keys still in
/// flight are detached and will not be stored. Returns the number of
/// entries removed.
pub async fn invalidate_for_mutation(cache: &ResponseCache<Value, CacheError>, path: &str) -> usize {
    let Some(scope) = invalidation_scope(path) else {
        return 0;
    };

    let mut removed = 0;
    if let Some(entity) = &scope.entity {
        removed += usize::from(cache.invalidate(entity).await);
        removed += cache.invalidate_prefix(&format!("{}/", entity)).await;
        removed += cache.invalidate_prefix(&format!("{}?", entity)).await;
    } else {
        // Creating into the collection can change any nested listing under it
        removed += cache.invalidate_prefix(&format!("{}/", scope.collection)).await;
    }
    removed += usize::from(cache.invalidate(&scope.collection).await);
    removed += cache.invalidate_prefix(&format!("{}?", scope.collection)).await;

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("/children/5", None), "/children/5");
        assert_eq!(cache_key("/children/5", Some("")), "/children/5");
        assert_eq!(cache_key("/foods", Some("q=arroz")), "/foods?q=arroz");
    }

    #[test]
    fn test_invalidation_scope() {
        assert_eq!(
            invalidation_scope("/children/5/preferences"),
            Some(InvalidationScope {
                collection: "/children".to_string(),
                entity: Some("/children/5".to_string()),
            })
        );
        assert_eq!(
            invalidation_scope("/children/"),
            Some(InvalidationScope {
                collection: "/children".to_string(),
                entity: None,
            })
        );
        assert_eq!(invalidation_scope("/"), None);
    }

    #[tokio::test]
    async fn test_invalidate_for_mutation_spares_prefix_siblings() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        for key in [
            "/children",
            "/children?page=2",
            "/children/5",
            "/children/5/profile",
            "/children/5/preferences?active=true",
            "/children/50",
            "/children/50/profile",
            "/parents/1/children/5/profile",
            "/foods",
        ] {
            cache.set(key, json!(key), None).await;
        }

        let removed = invalidate_for_mutation(&cache, "/children/5/preferences").await;

        assert_eq!(removed, 5);
        assert!(cache.has("/children/50").await);
        assert!(cache.has("/children/50/profile").await);
        assert!(cache.has("/foods").await);
        assert!(cache.has("/parents/1/children/5/profile").await);
        assert!(!cache.has("/children/5/profile").await);
        assert!(!cache.has("/children").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_during_read_keeps_old_body_out_of_cache() {
        let cache = ResponseCache::new(Duration::from_secs(60));

        let (read, _) = tokio::join!(
            cache.fetch(
                "/children/5",
                || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(json!({"prefs": "old"}))
                },
                None,
            ),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                invalidate_for_mutation(&cache, "/children/5/preferences").await
            },
        );

        assert_eq!(read, Ok(json!({"prefs": "old"})));
        assert_eq!(cache.get("/children/5").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_for_collection_mutation() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set("/children", json!([]), None).await;
        cache.set("/children/5", json!({}), None).await;
        cache.set("/foods", json!([]), None).await;

        let removed = invalidate_for_mutation(&cache, "/children").await;

        assert_eq!(removed, 2);
        assert!(cache.has("/foods").await);
    }
}
