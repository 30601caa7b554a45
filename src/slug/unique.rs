use chrono::Utc;
use std::future::Future;

/// Returns `candidate` unchanged if it is free, otherwise `candidate` with a
/// millisecond-timestamp suffix.
///
/// `exists` is consulted exactly once. The suffixed slug is not re-checked, so
/// two colliding creations within the same millisecond can still produce the
/// same slug. When updating a record, `exists` must ignore the record's own
/// row so that keeping the current slug is not reported as a collision.
///
/// Errors from `exists` are returned to the caller untouched.
pub async fn resolve_unique<F, Fut, E>(candidate: String, exists: F) -> Result<String, E>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    if !exists(candidate.clone()).await? {
        return Ok(candidate);
    }

    let resolved = with_disambiguator(&candidate, Utc::now().timestamp_millis());
    log::debug!("Slug '{}' is taken, using '{}'", candidate, resolved);
    Ok(resolved)
}

/// Appends `-<disambiguator>` to a slug.
pub fn with_disambiguator(slug: &str, disambiguator: i64) -> String {
    format!("{}-{}", slug, disambiguator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    fn free(_: String) -> std::future::Ready<Result<bool, String>> {
        std::future::ready(Ok(false))
    }

    fn taken(_: String) -> std::future::Ready<Result<bool, String>> {
        std::future::ready(Ok(true))
    }

    #[test]
    fn test_free_slug_is_unchanged() {
        let slug = block_on(resolve_unique("post".to_string(), free)).unwrap();
        assert_eq!(slug, "post");
    }

    #[test]
    fn test_taken_slug_gets_numeric_suffix() {
        let slug = block_on(resolve_unique("post".to_string(), taken)).unwrap();
        assert_ne!(slug, "post");
        let suffix = slug.strip_prefix("post-").expect("suffix separator");
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit()), "{}", slug);
    }

    #[test]
    fn test_exists_is_checked_once_with_candidate() {
        let calls = Cell::new(0);
        let slug = block_on(resolve_unique("hello-world".to_string(), |s| {
            calls.set(calls.get() + 1);
            assert_eq!(s, "hello-world");
            async { Ok::<_, String>(true) }
        }))
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(slug.starts_with("hello-world-"));
    }

    #[test]
    fn test_own_slug_is_not_a_collision() {
        // Every slug except the record's current one is taken.
        let current = "my-post";
        let slug = block_on(resolve_unique(current.to_string(), |s| async move {
            Ok::<_, String>(s != current)
        }))
        .unwrap();
        assert_eq!(slug, current);
    }

    #[test]
    fn test_lookup_error_propagates() {
        let result = block_on(resolve_unique("post".to_string(), |_| async {
            Err::<bool, _>("connection reset".to_string())
        }));
        assert_eq!(result, Err("connection reset".to_string()));
    }

    #[test]
    fn test_with_disambiguator() {
        assert_eq!(with_disambiguator("post", 1700000000123), "post-1700000000123");
    }
}
