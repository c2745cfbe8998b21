//! Read/write statement classification
//!
//! The cache must only ever store results of statements that do not
//! modify data. Classification is lexical and deliberately conservative:
//! treating a read as a write merely costs a cache miss, while treating a
//! write as a read would serve stale rows. Anything not confidently a
//! read is handled as a potential mutation.

/// Decides whether a statement is a cacheable read.
///
/// Implementations receive the normalized (trimmed, lower-cased)
/// statement text. Swap in a custom classifier via
/// [`CachingConnection::with_classifier`](crate::CachingConnection::with_classifier)
/// when the default lexical check is too strict for a deployment.
pub trait StatementClassifier: Send + Sync {
    /// True if the statement is a read whose result may be cached.
    fn is_read(&self, normalized_sql: &str) -> bool;
}

/// Default classifier: only statements beginning with the `select`
/// keyword count as reads.
///
/// `WITH`, `SHOW`, `EXPLAIN` and friends are not treated as cacheable
/// even though they usually read: a CTE can open with a data-modifying
/// statement, and the cost of the false negative is one extra round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalClassifier;

impl StatementClassifier for LexicalClassifier {
    fn is_read(&self, normalized_sql: &str) -> bool {
        match normalized_sql.strip_prefix("select") {
            Some(rest) => rest
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '('),
            None => false,
        }
    }
}
