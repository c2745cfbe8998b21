//! Caching connection decorator
//!
//! [`CachingConnection`] wraps any [`Connection`] and implements the same
//! trait, so it drops in wherever the backing connection is used. Reads
//! are served from an owned [`QueryCache`]; anything that might mutate
//! data clears the whole cache before its result is handed back.

use crate::classify::{LexicalClassifier, StatementClassifier};
use crate::key::StatementKey;
use crate::snapshot::{ResultSnapshot, SnapshotCursor};
use crate::stats::CacheStats;
use crate::store::{CacheConfig, QueryCache};
use async_trait::async_trait;
use recall_core::{Connection, ExecuteOutcome, RecallError, Result, Transaction, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A connection wrapper that caches tabular results of read statements.
///
/// The cache is owned by the wrapper: it is created empty at construction
/// and torn down with it, never shared across wrappers or processes.
/// Executing any statement that is not confidently a read invalidates
/// every cached entry, as does a backing failure.
///
/// # Example
///
/// ```ignore
/// use recall_cache::CachingConnection;
///
/// let conn = CachingConnection::new(backing);
/// let mut stmt = conn.prepare("select * from users where id = ?");
/// stmt.bind(1, Value::Int64(5));
/// let outcome = stmt.execute().await?; // second identical execute is served from memory
/// ```
pub struct CachingConnection {
    inner: Arc<dyn Connection>,
    cache: QueryCache,
    classifier: Arc<dyn StatementClassifier>,
}

impl CachingConnection {
    /// Wrap a connection with the default cache configuration
    /// (1000 entries, 10 minute TTL) and the default lexical classifier.
    pub fn new(inner: Arc<dyn Connection>) -> Arc<Self> {
        Self::with_config(inner, CacheConfig::default())
    }

    /// Wrap a connection with an explicit cache configuration.
    pub fn with_config(inner: Arc<dyn Connection>, config: CacheConfig) -> Arc<Self> {
        Arc::new(Self {
            inner,
            cache: QueryCache::new(config),
            classifier: Arc::new(LexicalClassifier),
        })
    }

    /// Wrap a connection with an explicit configuration and classifier.
    pub fn with_classifier(
        inner: Arc<dyn Connection>,
        config: CacheConfig,
        classifier: Arc<dyn StatementClassifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner,
            cache: QueryCache::new(config),
            classifier,
        })
    }

    /// Prepare a statement whose executions go through the cache.
    ///
    /// The statement borrows the connection, so it cannot outlive it.
    pub fn prepare(&self, sql: impl Into<String>) -> CachedStatement<'_> {
        CachedStatement {
            conn: self,
            sql: sql.into(),
            bindings: BTreeMap::new(),
        }
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of results currently cached.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Point-in-time cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Key lookup, delegation, materialization and invalidation for one
    /// statement execution.
    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome> {
        let key = StatementKey::new(sql, params);

        if let Some(snapshot) = self.cache.get(&key) {
            tracing::debug!(rows = snapshot.row_count(), "serving cached result");
            return Ok(ExecuteOutcome::Rows(Box::new(SnapshotCursor::new(
                snapshot,
            ))));
        }

        let outcome = match self.inner.execute(sql, params).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The failure may follow a partially applied mutation, so
                // nothing cached can be trusted.
                tracing::warn!(error = %e, "backing execution failed, invalidating cache");
                self.cache.invalidate_all();
                return Err(e);
            }
        };

        match outcome {
            ExecuteOutcome::Rows(stream) => {
                if self.classifier.is_read(key.statement_text()) {
                    let snapshot = Arc::new(ResultSnapshot::materialize(stream).await?);
                    self.cache.put(key, Arc::clone(&snapshot));
                    tracing::debug!(rows = snapshot.row_count(), "read result cached");
                    Ok(ExecuteOutcome::Rows(Box::new(SnapshotCursor::new(
                        snapshot,
                    ))))
                } else {
                    // Rows came back but the statement is not confidently a
                    // read; assume mutating effects and pass the raw stream
                    // through uncached.
                    tracing::debug!("non-read statement produced rows, invalidating cache");
                    self.cache.invalidate_all();
                    Ok(ExecuteOutcome::Rows(stream))
                }
            }
            ExecuteOutcome::RowsAffected(n) => {
                tracing::debug!(affected_rows = n, "mutation executed, invalidating cache");
                self.cache.invalidate_all();
                Ok(ExecuteOutcome::RowsAffected(n))
            }
        }
    }
}

#[async_trait]
impl Connection for CachingConnection {
    fn driver_name(&self) -> &str {
        self.inner.driver_name()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome> {
        self.run(sql, params).await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        // Statements inside a transaction would bypass invalidation; fail
        // fast instead of silently approximating.
        Err(RecallError::Unsupported(
            "transactions are not available through the caching layer".into(),
        ))
    }

    async fn close(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// A reusable statement with positional parameter bindings.
///
/// Positions are 1-based, matching SQL placeholder numbering. Every
/// execution keys the cache with the parameter values bound at that
/// moment, so a statement may be executed repeatedly with rebound values
/// and each combination caches independently.
pub struct CachedStatement<'conn> {
    conn: &'conn CachingConnection,
    sql: String,
    bindings: BTreeMap<u16, Value>,
}

impl CachedStatement<'_> {
    /// Bind a value at the given 1-based position, replacing any previous
    /// binding there.
    pub fn bind(&mut self, position: u16, value: Value) -> &mut Self {
        self.bindings.insert(position, value);
        self
    }

    /// Remove all bindings.
    pub fn clear_bindings(&mut self) -> &mut Self {
        self.bindings.clear();
        self
    }

    /// The statement text this was prepared with.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute with the currently bound parameters.
    ///
    /// Every position from 1 through the highest bound position must be
    /// bound; a gap is an eager [`RecallError::UnboundParameter`] and the
    /// backing connection is never reached.
    pub async fn execute(&self) -> Result<ExecuteOutcome> {
        let params = self.bound_params()?;
        self.conn.run(&self.sql, &params).await
    }

    fn bound_params(&self) -> Result<Vec<Value>> {
        if self.bindings.contains_key(&0) {
            return Err(RecallError::Query(
                "parameter positions are 1-based".into(),
            ));
        }
        let mut params = Vec::with_capacity(self.bindings.len());
        for (expected, (&position, value)) in (1u16..).zip(self.bindings.iter()) {
            if position != expected {
                return Err(RecallError::UnboundParameter(expected));
            }
            params.push(value.clone());
        }
        Ok(params)
    }
}
