//! Result materialization and cursor views over cached results
//!
//! A live driver cursor is consumed exactly once into an immutable
//! [`ResultSnapshot`]; every later read goes through an independently
//! positioned [`SnapshotCursor`] view over the shared snapshot.

use async_trait::async_trait;
use recall_core::{ColumnDescriptor, RecallError, Result, RowStream, Value};
use std::sync::Arc;

/// An immutable in-memory copy of a tabular result.
///
/// Row order and column order match the source cursor exactly. Once
/// constructed a snapshot never changes, so any number of cursor views
/// may read it concurrently without synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSnapshot {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Value>>,
}

impl ResultSnapshot {
    /// Drain a live cursor to exhaustion and snapshot it.
    ///
    /// The column descriptors are captured once, up front; later schema
    /// changes in the backing database do not affect the snapshot. The
    /// source stream is closed afterwards and must not be reused. If
    /// draining fails partway the error propagates unchanged and no
    /// snapshot is produced.
    pub async fn materialize(mut stream: Box<dyn RowStream>) -> Result<Self> {
        let columns = stream.columns().to_vec();
        let mut rows = Vec::new();
        loop {
            match stream.next_row().await {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break,
                Err(e) => {
                    // Best effort: the result is discarded either way.
                    let _ = stream.close().await;
                    return Err(e);
                }
            }
        }
        stream.close().await?;

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            "result materialized"
        );
        Ok(Self { columns, rows })
    }

    /// Build a snapshot directly from rows already in memory.
    pub fn from_rows(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Column descriptors, in result order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Rows, in result order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows in the snapshot.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A forward-only cursor view over a shared [`ResultSnapshot`].
///
/// Each view carries its own position, so several cursors over the same
/// snapshot can be read to completion independently. The typed accessors
/// mirror tabular-cursor semantics: reading a NULL returns the type's
/// zero value and raises the `was_null` flag for that read.
pub struct SnapshotCursor {
    snapshot: Arc<ResultSnapshot>,
    /// 0 = positioned before the first row.
    position: usize,
    was_null: bool,
}

impl SnapshotCursor {
    /// Create a fresh view positioned before the first row.
    pub fn new(snapshot: Arc<ResultSnapshot>) -> Self {
        Self {
            snapshot,
            position: 0,
            was_null: false,
        }
    }

    /// Advance to the next row. Returns false once past the last row.
    pub fn advance(&mut self) -> bool {
        if self.position == self.snapshot.rows.len() {
            false
        } else {
            self.position += 1;
            true
        }
    }

    /// Whether the last typed read hit a SQL NULL.
    pub fn was_null(&self) -> bool {
        self.was_null
    }

    /// Raw value at the given 0-based column of the current row.
    pub fn value(&self, column: usize) -> Result<&Value> {
        let row = self
            .snapshot
            .rows
            .get(self.position.wrapping_sub(1))
            .ok_or_else(|| RecallError::Query("cursor is not positioned on a row".into()))?;
        row.get(column)
            .ok_or_else(|| RecallError::Query(format!("no column at index {}", column)))
    }

    /// String at the given column, or `None` for SQL NULL.
    ///
    /// Non-string values render through their display form.
    pub fn get_str(&mut self, column: usize) -> Result<Option<String>> {
        let value = self.value(column)?;
        let is_null = value.is_null();
        let result = if is_null {
            None
        } else {
            Some(value.to_string())
        };
        self.was_null = is_null;
        Ok(result)
    }

    /// Integer at the given column; 0 for SQL NULL (with `was_null` set).
    pub fn get_i64(&mut self, column: usize) -> Result<i64> {
        let value = self.value(column)?;
        let is_null = value.is_null();
        let result = if is_null {
            Ok(0)
        } else {
            value
                .as_i64()
                .ok_or_else(|| RecallError::Type(format!("{} is not an integer", value)))
        };
        self.was_null = is_null;
        result
    }

    /// Float at the given column; 0.0 for SQL NULL (with `was_null` set).
    pub fn get_f64(&mut self, column: usize) -> Result<f64> {
        let value = self.value(column)?;
        let is_null = value.is_null();
        let result = if is_null {
            Ok(0.0)
        } else {
            value
                .as_f64()
                .ok_or_else(|| RecallError::Type(format!("{} is not a float", value)))
        };
        self.was_null = is_null;
        result
    }

    /// Boolean at the given column; false for SQL NULL (with `was_null` set).
    pub fn get_bool(&mut self, column: usize) -> Result<bool> {
        let value = self.value(column)?;
        let is_null = value.is_null();
        let result = if is_null {
            Ok(false)
        } else {
            value
                .as_bool()
                .ok_or_else(|| RecallError::Type(format!("{} is not a boolean", value)))
        };
        self.was_null = is_null;
        result
    }

    /// The snapshot backing this cursor.
    pub fn snapshot(&self) -> &Arc<ResultSnapshot> {
        &self.snapshot
    }
}

#[async_trait]
impl RowStream for SnapshotCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.snapshot.columns
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if self.advance() {
            Ok(Some(self.snapshot.rows[self.position - 1].clone()))
        } else {
            Ok(None)
        }
    }

    async fn close(&mut self) -> Result<()> {
        // The snapshot outlives any one view; nothing to release.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    struct FakeStream {
        columns: Vec<ColumnDescriptor>,
        rows: VecDeque<Vec<Value>>,
        fail_after: Option<usize>,
        delivered: usize,
        closed: bool,
    }

    impl FakeStream {
        fn new(rows: Vec<Vec<Value>>) -> Self {
            Self {
                columns: vec![
                    ColumnDescriptor::named("id", "INTEGER"),
                    ColumnDescriptor::named("name", "TEXT"),
                ],
                rows: rows.into(),
                fail_after: None,
                delivered: 0,
                closed: false,
            }
        }
    }

    #[async_trait]
    impl RowStream for FakeStream {
        fn columns(&self) -> &[ColumnDescriptor] {
            &self.columns
        }

        async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
            if let Some(limit) = self.fail_after
                && self.delivered >= limit
            {
                return Err(RecallError::Query("driver error".into()));
            }
            self.delivered += 1;
            Ok(self.rows.pop_front())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn sample_rows() -> Vec<Vec<Value>> {
        vec![
            vec![Value::Int64(1), Value::String("alpha".into())],
            vec![Value::Int64(2), Value::Null],
            vec![Value::Int64(3), Value::String("gamma".into())],
        ]
    }

    #[tokio::test]
    async fn materialize_preserves_row_and_column_order() {
        let snapshot = ResultSnapshot::materialize(Box::new(FakeStream::new(sample_rows())))
            .await
            .unwrap();

        assert_eq!(snapshot.row_count(), 3);
        assert_eq!(snapshot.columns()[0].name, "id");
        assert_eq!(snapshot.columns()[1].name, "name");
        assert_eq!(snapshot.rows(), sample_rows().as_slice());
    }

    #[tokio::test]
    async fn materialize_snapshots_null_as_null() {
        let snapshot = ResultSnapshot::materialize(Box::new(FakeStream::new(sample_rows())))
            .await
            .unwrap();
        assert_eq!(snapshot.rows()[1][1], Value::Null);
    }

    #[tokio::test]
    async fn materialize_aborts_on_stream_error() {
        let mut stream = FakeStream::new(sample_rows());
        stream.fail_after = Some(2);
        let result = ResultSnapshot::materialize(Box::new(stream)).await;
        assert!(matches!(result, Err(RecallError::Query(_))));
    }

    #[tokio::test]
    async fn cursor_walks_rows_in_order() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("id", "INTEGER")],
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)]],
        ));
        let mut cursor = SnapshotCursor::new(snapshot);

        assert!(cursor.advance());
        assert_eq!(cursor.get_i64(0).unwrap(), 1);
        assert!(cursor.advance());
        assert_eq!(cursor.get_i64(0).unwrap(), 2);
        assert!(!cursor.advance());
    }

    #[tokio::test]
    async fn null_reads_return_zero_value_and_set_was_null() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![
                ColumnDescriptor::named("n", "INTEGER"),
                ColumnDescriptor::named("s", "TEXT"),
            ],
            vec![vec![Value::Null, Value::String("x".into())]],
        ));
        let mut cursor = SnapshotCursor::new(snapshot);
        assert!(cursor.advance());

        assert_eq!(cursor.get_i64(0).unwrap(), 0);
        assert!(cursor.was_null());
        assert_eq!(cursor.get_f64(0).unwrap(), 0.0);
        assert!(cursor.was_null());
        assert_eq!(cursor.get_str(0).unwrap(), None);
        assert!(cursor.was_null());

        // The flag tracks the most recent read only.
        assert_eq!(cursor.get_str(1).unwrap(), Some("x".into()));
        assert!(!cursor.was_null());
    }

    #[tokio::test]
    async fn type_mismatch_is_an_error() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("s", "TEXT")],
            vec![vec![Value::String("abc".into())]],
        ));
        let mut cursor = SnapshotCursor::new(snapshot);
        assert!(cursor.advance());
        assert!(matches!(cursor.get_i64(0), Err(RecallError::Type(_))));
    }

    #[tokio::test]
    async fn reading_before_first_row_is_an_error() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("id", "INTEGER")],
            vec![vec![Value::Int64(1)]],
        ));
        let cursor = SnapshotCursor::new(snapshot);
        assert!(cursor.value(0).is_err());
    }

    #[tokio::test]
    async fn independent_cursors_do_not_share_position() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("id", "INTEGER")],
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)]],
        ));
        let mut a = SnapshotCursor::new(snapshot.clone());
        let mut b = SnapshotCursor::new(snapshot);

        assert!(a.advance());
        assert!(a.advance());
        assert!(!a.advance());

        assert!(b.advance());
        assert_eq!(b.get_i64(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn cursor_acts_as_a_row_stream() {
        let snapshot = Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("id", "INTEGER")],
            vec![vec![Value::Int64(7)]],
        ));
        let mut cursor: Box<dyn RowStream> = Box::new(SnapshotCursor::new(snapshot));

        assert_eq!(cursor.columns().len(), 1);
        assert_eq!(
            cursor.next_row().await.unwrap(),
            Some(vec![Value::Int64(7)])
        );
        assert_eq!(cursor.next_row().await.unwrap(), None);
        cursor.close().await.unwrap();
    }
}
