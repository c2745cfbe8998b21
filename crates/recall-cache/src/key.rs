//! Cache keys derived from statement text and bound parameters

use recall_core::Value;
use std::fmt::Write as _;

/// Identity of one statement execution for caching purposes.
///
/// Built from the normalized (trimmed, lower-cased) statement text and a
/// canonical rendering of the parameter values in ascending position
/// order. Matching is case-insensitive on the statement text only;
/// parameter values keep their case. Two executions with identical text
/// and identical bound values always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    sql: String,
    params: String,
}

impl StatementKey {
    /// Build a key for the given statement text and ordered parameters.
    pub fn new(sql: &str, params: &[Value]) -> Self {
        let sql = sql.trim().to_lowercase();
        let mut rendered = String::new();
        for value in params {
            // Unit separator keeps adjacent fragments from gluing together.
            rendered.push('\u{1f}');
            canonical_fragment(&mut rendered, value);
        }
        Self {
            sql,
            params: rendered,
        }
    }

    /// The normalized statement text this key was built from.
    pub fn statement_text(&self) -> &str {
        &self.sql
    }
}

/// Append a type-tagged canonical rendering of `value`.
///
/// The tag keeps values of different types distinct even when their
/// textual forms collide (`Int64(1)` vs `String("1")`). Floats render via
/// their bit pattern so NaN and signed zero stay deterministic.
fn canonical_fragment(out: &mut String, value: &Value) {
    let _ = match value {
        Value::Null => write!(out, "null"),
        Value::Bool(b) => write!(out, "bool:{}", b),
        Value::Int64(i) => write!(out, "i64:{}", i),
        Value::Float64(f) => write!(out, "f64:{:016x}", f.to_bits()),
        Value::Decimal(d) => write!(out, "dec:{}", d),
        Value::String(s) => write!(out, "str:{}", s),
        Value::Bytes(b) => {
            let _ = write!(out, "bin:");
            for byte in b {
                let _ = write!(out, "{:02x}", byte);
            }
            Ok(())
        }
        Value::Uuid(u) => write!(out, "uuid:{}", u),
        Value::Date(d) => write!(out, "date:{}", d),
        Value::Time(t) => write!(out, "time:{}", t),
        Value::DateTime(dt) => write!(out, "ts:{}", dt),
        Value::DateTimeUtc(dt) => write!(out, "tstz:{}", dt.to_rfc3339()),
        Value::Json(j) => write!(out, "json:{}", j),
    };
}
