//! Dynamic WHERE clause assembly for filtered searches.

use std::fmt;
use tokio_postgres::types::ToSql;

/// Collects optional search conditions with sequential positional
/// placeholders.
///
/// Conditions are joined with ` AND `; an empty builder renders no WHERE
/// clause at all, so an unfiltered search stays a plain SELECT.
pub struct FilterBuilder {
    /// Conditions (without leading AND)
    conditions: Vec<String>,
    /// Parameter values, index-aligned with the placeholders
    params: Vec<Box<dyn ToSql + Sync + Send>>,
    /// Current parameter counter (starts from offset)
    param_count: usize,
}

impl FilterBuilder {
    /// Create a builder with param numbering starting at 1.
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Create a builder with param numbering starting after `offset`.
    ///
    /// For example, `with_offset(2)` means the first param will be `$3`.
    pub fn with_offset(offset: usize) -> Self {
        Self {
            conditions: Vec::new(),
            params: Vec::new(),
            param_count: offset,
        }
    }

    /// Check if any conditions have been added.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Get current parameter count.
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    fn push<T>(&mut self, sql_template: &str, value: T)
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.param_count += 1;
        let placeholder = format!("${}", self.param_count);
        self.conditions
            .push(sql_template.replacen('$', &placeholder, 1));
        self.params.push(Box::new(value));
    }

    /// Add `col >= value`.
    pub fn gte<T>(&mut self, col: &str, value: T)
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push(&format!("{} >= $", col), value);
    }

    /// Add `col <= value`.
    pub fn lte<T>(&mut self, col: &str, value: T)
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push(&format!("{} <= $", col), value);
    }

    /// Add `col ILIKE pattern`.
    pub fn ilike<T>(&mut self, col: &str, pattern: T)
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push(&format!("{} ILIKE $", col), pattern);
    }

    /// Add a condition without parameters.
    ///
    /// # Safety
    ///
    /// This concatenates SQL directly; only pass literal, trusted text.
    pub fn raw(&mut self, condition: &str) {
        self.conditions.push(condition.to_string());
    }

    // Option-gated variants: None adds nothing.

    pub fn gte_opt<T>(&mut self, col: &str, value: Option<T>)
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(v) = value {
            self.gte(col, v);
        }
    }

    pub fn lte_opt<T>(&mut self, col: &str, value: Option<T>)
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(v) = value {
            self.lte(col, v);
        }
    }

    pub fn ilike_opt<T>(&mut self, col: &str, pattern: Option<T>)
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(p) = pattern {
            self.ilike(col, p);
        }
    }

    /// The conditions joined with ` AND ` (without the WHERE keyword).
    pub fn build_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    /// Render `" WHERE ..."` for splicing after a FROM clause, or an empty
    /// string when no conditions were added.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.build_clause())
        }
    }

    /// Get parameter references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|v| &**v as &(dyn ToSql + Sync))
            .collect()
    }
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// The boxed params carry no Debug bound, so report their count instead.
impl fmt::Debug for FilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("conditions", &self.conditions)
            .field("params", &self.params.len())
            .field("param_count", &self.param_count)
            .finish()
    }
}
