//! Query expression building.
//!
//! A [`SelectExpr`] is the in-progress, composable representation of a
//! `SELECT` statement: projections, joins, WHERE predicates, and ORDER BY
//! terms accumulate in insertion order and are finalized exactly once into
//! a [`Statement`]. The builder is value-oriented: every composition step
//! takes `self` and returns the updated expression, so an expression is
//! never aliased across requests.
//!
//! Values never appear in clause text directly. Clauses are
//! [`SqlFragment`]s: SQL with `$N` placeholders plus typed [`SqlParam`]
//! values, and literals are rendered with proper quoting only at
//! finalization. The hosted endpoint accepts a single statement string, so
//! binding is client-side, but the quoting discipline is the same as
//! server-side parameter binding.

use std::fmt;

/// A SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text parameter, rendered as a quoted literal.
    Text(String),
    /// Floating point parameter.
    Float(f64),
    /// Integer parameter.
    Integer(i64),
    /// Boolean parameter.
    Bool(bool),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a text parameter.
    pub fn text(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }

    /// Renders the parameter as a SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled, which is the
    /// entire injection surface for this statement grammar: placeholders
    /// only ever stand in value position.
    fn render(&self) -> String {
        match self {
            SqlParam::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlParam::Float(v) => format!("{}", v),
            SqlParam::Integer(v) => format!("{}", v),
            SqlParam::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            SqlParam::Null => "NULL".to_string(),
        }
    }
}

/// A SQL fragment with associated parameters.
///
/// Placeholder numbering is local to the fragment: `$1` refers to the
/// fragment's own first parameter. Fragments render independently, so
/// composing them never requires renumbering.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The SQL string with `$N` placeholders.
    pub sql: String,
    /// The parameter values.
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    /// Creates a new fragment with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Combines two fragments with AND.
    ///
    /// Parameter slices concatenate, so the right-hand fragment's local
    /// placeholders must be shifted by the left-hand parameter count.
    pub fn and(self, other: SqlFragment) -> SqlFragment {
        let shifted = shift_placeholders(&other.sql, self.params.len());
        SqlFragment {
            sql: format!("({}) AND ({})", self.sql, shifted),
            params: [self.params, other.params].concat(),
        }
    }

    /// Combines two fragments with OR.
    ///
    /// Parameter slices concatenate, so the right-hand fragment's local
    /// placeholders must be shifted by the left-hand parameter count.
    pub fn or(self, other: SqlFragment) -> SqlFragment {
        let shifted = shift_placeholders(&other.sql, self.params.len());
        SqlFragment {
            sql: format!("({}) OR ({})", self.sql, shifted),
            params: [self.params, other.params].concat(),
        }
    }

    /// Renders the fragment with its parameters substituted as literals.
    pub fn render(&self) -> String {
        substitute_placeholders(&self.sql, &self.params)
    }
}

/// Rewrites `$N` to `$(N + offset)`.
fn shift_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }
    transform_placeholders(sql, |n| format!("${}", n + offset))
}

/// Replaces each `$N` with the rendered literal of the N-th parameter.
///
/// Out-of-range placeholders are left untouched; a fragment authored with a
/// dangling placeholder will surface verbatim in the statement text where
/// integration tests catch it.
fn substitute_placeholders(sql: &str, params: &[SqlParam]) -> String {
    transform_placeholders(sql, |n| {
        params
            .get(n - 1)
            .map(SqlParam::render)
            .unwrap_or_else(|| format!("${}", n))
    })
}

fn transform_placeholders(sql: &str, replace: impl Fn(usize) -> String) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some(d) = chars.peek().copied() {
            if d.is_ascii_digit() {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }
        match digits.parse::<usize>() {
            Ok(n) if n >= 1 => out.push_str(&replace(n)),
            _ => {
                out.push('$');
                out.push_str(&digits);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    on: SqlFragment,
}

/// The accumulating representation of a `SELECT` statement.
///
/// Created fresh per request, composed synchronously, finalized once via
/// [`SelectExpr::finalize`], and discarded.
#[derive(Debug, Clone)]
pub struct SelectExpr {
    table: String,
    alias: Option<String>,
    fields: Vec<SqlFragment>,
    joins: Vec<Join>,
    wheres: Vec<SqlFragment>,
    orders: Vec<String>,
}

impl SelectExpr {
    /// Starts a new expression selecting from the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            fields: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Starts a new expression selecting from an aliased table.
    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::new(table)
        }
    }

    /// Appends a projected column or expression.
    ///
    /// The argument is trusted statement text (a column name or SQL
    /// expression owned by a director), never caller input.
    pub fn field(self, expr: impl Into<String>) -> Self {
        self.field_fragment(SqlFragment::new(expr))
    }

    /// Appends an aliased projection.
    pub fn field_as(self, expr: impl Into<String>, alias: &str) -> Self {
        self.field_fragment(SqlFragment::new(format!("{} AS {}", expr.into(), alias)))
    }

    /// Appends a projection carrying bound parameters.
    pub fn field_fragment(mut self, fragment: SqlFragment) -> Self {
        self.fields.push(fragment);
        self
    }

    /// Appends an inner join.
    ///
    /// No de-duplication: joining twice with identical arguments produces
    /// two joins.
    pub fn join(mut self, table: impl Into<String>, alias: Option<&str>, on: SqlFragment) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            table: table.into(),
            alias: alias.map(str::to_string),
            on,
        });
        self
    }

    /// Appends a left join.
    pub fn left_join(
        mut self,
        table: impl Into<String>,
        alias: Option<&str>,
        on: SqlFragment,
    ) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            table: table.into(),
            alias: alias.map(str::to_string),
            on,
        });
        self
    }

    /// Appends a WHERE predicate; predicates combine with AND.
    pub fn and_where(mut self, fragment: SqlFragment) -> Self {
        self.wheres.push(fragment);
        self
    }

    /// Appends an ascending ORDER BY term.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.orders.push(expr.into());
        self
    }

    /// Number of WHERE predicates attached so far.
    pub fn where_count(&self) -> usize {
        self.wheres.len()
    }

    /// Finalizes the expression into an immutable statement.
    ///
    /// Emission order is fixed (projections, joins, predicates, and order
    /// terms each in insertion order), so identical logical inputs always
    /// produce identical statement text, the property the statement cache
    /// relies on.
    pub fn finalize(self) -> Statement {
        let mut text = String::from("SELECT ");
        if self.fields.is_empty() {
            text.push('*');
        } else {
            let rendered: Vec<String> = self.fields.iter().map(SqlFragment::render).collect();
            text.push_str(&rendered.join(", "));
        }

        text.push_str(" FROM ");
        text.push_str(&self.table);
        if let Some(alias) = &self.alias {
            text.push(' ');
            text.push_str(alias);
        }

        for join in &self.joins {
            match join.kind {
                JoinKind::Inner => text.push_str(" INNER JOIN "),
                JoinKind::Left => text.push_str(" LEFT JOIN "),
            }
            text.push_str(&join.table);
            if let Some(alias) = &join.alias {
                text.push(' ');
                text.push_str(alias);
            }
            text.push_str(" ON (");
            text.push_str(&join.on.render());
            text.push(')');
        }

        if !self.wheres.is_empty() {
            let rendered: Vec<String> = self
                .wheres
                .iter()
                .map(|w| format!("({})", w.render()))
                .collect();
            text.push_str(" WHERE ");
            text.push_str(&rendered.join(" AND "));
        }

        if !self.orders.is_empty() {
            text.push_str(" ORDER BY ");
            text.push_str(&self.orders.join(", "));
        }

        Statement { text }
    }
}

/// A finalized, immutable SQL statement.
///
/// The statement text is the cache key for the result cache, so it must be
/// produced deterministically; see [`SelectExpr::finalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    text: String,
}

impl Statement {
    /// The statement text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the statement, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_param_quoting() {
        let frag = SqlFragment::with_params("name = $1", vec![SqlParam::text("O'Brien")]);
        assert_eq!(frag.render(), "name = 'O''Brien'");
    }

    #[test]
    fn test_param_rendering_by_type() {
        assert_eq!(SqlParam::text("camp").render(), "'camp'");
        assert_eq!(SqlParam::Integer(12).render(), "12");
        assert_eq!(SqlParam::Float(0.5).render(), "0.5");
        assert_eq!(SqlParam::Bool(true).render(), "TRUE");
        assert_eq!(SqlParam::Null.render(), "NULL");
    }

    #[test]
    fn test_multi_placeholder_fragment() {
        let frag = SqlFragment::with_params(
            "age_low >= $1 AND age_high <= $2",
            vec![SqlParam::Integer(5), SqlParam::Integer(12)],
        );
        assert_eq!(frag.render(), "age_low >= 5 AND age_high <= 12");
    }

    #[test]
    fn test_and_combinator_shifts_placeholders() {
        let left = SqlFragment::with_params("fee = $1", vec![SqlParam::text("0.00")]);
        let right = SqlFragment::with_params("gender->>0 = $1", vec![SqlParam::text("Female")]);
        let combined = left.and(right);
        assert_eq!(
            combined.render(),
            "(fee = '0.00') AND (gender->>0 = 'Female')"
        );
    }

    #[test]
    fn test_or_combinator_shifts_placeholders() {
        let left = SqlFragment::with_params("a ILIKE $1", vec![SqlParam::text("x")]);
        let right = SqlFragment::with_params("b ILIKE $1", vec![SqlParam::text("y")]);
        let combined = left.or(right);
        assert_eq!(combined.render(), "(a ILIKE 'x') OR (b ILIKE 'y')");
    }

    #[test]
    fn test_dangling_placeholder_left_verbatim() {
        let frag = SqlFragment::new("code = $1");
        assert_eq!(frag.render(), "code = $1");
    }

    #[test]
    fn test_dollar_without_digits_left_verbatim() {
        let frag = SqlFragment::with_params("tag = '$' || $1", vec![SqlParam::text("x")]);
        assert_eq!(frag.render(), "tag = '$' || 'x'");
    }

    #[test]
    fn test_basic_statement_shape() {
        let stmt = SelectExpr::new("ppr_days")
            .field("ppr_days.*")
            .finalize();
        assert_eq!(stmt.as_str(), "SELECT ppr_days.* FROM ppr_days");
    }

    #[test]
    fn test_statement_with_join_where_order() {
        let stmt = SelectExpr::new("ppr_programs")
            .field("ppr_programs.*")
            .join(
                "ppr_facilities",
                None,
                SqlFragment::new("ppr_programs.facility->>0 = ppr_facilities.id"),
            )
            .and_where(SqlFragment::new("program_is_public"))
            .and_where(SqlFragment::with_params("fee = $1", vec![SqlParam::text("0.00")]))
            .order_by("lower(program_name)")
            .finalize();
        assert_eq!(
            stmt.as_str(),
            "SELECT ppr_programs.* FROM ppr_programs \
             INNER JOIN ppr_facilities ON (ppr_programs.facility->>0 = ppr_facilities.id) \
             WHERE (program_is_public) AND (fee = '0.00') \
             ORDER BY lower(program_name)"
        );
    }

    #[test]
    fn test_duplicate_joins_are_not_deduplicated() {
        let on = SqlFragment::new("a.id = b.id");
        let stmt = SelectExpr::new("a")
            .join("b", None, on.clone())
            .join("b", None, on)
            .finalize();
        assert_eq!(stmt.as_str().matches("INNER JOIN b").count(), 2);
    }

    #[test]
    fn test_finalize_is_deterministic() {
        let build = || {
            SelectExpr::aliased("ppr_activity_categories", "category")
                .field("category.*")
                .and_where(SqlFragment::with_params("publish = $1", vec![SqlParam::text("true")]))
                .order_by("activity_category_name")
                .finalize()
        };
        assert_eq!(build(), build());
    }
}
