//! Dynamic SELECT assembly
//!
//! Predicates are collected as `(column, operator, value)` triples and
//! rendered through `sqlx::QueryBuilder`, which numbers placeholders from
//! the values it has bound so far. The first WHERE/HAVING predicate opens
//! its clause and every later one is joined with AND.

use sqlx::{Postgres, QueryBuilder};

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    fn push_to(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            Self::Int(v) => builder.push_bind(*v),
            Self::BigInt(v) => builder.push_bind(*v),
            Self::Float(v) => builder.push_bind(*v),
            Self::Text(v) => builder.push_bind(v.clone()),
        };
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    ILike,
    Gte,
    Lte,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::ILike => "ILIKE",
            Op::Gte => ">=",
            Op::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column or aggregate expression; never user input
    pub column: &'static str,
    pub op: Op,
    pub value: BindValue,
}

/// SELECT statement with optional WHERE, GROUP BY, HAVING, ORDER BY and LIMIT
#[derive(Debug, Clone)]
pub struct SelectQuery {
    base: &'static str,
    filters: Vec<Predicate>,
    group_by: Option<&'static str>,
    having: Vec<Predicate>,
    order_by: Option<&'static str>,
    limit: Option<i64>,
}

impl SelectQuery {
    /// Start from everything up to (not including) the WHERE clause
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            filters: Vec::new(),
            group_by: None,
            having: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add a row-level predicate
    pub fn filter(mut self, column: &'static str, op: Op, value: impl Into<BindValue>) -> Self {
        self.filters.push(Predicate {
            column,
            op,
            value: value.into(),
        });
        self
    }

    /// Add a row-level predicate when `value` is present
    pub fn filter_opt<V: Into<BindValue>>(
        self,
        column: &'static str,
        op: Op,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.filter(column, op, value),
            None => self,
        }
    }

    /// Add a post-aggregation predicate when `value` is present
    pub fn having_opt<V: Into<BindValue>>(
        mut self,
        expression: &'static str,
        op: Op,
        value: Option<V>,
    ) -> Self {
        if let Some(value) = value {
            self.having.push(Predicate {
                column: expression,
                op,
                value: value.into(),
            });
        }
        self
    }

    pub fn group_by(mut self, columns: &'static str) -> Self {
        self.group_by = Some(columns);
        self
    }

    pub fn order_by(mut self, columns: &'static str) -> Self {
        self.order_by = Some(columns);
        self
    }

    pub fn limit(mut self, limit: impl Into<i64>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Values in placeholder order ($1, $2, ...)
    pub fn bind_values(&self) -> Vec<BindValue> {
        self.filters
            .iter()
            .chain(self.having.iter())
            .map(|p| p.value.clone())
            .chain(self.limit.map(BindValue::BigInt))
            .collect()
    }

    /// Render into a builder ready for `build_query_as`
    pub fn to_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(self.base);

        push_predicates(&mut builder, " WHERE ", &self.filters);
        if let Some(group_by) = self.group_by {
            builder.push(" GROUP BY ").push(group_by);
        }
        push_predicates(&mut builder, " HAVING ", &self.having);
        if let Some(order_by) = self.order_by {
            builder.push(" ORDER BY ").push(order_by);
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        builder
    }
}

fn push_predicates(
    builder: &mut QueryBuilder<'static, Postgres>,
    keyword: &str,
    predicates: &[Predicate],
) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { keyword } else { " AND " });
        builder
            .push(predicate.column)
            .push(" ")
            .push(predicate.op.as_sql())
            .push(" ");
        predicate.value.push_to(builder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "SELECT * FROM things";

    #[test]
    fn bare_query() {
        let query = SelectQuery::new(BASE);
        assert_eq!(query.to_builder().sql(), "SELECT * FROM things");
        assert!(query.bind_values().is_empty());
    }

    #[test]
    fn first_filter_opens_where() {
        let query = SelectQuery::new(BASE)
            .filter_opt::<String>("name", Op::ILike, None)
            .filter("owner_id", Op::Eq, 3);

        assert_eq!(
            query.to_builder().sql(),
            "SELECT * FROM things WHERE owner_id = $1"
        );
        assert_eq!(query.bind_values(), vec![BindValue::Int(3)]);
    }

    #[test]
    fn placeholders_follow_bind_order() {
        let query = SelectQuery::new(BASE)
            .filter("a", Op::Gte, 1)
            .filter_opt::<i32>("b", Op::Eq, None)
            .filter("c", Op::Lte, 2.5)
            .group_by("id")
            .having_opt("avg(r)", Op::Gte, Some(4.0))
            .order_by("c")
            .limit(10);

        assert_eq!(
            query.to_builder().sql(),
            "SELECT * FROM things WHERE a >= $1 AND c <= $2 GROUP BY id \
             HAVING avg(r) >= $3 ORDER BY c LIMIT $4"
        );
        assert_eq!(
            query.bind_values(),
            vec![
                BindValue::Int(1),
                BindValue::Float(2.5),
                BindValue::Float(4.0),
                BindValue::BigInt(10),
            ]
        );
    }

    #[test]
    fn having_without_where() {
        let query = SelectQuery::new(BASE)
            .group_by("id")
            .having_opt("count(*)", Op::Gte, Some(2i64));

        assert_eq!(
            query.to_builder().sql(),
            "SELECT * FROM things GROUP BY id HAVING count(*) >= $1"
        );
    }

    #[test]
    fn multiple_having_predicates_are_joined() {
        let query = SelectQuery::new(BASE)
            .group_by("id")
            .having_opt("min(r)", Op::Gte, Some(1))
            .having_opt("max(r)", Op::Lte, Some(5));

        assert_eq!(
            query.to_builder().sql(),
            "SELECT * FROM things GROUP BY id HAVING min(r) >= $1 AND max(r) <= $2"
        );
    }
}
