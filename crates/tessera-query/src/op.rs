//! Comparison operators for field conditions.
//!
//! The [`Op`] enum is the closed set of keywords a condition object may use.
//! Keywords are dispatched through [`Op::from_keyword`]; anything outside the
//! set is reported to the caller instead of being skipped.

use std::cmp::Ordering;

use serde::Serialize;

/// Comparison operator for a field condition.
///
/// - **Equality**: `Eq`, `Ne`
/// - **Ordering**: `Gt`, `Gte`, `Lt`, `Lte`
/// - **Set membership**: `In`, `Nin` (operand must be an array)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Value is one of the given set.
    In,
    /// Value is none of the given set.
    Nin,
}

impl Op {
    /// Every supported operator, in keyword-table order.
    pub const ALL: [Op; 8] = [
        Op::Eq,
        Op::Ne,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
        Op::In,
        Op::Nin,
    ];

    /// Looks up the operator for a query keyword such as `$gte`.
    ///
    /// Returns `None` for keywords outside the supported set.
    pub fn from_keyword(keyword: &str) -> Option<Op> {
        match keyword {
            "$eq" => Some(Op::Eq),
            "$ne" => Some(Op::Ne),
            "$gt" => Some(Op::Gt),
            "$gte" => Some(Op::Gte),
            "$lt" => Some(Op::Lt),
            "$lte" => Some(Op::Lte),
            "$in" => Some(Op::In),
            "$nin" => Some(Op::Nin),
            _ => None,
        }
    }

    /// Returns the query keyword for this operator.
    pub fn keyword(self) -> &'static str {
        match self {
            Op::Eq => "$eq",
            Op::Ne => "$ne",
            Op::Gt => "$gt",
            Op::Gte => "$gte",
            Op::Lt => "$lt",
            Op::Lte => "$lte",
            Op::In => "$in",
            Op::Nin => "$nin",
        }
    }

    /// Returns `true` for the set-membership operators.
    pub fn is_set_op(self) -> bool {
        matches!(self, Op::In | Op::Nin)
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Set operators never match an ordering.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            Op::In | Op::Nin => false,
        }
    }

    /// Returns the symbol used when rendering predicates.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::In => "in",
            Op::Nin => "not in",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_is_closed() {
        for op in Op::ALL {
            assert_eq!(Op::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(Op::from_keyword("$regex"), None);
        assert_eq!(Op::from_keyword("gte"), None);
        assert_eq!(Op::from_keyword(""), None);
    }

    #[test]
    fn set_ops() {
        assert!(Op::In.is_set_op());
        assert!(Op::Nin.is_set_op());
        assert!(!Op::Eq.is_set_op());
        assert!(!Op::Lte.is_set_op());
    }

    #[test]
    fn op_eval_ordering() {
        assert!(Op::Eq.eval_ordering(Ordering::Equal));
        assert!(!Op::Eq.eval_ordering(Ordering::Less));

        assert!(!Op::Ne.eval_ordering(Ordering::Equal));
        assert!(Op::Ne.eval_ordering(Ordering::Greater));

        assert!(Op::Gt.eval_ordering(Ordering::Greater));
        assert!(!Op::Gt.eval_ordering(Ordering::Equal));

        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(!Op::Gte.eval_ordering(Ordering::Less));

        assert!(Op::Lt.eval_ordering(Ordering::Less));
        assert!(!Op::Lt.eval_ordering(Ordering::Equal));

        assert!(Op::Lte.eval_ordering(Ordering::Equal));
        assert!(!Op::Lte.eval_ordering(Ordering::Greater));

        assert!(!Op::In.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn op_display() {
        assert_eq!(Op::Gte.to_string(), "$gte");
        assert_eq!(Op::Nin.to_string(), "$nin");
    }
}
