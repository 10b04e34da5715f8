//! Native predicate fragments.
//!
//! A [`Predicate`] is a composable boolean test over one record. Fragments
//! combine with [`Predicate::and`] and [`Predicate::or`]; the always-true
//! [`Predicate::Always`] is the identity for `and`, so folding an empty set of
//! conditions yields an unfiltered scan.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::op::Op;
use crate::value::{compare_values, field, values_equal};

/// A boolean test over a single record.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every record.
    #[default]
    Always,
    /// Compares one field against a value.
    Compare { field: String, op: Op, value: Value },
    /// Tests a field for membership in a set (or its negation).
    Member {
        field: String,
        set: Vec<Value>,
        negated: bool,
    },
    /// All fragments must match.
    And(Vec<Predicate>),
    /// At least one fragment must match.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Equality test on a field.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Predicate::compare(field, Op::Eq, value)
    }

    /// Comparison test on a field.
    pub fn compare(field: impl Into<String>, op: Op, value: Value) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Set-membership test on a field.
    pub fn member(field: impl Into<String>, set: Vec<Value>) -> Self {
        Predicate::Member {
            field: field.into(),
            set,
            negated: false,
        }
    }

    /// Negated set-membership test on a field.
    pub fn not_member(field: impl Into<String>, set: Vec<Value>) -> Self {
        Predicate::Member {
            field: field.into(),
            set,
            negated: true,
        }
    }

    /// Returns `true` if this is the always-true predicate.
    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Conjunction of two fragments.
    ///
    /// `Always` operands are dropped and nested conjunctions are flattened,
    /// keeping operands in call order.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Always, other) => other,
            (this, Predicate::Always) => this,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, Predicate::And(mut right)) => {
                right.insert(0, left);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction of two fragments.
    ///
    /// An `Always` operand makes the whole disjunction `Always`.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Always, _) | (_, Predicate::Always) => Predicate::Always,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, Predicate::Or(mut right)) => {
                right.insert(0, left);
                Predicate::Or(right)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    /// Evaluates this predicate against a record.
    ///
    /// A record missing the tested field never matches a field test,
    /// including `$ne` and `$nin`. Ordering comparisons between different
    /// JSON types do not match.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Compare {
                field: name,
                op,
                value,
            } => match field(record, name) {
                Some(actual) => match op {
                    Op::Eq => values_equal(actual, value),
                    Op::Ne => !values_equal(actual, value),
                    _ => compare_values(actual, value).is_some_and(|o| op.eval_ordering(o)),
                },
                None => false,
            },
            Predicate::Member {
                field: name,
                set,
                negated,
            } => match field(record, name) {
                Some(actual) => set.iter().any(|v| values_equal(actual, v)) != *negated,
                None => false,
            },
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(record)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => write!(f, "true"),
            Predicate::Compare { field, op, value } => {
                write!(f, "{} {} {}", field, op.symbol(), value)
            }
            Predicate::Member {
                field,
                set,
                negated,
            } => {
                let op = if *negated { Op::Nin } else { Op::In };
                write!(f, "{} {} {}", field, op.symbol(), Value::Array(set.clone()))
            }
            Predicate::And(parts) => write_joined(f, parts, " and "),
            Predicate::Or(parts) => write_joined(f, parts, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{part}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_matches() {
        let p = Predicate::eq("name", json!("Alice"));
        assert!(p.matches(&json!({"name": "Alice"})));
        assert!(!p.matches(&json!({"name": "alice"})));
        assert!(!p.matches(&json!({"other": "Alice"})));
    }

    #[test]
    fn ordering_comparisons() {
        let gte = Predicate::compare("n", Op::Gte, json!(5));
        assert!(gte.matches(&json!({"n": 5})));
        assert!(gte.matches(&json!({"n": 6.5})));
        assert!(!gte.matches(&json!({"n": 4})));
        assert!(!gte.matches(&json!({"n": "9"})));

        let lt = Predicate::compare("n", Op::Lt, json!(10));
        assert!(lt.matches(&json!({"n": 9})));
        assert!(!lt.matches(&json!({"n": 10})));
    }

    #[test]
    fn missing_field_never_matches() {
        let record = json!({"name": "Alice"});
        assert!(!Predicate::compare("age", Op::Ne, json!(3)).matches(&record));
        assert!(!Predicate::not_member("age", vec![json!(3)]).matches(&record));
    }

    #[test]
    fn ne_across_types_matches() {
        let p = Predicate::compare("n", Op::Ne, json!("5"));
        assert!(p.matches(&json!({"n": 5})));
    }

    #[test]
    fn membership() {
        let p = Predicate::member("status", vec![json!("a"), json!("b")]);
        assert!(p.matches(&json!({"status": "a"})));
        assert!(!p.matches(&json!({"status": "c"})));

        let n = Predicate::not_member("status", vec![json!("a"), json!("b")]);
        assert!(!n.matches(&json!({"status": "a"})));
        assert!(n.matches(&json!({"status": "c"})));
    }

    #[test]
    fn and_drops_always_and_flattens() {
        let a = Predicate::eq("a", json!(1));
        let b = Predicate::eq("b", json!(2));
        let c = Predicate::eq("c", json!(3));

        assert_eq!(Predicate::Always.and(a.clone()), a);
        assert_eq!(a.clone().and(Predicate::Always), a);

        let folded = Predicate::Always
            .and(a.clone())
            .and(b.clone())
            .and(c.clone());
        assert_eq!(folded, Predicate::And(vec![a, b, c]));
    }

    #[test]
    fn or_absorbs_always() {
        let a = Predicate::eq("a", json!(1));
        assert_eq!(a.clone().or(Predicate::Always), Predicate::Always);

        let b = Predicate::eq("b", json!(2));
        assert_eq!(a.clone().or(b.clone()), Predicate::Or(vec![a, b]));
    }

    #[test]
    fn display_renders_tree() {
        let p = Predicate::eq("name", json!("Alice"))
            .or(Predicate::eq("name", json!("Bob")))
            .and(Predicate::compare("age", Op::Gt, json!(3)));
        assert_eq!(
            p.to_string(),
            r#"((name == "Alice" or name == "Bob") and age > 3)"#
        );
    }
}
