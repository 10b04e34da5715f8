//! Translation of field conditions into predicate fragments.
//!
//! - [`translate_condition`] handles one field: a scalar is an equality
//!   test, an object of operator keywords is a conjunction of comparisons.
//! - [`build_filter`] folds every field of a query into one predicate.
//! - [`build_or_group`] turns an `$or` list into a disjunction.

use serde_json::{Map, Value};

use crate::error::{QueryError, Result};
use crate::op::Op;
use crate::predicate::Predicate;
use crate::value::is_scalar;

/// Translates one field's condition into a predicate fragment.
///
/// An object condition must use operator keywords only (`{"$gte": 5,
/// "$lt": 10}`); each keyword contributes one fragment and the fragments are
/// ANDed in key order. An empty object places no constraint on the field.
///
/// # Errors
///
/// - [`QueryError::UnknownOperator`] for a key outside the operator table
/// - [`QueryError::InvalidSetOperand`] when `$in`/`$nin` is not given an array
pub fn translate_condition(field: &str, condition: &Value) -> Result<Predicate> {
    let Value::Object(operators) = condition else {
        return Ok(Predicate::eq(field, condition.clone()));
    };

    let mut predicate = Predicate::Always;
    for (keyword, operand) in operators {
        let op = Op::from_keyword(keyword).ok_or_else(|| QueryError::UnknownOperator {
            field: field.to_string(),
            keyword: keyword.clone(),
        })?;
        predicate = predicate.and(fragment(field, op, operand)?);
    }
    Ok(predicate)
}

fn fragment(field: &str, op: Op, operand: &Value) -> Result<Predicate> {
    if !op.is_set_op() {
        return Ok(Predicate::compare(field, op, operand.clone()));
    }
    let Value::Array(set) = operand else {
        return Err(QueryError::InvalidSetOperand {
            field: field.to_string(),
            op: op.keyword(),
        });
    };
    Ok(match op {
        Op::Nin => Predicate::not_member(field, set.clone()),
        _ => Predicate::member(field, set.clone()),
    })
}

/// Folds every field condition of a query into a single predicate.
///
/// Control directives must already be stripped. Fields are processed in the
/// map's insertion order; an empty map yields [`Predicate::Always`].
pub fn build_filter(fields: &Map<String, Value>) -> Result<Predicate> {
    fields
        .iter()
        .try_fold(Predicate::Always, |acc, (field, condition)| {
            Ok(acc.and(translate_condition(field, condition)?))
        })
}

/// Builds the disjunction for an `$or` group.
///
/// Each entry is a conjunction of equality tests, one per field; the entries
/// are ORed in order. Entries may only carry scalar values.
///
/// # Errors
///
/// [`QueryError::NestedOrCondition`] when an entry's value is a condition
/// object.
pub fn build_or_group(group: &[Map<String, Value>]) -> Result<Predicate> {
    let mut branches = group.iter().map(|entry| {
        entry
            .iter()
            .try_fold(Predicate::Always, |acc, (field, value)| {
                if !is_scalar(value) {
                    return Err(QueryError::NestedOrCondition {
                        field: field.clone(),
                    });
                }
                Ok(acc.and(Predicate::eq(field.as_str(), value.clone())))
            })
    });

    let Some(first) = branches.next() else {
        return Ok(Predicate::Always);
    };
    branches.try_fold(first?, |acc, branch| Ok(acc.or(branch?)))
}
