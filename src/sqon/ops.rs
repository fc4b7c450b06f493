//! SQON Algebra
//!
//! Pure transforms over a filter tree. Inputs are never mutated; every
//! operation returns a new root, and `None` stands for "no filter".
//!
//! A root must be a combination node. Passing a bare filter leaf as a root
//! fails with `SqonStructuralMismatch`.

use crate::error::{FacetError, Result};
use serde_json::Value;
use std::collections::HashSet;

use super::node::{CombinationNode, CombinationOp, FilterNode, FilterOp, SqonNode};

/// Remove `clause` if the tree already holds a matching leaf, otherwise add
/// it under the root `and`.
///
/// Matching leaves are removed wherever they sit. Whole clauses are compared,
/// so toggling `in [a]` against an existing `in [a, b]` adds a second clause
/// rather than editing the first.
///
/// Toggling the same clause twice gives back the original tree when the tree
/// is empty or has an `and` root without that clause. An `or` or `not` root
/// is wrapped as `and[root, clause]` on the first toggle, and the second
/// toggle leaves `and[root]`. A tree already holding the clause gets it back
/// at the end of the root `and`.
pub fn toggle(clause: &FilterNode, tree: Option<&SqonNode>) -> Result<Option<SqonNode>> {
    let Some(root) = root_combination(tree)? else {
        return Ok(Some(SqonNode::and(vec![clause.clone().into()])));
    };

    let present = root
        .content
        .iter()
        .flat_map(SqonNode::filters)
        .any(|f| f.matches(clause));

    if present {
        return Ok(strip_root(root, &|f: &FilterNode| f.matches(clause)));
    }

    Ok(Some(append_to_and(root, clause.clone().into())))
}

/// Remove every leaf on `field_name`, then add `clause` at the root.
///
/// `clause` may be a leaf or a combination, but every leaf it holds must be
/// on `field_name`.
pub fn replace_field(field_name: &str, clause: Option<&SqonNode>, tree: Option<&SqonNode>) -> Result<Option<SqonNode>> {
    if let Some(clause) = clause {
        check_single_field(field_name, clause)?;
    }

    let stripped = remove(field_name, tree)?;
    match clause {
        Some(clause) => Ok(combine(CombinationOp::And, stripped.as_ref(), Some(clause))),
        None => Ok(stripped),
    }
}

/// Remove every leaf on `field_name` at any depth
pub fn remove(field_name: &str, tree: Option<&SqonNode>) -> Result<Option<SqonNode>> {
    match root_combination(tree)? {
        Some(root) => Ok(strip_root(root, &|f: &FilterNode| f.field_name() == field_name)),
        None => Ok(None),
    }
}

/// True iff some leaf on `field_name` holds `value`
pub fn in_current_sqon(tree: Option<&SqonNode>, field_name: &str, value: &Value) -> bool {
    tree.map_or(false, |root| {
        root.filters()
            .iter()
            .any(|f| f.field_name() == field_name && f.holds_value(value))
    })
}

/// Join two trees under `op`.
///
/// Operands that are already `op` combinations are spliced in, so combining
/// two `and` trees gives one flat `and`. `not` is never flattened since
/// `not(not(a))` and `not(a, b)` mean different things.
pub fn combine(op: CombinationOp, left: Option<&SqonNode>, right: Option<&SqonNode>) -> Option<SqonNode> {
    let mut content = Vec::new();
    for operand in [left, right].into_iter().flatten() {
        match operand {
            SqonNode::Combination(node) if node.op == op && op != CombinationOp::Not => {
                content.extend(node.content.iter().cloned());
            }
            other => content.push(other.clone()),
        }
    }

    if content.is_empty() {
        None
    } else {
        Some(SqonNode::Combination(CombinationNode::new(op, content)))
    }
}

/// Merge the leaves of `update` into `tree`, dropping existing leaves that
/// share a field and op with one of them.
pub fn replace_sqon(update: Option<&SqonNode>, tree: Option<&SqonNode>) -> Result<Option<SqonNode>> {
    let Some(update) = update else {
        return Ok(tree.cloned());
    };

    let replaced: HashSet<(String, FilterOp)> = update
        .filters()
        .into_iter()
        .map(|f| (f.field_name().to_string(), f.op))
        .collect();

    let stripped = match root_combination(tree)? {
        Some(root) => strip_root(root, &|f: &FilterNode| {
            replaced.contains(&(f.field_name().to_string(), f.op))
        }),
        None => None,
    };

    Ok(combine(CombinationOp::And, stripped.as_ref(), Some(update)))
}

/// Value of the first leaf on `field_name` with `op`
pub fn current_field_value<'a>(tree: Option<&'a SqonNode>, field_name: &str, op: FilterOp) -> Option<&'a Value> {
    tree.and_then(|root| {
        root.filters()
            .into_iter()
            .find(|f| f.field_name() == field_name && f.op == op)
            .map(FilterNode::value)
    })
}

fn root_combination(tree: Option<&SqonNode>) -> Result<Option<&CombinationNode>> {
    match tree {
        None => Ok(None),
        Some(SqonNode::Combination(root)) => Ok(Some(root)),
        Some(SqonNode::Filter(leaf)) => Err(FacetError::SqonStructuralMismatch(format!(
            "root must be a combination node, found '{}' filter on '{}'",
            leaf.op,
            leaf.field_name()
        ))),
    }
}

fn append_to_and(root: &CombinationNode, node: SqonNode) -> SqonNode {
    if root.op == CombinationOp::And {
        let mut content = root.content.clone();
        content.push(node);
        SqonNode::and(content)
    } else {
        SqonNode::and(vec![SqonNode::Combination(root.clone()), node])
    }
}

fn strip_root(root: &CombinationNode, drop: &dyn Fn(&FilterNode) -> bool) -> Option<SqonNode> {
    match strip_combination(root, drop) {
        Some(node) if !node.is_empty() => Some(SqonNode::Combination(node)),
        _ => None,
    }
}

/// Rebuild `node` without the dropped leaves. A combination emptied by the
/// removal disappears; one that was already empty is kept as is.
fn strip_combination(node: &CombinationNode, drop: &dyn Fn(&FilterNode) -> bool) -> Option<CombinationNode> {
    let content: Vec<SqonNode> = node
        .content
        .iter()
        .filter_map(|child| match child {
            SqonNode::Filter(leaf) if drop(leaf) => None,
            SqonNode::Filter(_) => Some(child.clone()),
            SqonNode::Combination(inner) => strip_combination(inner, drop).map(SqonNode::Combination),
        })
        .collect();

    if content.is_empty() && !node.content.is_empty() {
        None
    } else {
        Some(CombinationNode::new(node.op, content))
    }
}

fn check_single_field(field_name: &str, clause: &SqonNode) -> Result<()> {
    if let SqonNode::Combination(node) = clause {
        if has_empty_combination(node) {
            return Err(FacetError::SqonStructuralMismatch(format!(
                "replacement for '{}' contains an empty combination",
                field_name
            )));
        }
    }

    match clause.filters().into_iter().find(|f| f.field_name() != field_name) {
        Some(other) => Err(FacetError::SqonStructuralMismatch(format!(
            "replacement for '{}' references '{}'",
            field_name,
            other.field_name()
        ))),
        None => Ok(()),
    }
}

fn has_empty_combination(node: &CombinationNode) -> bool {
    node.content.is_empty()
        || node.content.iter().any(|child| match child {
            SqonNode::Combination(inner) => has_empty_combination(inner),
            SqonNode::Filter(_) => false,
        })
}
