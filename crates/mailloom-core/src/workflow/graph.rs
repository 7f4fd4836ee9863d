//! Topological ordering of a workflow's action tree

use mailloom_common::types::ActionId;
use mailloom_common::{Error, Result};
use mailloom_storage::models::Action;
use std::collections::{HashMap, HashSet, VecDeque};

/// Order actions so every parent precedes its children, roots first.
///
/// Kahn's algorithm over the parent edges. A parent referencing an
/// action outside the workflow, or a cycle, is a graph error.
pub fn execution_order(actions: &[Action]) -> Result<Vec<ActionId>> {
    let ids: HashSet<ActionId> = actions.iter().map(|a| a.id).collect();

    let mut children: HashMap<ActionId, Vec<ActionId>> = HashMap::new();
    let mut roots = VecDeque::new();
    for action in actions {
        match action.parent_id {
            Some(parent) => {
                if !ids.contains(&parent) {
                    return Err(Error::Graph(format!(
                        "action {} references parent {} outside the workflow",
                        action.id, parent
                    )));
                }
                children.entry(parent).or_default().push(action.id);
            }
            None => roots.push_back(action.id),
        }
    }

    let mut order = Vec::with_capacity(actions.len());
    while let Some(id) = roots.pop_front() {
        order.push(id);
        if let Some(kids) = children.get(&id) {
            for kid in kids {
                roots.push_back(*kid);
            }
        }
    }

    if order.len() != actions.len() {
        return Err(Error::Graph(format!(
            "cycle detected: {} of {} actions unreachable from a root",
            actions.len() - order.len(),
            actions.len()
        )));
    }
    Ok(order)
}
