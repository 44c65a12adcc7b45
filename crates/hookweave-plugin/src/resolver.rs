//! Plugin dependency resolution.
//!
//! Computes a linear activation order from the registered plugins'
//! constraints:
//!
//! 1. every `required` name must be registered,
//! 2. no `rivals` name may be registered,
//! 3. `P.pre ∋ Q` orders P before Q, `P.post ∋ R` orders R before P,
//! 4. a topological sort picks, among all plugins with no unordered
//!    predecessor, the one registered first.
//!
//! Ordering constraints naming unregistered plugins are ignored; only
//! `required` enforces presence. Resolving an unchanged plugin set always
//! yields the same order.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use tracing::{debug, info};

use hookweave_core::ResolutionError;

use crate::descriptor::PluginMeta;

/// Resolves the activation order of `plugins`, given in registration order.
pub fn resolve<'a>(
    plugins: impl IntoIterator<Item = &'a PluginMeta>,
) -> Result<Vec<String>, ResolutionError> {
    let plugins: Vec<&PluginMeta> = plugins.into_iter().collect();
    let index: HashMap<&str, usize> = plugins
        .iter()
        .enumerate()
        .map(|(i, meta)| (meta.name.as_str(), i))
        .collect();

    check_required(&plugins, &index)?;
    check_rivals(&plugins, &index)?;

    let successors = build_edges(&plugins, &index);
    let order = topological_order(&successors);

    if order.len() < plugins.len() {
        let members: Vec<String> = cycle_members(&successors, &order)
            .into_iter()
            .map(|i| plugins[i].name.clone())
            .collect();
        debug!(members = ?members, "Plugin ordering has a cycle");
        return Err(ResolutionError::CyclicDependency { members });
    }

    let order: Vec<String> = order.into_iter().map(|i| plugins[i].name.clone()).collect();
    info!(plugins = order.len(), order = ?order, "Resolved plugin activation order");
    Ok(order)
}

fn check_required(
    plugins: &[&PluginMeta],
    index: &HashMap<&str, usize>,
) -> Result<(), ResolutionError> {
    for meta in plugins {
        if let Some(missing) = meta.required.iter().find(|name| !index.contains_key(name.as_str())) {
            return Err(ResolutionError::MissingDependency {
                plugin: meta.name.clone(),
                missing: missing.clone(),
            });
        }
    }
    Ok(())
}

fn check_rivals(
    plugins: &[&PluginMeta],
    index: &HashMap<&str, usize>,
) -> Result<(), ResolutionError> {
    for meta in plugins {
        if let Some(rival) = meta.rivals.iter().find(|name| index.contains_key(name.as_str())) {
            return Err(ResolutionError::RivalConflict {
                plugin: meta.name.clone(),
                rival: rival.clone(),
            });
        }
    }
    Ok(())
}

/// Returns, for every plugin, the plugins that must come after it.
fn build_edges(plugins: &[&PluginMeta], index: &HashMap<&str, usize>) -> Vec<BTreeSet<usize>> {
    let mut successors = vec![BTreeSet::new(); plugins.len()];
    for (node, meta) in plugins.iter().enumerate() {
        for later in meta.pre.iter().filter_map(|name| index.get(name.as_str())) {
            successors[node].insert(*later);
        }
        for earlier in meta.post.iter().filter_map(|name| index.get(name.as_str())) {
            successors[*earlier].insert(node);
        }
    }
    successors
}

/// Kahn's algorithm, always taking the lowest ready index.
///
/// Returns fewer nodes than the graph has when a cycle blocks progress.
fn topological_order(successors: &[BTreeSet<usize>]) -> Vec<usize> {
    let mut in_degree = vec![0_usize; successors.len()];
    for targets in successors {
        for &target in targets {
            in_degree[target] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    let mut order = Vec::with_capacity(successors.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &target in &successors[node] {
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                ready.push(Reverse(target));
            }
        }
    }
    order
}

/// Returns the unplaced nodes that lie on a cycle, in index order.
///
/// Nodes left over by a stalled sort are either on a cycle or only
/// downstream of one. A node is on a cycle when it can reach itself
/// through other unplaced nodes.
fn cycle_members(successors: &[BTreeSet<usize>], placed: &[usize]) -> Vec<usize> {
    let mut unplaced = vec![true; successors.len()];
    for &node in placed {
        unplaced[node] = false;
    }

    (0..successors.len())
        .filter(|&node| unplaced[node] && reaches(successors, &unplaced, node, node))
        .collect()
}

/// Depth-first search from the successors of `from` for `target`, staying
/// inside the unplaced nodes.
fn reaches(successors: &[BTreeSet<usize>], unplaced: &[bool], from: usize, target: usize) -> bool {
    let mut seen = vec![false; successors.len()];
    let mut stack: Vec<usize> = successors[from].iter().copied().collect();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !unplaced[node] || seen[node] {
            continue;
        }
        seen[node] = true;
        stack.extend(successors[node].iter().copied());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    use hookweave_core::ErrorKind;

    #[test]
    fn test_pre_orders_plugin_first() {
        let a = PluginMeta::new("a").before(["b"]);
        let b = PluginMeta::new("b");
        assert_eq!(resolve([&a, &b]).expect("resolve"), vec!["a", "b"]);
        assert_eq!(resolve([&b, &a]).expect("resolve"), vec!["a", "b"]);
    }

    #[test]
    fn test_post_orders_plugin_last() {
        let a = PluginMeta::new("a").after(["c"]);
        let b = PluginMeta::new("b");
        let c = PluginMeta::new("c");
        assert_eq!(resolve([&a, &b, &c]).expect("resolve"), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_insertion_order_breaks_ties() {
        let plugins: Vec<PluginMeta> = ["z", "m", "a"].into_iter().map(PluginMeta::new).collect();
        assert_eq!(resolve(&plugins).expect("resolve"), vec!["z", "m", "a"]);
    }

    #[test]
    fn test_rival_conflict() {
        let a = PluginMeta::new("a").before(["b"]);
        let b = PluginMeta::new("b");
        let c = PluginMeta::new("c").rivals(["a"]);

        assert_eq!(resolve([&a, &b]).expect("resolve"), vec!["a", "b"]);
        let err = resolve([&a, &b, &c]).expect_err("rivals");
        assert_eq!(err.kind(), ErrorKind::RivalConflict);
        assert_eq!(
            err,
            ResolutionError::RivalConflict {
                plugin: "c".into(),
                rival: "a".into(),
            }
        );
    }

    #[test]
    fn test_missing_dependency() {
        let a = PluginMeta::new("a").requires(["z"]);
        let err = resolve([&a]).expect_err("missing");
        assert_eq!(
            err,
            ResolutionError::MissingDependency {
                plugin: "a".into(),
                missing: "z".into(),
            }
        );
    }

    #[test]
    fn test_required_checked_before_rivals() {
        let a = PluginMeta::new("a").requires(["z"]).rivals(["b"]);
        let b = PluginMeta::new("b");
        let err = resolve([&a, &b]).expect_err("missing wins");
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
    }

    #[test]
    fn test_two_node_cycle() {
        let a = PluginMeta::new("a").before(["b"]);
        let b = PluginMeta::new("b").before(["a"]);
        let err = resolve([&a, &b]).expect_err("cycle");
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                members: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn test_cycle_members_exclude_ordered_plugins() {
        let root = PluginMeta::new("root").before(["x"]);
        let x = PluginMeta::new("x").before(["y"]);
        let y = PluginMeta::new("y").after(["x"]).before(["x"]);
        let free = PluginMeta::new("free");
        let err = resolve([&root, &x, &y, &free]).expect_err("cycle");
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                members: vec!["x".into(), "y".into()],
            }
        );
    }

    #[test]
    fn test_cycle_members_exclude_plugins_behind_the_cycle() {
        let x = PluginMeta::new("x").before(["y"]);
        let y = PluginMeta::new("y").before(["x", "downstream"]);
        let downstream = PluginMeta::new("downstream");
        let tail = PluginMeta::new("tail").after(["downstream"]);
        let err = resolve([&x, &y, &downstream, &tail]).expect_err("cycle");
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                members: vec!["x".into(), "y".into()],
            }
        );
    }

    #[test]
    fn test_disjoint_cycles_are_all_reported() {
        let a = PluginMeta::new("a").before(["b"]);
        let b = PluginMeta::new("b").before(["a"]);
        let c = PluginMeta::new("c").after(["b"]);
        let d = PluginMeta::new("d").before(["d"]);
        let err = resolve([&a, &b, &c, &d]).expect_err("cycles");
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                members: vec!["a".into(), "b".into(), "d".into()],
            }
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let a = PluginMeta::new("a").before(["a"]);
        let err = resolve([&a]).expect_err("self cycle");
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                members: vec!["a".into()],
            }
        );
    }

    #[test]
    fn test_unregistered_ordering_targets_are_ignored() {
        let a = PluginMeta::new("a").before(["ghost"]).after(["phantom"]);
        assert_eq!(resolve([&a]).expect("resolve"), vec!["a"]);
    }

    #[test]
    fn test_diamond_is_stable() {
        let top = PluginMeta::new("top").before(["left", "right"]);
        let right = PluginMeta::new("right").before(["bottom"]);
        let left = PluginMeta::new("left").before(["bottom"]);
        let bottom = PluginMeta::new("bottom");
        let plugins = [&bottom, &right, &left, &top];

        let first = resolve(plugins).expect("resolve");
        assert_eq!(first, vec!["top", "right", "left", "bottom"]);
        assert_eq!(resolve(plugins).expect("resolve again"), first);
    }

    #[test]
    fn test_empty_set_resolves_empty() {
        assert!(resolve(std::iter::empty()).expect("resolve").is_empty());
    }
}
