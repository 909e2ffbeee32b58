use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::TreeNode;

pub const ROOT_PATH: &str = "/";

/// Splits a '/'-delimited absolute path into its segments.
/// Returns `None` for relative paths, empty segments or a trailing separator.
pub fn segments(path: &str) -> Option<Vec<&str>> {
    if path == ROOT_PATH {
        return Some(Vec::new());
    }
    let rest = path.strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(parts)
}

pub fn is_well_formed(path: &str) -> bool {
    segments(path).is_some()
}

pub fn parent_path(path: &str) -> Option<String> {
    let parts = segments(path)?;
    if parts.is_empty() {
        return None;
    }
    if parts.len() == 1 {
        return Some(ROOT_PATH.to_string());
    }
    Some(format!("/{}", parts[..parts.len() - 1].join("/")))
}

/// Number of parent/child hops between two paths.
pub fn hop_distance(a: &str, b: &str) -> Option<usize> {
    let a_parts = segments(a)?;
    let b_parts = segments(b)?;
    let common = a_parts
        .iter()
        .zip(b_parts.iter())
        .take_while(|(x, y)| x == y)
        .count();
    Some(a_parts.len() - common + b_parts.len() - common)
}

pub fn find<'a>(root: &'a TreeNode, path: &str) -> Option<&'a TreeNode> {
    let parts = segments(path)?;
    if root.path != ROOT_PATH {
        return walk(root).find(|node| node.path == path);
    }
    let mut current = root;
    let mut prefix = String::new();
    for part in parts {
        prefix.push('/');
        prefix.push_str(part);
        current = current.children.iter().find(|child| child.path == prefix)?;
    }
    Some(current)
}

pub fn contains(root: &TreeNode, path: &str) -> bool {
    find(root, path).is_some()
}

/// Pre-order traversal without recursion.
pub fn walk(root: &TreeNode) -> impl Iterator<Item = &TreeNode> {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        stack.extend(node.children.iter().rev());
        Some(node)
    })
}

pub fn mole_paths(root: &TreeNode) -> Vec<String> {
    walk(root)
        .filter(|node| node.has_mole)
        .map(|node| node.path.clone())
        .collect()
}

pub fn first_mole_path(root: &TreeNode) -> Option<String> {
    walk(root)
        .find(|node| node.has_mole)
        .map(|node| node.path.clone())
}

/// Rebuilds the tree so that only `target` carries the mole flag.
/// `None` strips the flag from every node.
pub fn with_mole_at(root: &TreeNode, target: Option<&str>) -> TreeNode {
    relabel(root.clone(), target)
}

fn relabel(mut node: TreeNode, target: Option<&str>) -> TreeNode {
    node.has_mole = target == Some(node.path.as_str());
    node.children = node
        .children
        .into_iter()
        .map(|child| relabel(child, target))
        .collect();
    node
}

/// Seeded synthetic tree with `d<N>` directories, for demos and replays.
pub fn random_tree(seed: u64, max_depth: usize, max_children: usize) -> TreeNode {
    let mut rng = StdRng::seed_from_u64(seed);
    grow(&mut rng, "/", 0, max_depth, max_children)
}

fn grow(
    rng: &mut StdRng,
    path: &str,
    depth: usize,
    max_depth: usize,
    max_children: usize,
) -> TreeNode {
    let count = if depth >= max_depth {
        0
    } else {
        rng.random_range(0..=max_children)
    };
    let children = (0..count)
        .map(|idx| {
            let child = if path == "/" {
                format!("/d{idx}")
            } else {
                format!("{path}/d{idx}")
            };
            grow(rng, &child, depth + 1, max_depth, max_children)
        })
        .collect();
    TreeNode::new(path.rsplit('/').next().unwrap_or_default(), path).with_children(children)
}

/// Node count per depth, index 0 being the root level.
pub fn level_widths(root: &TreeNode) -> Vec<usize> {
    let mut widths = Vec::new();
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        widths.push(frontier.len());
        frontier = frontier
            .iter()
            .flat_map(|node| node.children.iter())
            .collect();
    }
    widths
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::TreeNode;

    pub fn dir(path: &str, children: Vec<TreeNode>) -> TreeNode {
        let name = path.rsplit('/').next().unwrap_or_default();
        TreeNode::new(name, path).with_children(children)
    }

    /// `/` with `/home/{alice,bob}`, `/usr/{bin,lib}` and `/var/log`.
    pub fn sample_tree() -> TreeNode {
        dir(
            "/",
            vec![
                dir(
                    "/home",
                    vec![dir("/home/alice", vec![]), dir("/home/bob", vec![])],
                ),
                dir("/usr", vec![dir("/usr/bin", vec![]), dir("/usr/lib", vec![])]),
                dir("/var", vec![dir("/var/log", vec![])]),
            ],
        )
    }
}
