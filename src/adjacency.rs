use crate::tree::{self, ROOT_PATH};
use crate::types::TreeNode;

/// Whether a single navigation step can take the player from `current` to
/// `candidate`: only the direct parent and direct children qualify.
pub fn is_navigable(candidate: &str, current: &str) -> bool {
    if candidate == current {
        return false;
    }
    if !tree::is_well_formed(candidate) || !tree::is_well_formed(current) {
        return false;
    }
    if tree::parent_path(current).as_deref() == Some(candidate) {
        return true;
    }
    is_direct_child(candidate, current)
}

fn is_direct_child(candidate: &str, current: &str) -> bool {
    let rest = if current == ROOT_PATH {
        candidate.strip_prefix('/')
    } else {
        candidate
            .strip_prefix(current)
            .and_then(|rest| rest.strip_prefix('/'))
    };
    match rest {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// Navigable nodes that actually exist in `root`, parent first.
pub fn navigable_paths(root: &TreeNode, current: &str) -> Vec<String> {
    let Some(node) = tree::find(root, current) else {
        return Vec::new();
    };
    let mut paths = Vec::with_capacity(node.children.len() + 1);
    if let Some(parent) = tree::parent_path(current) {
        if tree::contains(root, &parent) {
            paths.push(parent);
        }
    }
    paths.extend(
        node.children
            .iter()
            .filter(|child| is_navigable(&child.path, current))
            .map(|child| child.path.clone()),
    );
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::sample_tree;
    use crate::tree::random_tree;
    use crate::tree::walk;

    #[test]
    fn root_and_sibling_scenario() {
        assert!(is_navigable("/", "/home"));
        assert!(!is_navigable("/usr", "/home"));
    }

    #[test]
    fn self_navigation_is_rejected() {
        let tree = random_tree(11, 4, 4);
        for node in walk(&tree) {
            assert!(!is_navigable(&node.path, &node.path));
        }
    }

    #[test]
    fn children_are_navigable_and_grandchildren_are_not() {
        for seed in 0..8 {
            let tree = random_tree(seed, 4, 3);
            for node in walk(&tree) {
                for child in &node.children {
                    assert!(is_navigable(&child.path, &node.path));
                    assert!(is_navigable(&node.path, &child.path));
                    for grandchild in &child.children {
                        assert!(!is_navigable(&grandchild.path, &node.path));
                        assert!(!is_navigable(&node.path, &grandchild.path));
                    }
                }
            }
        }
    }

    #[test]
    fn root_children_have_one_segment() {
        assert!(is_navigable("/var", "/"));
        assert!(!is_navigable("/var/log", "/"));
        assert!(!is_navigable("/", "/"));
    }

    #[test]
    fn prefix_lookalikes_are_not_children() {
        assert!(!is_navigable("/homework", "/home"));
        assert!(!is_navigable("/home2/x", "/home"));
    }

    #[test]
    fn malformed_paths_are_never_navigable() {
        assert!(!is_navigable("", "/"));
        assert!(!is_navigable("home", "/"));
        assert!(!is_navigable("/home/", "/"));
        assert!(!is_navigable("/", "home"));
        assert!(!is_navigable("/home//x", "/home"));
    }

    #[test]
    fn navigable_paths_lists_parent_then_children() {
        let tree = sample_tree();
        assert_eq!(
            navigable_paths(&tree, "/home"),
            vec![
                "/".to_string(),
                "/home/alice".to_string(),
                "/home/bob".to_string()
            ]
        );
        assert_eq!(
            navigable_paths(&tree, "/"),
            vec!["/home".to_string(), "/usr".to_string(), "/var".to_string()]
        );
        assert!(navigable_paths(&tree, "/nowhere").is_empty());
    }
}
