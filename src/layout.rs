//! Top-down tidy tree layout.
//!
//! Positions come from the Buchheim/Walker algorithm run over an index arena
//! built from the tree snapshot, with a separation function that widens the
//! gaps near the root and inside crowded directories. The canvas grows with
//! the widest level instead of squeezing nodes together.

use std::collections::HashMap;

use crate::config::{LayoutOptions, SeparationOptions};
use crate::tree::level_widths;
use crate::types::{Margin, NodeSummary, PositionedNode, TreeNode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    pub nodes: Vec<PositionedNode>,
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    index: HashMap<String, usize>,
}

impl TreeLayout {
    pub fn get(&self, path: &str) -> Option<&PositionedNode> {
        self.index.get(path).map(|&idx| &self.nodes[idx])
    }

    pub fn root(&self) -> Option<&PositionedNode> {
        self.nodes.first()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for node in &self.nodes[1..] {
            bounds.min_x = bounds.min_x.min(node.x);
            bounds.max_x = bounds.max_x.max(node.x);
            bounds.min_y = bounds.min_y.min(node.y);
            bounds.max_y = bounds.max_y.max(node.y);
        }
        Some(bounds)
    }
}

pub fn layout(root: &TreeNode, options: &LayoutOptions) -> TreeLayout {
    let mut arena = Arena::build(root);
    arena.first_walk_all(&options.separation);
    arena.second_walk_all();

    let widths = level_widths(root);
    let max_level = widths.iter().copied().max().unwrap_or(1) as f64;
    let width = (options.container_width * options.width_multiplier)
        .max(max_level * options.node_spacing);
    let max_depth = widths.len().saturating_sub(1);
    let height = max_depth as f64 * options.level_height;

    arena.normalize(width, &options.separation);

    let root_x = arena.nodes.get(1).map(|node| node.x).unwrap_or(0.0);
    let recenter = width / 2.0 - root_x;

    let mut nodes = Vec::with_capacity(arena.sources.len());
    let mut index = HashMap::with_capacity(arena.sources.len());
    for (idx, source) in arena.sources.iter().enumerate().skip(1) {
        let Some(source) = source else {
            continue;
        };
        let node = &arena.nodes[idx];
        index.insert(source.path.clone(), nodes.len());
        nodes.push(PositionedNode {
            node: NodeSummary::from(*source),
            x: node.x + recenter,
            y: node.depth as f64 * options.level_height,
            depth: node.depth,
        });
    }

    TreeLayout {
        nodes,
        width,
        height,
        margin: options.margin,
        index,
    }
}

#[derive(Clone, Debug, Default)]
struct WalkNode {
    parent: Option<usize>,
    children: Vec<usize>,
    index: usize,
    depth: usize,
    z: f64,
    m: f64,
    c: f64,
    s: f64,
    x: f64,
    ancestor: usize,
    thread: Option<usize>,
    default_ancestor: Option<usize>,
}

/// Index 0 is a virtual parent of the real root so the root has a sibling list.
struct Arena<'a> {
    nodes: Vec<WalkNode>,
    sources: Vec<Option<&'a TreeNode>>,
}

impl<'a> Arena<'a> {
    fn build(root: &'a TreeNode) -> Self {
        let mut nodes = vec![WalkNode::default()];
        let mut sources: Vec<Option<&'a TreeNode>> = vec![None];
        let mut stack = vec![(root, 0usize, 0usize, 0usize)];
        while let Some((source, parent, index, depth)) = stack.pop() {
            let idx = nodes.len();
            nodes.push(WalkNode {
                parent: Some(parent),
                index,
                depth,
                ancestor: idx,
                ..WalkNode::default()
            });
            sources.push(Some(source));
            nodes[parent].children.push(idx);
            for (child_index, child) in source.children.iter().enumerate().rev() {
                stack.push((child, idx, child_index, depth + 1));
            }
        }
        Self { nodes, sources }
    }

    fn post_order(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![1usize];
        while let Some(idx) = stack.pop() {
            if idx >= self.nodes.len() {
                break;
            }
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().copied());
        }
        out.reverse();
        out
    }

    fn separation(&self, a: usize, b: usize, options: &SeparationOptions) -> f64 {
        let parent = self.nodes[a].parent;
        if parent != self.nodes[b].parent {
            return options.cousin;
        }
        if self.nodes[a].depth <= options.top_level_max_depth {
            return options.top_level;
        }
        let sibling_count = parent
            .map(|parent| self.nodes[parent].children.len())
            .unwrap_or(0);
        let both_leaves =
            self.nodes[a].children.is_empty() && self.nodes[b].children.is_empty();
        if sibling_count > options.crowded_child_count && both_leaves {
            return options.crowded_leaf;
        }
        options.sibling
    }

    fn first_walk_all(&mut self, options: &SeparationOptions) {
        if self.nodes.len() < 2 {
            return;
        }
        for idx in self.post_order() {
            self.first_walk(idx, options);
        }
        self.nodes[0].m = -self.nodes[1].z;
    }

    fn first_walk(&mut self, v: usize, options: &SeparationOptions) {
        let Some(parent) = self.nodes[v].parent else {
            return;
        };
        let position = self.nodes[v].index;
        let left_sibling = if position > 0 {
            Some(self.nodes[parent].children[position - 1])
        } else {
            None
        };

        if !self.nodes[v].children.is_empty() {
            self.execute_shifts(v);
            let children = &self.nodes[v].children;
            let first = children[0];
            let last = children[children.len() - 1];
            let midpoint = (self.nodes[first].z + self.nodes[last].z) / 2.0;
            if let Some(w) = left_sibling {
                self.nodes[v].z = self.nodes[w].z + self.separation(v, w, options);
                self.nodes[v].m = self.nodes[v].z - midpoint;
            } else {
                self.nodes[v].z = midpoint;
            }
        } else if let Some(w) = left_sibling {
            self.nodes[v].z = self.nodes[w].z + self.separation(v, w, options);
        }

        let ancestor = self.nodes[parent]
            .default_ancestor
            .unwrap_or(self.nodes[parent].children[0]);
        let ancestor = self.apportion(v, left_sibling, ancestor, options);
        self.nodes[parent].default_ancestor = Some(ancestor);
    }

    fn apportion(
        &mut self,
        v: usize,
        left_sibling: Option<usize>,
        mut ancestor: usize,
        options: &SeparationOptions,
    ) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };
        let Some(parent) = self.nodes[v].parent else {
            return ancestor;
        };

        let mut vop = v;
        let mut vom = self.nodes[parent].children[0];
        let mut sip = self.nodes[v].m;
        let mut sop = self.nodes[v].m;
        let mut sim = self.nodes[w].m;
        let mut som = self.nodes[vom].m;

        let mut inner_left = self.next_right(w);
        let mut inner_right = self.next_left(v);
        while let (Some(vim), Some(vip)) = (inner_left, inner_right) {
            if let Some(next) = self.next_left(vom) {
                vom = next;
            }
            if let Some(next) = self.next_right(vop) {
                vop = next;
            }
            self.nodes[vop].ancestor = v;
            let shift = self.nodes[vim].z + sim - self.nodes[vip].z - sip
                + self.separation(vim, vip, options);
            if shift > 0.0 {
                let from = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(from, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.nodes[vim].m;
            sip += self.nodes[vip].m;
            som += self.nodes[vom].m;
            sop += self.nodes[vop].m;
            inner_left = self.next_right(vim);
            inner_right = self.next_left(vip);
        }

        if let Some(vim) = inner_left {
            if self.next_right(vop).is_none() {
                self.nodes[vop].thread = Some(vim);
                self.nodes[vop].m += sim - sop;
            }
        }
        if let Some(vip) = inner_right {
            if self.next_left(vom).is_none() {
                self.nodes[vom].thread = Some(vip);
                self.nodes[vom].m += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .first()
            .copied()
            .or(self.nodes[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .last()
            .copied()
            .or(self.nodes[v].thread)
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.nodes[vim].ancestor;
        if self.nodes[candidate].parent == self.nodes[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let span = self.nodes[wp].index.saturating_sub(self.nodes[wm].index).max(1);
        let change = shift / span as f64;
        self.nodes[wp].c -= change;
        self.nodes[wp].s += shift;
        self.nodes[wm].c += change;
        self.nodes[wp].z += shift;
        self.nodes[wp].m += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let children = self.nodes[v].children.clone();
        for &w in children.iter().rev() {
            self.nodes[w].z += shift;
            self.nodes[w].m += shift;
            change += self.nodes[w].c;
            shift += self.nodes[w].s + change;
        }
    }

    fn second_walk_all(&mut self) {
        // Arena order is pre-order, so parents are final before their children.
        for idx in 1..self.nodes.len() {
            let Some(parent) = self.nodes[idx].parent else {
                continue;
            };
            let parent_m = self.nodes[parent].m;
            self.nodes[idx].x = self.nodes[idx].z + parent_m;
            self.nodes[idx].m += parent_m;
        }
    }

    /// Maps walker units onto `[0, width]`.
    fn normalize(&mut self, width: f64, options: &SeparationOptions) {
        if self.nodes.len() < 2 {
            return;
        }
        let mut left = 1;
        let mut right = 1;
        for idx in 1..self.nodes.len() {
            if self.nodes[idx].x < self.nodes[left].x {
                left = idx;
            }
            if self.nodes[idx].x > self.nodes[right].x {
                right = idx;
            }
        }
        let s = if left == right {
            1.0
        } else {
            self.separation(left, right, options) / 2.0
        };
        let tx = s - self.nodes[left].x;
        let kx = width / (self.nodes[right].x + s + tx);
        for node in self.nodes.iter_mut().skip(1) {
            node.x = (node.x + tx) * kx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::{dir, sample_tree};
    use crate::tree::random_tree;
    use crate::tree::walk;

    fn options() -> LayoutOptions {
        LayoutOptions::default()
    }

    #[test]
    fn layout_is_deterministic() {
        for seed in 0..6 {
            let tree = random_tree(seed, 5, 4);
            let a = layout(&tree, &options());
            let b = layout(&tree, &options());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn every_node_is_positioned_once() {
        let tree = random_tree(3, 4, 5);
        let result = layout(&tree, &options());
        assert_eq!(result.nodes.len(), walk(&tree).count());
        for node in walk(&tree) {
            assert!(result.get(&node.path).is_some(), "missing {}", node.path);
        }
    }

    #[test]
    fn root_sits_on_canvas_midline() {
        let result = layout(&sample_tree(), &options());
        let root = result.root().expect("root should be positioned");
        assert_eq!(root.node.path, "/");
        assert!((root.x - result.width / 2.0).abs() < 1e-9);
        assert_eq!(root.y, 0.0);
    }

    #[test]
    fn single_node_tree_is_centered() {
        let result = layout(&dir("/", vec![]), &options());
        assert_eq!(result.nodes.len(), 1);
        assert!((result.nodes[0].x - result.width / 2.0).abs() < 1e-9);
        assert_eq!(result.height, 0.0);
    }

    #[test]
    fn depth_maps_to_level_height() {
        let opts = options();
        let result = layout(&sample_tree(), &opts);
        let alice = result.get("/home/alice").expect("alice positioned");
        assert_eq!(alice.depth, 2);
        assert_eq!(alice.y, 2.0 * opts.level_height);
        assert_eq!(result.height, 2.0 * opts.level_height);
    }

    #[test]
    fn siblings_keep_their_order_left_to_right() {
        let result = layout(&sample_tree(), &options());
        let x = |path: &str| result.get(path).map(|n| n.x).unwrap_or(f64::NAN);
        assert!(x("/home") < x("/usr"));
        assert!(x("/usr") < x("/var"));
        assert!(x("/home/alice") < x("/home/bob"));
        assert!(x("/home/bob") < x("/usr/bin"));
    }

    #[test]
    fn no_two_nodes_on_a_level_overlap() {
        for seed in 0..6 {
            let tree = random_tree(seed, 4, 5);
            let result = layout(&tree, &options());
            let mut by_depth: HashMap<usize, Vec<f64>> = HashMap::new();
            for node in &result.nodes {
                by_depth.entry(node.depth).or_default().push(node.x);
            }
            for xs in by_depth.values_mut() {
                xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                for pair in xs.windows(2) {
                    assert!(pair[1] - pair[0] > 1e-6, "overlap in seed {seed}");
                }
            }
        }
    }

    #[test]
    fn crowded_levels_grow_the_canvas() {
        let leaves = (0..40)
            .map(|idx| dir(&format!("/d{idx}"), vec![]))
            .collect();
        let opts = options();
        let result = layout(&dir("/", leaves), &opts);
        assert_eq!(result.width, 40.0 * opts.node_spacing);

        let small = layout(&sample_tree(), &opts);
        assert_eq!(small.width, opts.container_width * opts.width_multiplier);
    }

    #[test]
    fn separation_rules_follow_depth_and_crowding() {
        let crowded = dir(
            "/",
            vec![dir(
                "/usr",
                vec![dir(
                    "/usr/share",
                    vec![
                        dir("/usr/share/a", vec![]),
                        dir("/usr/share/b", vec![]),
                        dir("/usr/share/c", vec![]),
                        dir("/usr/share/d", vec![dir("/usr/share/d/x", vec![])]),
                    ],
                )],
            )],
        );
        let arena = Arena::build(&crowded);
        let opts = SeparationOptions::default();
        let path_of = |idx: usize| arena.sources[idx].map(|n| n.path.clone());
        let find = |path: &str| {
            (1..arena.nodes.len())
                .find(|&idx| path_of(idx).as_deref() == Some(path))
                .expect("node in arena")
        };
        let a = find("/usr/share/a");
        let b = find("/usr/share/b");
        let c = find("/usr/share/c");
        let d = find("/usr/share/d");
        assert_eq!(arena.separation(b, a, &opts), opts.crowded_leaf);
        assert_eq!(arena.separation(d, c, &opts), opts.sibling);
        assert_eq!(
            arena.separation(find("/usr/share"), find("/usr"), &opts),
            opts.cousin
        );
    }

    #[test]
    fn top_level_siblings_get_the_widest_gap() {
        let tree = sample_tree();
        let arena = Arena::build(&tree);
        let opts = SeparationOptions::default();
        // /home and /usr are the second and fifth arena entries.
        let home = 2;
        let usr = 5;
        assert_eq!(arena.sources[home].map(|n| n.path.as_str()), Some("/home"));
        assert_eq!(arena.sources[usr].map(|n| n.path.as_str()), Some("/usr"));
        assert_eq!(arena.separation(usr, home, &opts), opts.top_level);
    }

    #[test]
    fn bounds_cover_all_nodes() {
        let result = layout(&sample_tree(), &options());
        let bounds = result.bounds().expect("non-empty layout");
        for node in &result.nodes {
            assert!(node.x >= bounds.min_x && node.x <= bounds.max_x);
            assert!(node.y >= bounds.min_y && node.y <= bounds.max_y);
        }
        assert!(TreeLayout::default().bounds().is_none());
    }
}
