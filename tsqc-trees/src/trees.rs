//! Iterate over the local trees of a [`TreeSequence`] from left to right.
//!
//! Each step removes the edges that end at the current position and inserts the
//! edges that start there, so moving to the next tree only touches what changed.

use crate::{TreeSequence, NULL};
use itertools::Itertools;
use std::ops::Range;

/// The local tree covering the genome interval `[left, right)`.
#[derive(Clone, Debug)]
pub struct Tree {
    /// Position of the tree along the genome, starting at 0.
    pub index: usize,
    pub left: f64,
    pub right: f64,
    /// Parent of each node, or [`NULL`].
    pub parent: Vec<i32>,
    pub num_children: Vec<u32>,
    /// Number of samples at or below each node.
    pub num_samples: Vec<u32>,
    pub num_edges: usize,
    /// Number of nodes without a parent that have samples below them.
    pub num_roots: usize,
    /// Sum of the branch lengths (parent time minus child time) of the tree.
    pub total_branch_length: f64,
    /// Ids of the sites inside `[left, right)`.
    pub sites: Range<usize>,
}

impl Tree {
    pub fn span(&self) -> f64 {
        self.right - self.left
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }
}

/// Summary of one local tree, as reported by [`TreeSequence::tree_summaries`].
#[derive(Clone, Debug, PartialEq)]
pub struct TreeSummary {
    pub index: usize,
    pub left: f64,
    pub right: f64,
    pub num_edges: usize,
    pub num_roots: usize,
    pub num_sites: usize,
    pub num_mutations: usize,
    pub total_branch_length: f64,
}

impl TreeSummary {
    pub fn span(&self) -> f64 {
        self.right - self.left
    }
}

/// Lending iterator over the trees of a [`TreeSequence`].
///
/// ## Examples
///
/// ```rust
/// let ts = tsqc_trees::examples::example_1();
/// let mut trees = ts.trees();
/// let mut intervals = Vec::new();
/// while let Some(tree) = trees.next_tree() {
///     intervals.push((tree.left, tree.right));
/// }
/// assert_eq!(intervals, [(0.0, 5.0), (5.0, 10.0)]);
/// ```
pub struct Trees<'ts> {
    ts: &'ts TreeSequence,
    insertion: Vec<usize>,
    removal: Vec<usize>,
    /// Next edge to insert, in insertion order.
    j: usize,
    /// Next edge to remove, in removal order.
    k: usize,
    next_site: usize,
    started: bool,
    tree: Tree,
}

impl<'ts> Trees<'ts> {
    fn new(ts: &'ts TreeSequence) -> Self {
        let edges = &ts.tables().edges;
        let time = &ts.tables().nodes.time;
        let parent_time = |e: &usize| time[edges.parent[*e] as usize];

        // insert by increasing left, younger parents first
        let insertion = (0..edges.len())
            .sorted_by(|a, b| {
                edges.left[*a]
                    .total_cmp(&edges.left[*b])
                    .then(parent_time(a).total_cmp(&parent_time(b)))
                    .then(edges.parent[*a].cmp(&edges.parent[*b]))
                    .then(edges.child[*a].cmp(&edges.child[*b]))
            })
            .collect();

        // remove by increasing right, older parents first
        let removal = (0..edges.len())
            .sorted_by(|a, b| {
                edges.right[*a]
                    .total_cmp(&edges.right[*b])
                    .then(parent_time(b).total_cmp(&parent_time(a)))
                    .then(edges.parent[*b].cmp(&edges.parent[*a]))
                    .then(edges.child[*b].cmp(&edges.child[*a]))
            })
            .collect();

        let num_nodes = ts.num_nodes();
        let mut num_samples = vec![0; num_nodes];
        ts.samples().iter().for_each(|s| num_samples[*s as usize] = 1);

        let tree = Tree {
            index: 0,
            left: 0.0,
            right: 0.0,
            parent: vec![NULL; num_nodes],
            num_children: vec![0; num_nodes],
            num_samples,
            num_edges: 0,
            // every sample starts out as its own root
            num_roots: ts.num_samples(),
            total_branch_length: 0.0,
            sites: 0..0,
        };

        Trees { ts, insertion, removal, j: 0, k: 0, next_site: 0, started: false, tree }
    }

    /// Advances to the next tree, returning [`None`] after the last one.
    pub fn next_tree(&mut self) -> Option<&Tree> {
        let length = self.ts.sequence_length();
        let num_edges = self.insertion.len();
        let left = match self.started {
            true => self.tree.right,
            false => 0.0,
        };
        if self.started && left >= length {
            return None;
        }

        let ts = self.ts;
        let edges = &ts.tables().edges;
        while self.k < num_edges && edges.right[self.removal[self.k]] == left {
            self.remove_edge(self.removal[self.k]);
            self.k += 1;
        }
        while self.j < num_edges && edges.left[self.insertion[self.j]] == left {
            self.insert_edge(self.insertion[self.j]);
            self.j += 1;
        }

        let mut right = length;
        if self.j < num_edges {
            right = right.min(edges.left[self.insertion[self.j]]);
        }
        if self.k < num_edges {
            right = right.min(edges.right[self.removal[self.k]]);
        }

        // sites are sorted, so the tree takes the next run of them
        let position = &ts.tables().sites.position;
        let first_site = self.next_site;
        while self.next_site < position.len() && position[self.next_site] < right {
            self.next_site += 1;
        }

        if self.started {
            self.tree.index += 1;
        }
        self.started = true;
        self.tree.left = left;
        self.tree.right = right;
        self.tree.sites = first_site..self.next_site;
        Some(&self.tree)
    }

    fn insert_edge(&mut self, edge: usize) {
        let ts = self.ts;
        let tables = ts.tables();
        let parent = tables.edges.parent[edge];
        let child = tables.edges.child[edge];
        let tree = &mut self.tree;

        let child_samples = tree.num_samples[child as usize];
        let top = propagate(tree, parent, |n| *n += child_samples);
        let top_samples = tree.num_samples[top as usize];

        // the child stops being a root; the top of the parent's tree may become one
        let was_root = (child_samples > 0) as usize + (top_samples > child_samples) as usize;
        let is_root = (top_samples > 0) as usize;
        tree.num_roots = tree.num_roots + is_root - was_root;

        tree.parent[child as usize] = parent;
        tree.num_children[parent as usize] += 1;
        tree.num_edges += 1;
        tree.total_branch_length +=
            tables.nodes.time[parent as usize] - tables.nodes.time[child as usize];
    }

    fn remove_edge(&mut self, edge: usize) {
        let ts = self.ts;
        let tables = ts.tables();
        let parent = tables.edges.parent[edge];
        let child = tables.edges.child[edge];
        let tree = &mut self.tree;

        let child_samples = tree.num_samples[child as usize];
        let top = propagate(tree, parent, |n| *n -= child_samples);
        let top_samples = tree.num_samples[top as usize];

        let was_root = (top_samples + child_samples > 0) as usize;
        let is_root = (top_samples > 0) as usize + (child_samples > 0) as usize;
        tree.num_roots = tree.num_roots + is_root - was_root;

        tree.parent[child as usize] = NULL;
        tree.num_children[parent as usize] -= 1;
        tree.num_edges -= 1;
        tree.total_branch_length -=
            tables.nodes.time[parent as usize] - tables.nodes.time[child as usize];
    }
}

/// Applies `update` to the sample count of `node` and all its ancestors, returning the topmost ancestor.
fn propagate<F>(tree: &mut Tree, node: i32, update: F) -> i32
where
    F: Fn(&mut u32),
{
    let mut u = node;
    loop {
        update(&mut tree.num_samples[u as usize]);
        match tree.parent[u as usize] {
            NULL => return u,
            p => u = p,
        }
    }
}

impl TreeSequence {
    /// Returns a lending iterator over the local trees.
    pub fn trees(&self) -> Trees<'_> {
        Trees::new(self)
    }

    /// Summarizes every local tree.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// let summaries = ts.tree_summaries();
    /// assert_eq!(summaries.len(), 2);
    /// assert_eq!(summaries[1].left, 5.0);
    /// assert_eq!(summaries[1].num_edges, 6);
    /// assert_eq!(summaries[1].num_roots, 1);
    /// assert_eq!(summaries[1].num_sites, 2);
    /// assert_eq!(summaries[1].num_mutations, 3);
    /// ```
    pub fn tree_summaries(&self) -> Vec<TreeSummary> {
        let mut summaries = Vec::new();
        let mut trees = self.trees();
        while let Some(tree) = trees.next_tree() {
            let num_mutations = tree.sites.clone().map(|s| self.site_mutations(s).len()).sum();
            summaries.push(TreeSummary {
                index: tree.index,
                left: tree.left,
                right: tree.right,
                num_edges: tree.num_edges,
                num_roots: tree.num_roots,
                num_sites: tree.num_sites(),
                num_mutations,
                total_branch_length: tree.total_branch_length,
            });
        }
        summaries
    }

    /// Number of samples that inherit the derived state of each mutation.
    ///
    /// Samples below a later mutation at the same site, beneath this one, inherit
    /// that mutation's state instead.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// assert_eq!(ts.mutation_sample_counts(), [2, 1, 3, 1, 1]);
    /// ```
    pub fn mutation_sample_counts(&self) -> Vec<u32> {
        let mutations = &self.tables().mutations;
        let mut counts = vec![0u32; mutations.len()];

        let mut trees = self.trees();
        while let Some(tree) = trees.next_tree() {
            for site in tree.sites.clone() {
                let ids = self.site_mutations(site);
                for m in ids.clone() {
                    counts[m] = tree.num_samples[mutations.node[m] as usize];
                }
                for m in ids {
                    let parent = mutations.parent[m];
                    if parent != NULL {
                        let below = tree.num_samples[mutations.node[m] as usize];
                        counts[parent as usize] = counts[parent as usize].saturating_sub(below);
                    }
                }
            }
        }
        counts
    }
}
