//! Multi-source cost-weighted expansion.
//!
//! Every territorial system (counties over cells, polities, cultures and religions over
//! the county graph, ancient empires) grows its regions the same way: each source
//! claims its node at cost zero, and the frontier always advances from the globally
//! cheapest pending node. Ties break on push order, so identical inputs always give
//! identical partitions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::tilemap::Tilemap;

/// A graph the frontier can walk.
pub trait Graph {
    fn node_count(&self) -> usize;
    /// Push the neighbors of `node` into `out` in a fixed order.
    fn neighbors(&self, node: usize, out: &mut Vec<usize>);
}

impl<T: Clone> Graph for Tilemap<T> {
    fn node_count(&self) -> usize {
        self.len()
    }

    fn neighbors(&self, node: usize, out: &mut Vec<usize>) {
        out.extend(self.neighbors_4(node));
    }
}

/// Adjacency lists indexed by node.
impl Graph for Vec<Vec<usize>> {
    fn node_count(&self) -> usize {
        self.len()
    }

    fn neighbors(&self, node: usize, out: &mut Vec<usize>) {
        out.extend_from_slice(&self[node]);
    }
}

/// One candidate move of the frontier.
#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub from: usize,
    pub to: usize,
    pub owner: usize,
    /// Cost accumulated up to `from`
    pub cost: f32,
    /// Counter carried along the path (consecutive sea steps, for example)
    pub carry: u32,
}

/// Result of pricing a step. `claim: false` lets the frontier pass through a node
/// without the owner keeping it.
#[derive(Clone, Copy, Debug)]
pub struct Advance {
    pub cost: f32,
    pub carry: u32,
    pub claim: bool,
}

impl Advance {
    pub fn claim(cost: f32) -> Self {
        Self { cost, carry: 0, claim: true }
    }
}

/// Entry in the priority queue
struct FrontierEntry {
    cost: OrderedFloat<f32>,
    seq: u64,
    node: usize,
    owner: usize,
    carry: u32,
    claim: bool,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // Min-heap on cost, then on push order
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.cmp(&self.cost).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Owners and accumulated costs after an expansion.
#[derive(Clone, Debug)]
pub struct ExpansionResult {
    pub owner: Vec<Option<usize>>,
    pub cost: Vec<f32>,
}

impl ExpansionResult {
    /// Nodes left without an owner, in index order.
    pub fn unreached(&self) -> impl Iterator<Item = usize> + '_ {
        self.owner.iter().enumerate().filter(|(_, o)| o.is_none()).map(|(i, _)| i)
    }
}

/// Builder for one expansion run.
pub struct Expansion<'a, G: Graph + ?Sized> {
    graph: &'a G,
    sources: Vec<(usize, usize)>,
    max_cost: f32,
    within: Option<Box<dyn Fn(usize, usize) -> bool + 'a>>,
}

impl<'a, G: Graph + ?Sized> Expansion<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self { graph, sources: Vec::new(), max_cost: f32::INFINITY, within: None }
    }

    /// Seed `node` for `owner`. A node seeded twice keeps its first owner.
    pub fn source(mut self, node: usize, owner: usize) -> Self {
        self.sources.push((node, owner));
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Stop growing past this accumulated cost.
    pub fn max_cost(mut self, max_cost: f32) -> Self {
        self.max_cost = max_cost;
        self
    }

    /// Only let `owner` enter nodes for which `allowed(node, owner)` holds.
    pub fn within(mut self, allowed: impl Fn(usize, usize) -> bool + 'a) -> Self {
        self.within = Some(Box::new(allowed));
        self
    }

    /// Run the expansion. `price` returns `None` for an impassable step.
    pub fn run(self, mut price: impl FnMut(Step) -> Option<Advance>) -> ExpansionResult {
        let n = self.graph.node_count();
        let mut owner: Vec<Option<usize>> = vec![None; n];
        let mut cost = vec![f32::INFINITY; n];
        let mut best = vec![f32::INFINITY; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;

        for &(node, source_owner) in &self.sources {
            if node >= n || best[node] == 0.0 {
                continue;
            }
            best[node] = 0.0;
            heap.push(FrontierEntry {
                cost: OrderedFloat(0.0),
                seq,
                node,
                owner: source_owner,
                carry: 0,
                claim: true,
            });
            seq += 1;
        }

        let mut neighbors = Vec::with_capacity(8);
        while let Some(entry) = heap.pop() {
            if settled[entry.node] {
                continue;
            }
            settled[entry.node] = true;
            if entry.claim {
                owner[entry.node] = Some(entry.owner);
                cost[entry.node] = entry.cost.0;
            }

            neighbors.clear();
            self.graph.neighbors(entry.node, &mut neighbors);
            for &next in &neighbors {
                if settled[next] {
                    continue;
                }
                if let Some(allowed) = &self.within {
                    if !allowed(next, entry.owner) {
                        continue;
                    }
                }
                let step = Step {
                    from: entry.node,
                    to: next,
                    owner: entry.owner,
                    cost: entry.cost.0,
                    carry: entry.carry,
                };
                let Some(advance) = price(step) else {
                    continue;
                };
                let total = entry.cost.0 + advance.cost.max(0.0);
                if total > self.max_cost || total >= best[next] {
                    continue;
                }
                best[next] = total;
                heap.push(FrontierEntry {
                    cost: OrderedFloat(total),
                    seq,
                    node: next,
                    owner: entry.owner,
                    carry: advance.carry,
                    claim: advance.claim,
                });
                seq += 1;
            }
        }

        ExpansionResult { owner, cost }
    }
}

/// Index of the point nearest to `(x, y)`; ties keep the lowest index.
pub fn nearest(points: &[(f32, f32)], x: f32, y: f32) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(px, py))| (i, (px - x).powi(2) + (py - y).powi(2)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Vec<usize>> {
        (0..n)
            .map(|i| {
                let mut adj = Vec::new();
                if i > 0 {
                    adj.push(i - 1);
                }
                if i + 1 < n {
                    adj.push(i + 1);
                }
                adj
            })
            .collect()
    }

    #[test]
    fn test_two_sources_split_a_line() {
        let graph = line(10);
        let result = Expansion::new(&graph)
            .source(0, 0)
            .source(9, 1)
            .run(|_| Some(Advance::claim(1.0)));
        let owners: Vec<usize> = result.owner.iter().map(|o| o.unwrap()).collect();
        assert_eq!(owners, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        assert_eq!(result.cost[4], 4.0);
    }

    #[test]
    fn test_ties_go_to_first_source() {
        let graph = line(3);
        let result = Expansion::new(&graph)
            .source(0, 7)
            .source(2, 8)
            .run(|_| Some(Advance::claim(1.0)));
        assert_eq!(result.owner[1], Some(7));
    }

    #[test]
    fn test_max_cost_and_constraint() {
        let graph = line(10);
        let result = Expansion::new(&graph)
            .source(0, 0)
            .max_cost(3.0)
            .run(|_| Some(Advance::claim(1.0)));
        assert_eq!(result.unreached().count(), 6);

        let blocked = Expansion::new(&graph)
            .source(0, 0)
            .within(|node, _| node < 5)
            .run(|_| Some(Advance::claim(1.0)));
        assert_eq!(blocked.unreached().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_pass_through_without_claiming() {
        let graph = line(5);
        let result = Expansion::new(&graph).source(0, 0).run(|step| {
            let water = step.to == 2;
            Some(Advance { cost: 1.0, carry: 0, claim: !water })
        });
        assert_eq!(result.owner[2], None);
        assert_eq!(result.owner[4], Some(0));
    }

    #[test]
    fn test_nearest() {
        let points = [(0.0, 0.0), (10.0, 0.0)];
        assert_eq!(nearest(&points, 6.0, 0.0), Some(1));
        assert_eq!(nearest(&points, 5.0, 0.0), Some(0));
        assert_eq!(nearest(&[], 0.0, 0.0), None);
    }
}
