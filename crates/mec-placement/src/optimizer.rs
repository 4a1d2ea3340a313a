//! Capacity-constrained assignment solver.
//!
//! The myopic-optimal strategy reduces one placement step to a generalized
//! assignment problem: every service picks exactly one of its candidate
//! clouds, the summed memory on each cloud stays within capacity, and the
//! summed cost is minimized.  [`Optimizer`] is the seam for external solvers;
//! [`BranchAndBoundOptimizer`] is the in-crate exact reference.

use crate::{PlacementError, PlacementResult};

/// One solve's input.  Clouds and services are addressed by dense index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignmentProblem {
    /// Memory capacity per cloud.
    pub capacities: Vec<f64>,
    /// Memory requirement per service.
    pub memories:   Vec<f64>,
    /// Per service: `(cloud index, cost)` candidates.
    pub candidates: Vec<Vec<(usize, f64)>>,
}

impl AssignmentProblem {
    pub fn num_services(&self) -> usize {
        self.memories.len()
    }
}

/// One solve's output.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Chosen cloud index per service.
    pub choice: Vec<usize>,
    pub cost:   f64,
}

/// Blocking assignment solver.
pub trait Optimizer: Send {
    /// Minimum-cost assignment, or [`PlacementError::InfeasibleOptimization`].
    fn solve(&self, problem: &AssignmentProblem) -> PlacementResult<Assignment>;
}

// ── BranchAndBoundOptimizer ───────────────────────────────────────────────────

/// Depth-first branch and bound.
///
/// Services are branched in order of fewest candidates, each service's
/// candidates cheapest first.  A branch is pruned when its cost plus the sum
/// of the remaining services' cheapest candidates cannot beat the incumbent.
/// After `node_limit` expansions the incumbent is returned if there is one.
#[derive(Copy, Clone, Debug)]
pub struct BranchAndBoundOptimizer {
    pub node_limit: u64,
}

impl BranchAndBoundOptimizer {
    pub const DEFAULT_NODE_LIMIT: u64 = 1_000_000;

    pub fn new(node_limit: u64) -> Self {
        Self { node_limit }
    }
}

impl Default for BranchAndBoundOptimizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NODE_LIMIT)
    }
}

struct Search<'p> {
    problem:    &'p AssignmentProblem,
    order:      Vec<usize>,
    /// Candidates per service, ascending by cost.
    sorted:     Vec<Vec<(usize, f64)>>,
    /// `bound[k]` = summed cheapest cost of `order[k..]`.
    bound:      Vec<f64>,
    used:       Vec<f64>,
    current:    Vec<usize>,
    best:       Option<(f64, Vec<usize>)>,
    nodes:      u64,
    node_limit: u64,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize, cost: f64) {
        if self.nodes >= self.node_limit {
            return;
        }
        self.nodes += 1;

        if let Some((best, _)) = &self.best {
            if cost + self.bound[depth] >= *best {
                return;
            }
        }
        if depth == self.order.len() {
            self.best = Some((cost, self.current.clone()));
            return;
        }

        let service = self.order[depth];
        let memory = self.problem.memories[service];
        for i in 0..self.sorted[service].len() {
            let (cloud, c) = self.sorted[service][i];
            if self.used[cloud] + memory > self.problem.capacities[cloud] {
                continue;
            }
            self.used[cloud] += memory;
            self.current[service] = cloud;
            self.descend(depth + 1, cost + c);
            self.used[cloud] -= memory;
        }
    }
}

impl Optimizer for BranchAndBoundOptimizer {
    fn solve(&self, problem: &AssignmentProblem) -> PlacementResult<Assignment> {
        let n = problem.num_services();
        if problem.candidates.len() != n {
            return Err(PlacementError::InvalidParameter(format!(
                "{} candidate lists for {} services",
                problem.candidates.len(),
                n
            )));
        }

        let mut sorted: Vec<Vec<(usize, f64)>> = problem
            .candidates
            .iter()
            .map(|cands| cands.iter().copied().filter(|&(c, cost)| c < problem.capacities.len() && cost.is_finite()).collect())
            .collect();
        for cands in &mut sorted {
            cands.sort_by(|a, b| a.1.total_cmp(&b.1));
        }
        if let Some(s) = sorted.iter().position(Vec::is_empty) {
            return Err(PlacementError::InfeasibleOptimization(format!("service #{s} has no candidate cloud")));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&s| sorted[s].len());

        let mut bound = vec![0.0; n + 1];
        for k in (0..n).rev() {
            bound[k] = bound[k + 1] + sorted[order[k]][0].1;
        }

        let mut search = Search {
            problem,
            order,
            sorted,
            bound,
            used: vec![0.0; problem.capacities.len()],
            current: vec![0; n],
            best: None,
            nodes: 0,
            node_limit: self.node_limit,
        };
        search.descend(0, 0.0);

        let exhausted = search.nodes >= self.node_limit;
        match search.best {
            Some((cost, choice)) => {
                if exhausted {
                    log::warn!("branch and bound hit its {} node limit; assignment may be suboptimal", self.node_limit);
                }
                Ok(Assignment { choice, cost })
            }
            None if exhausted => Err(PlacementError::NodeLimitExceeded(self.node_limit)),
            None => Err(PlacementError::InfeasibleOptimization("capacities cannot hold every service".into())),
        }
    }
}
