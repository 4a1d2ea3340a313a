//! Service displacement: evicting hosted services to make room on a target
//! cloud.
//!
//! An *option* is one hosted service `h` together with one of its own
//! candidate clouds `n` and the utility `h` loses by moving there,
//! `u(h, target) − u(h, n)`.  A *plan* is a set of options that frees at
//! least the missing memory, picks each service at most once, and fits every
//! receiving cloud's free capacity.  Its cost is the summed loss.

use rustc_hash::{FxHashMap, FxHashSet};

use mec_core::{CloudId, ServiceId};

use crate::candidates::CandidateSelector;
use crate::{PlacementContext, PlacementResult, UtilityFunction};

/// How the highest-utility policy treats full clouds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Displacement {
    /// Full clouds are not eligible.
    #[default]
    Disabled,
    /// Options sorted by loss per unit memory, taken while they fit.
    Greedy,
    /// Minimum-loss subset by enumeration; greedy above `max_options`
    /// (at most [`EXACT_OPTION_LIMIT`]).
    Exact { max_options: usize },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DisplacementOption {
    pub service: ServiceId,
    pub memory:  f64,
    pub to:      CloudId,
    pub loss:    f64,
}

/// Evictions needed to host a service on a target, and their summed loss.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementPlan {
    pub cost:  f64,
    pub moves: Vec<(ServiceId, CloudId)>,
}

impl DisplacementPlan {
    /// Nothing to evict.
    pub fn free() -> Self {
        Self { cost: 0.0, moves: Vec::new() }
    }

    /// No valid plan exists.
    pub fn infeasible() -> Self {
        Self { cost: f64::INFINITY, moves: Vec::new() }
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }
}

/// Every option for evicting services from `target`, excluding `incoming`.
/// Options with a non-finite loss are dropped.
pub fn displacement_options(
    ctx:      &PlacementContext<'_>,
    selector: &dyn CandidateSelector,
    utility:  UtilityFunction,
    target:   CloudId,
    incoming: ServiceId,
) -> PlacementResult<Vec<DisplacementOption>> {
    let mut options = Vec::new();
    for hosted in ctx.network.cloud(target)?.services() {
        if hosted == incoming {
            continue;
        }
        let service = ctx.population.get_service(hosted)?;
        let user_node = ctx.population.user_node(hosted)?;
        let here = utility.utility(ctx.network, service, user_node, target);
        for neighbor in selector.candidates(ctx.population, hosted)? {
            if neighbor == target {
                continue;
            }
            let loss = here - utility.utility(ctx.network, service, user_node, neighbor);
            if loss.is_finite() {
                options.push(DisplacementOption { service: hosted, memory: service.memory_requirement(), to: neighbor, loss });
            }
        }
    }
    Ok(options)
}

/// Greedy plan freeing at least `needed`.
///
/// Options are scanned in ascending `loss / memory`; each is taken if its
/// service is not chosen yet and it fits the receiving cloud's free capacity
/// minus what earlier picks reserved there.  The scan stops once enough is
/// freed.
pub fn greedy<F>(needed: f64, options: &[DisplacementOption], free_capacity: F) -> DisplacementPlan
where
    F: Fn(CloudId) -> f64,
{
    if needed <= 0.0 {
        return DisplacementPlan::free();
    }

    let mut sorted: Vec<&DisplacementOption> = options.iter().filter(|o| o.memory > 0.0).collect();
    sorted.sort_by(|a, b| (a.loss / a.memory).total_cmp(&(b.loss / b.memory)));

    let mut freed = 0.0;
    let mut cost = 0.0;
    let mut moves = Vec::new();
    let mut reserved: FxHashMap<CloudId, f64> = FxHashMap::default();
    let mut chosen: FxHashSet<ServiceId> = FxHashSet::default();

    for option in sorted {
        if chosen.contains(&option.service) {
            continue;
        }
        let already = reserved.get(&option.to).copied().unwrap_or(0.0);
        if free_capacity(option.to) < already + option.memory {
            continue;
        }
        reserved.insert(option.to, already + option.memory);
        chosen.insert(option.service);
        freed += option.memory;
        cost += option.loss;
        moves.push((option.service, option.to));
        if freed >= needed {
            return DisplacementPlan { cost, moves };
        }
    }
    DisplacementPlan::infeasible()
}

/// Hard ceiling on `Displacement::Exact { max_options }`: `2^20` subsets.
pub const EXACT_OPTION_LIMIT: usize = 20;

/// Minimum-loss plan freeing at least `needed`, by enumerating every subset
/// of `options`.  Falls back to [`greedy`] above `max_options` options, or
/// above [`EXACT_OPTION_LIMIT`] whatever `max_options` says.
pub fn exact<F>(needed: f64, options: &[DisplacementOption], free_capacity: F, max_options: usize) -> DisplacementPlan
where
    F: Fn(CloudId) -> f64,
{
    if needed <= 0.0 {
        return DisplacementPlan::free();
    }
    let limit = max_options.min(EXACT_OPTION_LIMIT);
    if options.len() > limit {
        log::warn!(
            "{} displacement options exceed the exact limit of {}, using greedy selection",
            options.len(),
            limit,
        );
        return greedy(needed, options, free_capacity);
    }

    let mut best: Option<(f64, u64)> = None;
    let mut reserved: FxHashMap<CloudId, f64> = FxHashMap::default();
    let mut chosen: FxHashSet<ServiceId> = FxHashSet::default();

    'subsets: for mask in 1u64..(1u64 << options.len()) {
        reserved.clear();
        chosen.clear();
        let mut freed = 0.0;
        let mut loss = 0.0;
        for (i, option) in options.iter().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            if !chosen.insert(option.service) {
                continue 'subsets;
            }
            freed += option.memory;
            loss += option.loss;
            *reserved.entry(option.to).or_insert(0.0) += option.memory;
        }
        if freed < needed {
            continue;
        }
        if reserved.iter().any(|(&cloud, &mem)| free_capacity(cloud) < mem) {
            continue;
        }
        if best.is_none_or(|(best_loss, _)| loss < best_loss) {
            best = Some((loss, mask));
        }
    }

    match best {
        Some((cost, mask)) => DisplacementPlan {
            cost,
            moves: options
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, o)| (o.service, o.to))
                .collect(),
        },
        None => DisplacementPlan::infeasible(),
    }
}
