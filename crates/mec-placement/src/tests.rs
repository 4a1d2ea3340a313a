//! Unit tests for mec-placement.

#[cfg(test)]
mod helpers {
    use mec_core::{CloudId, NodeId, ServiceId, Vec2};
    use mec_network::NetworkBuilder;
    use mec_resource::{CloudNetwork, CloudSpec, ConstantServiceModel, Population, ServiceSpec, StaticMovement};

    pub const CENTRAL: CloudId = CloudId(0);
    pub const CLOUD_A: CloudId = CloudId(1);
    pub const CLOUD_B: CloudId = CloudId(2);

    fn build(hub_cloud: impl Fn(NodeId) -> CloudSpec, capacity: f64) -> (CloudNetwork, [NodeId; 3]) {
        let mut b = NetworkBuilder::new();
        let a = b.add_base_station(Vec2::new(0.0, 0.0), 0.5).unwrap();
        let hub = b.add_node(Some(Vec2::new(1.0, 0.0)));
        let bs = b.add_base_station(Vec2::new(2.0, 0.0), 0.5).unwrap();
        b.add_link(a, hub, 1.0).unwrap();
        b.add_link(hub, bs, 1.0).unwrap();
        let specs = [hub_cloud(hub), CloudSpec::cloudlet(a, capacity), CloudSpec::cloudlet(bs, capacity)];
        (CloudNetwork::new(b.build(), &specs).unwrap(), [a, hub, bs])
    }

    /// Base stations A and B (access latency 0.5) linked through a hub that
    /// hosts the central cloud.  A and B host cloudlets of `capacity`.
    pub fn line(capacity: f64) -> (CloudNetwork, [NodeId; 3]) {
        build(CloudSpec::central, capacity)
    }

    /// Like [`line`], but the hub hosts a zero-capacity cloudlet and there is
    /// no central cloud.
    pub fn line_without_central(capacity: f64) -> (CloudNetwork, [NodeId; 3]) {
        build(|hub| CloudSpec::cloudlet(hub, 0.0), capacity)
    }

    /// Like [`line`], but the central cloud holds only `central_capacity`.
    pub fn line_with_central(central_capacity: f64, capacity: f64) -> (CloudNetwork, [NodeId; 3]) {
        build(|hub| CloudSpec { node: hub, capacity: central_capacity, central: true }, capacity)
    }

    pub fn empty_population() -> Population {
        Population::new(ConstantServiceModel::fixed(0, ServiceSpec::new(0.0, 0.0)))
    }

    pub fn spec(memory: f64) -> ServiceSpec {
        ServiceSpec::new(memory, 3.0)
    }

    /// New user owning one service, attached once at `node`.
    pub fn add_user(pop: &mut Population, spec: ServiceSpec, node: NodeId) -> ServiceId {
        let uid = pop.create_user_with(Box::new(StaticMovement(Vec2::ZERO)), &[spec]).unwrap();
        pop.user_mut(uid).unwrap().attach(node);
        pop.user(uid).unwrap().services()[0]
    }

    /// Reattach the owner of `sid`.
    pub fn attach(pop: &mut Population, sid: ServiceId, node: NodeId) {
        let uid = pop.get_service(sid).unwrap().owner();
        pop.user_mut(uid).unwrap().attach(node);
    }

    /// `CLOUD_A` (capacity 1) is held by a settled service whose user sits
    /// at B.  A second service, whose user just moved from B to A, waits on
    /// the central cloud.  Returns `[squatter, mover]`.
    pub fn squatter() -> (CloudNetwork, Population, [ServiceId; 2]) {
        let (mut net, [a, _, b]) = line(1.0);
        let mut pop = empty_population();
        let squatter = add_user(&mut pop, spec(1.0), b);
        attach(&mut pop, squatter, b);
        let mover = add_user(&mut pop, spec(1.0), b);
        attach(&mut pop, mover, a);
        pop.place_service(&mut net, squatter, CLOUD_A).unwrap();
        pop.place_service(&mut net, mover, CENTRAL).unwrap();
        (net, pop, [squatter, mover])
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod action {
    use mec_core::{CloudId, ServiceId};
    use crate::Action;

    #[test]
    fn towards_same_cloud_is_no_migration() {
        let s = ServiceId(3);
        assert_eq!(Action::towards(s, CloudId(1), CloudId(1)), Action::NoMigration { service: s, cloud: CloudId(1) });
        let m = Action::towards(s, CloudId(1), CloudId(2));
        assert!(m.is_migration());
        assert_eq!(m.resulting_cloud(), CloudId(2));
        assert_eq!(m.service(), s);
    }

    #[test]
    fn display_names_both_ends() {
        let m = Action::Migration { service: ServiceId(1), source: CloudId(0), target: CloudId(2) };
        assert_eq!(m.to_string(), "migrate ServiceId(1) CloudId(0) -> CloudId(2)");
    }
}

// ── Cost ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cost {
    use mec_core::ServiceId;
    use mec_resource::ServiceSpec;

    use super::helpers::*;
    use crate::{Action, Cost, CostKind, GlobalCostFunction, PerServiceAverageCost, ServiceCostFunction};

    #[test]
    fn placement_costs_per_kind() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, ServiceSpec::new(1.0, 3.0).with_priority(2.0), a);
        pop.place_service(&mut net, s, CLOUD_B).unwrap();

        // Two hops plus A's access latency.
        assert_eq!(CostKind::latency().static_cost(&net, &pop, s).unwrap(), 2.5);
        assert_eq!(CostKind::squared_latency().static_cost(&net, &pop, s).unwrap(), 6.25);
        assert_eq!(CostKind::priority_weighted_latency().static_cost(&net, &pop, s).unwrap(), 5.0);
        assert_eq!(CostKind::sla_violation().static_cost(&net, &pop, s).unwrap(), 0.0);
    }

    #[test]
    fn sla_violation_charges_priority_times_penalty() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, ServiceSpec::new(1.0, 2.0), a);
        pop.place_service(&mut net, s, CLOUD_B).unwrap();
        assert_eq!(CostKind::sla_violation().static_cost(&net, &pop, s).unwrap(), 10.0);
    }

    #[test]
    fn static_cost_at_moves_nothing() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, s, CLOUD_B).unwrap();

        assert_eq!(CostKind::latency().static_cost_at(&net, &pop, s, CLOUD_A).unwrap(), 0.5);
        assert_eq!(pop.get_service(s).unwrap().cloud(), Some(CLOUD_B));
        assert_eq!(net.cloud(CLOUD_A).unwrap().committed(), 0.0);
    }

    #[test]
    fn migrations_add_transition_cost() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, ServiceSpec::new(1.0, 3.0).with_priority(2.0), a);
        pop.place_service(&mut net, s, CLOUD_B).unwrap();

        let kind = CostKind::priority_weighted_latency();
        let moved = [Action::Migration { service: s, source: CLOUD_A, target: CLOUD_B }];
        let kept = [Action::NoMigration { service: s, cloud: CLOUD_B }];
        assert_eq!(kind.calculate_cost(&net, &pop, s, &moved).unwrap(), Cost::new(5.0, 5.0));
        assert_eq!(kind.calculate_cost(&net, &pop, s, &kept).unwrap(), Cost::new(5.0, 0.0));
    }

    #[test]
    fn migration_plus_latency_charges_current_latency() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, s, CLOUD_B).unwrap();

        let kind = CostKind::MigrationPlusLatency { migration_cost: 1.0 };
        let moved = [Action::Migration { service: s, source: CLOUD_A, target: CLOUD_B }];
        let cost = kind.calculate_cost(&net, &pop, s, &moved).unwrap();
        assert_eq!(cost, Cost::new(2.5, 3.5));
        assert_eq!(cost.total(), 6.0);
    }

    #[test]
    fn default_migration_costs() {
        let (net, _) = line(2.0);
        let pop = empty_population();
        let m = Action::Migration { service: ServiceId(0), source: CENTRAL, target: CLOUD_A };
        let transition = |kind: CostKind| kind.migration_transition_cost(&net, &pop, &m).unwrap();
        assert_eq!(transition(CostKind::latency()), 0.0);
        assert_eq!(transition(CostKind::squared_latency()), 5.0);
        assert_eq!(transition(CostKind::priority_weighted_latency()), 5.0);
        assert_eq!(transition(CostKind::sla_violation()), 5.0);
    }

    #[test]
    fn average_skips_unplaced_services() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s0 = add_user(&mut pop, spec(1.0), a);
        let s1 = add_user(&mut pop, spec(1.0), a);
        add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, s0, CLOUD_A).unwrap();
        pop.place_service(&mut net, s1, CENTRAL).unwrap();

        let global = PerServiceAverageCost::new(CostKind::Latency { factor: 1.0, migration_cost: 2.0 });
        let actions = [Action::Migration { service: s0, source: CENTRAL, target: CLOUD_A }];
        assert_eq!(global.global_cost(&net, &pop, &actions).unwrap(), Cost::new(1.0, 1.0));
    }

    #[test]
    fn average_of_empty_population_is_zero() {
        let (net, _) = line(2.0);
        let pop = empty_population();
        let global = PerServiceAverageCost::new(CostKind::default());
        assert_eq!(global.global_cost(&net, &pop, &[]).unwrap(), Cost::ZERO);
    }
}

// ── Candidates ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod candidates {
    use super::helpers::*;
    use crate::{CandidateSelector, KnnBaseStationSelector, KnnCloudSelector};

    #[test]
    fn base_station_neighborhood_ends_with_central() {
        let (net, [a, hub, b]) = line(2.0);
        let two = KnnBaseStationSelector::new(&net, 2);
        assert_eq!(two.neighborhood_of(a), &[CLOUD_A, CENTRAL]);
        assert_eq!(two.neighborhood_of(b), &[CLOUD_B, CENTRAL]);
        assert!(two.neighborhood_of(hub).is_empty());

        let three = KnnBaseStationSelector::new(&net, 3);
        assert_eq!(three.neighborhood_of(a), &[CLOUD_A, CLOUD_B, CENTRAL]);
        assert_eq!(three.num_candidates(), 3);
    }

    #[test]
    fn candidates_exclude_current_cloud() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, s, CLOUD_A).unwrap();

        let selector = KnnBaseStationSelector::new(&net, 3);
        assert_eq!(selector.neighborhood(&pop, s).unwrap(), &[CLOUD_A, CLOUD_B, CENTRAL]);
        assert_eq!(selector.candidates(&pop, s).unwrap(), vec![CLOUD_B, CENTRAL]);
    }

    #[test]
    fn cloud_neighborhood_excludes_itself() {
        let (mut net, [a, _, _]) = line(2.0);
        let selector = KnnCloudSelector::new(&net, 2);
        assert_eq!(selector.neighborhood_of(CLOUD_A), &[CLOUD_B, CENTRAL]);
        assert_eq!(selector.neighborhood_of(CLOUD_B), &[CLOUD_A, CENTRAL]);

        let central = selector.neighborhood_of(CENTRAL);
        assert_eq!(central.len(), 2);
        assert_eq!(central.last(), Some(&CENTRAL));

        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);
        assert!(selector.neighborhood(&pop, s).is_err(), "unplaced services have no hosting cloud");
        pop.place_service(&mut net, s, CLOUD_B).unwrap();
        assert_eq!(selector.candidates(&pop, s).unwrap(), vec![CLOUD_A, CENTRAL]);
    }
}

// ── Trigger ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trigger {
    use super::helpers::*;
    use crate::MigrationTrigger;

    #[test]
    fn base_station_changed_counts_first_attach() {
        let (mut net, [a, _, b]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, s, CLOUD_A).unwrap();

        let t = MigrationTrigger::BaseStationChanged;
        assert!(t.should_trigger(&net, &pop, s).unwrap());
        attach(&mut pop, s, a);
        assert!(!t.should_trigger(&net, &pop, s).unwrap());
        attach(&mut pop, s, b);
        assert!(t.should_trigger(&net, &pop, s).unwrap());
        assert!(MigrationTrigger::Always.should_trigger(&net, &pop, s).unwrap());
    }

    #[test]
    fn latency_changed_compares_graph_distance() {
        let (mut net, [a, _, b]) = line(2.0);
        let mut pop = empty_population();
        let on_a = add_user(&mut pop, spec(1.0), a);
        let on_central = add_user(&mut pop, spec(1.0), a);
        pop.place_service(&mut net, on_a, CLOUD_A).unwrap();
        pop.place_service(&mut net, on_central, CENTRAL).unwrap();

        let t = MigrationTrigger::LatencyChanged;
        // No previous attachment: previous distance counts as 0.
        assert!(!t.should_trigger(&net, &pop, on_a).unwrap());
        assert!(t.should_trigger(&net, &pop, on_central).unwrap());

        attach(&mut pop, on_a, b);
        attach(&mut pop, on_central, a);
        attach(&mut pop, on_central, b);
        assert!(t.should_trigger(&net, &pop, on_a).unwrap());
        // The hub is one hop from both base stations.
        assert!(!t.should_trigger(&net, &pop, on_central).unwrap());
    }
}

// ── Utility ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod utility {
    use mec_core::{CloudId, Vec2};
    use mec_network::NetworkBuilder;
    use mec_resource::{CloudNetwork, CloudSpec, ServiceSpec};

    use super::helpers::*;
    use crate::UtilityFunction;

    #[test]
    fn utilities_by_kind() {
        let (net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, ServiceSpec::new(1.0, 3.0).with_priority(2.0), a);
        let strict = add_user(&mut pop, ServiceSpec::new(1.0, 1.5).with_priority(2.0), a);
        let svc = pop.get_service(s).unwrap();
        let strict = pop.get_service(strict).unwrap();

        assert_eq!(UtilityFunction::PriorityWeightedLatency.utility(&net, svc, a, CENTRAL), -2.0);
        assert_eq!(UtilityFunction::PriorityWeightedLatency.utility(&net, svc, a, CLOUD_A), 0.0);
        assert_eq!(UtilityFunction::SquaredLatency.utility(&net, svc, a, CLOUD_B), -4.0);
        assert_eq!(UtilityFunction::PriorityWeightedSla.utility(&net, svc, a, CLOUD_B), 0.0);
        assert_eq!(UtilityFunction::PriorityWeightedSla.utility(&net, strict, a, CLOUD_B), -2.0);
        assert_eq!(UtilityFunction::default().utility(&net, svc, a, CloudId(9)), f64::NEG_INFINITY);
    }

    #[test]
    fn unreachable_cloud_is_negative_infinity() {
        let mut b = NetworkBuilder::new();
        let x = b.add_base_station(Vec2::new(0.0, 0.0), 0.0).unwrap();
        let island = b.add_node(Some(Vec2::new(5.0, 0.0)));
        let net = CloudNetwork::new(b.build(), &[CloudSpec::central(x), CloudSpec::cloudlet(island, 1.0)]).unwrap();

        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), x);
        let svc = pop.get_service(s).unwrap();
        assert_eq!(UtilityFunction::SquaredLatency.utility(&net, svc, x, CloudId(1)), f64::NEG_INFINITY);
        assert_eq!(UtilityFunction::SquaredLatency.utility(&net, svc, x, CloudId(0)), 0.0);
    }
}

// ── Displacement ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod displacement {
    use mec_core::{CloudId, ServiceId};

    use super::helpers::*;
    use crate::displacement::{displacement_options, exact, greedy, EXACT_OPTION_LIMIT};
    use crate::{DisplacementOption, DisplacementPlan, KnnBaseStationSelector, PlacementContext, UtilityFunction};

    fn option(service: u32, memory: f64, to: u32, loss: f64) -> DisplacementOption {
        DisplacementOption { service: ServiceId(service), memory, to: CloudId(to), loss }
    }

    fn roomy(_: CloudId) -> f64 {
        10.0
    }

    #[test]
    fn nothing_needed_is_free() {
        assert_eq!(greedy(0.0, &[], roomy), DisplacementPlan::free());
        assert_eq!(exact(-1.0, &[], roomy, 8), DisplacementPlan::free());
    }

    #[test]
    fn greedy_prefers_low_loss_per_memory() {
        let options = [option(0, 1.0, 5, 2.0), option(1, 2.0, 5, 1.0)];
        let plan = greedy(1.5, &options, roomy);
        assert_eq!(plan.cost, 1.0);
        assert_eq!(plan.moves, vec![(ServiceId(1), CloudId(5))]);
    }

    #[test]
    fn greedy_respects_receiving_capacity() {
        let options = [option(0, 1.0, 6, 1.0), option(1, 2.0, 5, 1.0), option(2, 1.0, 6, 3.0)];
        let free = |c: CloudId| if c == CloudId(5) { 1.0 } else { 10.0 };
        let plan = greedy(1.5, &options, free);
        assert_eq!(plan.cost, 4.0);
        assert_eq!(plan.moves, vec![(ServiceId(0), CloudId(6)), (ServiceId(2), CloudId(6))]);
    }

    #[test]
    fn one_option_per_service() {
        let options = [option(0, 1.0, 5, 1.0), option(0, 1.0, 6, 1.0)];
        assert!(!greedy(2.0, &options, roomy).is_feasible());
        assert!(!exact(2.0, &options, roomy, 8).is_feasible());
    }

    #[test]
    fn exact_beats_greedy() {
        let options = [option(0, 1.0, 5, 0.5), option(1, 2.0, 5, 1.2), option(2, 1.0, 5, 2.0)];
        let g = greedy(2.0, &options, roomy);
        assert!((g.cost - 1.7).abs() < 1e-12);

        let e = exact(2.0, &options, roomy, 8);
        assert_eq!(e.cost, 1.2);
        assert_eq!(e.moves, vec![(ServiceId(1), CloudId(5))]);
    }

    #[test]
    fn exact_falls_back_to_greedy_above_limit() {
        let options = [option(0, 1.0, 5, 0.5), option(1, 2.0, 5, 1.2), option(2, 1.0, 5, 2.0)];
        assert_eq!(exact(2.0, &options, roomy, 2), greedy(2.0, &options, roomy));
    }

    #[test]
    fn exact_limit_caps_large_max_options() {
        let mut options = vec![option(0, 1.0, 5, 0.5), option(1, 2.0, 5, 1.2), option(2, 1.0, 5, 2.0)];
        options.extend((3..=EXACT_OPTION_LIMIT as u32).map(|s| option(s, 0.1, 7, 100.0)));
        assert_eq!(options.len(), EXACT_OPTION_LIMIT + 1);

        let plan = exact(2.0, &options, roomy, 1000);
        assert!((plan.cost - 1.7).abs() < 1e-12, "greedy plan expected, got {plan:?}");
        assert_eq!(plan, greedy(2.0, &options, roomy));

        // Within the limit the search is still exact.
        assert_eq!(exact(2.0, &options[..3], roomy, 1000).cost, 1.2);
    }

    #[test]
    fn options_list_every_neighbor_of_every_hosted_service() {
        let (net, pop, [squatter, mover]) = squatter();
        let ctx = PlacementContext::new(&net, &pop);
        let selector = KnnBaseStationSelector::new(&net, 3);

        let options = displacement_options(&ctx, &selector, UtilityFunction::default(), CLOUD_A, mover).unwrap();
        assert_eq!(options.len(), 2);
        assert!(options.contains(&DisplacementOption { service: squatter, memory: 1.0, to: CLOUD_B, loss: -2.0 }));
        assert!(options.contains(&DisplacementOption { service: squatter, memory: 1.0, to: CENTRAL, loss: -1.0 }));

        let none = displacement_options(&ctx, &selector, UtilityFunction::default(), CLOUD_A, squatter).unwrap();
        assert!(none.is_empty());
    }
}

// ── Policies ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod policy {
    use super::helpers::*;
    use crate::{
        Action, Displacement, DistanceMeasure, MigrationAlgorithm, PlacementContext, RewardTally, UtilityFunction,
    };

    fn highest_utility(displacement: Displacement) -> MigrationAlgorithm {
        MigrationAlgorithm::HighestUtility {
            neighborhood: 3,
            utility: UtilityFunction::PriorityWeightedLatency,
            displacement,
        }
    }

    #[test]
    fn one_instance_per_cloud() {
        let (net, _) = line(2.0);
        assert_eq!(MigrationAlgorithm::Never.create_instances(&net).len(), net.cloud_count());
        assert_eq!(highest_utility(Displacement::Greedy).name(), "highest-utility");
    }

    #[test]
    fn never_keeps_the_service() {
        let (net, pop, [_, mover]) = squatter();
        let ctx = PlacementContext::new(&net, &pop);
        let mut inst = MigrationAlgorithm::Never.create_instance(CENTRAL, &net);
        assert_eq!(
            inst.process_migration_event(&ctx, mover).unwrap(),
            vec![Action::NoMigration { service: mover, cloud: CENTRAL }]
        );
    }

    #[test]
    fn always_moves_to_nearest_cloud() {
        let (net, pop, [_, mover]) = squatter();
        let ctx = PlacementContext::new(&net, &pop);

        let mut any = MigrationAlgorithm::Always { only_available: false }.create_instance(CENTRAL, &net);
        assert_eq!(
            any.process_migration_event(&ctx, mover).unwrap(),
            vec![Action::Migration { service: mover, source: CENTRAL, target: CLOUD_A }]
        );

        // CLOUD_A is full; the current cloud is the next nearest.
        let mut available = MigrationAlgorithm::Always { only_available: true }.create_instance(CENTRAL, &net);
        assert_eq!(
            available.process_migration_event(&ctx, mover).unwrap(),
            vec![Action::NoMigration { service: mover, cloud: CENTRAL }]
        );
    }

    #[test]
    fn closest_in_neighborhood() {
        let (net, pop, [_, mover]) = squatter();
        let ctx = PlacementContext::new(&net, &pop);
        let closest = |only_available, metric, furthest| MigrationAlgorithm::ClosestInNeighborhood {
            neighborhood: 3,
            only_available,
            metric,
            furthest,
        };

        let mut inst = closest(false, DistanceMeasure::Euclidean, false).create_instance(CENTRAL, &net);
        assert_eq!(inst.process_migration_event(&ctx, mover).unwrap()[0].resulting_cloud(), CLOUD_A);

        let mut inst = closest(false, DistanceMeasure::Hops, false).create_instance(CENTRAL, &net);
        assert_eq!(inst.process_migration_event(&ctx, mover).unwrap()[0].resulting_cloud(), CLOUD_A);

        let mut inst = closest(true, DistanceMeasure::Euclidean, false).create_instance(CENTRAL, &net);
        assert_eq!(
            inst.process_migration_event(&ctx, mover).unwrap(),
            vec![Action::NoMigration { service: mover, cloud: CENTRAL }]
        );

        let mut inst = closest(false, DistanceMeasure::Euclidean, true).create_instance(CENTRAL, &net);
        assert_eq!(inst.process_migration_event(&ctx, mover).unwrap()[0].resulting_cloud(), CLOUD_B);
    }

    #[test]
    fn highest_utility_displaces_squatter() {
        for displacement in [Displacement::Greedy, Displacement::Exact { max_options: 8 }] {
            let (mut net, mut pop, [squatter, mover]) = squatter();
            let actions = {
                let ctx = PlacementContext::new(&net, &pop);
                let mut inst = highest_utility(displacement).create_instance(CENTRAL, &net);
                inst.process_migration_event(&ctx, mover).unwrap()
            };
            assert_eq!(
                actions,
                vec![
                    Action::Migration { service: squatter, source: CLOUD_A, target: CLOUD_B },
                    Action::Migration { service: mover, source: CENTRAL, target: CLOUD_A },
                ],
                "{displacement:?}"
            );

            for action in &actions {
                pop.place_service(&mut net, action.service(), action.resulting_cloud()).unwrap();
            }
            net.check_invariants(&pop).unwrap();
            assert!(net.cloud(CLOUD_A).unwrap().hosts(mover));
        }
    }

    #[test]
    fn highest_utility_without_displacement_stays() {
        let (net, pop, [_, mover]) = squatter();
        let ctx = PlacementContext::new(&net, &pop);
        let mut inst = highest_utility(Displacement::Disabled).create_instance(CENTRAL, &net);
        assert_eq!(
            inst.process_migration_event(&ctx, mover).unwrap(),
            vec![Action::NoMigration { service: mover, cloud: CENTRAL }]
        );
    }

    #[test]
    fn reward_windows_close_every_hundred() {
        let mut tally = RewardTally::default();
        assert_eq!(tally.mean(), None);
        for i in 0..(RewardTally::WINDOW + 10) {
            tally.record(if i < RewardTally::WINDOW { -1.0 } else { -3.0 });
        }
        assert_eq!(tally.count(), 110);
        assert_eq!(tally.window_means(), &[-1.0]);
        assert_eq!(tally.sum(), -130.0);
    }
}

// ── Optimizer ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod optimizer {
    use crate::{AssignmentProblem, BranchAndBoundOptimizer, Optimizer, PlacementError};

    fn problem(capacities: &[f64], memories: &[f64], candidates: &[&[(usize, f64)]]) -> AssignmentProblem {
        AssignmentProblem {
            capacities: capacities.to_vec(),
            memories:   memories.to_vec(),
            candidates: candidates.iter().map(|c| c.to_vec()).collect(),
        }
    }

    #[test]
    fn finds_the_cheapest_feasible_assignment() {
        let p = problem(&[1.0, 10.0], &[1.0, 1.0], &[&[(0, 1.0), (1, 5.0)], &[(0, 2.0), (1, 3.0)]]);
        let a = BranchAndBoundOptimizer::default().solve(&p).unwrap();
        assert_eq!(a.choice, vec![0, 1]);
        assert_eq!(a.cost, 4.0);
    }

    #[test]
    fn no_services_costs_nothing() {
        let a = BranchAndBoundOptimizer::default().solve(&problem(&[1.0], &[], &[])).unwrap();
        assert!(a.choice.is_empty());
        assert_eq!(a.cost, 0.0);
    }

    #[test]
    fn infeasible_when_capacity_runs_out() {
        let p = problem(&[1.0], &[1.0, 1.0], &[&[(0, 1.0)], &[(0, 1.0)]]);
        let err = BranchAndBoundOptimizer::default().solve(&p).unwrap_err();
        assert!(matches!(err, PlacementError::InfeasibleOptimization(_)));

        let no_candidates = problem(&[1.0], &[1.0], &[&[]]);
        let err = BranchAndBoundOptimizer::default().solve(&no_candidates).unwrap_err();
        assert!(matches!(err, PlacementError::InfeasibleOptimization(_)));
    }

    #[test]
    fn node_limit_without_incumbent() {
        let p = problem(&[10.0], &[1.0, 1.0], &[&[(0, 1.0)], &[(0, 1.0)]]);
        let err = BranchAndBoundOptimizer::new(1).solve(&p).unwrap_err();
        assert_eq!(err, PlacementError::NodeLimitExceeded(1));
    }

    #[test]
    fn mismatched_candidate_lists_are_rejected() {
        let p = problem(&[1.0], &[1.0, 1.0], &[&[(0, 1.0)]]);
        assert!(matches!(
            BranchAndBoundOptimizer::default().solve(&p),
            Err(PlacementError::InvalidParameter(_))
        ));
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod strategy {
    use mec_core::ServiceId;
    use mec_resource::{CloudNetwork, Population};

    use super::helpers::*;
    use crate::{
        Action, BranchAndBoundOptimizer, CostKind, Displacement, IndependentStrategy, InitialPlacement,
        InstanceFactory, KnnBaseStationSelector, MigrationAlgorithm, MigrationInstance, MyopicOptimalStrategy,
        PlacementContext, PlacementResult, PlacementStrategy, StaticGreedyStrategy, UtilityFunction,
    };

    /// Every instance returns the same fixed decision.
    struct Scripted(Vec<Action>);

    struct ScriptedInstance(Vec<Action>);

    impl InstanceFactory for Scripted {
        fn create_instance(&self, _: mec_core::CloudId, _: &CloudNetwork) -> Box<dyn MigrationInstance> {
            Box::new(ScriptedInstance(self.0.clone()))
        }
    }

    impl MigrationInstance for ScriptedInstance {
        fn process_migration_event(&mut self, _: &PlacementContext<'_>, _: ServiceId) -> PlacementResult<Vec<Action>> {
            Ok(self.0.clone())
        }
    }

    fn scripted(net: &CloudNetwork, decision: Vec<Action>) -> IndependentStrategy {
        let algorithm = MigrationAlgorithm::Custom(std::sync::Arc::new(Scripted(decision)));
        IndependentStrategy::new(net, algorithm, CostKind::latency())
    }

    fn cloud_of(pop: &Population, sid: ServiceId) -> Option<mec_core::CloudId> {
        pop.get_service(sid).unwrap().cloud()
    }

    // ── Independent ───────────────────────────────────────────────────────

    #[test]
    fn new_service_is_placed_then_evaluated() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);

        let mut strategy =
            IndependentStrategy::new(&net, MigrationAlgorithm::Always { only_available: true }, CostKind::latency());
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::InitialPlacement { service: s, cloud: CENTRAL },
                Action::Migration { service: s, source: CENTRAL, target: CLOUD_A },
            ]
        );
        assert_eq!(strategy.num_migrations(), 1);

        // Same base station again: the trigger stays quiet.
        attach(&mut pop, s, a);
        assert!(strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap().is_empty());
        net.check_invariants(&pop).unwrap();
    }

    #[test]
    fn closest_available_initial_placement() {
        let (mut net, [a, _, _]) = line(2.0);
        let mut pop = empty_population();
        let s = add_user(&mut pop, spec(1.0), a);

        let mut strategy =
            IndependentStrategy::new(&net, MigrationAlgorithm::Always { only_available: true }, CostKind::latency())
                .with_initial_placement(InitialPlacement::ClosestAvailableCloud);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::InitialPlacement { service: s, cloud: CLOUD_A },
                Action::NoMigration { service: s, cloud: CLOUD_A },
            ]
        );
        assert_eq!(strategy.num_no_migrations(), 1);
    }

    #[test]
    fn independent_applies_displacement_and_rewards_the_deciding_cloud() {
        let (mut net, mut pop, [squatter, mover]) = squatter();
        let algorithm = MigrationAlgorithm::HighestUtility {
            neighborhood: 3,
            utility: UtilityFunction::PriorityWeightedLatency,
            displacement: Displacement::Greedy,
        };
        let mut strategy = IndependentStrategy::new(&net, algorithm, CostKind::latency());

        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(cloud_of(&pop, squatter), Some(CLOUD_B));
        assert_eq!(cloud_of(&pop, mover), Some(CLOUD_A));
        assert_eq!(strategy.num_migrations(), 2);
        net.check_invariants(&pop).unwrap();

        let (_, tally) = strategy.reward_tallies().find(|(c, _)| *c == CENTRAL).unwrap();
        assert_eq!(tally.count(), 1);
        assert_eq!(tally.sum(), -0.5);
    }

    #[test]
    fn malformed_decisions_degrade_to_no_migration() {
        let (_, _, [sq, mv]) = squatter();
        let decisions = [
            vec![],
            vec![Action::Migration { service: mv, source: CENTRAL, target: CLOUD_A }],
            vec![Action::Migration { service: sq, source: CLOUD_A, target: CLOUD_B }],
            vec![Action::Migration { service: mv, source: CLOUD_B, target: CLOUD_A }],
            vec![Action::NoMigration { service: mv, cloud: CLOUD_B }],
        ];
        for decision in decisions {
            let (mut net, mut pop, _) = squatter();
            let mut strategy = scripted(&net, decision.clone());
            let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();

            assert_eq!(actions, vec![Action::NoMigration { service: mv, cloud: CENTRAL }], "{decision:?}");
            assert_eq!(strategy.num_degraded(), 1);
            assert_eq!(cloud_of(&pop, sq), Some(CLOUD_A));
            assert_eq!(cloud_of(&pop, mv), Some(CENTRAL));
            net.check_invariants(&pop).unwrap();
        }
    }

    #[test]
    fn well_formed_custom_decision_is_applied() {
        let (mut net, mut pop, [squatter, mover]) = squatter();
        let decision = vec![
            Action::Migration { service: squatter, source: CLOUD_A, target: CENTRAL },
            Action::Migration { service: mover, source: CENTRAL, target: CLOUD_A },
        ];
        let mut strategy = scripted(&net, decision.clone());
        assert_eq!(strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap(), decision);
        assert_eq!(strategy.num_degraded(), 0);
        assert_eq!(cloud_of(&pop, squatter), Some(CENTRAL));
        net.check_invariants(&pop).unwrap();
    }

    #[test]
    fn full_central_cloud_leaves_new_service_unplaced() {
        let (mut net, [a, _, _]) = line_with_central(1.0, 1.0);
        let mut pop = empty_population();
        let s = [add_user(&mut pop, spec(1.0), a), add_user(&mut pop, spec(1.0), a)];

        let mut strategy = IndependentStrategy::new(&net, MigrationAlgorithm::Never, CostKind::latency());
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(actions.len(), 2);
        let placed = actions[0].service();
        assert_eq!(actions[0], Action::InitialPlacement { service: placed, cloud: CENTRAL });
        assert_eq!(s.iter().filter(|&&sid| cloud_of(&pop, sid).is_none()).count(), 1);
        assert_eq!(strategy.unplaceable(), 1);
        net.check_invariants(&pop).unwrap();

        // Retried, and rejected again, on the next step.
        for &sid in &s {
            attach(&mut pop, sid, a);
        }
        assert!(strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap().is_empty());
        assert_eq!(strategy.unplaceable(), 2);
        assert_eq!(cloud_of(&pop, placed), Some(CENTRAL));
    }

    // ── Static greedy ─────────────────────────────────────────────────────

    #[test]
    fn static_greedy_fills_nearest_clouds_once() {
        let (mut net, [a, _, _]) = line(1.0);
        let mut pop = empty_population();
        let s: Vec<ServiceId> = (0..3).map(|_| add_user(&mut pop, spec(1.0), a)).collect();

        let mut strategy = StaticGreedyStrategy::new();
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::InitialPlacement { service: s[0], cloud: CLOUD_A },
                Action::InitialPlacement { service: s[1], cloud: CENTRAL },
                Action::InitialPlacement { service: s[2], cloud: CENTRAL },
            ]
        );
        assert!(strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap().is_empty());
    }

    #[test]
    fn static_greedy_leaves_unplaceable_services() {
        let (mut net, [a, _, _]) = line_without_central(1.0);
        let mut pop = empty_population();
        let s: Vec<ServiceId> = (0..3).map(|_| add_user(&mut pop, spec(1.0), a)).collect();

        let mut strategy = StaticGreedyStrategy::new();
        strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(cloud_of(&pop, s[0]), Some(CLOUD_A));
        assert_eq!(cloud_of(&pop, s[1]), Some(CLOUD_B));
        assert_eq!(cloud_of(&pop, s[2]), None);
        assert_eq!(strategy.unplaceable(), 1);
    }

    // ── Myopic optimal ────────────────────────────────────────────────────

    fn myopic(interval: u64) -> MyopicOptimalStrategy<BranchAndBoundOptimizer> {
        MyopicOptimalStrategy::new(BranchAndBoundOptimizer::default(), CostKind::latency(), interval)
    }

    #[test]
    fn myopic_places_everything_optimally() {
        let (mut net, [a, _, b]) = line(1.0);
        let mut pop = empty_population();
        let s0 = add_user(&mut pop, spec(1.0), a);
        let s1 = add_user(&mut pop, spec(1.0), a);
        let s2 = add_user(&mut pop, spec(1.0), b);

        let mut strategy = myopic(1);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(actions.len(), 3);
        assert!(actions.iter().all(|a| matches!(a, Action::InitialPlacement { .. })));

        let on_a = net.cloud(CLOUD_A).unwrap();
        assert_eq!(on_a.service_count(), 1);
        assert!(on_a.hosts(s0) || on_a.hosts(s1));
        assert_eq!(cloud_of(&pop, s2), Some(CLOUD_B));
        net.check_invariants(&pop).unwrap();

        assert!(strategy.mean_computation_time().is_some());
        let comm = strategy.mean_communication_time().unwrap();
        assert!((comm - 0.002).abs() < 1e-12);

        // s2's user follows the others to A; B is no longer worth holding.
        attach(&mut pop, s2, a);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        let moved = actions.iter().find(|a| a.service() == s2).unwrap();
        assert!(matches!(moved, Action::Migration { source, .. } if *source == CLOUD_B));
        assert_eq!(net.cloud(CLOUD_B).unwrap().service_count(), 0);
        assert_eq!(net.cloud(CLOUD_A).unwrap().service_count(), 1);
        net.check_invariants(&pop).unwrap();
    }

    #[test]
    fn myopic_between_solves_sends_new_services_to_central() {
        let (mut net, [a, _, b]) = line(1.0);
        let mut pop = empty_population();
        add_user(&mut pop, spec(1.0), a);

        let mut strategy = myopic(3);
        strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();

        let late = add_user(&mut pop, spec(1.0), b);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(actions, vec![Action::InitialPlacement { service: late, cloud: CENTRAL }]);
    }

    #[test]
    fn myopic_between_solves_tolerates_full_central() {
        let (mut net, [a, _, _]) = line_with_central(1.0, 1.0);
        let mut pop = empty_population();

        let mut strategy = myopic(5);
        assert!(strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap().is_empty());

        let first = add_user(&mut pop, spec(1.0), a);
        let second = add_user(&mut pop, spec(1.0), a);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(actions, vec![Action::InitialPlacement { service: first, cloud: CENTRAL }]);
        assert_eq!(cloud_of(&pop, second), None);
        assert_eq!(strategy.unplaceable(), 1);
        net.check_invariants(&pop).unwrap();
    }

    #[test]
    fn myopic_with_neighborhood_matches_full_search() {
        let (mut net, [a, _, b]) = line(1.0);
        let mut pop = empty_population();
        let s0 = add_user(&mut pop, spec(1.0), a);
        let s1 = add_user(&mut pop, spec(1.0), b);

        let selector = KnnBaseStationSelector::new(&net, 2);
        let mut strategy = myopic(1).with_selector(selector);
        strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert_eq!(cloud_of(&pop, s0), Some(CLOUD_A));
        assert_eq!(cloud_of(&pop, s1), Some(CLOUD_B));
    }

    #[test]
    fn myopic_counts_infeasible_solves() {
        let (mut net, [a, _, _]) = line_without_central(1.0);
        let mut pop = empty_population();
        let s: Vec<ServiceId> = (0..3).map(|_| add_user(&mut pop, spec(1.0), a)).collect();

        let mut strategy = myopic(1);
        let actions = strategy.update_service_placements(&mut net, &mut pop, 1.0).unwrap();
        assert!(actions.is_empty());
        assert_eq!(strategy.infeasible_solves(), 1);
        assert!(s.iter().all(|&sid| cloud_of(&pop, sid).is_none()));
    }
}
