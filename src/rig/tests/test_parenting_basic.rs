//! Tests for distance-threshold parenting and the coverage read-out.

use crate::geom::Point3;
use crate::rig::{
    ArmatureSnapshot, BonePoint, ParentingOptions, ParentingResult, RigError, RoleFilter,
    apply_parenting, children_coverage, match_parents, partition_roles,
};

fn bone(label: &str, x: f64, y: f64, z: f64) -> BonePoint {
    BonePoint::new(label, Point3::new(x, y, z))
}

// ============================================================================
// First-fit matching
// ============================================================================

#[test]
fn test_child_goes_to_first_parent_not_nearest() {
    let parents = [bone("HP_far", 0.9, 0.0, 0.0), bone("HP_near", 0.1, 0.0, 0.0)];
    let children = [bone("P_a", 0.0, 0.0, 0.0)];

    let result = match_parents(&parents, &children, &ParentingOptions::new(1.0)).expect("match");

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.parent_of("P_a"), Some("HP_far"));
}

#[test]
fn test_parent_takes_first_child_in_range_not_nearest() {
    let parents = [bone("HP_a", 0.0, 0.0, 0.0)];
    let children = [bone("P_far", 0.8, 0.0, 0.0), bone("P_near", 0.1, 0.0, 0.0)];

    let result = match_parents(&parents, &children, &ParentingOptions::new(1.0)).expect("match");

    assert_eq!(result.parent_of("P_far"), Some("HP_a"));
    assert_eq!(result.parent_of("P_near"), None);
    assert_eq!(result.diagnostics.unmatched_children, vec!["P_near"]);
}

#[test]
fn test_each_parent_claims_at_most_one_child() {
    let parents = [bone("HP_a", 0.0, 0.0, 0.0), bone("HP_b", 0.0, 0.0, 0.0)];
    let children = [
        bone("P_1", 0.1, 0.0, 0.0),
        bone("P_2", 0.2, 0.0, 0.0),
        bone("P_3", 0.3, 0.0, 0.0),
    ];

    let result = match_parents(&parents, &children, &ParentingOptions::new(1.0)).expect("match");

    assert_eq!(result.parent_of("P_1"), Some("HP_a"));
    assert_eq!(result.parent_of("P_2"), Some("HP_b"));
    assert_eq!(result.parent_of("P_3"), None);
    assert_eq!(result.diagnostics.assigned, 2);
}

#[test]
fn test_threshold_is_inclusive_and_respected() {
    let parents = [bone("HP_a", 0.0, 0.0, 0.0)];
    let children = [bone("P_edge", 0.0, 2.0, 0.0), bone("P_out", 0.0, 0.0, 2.5)];

    let result = match_parents(&parents, &children, &ParentingOptions::new(2.0)).expect("match");

    assert_eq!(result.parent_of("P_edge"), Some("HP_a"));
    for assignment in &result.assignments {
        assert!(assignment.distance <= 2.0);
    }
}

#[test]
fn test_already_parented_children_are_skipped() {
    let parents = [bone("HP_a", 0.0, 0.0, 0.0)];
    let children = [
        bone("P_taken", 0.0, 0.0, 0.0).with_parent("root"),
        bone("P_free", 0.5, 0.0, 0.0),
    ];

    let result = match_parents(&parents, &children, &ParentingOptions::new(1.0)).expect("match");

    assert_eq!(result.parent_of("P_taken"), None);
    assert_eq!(result.parent_of("P_free"), Some("HP_a"));
    assert_eq!(result.diagnostics.children_considered, 1);
}

#[test]
fn test_no_child_in_range_makes_no_assignment() {
    let parents = [bone("HP_a", 0.0, 0.0, 0.0)];
    let children = [bone("P_a", 10.0, 0.0, 0.0)];

    let result = match_parents(&parents, &children, &ParentingOptions::new(1.0)).expect("match");

    assert!(result.assignments.is_empty());
    assert!(result.intermediates.is_empty());
}

// ============================================================================
// Intermediate nodes
// ============================================================================

#[test]
fn test_intermediate_is_inserted_between_parent_and_child() {
    let parents = [bone("HP_gun", 0.0, 0.0, 0.0).with_tail(Point3::new(0.0, 0.0, 1.0))];
    let children = [bone("P_barrel", 0.2, 0.0, 0.0)];
    let options = ParentingOptions::new(1.0).with_intermediate("_DMG");

    let result = match_parents(&parents, &children, &options).expect("match");

    assert_eq!(result.intermediates.len(), 1);
    let node = &result.intermediates[0];
    assert_eq!(node.label, "HP_gun_DMG");
    assert_eq!(node.parent, "HP_gun");
    assert_eq!(node.tail, Point3::new(0.0, 0.0, 1.0));
    assert_eq!(result.parent_of("P_barrel"), Some("HP_gun_DMG"));
}

#[test]
fn test_apply_parenting_updates_snapshot() {
    let mut snapshot = ArmatureSnapshot::new(vec![
        bone("HP_gun", 0.0, 0.0, 0.0),
        bone("P_barrel", 0.2, 0.0, 0.0),
        bone("P_far", 9.0, 0.0, 0.0),
    ]);
    let filter = RoleFilter::default();
    let (parents, children) = partition_roles(&snapshot.bones, &filter);
    let options = ParentingOptions::new(1.0).with_intermediate(filter.intermediate_suffix.clone());
    let result = match_parents(&parents, &children, &options).expect("match");

    apply_parenting(&mut snapshot, &result).expect("apply");

    assert_eq!(snapshot.len(), 4);
    let container = snapshot.get("HP_gun_DMG").expect("container bone");
    assert_eq!(container.parent.as_deref(), Some("HP_gun"));
    assert_eq!(
        snapshot.get("P_barrel").and_then(|b| b.parent.as_deref()),
        Some("HP_gun_DMG")
    );
    assert!(snapshot.get("P_far").is_some_and(|b| !b.has_parent()));
}

// ============================================================================
// Roles and coverage
// ============================================================================

#[test]
fn test_partition_by_prefix() {
    let bones = [
        bone("HP_a", 0.0, 0.0, 0.0),
        bone("P_a", 0.0, 0.0, 0.0),
        bone("root", 0.0, 0.0, 0.0),
    ];
    let (parents, children) = partition_roles(&bones, &RoleFilter::default());

    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].label, "HP_a");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].label, "P_a");
}

#[test]
fn test_coverage_counts_reachable_unparented_children() {
    let bones = [
        bone("HP_a", 0.0, 0.0, 0.0),
        bone("HP_a_DMG", 50.0, 0.0, 0.0),
        bone("P_near", 0.5, 0.0, 0.0),
        bone("P_by_container_only", 50.0, 0.0, 0.0),
        bone("P_done", 0.0, 0.0, 0.0).with_parent("HP_a"),
    ];

    let report = children_coverage(&bones, &RoleFilter::default(), 1.0);

    assert_eq!(report.children, 3);
    assert_eq!(report.parented, 1);
    assert_eq!(report.unparented(), 2);
    assert_eq!(report.reachable, 1);
    assert_eq!(report.to_string(), "50% (1/2)");
}

#[test]
fn test_intermediates_are_not_parent_candidates() {
    let bones = [
        bone("HP_a", 0.0, 0.0, 0.0),
        bone("HP_a_DMG", 0.0, 0.0, 0.0).with_parent("HP_a"),
        bone("P_a", 0.0, 0.0, 0.0),
    ];
    let (parents, _) = partition_roles(&bones, &RoleFilter::default());

    let labels: Vec<&str> = parents.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["HP_a"]);
}

// ============================================================================
// Repeated passes
// ============================================================================

fn parent_pass(snapshot: &mut ArmatureSnapshot, threshold: f64) -> ParentingResult {
    let filter = RoleFilter::default();
    let (parents, children) = partition_roles(&snapshot.bones, &filter);
    let options = ParentingOptions::new(threshold)
        .with_intermediate(filter.intermediate_suffix.clone())
        .with_reserved_labels(snapshot.bones.iter().map(|b| b.label.clone()));
    let result = match_parents(&parents, &children, &options).expect("match");
    apply_parenting(snapshot, &result).expect("apply");
    result
}

#[test]
fn test_second_pass_numbers_new_intermediates() {
    let mut snapshot = ArmatureSnapshot::new(vec![
        bone("HP_a", 0.0, 0.0, 0.0),
        bone("HP_b", 5.0, 0.0, 0.0),
        bone("P_1", 0.2, 0.0, 0.0),
    ]);
    let first = parent_pass(&mut snapshot, 1.0);
    assert_eq!(first.parent_of("P_1"), Some("HP_a_DMG"));

    snapshot.bones.push(bone("P_2", 0.3, 0.0, 0.0));
    snapshot.bones.push(bone("P_3", 5.2, 0.0, 0.0));
    let second = parent_pass(&mut snapshot, 1.0);

    assert_eq!(second.parent_of("P_2"), Some("HP_a_DMG.001"));
    assert_eq!(second.parent_of("P_3"), Some("HP_b_DMG"));
    assert!(snapshot.validate().is_ok());
    assert_eq!(
        snapshot.get("HP_a_DMG.001").and_then(|b| b.parent.as_deref()),
        Some("HP_a")
    );
    assert_eq!(
        snapshot.get("P_1").and_then(|b| b.parent.as_deref()),
        Some("HP_a_DMG")
    );
}

#[test]
fn test_failed_apply_leaves_snapshot_unchanged() {
    let mut snapshot = ArmatureSnapshot::new(vec![
        bone("HP_a", 0.0, 0.0, 0.0),
        bone("HP_b", 5.0, 0.0, 0.0),
        bone("HP_b_DMG", 5.0, 0.0, 0.0),
        bone("P_1", 0.1, 0.0, 0.0),
        bone("P_2", 5.1, 0.0, 0.0),
    ]);
    let before = snapshot.clone();
    let parents = [bone("HP_a", 0.0, 0.0, 0.0), bone("HP_b", 5.0, 0.0, 0.0)];
    let children = [bone("P_1", 0.1, 0.0, 0.0), bone("P_2", 5.1, 0.0, 0.0)];
    // Matched without knowing the armature, so `HP_b_DMG` clashes.
    let options = ParentingOptions::new(1.0).with_intermediate("_DMG");
    let result = match_parents(&parents, &children, &options).expect("match");
    assert_eq!(result.intermediates.len(), 2);

    assert!(matches!(
        apply_parenting(&mut snapshot, &result),
        Err(RigError::InvalidInput { .. })
    ));
    assert_eq!(snapshot, before);
}
