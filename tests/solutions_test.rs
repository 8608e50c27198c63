//! Tests for solution records, SolutionSet and SolutionStore

mod common;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use rstest::rstest;

use common::{canonical_tree, find, MemoryFileSystem};
use trimtree::application::selection;
use trimtree::application::services::SolutionStore;
use trimtree::application::{ApplicationError, Solution, SolutionSet, SortOrder};
use trimtree::domain::{NodeItem, NodeKind, SolutionIterator};
use trimtree::util::testing;

fn canonical_solutions() -> SolutionSet {
    testing::init_test_setup();
    let tree = canonical_tree();
    let mut iter = SolutionIterator::new(&tree);
    SolutionSet::collect(&mut iter)
}

// ============================================================
// Records
// ============================================================

#[test]
fn given_canonical_tree_when_collecting_then_four_distinct_hashes() {
    let set = canonical_solutions();

    let hashes: HashSet<&str> = set.iter().map(|s| s.hash.as_str()).collect();

    assert_eq!(set.len(), 4);
    assert_eq!(hashes.len(), 4);
}

#[test]
fn given_first_configuration_when_recording_then_options_mark_and_model() {
    // Arrange
    let tree = canonical_tree();
    let iter = SolutionIterator::new(&tree);

    // Act
    let solution = Solution::from_iterator(&iter);

    // Assert
    assert_eq!(solution.mark, "Baz");
    assert_eq!(solution.model, "Sel");
    assert_eq!(solution.price, 221);
    assert_eq!(solution.options.len(), 2);
    assert_eq!(solution.options[0].parameter, "Foo");
    assert_eq!(solution.options[1].price, 12);
    assert!(solution.summary.is_empty());
}

#[test]
fn given_nested_configuration_when_recording_then_summary_lists_remaining_options() {
    let tree = canonical_tree();
    let mut iter = SolutionIterator::new(&tree);
    iter.next_solution();
    iter.next_solution();

    let solution = Solution::from_iterator(&iter);

    assert_eq!(solution.mark, "Frob");
    assert_eq!(solution.model, "Crux");
    assert_eq!(solution.summary, "Zyx: Sel");
}

#[test]
fn given_collected_set_when_done_then_iterator_is_back_at_start() {
    let tree = canonical_tree();
    let mut iter = SolutionIterator::new(&tree);
    let first = Solution::from_iterator(&iter);

    SolutionSet::collect(&mut iter);

    assert_eq!(Solution::from_iterator(&iter), first);
}

#[test]
fn given_empty_catalog_when_collecting_then_no_solutions() {
    let tree = trimtree::domain::Catalog::new();
    let mut iter = SolutionIterator::new(&tree);

    assert!(SolutionSet::collect(&mut iter).is_empty());
}

// ============================================================
// Ordering
// ============================================================

#[rstest]
#[case(SortOrder::Ascending, vec![180, 183, 221, 232])]
#[case(SortOrder::Descending, vec![232, 221, 183, 180])]
fn given_collected_set_when_sorting_then_prices_are_ordered(
    #[case] order: SortOrder,
    #[case] expected: Vec<i64>,
) {
    let mut set = canonical_solutions();

    set.sort(order);

    let prices: Vec<i64> = set.iter().map(|s| s.price).collect();
    assert_eq!(prices, expected);
    assert_eq!(set.order(), Some(order));
}

#[test]
fn given_catalog_extended_when_reconciling_then_reports_new_configuration() {
    // Arrange
    let mut stored = canonical_solutions();
    stored.sort(SortOrder::Ascending);
    let mut tree = canonical_tree();
    let foo = find(&tree, "Foo");
    tree.append(foo, NodeKind::None, 1, NodeItem::new("Cheap"));
    let mut iter = SolutionIterator::new(&tree);
    let fresh = SolutionSet::collect(&mut iter);

    // Act
    let report = stored.reconcile(&fresh);

    // Assert
    assert_eq!(report.added, 1);
    assert_eq!(report.removed, 0);
    assert_eq!(stored.iter().next().unwrap().mark, "Cheap");
}

#[test]
fn given_value_pinned_when_reconciling_then_other_configurations_are_removed() {
    let mut stored = canonical_solutions();
    let mut tree = canonical_tree();
    selection::choose(&mut tree, "Foo", "Quax").unwrap();
    let mut iter = SolutionIterator::new(&tree);
    let fresh = SolutionSet::collect(&mut iter);

    let report = stored.reconcile(&fresh);

    assert_eq!(report.removed, 3);
    assert_eq!(report.added, 0);
    assert_eq!(stored.len(), 1);
}

// ============================================================
// Persistence
// ============================================================

#[test]
fn given_saved_solutions_when_loading_with_same_hash_then_current() {
    // Arrange
    let fs = Arc::new(MemoryFileSystem::new());
    let store = SolutionStore::new(fs.clone());
    let path = Path::new("/p/solutions.toml");
    let set = canonical_solutions();

    // Act
    store.save(&set, "a1b2c3d4", path).unwrap();
    let stored = store.load(path, "a1b2c3d4").unwrap();

    // Assert
    assert!(!stored.outdated);
    assert_eq!(stored.model_hash, "a1b2c3d4");
    assert_eq!(stored.solutions.solutions(), set.solutions());
    assert!(fs.content(path).unwrap().contains("model_hash = \"a1b2c3d4\""));
}

#[test]
fn given_saved_solutions_when_catalog_hash_changed_then_outdated() {
    let fs = Arc::new(MemoryFileSystem::new());
    let store = SolutionStore::new(fs);
    let path = Path::new("/p/solutions.toml");
    store.save(&canonical_solutions(), "a1b2c3d4", path).unwrap();

    let stored = store.load(path, "deadbeef").unwrap();

    assert!(stored.outdated);
}

#[test]
fn given_garbage_file_when_loading_then_parse_error() {
    let fs = MemoryFileSystem::new().with_file("/p/solutions.toml", "solutions = 3");
    let store = SolutionStore::new(Arc::new(fs));

    let err = store.load(Path::new("/p/solutions.toml"), "x").unwrap_err();

    assert!(matches!(err, ApplicationError::Parse { .. }));
}
