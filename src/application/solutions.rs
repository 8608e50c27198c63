//! Solution records
//!
//! Flat, persistable descriptions of the configurations a
//! [`SolutionIterator`] enumerates over a catalog.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::hash::fields_hash;
use crate::domain::{NodeItem, Price, SolutionIterator};

/// Alternative picked for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenOption {
    pub parameter: String,
    pub value: String,
    /// Own price of the chosen alternative
    pub price: Price,
}

/// One configuration of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub mark: String,
    pub model: String,
    pub price: Price,
    pub summary: String,
    pub hash: String,
    #[serde(default)]
    pub options: Vec<ChosenOption>,
}

impl Solution {
    /// Record of the iterator's current configuration.
    ///
    /// The first two picked alternatives name mark and model; the remaining
    /// ones make up the summary.
    pub fn from_iterator(iter: &SolutionIterator<'_, Price, NodeItem>) -> Self {
        let source = iter.source();
        let options: Vec<ChosenOption> = iter
            .selections()
            .into_iter()
            .map(|selection| {
                let alternative = source.node(selection.alternative);
                ChosenOption {
                    parameter: source.node(selection.parameter).value().name().to_string(),
                    value: alternative.value().name().to_string(),
                    price: *alternative.own_key(),
                }
            })
            .collect();

        let value_at = |index: usize| {
            options
                .get(index)
                .map(|option| option.value.clone())
                .unwrap_or_default()
        };
        let mark = value_at(0);
        let model = value_at(1);
        let summary = options
            .iter()
            .skip(2)
            .map(|option| format!("{}: {}", option.parameter, option.value))
            .join(", ");
        let hash = fields_hash(
            [mark.as_str(), model.as_str()].into_iter().chain(
                options
                    .iter()
                    .flat_map(|option| [option.parameter.as_str(), option.value.as_str()]),
            ),
        );

        Self {
            mark,
            model,
            price: iter.price().copied().unwrap_or_default(),
            summary,
            hash,
            options,
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.mark, self.model, self.price)?;
        if !self.summary.is_empty() {
            write!(f, " ({})", self.summary)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// Outcome of [`SolutionSet::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Solutions without duplicate hashes, optionally kept sorted by price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionSet {
    solutions: Vec<Solution>,
    hashes: HashSet<String>,
    order: Option<SortOrder>,
}

impl SolutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate one full cycle of `iter`, keeping the first occurrence of
    /// every hash.
    ///
    /// The iterator is left at the configuration it started from.
    #[instrument(level = "debug", skip_all)]
    pub fn collect(iter: &mut SolutionIterator<'_, Price, NodeItem>) -> Self {
        let mut set = Self::new();
        if iter.solution_count() == 0 {
            return set;
        }
        loop {
            set.insert(Solution::from_iterator(iter));
            if !iter.next_solution() {
                break;
            }
        }
        debug!(
            count = iter.solution_count(),
            distinct = set.len(),
            "solutions collected"
        );
        set
    }

    /// Set holding `solutions` in the given order, duplicates dropped.
    pub fn from_solutions(solutions: Vec<Solution>) -> Self {
        let mut set = Self::new();
        for solution in solutions {
            set.insert(solution);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Solution> {
        self.solutions.iter()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<Solution> {
        self.solutions
    }

    pub fn order(&self) -> Option<SortOrder> {
        self.order
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Sort by price; equal prices keep their relative order.
    ///
    /// A set already sorted the other way round is reversed.
    pub fn sort(&mut self, order: SortOrder) {
        match self.order {
            Some(current) if current == order => {}
            Some(current) if current.reversed() == order => self.solutions.reverse(),
            _ => match order {
                SortOrder::Ascending => self.solutions.sort_by(|a, b| a.price.cmp(&b.price)),
                SortOrder::Descending => self.solutions.sort_by(|a, b| b.price.cmp(&a.price)),
            },
        }
        self.order = Some(order);
    }

    /// Add `solution` at its sort position, or at the end of an unsorted
    /// set. Returns false if a solution with the same hash is present.
    pub fn insert(&mut self, solution: Solution) -> bool {
        if !self.hashes.insert(solution.hash.clone()) {
            return false;
        }
        let position = match self.order {
            Some(SortOrder::Ascending) => self
                .solutions
                .partition_point(|s| s.price <= solution.price),
            Some(SortOrder::Descending) => self
                .solutions
                .partition_point(|s| s.price >= solution.price),
            None => self.solutions.len(),
        };
        self.solutions.insert(position, solution);
        true
    }

    /// Make this set hold exactly the solutions of `newer`: drop the ones
    /// `newer` lacks, insert the new ones at their sort position.
    #[instrument(level = "debug", skip_all)]
    pub fn reconcile(&mut self, newer: &SolutionSet) -> ReconcileReport {
        let wanted: HashSet<&str> = newer.iter().map(|s| s.hash.as_str()).collect();
        let before = self.solutions.len();
        let hashes = &mut self.hashes;
        self.solutions.retain(|s| {
            let keep = wanted.contains(s.hash.as_str());
            if !keep {
                hashes.remove(&s.hash);
            }
            keep
        });
        let removed = before - self.solutions.len();

        let mut added = 0;
        for solution in newer.iter() {
            if self.insert(solution.clone()) {
                added += 1;
            }
        }
        let report = ReconcileReport { added, removed };
        debug!(?report, "solutions reconciled");
        report
    }
}

impl<'a> IntoIterator for &'a SolutionSet {
    type Item = &'a Solution;
    type IntoIter = std::slice::Iter<'a, Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}

/// Persisted solutions together with the hash of the catalog they were
/// enumerated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionsDocument {
    pub model_hash: String,
    #[serde(default)]
    pub solutions: Vec<Solution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(hash: &str, price: Price) -> Solution {
        Solution {
            mark: "BMW".to_string(),
            model: "X5".to_string(),
            price,
            summary: String::new(),
            hash: hash.to_string(),
            options: Vec::new(),
        }
    }

    fn prices(set: &SolutionSet) -> Vec<Price> {
        set.iter().map(|s| s.price).collect()
    }

    fn hashes(set: &SolutionSet) -> Vec<&str> {
        set.iter().map(|s| s.hash.as_str()).collect()
    }

    #[test]
    fn duplicates_are_dropped() {
        let set = SolutionSet::from_solutions(vec![
            solution("a", 1),
            solution("b", 2),
            solution("a", 3),
        ]);
        assert_eq!(hashes(&set), vec!["a", "b"]);
    }

    #[test]
    fn sort_is_stable_and_reversal_flips() {
        let mut set = SolutionSet::from_solutions(vec![
            solution("a", 5),
            solution("b", 1),
            solution("c", 5),
            solution("d", 3),
        ]);

        set.sort(SortOrder::Ascending);
        assert_eq!(hashes(&set), vec!["b", "d", "a", "c"]);

        set.sort(SortOrder::Descending);
        assert_eq!(hashes(&set), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn insert_keeps_sort_order() {
        let mut set = SolutionSet::from_solutions(vec![solution("a", 1), solution("b", 9)]);
        set.sort(SortOrder::Descending);

        assert!(set.insert(solution("c", 4)));
        assert!(!set.insert(solution("c", 4)));

        assert_eq!(prices(&set), vec![9, 4, 1]);
    }

    #[test]
    fn reconcile_reports_added_and_removed() {
        let mut stored = SolutionSet::from_solutions(vec![
            solution("a", 1),
            solution("b", 2),
            solution("c", 3),
        ]);
        stored.sort(SortOrder::Ascending);
        let fresh = SolutionSet::from_solutions(vec![
            solution("c", 3),
            solution("d", 0),
            solution("a", 1),
        ]);

        let report = stored.reconcile(&fresh);

        assert_eq!(report, ReconcileReport { added: 1, removed: 1 });
        assert_eq!(hashes(&stored), vec!["d", "a", "c"]);
        assert!(stored.reconcile(&fresh).is_unchanged());
    }

    #[test]
    fn solution_dropped_by_reconcile_can_be_inserted_again() {
        let mut stored = SolutionSet::from_solutions(vec![solution("a", 1), solution("b", 2)]);
        let fresh = SolutionSet::from_solutions(vec![solution("a", 1)]);

        stored.reconcile(&fresh);

        assert!(!stored.contains("b"));
        assert!(stored.insert(solution("b", 2)));
        assert_eq!(hashes(&stored), vec!["a", "b"]);
    }

    #[test]
    fn sort_order_parses_short_and_long_names() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Ascending));
        assert_eq!("Descending".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
