//! Test subset selection.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::KavaError;
use crate::spec::TestCase;

static SELECTOR_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})(?:-(\d{1,3}))?$").expect("static pattern"));

/// Resolves a selector expression against a spec's test list.
///
/// The grammar is a comma-separated list of items, each a 1-3 digit test
/// number or an inclusive `low-high` range of two such numbers. Any other
/// item fails with [`KavaError::InvalidSelector`] naming it. Requested ids
/// absent from `tests` are silently skipped; the result keeps the order of
/// `tests`, not of the expression.
pub fn subset(expression: &str, tests: &[TestCase]) -> Result<Vec<TestCase>, KavaError> {
    let mut wanted: HashSet<u32> = HashSet::new();

    for item in expression.split(',') {
        let captures = SELECTOR_ITEM
            .captures(item)
            .ok_or_else(|| invalid(item))?;
        let low: u32 = captures[1].parse().map_err(|_| invalid(item))?;
        match captures.get(2) {
            None => {
                wanted.insert(low);
            }
            Some(high) => {
                let high: u32 = high.as_str().parse().map_err(|_| invalid(item))?;
                wanted.extend(low..=high);
            }
        }
    }

    Ok(tests
        .iter()
        .filter(|test| wanted.contains(&test.id))
        .cloned()
        .collect())
}

fn invalid(item: &str) -> KavaError {
    KavaError::InvalidSelector {
        item: item.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases(ids: &[u32]) -> Vec<TestCase> {
        ids.iter()
            .map(|&id| TestCase {
                id,
                args: vec![],
                expected_stdout: "\n".to_string(),
            })
            .collect()
    }

    fn ids(selected: &[TestCase]) -> Vec<u32> {
        selected.iter().map(|t| t.id).collect()
    }

    #[test]
    fn single_number_selects_one_test() {
        let all = cases(&[1, 2, 3]);
        assert_eq!(ids(&subset("3", &all).unwrap()), vec![3]);
    }

    #[test]
    fn range_selects_inclusively_in_spec_order() {
        let all = cases(&[3, 1, 2, 7]);
        assert_eq!(ids(&subset("1-3", &all).unwrap()), vec![3, 1, 2]);
    }

    #[test]
    fn union_of_items() {
        let all = cases(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(ids(&subset("1,5-7", &all).unwrap()), vec![1, 5, 6, 7]);
    }

    #[test]
    fn absent_id_is_silently_skipped() {
        let all = cases(&[1, 2]);
        assert!(subset("9", &all).unwrap().is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        let all = cases(&[1, 2, 3]);
        assert!(subset("3-1", &all).unwrap().is_empty());
    }

    #[test]
    fn malformed_item_names_the_offender() {
        let all = cases(&[1]);
        match subset("1,abc", &all).unwrap_err() {
            KavaError::InvalidSelector { item } => assert_eq!(item, "abc"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn four_digit_numbers_are_rejected() {
        let all = cases(&[1]);
        assert!(matches!(
            subset("1234", &all).unwrap_err(),
            KavaError::InvalidSelector { .. }
        ));
    }
}
