//! Synthetic staff distribution.
//!
//! When only `{staff_count, total_papers}` is known for a day, the papers are
//! spread over `staff_count` synthetic staff members: each gets
//! `floor(total / count)` and the first one also gets the remainder.
//! The result depends only on the two inputs.

use crate::models::StaffPapers;

/// Name prefix for synthetic staff members ("Staff 1", "Staff 2", ...).
pub const SYNTHETIC_STAFF_PREFIX: &str = "Staff";

/// Splits `total_papers` over `staff_count` members.
///
/// Returns an empty vector when `staff_count` is zero.
///
/// # Example
///
/// ```
/// use examiner_payroll::calculation::distribute_papers;
///
/// assert_eq!(distribute_papers(10, 3), vec![4, 3, 3]);
/// assert_eq!(distribute_papers(0, 2), vec![0, 0]);
/// assert!(distribute_papers(5, 0).is_empty());
/// ```
pub fn distribute_papers(total_papers: u32, staff_count: u32) -> Vec<u32> {
    if staff_count == 0 {
        return Vec::new();
    }
    let share = total_papers / staff_count;
    let remainder = total_papers % staff_count;

    let mut papers = vec![share; staff_count as usize];
    papers[0] += remainder;
    papers
}

/// Builds named synthetic staff rows for an aggregate-only day.
///
/// Papers reported with a zero staff count are credited to a single
/// member, so the rows always add up to `total_papers`.
pub fn synthesize_staff(total_papers: u32, staff_count: u32) -> Vec<StaffPapers> {
    let staff_count = if total_papers > 0 {
        staff_count.max(1)
    } else {
        staff_count
    };
    distribute_papers(total_papers, staff_count)
        .into_iter()
        .enumerate()
        .map(|(index, papers)| StaffPapers {
            name: format!("{} {}", SYNTHETIC_STAFF_PREFIX, index + 1),
            papers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_three_staff_ten_papers() {
        assert_eq!(distribute_papers(10, 3), vec![4, 3, 3]);
    }

    #[test]
    fn test_even_split_has_no_remainder() {
        assert_eq!(distribute_papers(12, 4), vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_whole_remainder_goes_to_first() {
        assert_eq!(distribute_papers(10, 4), vec![4, 2, 2, 2]);
    }

    #[test]
    fn test_fewer_papers_than_staff() {
        assert_eq!(distribute_papers(2, 5), vec![2, 0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_staff_yields_nothing() {
        assert!(distribute_papers(9, 0).is_empty());
        assert!(synthesize_staff(0, 0).is_empty());
    }

    #[test]
    fn test_papers_without_staff_go_to_one_member() {
        assert_eq!(
            synthesize_staff(9, 0),
            vec![StaffPapers {
                name: "Staff 1".to_string(),
                papers: 9
            }]
        );
    }

    #[test]
    fn test_synthetic_names_are_numbered() {
        let staff = synthesize_staff(7, 2);
        assert_eq!(
            staff,
            vec![
                StaffPapers {
                    name: "Staff 1".to_string(),
                    papers: 4
                },
                StaffPapers {
                    name: "Staff 2".to_string(),
                    papers: 3
                },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_synthetic_rows_preserve_total(total in 0u32..1_000_000, count in 0u32..500) {
            let staff = synthesize_staff(total, count);
            prop_assert_eq!(staff.iter().map(|s| u64::from(s.papers)).sum::<u64>(), u64::from(total));
        }

        #[test]
        fn prop_distribution_preserves_total(total in 0u32..1_000_000, count in 1u32..500) {
            let papers = distribute_papers(total, count);

            prop_assert_eq!(papers.len(), count as usize);
            prop_assert_eq!(papers.iter().map(|p| u64::from(*p)).sum::<u64>(), u64::from(total));
            for p in &papers[1..] {
                prop_assert!(papers[0] >= *p);
                prop_assert_eq!(papers[0] - *p, total % count);
                prop_assert_eq!(*p, total / count);
            }
        }

        #[test]
        fn prop_distribution_is_deterministic(total in 0u32..100_000, count in 0u32..200) {
            prop_assert_eq!(distribute_papers(total, count), distribute_papers(total, count));
        }
    }
}
