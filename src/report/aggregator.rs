//! Report aggregation.
//!
//! Groups calculation records into department → examiner → calculation →
//! day → staff, with rollups at every level. Aggregation is a pure
//! function of its input: no I/O, no clock, no randomness.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::ReportConfig;
use crate::models::{
    CalculationNode, CalculationRecord, DayNode, DepartmentGroup, ExaminerId, ExaminerNode,
    Report, Rollup,
};

use super::normalize::normalize_days;

/// Default label for examiners without a department.
pub const DEFAULT_UNASSIGNED_LABEL: &str = "Unassigned";

/// Builds [`Report`] trees from calculation records.
///
/// # Example
///
/// ```
/// use examiner_payroll::report::ReportAggregator;
///
/// let report = ReportAggregator::default().aggregate(&[]);
/// assert!(report.departments.is_empty());
/// assert_eq!(report.totals.calculation_count, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAggregator {
    unassigned_label: String,
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_UNASSIGNED_LABEL)
    }
}

impl From<&ReportConfig> for ReportAggregator {
    fn from(config: &ReportConfig) -> Self {
        Self::new(config.unassigned_label.clone())
    }
}

#[derive(Default)]
struct DepartmentBuilder {
    examiners: Vec<ExaminerNode>,
    positions: HashMap<ExaminerId, usize>,
}

impl ReportAggregator {
    /// Creates an aggregator that files department-less examiners under
    /// `unassigned_label`.
    pub fn new(unassigned_label: impl Into<String>) -> Self {
        Self {
            unassigned_label: unassigned_label.into(),
        }
    }

    /// Label used for examiners without a department.
    pub fn unassigned_label(&self) -> &str {
        &self.unassigned_label
    }

    /// Aggregates `records` into a report.
    ///
    /// Calculations are deduplicated by id, keeping the first occurrence.
    /// An examiner is filed under the department of their first record.
    pub fn aggregate(&self, records: &[CalculationRecord]) -> Report {
        let mut seen = HashSet::new();
        let mut homes: HashMap<ExaminerId, String> = HashMap::new();
        let mut departments: BTreeMap<String, DepartmentBuilder> = BTreeMap::new();

        for record in records {
            if !seen.insert(record.id) {
                continue;
            }
            let examiner = &record.examiner;
            let department = homes
                .entry(examiner.id)
                .or_insert_with(|| {
                    examiner
                        .department_name()
                        .unwrap_or(&self.unassigned_label)
                        .to_string()
                })
                .clone();

            let builder = departments.entry(department).or_default();
            let position = *builder.positions.entry(examiner.id).or_insert_with(|| {
                builder.examiners.push(ExaminerNode {
                    examiner_id: examiner.id,
                    name: examiner.name.clone(),
                    examiner_code: examiner.examiner_code.clone(),
                    calculations: Vec::new(),
                    totals: Rollup::default(),
                });
                builder.examiners.len() - 1
            });
            builder.examiners[position]
                .calculations
                .push(calculation_node(record));
        }

        let mut totals = Rollup::default();
        let departments = departments
            .into_iter()
            .map(|(name, builder)| {
                let mut department_totals = Rollup::default();
                let examiners: Vec<ExaminerNode> = builder
                    .examiners
                    .into_iter()
                    .map(|mut node| {
                        node.totals = examiner_rollup(&node.calculations);
                        department_totals.absorb(&node.totals);
                        node
                    })
                    .collect();
                totals.absorb(&department_totals);
                DepartmentGroup {
                    name,
                    examiners,
                    totals: department_totals,
                }
            })
            .collect();

        Report {
            departments,
            totals,
        }
    }
}

fn calculation_node(record: &CalculationRecord) -> CalculationNode {
    let (source, days) = normalize_days(record);
    let days: Vec<DayNode> = days
        .into_iter()
        .map(|day| DayNode {
            day_id: day.day_id,
            date: day.date,
            total_papers: day.total_papers(),
            staff_count: day.staff_count(),
            staff: day.staff,
        })
        .collect();

    let (total_papers, total_staff) = if days.is_empty() {
        (record.total_papers, record.aggregate_staff())
    } else {
        days.iter().fold((0u32, 0u32), |(papers, staff), day| {
            (
                papers.saturating_add(day.total_papers),
                staff.saturating_add(day.staff_count),
            )
        })
    };

    CalculationNode {
        calculation_id: record.id,
        created_at: record.created_at,
        source,
        total_papers,
        total_staff,
        base_amount: record.base_amount,
        incentive_amount: record.incentive_amount,
        final_amount: record.final_amount,
        days,
    }
}

fn examiner_rollup(calculations: &[CalculationNode]) -> Rollup {
    calculations.iter().fold(
        Rollup {
            examiner_count: 1,
            ..Rollup::default()
        },
        |mut acc, calc| {
            acc.calculation_count += 1;
            acc.day_count += u32::try_from(calc.days.len()).unwrap_or(u32::MAX);
            acc.total_papers += u64::from(calc.total_papers);
            acc.total_staff += u64::from(calc.total_staff);
            acc.total_amount += calc.final_amount;
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CalculationId, DaySource, Examiner, LegacyDay, LinkedDay, NestedDay, StaffRecord,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn examiner(name: &str, department: Option<&str>) -> Examiner {
        Examiner {
            id: ExaminerId::new(),
            name: name.to_string(),
            examiner_code: format!("EX-{}", name.len()),
            department: department.map(str::to_string),
        }
    }

    fn record(examiner: &Examiner, papers: u32, staff: u32, final_amount: &str) -> CalculationRecord {
        CalculationRecord {
            id: CalculationId::new(),
            examiner: examiner.clone(),
            created_at: Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
            total_papers: papers,
            staff_count: Some(staff),
            total_staff: None,
            base_amount: Decimal::ZERO,
            incentive_amount: Decimal::ZERO,
            final_amount: dec(final_amount),
            calculation_days: Vec::new(),
            evaluation_days: Vec::new(),
        }
    }

    fn staff(name: &str, papers: u32) -> StaffRecord {
        StaffRecord {
            staff_name: name.to_string(),
            papers_evaluated: papers,
        }
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let report = ReportAggregator::default().aggregate(&[]);
        assert!(report.departments.is_empty());
        assert_eq!(report.totals, Rollup::default());
    }

    #[test]
    fn test_aggregate_only_record_gets_synthetic_day() {
        let ex = examiner("A. Khan", Some("Physics"));
        let report = ReportAggregator::default().aggregate(&[record(&ex, 10, 3, "220.00")]);

        let calc = &report.departments[0].examiners[0].calculations[0];
        assert_eq!(calc.source, DaySource::Synthetic);
        assert_eq!(calc.days.len(), 1);
        let papers: Vec<u32> = calc.days[0].staff.iter().map(|s| s.papers).collect();
        assert_eq!(papers, vec![4, 3, 3]);
        assert_eq!(calc.days[0].date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(report.totals.total_papers, 10);
        assert_eq!(report.totals.day_count, 1);
    }

    #[test]
    fn test_nested_days_are_summed() {
        let ex = examiner("B. Osei", Some("Physics"));
        let mut rec = record(&ex, 0, 0, "0");
        rec.calculation_days = vec![
            LinkedDay {
                evaluation_day: Some(NestedDay {
                    id: None,
                    date: NaiveDate::from_ymd_opt(2025, 6, 2),
                    staff_evaluations: vec![staff("A", 5), staff("B", 7)],
                }),
            },
            LinkedDay {
                evaluation_day: Some(NestedDay {
                    id: None,
                    date: NaiveDate::from_ymd_opt(2025, 6, 3),
                    staff_evaluations: vec![staff("C", 8)],
                }),
            },
        ];

        let report = ReportAggregator::default().aggregate(&[rec]);

        let calc = &report.departments[0].examiners[0].calculations[0];
        assert_eq!(calc.source, DaySource::Nested);
        assert_eq!(calc.total_papers, 20);
        assert_eq!(calc.total_staff, 3);
        assert_eq!(report.totals.day_count, 2);
    }

    #[test]
    fn test_legacy_days_used_without_nested() {
        let ex = examiner("C. Ruiz", Some("Chemistry"));
        let mut rec = record(&ex, 0, 0, "0");
        rec.evaluation_days = vec![LegacyDay {
            id: None,
            date: NaiveDate::from_ymd_opt(2025, 6, 9),
            staff: vec![staff("A", 3)],
            total_papers: 0,
            staff_count: 0,
        }];

        let report = ReportAggregator::default().aggregate(&[rec]);

        let calc = &report.departments[0].examiners[0].calculations[0];
        assert_eq!(calc.source, DaySource::Legacy);
        assert_eq!(calc.total_papers, 3);
    }

    #[test]
    fn test_departments_sorted_and_unassigned_labelled() {
        let zoology = examiner("Z", Some("Zoology"));
        let none = examiner("N", None);
        let blank = examiner("B", Some("  "));
        let art = examiner("A", Some("Art"));

        let report = ReportAggregator::default().aggregate(&[
            record(&zoology, 1, 1, "1"),
            record(&none, 1, 1, "1"),
            record(&blank, 1, 1, "1"),
            record(&art, 1, 1, "1"),
        ]);

        let names: Vec<&str> = report.departments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Art", "Unassigned", "Zoology"]);
        assert_eq!(report.departments[1].examiners.len(), 2);
        assert_eq!(report.departments[1].totals.examiner_count, 2);
    }

    #[test]
    fn test_custom_unassigned_label() {
        let none = examiner("N", None);
        let report = ReportAggregator::new("No department").aggregate(&[record(&none, 1, 1, "1")]);
        assert_eq!(report.departments[0].name, "No department");
    }

    #[test]
    fn test_duplicate_calculations_counted_once() {
        let ex = examiner("D. Lee", Some("Maths"));
        let rec = record(&ex, 10, 2, "220.00");
        let mut duplicate = rec.clone();
        duplicate.final_amount = dec("999.00");

        let report = ReportAggregator::default().aggregate(&[rec, duplicate]);

        assert_eq!(report.totals.calculation_count, 1);
        assert_eq!(report.totals.total_amount, dec("220.00"));
    }

    #[test]
    fn test_examiner_rollups_sum_calculations() {
        let ex = examiner("E. Park", Some("Maths"));
        let other = examiner("F. Silva", Some("Maths"));
        let report = ReportAggregator::default().aggregate(&[
            record(&ex, 10, 2, "220.00"),
            record(&other, 5, 1, "110.00"),
            record(&ex, 20, 4, "440.00"),
        ]);

        let department = &report.departments[0];
        assert_eq!(department.examiners[0].examiner_id, ex.id);
        assert_eq!(department.examiners[0].calculations.len(), 2);
        assert_eq!(department.examiners[0].totals.total_papers, 30);
        assert_eq!(department.examiners[0].totals.total_amount, dec("660.00"));
        assert_eq!(department.totals.examiner_count, 2);
        assert_eq!(department.totals.total_amount, dec("770.00"));
        assert_eq!(report.totals.total_staff, 7);
    }

    #[test]
    fn test_examiner_stays_in_first_department() {
        let mut ex = examiner("G. Ito", Some("Physics"));
        let first = record(&ex, 1, 1, "1");
        ex.department = Some("Chemistry".to_string());
        let second = record(&ex, 1, 1, "1");

        let report = ReportAggregator::default().aggregate(&[first, second]);

        assert_eq!(report.departments.len(), 1);
        assert_eq!(report.departments[0].name, "Physics");
        assert_eq!(report.departments[0].examiners[0].calculations.len(), 2);
    }

    #[test]
    fn test_zero_paper_record_has_no_days() {
        let ex = examiner("H. Berg", None);
        let report = ReportAggregator::default().aggregate(&[record(&ex, 0, 3, "0")]);

        let calc = &report.departments[0].examiners[0].calculations[0];
        assert_eq!(calc.source, DaySource::Empty);
        assert!(calc.days.is_empty());
        assert_eq!(calc.total_staff, 3);
        assert_eq!(report.totals.day_count, 0);
    }

    #[test]
    fn test_identical_input_gives_identical_output() {
        let a = examiner("I", Some("X"));
        let b = examiner("J", None);
        let mut nested = record(&a, 0, 0, "44");
        nested.calculation_days = vec![LinkedDay {
            evaluation_day: Some(NestedDay {
                id: None,
                date: NaiveDate::from_ymd_opt(2025, 7, 2),
                staff_evaluations: vec![staff("P", 1), staff("Q", 1)],
            }),
        }];
        let records = vec![record(&a, 7, 2, "154"), record(&b, 3, 0, "66"), nested];
        let aggregator = ReportAggregator::default();

        let first = aggregator.aggregate(&records);
        let second = aggregator.aggregate(&records);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
