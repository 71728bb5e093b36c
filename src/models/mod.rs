//! Core data models for the examiner payroll engine.
//!
//! This module contains the domain models used throughout the engine, plus
//! the [`coerce`] boundary that turns loosely typed values into them.

pub mod coerce;

mod calculation;
mod evaluation_day;
mod examiner;
mod ids;
mod report;

pub use calculation::{
    Calculation, CalculationDayLink, CalculationDetail, NewCalculation, SalaryAmounts,
};
pub use evaluation_day::{
    DayBreakdown, DayInput, EvaluationDay, StaffEntry, StaffEvaluation, StaffPapers, StaffUpsert,
};
pub use examiner::Examiner;
pub use ids::{CalculationId, DayId, ExaminerId, StaffId};
pub use report::{
    CalculationNode, CalculationRecord, DayNode, DaySource, DepartmentGroup, ExaminerNode,
    LegacyDay, LinkedDay, NestedDay, Report, Rollup, StaffNode, StaffRecord,
};
