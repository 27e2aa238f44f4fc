/// Hour-budget allocation across a project's phases
///
/// A project's `total_billed_hours` is the ceiling for the sum of its
/// phases' `allocated_hours`. Every change to a phase's hours, and every
/// change to the project budget, is checked here before it is written.
///
/// # Rules
///
/// - A candidate hour value must be non-negative.
/// - Setting a phase to `h` hours is accepted when
///   `sum(other phases) + h <= total_billed_hours`. When the phase already
///   exists its current value is excluded from the sum.
/// - Lowering `total_billed_hours` is accepted only while it stays at or
///   above the sum of all current allocations.
///
/// Hours are [`Decimal`], so sums and comparisons are exact.
///
/// # Example
///
/// ```
/// use phaseplan_shared::budget::{validate_allocation, BudgetError, PhaseAllocation};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let existing = vec![PhaseAllocation::new(Uuid::new_v4(), Decimal::from(60))];
///
/// // A new 50h phase pushes the project to 110h of a 100h budget
/// let err = validate_allocation(Decimal::from(100), &existing, Decimal::from(50), None).unwrap_err();
/// assert!(matches!(err, BudgetError::ExceedsBudget { .. }));
///
/// // 40h still fits
/// assert!(validate_allocation(Decimal::from(100), &existing, Decimal::from(40), None).is_ok());
/// ```

use rust_decimal::Decimal;
use uuid::Uuid;

/// Budget rule violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    /// Hours are negative
    #[error("Hours must be a non-negative number (got {0})")]
    InvalidHours(Decimal),

    /// Allocations would exceed the project budget
    #[error("Total allocated hours ({new_total}) would exceed the project's limit of {limit} hours.")]
    ExceedsBudget { new_total: Decimal, limit: Decimal },

    /// Project budget would drop below what phases already hold
    #[error("New total hours ({requested}) cannot be less than the hours already allocated to phases ({allocated}).")]
    BelowAllocated { requested: Decimal, allocated: Decimal },
}

/// The part of a phase the allocator needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAllocation {
    pub phase_id: Uuid,
    pub allocated_hours: Decimal,
}

impl PhaseAllocation {
    pub fn new(phase_id: Uuid, allocated_hours: Decimal) -> Self {
        Self {
            phase_id,
            allocated_hours,
        }
    }
}

/// Checks that an hour value is usable as a budget or allocation
pub fn validate_hours(hours: Decimal) -> Result<(), BudgetError> {
    if hours < Decimal::ZERO {
        return Err(BudgetError::InvalidHours(hours.normalize()));
    }
    Ok(())
}

/// Sum of allocations, skipping `excluding` when given
pub fn allocated_sum(phases: &[PhaseAllocation], excluding: Option<Uuid>) -> Decimal {
    phases
        .iter()
        .filter(|p| Some(p.phase_id) != excluding)
        .map(|p| p.allocated_hours)
        .sum()
}

/// Budget left after all current allocations (negative if over-allocated)
pub fn remaining_hours(total_billed_hours: Decimal, phases: &[PhaseAllocation]) -> Decimal {
    total_billed_hours - allocated_sum(phases, None)
}

/// Validates setting one phase to `candidate_hours`
///
/// `excluding_phase_id` is the id of the phase being updated; pass `None`
/// when creating a phase.
pub fn validate_allocation(
    total_billed_hours: Decimal,
    phases: &[PhaseAllocation],
    candidate_hours: Decimal,
    excluding_phase_id: Option<Uuid>,
) -> Result<(), BudgetError> {
    validate_hours(candidate_hours)?;

    let new_total = allocated_sum(phases, excluding_phase_id) + candidate_hours;

    if new_total > total_billed_hours {
        return Err(BudgetError::ExceedsBudget {
            new_total: new_total.normalize(),
            limit: total_billed_hours.normalize(),
        });
    }

    Ok(())
}

/// Validates changing the project budget to `new_total_billed_hours`
pub fn validate_total_hours(
    new_total_billed_hours: Decimal,
    phases: &[PhaseAllocation],
) -> Result<(), BudgetError> {
    validate_hours(new_total_billed_hours)?;

    let allocated = allocated_sum(phases, None);

    if new_total_billed_hours < allocated {
        return Err(BudgetError::BelowAllocated {
            requested: new_total_billed_hours.normalize(),
            allocated: allocated.normalize(),
        });
    }

    Ok(())
}
