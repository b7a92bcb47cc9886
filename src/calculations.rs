//! Per-year display cells and roll-up sums for a single planning row.

use crate::schema::{FinanceRecord, PlanningRowType, YearKey};
use crate::utils::format_number;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub value: String,
    pub is_negative: bool,
}

impl Deviation {
    /// Formats a raw difference; the sign is taken before formatting.
    pub fn from_raw(raw: f64) -> Self {
        Self {
            value: format_number(Some(raw)),
            is_negative: raw < 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningCell {
    pub key: YearKey,
    /// Calendar year of the cell (base year + offset)
    pub year: i32,
    pub planned_budget: String,
    pub frame_budget: String,
    pub deviation: Deviation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRowSums {
    pub planned_budgets: String,
    pub cost_estimate_budget: String,
    /// Never present for group rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<Deviation>,
}

pub fn calculate_planning_cells(finances: &FinanceRecord) -> Vec<PlanningCell> {
    finances
        .years
        .iter()
        .map(|(key, budget)| PlanningCell {
            key: *key,
            year: finances.year + key.offset() as i32,
            planned_budget: format_number(Some(budget.planned_budget)),
            frame_budget: format_number(Some(budget.frame_budget)),
            deviation: Deviation::from_raw(budget.frame_budget - budget.planned_budget),
        })
        .collect()
}

pub fn calculate_planning_row_sums(
    finances: &FinanceRecord,
    row_type: PlanningRowType,
) -> PlanningRowSums {
    let (sum_of_planned_budgets, sum_of_frame_budgets) = finances
        .years
        .iter()
        .fold((0.0, 0.0), |(planned, frame), (_, budget)| {
            (planned + budget.planned_budget, frame + budget.frame_budget)
        });

    if row_type == PlanningRowType::Group {
        // Groups report the backend's pre-aggregated project total
        return PlanningRowSums {
            planned_budgets: format_number(Some(sum_of_planned_budgets)),
            cost_estimate_budget: format_number(finances.project_budgets),
            deviation: None,
        };
    }

    let cost_estimate_budget = sum_of_frame_budgets + finances.budget_overrun_amount;

    PlanningRowSums {
        planned_budgets: format_number(Some(sum_of_planned_budgets)),
        cost_estimate_budget: format_number(Some(cost_estimate_budget)),
        deviation: Some(Deviation::from_raw(
            cost_estimate_budget - sum_of_planned_budgets,
        )),
    }
}
