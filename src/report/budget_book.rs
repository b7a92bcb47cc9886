use super::{cell_frame_text, ReportContext, ReportRowType, FINANCE_SLOT_COUNT};
use crate::planning_row::PlanningRow;
use crate::schema::PlanningRowType;
use crate::utils::{format_amount, parse_formatted};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ASCII classes only: names like "Ä Foo" are not numbered
static NUMBERED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+|[0-9A-Za-z_])\s").expect("numbered name pattern is valid")
});

pub const INVESTMENT_PART_ID: &str = "investment-part";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBookFinances {
    pub budget_estimation: String,
    pub budget_estimation_suggestion: String,
    pub budget_plan_suggestion1: String,
    pub budget_plan_suggestion2: String,
    pub initial1: String,
    pub initial2: String,
    pub initial3: String,
    pub initial4: String,
    pub initial5: String,
    pub initial6: String,
    pub initial7: String,
}

impl BudgetBookFinances {
    pub const FIELD_NAMES: [&'static str; FINANCE_SLOT_COUNT] = [
        "budgetEstimation",
        "budgetEstimationSuggestion",
        "budgetPlanSuggestion1",
        "budgetPlanSuggestion2",
        "initial1",
        "initial2",
        "initial3",
        "initial4",
        "initial5",
        "initial6",
        "initial7",
    ];

    pub fn from_slots(slots: [String; FINANCE_SLOT_COUNT]) -> Self {
        let [budget_estimation, budget_estimation_suggestion, budget_plan_suggestion1, budget_plan_suggestion2, initial1, initial2, initial3, initial4, initial5, initial6, initial7] =
            slots;
        Self {
            budget_estimation,
            budget_estimation_suggestion,
            budget_plan_suggestion1,
            budget_plan_suggestion2,
            initial1,
            initial2,
            initial3,
            initial4,
            initial5,
            initial6,
            initial7,
        }
    }

    pub fn slots(&self) -> [&str; FINANCE_SLOT_COUNT] {
        [
            &self.budget_estimation,
            &self.budget_estimation_suggestion,
            &self.budget_plan_suggestion1,
            &self.budget_plan_suggestion2,
            &self.initial1,
            &self.initial2,
            &self.initial3,
            &self.initial4,
            &self.initial5,
            &self.initial6,
            &self.initial7,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBookSummaryRow {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub row_type: ReportRowType,
    pub finances: BudgetBookFinances,
    pub children: Vec<BudgetBookSummaryRow>,
}

fn is_listed(row: &PlanningRow) -> bool {
    matches!(
        row.row_type,
        PlanningRowType::MasterClass
            | PlanningRowType::Class
            | PlanningRowType::SubClass
            | PlanningRowType::DistrictPreview
            | PlanningRowType::CollectiveSubLevel
    ) && NUMBERED_NAME.is_match(&row.name)
}

fn convert_row(row: &PlanningRow, parent: Option<&str>) -> Option<BudgetBookSummaryRow> {
    if !is_listed(row) {
        return None;
    }

    let slots = std::array::from_fn(|idx| cell_frame_text(row, idx));
    let children = row
        .children
        .iter()
        .filter_map(|child| convert_row(child, Some(row.id.as_str())))
        .collect();

    Some(BudgetBookSummaryRow {
        id: row.id.clone(),
        name: row.name.clone(),
        parent: parent.map(str::to_string),
        row_type: row.row_type.into(),
        finances: BudgetBookFinances::from_slots(slots),
        children,
    })
}

fn investment_part(rows: &[BudgetBookSummaryRow], ctx: &ReportContext<'_>) -> BudgetBookSummaryRow {
    let mut totals = [0.0_f64; FINANCE_SLOT_COUNT];
    for row in rows {
        for (total, value) in totals.iter_mut().zip(row.finances.slots()) {
            *total += parse_formatted(value);
        }
    }

    BudgetBookSummaryRow {
        id: INVESTMENT_PART_ID.to_string(),
        name: ctx.translator.t("report.budgetBookSummary.investmentPart"),
        parent: None,
        row_type: ReportRowType::InvestmentPart,
        finances: BudgetBookFinances::from_slots(totals.map(format_amount)),
        children: Vec::new(),
    }
}

pub(crate) fn convert(rows: &[PlanningRow], ctx: &ReportContext<'_>) -> Vec<BudgetBookSummaryRow> {
    let mut report: Vec<BudgetBookSummaryRow> =
        rows.iter().filter_map(|row| convert_row(row, None)).collect();

    let total = investment_part(&report, ctx);
    report.insert(0, total);
    report
}
