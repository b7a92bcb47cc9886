//! Conversion of the planning row tree into report-specific row trees.
//!
//! Each report has its own row shape and converter; [`ReportRow`] ties them
//! together so callers can hold any report's output in one list.

pub mod budget_book;
pub mod construction_program;
pub mod operational_environment;
pub mod strategy;

pub use budget_book::{BudgetBookFinances, BudgetBookSummaryRow};
pub use construction_program::ConstructionProgramRow;
pub use operational_environment::{OperationalEnvironmentAnalysisRow, OperationalEnvironmentFinances};
pub use strategy::{get_project_phase_per_month, ProjectPhaseCode, StrategyRow};

use crate::calculations::PlanningCell;
use crate::error::Result;
use crate::planning_row::PlanningRow;
use crate::schema::{Category, HierarchyNode, PlanningRowType, Project, YearKey};
use crate::translation::Translator;
use crate::utils::parse_formatted;
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportType {
    Strategy,
    ConstructionProgram,
    BudgetBookSummary,
    OperationalEnvironmentAnalysis,
}

/// Kind of a report row: a planning row type or one of the synthetic rows
/// the converters add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportRowType {
    MasterClass,
    Class,
    SubClass,
    SubClassDistrict,
    CollectiveSubLevel,
    SubLevelDistrict,
    OtherClassification,
    OtherClassificationSubLevel,
    DistrictPreview,
    District,
    Division,
    SubDivision,
    Group,
    GroupWithValues,
    Project,
    InvestmentPart,
    UnderMillionSummary,
    ClassSummary,
    EmptyRow,
    TaeFrame,
    ChangePressure,
    Category,
}

impl From<PlanningRowType> for ReportRowType {
    fn from(row_type: PlanningRowType) -> Self {
        match row_type {
            PlanningRowType::MasterClass => ReportRowType::MasterClass,
            PlanningRowType::Class => ReportRowType::Class,
            PlanningRowType::SubClass => ReportRowType::SubClass,
            PlanningRowType::SubClassDistrict => ReportRowType::SubClassDistrict,
            PlanningRowType::CollectiveSubLevel => ReportRowType::CollectiveSubLevel,
            PlanningRowType::SubLevelDistrict => ReportRowType::SubLevelDistrict,
            PlanningRowType::OtherClassification => ReportRowType::OtherClassification,
            PlanningRowType::OtherClassificationSubLevel => {
                ReportRowType::OtherClassificationSubLevel
            }
            PlanningRowType::DistrictPreview => ReportRowType::DistrictPreview,
            PlanningRowType::District => ReportRowType::District,
            PlanningRowType::Division => ReportRowType::Division,
            PlanningRowType::SubDivision => ReportRowType::SubDivision,
            PlanningRowType::Group => ReportRowType::Group,
            PlanningRowType::Project => ReportRowType::Project,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", content = "row", rename_all = "camelCase")]
pub enum ReportRow {
    Strategy(StrategyRow),
    ConstructionProgram(ConstructionProgramRow),
    BudgetBookSummary(BudgetBookSummaryRow),
    OperationalEnvironmentAnalysis(OperationalEnvironmentAnalysisRow),
}

impl ReportRow {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportRow::Strategy(_) => ReportType::Strategy,
            ReportRow::ConstructionProgram(_) => ReportType::ConstructionProgram,
            ReportRow::BudgetBookSummary(_) => ReportType::BudgetBookSummary,
            ReportRow::OperationalEnvironmentAnalysis(_) => {
                ReportType::OperationalEnvironmentAnalysis
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ReportRow::Strategy(row) => &row.id,
            ReportRow::ConstructionProgram(row) => &row.id,
            ReportRow::BudgetBookSummary(row) => &row.id,
            ReportRow::OperationalEnvironmentAnalysis(row) => &row.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ReportRow::Strategy(row) => &row.name,
            ReportRow::ConstructionProgram(row) => &row.name,
            ReportRow::BudgetBookSummary(row) => &row.name,
            ReportRow::OperationalEnvironmentAnalysis(row) => &row.name,
        }
    }
}

/// Serializable report settings; lookup lists the surrounding app fetches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOptions {
    /// Defaults to today
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub divisions: Vec<HierarchyNode>,
    #[serde(default)]
    pub sub_divisions: Vec<HierarchyNode>,
    #[serde(default)]
    pub projects_in_warranty_phase: Vec<Project>,
}

impl ReportOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn context<'a>(&'a self, translator: &'a dyn Translator) -> ReportContext<'a> {
        ReportContext {
            reference_date: self
                .reference_date
                .unwrap_or_else(|| Local::now().date_naive()),
            translator,
            categories: &self.categories,
            divisions: &self.divisions,
            sub_divisions: &self.sub_divisions,
            projects_in_warranty_phase: &self.projects_in_warranty_phase,
        }
    }
}

/// Everything a converter reads besides the row tree itself.
#[derive(Clone, Copy)]
pub struct ReportContext<'a> {
    pub reference_date: NaiveDate,
    pub translator: &'a dyn Translator,
    pub categories: &'a [Category],
    pub divisions: &'a [HierarchyNode],
    pub sub_divisions: &'a [HierarchyNode],
    pub projects_in_warranty_phase: &'a [Project],
}

impl<'a> ReportContext<'a> {
    pub fn new(reference_date: NaiveDate, translator: &'a dyn Translator) -> Self {
        Self {
            reference_date,
            translator,
            categories: &[],
            divisions: &[],
            sub_divisions: &[],
            projects_in_warranty_phase: &[],
        }
    }

    pub fn year(&self) -> i32 {
        self.reference_date.year()
    }
}

pub fn convert_to_report_rows(
    rows: &[PlanningRow],
    report_type: ReportType,
    ctx: &ReportContext<'_>,
) -> Result<Vec<ReportRow>> {
    debug!(
        "Converting {} planning rows to {:?} report rows",
        rows.len(),
        report_type
    );

    let converted = match report_type {
        ReportType::Strategy => strategy::convert(rows, ctx)?
            .into_iter()
            .map(ReportRow::Strategy)
            .collect(),
        ReportType::ConstructionProgram => construction_program::convert(rows, ctx)
            .into_iter()
            .map(ReportRow::ConstructionProgram)
            .collect(),
        ReportType::BudgetBookSummary => budget_book::convert(rows, ctx)
            .into_iter()
            .map(ReportRow::BudgetBookSummary)
            .collect(),
        ReportType::OperationalEnvironmentAnalysis => operational_environment::convert(rows, ctx)
            .into_iter()
            .map(ReportRow::OperationalEnvironmentAnalysis)
            .collect(),
    };

    Ok(converted)
}

/// Like [`convert_to_report_rows`], but a failed conversion yields no rows.
pub fn get_report_data(
    rows: &[PlanningRow],
    report_type: ReportType,
    ctx: &ReportContext<'_>,
) -> Vec<ReportRow> {
    match convert_to_report_rows(rows, report_type, ctx) {
        Ok(report_rows) => report_rows,
        Err(e) => {
            error!("Failed to build {:?} report data: {}", report_type, e);
            Vec::new()
        }
    }
}

/// Number of yearly values carried by the budget book and analysis reports.
pub const FINANCE_SLOT_COUNT: usize = 11;

/// The cell for the year `offset` years after the base year. Records may
/// skip years, so cells are matched by key rather than position.
pub(crate) fn cell_at(row: &PlanningRow, offset: usize) -> Option<&PlanningCell> {
    let key = YearKey::from_offset(offset)?;
    row.cells.iter().find(|c| c.key == key)
}

pub(crate) fn cell_frame_text(row: &PlanningRow, offset: usize) -> String {
    cell_at(row, offset)
        .map(|c| c.frame_budget.clone())
        .unwrap_or_else(|| "0".to_string())
}

pub(crate) fn cell_planned_text(row: &PlanningRow, offset: usize) -> String {
    cell_at(row, offset)
        .map(|c| c.planned_budget.clone())
        .unwrap_or_else(|| "0".to_string())
}

pub(crate) fn cell_frame(row: &PlanningRow, offset: usize) -> f64 {
    cell_at(row, offset)
        .map(|c| parse_formatted(&c.frame_budget))
        .unwrap_or(0.0)
}

pub(crate) fn cell_planned(row: &PlanningRow, offset: usize) -> f64 {
    cell_at(row, offset)
        .map(|c| parse_formatted(&c.planned_budget))
        .unwrap_or(0.0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::planning_row::{build_planning_row, PlanningRow, RowBuildOptions};
    use crate::schema::{FinanceRecord, HierarchyNode, PlanningRowType, Project, YearKey};

    /// Finance record with the same (frame, planned) pair in every year.
    pub fn flat_finances(frame: f64, planned: f64) -> FinanceRecord {
        YearKey::ALL
            .iter()
            .fold(FinanceRecord::new(2024), |record, key| {
                record.with_year(*key, frame, planned)
            })
    }

    /// Finance record with per-year (frame, planned) pairs.
    pub fn finances(values: &[(f64, f64)]) -> FinanceRecord {
        values
            .iter()
            .zip(YearKey::ALL.iter())
            .fold(FinanceRecord::new(2024), |record, ((frame, planned), key)| {
                record.with_year(*key, *frame, *planned)
            })
    }

    pub fn row(
        id: &str,
        name: &str,
        row_type: PlanningRowType,
        finances: FinanceRecord,
        parent_path: Option<&str>,
        projects: &[Project],
    ) -> PlanningRow {
        let node = HierarchyNode::new(id, name, None).with_finances(finances);
        build_planning_row(
            &node,
            row_type,
            projects,
            RowBuildOptions {
                expanded: false,
                parent_path,
                districts_for_sub_class: None,
            },
        )
    }
}
