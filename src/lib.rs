//! # Planning Report Builder
//!
//! A library for turning capital-budget planning data (classes, locations,
//! groups and projects with their yearly finances) into the hierarchical
//! planning table and the reports exported from it.
//!
//! ## Core Concepts
//!
//! - **Finance Record**: frame and planned budget for the current year and ten forecast years
//! - **Planning Row**: one node of the class or location tree with formatted cells and roll-up sums
//! - **Report Rows**: report-specific projections of the row tree (Strategy, Construction
//!   Program, Budget Book Summary, Operational Environment Analysis)
//! - **CSV Records**: the report trees flattened into ordered, de-duplicated table rows
//!
//! ## Example
//!
//! ```rust,ignore
//! use planning_report_builder::*;
//!
//! let dataset = PlanningDataset::from_json(&std::fs::read_to_string("planning.json")?)?;
//! let options = ReportOptions::from_json(r#"{ "referenceDate": "2024-06-01" }"#)?;
//! let ctx = options.context(&KeyTranslator);
//!
//! let csv = PlanningReportProcessor::export_csv(&dataset, ReportType::BudgetBookSummary, &ctx)?;
//! ```

pub mod calculations;
pub mod error;
pub mod flatten;
pub mod planning_row;
pub mod report;
pub mod schema;
pub mod translation;
pub mod utils;

pub use calculations::{
    calculate_planning_cells, calculate_planning_row_sums, Deviation, PlanningCell,
    PlanningRowSums,
};
pub use error::{PlanningError, Result};
pub use flatten::*;
pub use planning_row::{
    build_planning_row, build_planning_tree, get_sorted_projects, PlanningRow, RowBuildOptions,
    UrlSearchParam,
};
pub use report::{
    convert_to_report_rows, get_report_data, ReportContext, ReportOptions, ReportRow,
    ReportRowType, ReportType,
};
pub use schema::*;
pub use translation::{KeyTranslator, MapTranslator, Translator};
pub use utils::format_number;

use log::{debug, info};

pub struct PlanningReportProcessor;

impl PlanningReportProcessor {
    /// Builds the planning rows and converts them into report rows.
    ///
    /// A conversion failure is logged and produces an empty report.
    pub fn process(
        dataset: &PlanningDataset,
        report_type: ReportType,
        ctx: &ReportContext<'_>,
    ) -> Vec<ReportRow> {
        info!(
            "Building {:?} report for reference date {}",
            report_type, ctx.reference_date
        );
        debug!(
            "Dataset contains {} master classes, {} classes, {} groups and {} projects",
            dataset.master_classes.len(),
            dataset.classes.len(),
            dataset.groups.len(),
            dataset.projects.len()
        );

        let rows = build_planning_tree(dataset, false);
        let report_rows = get_report_data(&rows, report_type, ctx);

        debug!("Report has {} top-level rows", report_rows.len());
        report_rows
    }

    /// Like [`Self::process`], but propagates conversion errors.
    pub fn try_process(
        dataset: &PlanningDataset,
        report_type: ReportType,
        ctx: &ReportContext<'_>,
    ) -> Result<Vec<ReportRow>> {
        let rows = build_planning_tree(dataset, false);
        convert_to_report_rows(&rows, report_type, ctx)
    }

    pub fn flatten(
        dataset: &PlanningDataset,
        report_type: ReportType,
        ctx: &ReportContext<'_>,
    ) -> Vec<CsvRecord> {
        let report_rows = Self::process(dataset, report_type, ctx);
        let records = flatten_report_rows(&report_rows, ctx.translator);
        info!("Flattened {:?} report into {} records", report_type, records.len());
        records
    }

    pub fn export_csv(
        dataset: &PlanningDataset,
        report_type: ReportType,
        ctx: &ReportContext<'_>,
    ) -> Result<String> {
        to_csv_string(&Self::flatten(dataset, report_type, ctx))
    }
}

pub fn process_report(
    dataset: &PlanningDataset,
    report_type: ReportType,
    ctx: &ReportContext<'_>,
) -> Vec<ReportRow> {
    PlanningReportProcessor::process(dataset, report_type, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dataset() -> PlanningDataset {
        let finances = FinanceRecord::new(2024)
            .with_year(YearKey::BudgetProposalCurrentYearPlus0, 2000.0, 1500.0)
            .with_year(YearKey::BudgetProposalCurrentYearPlus1, 3000.0, 1000.0);

        let mut project = Project::new("p1", "Kruunusillat");
        project.project_class = Some("c1".to_string());
        project.planning_start_year = Some(2023);
        project.construction_end_year = Some(2026);
        project.cost_forecast = Some(25_000.0);
        project.finances = ProjectFinances::new(2024)
            .with_budget(YearKey::BudgetProposalCurrentYearPlus0, 1500.0)
            .with_budget(YearKey::BudgetProposalCurrentYearPlus1, 1000.0);

        PlanningDataset {
            master_classes: vec![
                HierarchyNode::new("m1", "8 03 Kadut ja liikenneväylät", None)
                    .with_finances(finances.clone()),
            ],
            classes: vec![
                HierarchyNode::new("c1", "8 03 01 Uudisrakentaminen", Some("m1"))
                    .with_finances(finances),
            ],
            projects: vec![project],
            ..PlanningDataset::default()
        }
    }

    #[test]
    fn test_end_to_end_budget_book() {
        let ctx = ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator);
        let records =
            PlanningReportProcessor::flatten(&dataset(), ReportType::BudgetBookSummary, &ctx);

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].get("report.budgetBookSummary.target"),
            Some("report.budgetBookSummary.investmentPart")
        );
        assert_eq!(
            records[0].get("report.budgetBookSummary.budgetEstimation"),
            Some("2 000")
        );
    }

    #[test]
    fn test_end_to_end_construction_program_csv() {
        let ctx = ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator);
        let csv =
            PlanningReportProcessor::export_csv(&dataset(), ReportType::ConstructionProgram, &ctx)
                .unwrap();

        assert!(csv.contains("Kruunusillat"));
        assert!(csv.contains("25 000"));
        assert!(csv.contains("report.constructionProgram.underMillionSummary"));
    }

    #[test]
    fn test_try_process_matches_process() {
        let ctx = ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator);
        let data = dataset();
        assert_eq!(
            PlanningReportProcessor::try_process(&data, ReportType::Strategy, &ctx).unwrap(),
            process_report(&data, ReportType::Strategy, &ctx)
        );
    }
}
