//! Flattening of report trees into CSV-ready records.
//!
//! Every flattener walks its tree pre-order (row, its projects, then its
//! children) and keeps only the first record seen for each id.

use crate::error::Result;
use crate::report::{
    construction_program::is_shown_on_the_report, BudgetBookFinances, BudgetBookSummaryRow,
    ConstructionProgramRow, OperationalEnvironmentAnalysisRow, OperationalEnvironmentFinances,
    ReportRow, ReportRowType, StrategyRow,
};
use crate::translation::Translator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

const MONTH_KEYS: [&str; 12] = [
    "months.january",
    "months.february",
    "months.march",
    "months.april",
    "months.may",
    "months.june",
    "months.july",
    "months.august",
    "months.september",
    "months.october",
    "months.november",
    "months.december",
];

/// One exported line: localised column header -> value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRecord {
    pub columns: Vec<(String, String)>,
}

impl CsvRecord {
    fn push(&mut self, header: String, value: impl Into<String>) {
        self.columns.push((header, value.into()));
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(h, _)| h.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }
}

/// Tree shape shared by all report rows.
pub trait ReportTreeRow: Sized {
    fn id(&self) -> &str;

    fn children(&self) -> &[Self];

    fn projects(&self) -> &[Self] {
        &[]
    }
}

impl ReportTreeRow for StrategyRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn projects(&self) -> &[Self] {
        &self.projects
    }
}

impl ReportTreeRow for ConstructionProgramRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn projects(&self) -> &[Self] {
        &self.projects
    }
}

impl ReportTreeRow for BudgetBookSummaryRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl ReportTreeRow for OperationalEnvironmentAnalysisRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Accumulator for a single flatten call.
#[derive(Default)]
struct FlattenAccumulator {
    seen: HashSet<String>,
    records: Vec<CsvRecord>,
}

impl FlattenAccumulator {
    fn walk<R: ReportTreeRow>(
        &mut self,
        row: &R,
        include: &dyn Fn(&R) -> bool,
        to_record: &dyn Fn(&R) -> CsvRecord,
    ) {
        if include(row) && self.seen.insert(row.id().to_string()) {
            self.records.push(to_record(row));
        }
        for project in row.projects() {
            self.walk(project, include, to_record);
        }
        for child in row.children() {
            self.walk(child, include, to_record);
        }
    }
}

fn flatten_tree<R: ReportTreeRow>(
    rows: &[R],
    include: &dyn Fn(&R) -> bool,
    to_record: &dyn Fn(&R) -> CsvRecord,
) -> Vec<CsvRecord> {
    let mut acc = FlattenAccumulator::default();
    for row in rows {
        acc.walk(row, include, to_record);
    }
    acc.records
}

pub fn flatten_budget_book_summary_table_rows(
    rows: &[BudgetBookSummaryRow],
    t: &dyn Translator,
) -> Vec<CsvRecord> {
    let name_header = t.t("report.budgetBookSummary.target");
    let slot_headers = BudgetBookFinances::FIELD_NAMES
        .map(|field| t.t(&format!("report.budgetBookSummary.{}", field)));

    flatten_tree(rows, &|_| true, &|row| {
        let mut record = CsvRecord::default();
        record.push(name_header.clone(), row.name.as_str());
        for (header, value) in slot_headers.iter().zip(row.finances.slots()) {
            record.push(header.clone(), value);
        }
        record
    })
}

pub fn flatten_strategy_table_rows(rows: &[StrategyRow], t: &dyn Translator) -> Vec<CsvRecord> {
    let headers = [
        t.t("report.strategy.projectNameTitle"),
        t.t("report.strategy.projectManagerTitle"),
        t.t("report.strategy.projectPhaseTitle"),
        t.t("report.strategy.costPlanTitle"),
        t.t("report.strategy.costForecastTitle"),
    ];
    let month_headers = MONTH_KEYS.map(|key| t.t(key));

    flatten_tree(rows, &|_| true, &|row| {
        let mut record = CsvRecord::default();
        let values = [
            row.name.as_str(),
            row.project_manager.as_str(),
            row.project_phase.as_str(),
            row.cost_plan.as_str(),
            row.cost_forecast.as_str(),
        ];
        for (header, value) in headers.iter().zip(values) {
            record.push(header.clone(), value);
        }
        for (header, phase) in month_headers.iter().zip(row.months) {
            record.push(header.clone(), phase.as_str());
        }
        record
    })
}

pub fn flatten_construction_program_table_rows(
    rows: &[ConstructionProgramRow],
    t: &dyn Translator,
) -> Vec<CsvRecord> {
    let headers = [
        t.t("report.constructionProgram.nameTitle"),
        t.t("report.constructionProgram.locationTitle"),
        t.t("report.constructionProgram.costForecastTitle"),
        t.t("report.constructionProgram.startAndEndTitle"),
        t.t("report.constructionProgram.budgetProposalCurrentYearPlus1"),
        t.t("report.constructionProgram.budgetProposalCurrentYearPlus2"),
        t.t("report.constructionProgram.budgetProposalCurrentYearPlus3"),
    ];

    let include = |row: &ConstructionProgramRow| {
        !matches!(
            row.row_type,
            ReportRowType::SubClassDistrict | ReportRowType::Division
        ) && is_shown_on_the_report(row)
    };

    flatten_tree(rows, &include, &|row| {
        let [plus1, plus2, plus3] = row.values();
        let values = [
            row.name.as_str(),
            row.location.as_str(),
            row.cost_forecast.as_str(),
            row.start_and_end.as_str(),
            plus1,
            plus2,
            plus3,
        ];
        let mut record = CsvRecord::default();
        for (header, value) in headers.iter().zip(values) {
            record.push(header.clone(), value);
        }
        record
    })
}

pub fn flatten_operational_environment_analysis_table_rows(
    rows: &[OperationalEnvironmentAnalysisRow],
    t: &dyn Translator,
) -> Vec<CsvRecord> {
    let name_header = t.t("report.operationalEnvironmentAnalysis.target");
    let slot_headers = OperationalEnvironmentFinances::FIELD_NAMES
        .map(|field| t.t(&format!("report.operationalEnvironmentAnalysis.{}", field)));

    flatten_tree(rows, &|_| true, &|row| {
        let mut record = CsvRecord::default();
        record.push(name_header.clone(), row.name.as_str());
        for (header, value) in slot_headers.iter().zip(row.finances.slots()) {
            record.push(header.clone(), value);
        }
        record
    })
}

/// Flattens a converted report. Rows of other reports than the first row's
/// are ignored.
pub fn flatten_report_rows(rows: &[ReportRow], t: &dyn Translator) -> Vec<CsvRecord> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    match first {
        ReportRow::Strategy(_) => {
            let rows: Vec<StrategyRow> = rows
                .iter()
                .filter_map(|r| match r {
                    ReportRow::Strategy(row) => Some(row.clone()),
                    _ => None,
                })
                .collect();
            flatten_strategy_table_rows(&rows, t)
        }
        ReportRow::ConstructionProgram(_) => {
            let rows: Vec<ConstructionProgramRow> = rows
                .iter()
                .filter_map(|r| match r {
                    ReportRow::ConstructionProgram(row) => Some(row.clone()),
                    _ => None,
                })
                .collect();
            flatten_construction_program_table_rows(&rows, t)
        }
        ReportRow::BudgetBookSummary(_) => {
            let rows: Vec<BudgetBookSummaryRow> = rows
                .iter()
                .filter_map(|r| match r {
                    ReportRow::BudgetBookSummary(row) => Some(row.clone()),
                    _ => None,
                })
                .collect();
            flatten_budget_book_summary_table_rows(&rows, t)
        }
        ReportRow::OperationalEnvironmentAnalysis(_) => {
            let rows: Vec<OperationalEnvironmentAnalysisRow> = rows
                .iter()
                .filter_map(|r| match r {
                    ReportRow::OperationalEnvironmentAnalysis(row) => Some(row.clone()),
                    _ => None,
                })
                .collect();
            flatten_operational_environment_analysis_table_rows(&rows, t)
        }
    }
}

/// Writes records as CSV; the header row comes from the first record.
pub fn write_csv<W: Write>(records: &[CsvRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if let Some(first) = records.first() {
        csv_writer.write_record(first.headers())?;
    }
    for record in records {
        csv_writer.write_record(record.values())?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[CsvRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ProjectPhaseCode;
    use crate::translation::{KeyTranslator, MapTranslator};

    fn oea_row(id: &str, name: &str, children: Vec<OperationalEnvironmentAnalysisRow>) -> OperationalEnvironmentAnalysisRow {
        OperationalEnvironmentAnalysisRow {
            id: id.to_string(),
            name: name.to_string(),
            parent: None,
            row_type: ReportRowType::Class,
            finances: OperationalEnvironmentFinances::default(),
            children,
        }
    }

    fn strategy_row(id: &str, name: &str, projects: Vec<StrategyRow>, children: Vec<StrategyRow>) -> StrategyRow {
        StrategyRow {
            id: id.to_string(),
            name: name.to_string(),
            parent: None,
            row_type: ReportRowType::Class,
            project_manager: String::new(),
            project_phase: String::new(),
            cost_plan: "0".to_string(),
            cost_forecast: "0".to_string(),
            months: [ProjectPhaseCode::Idle; 12],
            projects,
            children,
        }
    }

    #[test]
    fn test_duplicate_ids_keep_first_preorder_occurrence() {
        let rows = vec![
            oea_row("a", "first a", vec![oea_row("b", "first b", vec![])]),
            oea_row("c", "c", vec![oea_row("b", "second b", vec![]), oea_row("a", "second a", vec![])]),
        ];
        let records = flatten_operational_environment_analysis_table_rows(&rows, &KeyTranslator);

        let names: Vec<&str> = records
            .iter()
            .map(|r| r.get("report.operationalEnvironmentAnalysis.target").unwrap())
            .collect();
        assert_eq!(names, vec!["first a", "first b", "c"]);
    }

    #[test]
    fn test_repeated_calls_do_not_share_state() {
        let rows = vec![oea_row("a", "a", vec![])];
        let first = flatten_operational_environment_analysis_table_rows(&rows, &KeyTranslator);
        let second = flatten_operational_environment_analysis_table_rows(&rows, &KeyTranslator);
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_projects_come_before_children() {
        let mut project = strategy_row("p1", "Project", vec![], vec![]);
        project.row_type = ReportRowType::Project;
        project.months[5] = ProjectPhaseCode::Construction;
        let rows = vec![strategy_row(
            "c1",
            "Class",
            vec![project],
            vec![strategy_row("c2", "Child", vec![], vec![])],
        )];

        let records = flatten_strategy_table_rows(&rows, &KeyTranslator);
        let names: Vec<&str> = records
            .iter()
            .map(|r| r.get("report.strategy.projectNameTitle").unwrap())
            .collect();
        assert_eq!(names, vec!["Class", "Project", "Child"]);
        assert_eq!(records[1].get("months.june"), Some("construction"));
        assert_eq!(records[1].columns.len(), 17);
    }

    #[test]
    fn test_headers_are_localised() {
        let translator = MapTranslator::default()
            .with_entry("report.budgetBookSummary.target", "Kohde")
            .with_entry("report.budgetBookSummary.budgetEstimation", "TA 2024");
        let rows = vec![BudgetBookSummaryRow {
            id: "m1".to_string(),
            name: "8 03 Kadut".to_string(),
            parent: None,
            row_type: ReportRowType::MasterClass,
            finances: BudgetBookFinances {
                budget_estimation: "1 000".to_string(),
                ..BudgetBookFinances::default()
            },
            children: vec![],
        }];

        let records = flatten_budget_book_summary_table_rows(&rows, &translator);
        assert_eq!(records[0].get("Kohde"), Some("8 03 Kadut"));
        assert_eq!(records[0].get("TA 2024"), Some("1 000"));
        assert_eq!(records[0].columns.len(), 12);
    }

    fn program_row(id: &str, name: &str, row_type: ReportRowType) -> ConstructionProgramRow {
        ConstructionProgramRow {
            id: id.to_string(),
            name: name.to_string(),
            parent: None,
            row_type,
            location: String::new(),
            cost_forecast: String::new(),
            start_and_end: String::new(),
            budget_proposal_current_year_plus1: "1".to_string(),
            budget_proposal_current_year_plus2: "2".to_string(),
            budget_proposal_current_year_plus3: "3".to_string(),
            projects: vec![],
            children: vec![],
        }
    }

    #[test]
    fn test_construction_program_skips_hidden_rows() {
        let mut division = program_row("v1", "Vuosaari", ReportRowType::Division);
        division.projects = vec![program_row("p1", "Silta", ReportRowType::Project)];

        let mut class = program_row("c1", "8 03 01 Uudisrakentaminen", ReportRowType::Class);
        class.children = vec![
            division,
            program_row("c2", "Tyhjä luokka", ReportRowType::Class),
            program_row("c1-empty-row", "", ReportRowType::EmptyRow),
        ];

        let records = flatten_construction_program_table_rows(&[class], &KeyTranslator);
        let names: Vec<&str> = records
            .iter()
            .map(|r| r.get("report.constructionProgram.nameTitle").unwrap())
            .collect();
        assert_eq!(names, vec!["8 03 01 Uudisrakentaminen", "Silta", ""]);
    }

    #[test]
    fn test_to_csv_string() {
        let rows = vec![oea_row("a", "Kadut, sillat", vec![])];
        let records = flatten_operational_environment_analysis_table_rows(&rows, &KeyTranslator);
        let csv = to_csv_string(&records).unwrap();

        let mut lines = csv.lines();
        assert!(lines
            .next()
            .unwrap()
            .starts_with("report.operationalEnvironmentAnalysis.target,"));
        assert!(lines.next().unwrap().starts_with("\"Kadut, sillat\","));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_flatten_report_rows_dispatches() {
        let rows = vec![ReportRow::OperationalEnvironmentAnalysis(oea_row("a", "a", vec![]))];
        assert_eq!(flatten_report_rows(&rows, &KeyTranslator).len(), 1);
        assert!(flatten_report_rows(&[], &KeyTranslator).is_empty());
    }
}
