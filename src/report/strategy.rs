use super::{cell_frame_text, cell_planned_text, ReportContext, ReportRowType};
use crate::error::Result;
use crate::planning_row::PlanningRow;
use crate::schema::{Project, YearKey};
use crate::utils::{format_amount, format_number, months_within_year, parse_optional_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What happens in a project during one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectPhaseCode {
    #[default]
    #[serde(rename = "")]
    Idle,
    #[serde(rename = "planning")]
    Planning,
    #[serde(rename = "construction")]
    Construction,
    #[serde(rename = "planningAndConstruction")]
    PlanningAndConstruction,
}

impl ProjectPhaseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectPhaseCode::Idle => "",
            ProjectPhaseCode::Planning => "planning",
            ProjectPhaseCode::Construction => "construction",
            ProjectPhaseCode::PlanningAndConstruction => "planningAndConstruction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRow {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub row_type: ReportRowType,
    pub project_manager: String,
    pub project_phase: String,
    pub cost_plan: String,
    pub cost_forecast: String,
    /// Phase per calendar month, January first
    pub months: [ProjectPhaseCode; 12],
    pub projects: Vec<StrategyRow>,
    pub children: Vec<StrategyRow>,
}

fn span(
    start_field: &str,
    start: Option<&str>,
    end_field: &str,
    end: Option<&str>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let start = parse_optional_date(start_field, start)?;
    let end = parse_optional_date(end_field, end)?;
    Ok(start.zip(end))
}

fn span_covers(span: Option<(NaiveDate, NaiveDate)>, month: u32, year: i32) -> bool {
    span.and_then(|(start, end)| months_within_year(start, end, year))
        .is_some_and(|(first, last)| (first..=last).contains(&month))
}

/// Phase of `project` in `month` (1-12) of `year`.
pub fn get_project_phase_per_month(
    project: &Project,
    month: u32,
    year: i32,
) -> Result<ProjectPhaseCode> {
    let planning = span(
        "estPlanningStart",
        project.est_planning_start.as_deref(),
        "estPlanningEnd",
        project.est_planning_end.as_deref(),
    )?;
    let construction = span(
        "estConstructionStart",
        project.est_construction_start.as_deref(),
        "estConstructionEnd",
        project.est_construction_end.as_deref(),
    )?;

    let code = match (
        span_covers(planning, month, year),
        span_covers(construction, month, year),
    ) {
        (true, true) => ProjectPhaseCode::PlanningAndConstruction,
        (true, false) => ProjectPhaseCode::Planning,
        (false, true) => ProjectPhaseCode::Construction,
        (false, false) => ProjectPhaseCode::Idle,
    };

    Ok(code)
}

fn is_active_in_year(project: &Project, year: i32) -> bool {
    match (project.planning_start_year, project.construction_end_year) {
        (Some(start), Some(end)) => (start..=end).contains(&year),
        _ => false,
    }
}

fn project_row(project: &Project, parent_id: &str, year: i32) -> Result<StrategyRow> {
    let mut months = [ProjectPhaseCode::Idle; 12];
    for (idx, slot) in months.iter_mut().enumerate() {
        *slot = get_project_phase_per_month(project, idx as u32 + 1, year)?;
    }

    Ok(StrategyRow {
        id: project.id.clone(),
        name: project.name.clone(),
        parent: Some(parent_id.to_string()),
        row_type: ReportRowType::Project,
        project_manager: project.project_manager.clone().unwrap_or_default(),
        project_phase: project.phase.clone().unwrap_or_default(),
        cost_plan: format_number(project.cost_forecast),
        cost_forecast: format_amount(project.budget(YearKey::BudgetProposalCurrentYearPlus0)),
        months,
        projects: Vec::new(),
        children: Vec::new(),
    })
}

fn convert_row(row: &PlanningRow, parent: Option<&str>, year: i32) -> Result<StrategyRow> {
    let projects = row
        .project_rows
        .iter()
        .filter(|p| is_active_in_year(p, year))
        .map(|p| project_row(p, &row.id, year))
        .collect::<Result<Vec<_>>>()?;

    let children = row
        .children
        .iter()
        .map(|child| convert_row(child, Some(row.id.as_str()), year))
        .collect::<Result<Vec<_>>>()?;

    Ok(StrategyRow {
        id: row.id.clone(),
        name: row.name.clone(),
        parent: parent.map(str::to_string),
        row_type: row.row_type.into(),
        project_manager: String::new(),
        project_phase: String::new(),
        cost_plan: cell_frame_text(row, 0),
        cost_forecast: cell_planned_text(row, 0),
        months: [ProjectPhaseCode::Idle; 12],
        projects,
        children,
    })
}

pub(crate) fn convert(rows: &[PlanningRow], ctx: &ReportContext<'_>) -> Result<Vec<StrategyRow>> {
    let year = ctx.year();
    rows.iter().map(|row| convert_row(row, None, year)).collect()
}
