use super::{cell_frame, cell_planned, ReportContext, ReportRowType};
use crate::planning_row::PlanningRow;
use crate::schema::{HierarchyNode, PlanningRowType, Project, YearKey};
use crate::utils::{format_amount, format_number, parse_formatted, years_overlap};
use serde::{Deserialize, Serialize};

/// Projects and groups below this cost forecast (thousands of euros) are
/// only counted in the under-million summary row.
pub const MILLION_THRESHOLD: f64 = 1000.0;

const HEADER_ONLY_GROUP_PREFIXES: [&str; 3] = ["8 01", "8 04", "8 08"];

/// Class paths that close with under-million, summary and spacer rows.
pub const CLASSES_WITH_SUMMARY_ROWS: [&str; 17] = [
    "8 01 Kiinteä omaisuus/Esirakentaminen",
    "8 01 Kiinteä omaisuus/Kiinteistöjen hankinta",
    "8 03 Kadut ja liikenneväylät/8 03 01 Uudisrakentaminen",
    "8 03 Kadut ja liikenneväylät/8 03 02 Perusparantaminen ja liikennejärjestelyt",
    "8 03 Kadut ja liikenneväylät/8 03 03 Laiturit ja satamat",
    "8 03 Kadut ja liikenneväylät/8 03 04 Joukkoliikenteen kehittäminen",
    "8 04 Puistot ja liikunta-alueet/8 04 01 Uudisrakentaminen",
    "8 04 Puistot ja liikunta-alueet/8 04 02 Perusparantaminen",
    "8 04 Puistot ja liikunta-alueet/8 04 03 Liikuntapaikat",
    "8 04 Puistot ja liikunta-alueet/8 04 04 Ulkoilualueet",
    "8 04 Puistot ja liikunta-alueet/8 04 05 Virkistysalueet",
    "8 08 Projektialueiden infrarakentaminen/8 08 01 Kalasatama",
    "8 08 Projektialueiden infrarakentaminen/8 08 02 Jätkäsaari",
    "8 08 Projektialueiden infrarakentaminen/8 08 03 Kruunuvuorenranta",
    "8 08 Projektialueiden infrarakentaminen/8 08 04 Pasila",
    "8 08 Projektialueiden infrarakentaminen/8 08 05 Kuninkaantammi",
    "8 08 Projektialueiden infrarakentaminen/8 08 06 Malmi",
];

/// Offsets of the three budget years following the current year.
const NEXT_YEARS: [usize; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionProgramRow {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub row_type: ReportRowType,
    pub location: String,
    pub cost_forecast: String,
    pub start_and_end: String,
    pub budget_proposal_current_year_plus1: String,
    pub budget_proposal_current_year_plus2: String,
    pub budget_proposal_current_year_plus3: String,
    pub projects: Vec<ConstructionProgramRow>,
    pub children: Vec<ConstructionProgramRow>,
}

impl ConstructionProgramRow {
    fn blank(id: String, name: String, parent: Option<String>, row_type: ReportRowType) -> Self {
        Self {
            id,
            name,
            parent,
            row_type,
            location: String::new(),
            cost_forecast: String::new(),
            start_and_end: String::new(),
            budget_proposal_current_year_plus1: String::new(),
            budget_proposal_current_year_plus2: String::new(),
            budget_proposal_current_year_plus3: String::new(),
            projects: Vec::new(),
            children: Vec::new(),
        }
    }

    fn with_values(mut self, values: [f64; 3]) -> Self {
        let [plus1, plus2, plus3] = values.map(format_amount);
        self.budget_proposal_current_year_plus1 = plus1;
        self.budget_proposal_current_year_plus2 = plus2;
        self.budget_proposal_current_year_plus3 = plus3;
        self
    }

    pub fn values(&self) -> [&str; 3] {
        [
            &self.budget_proposal_current_year_plus1,
            &self.budget_proposal_current_year_plus2,
            &self.budget_proposal_current_year_plus3,
        ]
    }

    fn has_own_values(&self) -> bool {
        self.values().iter().any(|v| !v.is_empty())
    }
}

fn next_year_budgets(project: &Project) -> [f64; 3] {
    NEXT_YEARS.map(|offset| {
        YearKey::from_offset(offset)
            .map(|key| project.budget(key))
            .unwrap_or(0.0)
    })
}

fn has_next_year_values(values: &[f64; 3]) -> bool {
    values.iter().any(|v| *v != 0.0)
}

fn project_span(project: &Project) -> Option<(i32, i32)> {
    project.planning_start_year.zip(project.construction_end_year)
}

fn is_project_on_program(project: &Project, window: (i32, i32)) -> bool {
    project.cost_forecast.unwrap_or(0.0) >= MILLION_THRESHOLD
        && project_span(project)
            .is_some_and(|(start, end)| years_overlap(start, end, window.0, window.1))
        && has_next_year_values(&next_year_budgets(project))
}

fn location_name(project: &Project, ctx: &ReportContext<'_>) -> String {
    let Some(location_id) = project.project_location.as_deref() else {
        return String::new();
    };
    let find = |nodes: &[HierarchyNode]| {
        nodes
            .iter()
            .find(|n| n.id == location_id)
            .map(|n| n.name.clone())
    };
    find(ctx.divisions)
        .or_else(|| find(ctx.sub_divisions))
        .unwrap_or_default()
}

fn project_row(project: &Project, parent_id: &str, ctx: &ReportContext<'_>) -> ConstructionProgramRow {
    let mut row = ConstructionProgramRow::blank(
        project.id.clone(),
        project.name.clone(),
        Some(parent_id.to_string()),
        ReportRowType::Project,
    )
    .with_values(next_year_budgets(project));

    row.location = location_name(project, ctx);
    row.cost_forecast = format_number(project.cost_forecast);
    row.start_and_end = project_span(project)
        .map(|(start, end)| format!("{}-{}", start, end))
        .unwrap_or_default();
    row
}

fn program_projects(
    row: &PlanningRow,
    window: (i32, i32),
    ctx: &ReportContext<'_>,
) -> Vec<ConstructionProgramRow> {
    row.project_rows
        .iter()
        .filter(|p| is_project_on_program(p, window))
        .map(|p| project_row(p, &row.id, ctx))
        .collect()
}

fn is_header_only_group(row: &PlanningRow) -> bool {
    HEADER_ONLY_GROUP_PREFIXES
        .iter()
        .any(|prefix| row.path.starts_with(prefix))
}

fn group_row(
    row: &PlanningRow,
    parent: Option<&str>,
    window: (i32, i32),
    ctx: &ReportContext<'_>,
) -> Option<ConstructionProgramRow> {
    if is_header_only_group(row) {
        let mut header = ConstructionProgramRow::blank(
            row.id.clone(),
            row.name.clone(),
            parent.map(str::to_string),
            ReportRowType::Group,
        );
        header.projects = program_projects(row, window, ctx);
        return Some(header);
    }

    let span = row
        .project_rows
        .iter()
        .filter_map(project_span)
        .reduce(|(start, end), (s, e)| (start.min(s), end.max(e)))?;
    let cost_estimate = parse_formatted(&row.cost_estimate_budget);
    let own_values = NEXT_YEARS.map(|idx| cell_planned(row, idx));
    let has_values = has_next_year_values(&own_values)
        || row
            .project_rows
            .iter()
            .any(|p| has_next_year_values(&next_year_budgets(p)));

    if cost_estimate < MILLION_THRESHOLD
        || !years_overlap(span.0, span.1, window.0, window.1)
        || !has_values
    {
        return None;
    }

    let mut group = ConstructionProgramRow::blank(
        row.id.clone(),
        row.name.clone(),
        parent.map(str::to_string),
        ReportRowType::GroupWithValues,
    )
    .with_values(own_values);
    group.cost_forecast = row.cost_estimate_budget.clone();
    group.start_and_end = format!("{}-{}", span.0, span.1);
    Some(group)
}

/// Sum of what a row shows for one year, looking through rows that only
/// act as headers.
fn visible_total(row: &ConstructionProgramRow, idx: usize) -> f64 {
    if row.has_own_values() {
        return parse_formatted(row.values()[idx]);
    }
    row.projects
        .iter()
        .chain(row.children.iter())
        .map(|r| visible_total(r, idx))
        .sum()
}

fn summary_rows(
    row: &PlanningRow,
    class_row: &ConstructionProgramRow,
    ctx: &ReportContext<'_>,
) -> Vec<ConstructionProgramRow> {
    let frame = NEXT_YEARS.map(|idx| cell_frame(row, idx));

    let mut under_million = [0.0; 3];
    for (slot, (idx, class_frame)) in under_million.iter_mut().zip(frame.iter().enumerate()) {
        let shown: f64 = class_row
            .projects
            .iter()
            .chain(class_row.children.iter())
            .map(|r| visible_total(r, idx))
            .sum();
        *slot = class_frame - shown;
    }

    vec![
        ConstructionProgramRow::blank(
            format!("{}-under-million-summary", row.id),
            ctx.translator.t("report.constructionProgram.underMillionSummary"),
            Some(row.id.clone()),
            ReportRowType::UnderMillionSummary,
        )
        .with_values(under_million),
        ConstructionProgramRow::blank(
            format!("{}-class-summary", row.id),
            ctx.translator.translate(
                "report.constructionProgram.classSummary",
                &[("name", row.name.as_str())],
            ),
            Some(row.id.clone()),
            ReportRowType::ClassSummary,
        )
        .with_values(frame),
        ConstructionProgramRow::blank(
            format!("{}-empty-row", row.id),
            String::new(),
            Some(row.id.clone()),
            ReportRowType::EmptyRow,
        ),
    ]
}

fn convert_row(
    row: &PlanningRow,
    parent: Option<&str>,
    window: (i32, i32),
    ctx: &ReportContext<'_>,
) -> Option<ConstructionProgramRow> {
    if row.row_type == PlanningRowType::Group {
        return group_row(row, parent, window, ctx);
    }

    let mut converted = ConstructionProgramRow::blank(
        row.id.clone(),
        row.name.clone(),
        parent.map(str::to_string),
        row.row_type.into(),
    )
    .with_values(NEXT_YEARS.map(|idx| cell_frame(row, idx)));

    converted.projects = program_projects(row, window, ctx);
    converted.children = row
        .children
        .iter()
        .filter_map(|child| convert_row(child, Some(row.id.as_str()), window, ctx))
        .collect();

    if CLASSES_WITH_SUMMARY_ROWS.contains(&row.path.as_str()) {
        let trailers = summary_rows(row, &converted, ctx);
        converted.children.extend(trailers);
    }

    Some(converted)
}

pub(crate) fn convert(rows: &[PlanningRow], ctx: &ReportContext<'_>) -> Vec<ConstructionProgramRow> {
    let next_year = ctx.year() + 1;
    let window = (next_year, next_year + 2);

    rows.iter()
        .filter_map(|row| convert_row(row, None, window, ctx))
        .collect()
}

/// Whether a converted row ends up in the exported program.
pub fn is_shown_on_the_report(row: &ConstructionProgramRow) -> bool {
    matches!(
        row.row_type,
        ReportRowType::Group
            | ReportRowType::GroupWithValues
            | ReportRowType::Project
            | ReportRowType::UnderMillionSummary
            | ReportRowType::ClassSummary
    ) || !row.projects.is_empty()
        || row.name.is_empty()
        || row.children.iter().any(is_shown_on_the_report)
}
