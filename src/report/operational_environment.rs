use super::{cell_frame, cell_frame_text, cell_planned, ReportContext, ReportRowType, FINANCE_SLOT_COUNT};
use crate::planning_row::PlanningRow;
use crate::schema::{Category, Project, YearKey};
use crate::utils::{format_amount, parse_formatted};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FOURTH_LEVEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9] [0-9]{2} [0-9]{2} [0-9]{2}").expect("fourth level name pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalEnvironmentFinances {
    pub cost_forecast: String,
    #[serde(rename = "TAE")]
    pub tae: String,
    #[serde(rename = "TSE1")]
    pub tse1: String,
    #[serde(rename = "TSE2")]
    pub tse2: String,
    pub initial1: String,
    pub initial2: String,
    pub initial3: String,
    pub initial4: String,
    pub initial5: String,
    pub initial6: String,
    pub initial7: String,
}

impl OperationalEnvironmentFinances {
    pub const FIELD_NAMES: [&'static str; FINANCE_SLOT_COUNT] = [
        "costForecast",
        "TAE",
        "TSE1",
        "TSE2",
        "initial1",
        "initial2",
        "initial3",
        "initial4",
        "initial5",
        "initial6",
        "initial7",
    ];

    pub fn from_slots(slots: [String; FINANCE_SLOT_COUNT]) -> Self {
        let [cost_forecast, tae, tse1, tse2, initial1, initial2, initial3, initial4, initial5, initial6, initial7] =
            slots;
        Self {
            cost_forecast,
            tae,
            tse1,
            tse2,
            initial1,
            initial2,
            initial3,
            initial4,
            initial5,
            initial6,
            initial7,
        }
    }

    fn from_values(values: [f64; FINANCE_SLOT_COUNT]) -> Self {
        Self::from_slots(values.map(format_amount))
    }

    pub fn slots(&self) -> [&str; FINANCE_SLOT_COUNT] {
        [
            &self.cost_forecast,
            &self.tae,
            &self.tse1,
            &self.tse2,
            &self.initial1,
            &self.initial2,
            &self.initial3,
            &self.initial4,
            &self.initial5,
            &self.initial6,
            &self.initial7,
        ]
    }

    fn values(&self) -> [f64; FINANCE_SLOT_COUNT] {
        self.slots().map(parse_formatted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalEnvironmentAnalysisRow {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub row_type: ReportRowType,
    pub finances: OperationalEnvironmentFinances,
    pub children: Vec<OperationalEnvironmentAnalysisRow>,
}

impl OperationalEnvironmentAnalysisRow {
    fn synthetic(
        id: String,
        name: String,
        parent: &str,
        row_type: ReportRowType,
        finances: OperationalEnvironmentFinances,
    ) -> Self {
        Self {
            id,
            name,
            parent: Some(parent.to_string()),
            row_type,
            finances,
            children: Vec::new(),
        }
    }
}

fn planned_values(row: &PlanningRow) -> [f64; FINANCE_SLOT_COUNT] {
    std::array::from_fn(|idx| cell_planned(row, idx))
}

fn frame_values(row: &PlanningRow) -> [f64; FINANCE_SLOT_COUNT] {
    std::array::from_fn(|idx| cell_frame(row, idx))
}

fn project_values(project: &Project) -> [f64; FINANCE_SLOT_COUNT] {
    std::array::from_fn(|idx| {
        YearKey::from_offset(idx)
            .map(|key| project.budget(key))
            .unwrap_or(0.0)
    })
}

fn subtree_projects(row: &PlanningRow) -> Vec<&Project> {
    row.descendants()
        .into_iter()
        .flat_map(|r| r.project_rows.iter())
        .collect()
}

fn tae_frame_row(row: &PlanningRow, ctx: &ReportContext<'_>) -> OperationalEnvironmentAnalysisRow {
    let mut slots: [String; FINANCE_SLOT_COUNT] = std::array::from_fn(|idx| cell_frame_text(row, idx));
    // The last plan year repeats the one before it
    slots[10] = cell_frame_text(row, 9);

    OperationalEnvironmentAnalysisRow::synthetic(
        format!("{}-tae-frame", row.id),
        ctx.translator.t("report.operationalEnvironmentAnalysis.taeFrame"),
        &row.id,
        ReportRowType::TaeFrame,
        OperationalEnvironmentFinances::from_slots(slots),
    )
}

fn change_pressure_row(row: &PlanningRow, ctx: &ReportContext<'_>) -> OperationalEnvironmentAnalysisRow {
    let frame = frame_values(row);
    let planned = planned_values(row);
    let pressure = std::array::from_fn(|idx| frame[idx] - planned[idx]);

    OperationalEnvironmentAnalysisRow::synthetic(
        format!("{}-change-pressure", row.id),
        ctx.translator.t("report.operationalEnvironmentAnalysis.changePressure"),
        &row.id,
        ReportRowType::ChangePressure,
        OperationalEnvironmentFinances::from_values(pressure),
    )
}

fn category_row(
    row: &PlanningRow,
    category: &Category,
    projects: &[&Project],
) -> OperationalEnvironmentAnalysisRow {
    let mut totals = [0.0; FINANCE_SLOT_COUNT];
    for project in projects
        .iter()
        .filter(|p| p.category.as_ref().is_some_and(|c| c.value == category.value))
    {
        for (total, value) in totals.iter_mut().zip(project_values(project)) {
            *total += value;
        }
    }

    OperationalEnvironmentAnalysisRow::synthetic(
        format!("{}-{}", row.id, category.id),
        category.value.clone(),
        &row.id,
        ReportRowType::Category,
        OperationalEnvironmentFinances::from_values(totals),
    )
}

fn convert_row(
    row: &PlanningRow,
    parent: Option<&str>,
    ctx: &ReportContext<'_>,
) -> Option<OperationalEnvironmentAnalysisRow> {
    if !row.row_type.is_class_level() {
        return None;
    }

    let planned = planned_values(row);
    if planned.iter().all(|v| *v == 0.0) {
        return None;
    }

    let mut children: Vec<OperationalEnvironmentAnalysisRow> = row
        .children
        .iter()
        .filter_map(|child| convert_row(child, Some(row.id.as_str()), ctx))
        .collect();

    if FOURTH_LEVEL_NAME.is_match(&row.name) || children.is_empty() {
        children.push(tae_frame_row(row, ctx));
        children.push(change_pressure_row(row, ctx));

        let projects = subtree_projects(row);
        children.extend(
            ctx.categories
                .iter()
                .map(|category| category_row(row, category, &projects)),
        );
    }

    Some(OperationalEnvironmentAnalysisRow {
        id: row.id.clone(),
        name: row.name.clone(),
        parent: parent.map(str::to_string),
        row_type: row.row_type.into(),
        finances: OperationalEnvironmentFinances::from_values(planned),
        children,
    })
}

/// Adds `amounts` to the row with `class_id` and every ancestor above it.
fn fold_into_class(
    rows: &mut [OperationalEnvironmentAnalysisRow],
    class_id: &str,
    amounts: &[f64; FINANCE_SLOT_COUNT],
) -> bool {
    for row in rows.iter_mut() {
        let found = row.id == class_id || fold_into_class(&mut row.children, class_id, amounts);
        if found {
            let current = row.finances.values();
            row.finances = OperationalEnvironmentFinances::from_values(std::array::from_fn(|idx| {
                current[idx] + amounts[idx]
            }));
            return true;
        }
    }
    false
}

pub(crate) fn convert(
    rows: &[PlanningRow],
    ctx: &ReportContext<'_>,
) -> Vec<OperationalEnvironmentAnalysisRow> {
    let mut report: Vec<OperationalEnvironmentAnalysisRow> = rows
        .iter()
        .filter_map(|row| convert_row(row, None, ctx))
        .collect();

    for project in ctx.projects_in_warranty_phase {
        let Some(class_id) = project.project_class.as_deref() else {
            continue;
        };
        if !fold_into_class(&mut report, class_id, &project_values(project)) {
            debug!(
                "Warranty phase project {} has no matching class row {}",
                project.id, class_id
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::schema::{PlanningRowType, ProjectFinances};
    use crate::translation::KeyTranslator;
    use chrono::NaiveDate;

    fn ctx() -> ReportContext<'static> {
        ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator)
    }

    fn ascending_finances() -> crate::schema::FinanceRecord {
        let values: Vec<(f64, f64)> = (0..11).map(|i| (100.0 + i as f64, 10.0 * i as f64 + 1.0)).collect();
        finances(&values)
    }

    fn categorized(id: &str, class: &str, category: &str, amount: f64) -> Project {
        let mut project = Project::new(id, id);
        project.project_class = Some(class.to_string());
        project.category = Some(Category {
            id: category.to_lowercase(),
            value: category.to_string(),
        });
        project.finances = ProjectFinances::new(2024)
            .with_budget(YearKey::BudgetProposalCurrentYearPlus0, amount)
            .with_budget(YearKey::PreliminaryCurrentYearPlus10, amount);
        project
    }

    #[test]
    fn test_only_class_levels_with_planned_values() {
        let rows = vec![
            row("m1", "8 03 Kadut", PlanningRowType::MasterClass, flat_finances(10.0, 5.0), None, &[]),
            row("m2", "8 04 Puistot", PlanningRowType::MasterClass, flat_finances(10.0, 0.0), None, &[]),
            row("d1", "Itäinen", PlanningRowType::District, flat_finances(10.0, 5.0), None, &[]),
        ];
        let report = convert(&rows, &ctx());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, "m1");
        assert_eq!(report[0].finances.tae, "5");
    }

    #[test]
    fn test_tae_frame_duplicates_tenth_slot() {
        let rows = vec![row(
            "s1",
            "8 03 01 01 Uudisrakentaminen",
            PlanningRowType::SubClass,
            ascending_finances(),
            None,
            &[],
        )];
        let report = convert(&rows, &ctx());
        let tae = &report[0].children[0];

        assert_eq!(tae.row_type, ReportRowType::TaeFrame);
        assert_eq!(tae.finances.cost_forecast, "100");
        assert_eq!(tae.finances.initial6, "109");
        assert_eq!(tae.finances.initial7, "109");
    }

    #[test]
    fn test_change_pressure_is_frame_minus_planned() {
        let rows = vec![row(
            "s1",
            "8 03 01 01 Uudisrakentaminen",
            PlanningRowType::SubClass,
            ascending_finances(),
            None,
            &[],
        )];
        let report = convert(&rows, &ctx());
        let pressure = &report[0].children[1];

        assert_eq!(pressure.row_type, ReportRowType::ChangePressure);
        assert_eq!(pressure.finances.cost_forecast, "99");
        assert_eq!(pressure.finances.initial7, "9");
    }

    #[test]
    fn test_category_rows_sum_matching_projects() {
        let projects = vec![
            categorized("p1", "s1", "K1", 100.0),
            categorized("p2", "s1", "K1", 50.0),
            categorized("p3", "s1", "K2", 7.0),
        ];
        let rows = vec![row(
            "s1",
            "8 03 01 01 Uudisrakentaminen",
            PlanningRowType::SubClass,
            flat_finances(1000.0, 500.0),
            None,
            &projects,
        )];
        let categories = vec![
            Category { id: "k1".to_string(), value: "K1".to_string() },
            Category { id: "k2".to_string(), value: "K2".to_string() },
            Category { id: "k5".to_string(), value: "K5".to_string() },
        ];
        let mut context =
            ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator);
        context.categories = &categories;

        let report = convert(&rows, &context);
        let children = &report[0].children;
        assert_eq!(children.len(), 5);

        assert_eq!(children[2].id, "s1-k1");
        assert_eq!(children[2].name, "K1");
        assert_eq!(children[2].finances.cost_forecast, "150");
        assert_eq!(children[2].finances.initial7, "150");
        assert_eq!(children[2].finances.tae, "0");
        assert_eq!(children[3].finances.cost_forecast, "7");
        assert_eq!(children[4].finances.cost_forecast, "0");
    }

    #[test]
    fn test_parent_with_class_children_gets_no_extra_rows() {
        let rows = vec![row(
            "m1",
            "8 03 Kadut",
            PlanningRowType::MasterClass,
            flat_finances(10.0, 5.0),
            None,
            &[],
        )
        .with_children(vec![row(
            "c1",
            "8 03 01 Uudisrakentaminen",
            PlanningRowType::Class,
            flat_finances(10.0, 5.0),
            Some("8 03 Kadut"),
            &[],
        )])];

        let report = convert(&rows, &ctx());
        assert_eq!(report[0].children.len(), 1);
        assert_eq!(report[0].children[0].id, "c1");
        // leaf class carries taeFrame and changePressure
        assert_eq!(report[0].children[0].children.len(), 2);
    }

    #[test]
    fn test_warranty_projects_fold_into_class_and_ancestors() {
        let rows = vec![row(
            "m1",
            "8 03 Kadut",
            PlanningRowType::MasterClass,
            flat_finances(10.0, 5.0),
            None,
            &[],
        )
        .with_children(vec![row(
            "c1",
            "8 03 01 Uudisrakentaminen",
            PlanningRowType::Class,
            flat_finances(10.0, 5.0),
            Some("8 03 Kadut"),
            &[],
        )])];
        let warranty = vec![
            categorized("w1", "c1", "K1", 1000.0),
            categorized("w2", "unknown", "K1", 1.0),
        ];
        let mut context =
            ReportContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &KeyTranslator);
        context.projects_in_warranty_phase = &warranty;

        let report = convert(&rows, &context);
        assert_eq!(report[0].finances.cost_forecast, "1 005");
        assert_eq!(report[0].finances.tae, "5");
        assert_eq!(report[0].children[0].finances.cost_forecast, "1 005");
        assert_eq!(report[0].children[0].finances.initial7, "1 005");
    }
}
