use crate::calculations::{
    calculate_planning_cells, calculate_planning_row_sums, Deviation, PlanningCell,
};
use crate::schema::{HierarchyNode, PlanningDataset, PlanningRowType, Project};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// URL query parameter that selects a row in the planning view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSearchParam {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRow {
    #[serde(rename = "type")]
    pub row_type: PlanningRowType,
    pub name: String,
    pub id: String,
    pub path: String,
    pub key: String,
    pub url_search_param: Option<UrlSearchParam>,
    pub default_expanded: bool,
    pub children: Vec<PlanningRow>,
    pub project_rows: Vec<Project>,
    pub cells: Vec<PlanningCell>,
    pub planned_budgets: String,
    pub cost_estimate_budget: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<Deviation>,
}

impl PlanningRow {
    pub fn with_children(mut self, children: Vec<PlanningRow>) -> Self {
        self.children = children;
        self
    }

    /// Pre-order list of this row and every descendant row.
    pub fn descendants(&self) -> Vec<&PlanningRow> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowBuildOptions<'a> {
    pub expanded: bool,
    pub parent_path: Option<&'a str>,
    /// Districts folded into a district-grouping ("suurpiiri") sub class
    pub districts_for_sub_class: Option<&'a [HierarchyNode]>,
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn is_unassigned(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn matches_id(value: &Option<String>, id: &str) -> bool {
    value.as_deref() == Some(id)
}

/// Projects shown directly under a row, sorted by name.
pub fn get_sorted_projects(
    id: &str,
    row_type: PlanningRowType,
    projects: &[Project],
    districts_for_sub_class: Option<&[HierarchyNode]>,
) -> Vec<Project> {
    let mut filtered: Vec<Project> = match row_type {
        PlanningRowType::Class | PlanningRowType::SubClass => projects
            .iter()
            .filter(|p| {
                is_unassigned(&p.project_group)
                    && is_unassigned(&p.project_location)
                    && matches_id(&p.project_class, id)
            })
            .cloned()
            .collect(),
        PlanningRowType::SubClassDistrict => {
            let districts = districts_for_sub_class.unwrap_or(&[]);
            projects
                .iter()
                .filter(|p| {
                    is_unassigned(&p.project_group)
                        && matches_id(&p.project_class, id)
                        && (is_unassigned(&p.project_location)
                            || districts
                                .iter()
                                .any(|d| matches_id(&p.project_location, &d.id)))
                })
                .cloned()
                .collect()
        }
        PlanningRowType::Group => projects
            .iter()
            .filter(|p| matches_id(&p.project_group, id))
            .cloned()
            .collect(),
        PlanningRowType::District | PlanningRowType::Division => projects
            .iter()
            .filter(|p| is_unassigned(&p.project_group) && matches_id(&p.project_location, id))
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    filtered.sort_by(|a, b| compare_names(&a.name, &b.name));
    filtered
}

fn url_search_param(row_type: PlanningRowType, id: &str) -> Option<UrlSearchParam> {
    match row_type {
        PlanningRowType::Project
        | PlanningRowType::Group
        | PlanningRowType::Division
        | PlanningRowType::OtherClassificationSubLevel
        | PlanningRowType::District => None,
        PlanningRowType::DistrictPreview => Some(UrlSearchParam {
            key: "district".to_string(),
            value: id.to_string(),
        }),
        other => Some(UrlSearchParam {
            key: other.as_str().to_string(),
            value: id.to_string(),
        }),
    }
}

pub fn build_planning_row(
    node: &HierarchyNode,
    row_type: PlanningRowType,
    projects: &[Project],
    options: RowBuildOptions<'_>,
) -> PlanningRow {
    let project_rows = get_sorted_projects(
        &node.id,
        row_type,
        projects,
        options.districts_for_sub_class,
    );

    // Divisions with content open regardless of the caller
    let default_expanded =
        options.expanded || (row_type == PlanningRowType::Division && !project_rows.is_empty());

    let path = match options.parent_path {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, node.name),
        _ => node.name.clone(),
    };

    let sums = calculate_planning_row_sums(&node.finances, row_type);

    PlanningRow {
        row_type,
        name: node.name.clone(),
        id: node.id.clone(),
        path,
        key: node.id.clone(),
        url_search_param: url_search_param(row_type, &node.id),
        default_expanded,
        children: Vec::new(),
        project_rows,
        cells: calculate_planning_cells(&node.finances),
        planned_budgets: sums.planned_budgets,
        cost_estimate_budget: sums.cost_estimate_budget,
        deviation: sums.deviation,
    }
}

fn is_district_grouping(sub_class: &HierarchyNode) -> bool {
    sub_class.name.to_lowercase().contains("suurpiiri")
}

fn children_of<'a>(
    nodes: &'a [HierarchyNode],
    parent_id: &'a str,
) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
    nodes
        .iter()
        .filter(move |n| n.parent.as_deref() == Some(parent_id))
}

struct TreeBuilder<'a> {
    dataset: &'a PlanningDataset,
    expanded: bool,
}

impl<'a> TreeBuilder<'a> {
    fn row(
        &self,
        node: &HierarchyNode,
        row_type: PlanningRowType,
        parent_path: Option<&str>,
        districts: Option<&[HierarchyNode]>,
    ) -> PlanningRow {
        build_planning_row(
            node,
            row_type,
            &self.dataset.projects,
            RowBuildOptions {
                expanded: self.expanded,
                parent_path,
                districts_for_sub_class: districts,
            },
        )
    }

    fn groups_under(&self, parent_id: &str, parent_path: &str) -> Vec<PlanningRow> {
        children_of(&self.dataset.groups, parent_id)
            .map(|g| self.row(g, PlanningRowType::Group, Some(parent_path), None))
            .collect()
    }

    fn master_class(&self, node: &HierarchyNode) -> PlanningRow {
        let mut row = self.row(node, PlanningRowType::MasterClass, None, None);
        let mut children = self.groups_under(&node.id, &row.path);
        children.extend(
            children_of(&self.dataset.classes, &node.id).map(|c| self.class(c, &row.path)),
        );
        row.children = children;
        row
    }

    fn class(&self, node: &HierarchyNode, parent_path: &str) -> PlanningRow {
        let mut row = self.row(node, PlanningRowType::Class, Some(parent_path), None);
        let mut children = self.groups_under(&node.id, &row.path);
        children.extend(
            children_of(&self.dataset.sub_classes, &node.id)
                .map(|s| self.sub_class(s, &row.path)),
        );
        row.children = children;
        row
    }

    fn sub_class(&self, node: &HierarchyNode, parent_path: &str) -> PlanningRow {
        let districts: Vec<HierarchyNode> =
            children_of(&self.dataset.districts, &node.id).cloned().collect();

        if is_district_grouping(node) {
            let mut row = self.row(
                node,
                PlanningRowType::SubClassDistrict,
                Some(parent_path),
                Some(districts.as_slice()),
            );
            row.children = self.groups_under(&node.id, &row.path);
            return row;
        }

        let mut row = self.row(node, PlanningRowType::SubClass, Some(parent_path), None);
        let mut children = self.groups_under(&node.id, &row.path);
        children.extend(districts.iter().map(|d| self.district(d, &row.path)));
        row.children = children;
        row
    }

    fn district(&self, node: &HierarchyNode, parent_path: &str) -> PlanningRow {
        let mut row = self.row(node, PlanningRowType::District, Some(parent_path), None);
        let mut children = self.groups_under(&node.id, &row.path);
        children.extend(
            children_of(&self.dataset.divisions, &node.id).map(|d| {
                let mut division =
                    self.row(d, PlanningRowType::Division, Some(row.path.as_str()), None);
                division.children = self.groups_under(&d.id, &division.path);
                division
            }),
        );
        row.children = children;
        row
    }
}

/// Builds the whole class tree from one dataset snapshot.
///
/// Master classes are the roots; classes, sub classes, districts and
/// divisions attach through their `parent` id and groups attach under the
/// node they reference.
pub fn build_planning_tree(dataset: &PlanningDataset, expanded: bool) -> Vec<PlanningRow> {
    let builder = TreeBuilder { dataset, expanded };

    let rows: Vec<PlanningRow> = dataset
        .master_classes
        .iter()
        .filter(|m| is_unassigned(&m.parent))
        .map(|m| builder.master_class(m))
        .collect();

    debug!(
        "Built planning tree with {} root rows from {} projects",
        rows.len(),
        dataset.projects.len()
    );

    rows
}
