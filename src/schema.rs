use crate::error::{PlanningError, Result};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Year-offset labels of a finance snapshot, in chronological order.
///
/// The first three years are budget proposals, the remaining eight are
/// preliminary plan figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum YearKey {
    BudgetProposalCurrentYearPlus0,
    BudgetProposalCurrentYearPlus1,
    BudgetProposalCurrentYearPlus2,
    PreliminaryCurrentYearPlus3,
    PreliminaryCurrentYearPlus4,
    PreliminaryCurrentYearPlus5,
    PreliminaryCurrentYearPlus6,
    PreliminaryCurrentYearPlus7,
    PreliminaryCurrentYearPlus8,
    PreliminaryCurrentYearPlus9,
    PreliminaryCurrentYearPlus10,
}

impl YearKey {
    pub const ALL: [YearKey; 11] = [
        YearKey::BudgetProposalCurrentYearPlus0,
        YearKey::BudgetProposalCurrentYearPlus1,
        YearKey::BudgetProposalCurrentYearPlus2,
        YearKey::PreliminaryCurrentYearPlus3,
        YearKey::PreliminaryCurrentYearPlus4,
        YearKey::PreliminaryCurrentYearPlus5,
        YearKey::PreliminaryCurrentYearPlus6,
        YearKey::PreliminaryCurrentYearPlus7,
        YearKey::PreliminaryCurrentYearPlus8,
        YearKey::PreliminaryCurrentYearPlus9,
        YearKey::PreliminaryCurrentYearPlus10,
    ];

    pub fn offset(self) -> usize {
        self as usize
    }

    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YearKey::BudgetProposalCurrentYearPlus0 => "budgetProposalCurrentYearPlus0",
            YearKey::BudgetProposalCurrentYearPlus1 => "budgetProposalCurrentYearPlus1",
            YearKey::BudgetProposalCurrentYearPlus2 => "budgetProposalCurrentYearPlus2",
            YearKey::PreliminaryCurrentYearPlus3 => "preliminaryCurrentYearPlus3",
            YearKey::PreliminaryCurrentYearPlus4 => "preliminaryCurrentYearPlus4",
            YearKey::PreliminaryCurrentYearPlus5 => "preliminaryCurrentYearPlus5",
            YearKey::PreliminaryCurrentYearPlus6 => "preliminaryCurrentYearPlus6",
            YearKey::PreliminaryCurrentYearPlus7 => "preliminaryCurrentYearPlus7",
            YearKey::PreliminaryCurrentYearPlus8 => "preliminaryCurrentYearPlus8",
            YearKey::PreliminaryCurrentYearPlus9 => "preliminaryCurrentYearPlus9",
            YearKey::PreliminaryCurrentYearPlus10 => "preliminaryCurrentYearPlus10",
        }
    }
}

impl fmt::Display for YearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearBudget {
    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<LenientNumber>")]
    pub frame_budget: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<LenientNumber>")]
    pub planned_budget: f64,
}

impl YearBudget {
    pub fn new(frame_budget: f64, planned_budget: f64) -> Self {
        Self {
            frame_budget,
            planned_budget,
        }
    }
}

/// Finance snapshot of a class, location or group.
///
/// Year entries are kept as an explicit list ordered by [`YearKey`], so
/// every consumer sees the years chronologically regardless of how the
/// backend ordered the keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFinanceRecord", into = "RawFinanceRecord")]
pub struct FinanceRecord {
    pub year: i32,
    pub budget_overrun_amount: f64,
    /// Pre-aggregated project total, only meaningful for group rows
    pub project_budgets: Option<f64>,
    pub years: Vec<(YearKey, YearBudget)>,
}

impl FinanceRecord {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    pub fn with_year(mut self, key: YearKey, frame_budget: f64, planned_budget: f64) -> Self {
        self.set(key, YearBudget::new(frame_budget, planned_budget));
        self
    }

    pub fn with_overrun(mut self, amount: f64) -> Self {
        self.budget_overrun_amount = amount;
        self
    }

    pub fn with_project_budgets(mut self, amount: f64) -> Self {
        self.project_budgets = Some(amount);
        self
    }

    pub fn get(&self, key: YearKey) -> Option<&YearBudget> {
        self.years.iter().find(|(k, _)| *k == key).map(|(_, b)| b)
    }

    /// Inserts or replaces an entry, keeping the list in chronological order.
    pub fn set(&mut self, key: YearKey, budget: YearBudget) {
        match self.years.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(idx) => self.years[idx].1 = budget,
            Err(idx) => self.years.insert(idx, (key, budget)),
        }
    }
}

impl JsonSchema for FinanceRecord {
    fn schema_name() -> String {
        "FinanceRecord".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        RawFinanceRecord::json_schema(gen)
    }
}

/// Keyed wire shape of a finance snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RawFinanceRecord {
    #[serde(default)]
    year: i32,
    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<LenientNumber>")]
    budget_overrun_amount: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    project_budgets: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    budget_proposal_current_year_plus0: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    budget_proposal_current_year_plus1: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    budget_proposal_current_year_plus2: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus3: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus4: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus5: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus6: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus7: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus8: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus9: Option<YearBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preliminary_current_year_plus10: Option<YearBudget>,
}

impl RawFinanceRecord {
    fn slot_mut(&mut self, key: YearKey) -> &mut Option<YearBudget> {
        match key {
            YearKey::BudgetProposalCurrentYearPlus0 => &mut self.budget_proposal_current_year_plus0,
            YearKey::BudgetProposalCurrentYearPlus1 => &mut self.budget_proposal_current_year_plus1,
            YearKey::BudgetProposalCurrentYearPlus2 => &mut self.budget_proposal_current_year_plus2,
            YearKey::PreliminaryCurrentYearPlus3 => &mut self.preliminary_current_year_plus3,
            YearKey::PreliminaryCurrentYearPlus4 => &mut self.preliminary_current_year_plus4,
            YearKey::PreliminaryCurrentYearPlus5 => &mut self.preliminary_current_year_plus5,
            YearKey::PreliminaryCurrentYearPlus6 => &mut self.preliminary_current_year_plus6,
            YearKey::PreliminaryCurrentYearPlus7 => &mut self.preliminary_current_year_plus7,
            YearKey::PreliminaryCurrentYearPlus8 => &mut self.preliminary_current_year_plus8,
            YearKey::PreliminaryCurrentYearPlus9 => &mut self.preliminary_current_year_plus9,
            YearKey::PreliminaryCurrentYearPlus10 => &mut self.preliminary_current_year_plus10,
        }
    }
}

impl From<RawFinanceRecord> for FinanceRecord {
    fn from(mut raw: RawFinanceRecord) -> Self {
        let years = YearKey::ALL
            .iter()
            .filter_map(|key| raw.slot_mut(*key).take().map(|budget| (*key, budget)))
            .collect();

        Self {
            year: raw.year,
            budget_overrun_amount: raw.budget_overrun_amount,
            project_budgets: raw.project_budgets,
            years,
        }
    }
}

impl From<FinanceRecord> for RawFinanceRecord {
    fn from(record: FinanceRecord) -> Self {
        let mut raw = RawFinanceRecord {
            year: record.year,
            budget_overrun_amount: record.budget_overrun_amount,
            project_budgets: record.project_budgets,
            ..RawFinanceRecord::default()
        };
        for (key, budget) in record.years {
            *raw.slot_mut(key) = Some(budget);
        }
        raw
    }
}

/// Per-year planned amounts of a single project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProjectFinances", into = "RawProjectFinances")]
pub struct ProjectFinances {
    pub year: i32,
    pub budgets: Vec<(YearKey, f64)>,
}

impl ProjectFinances {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            budgets: Vec::new(),
        }
    }

    pub fn with_budget(mut self, key: YearKey, amount: f64) -> Self {
        match self.budgets.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(idx) => self.budgets[idx].1 = amount,
            Err(idx) => self.budgets.insert(idx, (key, amount)),
        }
        self
    }

    pub fn get(&self, key: YearKey) -> f64 {
        self.budgets
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

impl JsonSchema for ProjectFinances {
    fn schema_name() -> String {
        "ProjectFinances".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        RawProjectFinances::json_schema(gen)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RawProjectFinances {
    #[serde(default)]
    year: i32,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    budget_proposal_current_year_plus0: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    budget_proposal_current_year_plus1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    budget_proposal_current_year_plus2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus3: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus4: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus5: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus6: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus7: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus8: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus9: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<LenientNumber>")]
    preliminary_current_year_plus10: Option<f64>,
}

impl RawProjectFinances {
    fn slot_mut(&mut self, key: YearKey) -> &mut Option<f64> {
        match key {
            YearKey::BudgetProposalCurrentYearPlus0 => &mut self.budget_proposal_current_year_plus0,
            YearKey::BudgetProposalCurrentYearPlus1 => &mut self.budget_proposal_current_year_plus1,
            YearKey::BudgetProposalCurrentYearPlus2 => &mut self.budget_proposal_current_year_plus2,
            YearKey::PreliminaryCurrentYearPlus3 => &mut self.preliminary_current_year_plus3,
            YearKey::PreliminaryCurrentYearPlus4 => &mut self.preliminary_current_year_plus4,
            YearKey::PreliminaryCurrentYearPlus5 => &mut self.preliminary_current_year_plus5,
            YearKey::PreliminaryCurrentYearPlus6 => &mut self.preliminary_current_year_plus6,
            YearKey::PreliminaryCurrentYearPlus7 => &mut self.preliminary_current_year_plus7,
            YearKey::PreliminaryCurrentYearPlus8 => &mut self.preliminary_current_year_plus8,
            YearKey::PreliminaryCurrentYearPlus9 => &mut self.preliminary_current_year_plus9,
            YearKey::PreliminaryCurrentYearPlus10 => &mut self.preliminary_current_year_plus10,
        }
    }
}

impl From<RawProjectFinances> for ProjectFinances {
    fn from(mut raw: RawProjectFinances) -> Self {
        let budgets = YearKey::ALL
            .iter()
            .filter_map(|key| raw.slot_mut(*key).take().map(|amount| (*key, amount)))
            .collect();
        Self {
            year: raw.year,
            budgets,
        }
    }
}

impl From<ProjectFinances> for RawProjectFinances {
    fn from(finances: ProjectFinances) -> Self {
        let mut raw = RawProjectFinances {
            year: finances.year,
            ..RawProjectFinances::default()
        };
        for (key, amount) in finances.budgets {
            *raw.slot_mut(key) = Some(amount);
        }
        raw
    }
}

/// Budget values arrive either as JSON numbers or as numeric strings ("12.50").
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    fn into_f64(self) -> f64 {
        match self {
            LenientNumber::Number(n) if n.is_finite() => n,
            LenientNumber::Number(_) => 0.0,
            LenientNumber::Text(s) => parse_amount(&s).unwrap_or(0.0),
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientNumber>::deserialize(deserializer)?;
    Ok(value.map(LenientNumber::into_f64).unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientNumber>::deserialize(deserializer)?;
    Ok(value.map(LenientNumber::into_f64))
}

/// Parses an amount that may contain grouping whitespace, e.g. "1 234.5".
pub fn parse_amount(text: &str) -> Result<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(0.0);
    }
    compact
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PlanningError::InvalidNumber(text.to_string()))
}

/// Kind of a node in the planning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlanningRowType {
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
    Project,
}

impl PlanningRowType {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanningRowType::MasterClass => "masterClass",
            PlanningRowType::Class => "class",
            PlanningRowType::SubClass => "subClass",
            PlanningRowType::SubClassDistrict => "subClassDistrict",
            PlanningRowType::CollectiveSubLevel => "collectiveSubLevel",
            PlanningRowType::SubLevelDistrict => "subLevelDistrict",
            PlanningRowType::OtherClassification => "otherClassification",
            PlanningRowType::OtherClassificationSubLevel => "otherClassificationSubLevel",
            PlanningRowType::DistrictPreview => "districtPreview",
            PlanningRowType::District => "district",
            PlanningRowType::Division => "division",
            PlanningRowType::SubDivision => "subDivision",
            PlanningRowType::Group => "group",
            PlanningRowType::Project => "project",
        }
    }

    pub fn is_class_level(self) -> bool {
        matches!(
            self,
            PlanningRowType::MasterClass | PlanningRowType::Class | PlanningRowType::SubClass
        )
    }
}

impl fmt::Display for PlanningRowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanningRowType {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| PlanningError::UnknownRowType(s.to_string()))
    }
}

/// A class, location or group as fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub finances: FinanceRecord,
}

impl HierarchyNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: parent.map(str::to_string),
            finances: FinanceRecord::default(),
        }
    }

    pub fn with_finances(mut self, finances: FinanceRecord) -> Self {
        self.finances = finances;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_class: Option<String>,
    #[serde(default)]
    pub project_location: Option<String>,
    #[serde(default)]
    pub project_group: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub planning_start_year: Option<i32>,
    #[serde(default)]
    pub construction_end_year: Option<i32>,
    /// D.M.YYYY
    #[serde(default)]
    pub est_planning_start: Option<String>,
    #[serde(default)]
    pub est_planning_end: Option<String>,
    #[serde(default)]
    pub est_construction_start: Option<String>,
    #[serde(default)]
    pub est_construction_end: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    #[schemars(with = "Option<LenientNumber>")]
    pub cost_forecast: Option<f64>,
    #[serde(default)]
    pub project_manager: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub finances: ProjectFinances,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn budget(&self, key: YearKey) -> f64 {
        self.finances.get(key)
    }
}

/// Everything the row builder needs from one fetch of the planning view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanningDataset {
    #[serde(default)]
    pub master_classes: Vec<HierarchyNode>,
    #[serde(default)]
    pub classes: Vec<HierarchyNode>,
    #[serde(default)]
    pub sub_classes: Vec<HierarchyNode>,
    #[serde(default)]
    pub districts: Vec<HierarchyNode>,
    #[serde(default)]
    pub divisions: Vec<HierarchyNode>,
    #[serde(default)]
    pub groups: Vec<HierarchyNode>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl PlanningDataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PlanningDataset)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = PlanningDataset::schema_as_json().unwrap();
        assert!(schema_json.contains("masterClasses"));
        assert!(schema_json.contains("budgetProposalCurrentYearPlus0"));
        assert!(schema_json.contains("projects"));
    }

    #[test]
    fn test_finance_record_orders_years_chronologically() {
        let json = r#"{
            "year": 2024,
            "budgetOverrunAmount": 10,
            "preliminaryCurrentYearPlus3": { "frameBudget": 4, "plannedBudget": 3 },
            "budgetProposalCurrentYearPlus0": { "frameBudget": 1, "plannedBudget": "0.5" }
        }"#;

        let record: FinanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.year, 2024);
        assert_eq!(record.budget_overrun_amount, 10.0);
        assert_eq!(record.project_budgets, None);
        assert_eq!(
            record.years.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![
                YearKey::BudgetProposalCurrentYearPlus0,
                YearKey::PreliminaryCurrentYearPlus3
            ]
        );
        assert_eq!(record.years[0].1.planned_budget, 0.5);
    }

    #[test]
    fn test_finance_record_serializes_keyed_shape() {
        let record = FinanceRecord::new(2024)
            .with_year(YearKey::BudgetProposalCurrentYearPlus1, 20.0, 5.0)
            .with_project_budgets(50.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["projectBudgets"], 50.0);
        assert_eq!(json["budgetProposalCurrentYearPlus1"]["frameBudget"], 20.0);
        assert!(json.get("budgetProposalCurrentYearPlus0").is_none());
    }

    #[test]
    fn test_lenient_numbers_coerce_to_zero() {
        let json = r#"{ "frameBudget": "abc", "plannedBudget": null }"#;
        let budget: YearBudget = serde_json::from_str(json).unwrap();
        assert_eq!(budget, YearBudget::new(0.0, 0.0));
    }

    #[test]
    fn test_project_finances_from_strings() {
        let json = r#"{
            "id": "p1",
            "name": "Bridge",
            "costForecast": "1500.00",
            "finances": { "year": 2024, "budgetProposalCurrentYearPlus1": "120.50" }
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.cost_forecast, Some(1500.0));
        assert_eq!(project.budget(YearKey::BudgetProposalCurrentYearPlus1), 120.5);
        assert_eq!(project.budget(YearKey::BudgetProposalCurrentYearPlus2), 0.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1 234 567").unwrap(), 1_234_567.0);
        assert_eq!(parse_amount("").unwrap(), 0.0);
        assert!(parse_amount("12a").is_err());
    }

    #[test]
    fn test_row_type_from_str() {
        assert_eq!(
            "subClassDistrict".parse::<PlanningRowType>().unwrap(),
            PlanningRowType::SubClassDistrict
        );
        assert!("planet".parse::<PlanningRowType>().is_err());
    }
}
