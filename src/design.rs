//! Incidence design as carried in the job settings (`irDesign`).
//!
//! Only the parts the module reads are typed; the engine receives the design
//! as a whole.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    #[serde(default)]
    pub target_defs: Vec<TargetDef>,

    #[serde(default)]
    pub outcome_defs: Vec<OutcomeDef>,

    #[serde(default)]
    pub time_at_risk_defs: Vec<TimeAtRiskDef>,

    #[serde(default)]
    pub analysis_list: Vec<AnalysisSpec>,

    /// Strata settings are passed to the engine untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strata_settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDef {
    pub id: i64,
    pub cohort_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub clean_window: Option<i64>,
    #[serde(default)]
    pub exclude_cohort_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAtRiskDef {
    pub id: i64,
    #[serde(default)]
    pub start_with: Option<String>,
    #[serde(default)]
    pub start_offset: Option<i64>,
    #[serde(default)]
    pub end_with: Option<String>,
    #[serde(default)]
    pub end_offset: Option<i64>,
}

/// One analysis: every target against every outcome, for each time at risk
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSpec {
    #[serde(default)]
    pub targets: Vec<i64>,
    #[serde(default)]
    pub outcomes: Vec<i64>,
    #[serde(default)]
    pub tars: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_design() {
        let json = r#"{
            "targetDefs": [{"id": 1, "name": "Hypertension"}],
            "outcomeDefs": [{"id": 10, "cohortId": 100, "name": "Stroke", "cleanWindow": 9999}],
            "timeAtRiskDefs": [{"id": 1, "startWith": "start", "startOffset": 0, "endWith": "end", "endOffset": 0}],
            "analysisList": [{"targets": [1], "outcomes": [10], "tars": [1]}],
            "strataSettings": {"byAge": false, "byGender": true}
        }"#;
        let design: Design = serde_json::from_str(json).unwrap();

        assert_eq!(design.target_defs[0].name.as_deref(), Some("Hypertension"));
        assert_eq!(design.outcome_defs[0].cohort_id, 100);
        assert_eq!(design.outcome_defs[0].clean_window, Some(9999));
        assert_eq!(design.analysis_list[0].targets, vec![1]);
        assert!(design.strata_settings.is_some());
    }

    #[test]
    fn test_deserialize_empty_design() {
        let design: Design = serde_json::from_str("{}").unwrap();

        assert!(design.analysis_list.is_empty());
        assert!(design.outcome_defs.is_empty());
    }
}
