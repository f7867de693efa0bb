use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::design::Design;
use crate::error::Error;
use crate::table::{ColumnData, ResultTable};
use crate::types::Result;

/// One row of the target/outcome lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TargetOutcomePair {
    pub target_cohort_id: i64,
    pub outcome_cohort_id: i64,
    pub ref_id: i64,
}

/// Every (target, outcome cohort) pair the design's analyses produce, once each.
///
/// Outcome ids are resolved through the design's outcome definitions; an id
/// with no definition fails the whole build.
pub fn build_reference(design: &Design, ref_id: i64) -> Result<Vec<TargetOutcomePair>> {
    let mut cohort_by_outcome: HashMap<i64, i64> = HashMap::new();
    for outcome in &design.outcome_defs {
        match cohort_by_outcome.insert(outcome.id, outcome.cohort_id) {
            Some(previous) if previous != outcome.cohort_id => {
                return Err(Error::BrokenReference(format!(
                    "outcome {} is defined with cohorts {} and {}",
                    outcome.id, previous, outcome.cohort_id
                )));
            }
            _ => {}
        }
    }

    let mut pairs: BTreeSet<(i64, i64)> = BTreeSet::new();
    for (analysis_idx, analysis) in design.analysis_list.iter().enumerate() {
        let outcome_cohorts = analysis
            .outcomes
            .iter()
            .map(|outcome_id| {
                cohort_by_outcome
                    .get(outcome_id)
                    .copied()
                    .ok_or_else(|| {
                        Error::BrokenReference(format!(
                            "analysis {} lists outcome {} which has no outcome definition",
                            analysis_idx, outcome_id
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        for target in &analysis.targets {
            for outcome_cohort in &outcome_cohorts {
                pairs.insert((*target, *outcome_cohort));
            }
        }
    }

    Ok(pairs
        .into_iter()
        .map(|(target_cohort_id, outcome_cohort_id)| TargetOutcomePair {
            target_cohort_id,
            outcome_cohort_id,
            ref_id,
        })
        .collect())
}

/// Tabular form of the reference pairs, ready for export
pub fn reference_table(pairs: &[TargetOutcomePair]) -> Result<ResultTable> {
    let mut table = ResultTable::new();
    table.push_column(
        "target_cohort_id",
        ColumnData::Integer(pairs.iter().map(|p| Some(p.target_cohort_id)).collect()),
    )?;
    table.push_column(
        "outcome_cohort_id",
        ColumnData::Integer(pairs.iter().map(|p| Some(p.outcome_cohort_id)).collect()),
    )?;
    table.push_column(
        "ref_id",
        ColumnData::Integer(pairs.iter().map(|p| Some(p.ref_id)).collect()),
    )?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{AnalysisSpec, OutcomeDef};

    fn outcome(id: i64, cohort_id: i64) -> OutcomeDef {
        OutcomeDef {
            id,
            cohort_id,
            name: None,
            clean_window: None,
            exclude_cohort_id: None,
        }
    }

    fn analysis(targets: &[i64], outcomes: &[i64]) -> AnalysisSpec {
        AnalysisSpec {
            targets: targets.to_vec(),
            outcomes: outcomes.to_vec(),
            tars: vec![1],
        }
    }

    fn design(analyses: Vec<AnalysisSpec>, outcomes: Vec<OutcomeDef>) -> Design {
        Design {
            analysis_list: analyses,
            outcome_defs: outcomes,
            ..Design::default()
        }
    }

    fn pair(t: i64, o: i64, r: i64) -> TargetOutcomePair {
        TargetOutcomePair {
            target_cohort_id: t,
            outcome_cohort_id: o,
            ref_id: r,
        }
    }

    #[test]
    fn test_cross_product() {
        let d = design(vec![analysis(&[1, 2], &[10])], vec![outcome(10, 100)]);
        let pairs = build_reference(&d, 7).unwrap();

        assert_eq!(pairs, vec![pair(1, 100, 7), pair(2, 100, 7)]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let d = design(
            vec![analysis(&[1], &[10]), analysis(&[1], &[10, 11])],
            vec![outcome(10, 100), outcome(11, 101)],
        );
        let pairs = build_reference(&d, 1).unwrap();

        assert_eq!(pairs, vec![pair(1, 100, 1), pair(1, 101, 1)]);
    }

    #[test]
    fn test_outcome_ids_sharing_a_cohort() {
        let d = design(
            vec![analysis(&[1], &[10, 11])],
            vec![outcome(10, 100), outcome(11, 100)],
        );
        let pairs = build_reference(&d, 1).unwrap();

        assert_eq!(pairs, vec![pair(1, 100, 1)]);
    }

    #[test]
    fn test_empty_design() {
        let pairs = build_reference(&Design::default(), 1).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_broken_reference() {
        let d = design(
            vec![analysis(&[1], &[10]), analysis(&[2], &[99])],
            vec![outcome(10, 100)],
        );
        match build_reference(&d, 1) {
            Err(Error::BrokenReference(msg)) => assert!(msg.contains("analysis 1")),
            other => panic!("expected broken reference, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_outcome_defs() {
        let d = design(
            vec![analysis(&[1], &[10])],
            vec![outcome(10, 100), outcome(10, 200)],
        );

        assert!(matches!(
            build_reference(&d, 1),
            Err(Error::BrokenReference(_))
        ));
    }

    #[test]
    fn test_pairs_match_analyses() {
        let d = design(
            vec![analysis(&[1, 2], &[10]), analysis(&[3], &[10, 11])],
            vec![outcome(10, 100), outcome(11, 101), outcome(12, 102)],
        );
        let pairs = build_reference(&d, 1).unwrap();

        for t in [1, 2, 3, 4] {
            for o in [100, 101, 102] {
                let expected = d.analysis_list.iter().any(|a| {
                    a.targets.contains(&t)
                        && a.outcomes.iter().any(|id| {
                            d.outcome_defs.iter().any(|od| od.id == *id && od.cohort_id == o)
                        })
                });
                let present = pairs
                    .iter()
                    .any(|p| p.target_cohort_id == t && p.outcome_cohort_id == o);
                assert_eq!(present, expected, "pair ({}, {})", t, o);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let d = design(
            vec![analysis(&[3, 1], &[11, 10]), analysis(&[2], &[10])],
            vec![outcome(10, 100), outcome(11, 101)],
        );

        assert_eq!(build_reference(&d, 4).unwrap(), build_reference(&d, 4).unwrap());
    }

    #[test]
    fn test_reference_table() {
        let table = reference_table(&[pair(1, 100, 7), pair(2, 100, 7)]).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["target_cohort_id", "outcome_cohort_id", "ref_id"]
        );
        assert_eq!(table.integers("ref_id").unwrap(), &[Some(7), Some(7)]);
    }
}
