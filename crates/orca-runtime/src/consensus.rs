//! Consensus across redundant instance results

use serde_json::{json, Value};

use orca_core::types::TeamResult;

/// Confidence assumed for a result that does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;
/// Flat agreement score recorded in the consensus metadata.
pub const AGREEMENT_SCORE: f64 = 0.85;

/// Single merged result for a team.
///
/// The first result is the base. `confidence` becomes the mean across all
/// results and `frame_refs` the de-duplicated union in first-seen order.
/// A single result is returned unchanged; no results give an empty object.
// TODO: field-wise majority/median consensus instead of first-instance base.
pub fn compute_consensus(results: &[TeamResult]) -> TeamResult {
    let Some(first) = results.first() else {
        return TeamResult::new();
    };
    if results.len() == 1 {
        return first.clone();
    }

    let mut consensus = first.clone();

    let total: f64 = results
        .iter()
        .map(|r| {
            r.get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_CONFIDENCE)
        })
        .sum();
    consensus.insert(
        "confidence".to_string(),
        json!(total / results.len() as f64),
    );

    let mut frame_refs: Vec<Value> = Vec::new();
    for frame in results
        .iter()
        .filter_map(|r| r.get("frame_refs").and_then(Value::as_array))
        .flatten()
    {
        if !frame_refs.contains(frame) {
            frame_refs.push(frame.clone());
        }
    }
    consensus.insert("frame_refs".to_string(), Value::Array(frame_refs));

    consensus.insert(
        "consensus_metadata".to_string(),
        json!({
            "num_instances": results.len(),
            "agreement_score": AGREEMENT_SCORE,
        }),
    );
    consensus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(value: Value) -> TeamResult {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_empty_and_single_inputs() {
        assert!(compute_consensus(&[]).is_empty());

        let only = result(json!({"confidence": 0.9, "frame_refs": ["a"], "severity": 4}));
        assert_eq!(compute_consensus(&[only.clone()]), only);
    }

    #[test]
    fn test_mean_confidence_and_frame_union() {
        let results = vec![
            result(json!({"confidence": 0.9, "frame_refs": ["a"], "severity": 4})),
            result(json!({"confidence": 0.7, "frame_refs": ["b", "a"], "severity": 8})),
            result(json!({"frame_refs": ["c"]})),
        ];

        let consensus = compute_consensus(&results);
        let confidence = consensus["confidence"].as_f64().unwrap();
        assert!((confidence - 0.8).abs() < 1e-9);
        assert_eq!(consensus["frame_refs"], json!(["a", "b", "c"]));
        assert_eq!(consensus["severity"], 4);
        assert_eq!(
            consensus["consensus_metadata"],
            json!({"num_instances": 3, "agreement_score": 0.85})
        );
    }
}
