use comfygit_manifest::WorkflowModelEntry;
use comfygit_model_index::ModelIndex;
use comfygit_resolution::{resolve_model_reference, MatchTier, ModelUserDecision, ModelUserStrategy, Resolution};
use comfygit_workflow::ModelReference;

struct AlwaysSkip;
impl ModelUserStrategy for AlwaysSkip {
    fn decide(&mut self, _reference: &ModelReference, _candidates: &[comfygit_resolution::ModelCandidate]) -> ModelUserDecision {
        ModelUserDecision::Skip
    }
}

struct SelectFirst;
impl ModelUserStrategy for SelectFirst {
    fn decide(&mut self, _reference: &ModelReference, candidates: &[comfygit_resolution::ModelCandidate]) -> ModelUserDecision {
        ModelUserDecision::Select(candidates[0].relative_path.clone())
    }
}

fn make_index(dir: &std::path::Path) -> ModelIndex {
    std::fs::create_dir_all(dir.join("checkpoints")).unwrap();
    std::fs::write(dir.join("checkpoints/sd15-v1.0.safetensors"), vec![1u8; 4096]).unwrap();
    std::fs::write(dir.join("checkpoints/sd15-v1.5.safetensors"), vec![2u8; 8192]).unwrap();
    let db_path = dir.join("models.db");
    let index = ModelIndex::open(&db_path, dir.to_path_buf()).unwrap();
    index.sync(false).unwrap();
    index
}

#[test]
fn exact_path_resolves_without_user_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let index = make_index(dir.path());
    let reference = ModelReference {
        node_id: "1".into(),
        node_type: "CheckpointLoaderSimple".into(),
        widget_index: 0,
        widget_value: "sd15-v1.0.safetensors".into(),
    };
    let mut user = AlwaysSkip;
    let outcome = resolve_model_reference(&reference, Some("checkpoints"), &[], &index, &mut user).unwrap();
    assert!(outcome.is_resolved());
}

#[test]
fn ambiguous_fuzzy_candidates_reach_user_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let index = make_index(dir.path());
    let reference = ModelReference {
        node_id: "1".into(),
        node_type: "CheckpointLoaderSimple".into(),
        widget_index: 0,
        widget_value: "sd15.safetensors".into(),
    };
    let mut user = SelectFirst;
    let outcome = resolve_model_reference(&reference, Some("checkpoints"), &[], &index, &mut user).unwrap();
    assert!(outcome.is_resolved());
}

#[test]
fn saved_mapping_demotes_when_file_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let index = make_index(dir.path());
    let found = index.find_by_exact_path("checkpoints/sd15-v1.0.safetensors").unwrap().unwrap();

    let reference = ModelReference {
        node_id: "1".into(),
        node_type: "CheckpointLoaderSimple".into(),
        widget_index: 0,
        widget_value: "sd15-v1.0.safetensors".into(),
    };
    let saved = WorkflowModelEntry {
        filename: "sd15-v1.0.safetensors".into(),
        hash: Some(found.hash.clone()),
        category: "checkpoints".into(),
        criticality: comfygit_manifest::ModelCriticality::Required,
        status: comfygit_manifest::ModelResolutionStatus::Resolved,
        sources: vec![],
        nodes: vec![comfygit_manifest::WorkflowModelNodeRef {
            node_id: "1".into(),
            node_type: "CheckpointLoaderSimple".into(),
            widget_index: 0,
            widget_value: "sd15-v1.0.safetensors".into(),
        }],
        auto_resolved: false,
    };

    // Still present: resolves from the saved mapping.
    let mut user = AlwaysSkip;
    let outcome = resolve_model_reference(&reference, Some("checkpoints"), &[saved.clone()], &index, &mut user).unwrap();
    assert!(outcome.is_resolved());

    // Delete the file and re-sync; the saved hash now has no location.
    std::fs::remove_file(dir.path().join("checkpoints/sd15-v1.0.safetensors")).unwrap();
    index.sync(false).unwrap();
    let outcome = resolve_model_reference(&reference, Some("checkpoints"), &[saved], &index, &mut user).unwrap();
    assert!(matches!(outcome, Resolution::Unresolved { .. }));
}

#[test]
fn match_tier_thresholds() {
    assert_eq!(MatchTier::from_score(0.9), Some(MatchTier::High));
    assert_eq!(MatchTier::from_score(0.7), Some(MatchTier::Good));
    assert_eq!(MatchTier::from_score(0.5), Some(MatchTier::Possible));
    assert_eq!(MatchTier::from_score(0.2), None);
}
