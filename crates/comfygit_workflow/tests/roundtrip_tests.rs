use comfygit_workflow::WorkflowDocument;
use serde_json::json;

#[test]
fn parse_then_reconstruct_is_structurally_identical() {
    let original = json!({
        "nodes": [
            {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["SD1.5/photon.safetensors"]},
        ],
        "links": [],
        "groups": [],
        "extra": {"ds": {"scale": 1.0, "offset": [0, 0]}},
        "frontend_version": "1.2.3",
        "revision": 7,
        "definitions": {
            "subgraphs": [{
                "id": "11111111-1111-1111-1111-111111111111",
                "name": "inner",
                "nodes": [{"id": 9, "type": "KSampler", "widgets_values": [42, "fixed"]}],
            }]
        }
    });

    let doc = WorkflowDocument::parse(&original.to_string()).unwrap();
    let reconstructed_text = doc.to_json_string().unwrap();
    let reconstructed: serde_json::Value = serde_json::from_str(&reconstructed_text).unwrap();

    assert_eq!(original, reconstructed, "reconstruction must preserve every field byte-for-byte in value");
}

#[test]
fn missing_nodes_array_is_rejected() {
    let err = WorkflowDocument::parse(r#"{"links": []}"#).unwrap_err();
    assert!(matches!(err, comfygit_workflow::WorkflowError::MissingNodes));
}
