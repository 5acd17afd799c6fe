use httpmock::prelude::*;
use maker_wiring::config::toml_config::TomlConfig;
use maker_wiring::core::normalizer::{expand_connections, normalize_connections};
use maker_wiring::{
    normalize_description, Catalog, NormalizeMode, ProjectEngine, ProjectError,
    RawProjectDescription,
};
use std::io::Write;
use tempfile::NamedTempFile;

const ROBOT_CAR: &str = r#"{
    "name": "Zoomy McZoomface",
    "description": "A two-wheeled robot car that drives in circles.",
    "instruction": [
        "1. Connect Arduino Nano;D5$L298N Motor Driver;ENA",
        "2. Connect L298N Motor Driver;OUT1$DC Motor1;+"
    ],
    "connections": [
        "Arduino Nano;D5$L298N Motor Driver;ENA",
        "Arduino Nano;D6$L298N Motor Driver;IN1",
        "L298N Motor Driver;OUT1$DC Motor1;+",
        "L298N Motor Driver;OUT2$DC Motor1;-",
        "L298N Motor Driver;OUT3$DC Motor2;+",
        "L298N Motor Driver;OUT4$DC Motor2;-",
        "9V Battery;+$L298N Motor Driver;+12V",
        "9V Battery;-$L298N Motor Driver;GND"
    ],
    "components": ["Arduino Nano", "L298N Motor Driver", "DC Motor1", "DC Motor2", "9V Battery"],
    "code": "void setup() { pinMode(5, OUTPUT); }"
}"#;

fn config_for(server: &MockServer, mode: &str) -> TomlConfig {
    TomlConfig::from_toml_str(&format!(
        r#"
[project]
materials = ["Arduino Nano", "L298N Motor Driver", "DC Motor", "DC Motor", "9V Battery"]

[model]
endpoint = "{}"
api_key = "integration-key"
timeout_seconds = 5

[normalizer]
mode = "{}"
"#,
        server.base_url(),
        mode
    ))
    .unwrap()
}

fn text_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "final",
        "finish_reason": "COMPLETE",
        "message": {
            "role": "assistant",
            "content": [{"type": "text", "text": text}]
        }
    })
}

#[tokio::test]
async fn test_end_to_end_with_tool_round() {
    let server = MockServer::start();

    let tool_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2/chat")
            .header("Authorization", "Bearer integration-key")
            .body_contains("\"tools\"");
        then.status(200).json_body(serde_json::json!({
            "finish_reason": "TOOL_CALL",
            "message": {
                "role": "assistant",
                "tool_plan": "Let me check the motor driver pins.",
                "tool_calls": [{
                    "id": "call_0",
                    "type": "function",
                    "function": {
                        "name": "get_component_info",
                        "arguments": "{\"component_name\": \"L298N Motor Driver\"}"
                    }
                }]
            }
        }));
    });

    let final_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2/chat")
            .body_contains("\"tool_call_id\"")
            .body_contains("OUT1");
        then.status(200).json_body(text_reply(ROBOT_CAR));
    });

    let config = config_for(&server, "strict");
    let engine = ProjectEngine::from_config(&config, Catalog::builtin()).unwrap();
    let project = engine.build_project(config.materials()).await.unwrap();

    tool_mock.assert();
    final_mock.assert();

    assert_eq!(project.name, "Zoomy McZoomface");
    assert_eq!(
        project.components,
        vec![
            "Arduino Nano",
            "L298N Motor Driver",
            "DC Motor1",
            "DC Motor2",
            "9V Battery"
        ]
    );
    assert_eq!(
        project.connections_of("Arduino Nano").unwrap(),
        ["D5/ENA", "D6/IN1"]
    );
    assert_eq!(project.connections[2], vec!["OUT1/+", "OUT2/-"]);
    assert_eq!(project.connections[4], vec!["+/+12V", "-/GND"]);
    assert_eq!(project.connections[1].len(), 8);
    assert_eq!(project.pair_label_count(), 16);
    assert_eq!(project.instruction.len(), 2);
}

#[tokio::test]
async fn test_direct_answer_without_tools() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v2/chat");
        then.status(200).json_body(text_reply(
            r#"{"name": "Fan", "description": "d", "instruction": "spin", "connections": ["9V Battery;+$DC Motor;+", "9V Battery;-$DC Motor;-"]}"#,
        ));
    });

    let config = config_for(&server, "strict");
    let engine = ProjectEngine::from_config(&config, Catalog::builtin()).unwrap();
    let project = engine.build_project(&["9V Battery", "DC Motor"]).await.unwrap();

    api_mock.assert_hits(1);
    assert_eq!(project.components, vec!["9V Battery", "DC Motor"]);
    assert_eq!(project.connections, vec![vec!["+/+", "-/-"], vec!["+/+", "-/-"]]);
    assert_eq!(project.instruction, vec!["spin"]);
}

#[tokio::test]
async fn test_upstream_status_is_not_retried() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v2/chat");
        then.status(503).body("overloaded");
    });

    let config = config_for(&server, "strict");
    let engine = ProjectEngine::from_config(&config, Catalog::builtin()).unwrap();
    let err = engine.build_project(config.materials()).await.unwrap_err();

    api_mock.assert_hits(1);
    assert!(err.is_upstream());
    assert!(matches!(err, ProjectError::UpstreamStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_malformed_wire_strict_vs_lenient() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v2/chat");
        then.status(200).json_body(text_reply(
            r#"{"name": "x", "description": "y", "instruction": [], "connections": ["A;1$B;2", "A$B;y", "B;3$C;4"]}"#,
        ));
    });

    let strict = ProjectEngine::from_config(&config_for(&server, "strict"), Catalog::builtin()).unwrap();
    let err = strict.build_project(&["A", "B", "C"]).await.unwrap_err();
    assert!(matches!(err, ProjectError::MalformedConnection { index: 1, .. }));

    let lenient = ProjectEngine::from_config(&config_for(&server, "lenient"), Catalog::builtin()).unwrap();
    let project = lenient.build_project(&["A", "B", "C"]).await.unwrap();
    assert_eq!(project.components, vec!["A", "B", "C"]);
    assert_eq!(project.pair_label_count(), 4);
    assert_eq!(project.skipped_connections, vec!["A$B;y"]);
    assert_eq!(project.connections_of("C").unwrap(), ["3/4"]);
    assert!(project.connections_of("D").is_none());
    assert_eq!(lenient.mode(), NormalizeMode::Lenient);
}

#[test]
fn test_offline_normalization_from_saved_response() {
    let mut saved = NamedTempFile::new().unwrap();
    saved.write_all(ROBOT_CAR.as_bytes()).unwrap();

    let content = std::fs::read_to_string(saved.path()).unwrap();
    let raw = RawProjectDescription::from_json_str(&content).unwrap();
    let project = normalize_description(raw, NormalizeMode::Strict).unwrap();

    let json = serde_json::to_value(&project).unwrap();
    assert_eq!(json["components"][2], "DC Motor1");
    assert_eq!(json["connections"][3], serde_json::json!(["OUT3/+", "OUT4/-"]));
    assert_eq!(json["code"], "void setup() { pinMode(5, OUTPUT); }");
    assert!(json.get("skipped_connections").is_none());
}

#[test]
fn test_renormalizing_expanded_graph_keeps_component_order() {
    let raw = RawProjectDescription::from_json_str(ROBOT_CAR).unwrap();
    let first = normalize_connections(&raw.connections, NormalizeMode::Strict).unwrap();

    let expanded = expand_connections(&first.components, &first.connections).unwrap();
    let second = normalize_connections(&expanded, NormalizeMode::Strict).unwrap();

    assert_eq!(second.components, first.components);
    for (before, after) in first.connections.iter().zip(&second.connections) {
        let mut before = before.clone();
        let mut after = after.clone();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}

#[test]
fn test_renormalizing_keeps_order_when_component_first_appears_elsewhere() {
    let raw = ["A;1$A;2", "B;3$C;4", "A;5$C;6"];
    let first = normalize_connections(&raw, NormalizeMode::Strict).unwrap();

    let expanded = expand_connections(&first.components, &first.connections).unwrap();
    let second = normalize_connections(&expanded, NormalizeMode::Strict).unwrap();

    assert_eq!(first.components, vec!["A", "B", "C"]);
    assert_eq!(second.components, first.components);
    assert_eq!(second.connections.iter().map(Vec::len).sum::<usize>(), 6);
}
