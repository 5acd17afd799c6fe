use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// 元件分類，未知的分類一律歸為 `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Microcontroller,
    MotorDriver,
    Actuator,
    PowerSource,
    Sensor,
    Passive,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(skip_serializing)]
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub pins: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub specifications: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    #[serde(skip_serializing)]
    pub name: String,
    pub difficulty: String,
    pub time_estimate: String,
    pub required_components: Vec<String>,
}

/// 模型回傳的專案描述，尚未正規化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProjectDescription {
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_steps")]
    pub instruction: Vec<String>,
    pub connections: Vec<String>,
    /// Overwritten by normalization.
    #[serde(default)]
    pub components: serde_json::Value,
    #[serde(default)]
    pub code: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawProjectDescription {
    pub fn from_json_str(content: &str) -> crate::utils::error::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            tracing::debug!("Unparsable project description: {}", content);
            crate::utils::error::ProjectError::upstream(format!(
                "project description is not valid: {}",
                e
            ))
        })
    }
}

/// Index-based wiring graph: `connections[i]` holds the pair-labels of `components[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProject {
    pub name: String,
    pub description: String,
    pub instruction: Vec<String>,
    pub connections: Vec<Vec<String>>,
    pub components: Vec<String>,
    pub code: String,
    /// Raw wires dropped in lenient mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_connections: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NormalizedProject {
    pub fn pair_label_count(&self) -> usize {
        self.connections.iter().map(Vec::len).sum()
    }

    pub fn connections_of(&self, component: &str) -> Option<&[String]> {
        self.components
            .iter()
            .position(|name| name == component)
            .map(|index| self.connections[index].as_slice())
    }
}

// 模型有時會把步驟回成單一字串
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Steps {
        Many(Vec<String>),
        One(String),
    }

    Ok(match Steps::deserialize(deserializer)? {
        Steps::Many(steps) => steps,
        Steps::One(step) => vec![step],
    })
}
