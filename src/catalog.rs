use crate::domain::model::{ComponentSpec, ComponentType, ProjectTemplate};
use crate::utils::error::{ProjectError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

static BUILTIN: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(Catalog::builtin_data()));

/// 靜態元件資料庫，載入後不再變動
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    components: Vec<ComponentSpec>,
    #[serde(default)]
    project_templates: Vec<ProjectTemplate>,
}

impl Catalog {
    pub fn builtin() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProjectError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(content).map_err(|e| ProjectError::ConfigValidationError {
                field: "catalog".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        let mut seen = HashSet::new();
        for component in &catalog.components {
            if !seen.insert(component.name.as_str()) {
                return Err(ProjectError::InvalidConfigValueError {
                    field: "catalog.components".to_string(),
                    value: component.name.clone(),
                    reason: "Duplicate component name".to_string(),
                });
            }
        }

        tracing::debug!(
            "Loaded catalog with {} components and {} templates",
            catalog.components.len(),
            catalog.project_templates.len()
        );
        Ok(catalog)
    }

    pub fn get_component_info(&self, name: &str) -> Result<&ComponentSpec> {
        self.components
            .iter()
            .find(|component| component.name == name)
            .ok_or_else(|| ProjectError::ComponentNotFound {
                name: name.to_string(),
            })
    }

    pub fn all_component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    pub fn project_templates(&self) -> BTreeMap<String, ProjectTemplate> {
        self.project_templates
            .iter()
            .map(|t| (t.name.clone(), t.clone()))
            .collect()
    }

    /// Materials with no catalog entry, deduplicated, in input order.
    pub fn missing_components(&self, materials: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for material in materials {
            if self.get_component_info(material).is_err() && !missing.contains(material) {
                missing.push(material.clone());
            }
        }
        missing
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn builtin_data() -> Self {
        let components = vec![
            component(
                "Arduino Nano",
                ComponentType::Microcontroller,
                vec![
                    (
                        "digital",
                        vec!["D2", "D3", "D4", "D5", "D6", "D7", "D8", "D9", "D10", "D11", "D12", "D13"],
                    ),
                    ("analog", vec!["A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7"]),
                    ("power", vec!["+5V", "3.3V", "GND", "VIN"]),
                ],
                vec![
                    ("operating_voltage", "5V".into()),
                    ("input_voltage", "7-12V".into()),
                    ("digital_pins", 14.into()),
                    ("analog_pins", 8.into()),
                ],
            ),
            component(
                "L298N Motor Driver",
                ComponentType::MotorDriver,
                vec![
                    ("motor_a", vec!["OUT1", "OUT2"]),
                    ("motor_b", vec!["OUT3", "OUT4"]),
                    ("control", vec!["IN1", "IN2", "IN3", "IN4", "ENA", "ENB"]),
                    ("power", vec!["+12V", "+5V", "GND"]),
                ],
                vec![
                    ("max_current", "2A".into()),
                    ("logic_voltage", "5V".into()),
                    ("motor_voltage", "5V-35V".into()),
                ],
            ),
            component(
                "DC Motor",
                ComponentType::Actuator,
                vec![("terminals", vec!["+", "-"])],
                vec![("voltage", "3V-12V".into()), ("current", "0.1A-2A".into())],
            ),
            component(
                "9V Battery",
                ComponentType::PowerSource,
                vec![("terminals", vec!["+", "-"])],
                vec![
                    ("voltage", "9V".into()),
                    ("capacity", "500mAh-1000mAh".into()),
                ],
            ),
        ];

        let project_templates = vec![ProjectTemplate {
            name: "robot_car".to_string(),
            difficulty: "intermediate".to_string(),
            time_estimate: "2-3 hours".to_string(),
            required_components: vec![
                "Arduino Nano".to_string(),
                "L298N Motor Driver".to_string(),
                "DC Motor".to_string(),
                "9V Battery".to_string(),
            ],
        }];

        Self {
            components,
            project_templates,
        }
    }
}

fn component(
    name: &str,
    component_type: ComponentType,
    pins: Vec<(&str, Vec<&str>)>,
    specifications: Vec<(&str, serde_json::Value)>,
) -> ComponentSpec {
    ComponentSpec {
        name: name.to_string(),
        component_type,
        pins: pins
            .into_iter()
            .map(|(group, labels)| {
                (
                    group.to_string(),
                    labels.into_iter().map(str::to_string).collect(),
                )
            })
            .collect(),
        specifications: specifications
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    }
}
