//! Turns the model's pairwise wire strings into an index-based adjacency list.
//!
//! Wire grammar: `<component>;<connector>$<component>;<connector>`. Components
//! are indexed in first-seen order and every wire appends its pair-label
//! (`<connectorA>/<connectorB>`) to both endpoints, so a graph built from `n`
//! wires always carries `2n` pair-labels.

use crate::domain::model::{NormalizedProject, RawProjectDescription};
use crate::utils::error::{ProjectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const POINT_SEPARATOR: char = '$';
const CONNECTOR_SEPARATOR: char = ';';
const PAIR_SEPARATOR: char = '/';

/// How malformed wire strings are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Abort on the first malformed wire.
    #[default]
    Strict,
    /// Skip malformed wires and keep going.
    Lenient,
}

impl std::str::FromStr for NormalizeMode {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(ProjectError::InvalidConfigValueError {
                field: "normalizer.mode".to_string(),
                value: other.to_string(),
                reason: "Valid modes: strict, lenient".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDefect {
    MissingPointSeparator,
    ExtraPointSeparator,
    MissingConnectorSeparator { point: u8 },
    ExtraConnectorSeparator { point: u8 },
}

impl fmt::Display for ConnectionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPointSeparator => write!(f, "missing '{}' between the two ends", POINT_SEPARATOR),
            Self::ExtraPointSeparator => write!(f, "more than one '{}'", POINT_SEPARATOR),
            Self::MissingConnectorSeparator { point } => {
                write!(f, "end {} has no '{}' before its connector", point, CONNECTOR_SEPARATOR)
            }
            Self::ExtraConnectorSeparator { point } => {
                write!(f, "end {} has more than one '{}'", point, CONNECTOR_SEPARATOR)
            }
        }
    }
}

/// One side of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionPoint<'a> {
    pub component: &'a str,
    pub connector: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire<'a> {
    pub from: ConnectionPoint<'a>,
    pub to: ConnectionPoint<'a>,
}

impl<'a> Wire<'a> {
    pub fn parse(raw: &'a str) -> std::result::Result<Self, ConnectionDefect> {
        let (first, second) = split_once_exact(raw, POINT_SEPARATOR).ok_or_else(|| {
            if raw.contains(POINT_SEPARATOR) {
                ConnectionDefect::ExtraPointSeparator
            } else {
                ConnectionDefect::MissingPointSeparator
            }
        })?;

        Ok(Self {
            from: parse_point(first, 1)?,
            to: parse_point(second, 2)?,
        })
    }

    pub fn pair_label(&self) -> String {
        format!("{}{}{}", self.from.connector, PAIR_SEPARATOR, self.to.connector)
    }
}

fn parse_point(raw: &str, point: u8) -> std::result::Result<ConnectionPoint<'_>, ConnectionDefect> {
    let (component, connector) = split_once_exact(raw, CONNECTOR_SEPARATOR).ok_or_else(|| {
        if raw.contains(CONNECTOR_SEPARATOR) {
            ConnectionDefect::ExtraConnectorSeparator { point }
        } else {
            ConnectionDefect::MissingConnectorSeparator { point }
        }
    })?;
    Ok(ConnectionPoint {
        component,
        connector,
    })
}

// 剛好一個分隔符號才算合法
fn split_once_exact(raw: &str, separator: char) -> Option<(&str, &str)> {
    let (head, tail) = raw.split_once(separator)?;
    if tail.contains(separator) {
        return None;
    }
    Some((head, tail))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConnection {
    pub index: usize,
    pub raw: String,
    pub defect: ConnectionDefect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalization {
    pub components: Vec<String>,
    pub connections: Vec<Vec<String>>,
    pub skipped: Vec<SkippedConnection>,
}

impl Normalization {
    fn index_of(&mut self, lookup: &mut HashMap<String, usize>, component: &str) -> usize {
        if let Some(&index) = lookup.get(component) {
            return index;
        }
        let index = self.components.len();
        self.components.push(component.to_string());
        self.connections.push(Vec::new());
        lookup.insert(component.to_string(), index);
        index
    }
}

/// Builds the adjacency list in input order. No sorting and no deduplication
/// of repeated wires.
pub fn normalize_connections<S: AsRef<str>>(raw_connections: &[S], mode: NormalizeMode) -> Result<Normalization> {
    let mut normalization = Normalization::default();
    let mut lookup: HashMap<String, usize> = HashMap::new();

    for (index, raw) in raw_connections.iter().enumerate() {
        let raw = raw.as_ref();
        let wire = match Wire::parse(raw) {
            Ok(wire) => wire,
            Err(defect) => match mode {
                NormalizeMode::Strict => {
                    return Err(ProjectError::MalformedConnection {
                        index,
                        raw: raw.to_string(),
                        defect,
                    })
                }
                NormalizeMode::Lenient => {
                    tracing::warn!("⚠️ Skipping malformed connection #{} '{}': {}", index, raw, defect);
                    normalization.skipped.push(SkippedConnection {
                        index,
                        raw: raw.to_string(),
                        defect,
                    });
                    continue;
                }
            },
        };

        let from = normalization.index_of(&mut lookup, wire.from.component);
        let to = normalization.index_of(&mut lookup, wire.to.component);

        let label = wire.pair_label();
        normalization.connections[from].push(label.clone());
        normalization.connections[to].push(label);
    }

    tracing::debug!(
        "Normalized {} connections into {} components ({} skipped)",
        raw_connections.len(),
        normalization.components.len(),
        normalization.skipped.len()
    );

    Ok(normalization)
}

/// Replaces `components`/`connections` of the description with the normalized
/// graph. Every other field passes through unchanged.
pub fn normalize_description(raw: RawProjectDescription, mode: NormalizeMode) -> Result<NormalizedProject> {
    let Normalization {
        components,
        connections,
        skipped,
    } = normalize_connections(&raw.connections, mode)?;

    Ok(NormalizedProject {
        name: raw.name,
        description: raw.description,
        instruction: raw.instruction,
        connections,
        components,
        code: raw.code,
        skipped_connections: skipped.into_iter().map(|entry| entry.raw).collect(),
        extra: raw.extra,
    })
}

/// Re-expands a normalized graph into wire strings.
///
/// Pair-labels do not record which side of a wire a component was on, so each
/// label is paired with the first matching unused label on a later component,
/// falling back to the same component (self-loop). The wires are then emitted
/// so that components first appear in index order. Normalizing the result
/// gives back the same component order and per-component label multisets; the
/// order of labels inside one component's list is not guaranteed.
pub fn expand_connections(components: &[String], connections: &[Vec<String>]) -> Result<Vec<String>> {
    if components.len() != connections.len() {
        return Err(ProjectError::ProcessingError {
            message: format!(
                "{} components but {} connection lists",
                components.len(),
                connections.len()
            ),
        });
    }

    let pairings = pair_labels(components, connections)?;
    let ordered = order_by_first_appearance(pairings, components)?;

    ordered
        .into_iter()
        .map(|(from, to, label)| {
            let (from_connector, to_connector) = label.split_once(PAIR_SEPARATOR).ok_or_else(|| {
                ProjectError::ProcessingError {
                    message: format!("pair-label '{}' has no '{}'", label, PAIR_SEPARATOR),
                }
            })?;
            Ok(format!(
                "{}{}{}{}{}{}{}",
                components[from],
                CONNECTOR_SEPARATOR,
                from_connector,
                POINT_SEPARATOR,
                components[to],
                CONNECTOR_SEPARATOR,
                to_connector
            ))
        })
        .collect()
}

// (左端, 右端, label)，左端索引一定 <= 右端
type Pairing<'a> = (usize, usize, &'a str);

fn pair_labels<'a>(components: &[String], connections: &'a [Vec<String>]) -> Result<Vec<Pairing<'a>>> {
    let mut used: Vec<Vec<bool>> = connections.iter().map(|labels| vec![false; labels.len()]).collect();
    let mut pairings = Vec::new();

    for (owner, labels) in connections.iter().enumerate() {
        for (position, label) in labels.iter().enumerate() {
            if used[owner][position] {
                continue;
            }
            used[owner][position] = true;

            let partner = (owner + 1..connections.len())
                .chain(std::iter::once(owner))
                .find_map(|candidate| {
                    connections[candidate]
                        .iter()
                        .enumerate()
                        .find(|(slot, other)| !used[candidate][*slot] && *other == label)
                        .map(|(slot, _)| (candidate, slot))
                });

            let Some((candidate, slot)) = partner else {
                return Err(ProjectError::ProcessingError {
                    message: format!(
                        "pair-label '{}' of '{}' has no matching endpoint",
                        label, components[owner]
                    ),
                });
            };
            used[candidate][slot] = true;
            pairings.push((owner, candidate, label.as_str()));
        }
    }

    Ok(pairings)
}

/// Emits the earliest pending wire that introduces no component out of order.
/// A wire `(a, b)` is emittable when `next` components have been seen and
/// either `a < next && b <= next` or `a == next && b <= next + 1`.
fn order_by_first_appearance<'a>(
    mut pending: Vec<Pairing<'a>>,
    components: &[String],
) -> Result<Vec<Pairing<'a>>> {
    let mut ordered = Vec::with_capacity(pending.len());
    let mut next = 0;

    while !pending.is_empty() {
        let emittable = pending.iter().position(|&(from, to, _)| {
            (from < next && to <= next) || (from == next && to <= next + 1)
        });

        let Some(position) = emittable else {
            return Err(ProjectError::ProcessingError {
                message: format!(
                    "no wire introduces '{}' in component order",
                    components.get(next).map(String::as_str).unwrap_or_default()
                ),
            });
        };

        let pairing = pending.remove(position);
        next = next.max(pairing.1 + 1);
        ordered.push(pairing);
    }

    Ok(ordered)
}
