//! Arena-backed conversion between [`Value`] trees and JSON trees.
//!
//! Both directions walk the input breadth first with an explicit queue and
//! allocate one arena slot per node. A child is always allocated after its
//! parent, so folding the arena from the last slot to the first rebuilds the
//! output without recursion.
//!
//! JSON text is parsed with `serde_json`'s default recursion limit, so a
//! skeleton may not nest objects and arrays deeper than [`MAX_DEPTH`].
//! Markers count as one level.
use std::collections::VecDeque;

use serde_json::{Map, Value as JsonValue};

use crate::{
    dispatch::ReferenceId,
    error::{CodecError, CodecResult},
    value::Value,
};

/// Key of the single-entry mapping that stands for an out-of-band value.
pub const MARKER_KEY: &str = "\u{8}";

/// Deepest nesting of JSON objects and arrays a structure may have.
pub const MAX_DEPTH: usize = 127;

type NodeId = usize;

enum SkeletonNode {
    Pending,
    Scalar(JsonValue),
    List(Vec<NodeId>),
    Map(Vec<(String, NodeId)>),
    Marker(ReferenceId),
}

/// JSON skeleton of a [`Value`] tree.
pub(crate) struct Skeleton {
    nodes: Vec<SkeletonNode>,
}

impl Skeleton {
    /// Skeleton of a tree made of lists, maps and scalars only.
    pub fn plain(root: &Value) -> CodecResult<Self> {
        Self::build(root, None::<fn(&Value) -> CodecResult<ReferenceId>>)
    }

    /// Skeleton where every other leaf is replaced by the marker returned
    /// by `record`. Mappings may not use [`MARKER_KEY`] themselves.
    pub fn extended(
        root: &Value,
        record: impl FnMut(&Value) -> CodecResult<ReferenceId>,
    ) -> CodecResult<Self> {
        Self::build(root, Some(record))
    }

    fn build(
        root: &Value,
        mut record: Option<impl FnMut(&Value) -> CodecResult<ReferenceId>>,
    ) -> CodecResult<Self> {
        let mut nodes = vec![SkeletonNode::Pending];
        let mut queue: VecDeque<(&Value, NodeId, usize)> = VecDeque::from([(root, 0, 1)]);

        while let Some((source, slot, depth)) = queue.pop_front() {
            let scalar = matches!(
                source,
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
            );
            if !scalar && depth > MAX_DEPTH {
                return Err(CodecError::CapacityExceeded(format!(
                    "structure nested deeper than {MAX_DEPTH} levels"
                )));
            }

            let mut child = |value| {
                let id = nodes.len();
                nodes.push(SkeletonNode::Pending);
                queue.push_back((value, id, depth + 1));
                id
            };

            let node = match source {
                Value::Null => SkeletonNode::Scalar(JsonValue::Null),
                Value::Bool(b) => SkeletonNode::Scalar(JsonValue::Bool(*b)),
                Value::Number(n) => SkeletonNode::Scalar(JsonValue::Number(n.clone())),
                Value::String(s) => SkeletonNode::Scalar(JsonValue::String(s.clone())),
                Value::List(items) => SkeletonNode::List(items.iter().map(&mut child).collect()),
                Value::Map(entries) => {
                    if record.is_some() && entries.contains_key(MARKER_KEY) {
                        return Err(CodecError::ReservedKey(MARKER_KEY.to_owned()));
                    }
                    SkeletonNode::Map(
                        entries
                            .iter()
                            .map(|(key, value)| (key.clone(), child(value)))
                            .collect(),
                    )
                }
                Value::Array(_) | Value::Extended(_) | Value::Custom(_) => match record.as_mut() {
                    Some(record) => SkeletonNode::Marker(record(source)?),
                    None => {
                        return Err(CodecError::UnencodableValue {
                            kind: source.kind_name(),
                        });
                    }
                },
            };
            nodes[slot] = node;
        }

        Ok(Self { nodes })
    }

    pub fn into_json(self) -> JsonValue {
        let mut built: Vec<Option<JsonValue>> = Vec::with_capacity(self.nodes.len());
        built.resize_with(self.nodes.len(), || None);

        for (id, node) in self.nodes.into_iter().enumerate().rev() {
            let mut take = |child: NodeId| built[child].take().unwrap_or_default();
            let value = match node {
                SkeletonNode::Pending => JsonValue::Null,
                SkeletonNode::Scalar(value) => value,
                SkeletonNode::List(children) => {
                    JsonValue::Array(children.into_iter().map(&mut take).collect())
                }
                SkeletonNode::Map(entries) => JsonValue::Object(
                    entries
                        .into_iter()
                        .map(|(key, child)| (key, take(child)))
                        .collect(),
                ),
                SkeletonNode::Marker(reference) => {
                    let mut marker = Map::new();
                    marker.insert(MARKER_KEY.to_owned(), JsonValue::from(reference.0));
                    JsonValue::Object(marker)
                }
            };
            built[id] = Some(value);
        }

        built.into_iter().next().flatten().unwrap_or_default()
    }
}

enum Slot {
    Pending,
    Done(Value),
    List(Vec<NodeId>),
    Map(Vec<(String, NodeId)>),
}

/// Convert a parsed JSON tree into a [`Value`].
///
/// `substitute` sees every JSON object first; returning `Some` replaces the
/// object, whose contents are then not visited.
pub(crate) fn from_json(
    root: JsonValue,
    mut substitute: impl FnMut(&Map<String, JsonValue>) -> CodecResult<Option<Value>>,
) -> CodecResult<Value> {
    let mut slots = vec![Slot::Pending];
    let mut queue: VecDeque<(JsonValue, NodeId)> = VecDeque::from([(root, 0)]);

    while let Some((source, slot)) = queue.pop_front() {
        let mut child = |value| {
            let id = slots.len();
            slots.push(Slot::Pending);
            queue.push_back((value, id));
            id
        };

        let node = match source {
            JsonValue::Null => Slot::Done(Value::Null),
            JsonValue::Bool(b) => Slot::Done(Value::Bool(b)),
            JsonValue::Number(n) => Slot::Done(Value::Number(n)),
            JsonValue::String(s) => Slot::Done(Value::String(s)),
            JsonValue::Array(items) => Slot::List(items.into_iter().map(&mut child).collect()),
            JsonValue::Object(entries) => match substitute(&entries)? {
                Some(value) => Slot::Done(value),
                None => Slot::Map(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, child(value)))
                        .collect(),
                ),
            },
        };
        slots[slot] = node;
    }

    let mut built: Vec<Option<Value>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);

    for (id, slot) in slots.into_iter().enumerate().rev() {
        let mut take = |child: NodeId| built[child].take().unwrap_or(Value::Null);
        let value = match slot {
            Slot::Pending => Value::Null,
            Slot::Done(value) => value,
            Slot::List(children) => Value::List(children.into_iter().map(&mut take).collect()),
            Slot::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, child)| (key, take(child)))
                    .collect(),
            ),
        };
        built[id] = Some(value);
    }

    Ok(built.into_iter().next().flatten().unwrap_or(Value::Null))
}
