//! Mapping between gateway types and Qdrant wire types.

use std::collections::HashMap;

use qdrant_client::qdrant::{
    self, Distance, ListValue, PointId as QdrantPointId, Struct, Value as QdrantValue,
    point_id::PointIdOptions, value::Kind,
};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::models::{DistanceMetric, Payload, PointId};

/// Payload key holding a caller's string id. Qdrant only accepts unsigned
/// integers and UUIDs, so string ids are stored under a derived UUID.
pub const GATEWAY_ID_KEY: &str = "_gateway_id";

const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93d5_4b7a_8e02_5c3f_d1a9_b764);

pub fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclidean => Distance::Euclid,
        DistanceMetric::Dot => Distance::Dot,
    }
}

pub fn from_qdrant_distance(distance: Distance) -> Option<DistanceMetric> {
    match distance {
        Distance::Cosine => Some(DistanceMetric::Cosine),
        Distance::Euclid => Some(DistanceMetric::Euclidean),
        Distance::Dot => Some(DistanceMetric::Dot),
        _ => None,
    }
}

/// Wire id for a gateway id. String ids map to a stable UUIDv5.
pub fn to_qdrant_id(id: &PointId) -> QdrantPointId {
    match id {
        PointId::Num(n) => QdrantPointId::from(*n),
        PointId::Text(text) => {
            QdrantPointId::from(Uuid::new_v5(&ID_NAMESPACE, text.as_bytes()).to_string())
        }
    }
}

/// Recover the caller's id, preferring the stored original over the wire id.
/// The bookkeeping key is removed from the payload.
pub fn restore_id(wire: Option<&QdrantPointId>, payload: &mut Payload) -> Option<PointId> {
    if let Some(Value::String(original)) = payload.remove(GATEWAY_ID_KEY) {
        return Some(PointId::Text(original));
    }
    match wire.and_then(|id| id.point_id_options.as_ref())? {
        PointIdOptions::Num(n) => Some(PointId::Num(*n)),
        PointIdOptions::Uuid(uuid) => Some(PointId::Text(uuid.clone())),
    }
}

/// Qdrant payload for a point, recording the original id when it is a string.
/// A caller-supplied value under the bookkeeping key is dropped.
pub fn to_qdrant_payload(id: &PointId, payload: Payload) -> HashMap<String, QdrantValue> {
    let mut result: HashMap<String, QdrantValue> = payload
        .into_iter()
        .filter(|(key, _)| key != GATEWAY_ID_KEY)
        .map(|(key, value)| (key, json_to_qdrant(value)))
        .collect();
    if let PointId::Text(text) = id {
        result.insert(
            GATEWAY_ID_KEY.to_string(),
            json_to_qdrant(Value::String(text.clone())),
        );
    }
    result
}

pub fn from_qdrant_payload(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_to_json(value)))
        .collect()
}

pub fn json_to_qdrant(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant(value)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

pub fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(qdrant::Struct { fields })) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, qdrant_to_json(value)))
                .collect(),
        ),
    }
}
