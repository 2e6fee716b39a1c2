//! Records and record relationships.

pub mod model;

use std::collections::BTreeMap;

use crate::error::{MetagraphError, MetagraphResult};
use crate::value::Value;

pub use model::{OriginPackage, PackageAncestor, PackageRecord, Record, RecordRelationship};

/// Engine-internal identity key of a record.
pub const RECORD_ID_KEY: &str = "@id";

/// Engine-internal ordering key of a record.
pub const SORT_KEY: &str = "@sort_key";

/// Turn a raw property bag into a caller-facing record.
///
/// The identity key becomes the record id; both bookkeeping keys are removed.
pub fn shape_record(model: &str, mut props: BTreeMap<String, Value>) -> MetagraphResult<Record> {
    let id = match props.remove(RECORD_ID_KEY) {
        Some(Value::String(id)) => id,
        Some(other) => {
            return Err(MetagraphError::decode(format!(
                "record {RECORD_ID_KEY} must be a string, got {}",
                other.type_name()
            )))
        }
        None => return Err(MetagraphError::decode(format!("record without {RECORD_ID_KEY}"))),
    };
    props.remove(SORT_KEY);

    Ok(Record {
        id,
        model: model.to_string(),
        props,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_strips_bookkeeping_keys() {
        let props = BTreeMap::from([
            ("@id".to_string(), Value::from("rec-1")),
            ("@sort_key".to_string(), Value::Integer(12)),
            ("age".to_string(), Value::Integer(40)),
        ]);
        let record = shape_record("patient", props).unwrap();
        assert_eq!(record.id, "rec-1");
        assert_eq!(record.model, "patient");
        assert_eq!(record.props.len(), 1);
        assert!(!record.props.contains_key("@id"));
        assert!(!record.props.contains_key("@sort_key"));
    }

    #[test]
    fn test_shape_requires_identity() {
        let props = BTreeMap::from([("age".to_string(), Value::Integer(40))]);
        assert!(matches!(shape_record("patient", props), Err(MetagraphError::Decode(_))));
    }
}
