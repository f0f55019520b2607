//! Records: structured values encoded into request bodies and queries.
//!
//! A [`Record`] lists its own fields as `(wire key, value)` pairs. The list
//! is usually generated by `#[derive(Record)]`, which applies renaming and
//! skipping at compile time:
//!
//! ```ignore
//! use parcel::Record;
//!
//! #[derive(Record)]
//! #[record(rename_all = "camelCase")]
//! struct Search {
//!     search_term: String,
//!     #[record(rename = "p")]
//!     page: Option<u32>,
//! }
//! ```
//!
//! Encoding is fail-soft at the body boundary: [`Record::to_data`] and
//! [`Record::to_query_params`] log the failure and return `None`, the same
//! outcome as a record with nothing to send. Use [`Record::try_wire_map`] to
//! see the error.

use bytes::Bytes;
use tracing::warn;

use crate::{EncodeError, WireMap, WireValue};

/// How a record treats fields whose value is [`WireValue::Null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Drop null fields, like absent optionals.
    #[default]
    Omit,
    /// Keep null fields (JSON `null`, empty query value, empty multipart field).
    Emit,
}

/// A structured value with an explicit, ordered field list.
pub trait Record {
    /// Null handling for this record type.
    const NULL_POLICY: NullPolicy = NullPolicy::Omit;

    /// Fields in declaration order, keyed by their wire names.
    fn fields(&self) -> Result<Vec<(String, WireValue)>, EncodeError>;

    /// Build the wire map, applying [`Self::NULL_POLICY`].
    ///
    /// Override this to supply a hand-built map.
    fn try_wire_map(&self) -> Result<WireMap, EncodeError> {
        let mut map = WireMap::new();
        for (key, value) in self.fields()? {
            if value.is_null() && Self::NULL_POLICY == NullPolicy::Omit {
                continue;
            }
            map.insert(key, value);
        }
        Ok(map)
    }

    /// The wire map, or `None` when it is empty or encoding failed.
    fn wire_map(&self) -> Option<WireMap> {
        match self.try_wire_map() {
            Ok(map) if map.is_empty() => None,
            Ok(map) => Some(map),
            Err(err) => {
                warn!(
                    record = std::any::type_name::<Self>(),
                    error = %err,
                    "record encoding failed, sending no data"
                );
                None
            }
        }
    }

    /// JSON body bytes, or `None` when there is nothing to send.
    ///
    /// An empty record yields `None`, never `{}`.
    fn to_data(&self) -> Option<Bytes> {
        let map = self.wire_map()?;
        match serde_json::to_vec(&map) {
            Ok(json) => Some(Bytes::from(json)),
            Err(err) => {
                warn!(
                    record = std::any::type_name::<Self>(),
                    error = %err,
                    "record serialization failed, sending no data"
                );
                None
            }
        }
    }

    /// Flat query parameters, or `None` when there are none.
    fn to_query_params(&self) -> Option<Vec<(String, String)>> {
        self.wire_map().map(|map| map.to_query_pairs())
    }

    /// JSON text of the record (`{}` when empty).
    fn to_json_string(&self) -> String {
        let map = self.wire_map().unwrap_or_default();
        serde_json::to_string(&map).unwrap_or_else(|_| String::from("{}"))
    }
}

impl Record for WireMap {
    fn fields(&self) -> Result<Vec<(String, WireValue)>, EncodeError> {
        Ok(self.clone().into_iter().collect())
    }

    fn try_wire_map(&self) -> Result<WireMap, EncodeError> {
        Ok(self.clone())
    }
}
