//! Tests for `#[derive(Record)]`.

use std::fmt;

use parcel::{Form, MultipartFile, NullPolicy, Record, ToWire, WireValue};

#[derive(Debug, Record)]
struct Params {
    #[record(rename = "param1_renamed")]
    param1: String,
    param2: i64,
}

#[test]
fn renamed_field_replaces_original_key() {
    let params = Params {
        param1: "value1".to_string(),
        param2: 7,
    };

    let map = params.wire_map().expect("non-empty");
    assert_eq!(map.keys().collect::<Vec<_>>(), ["param1_renamed", "param2"]);
    assert!(!map.contains_key("param1"));
    assert_eq!(
        params.to_query_params(),
        Some(vec![
            ("param1_renamed".to_string(), "value1".to_string()),
            ("param2".to_string(), "7".to_string()),
        ])
    );
}

#[derive(Debug, Default, Record)]
struct Filters {
    tag: Option<String>,
    limit: Option<u32>,
}

#[test]
fn empty_record_has_no_output() {
    let filters = Filters::default();
    assert_eq!(filters.wire_map(), None);
    assert_eq!(filters.to_data(), None);
    assert_eq!(filters.to_query_params(), None);
}

#[derive(Debug, Record)]
#[record(emit_nulls)]
struct Patch {
    nickname: Option<String>,
}

#[test]
fn emit_nulls_keeps_none() {
    assert_eq!(Patch::NULL_POLICY, NullPolicy::Emit);
    let patch = Patch { nickname: None };
    assert_eq!(
        patch.to_data().as_deref(),
        Some(br#"{"nickname":null}"#.as_slice())
    );
    assert_eq!(
        patch.to_query_params(),
        Some(vec![("nickname".to_string(), String::new())])
    );
}

#[derive(Debug, Clone, Copy, Record)]
#[record(rename_all = "snake_case")]
enum Status {
    InProgress,
    #[record(rename = "finished")]
    Done,
}

#[derive(Debug, Clone, Copy, Record)]
enum Priority {
    Low = 1,
    High = 10,
}

struct Version(u8, u8);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

#[derive(Record)]
#[record(rename_all = "camelCase")]
struct Ticket {
    ticket_id: u64,
    status: Status,
    priority: Priority,
    labels: Vec<String>,
    #[record(display)]
    min_version: Version,
    #[record(skip)]
    #[allow(dead_code)]
    internal_note: String,
    owner: Owner,
}

#[derive(Record)]
struct Owner {
    name: String,
}

fn ticket() -> Ticket {
    Ticket {
        ticket_id: 12,
        status: Status::InProgress,
        priority: Priority::High,
        labels: vec!["a".to_string(), "b".to_string()],
        min_version: Version(1, 2),
        internal_note: "secret".to_string(),
        owner: Owner {
            name: "ada".to_string(),
        },
    }
}

#[test]
fn enums_encode_as_names_or_discriminants() {
    assert_eq!(
        Status::InProgress.to_wire().expect("encodes"),
        WireValue::from("in_progress")
    );
    assert_eq!(
        Status::Done.to_wire().expect("encodes"),
        WireValue::from("finished")
    );
    assert_eq!(
        Priority::Low.to_wire().expect("encodes"),
        WireValue::from(1_i64)
    );
}

#[test]
fn nested_record_as_json() {
    let json: serde_json::Value =
        serde_json::from_slice(&ticket().to_data().expect("data")).expect("valid JSON");

    assert_eq!(
        json,
        serde_json::json!({
            "ticketId": 12,
            "status": "in_progress",
            "priority": 10,
            "labels": ["a", "b"],
            "minVersion": "1.2",
            "owner": { "name": "ada" }
        })
    );
}

#[test]
fn nested_record_as_query() {
    let pairs = ticket().to_query_params().expect("pairs");
    let labels = pairs
        .iter()
        .find(|(key, _)| key == "labels")
        .map(|(_, value)| value.as_str());
    assert_eq!(labels, Some(r#"["a", "b"]"#));
    assert!(pairs.iter().all(|(key, _)| key != "internalNote"));
}

#[derive(Record)]
struct Upload {
    title: String,
    attachment: MultipartFile,
    note: Option<String>,
}

#[test]
fn record_partitions_into_multipart() {
    let upload = Upload {
        title: "report".to_string(),
        attachment: MultipartFile::from_bytes("report.pdf", b"%PDF".to_vec()),
        note: None,
    };

    let form = Form::from_record(&upload);
    let parts = form.parts();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name(), "title");
    assert!(!parts[0].is_file());
    assert_eq!(parts[1].name(), "attachment");
    assert_eq!(parts[1].filename(), Some("report.pdf"));
    assert_eq!(parts[1].content_type(), Some("application/pdf"));

    let encoded = form.encode();
    let parsed = Form::parse(&encoded, form.boundary()).expect("round-trips");
    assert_eq!(parsed.parts(), form.parts());
}

#[test]
fn non_finite_numbers_fail_soft() {
    #[derive(Record)]
    struct Reading {
        value: f64,
    }

    let reading = Reading { value: f64::NAN };
    assert!(reading.try_wire_map().is_err());
    assert_eq!(reading.wire_map(), None);
    assert_eq!(reading.to_data(), None);
}

#[derive(Record)]
struct Page<T> {
    items: Vec<T>,
    total: u32,
    #[record(skip)]
    #[allow(dead_code)]
    cursor: Option<T>,
}

fn json(data: Option<impl AsRef<[u8]>>) -> serde_json::Value {
    serde_json::from_slice(data.expect("data").as_ref()).expect("valid JSON")
}

#[test]
fn generic_record_encodes_its_items() {
    let numbers = Page {
        items: vec![1_u32, 2],
        total: 2,
        cursor: None,
    };
    assert_eq!(
        json(numbers.to_data()),
        serde_json::json!({ "items": [1, 2], "total": 2 })
    );

    let owners = Page {
        items: vec![Owner {
            name: "ada".to_string(),
        }],
        total: 1,
        cursor: None,
    };
    assert_eq!(
        json(owners.to_data()),
        serde_json::json!({ "items": [{ "name": "ada" }], "total": 1 })
    );
}
