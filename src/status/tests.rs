use super::*;
use serde_json::json;

fn vehicle(status: Value) -> Value {
    json!({
        "fmsstatus_id": status,
        "fmsstatus_ts": 1_700_000_000,
        "name": "Hilfeleistungslöschgruppenfahrzeug 20",
        "shortname": "HLF 20",
        "lat": 52.52,
        "lng": 13.405
    })
}

#[test]
fn test_parse_complete_record() {
    let entity = parse_record("7", &vehicle(json!(2))).unwrap();

    assert_eq!(entity.entity_id, "7");
    assert_eq!(entity.status_code, 2);
    assert_eq!(entity.status_since.timestamp(), 1_700_000_000);
    assert_eq!(entity.display_name, "Hilfeleistungslöschgruppenfahrzeug 20");
    assert_eq!(entity.short_name, "HLF 20");
    assert_eq!(
        entity.location,
        Some(Location {
            lat: 52.52,
            lng: 13.405
        })
    );
}

#[test]
fn test_missing_status_is_rejected() {
    let record = json!({"fmsstatus_ts": 1_700_000_000, "name": "RTW"});
    assert_eq!(parse_record("1", &record), Err(RecordError::MissingStatus));

    let record = json!({"fmsstatus_id": null, "fmsstatus_ts": 1_700_000_000});
    assert_eq!(parse_record("1", &record), Err(RecordError::MissingStatus));
}

#[test]
fn test_malformed_status_is_rejected() {
    for bad in [json!("2"), json!(-1), json!(2.5), json!(true)] {
        let err = parse_record("1", &vehicle(bad)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidStatus(_)), "{:?}", err);
    }
}

#[test]
fn test_missing_timestamp_is_rejected() {
    let record = json!({"fmsstatus_id": 2, "name": "RTW"});
    assert_eq!(parse_record("1", &record), Err(RecordError::MissingTimestamp));
}

#[test]
fn test_non_object_record_is_rejected() {
    assert_eq!(parse_record("1", &json!([1, 2])), Err(RecordError::NotAnObject));
}

#[test]
fn test_zero_coordinates_mean_no_location() {
    let mut record = vehicle(json!(2));
    record["lat"] = json!(0);
    let entity = parse_record("7", &record).unwrap();
    assert!(entity.location.is_none());

    let mut record = vehicle(json!(2));
    record["lng"] = Value::Null;
    let entity = parse_record("7", &record).unwrap();
    assert!(entity.location.is_none());
}

#[test]
fn test_shortname_falls_back_to_name() {
    let record = json!({"fmsstatus_id": 3, "fmsstatus_ts": 1, "name": "ELW 1"});
    let entity = parse_record("4", &record).unwrap();
    assert_eq!(entity.short_name, "ELW 1");
}

#[test]
fn test_labels_fallback() {
    let labels: StatusLabels = vec![(6, "Nicht einsatzbereit".to_string())]
        .into_iter()
        .collect();

    assert_eq!(labels.label_for(6), "Nicht einsatzbereit");
    assert_eq!(labels.label_for(9), "Status 9");
    assert_eq!(labels.len(), 1);
}

#[test]
fn test_report_entities_keeps_going_after_bad_record() {
    let report = FleetReport::new(
        vec![
            ("1".to_string(), vehicle(json!(2))),
            ("2".to_string(), json!({"name": "broken"})),
            ("3".to_string(), vehicle(json!(6))),
        ],
        StatusLabels::new(),
    );

    let parsed: Vec<_> = report.entities().collect();
    assert_eq!(parsed.len(), 3);
    assert!(parsed[0].1.is_ok());
    assert_eq!(parsed[1].0, "2");
    assert_eq!(parsed[1].1, Err(RecordError::MissingStatus));
    assert_eq!(parsed[2].1.as_ref().unwrap().status_code, 6);
}
