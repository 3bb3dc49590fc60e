use serde_json::json;
use similar_asserts::assert_eq;

use super::*;

#[test]
fn test_endpoint_pluralisation() {
    assert_eq!("datasets", EntityType::Dataset.endpoint());
    assert_eq!("facilityCycles", EntityType::FacilityCycle.endpoint());
    assert_eq!("studies", EntityType::Study.endpoint());
    assert_eq!("dataPublications", EntityType::DataPublication.endpoint());
}

#[test]
fn test_dataset_record_from_json() {
    let record = EntityRecord::from_json(
        EntityType::Dataset,
        json!({
            "id": 61,
            "name": "DATASET 61",
            "createTime": "2019-06-10 00:00:00",
            "type": { "id": 1, "name": "RAW" }
        }),
    )
    .unwrap();

    assert_eq!(EntityId::from(61), record.id);
    assert_eq!("DATASET 61", record.name);
    let EntityDetails::Dataset(details) = record.details else {
        panic!("expected dataset details");
    };
    assert_eq!(Some("RAW"), details.dataset_type.as_ref().map(|t| t.name.as_str()));
}

#[test]
fn test_data_publication_name_falls_back_to_title() {
    let record = EntityRecord::from_json(
        EntityType::DataPublication,
        json!({ "id": 3, "title": "Beamline paper", "pid": "10.5286/1" }),
    )
    .unwrap();

    assert_eq!("Beamline paper", record.name);
    assert_eq!(EntityType::DataPublication, record.entity_type());
}

#[test]
fn test_record_without_id_is_rejected() {
    let result = EntityRecord::from_json(EntityType::Instrument, json!({ "name": "LARMOR" }));
    assert!(result.is_err());
}

#[test]
fn test_dataset_type_reference_without_name() {
    let record = EntityRecord::from_json(
        EntityType::Dataset,
        json!({ "id": 7, "name": "DATASET 7", "type": { "id": 2 } }),
    )
    .unwrap();

    let EntityDetails::Dataset(details) = record.details else {
        panic!("expected dataset details");
    };
    assert_eq!(
        Some(NamedReference {
            id: EntityId::from(2),
            name: String::new(),
        }),
        details.dataset_type
    );
    assert_eq!(EntityId::from(0), NamedReference::default().id);
}
