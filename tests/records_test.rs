use model_gallery::{
    config::RecordsConfig,
    error::FetchError,
    records::{self, AssetRecord, RecordSource, RestRecordSource, StaticRecordSource, StyleVariant},
};

#[test]
fn should_parse_table_rows() {
    let body = r#"[
        {"model_id": 7, "name": "Flower", "description": null, "file_path": "flower.glb"},
        {"id": "b-2", "name": "Vase", "description": "Blue vase", "file_path": "models/vase.gltf",
         "style_variant": {"kind": "recolor", "color": [0.1, 0.2, 0.3]}},
        {"id": 3, "name": "Pot", "file_path": "pot.glb", "style_variant": null, "created_at": "2024-01-01"}
    ]"#;

    let parsed = records::parse_records(body).unwrap();

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0].id, "7");
    assert_eq!(parsed[0].display_name, "Flower");
    assert_eq!(parsed[0].description, "");
    assert_eq!(parsed[0].asset_path, "flower.glb");
    assert_eq!(parsed[0].style, StyleVariant::Original);
    assert_eq!(
        parsed[1].style,
        StyleVariant::Recolor {
            color: [0.1, 0.2, 0.3]
        }
    );
    assert_eq!(parsed[2].id, "3");
    assert_eq!(parsed[2].style, StyleVariant::Original);
}

#[test]
fn should_reject_rows_without_asset_path() {
    let body = r#"[{"id": 1, "name": "Broken"}]"#;
    assert!(matches!(
        records::parse_records(body),
        Err(FetchError::Decode(_))
    ));
}

#[test]
fn should_summarize_with_placeholder_description() {
    let record = AssetRecord::new("4", "Lamp", "lamp.glb");
    assert_eq!(record.summary(), "[4] Lamp: -");
    let record = record.with_description("Desk lamp");
    assert_eq!(record.summary(), "[4] Lamp: Desk lamp");
}

#[test]
fn should_build_rest_endpoint() {
    let source = RestRecordSource::new(RecordsConfig {
        url: "https://project.example.co/".to_string(),
        table: "models".to_string(),
        ..Default::default()
    });
    assert_eq!(
        source.endpoint(),
        "https://project.example.co/rest/v1/models?select=*"
    );
}

#[tokio::test]
async fn should_fail_without_credential_before_any_request() {
    let source = RestRecordSource::new(RecordsConfig {
        url: "http://127.0.0.1:9".to_string(),
        key_env: "MODEL_GALLERY_TEST_UNSET_RECORDS_KEY".to_string(),
        token_endpoint: None,
        ..Default::default()
    });

    let result = source.fetch().await;

    assert!(matches!(result, Err(FetchError::Credential(_))));
}

#[tokio::test]
async fn should_serve_static_records() {
    let list = vec![AssetRecord::new("1", "One", "one.gltf")];
    let source = StaticRecordSource::new(list.clone());
    assert_eq!(source.fetch().await.unwrap(), list);
}

#[tokio::test]
async fn should_fall_back_to_demo_records_without_backend() {
    let fetched = records::fetch_configured(&RecordsConfig::default())
        .await
        .unwrap();
    assert_eq!(fetched, records::demo_records());
}

#[test]
fn should_ship_demo_records_with_one_recolored_model() {
    let demo = records::demo_records();
    assert_eq!(demo.len(), 3);
    let recolored: Vec<_> = demo
        .iter()
        .filter(|r| matches!(r.style, StyleVariant::Recolor { .. }))
        .collect();
    assert_eq!(recolored.len(), 1);
    assert_eq!(recolored[0].id, "2");
}

#[test]
fn should_list_placeholder_for_empty_table() {
    assert_eq!(records::listing(&[]), vec!["No models available.".to_string()]);

    let demo = records::demo_records();
    let lines = records::listing(&demo);
    assert_eq!(lines.len(), demo.len());
    assert_eq!(lines[0], "[1] Cube: Unit cube");
}
