//! Integration tests for reading canonical outputs after a batch

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use geodata_fetcher::app::{
    load_outputs, Dataset, Download, HttpFetcher, LoadedProgram, LocalLayout, ManifestEntry,
    Orchestrator, OrchestratorConfig, Schema, TracingSink, TransformEngine,
};
use geodata_fetcher::errors::{DatasetError, TransformError, TransformResult};

/// Entries here are copied verbatim; the engine is never reached
struct NoPrograms;

#[async_trait]
impl TransformEngine for NoPrograms {
    async fn load(&self, program: &Path) -> TransformResult<LoadedProgram> {
        Err(TransformError::MissingEntryPoint {
            program: program.to_path_buf(),
            entry_point: "convert".to_string(),
        })
    }

    async fn invoke(&self, program: &LoadedProgram, _: Vec<String>) -> TransformResult<String> {
        Err(TransformError::MissingEntryPoint {
            program: program.path.clone(),
            entry_point: "convert".to_string(),
        })
    }
}

const FUEL_STATIONS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-123.12, 49.28] },
      "properties": { "name": "Harbour Charger", "type": "ELEC", "access": "public" }
    },
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-123.0, 49.25] },
      "properties": { "name": "East Van CNG", "type": "CNG" }
    }
  ]
}"#;

fn entry(id: &str, schema: &str, src: String) -> ManifestEntry {
    ManifestEntry {
        id: id.to_string(),
        dataset_name: "Alternative Fuel".to_string(),
        country: "CA".to_string(),
        province: Some("BC".to_string()),
        region: None,
        city: Some("Vancouver".to_string()),
        provider: id.to_string(),
        schema: Some(schema.to_string()),
        converter: None,
        downloads: vec![Download {
            src,
            encoding: None,
            extract: None,
        }],
    }
}

fn file_url(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    url::Url::from_file_path(&path).unwrap().to_string()
}

#[tokio::test]
async fn test_batch_outputs_load_as_typed_records() {
    let dir = TempDir::new().unwrap();
    let layout = LocalLayout::new(dir.path().join("datasets"));
    let entries = vec![
        entry(
            "vancouver-fuel",
            "alternative-fuel",
            file_url(dir.path(), "fuel.geojson", FUEL_STATIONS),
        ),
        entry(
            "vancouver-broken",
            "alternative-fuel",
            file_url(dir.path(), "broken.geojson", "not json"),
        ),
    ];

    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default(),
        layout.clone(),
        Arc::new(HttpFetcher::new().unwrap()),
        Arc::new(NoPrograms),
        Arc::new(TracingSink),
    )
    .unwrap();
    let summary = orchestrator.run_batch(&entries, false).await;
    assert_eq!(summary.transformed, 2);

    let outputs = load_outputs(&layout, &entries).await;
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].path, layout.output_path(&entries[0]));

    let dataset = outputs[0].dataset.as_ref().unwrap();
    assert_eq!(dataset.schema(), Schema::AlternativeFuel);
    assert_eq!(dataset.feature_count(), 2);
    let names: Vec<_> = dataset
        .markers()
        .into_iter()
        .filter_map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Harbour Charger", "East Van CNG"]);

    let Dataset::AlternativeFuel(stations) = dataset else {
        panic!("Expected alternative fuel stations");
    };
    let fuel_types: Vec<_> = stations
        .features
        .iter()
        .filter_map(|f| f.properties.as_ref()?.fuel_type.as_deref())
        .collect();
    assert_eq!(fuel_types, vec!["ELEC", "CNG"]);

    assert!(matches!(
        outputs[1].dataset,
        Err(DatasetError::Parse { .. })
    ));
}
