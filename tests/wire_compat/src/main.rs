fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};
    use ecgupload_protocol::{
        AuditRecord, DataType, MetadataContext, SidecarMetadata, TransferOutcome, UploadStatus,
    };
    use uuid::Uuid;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    fn batch_context() -> MetadataContext {
        let mut ctx = MetadataContext::new("alice@example.org", "researcher", 3)
            .submitted_at(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap());
        ctx.batch_id = Uuid::parse_str("5b8f2e2c-9a51-4c1e-8d7f-0a6c2b1e3f44").unwrap();
        ctx
    }

    // --- Sidecar documents ---

    #[test]
    fn fixture_sidecar() {
        let sidecar: SidecarMetadata = roundtrip_test("sidecar.json");
        assert_eq!(sidecar.data_type, DataType::Ring);
        assert_eq!(sidecar.size_bytes, 48213);
    }

    #[test]
    fn sidecar_bytes_match_landing_format() {
        let sidecar = batch_context().sidecar(DataType::Ring, "ring_01.csv", 48213);
        let rendered = String::from_utf8(sidecar.to_pretty_json().unwrap()).unwrap();
        assert_eq!(rendered, read_fixture("sidecar.json").trim_end());
    }

    #[test]
    fn fixture_sidecar_without_batch_id() {
        // Documents written before batch ids existed.
        let sidecar: SidecarMetadata = roundtrip_test("sidecar_legacy.json");
        assert!(sidecar.batch_id.is_none());
        assert_eq!(sidecar.data_type, DataType::Visit2Redcap);
    }

    // --- Transfer outcomes ---

    #[test]
    fn fixture_outcome_uploaded() {
        let outcome: TransferOutcome = roundtrip_test("outcome_uploaded.json");
        assert_eq!(outcome.status(), UploadStatus::Uploaded);
        assert_eq!(outcome.bytes_written(), 48213);
    }

    #[test]
    fn fixture_outcome_failed() {
        let outcome: TransferOutcome = roundtrip_test("outcome_failed.json");
        assert_eq!(outcome.status(), UploadStatus::Failed);
        assert!(outcome.error().unwrap().contains("connection reset"));
    }

    // --- Audit log rows ---

    #[test]
    fn fixture_audit_records() {
        let records: Vec<AuditRecord> = roundtrip_test("audit_records.json");
        assert_eq!(records.len(), 2);
        assert!(records[0].error_detail.is_none());
        assert_eq!(records[1].remote_path, "");
    }

    #[test]
    fn outcomes_project_to_audit_fixture() {
        let outcomes: Vec<TransferOutcome> = vec![
            serde_json::from_value(load_fixture("outcome_uploaded.json")).unwrap(),
            serde_json::from_value(load_fixture("outcome_failed.json")).unwrap(),
        ];
        let records: Vec<AuditRecord> = outcomes
            .iter()
            .map(|o| o.to_audit_record(DataType::Ring))
            .collect();

        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            load_fixture("audit_records.json")
        );
    }

    #[test]
    fn category_tags_are_stable() {
        let tags: Vec<String> = DataType::ALL
            .iter()
            .map(|t| serde_json::to_value(t).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            tags,
            [
                "visita_01_redcap",
                "visita_02_redcap",
                "dados_relogios",
                "dados_anel",
                "dados_bioimpedancia"
            ]
        );
    }
}
