pub mod columns;
pub mod enums;
pub mod error;
pub mod record;
pub mod report;

pub use columns::{CanonicalColumn, ColumnKind, canonical_columns, column_kind};
pub use enums::{DeviceCategory, DiagnosisCategory, Manufacturer, Sequence, Wall};
pub use error::{ModelError, Result};
pub use record::{
    CanonicalRecord, CauseAttribution, Cell, Comorbidities, Composites, Demographics,
    DeviceConfig, Diagnosis, Geometry, LeadPresence, Outcomes, SequenceArtefact,
};
pub use report::{Attempt, AttemptStatus, StageReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_report_counts() {
        let mut report = StageReport::new("models");
        report.push(Attempt::succeeded("a", Some("out/a.csv".into())));
        report.push(Attempt::failed("b", "perfect separation"));
        report.push(Attempt::skipped("c", "column absent"));
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert!(report.has_failures());
        assert_eq!(report.artifacts().len(), 1);
    }

    #[test]
    fn stage_report_serializes() {
        let mut report = StageReport::new("mediation");
        report.push(Attempt::failed("ICD_vs_PPM", "singular matrix"));
        let json = serde_json::to_string(&report).expect("serialize report");
        assert!(json.contains(r#""status":"failed""#));
        assert!(json.contains(r#""reason":"singular matrix""#));
        let round: StageReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round.attempts, report.attempts);
    }
}
