//! CSV export of the derived view
//!
//! Rows follow the view's current order (already sorted and filtered). The
//! header row is bare; every data field is wrapped in double quotes with
//! embedded quotes doubled. Missing enrichment fields become empty quoted
//! fields. Lines are joined with `\n` and there is no trailing newline.

use std::path::Path;

use crate::errors::DashboardError;
use crate::pipeline::DerivedView;
use crate::types::{Lead, LeadField};

pub const CSV_MIME_TYPE: &str = "text/csv";

/// Serialize `view` to CSV text
pub fn serialize(view: &DerivedView) -> String {
    let header = LeadField::ALL
        .iter()
        .map(LeadField::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(view.len() + 1);
    lines.push(header);
    lines.extend(view.leads.iter().map(row));
    lines.join("\n")
}

fn row(lead: &Lead) -> String {
    LeadField::ALL
        .iter()
        .map(|field| quote(lead.field_text(*field).as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// A finished export, ready to hand to whatever delivers files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
    /// Number of data rows (header excluded)
    pub rows: usize,
}

impl ExportArtifact {
    pub fn from_view(file_name: impl Into<String>, view: &DerivedView) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: CSV_MIME_TYPE,
            contents: serialize(view),
            rows: view.len(),
        }
    }

    /// Write the contents to `path`
    pub async fn write_to(&self, path: &Path) -> Result<(), DashboardError> {
        tokio::fs::write(path, self.contents.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::derive;
    use crate::test_utils::{lead, sample_leads};
    use crate::types::{SortDirection, SortState};
    use std::sync::Arc;

    const HEADER: &str = "id,name,company,industry,size,source,created_at,quality,summary";

    #[test]
    fn test_header_only_for_empty_view() {
        assert_eq!(serialize(&DerivedView::default()), HEADER);
    }

    #[test]
    fn test_rows_follow_view_order() {
        let view = derive(
            &Arc::new(sample_leads()),
            SortState::by(LeadField::Size, SortDirection::Ascending),
            "e",
        );
        let csv = serialize(&view);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("\"2\",\"Bob\""));
        assert!(lines[2].starts_with("\"1\",\"Ann\""));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_quotes_doubled_and_missing_fields_empty() {
        let mut l = lead(5, "Jo \"JJ\" Smith", "Acme, Inc", "web", 12);
        l.summary = Some("said \"hi\"".to_string());
        let view = derive(&Arc::new(vec![l]), SortState::default(), "");
        let csv = serialize(&view);
        let data = csv.split('\n').nth(1).unwrap();
        assert_eq!(
            data,
            "\"5\",\"Jo \"\"JJ\"\" Smith\",\"Acme, Inc\",\"Technology\",\"12\",\"web\",\
             \"2024-01-06T09:00:00\",\"\",\"said \"\"hi\"\"\""
        );
        assert!(!csv.contains("null"));
    }

    #[test]
    fn test_artifact_metadata() {
        let view = derive(&Arc::new(sample_leads()), SortState::default(), "");
        let artifact = ExportArtifact::from_view("leads.csv", &view);
        assert_eq!(artifact.file_name, "leads.csv");
        assert_eq!(artifact.mime_type, "text/csv");
        assert_eq!(artifact.rows, 3);
    }

    #[tokio::test]
    async fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let view = derive(&Arc::new(sample_leads()), SortState::default(), "");
        let artifact = ExportArtifact::from_view("leads.csv", &view);
        artifact.write_to(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), artifact.contents);
    }
}
