//! Common types used throughout the dashboard

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Industries offered by the filter control. The field itself is open-ended:
/// the source may return values outside this list and they are kept as-is.
pub const KNOWN_INDUSTRIES: [&str; 4] = ["Technology", "Manufacturing", "Healthcare", "Finance"];

/// Range of the minimum-size control. Values outside it are accepted, not clamped.
pub const MIN_SIZE_CONTROL_MAX: u64 = 500;

/// A single business contact as returned by the lead source.
///
/// Leads are never mutated client-side; a refresh replaces the whole
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub industry: String,
    /// Company headcount
    pub size: u64,
    /// Origin channel (open enumeration)
    pub source: String,
    /// ISO-8601 timestamp, kept verbatim
    pub created_at: String,
    /// Enrichment output; absent when enrichment has not run
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Value of a single lead field, as seen by the sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Number(i128),
    Text(&'a str),
    Missing,
}

impl Lead {
    /// Borrow the value of `field`.
    pub fn field(&self, field: LeadField) -> FieldValue<'_> {
        match field {
            LeadField::Id => FieldValue::Number(i128::from(self.id)),
            LeadField::Size => FieldValue::Number(i128::from(self.size)),
            LeadField::Name => FieldValue::Text(&self.name),
            LeadField::Company => FieldValue::Text(&self.company),
            LeadField::Industry => FieldValue::Text(&self.industry),
            LeadField::Source => FieldValue::Text(&self.source),
            LeadField::CreatedAt => FieldValue::Text(&self.created_at),
            LeadField::Quality => self
                .quality
                .as_deref()
                .map_or(FieldValue::Missing, FieldValue::Text),
            LeadField::Summary => self
                .summary
                .as_deref()
                .map_or(FieldValue::Missing, FieldValue::Text),
        }
    }

    /// Text form of `field`; `None` for missing optional fields.
    pub fn field_text(&self, field: LeadField) -> Option<String> {
        match self.field(field) {
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Text(s) => Some(s.to_string()),
            FieldValue::Missing => None,
        }
    }
}

/// Lead field names, in export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Id,
    Name,
    Company,
    Industry,
    Size,
    Source,
    CreatedAt,
    Quality,
    Summary,
}

impl LeadField {
    pub const ALL: [LeadField; 9] = [
        LeadField::Id,
        LeadField::Name,
        LeadField::Company,
        LeadField::Industry,
        LeadField::Size,
        LeadField::Source,
        LeadField::CreatedAt,
        LeadField::Quality,
        LeadField::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::Id => "id",
            LeadField::Name => "name",
            LeadField::Company => "company",
            LeadField::Industry => "industry",
            LeadField::Size => "size",
            LeadField::Source => "source",
            LeadField::CreatedAt => "created_at",
            LeadField::Quality => "quality",
            LeadField::Summary => "summary",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown lead field '{}'", s))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort selection. No key means the input order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortState {
    pub key: Option<LeadField>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(key: LeadField, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Selecting the active key flips the direction; a new key starts ascending.
    pub fn toggled(self, key: LeadField) -> Self {
        if self.key == Some(key) {
            Self::by(key, self.direction.flipped())
        } else {
            Self::by(key, SortDirection::Ascending)
        }
    }
}

/// User filter selections.
///
/// `industry` and `min_size` drive the remote query, `search_text` only the
/// local filter stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Empty means no industry filter
    pub industry: String,
    /// Zero means no minimum
    pub min_size: u64,
    /// Empty means no text filter
    pub search_text: String,
}

/// Display mode of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Chart,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Table => "table",
            ViewMode::Chart => "chart",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ViewMode::Table),
            "chart" => Ok(ViewMode::Chart),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// Coerce raw control input into a minimum size.
///
/// Reads an optional sign followed by leading digits, ignoring anything after
/// them. Input without leading digits, and negative values, mean "no minimum".
pub fn coerce_min_size(raw: &str) -> u64 {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end].parse().unwrap_or(0)
}

/// The applied lead collection together with the generation that produced it.
///
/// Generation 0 is the empty collection that exists before any fetch succeeds.
#[derive(Debug, Clone, Default)]
pub struct LeadCollection {
    pub generation: u64,
    pub leads: Arc<Vec<Lead>>,
}

impl LeadCollection {
    pub fn new(generation: u64, leads: Vec<Lead>) -> Self {
        Self {
            generation,
            leads: Arc::new(leads),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_deserializes_without_enrichment() {
        let json = r#"{"id":7,"name":"Ann","company":"Acme","industry":"Finance",
            "size":40,"source":"web","created_at":"2024-01-02T00:00:00"}"#;
        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.id, 7);
        assert!(lead.quality.is_none());
        assert!(lead.summary.is_none());
    }

    #[test]
    fn test_lead_deserializes_null_enrichment() {
        let json = r#"{"id":1,"name":"A","company":"B","industry":"Other","size":0,
            "source":"ref","created_at":"x","quality":null,"summary":"hot"}"#;
        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.field(LeadField::Quality), FieldValue::Missing);
        assert_eq!(lead.field(LeadField::Summary), FieldValue::Text("hot"));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in LeadField::ALL {
            assert_eq!(field.as_str().parse::<LeadField>().unwrap(), field);
        }
        assert!("bogus".parse::<LeadField>().is_err());
        assert_eq!("Created_At".parse::<LeadField>().unwrap(), LeadField::CreatedAt);
    }

    #[test]
    fn test_sort_toggle() {
        let sort = SortState::default().toggled(LeadField::Size);
        assert_eq!(sort, SortState::by(LeadField::Size, SortDirection::Ascending));

        let sort = sort.toggled(LeadField::Size);
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort = sort.toggled(LeadField::Name);
        assert_eq!(sort, SortState::by(LeadField::Name, SortDirection::Ascending));
    }

    #[test]
    fn test_coerce_min_size() {
        assert_eq!(coerce_min_size("250"), 250);
        assert_eq!(coerce_min_size(" 42 "), 42);
        assert_eq!(coerce_min_size("12abc"), 12);
        assert_eq!(coerce_min_size("+8"), 8);
        assert_eq!(coerce_min_size("abc"), 0);
        assert_eq!(coerce_min_size(""), 0);
        assert_eq!(coerce_min_size("-5"), 0);
        assert_eq!(coerce_min_size("-"), 0);
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("Chart".parse::<ViewMode>().unwrap(), ViewMode::Chart);
        assert_eq!("table".parse::<ViewMode>().unwrap(), ViewMode::Table);
        assert!("grid".parse::<ViewMode>().is_err());
    }
}
