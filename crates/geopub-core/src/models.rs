//! Domain types for theme publications.
//!
//! A theme publication is one named geodata product in the catalog. A
//! publication may be split into geographic subunits ("items"), each with its
//! own publishing dates and an optional geometry in well-known text.
//!
//! These records are produced once per catalog load and flow unchanged
//! through artifact generation and indexing; the index stores the full record
//! as an opaque JSON payload and always deserializes that payload on
//! retrieval instead of reconstructing the record from indexed fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One geodata product in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemePublication {
    /// Unique identifier, e.g. `ch.so.agi.av_gebaeudeadressen`. Required for
    /// indexing; records with a blank identifier are skipped during rebuild.
    pub identifier: Option<String>,
    /// Data model tag the publication conforms to.
    pub model: Option<String>,
    pub title: Option<String>,
    pub short_description: Option<String>,
    /// Whether the publication is split into geographic subunits.
    #[serde(default)]
    pub has_subunits: bool,
    pub last_publishing_date: Option<NaiveDate>,
    pub second_to_last_publishing_date: Option<NaiveDate>,
    /// Data-owning organization.
    pub owner: Option<Office>,
    /// Organization operating the publication service.
    pub servicer: Option<Office>,
    pub further_information: Option<String>,
    /// Host the per-item download links are built against.
    pub download_host_url: Option<String>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub file_formats: Vec<FileFormat>,
    #[serde(default)]
    pub items: Vec<PublicationItem>,
}

impl ThemePublication {
    /// Returns the identifier if it is present and non-blank.
    pub fn identifier_str(&self) -> Option<&str> {
        non_blank(self.identifier.as_deref())
    }

    /// Owner fields joined for full-text indexing: agency name, abbreviation
    /// and division separated by single spaces.
    pub fn owner_text(&self) -> Option<String> {
        let owner = self.owner.as_ref()?;
        let text = [
            owner.agency_name.as_deref().unwrap_or(""),
            owner.abbreviation.as_deref().unwrap_or(""),
            owner.division.as_deref().unwrap_or(""),
        ]
        .join(" ");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// An organization referenced by a publication (owner or servicer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub agency_name: Option<String>,
    pub abbreviation: Option<String>,
    pub division: Option<String>,
    pub office_at_web: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A downloadable file format offered by a publication.
///
/// The abbreviation doubles as the file extension of the download artifact
/// (e.g. `gpkg.zip`) and as the key for per-format MapML documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFormat {
    pub name: Option<String>,
    pub mimetype: Option<String>,
    pub abbreviation: Option<String>,
}

impl FileFormat {
    /// Trimmed, lowercased abbreviation, or empty string if absent.
    pub fn normalized_abbreviation(&self) -> String {
        self.abbreviation
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase()
    }
}

/// A geographic subunit of a publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationItem {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub last_publishing_date: Option<NaiveDate>,
    pub second_to_last_publishing_date: Option<NaiveDate>,
    /// Subunit outline as well-known text in the source CRS (EPSG:2056).
    /// Blank or missing means the item has no browsable geometry.
    pub geometry: Option<String>,
}

impl PublicationItem {
    pub fn identifier_str(&self) -> Option<&str> {
        non_blank(self.identifier.as_deref())
    }

    pub fn title_str(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// WKT text if present and non-blank.
    pub fn geometry_str(&self) -> Option<&str> {
        non_blank(self.geometry.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> Office {
        Office {
            agency_name: Some("Amt für Geoinformation".to_string()),
            abbreviation: Some("AGI".to_string()),
            division: Some("SGS".to_string()),
            ..Office::default()
        }
    }

    #[test]
    fn test_identifier_str_rejects_blank() {
        let mut publication = ThemePublication::default();
        assert_eq!(publication.identifier_str(), None);

        publication.identifier = Some("   ".to_string());
        assert_eq!(publication.identifier_str(), None);

        publication.identifier = Some(" ch.so.agi.alpha ".to_string());
        assert_eq!(publication.identifier_str(), Some("ch.so.agi.alpha"));
    }

    #[test]
    fn test_owner_text_joins_fields() {
        let publication = ThemePublication {
            owner: Some(office()),
            ..ThemePublication::default()
        };
        assert_eq!(
            publication.owner_text().as_deref(),
            Some("Amt für Geoinformation AGI SGS")
        );
    }

    #[test]
    fn test_owner_text_empty_office() {
        let publication = ThemePublication {
            owner: Some(Office::default()),
            ..ThemePublication::default()
        };
        assert_eq!(publication.owner_text(), None);
    }

    #[test]
    fn test_normalized_abbreviation() {
        let format = FileFormat {
            abbreviation: Some(" GPKG.ZIP ".to_string()),
            ..FileFormat::default()
        };
        assert_eq!(format.normalized_abbreviation(), "gpkg.zip");
        assert_eq!(FileFormat::default().normalized_abbreviation(), "");
    }

    #[test]
    fn test_payload_round_trip() {
        let publication = ThemePublication {
            identifier: Some("ch.so.agi.alpha".to_string()),
            title: Some("Alpha Dataset".to_string()),
            last_publishing_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            owner: Some(office()),
            keywords: vec!["amtliche vermessung".to_string()],
            items: vec![PublicationItem {
                identifier: Some("alpha-1".to_string()),
                title: Some("Alpha Item".to_string()),
                geometry: Some("POINT(2600000 1200000)".to_string()),
                ..PublicationItem::default()
            }],
            ..ThemePublication::default()
        };

        let payload = serde_json::to_string(&publication).unwrap();
        let restored: ThemePublication = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored, publication);
    }
}
