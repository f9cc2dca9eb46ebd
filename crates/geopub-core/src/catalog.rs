//! XML catalog loader.
//!
//! The catalog source-of-truth is one XML file describing every theme
//! publication. The file is produced by the publishing toolchain, so the
//! loader is lenient: blank elements normalize to `None`, unparseable dates
//! are dropped with a warning, and a missing file yields an empty catalog
//! instead of failing startup.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::error::CatalogError;
use crate::models::{FileFormat, Office, PublicationItem, ThemePublication};

/// Loads all theme publications from the catalog XML file.
pub fn load_theme_publications(path: &Path) -> Result<Vec<ThemePublication>, CatalogError> {
    if !path.exists() {
        warn!(path = %path.display(), "catalog file does not exist");
        return Ok(Vec::new());
    }

    let xml = std::fs::read_to_string(path)?;
    let catalog: XmlCatalog = quick_xml::de::from_str(&xml)?;
    Ok(catalog
        .publications
        .into_iter()
        .map(XmlThemePublication::into_domain)
        .collect())
}

#[derive(Debug, Deserialize)]
struct XmlCatalog {
    #[serde(rename = "themePublication", default)]
    publications: Vec<XmlThemePublication>,
}

#[derive(Debug, Deserialize)]
struct XmlThemePublication {
    identifier: Option<String>,
    model: Option<String>,
    title: Option<String>,
    #[serde(rename = "shortDescription")]
    short_description: Option<String>,
    #[serde(rename = "hasSubunits")]
    has_subunits: Option<String>,
    #[serde(rename = "lastPublishingDate")]
    last_publishing_date: Option<String>,
    #[serde(rename = "secondToLastPublishingDate")]
    second_to_last_publishing_date: Option<String>,
    owner: Option<XmlOffice>,
    servicer: Option<XmlOffice>,
    #[serde(rename = "furtherInformation")]
    further_information: Option<String>,
    #[serde(rename = "downloadHostUrl")]
    download_host_url: Option<String>,
    #[serde(rename = "previewUrl")]
    preview_url: Option<String>,
    #[serde(default)]
    keywords: XmlKeywords,
    #[serde(default)]
    synonyms: XmlSynonyms,
    #[serde(rename = "fileFormats", default)]
    file_formats: XmlFileFormats,
    #[serde(default)]
    items: XmlItems,
}

#[derive(Debug, Default, Deserialize)]
struct XmlKeywords {
    #[serde(rename = "keyword", default)]
    values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlSynonyms {
    #[serde(rename = "synonym", default)]
    values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlFileFormats {
    #[serde(rename = "fileFormat", default)]
    values: Vec<XmlFileFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlItems {
    #[serde(rename = "item", default)]
    values: Vec<XmlItem>,
}

#[derive(Debug, Deserialize)]
struct XmlOffice {
    #[serde(rename = "agencyName")]
    agency_name: Option<String>,
    abbreviation: Option<String>,
    division: Option<String>,
    #[serde(rename = "officeAtWeb")]
    office_at_web: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlFileFormat {
    name: Option<String>,
    mimetype: Option<String>,
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlItem {
    identifier: Option<String>,
    title: Option<String>,
    #[serde(rename = "lastPublishingDate")]
    last_publishing_date: Option<String>,
    #[serde(rename = "secondToLastPublishingDate")]
    second_to_last_publishing_date: Option<String>,
    geometry: Option<String>,
}

impl XmlThemePublication {
    fn into_domain(self) -> ThemePublication {
        ThemePublication {
            identifier: clean(self.identifier),
            model: clean(self.model),
            title: clean(self.title),
            short_description: clean(self.short_description),
            has_subunits: parse_bool(self.has_subunits.as_deref()),
            last_publishing_date: parse_date(self.last_publishing_date.as_deref()),
            second_to_last_publishing_date: parse_date(
                self.second_to_last_publishing_date.as_deref(),
            ),
            owner: self.owner.map(XmlOffice::into_domain),
            servicer: self.servicer.map(XmlOffice::into_domain),
            further_information: clean(self.further_information),
            download_host_url: clean(self.download_host_url),
            preview_url: clean(self.preview_url),
            keywords: clean_list(self.keywords.values),
            synonyms: clean_list(self.synonyms.values),
            file_formats: self
                .file_formats
                .values
                .into_iter()
                .map(XmlFileFormat::into_domain)
                .collect(),
            items: self.items.values.into_iter().map(XmlItem::into_domain).collect(),
        }
    }
}

impl XmlOffice {
    fn into_domain(self) -> Office {
        Office {
            agency_name: clean(self.agency_name),
            abbreviation: clean(self.abbreviation),
            division: clean(self.division),
            office_at_web: clean(self.office_at_web),
            email: clean(self.email),
            phone: clean(self.phone),
        }
    }
}

impl XmlFileFormat {
    fn into_domain(self) -> FileFormat {
        FileFormat {
            name: clean(self.name),
            mimetype: clean(self.mimetype),
            abbreviation: clean(self.abbreviation),
        }
    }
}

impl XmlItem {
    fn into_domain(self) -> PublicationItem {
        PublicationItem {
            identifier: clean(self.identifier),
            title: clean(self.title),
            last_publishing_date: parse_date(self.last_publishing_date.as_deref()),
            second_to_last_publishing_date: parse_date(
                self.second_to_last_publishing_date.as_deref(),
            ),
            geometry: clean(self.geometry),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    match value {
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| clean(Some(v)))
        .collect()
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if v.eq_ignore_ascii_case("true"))
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(value, error = %e, "ignoring unparseable publishing date");
            None
        }
    }
}
