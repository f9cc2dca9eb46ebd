//! Full-text catalog index backed by tantivy.
//!
//! One document per theme publication. Searchable fields are tokenized and
//! lowercased; the full record travels alongside as an opaque JSON payload
//! and is always deserialized on retrieval, never reconstructed from the
//! indexed fields. Rebuilds replace the whole generation: readers keep the
//! previous snapshot until the commit lands and the reader is reloaded.

use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{AllQuery, BooleanQuery, ConstScoreQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, TextOptions, Value, STRING, TEXT};
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use geopub_core::ThemePublication;

use crate::error::SearchError;

// Ranking weights, identifier matches dominating title matches dominating
// everything else.
const WEIGHT_IDENTIFIER_EXACT: f32 = 200.0;
const WEIGHT_IDENTIFIER_SUBSTRING: f32 = 100.0;
const WEIGHT_TITLE_EXACT: f32 = 20.0;
const WEIGHT_TITLE_SUBSTRING: f32 = 10.0;
const WEIGHT_TEXT_SUBSTRING: f32 = 2.0;

const WRITER_BUFFER_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, Copy)]
struct CatalogFields {
    identifier: Field,
    title: Field,
    model: Field,
    short_description: Field,
    owner: Field,
    keywords: Field,
    synonyms: Field,
    title_sort: Field,
    payload: Field,
}

/// Searchable catalog of theme publications with weighted ranking.
pub struct CatalogIndex {
    index: Index,
    reader: IndexReader,
    fields: CatalogFields,
    max_records: usize,
}

impl CatalogIndex {
    /// Opens (or creates) the index at `directory`. Query results are
    /// truncated to `max_records`, coerced to at least one.
    pub fn open(directory: &Path, max_records: usize) -> Result<Self, SearchError> {
        std::fs::create_dir_all(directory)?;

        let mut schema_builder = Schema::builder();
        // Identifier is indexed raw as one term; rebuild lowercases it so
        // lookups are case-insensitive.
        let identifier = schema_builder.add_text_field("identifier", STRING);
        let title = schema_builder.add_text_field("title", TEXT);
        let model = schema_builder.add_text_field("model", TEXT);
        let short_description = schema_builder.add_text_field("short_description", TEXT);
        let owner = schema_builder.add_text_field("owner", TEXT);
        let keywords = schema_builder.add_text_field("keywords", TEXT);
        let synonyms = schema_builder.add_text_field("synonyms", TEXT);
        // Stored only, never searched.
        let stored_only = TextOptions::default().set_stored();
        let title_sort = schema_builder.add_text_field("title_sort", stored_only.clone());
        let payload = schema_builder.add_text_field("payload", stored_only);
        let schema = schema_builder.build();

        let mmap_directory = MmapDirectory::open(directory)?;
        let index = Index::open_or_create(mmap_directory, schema)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            fields: CatalogFields {
                identifier,
                title,
                model,
                short_description,
                owner,
                keywords,
                synonyms,
                title_sort,
                payload,
            },
            max_records: max_records.max(1),
        })
    }

    /// Replaces the entire index generation with one document per
    /// publication. Records with a blank identifier are skipped with a
    /// warning; a duplicate identifier within the batch overwrites the
    /// earlier document. The commit is atomic: concurrent readers observe
    /// either the previous generation or the new one, never a mix.
    pub fn rebuild(&self, publications: &[ThemePublication]) -> Result<(), SearchError> {
        let mut writer: IndexWriter = self.index.writer(WRITER_BUFFER_BYTES)?;
        writer.delete_all_documents()?;

        let mut indexed = 0usize;
        for publication in publications {
            let Some(identifier) = publication.identifier_str() else {
                warn!(
                    title = publication.title.as_deref().unwrap_or(""),
                    "skipping publication without identifier"
                );
                continue;
            };
            let identifier_key = identifier.to_lowercase();

            // Idempotent upsert within the batch.
            writer.delete_term(Term::from_field_text(self.fields.identifier, &identifier_key));

            let payload = serde_json::to_string(publication)?;
            let mut doc = TantivyDocument::new();
            doc.add_text(self.fields.identifier, &identifier_key);
            if let Some(title) = publication.title.as_deref() {
                doc.add_text(self.fields.title, title);
            }
            if let Some(model) = publication.model.as_deref() {
                doc.add_text(self.fields.model, model);
            }
            if let Some(description) = publication.short_description.as_deref() {
                doc.add_text(self.fields.short_description, description);
            }
            if let Some(owner) = publication.owner_text() {
                doc.add_text(self.fields.owner, &owner);
            }
            if !publication.keywords.is_empty() {
                doc.add_text(self.fields.keywords, publication.keywords.join(" "));
            }
            if !publication.synonyms.is_empty() {
                doc.add_text(self.fields.synonyms, publication.synonyms.join(" "));
            }
            doc.add_text(
                self.fields.title_sort,
                publication.title.as_deref().unwrap_or("").to_lowercase(),
            );
            doc.add_text(self.fields.payload, &payload);
            writer.add_document(doc)?;
            indexed += 1;
        }

        writer.commit()?;
        self.reader.reload()?;
        info!(indexed, total = publications.len(), "catalog index rebuilt");
        Ok(())
    }

    /// All publications of the current generation, sorted by lowercased
    /// title ascending. Ties keep their indexing order.
    pub fn find_all_sorted_by_title(&self) -> Result<Vec<ThemePublication>, SearchError> {
        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);
        let hits = searcher.search(&AllQuery, &TopDocs::with_limit(limit))?;

        let mut entries: Vec<(String, DocAddress, ThemePublication)> = Vec::new();
        for (_score, address) in hits {
            let doc: TantivyDocument = searcher.doc(address)?;
            let sort_key = doc
                .get_first(self.fields.title_sort)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if let Some(publication) = self.decode_payload(&doc) {
                entries.push((sort_key, address, publication));
            }
        }
        // Document addresses grow in indexing order, so they break ties the
        // way a stable sort over the input would.
        entries.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        Ok(entries.into_iter().map(|(_, _, p)| p).collect())
    }

    /// Weighted full-text search. Every token must match at least one field
    /// (AND across tokens, OR across fields); results are ranked by the sum
    /// of the matched field weights and truncated to the configured maximum.
    /// A blank query behaves like [`Self::find_all_sorted_by_title`].
    pub fn search(&self, query: &str) -> Result<Vec<ThemePublication>, SearchError> {
        if query.trim().is_empty() {
            return self.find_all_sorted_by_title();
        }

        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.replace(['*', '?'], "").to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        debug!(?tokens, "executing catalog search");

        let mut token_clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &tokens {
            token_clauses.push((Occur::Must, self.token_query(token)?));
        }
        let query = BooleanQuery::new(token_clauses);

        let searcher = self.reader.searcher();
        let hits = searcher.search(&query, &TopDocs::with_limit(self.max_records))?;

        let mut results = Vec::with_capacity(hits.len());
        for (_score, address) in hits {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(publication) = self.decode_payload(&doc) {
                results.push(publication);
            }
        }
        Ok(results)
    }

    /// Exact, case-insensitive identifier lookup.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<ThemePublication>, SearchError> {
        let key = identifier.trim().to_lowercase();
        if key.is_empty() {
            return Ok(None);
        }

        let term = Term::from_field_text(self.fields.identifier, &key);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let searcher = self.reader.searcher();
        let hits = searcher.search(&query, &TopDocs::with_limit(1))?;

        match hits.first() {
            Some((_score, address)) => {
                let doc: TantivyDocument = searcher.doc(*address)?;
                Ok(self.decode_payload(&doc))
            }
            None => Ok(None),
        }
    }

    /// OR-of-fields query for one token, each clause carrying its fixed
    /// ranking weight. Matching clauses contribute their weight to the
    /// document score; non-matching clauses contribute nothing.
    fn token_query(&self, token: &str) -> Result<Box<dyn Query>, SearchError> {
        let substring_pattern = format!(".*{}.*", regex_escape(token));

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        clauses.push((
            Occur::Should,
            weighted(
                TermQuery::new(
                    Term::from_field_text(self.fields.identifier, token),
                    IndexRecordOption::Basic,
                ),
                WEIGHT_IDENTIFIER_EXACT,
            ),
        ));
        clauses.push((
            Occur::Should,
            weighted(
                RegexQuery::from_pattern(&substring_pattern, self.fields.identifier)?,
                WEIGHT_IDENTIFIER_SUBSTRING,
            ),
        ));
        clauses.push((
            Occur::Should,
            weighted(
                TermQuery::new(
                    Term::from_field_text(self.fields.title, token),
                    IndexRecordOption::Basic,
                ),
                WEIGHT_TITLE_EXACT,
            ),
        ));
        clauses.push((
            Occur::Should,
            weighted(
                RegexQuery::from_pattern(&substring_pattern, self.fields.title)?,
                WEIGHT_TITLE_SUBSTRING,
            ),
        ));
        for field in [
            self.fields.model,
            self.fields.short_description,
            self.fields.owner,
            self.fields.keywords,
            self.fields.synonyms,
        ] {
            clauses.push((
                Occur::Should,
                weighted(
                    RegexQuery::from_pattern(&substring_pattern, field)?,
                    WEIGHT_TEXT_SUBSTRING,
                ),
            ));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn decode_payload(&self, doc: &TantivyDocument) -> Option<ThemePublication> {
        let payload = doc.get_first(self.fields.payload).and_then(|v| v.as_str())?;
        match serde_json::from_str(payload) {
            Ok(publication) => Some(publication),
            Err(e) => {
                warn!(error = %e, "dropping document with undecodable payload");
                None
            }
        }
    }
}

fn weighted(query: impl Query, weight: f32) -> Box<dyn Query> {
    Box::new(ConstScoreQuery::new(Box::new(query), weight))
}

/// Escapes regex metacharacters so a token matches literally inside the
/// substring pattern. Only ASCII punctuation may be backslash-escaped in
/// the regex syntax; everything else is already a literal and passes
/// through unchanged.
fn regex_escape(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if c.is_ascii_punctuation() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopub_core::Office;

    fn publication(identifier: &str, title: &str) -> ThemePublication {
        ThemePublication {
            identifier: Some(identifier.to_string()),
            title: Some(title.to_string()),
            ..ThemePublication::default()
        }
    }

    fn open_index(dir: &tempfile::TempDir, max_records: usize) -> CatalogIndex {
        CatalogIndex::open(dir.path(), max_records).unwrap()
    }

    fn identifiers(publications: &[ThemePublication]) -> Vec<&str> {
        publications
            .iter()
            .map(|p| p.identifier.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_find_all_sorted_by_title() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("ch.so.agi.beta", "Beta Dataset"),
                publication("ch.so.agi.alpha", "Alpha Dataset"),
            ])
            .unwrap();

        let all = index.find_all_sorted_by_title().unwrap();
        assert_eq!(identifiers(&all), vec!["ch.so.agi.alpha", "ch.so.agi.beta"]);
    }

    #[test]
    fn test_search_single_hit() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("ch.so.agi.alpha", "Alpha Dataset"),
                publication("ch.so.agi.beta", "Beta Dataset"),
            ])
            .unwrap();

        let hits = index.search("beta").unwrap();
        assert_eq!(identifiers(&hits), vec!["ch.so.agi.beta"]);
    }

    #[test]
    fn test_blank_query_lists_everything() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("ch.so.agi.beta", "Beta Dataset"),
                publication("ch.so.agi.alpha", "Alpha Dataset"),
            ])
            .unwrap();

        let hits = index.search("   ").unwrap();
        assert_eq!(identifiers(&hits), vec!["ch.so.agi.alpha", "ch.so.agi.beta"]);
    }

    #[test]
    fn test_wildcard_only_query_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index.rebuild(&[publication("ch.so.agi.alpha", "Alpha")]).unwrap();

        let err = index.search("*** ?").unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery));
    }

    #[test]
    fn test_wildcards_are_stripped_from_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index.rebuild(&[publication("ch.so.agi.alpha", "Alpha Dataset")]).unwrap();

        let hits = index.search("alp*ha").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_exact_identifier_outranks_substring() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("alphabet", "Letters"),
                publication("alpha", "Greek"),
            ])
            .unwrap();

        // "alpha" matches both identifiers as a substring but only one
        // exactly, so the exact hit comes first.
        let hits = index.search("alpha").unwrap();
        assert_eq!(identifiers(&hits), vec!["alpha", "alphabet"]);
    }

    #[test]
    fn test_multi_token_query_requires_all_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("ch.so.agi.alpha", "Alpha Dataset"),
                publication("ch.so.agi.beta", "Beta Dataset"),
            ])
            .unwrap();

        let hits = index.search("alpha dataset").unwrap();
        assert_eq!(identifiers(&hits), vec!["ch.so.agi.alpha"]);
        assert!(index.search("alpha gamma").unwrap().is_empty());
    }

    #[test]
    fn test_search_matches_owner_and_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        let mut alpha = publication("ch.so.agi.alpha", "Alpha Dataset");
        alpha.owner = Some(Office {
            agency_name: Some("Amt für Geoinformation".to_string()),
            ..Office::default()
        });
        alpha.keywords = vec!["vermessung".to_string()];
        index
            .rebuild(&[alpha, publication("ch.so.agi.beta", "Beta Dataset")])
            .unwrap();

        assert_eq!(identifiers(&index.search("geoinformation").unwrap()), vec!["ch.so.agi.alpha"]);
        assert_eq!(identifiers(&index.search("vermess").unwrap()), vec!["ch.so.agi.alpha"]);
    }

    #[test]
    fn test_duplicate_identifier_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("ch.so.agi.alpha", "First Title"),
                publication("CH.SO.AGI.ALPHA", "Second Title"),
            ])
            .unwrap();

        let all = index.find_all_sorted_by_title().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title.as_deref(), Some("Second Title"));
    }

    #[test]
    fn test_blank_identifier_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index
            .rebuild(&[
                publication("", "No Identifier"),
                publication("ch.so.agi.alpha", "Alpha Dataset"),
            ])
            .unwrap();

        let all = index.find_all_sorted_by_title().unwrap();
        assert_eq!(identifiers(&all), vec!["ch.so.agi.alpha"]);
    }

    #[test]
    fn test_rebuild_replaces_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index.rebuild(&[publication("ch.so.agi.alpha", "Alpha")]).unwrap();
        index.rebuild(&[publication("ch.so.agi.beta", "Beta")]).unwrap();

        let all = index.find_all_sorted_by_title().unwrap();
        assert_eq!(identifiers(&all), vec!["ch.so.agi.beta"]);
    }

    #[test]
    fn test_results_truncated_to_max_records() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 2);
        index
            .rebuild(&[
                publication("ch.so.agi.a", "Dataset A"),
                publication("ch.so.agi.b", "Dataset B"),
                publication("ch.so.agi.c", "Dataset C"),
            ])
            .unwrap();

        assert_eq!(index.search("dataset").unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_identifier_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        index.rebuild(&[publication("ch.so.agi.Alpha", "Alpha Dataset")]).unwrap();

        let hit = index.find_by_identifier("CH.SO.AGI.ALPHA").unwrap();
        assert_eq!(hit.unwrap().title.as_deref(), Some("Alpha Dataset"));
        assert!(index.find_by_identifier("ch.so.agi.unknown").unwrap().is_none());
        assert!(index.find_by_identifier("   ").unwrap().is_none());
    }

    #[test]
    fn test_payload_round_trips_full_record() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        let mut alpha = publication("ch.so.agi.alpha", "Alpha Dataset");
        alpha.keywords = vec!["amtliche vermessung".to_string()];
        alpha.download_host_url = Some("https://files.example.org".to_string());
        index.rebuild(std::slice::from_ref(&alpha)).unwrap();

        let all = index.find_all_sorted_by_title().unwrap();
        assert_eq!(all, vec![alpha]);
    }

    #[test]
    fn test_non_ascii_token_searches_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir, 50);
        let mut alpha = publication("ch.so.agi.alpha", "Alpha Dataset");
        alpha.owner = Some(Office {
            agency_name: Some("Amt für Geoinformation".to_string()),
            ..Office::default()
        });
        index.rebuild(&[alpha]).unwrap();

        // A token with no hits at all is a zero-hit result, not an error.
        assert!(index.search("€").unwrap().is_empty());
        // Non-ASCII letters still match as literals.
        assert_eq!(identifiers(&index.search("für").unwrap()), vec!["ch.so.agi.alpha"]);
    }

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("ch.so"), "ch\\.so");
        assert_eq!(regex_escape("a+b"), "a\\+b");
        assert_eq!(regex_escape("plain"), "plain");
        // Non-ASCII characters are regex literals and must not be escaped.
        assert_eq!(regex_escape("€"), "€");
        assert_eq!(regex_escape("für"), "für");
    }
}
