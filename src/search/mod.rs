mod loader;

pub use loader::{Loadable, SearchLoader};

use crate::collections::{Identifier, read_json};
use crate::error::SupplyError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// The only model the picker searches for.
pub const CARD_MODEL: &str = "card";

/// What the picker wants listed: questions matching a text, or questions in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchQuery {
    ByText(String),
    ByCollection(Identifier),
}

impl SearchQuery {
    /// Shape sent to a [`SearchSupplier`]. Exactly one of `q` and `collection` is set.
    pub fn to_wire(&self) -> WireQuery {
        match self {
            SearchQuery::ByText(text) => WireQuery {
                q: Some(text.clone()),
                collection: None,
                models: CARD_MODEL.to_string(),
            },
            SearchQuery::ByCollection(id) => WireQuery {
                q: None,
                collection: Some(id.clone()),
                models: CARD_MODEL.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireQuery {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub collection: Option<Identifier>,
    pub models: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: Identifier,
    pub name: String,
    pub icon: String,
    pub selectable: bool,
}

/// Executes search queries on behalf of the picker.
pub trait SearchSupplier {
    fn search(&self, query: &WireQuery) -> Result<Vec<SearchResult>, SupplyError>;
}

/// One row of a questions export.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub id: Identifier,
    pub name: String,
    #[serde(default)]
    pub collection_id: Option<Identifier>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub views: u64,
}

impl QuestionRecord {
    pub fn collection(&self) -> Identifier {
        self.collection_id.clone().unwrap_or_else(Identifier::root)
    }

    pub fn icon(&self) -> &str {
        self.display.as_deref().unwrap_or("table")
    }
}

/// In-memory question index backed by a questions export.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    questions: Vec<QuestionRecord>,
}

impl QuestionIndex {
    pub fn new(mut questions: Vec<QuestionRecord>) -> Self {
        questions.retain(|q| !q.archived);
        questions.sort_by_cached_key(|q| q.name.to_lowercase());
        QuestionIndex { questions }
    }

    pub fn load(path: &Path) -> Result<Self, SupplyError> {
        let records: Vec<QuestionRecord> = read_json(path)?;
        info!(path = %path.display(), questions = records.len(), "loaded questions");
        Ok(Self::new(records))
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    fn to_result(record: &QuestionRecord) -> SearchResult {
        SearchResult {
            id: record.id.clone(),
            name: record.name.clone(),
            icon: record.icon().to_string(),
            selectable: true,
        }
    }
}

impl SearchSupplier for QuestionIndex {
    fn search(&self, query: &WireQuery) -> Result<Vec<SearchResult>, SupplyError> {
        if query.models != CARD_MODEL {
            return Err(SupplyError::MalformedQuery(format!(
                "unsupported models '{}'",
                query.models
            )));
        }
        let results: Vec<SearchResult> = match (&query.q, &query.collection) {
            (Some(text), None) => {
                let needle = text.to_lowercase();
                self.questions
                    .iter()
                    .filter(|q| q.name.to_lowercase().contains(&needle))
                    .map(Self::to_result)
                    .collect()
            }
            (None, Some(collection)) => self
                .questions
                .iter()
                .filter(|q| &q.collection() == collection)
                .map(Self::to_result)
                .collect(),
            (Some(_), Some(_)) => {
                return Err(SupplyError::MalformedQuery(
                    "both q and collection are set".to_string(),
                ));
            }
            (None, None) => {
                return Err(SupplyError::MalformedQuery(
                    "neither q nor collection is set".to_string(),
                ));
            }
        };
        debug!(query = ?query, hits = results.len(), "question search");
        Ok(results)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn question(id: i64, name: &str, collection: Option<i64>) -> QuestionRecord {
        QuestionRecord {
            id: Identifier::from(id),
            name: name.to_string(),
            collection_id: collection.map(Identifier::from),
            collection_name: None,
            display: None,
            archived: false,
            created_at: None,
            updated_at: None,
            views: 0,
        }
    }

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn wire_shapes_are_mutually_exclusive() {
        let by_text = serde_json::to_value(SearchQuery::ByText("budget".into()).to_wire()).unwrap();
        assert_eq!(by_text, serde_json::json!({"q": "budget", "models": "card"}));

        let by_collection =
            serde_json::to_value(SearchQuery::ByCollection(Identifier::from(3)).to_wire()).unwrap();
        assert_eq!(by_collection, serde_json::json!({"collection": 3, "models": "card"}));
    }

    #[test]
    fn text_search_is_case_insensitive_and_sorted() {
        let index = QuestionIndex::new(vec![
            question(1, "Weekly budget", Some(1)),
            question(2, "Revenue", None),
            question(3, "Budget by region", Some(2)),
        ]);
        let hits = index
            .search(&SearchQuery::ByText("BUDGET".into()).to_wire())
            .unwrap();
        assert_eq!(names(&hits), ["Budget by region", "Weekly budget"]);
    }

    #[test]
    fn collection_search_treats_missing_collection_as_root() {
        let index = QuestionIndex::new(vec![question(1, "A", Some(1)), question(2, "B", None)]);
        let hits = index
            .search(&SearchQuery::ByCollection(Identifier::root()).to_wire())
            .unwrap();
        assert_eq!(names(&hits), ["B"]);
    }

    #[test]
    fn archived_questions_are_hidden() {
        let mut archived = question(1, "Old budget", None);
        archived.archived = true;
        let index = QuestionIndex::new(vec![archived]);
        let hits = index.search(&SearchQuery::ByText("budget".into()).to_wire()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn rejects_ambiguous_queries() {
        let index = QuestionIndex::default();
        let both = WireQuery {
            q: Some("x".into()),
            collection: Some(Identifier::root()),
            models: CARD_MODEL.into(),
        };
        assert!(matches!(index.search(&both), Err(SupplyError::MalformedQuery(_))));
        let neither = WireQuery {
            q: None,
            collection: None,
            models: CARD_MODEL.into(),
        };
        assert!(matches!(index.search(&neither), Err(SupplyError::MalformedQuery(_))));
    }
}
