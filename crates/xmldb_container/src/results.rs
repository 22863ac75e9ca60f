//! Document results and query contexts.

use crate::document::Document;
use crate::xpath::Query;
use std::fmt;
use std::sync::Arc;

/// When query filtering happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationType {
    /// Filter every document when the query is run.
    Eager,
    /// Filter documents one at a time as results are pulled.
    #[default]
    Lazy,
}

/// Settings for running a query.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    default_collection: Option<String>,
    evaluation: EvaluationType,
}

impl QueryContext {
    /// Creates a context with the given evaluation type.
    #[must_use]
    pub fn new(evaluation: EvaluationType) -> Self {
        Self {
            default_collection: None,
            evaluation,
        }
    }

    /// Sets the alias used by `collection()` without arguments.
    pub fn set_default_collection(&mut self, alias: impl Into<String>) {
        self.default_collection = Some(alias.into());
    }

    /// Returns the default collection alias.
    #[must_use]
    pub fn default_collection(&self) -> Option<&str> {
        self.default_collection.as_deref()
    }

    /// Returns the evaluation type.
    #[must_use]
    pub fn evaluation(&self) -> EvaluationType {
        self.evaluation
    }
}

/// A forward-only sequence of documents.
///
/// Results hold a snapshot of the documents that existed when they were
/// created. Query results only yield well-formed documents that satisfy the
/// query; with lazy evaluation each document is parsed when it is reached.
pub struct Results {
    documents: std::vec::IntoIter<Document>,
    filter: Option<Arc<Query>>,
}

impl Results {
    pub(crate) fn all(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
            filter: None,
        }
    }

    pub(crate) fn query(documents: Vec<Document>, query: Arc<Query>, evaluation: EvaluationType) -> Self {
        match evaluation {
            EvaluationType::Lazy => Self {
                documents: documents.into_iter(),
                filter: Some(query),
            },
            EvaluationType::Eager => {
                let matched: Vec<_> = documents
                    .into_iter()
                    .filter(|doc| document_matches(&query, doc))
                    .collect();
                Self::all(matched)
            }
        }
    }

    /// Returns an empty result set.
    #[must_use]
    pub fn empty() -> Self {
        Self::all(Vec::new())
    }
}

impl Iterator for Results {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        loop {
            let doc = self.documents.next()?;
            match &self.filter {
                Some(query) if !document_matches(query, &doc) => continue,
                _ => return Some(doc),
            }
        }
    }
}

impl fmt::Debug for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("pending", &self.documents.len())
            .field("query", &self.filter.as_ref().map(|q| q.source()))
            .finish()
    }
}

fn document_matches(query: &Query, doc: &Document) -> bool {
    match doc.parse() {
        Ok(tree) => query.matches(&tree),
        Err(e) => {
            tracing::debug!(name = doc.name(), error = %e, "skipping document that is not well-formed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("a", "<item kind='x'/>").unwrap(),
            Document::new("b", "<item kind='y'/>").unwrap(),
            Document::from_trusted("broken".into(), "<item kind='x'>".into()),
            Document::new("c", "<item kind='x'/>").unwrap(),
        ]
    }

    fn names(results: Results) -> Vec<String> {
        results.map(|d| d.name().to_string()).collect()
    }

    #[test]
    fn all_yields_everything_once() {
        assert_eq!(names(Results::all(docs())), vec!["a", "b", "broken", "c"]);
    }

    #[test]
    fn lazy_and_eager_agree() {
        let query = Arc::new(Query::compile("collection()/item[@kind = 'x']").unwrap());
        let lazy = names(Results::query(docs(), Arc::clone(&query), EvaluationType::Lazy));
        let eager = names(Results::query(docs(), query, EvaluationType::Eager));
        assert_eq!(lazy, vec!["a", "c"]);
        assert_eq!(lazy, eager);
    }

    #[test]
    fn exhausted_stays_exhausted() {
        let mut results = Results::all(vec![Document::new("a", "<a/>").unwrap()]);
        assert!(results.next().is_some());
        assert!(results.next().is_none());
        assert!(results.next().is_none());
    }

    #[test]
    fn default_context() {
        let mut context = QueryContext::default();
        assert_eq!(context.evaluation(), EvaluationType::Lazy);
        assert!(context.default_collection().is_none());
        context.set_default_collection("docs");
        assert_eq!(context.default_collection(), Some("docs"));
    }
}
