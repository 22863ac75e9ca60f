//! Collection queries in an XPath 1.0 subset.
//!
//! A query names a collection and filters its documents:
//!
//! ```text
//! collection('alias')[predicate]*/location/path
//! collection()//book[@lang = 'en' and price < 10]/title
//! ```
//!
//! A document matches when every document-level predicate holds and the
//! location path (if any) selects at least one node. Supported: `/`, `//`,
//! name tests, `*`, `@name`, `@*`, `text()`, `node()`, `.`, `..`,
//! positional and boolean predicates, `= != < <= > >=`, `and`, `or`, and the
//! functions `contains`, `starts-with`, `not`, `count`, `string`,
//! `normalize-space`, `position`, `last`, `true`, `false`.

mod eval;
mod lexer;
mod parser;

use crate::error::ContainerResult;
use eval::{predicate_holds, select, Context, Item};
use parser::{CollectionQuery, Parser};

/// A compiled collection query.
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    compiled: CollectionQuery,
}

impl Query {
    /// Compiles a query expression.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::Query` for malformed expressions.
    pub fn compile(expr: &str) -> ContainerResult<Self> {
        let tokens = lexer::tokenize(expr)?;
        let compiled = Parser::new(tokens).parse_query()?;
        Ok(Self {
            source: expr.to_string(),
            compiled,
        })
    }

    /// Returns the alias named in `collection('...')`, or `None` when the
    /// default collection is used.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.compiled.collection.as_deref()
    }

    /// Returns the original expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the parsed document satisfies the query.
    #[must_use]
    pub fn matches(&self, doc: &roxmltree::Document<'_>) -> bool {
        let root = doc.root();
        let ctx = Context::root(root);

        if !self
            .compiled
            .filters
            .iter()
            .all(|filter| predicate_holds(filter, &ctx))
        {
            return false;
        }

        match &self.compiled.path {
            Some(path) => !select(path, Item::Node(root)).is_empty(),
            None => true,
        }
    }
}
