//! Container manager: opening containers, aliases and queries.

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::dir::ContainerDir;
use crate::error::{ContainerError, ContainerResult};
use crate::results::{EvaluationType, QueryContext, Results};
use crate::stream::InputStream;
use crate::xpath::Query;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Entry point to the container engine.
///
/// A manager opens containers and keeps the alias table that query
/// expressions resolve `collection('alias')` against. Aliases hold a handle
/// to their container, so a container stays open while it is aliased.
#[derive(Debug, Default)]
pub struct Manager {
    aliases: RwLock<HashMap<String, Container>>,
}

impl Manager {
    /// Creates a manager with no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a container exists at `path`.
    #[must_use]
    pub fn exists_container(&self, path: &Path) -> bool {
        ContainerDir::exists(path)
    }

    /// Creates a new container.
    ///
    /// # Errors
    ///
    /// - `ContainerExists` if there already is one at `path`
    /// - `ReadOnly` if `config.read_only` is set
    pub fn create_container(&self, path: &Path, config: ContainerConfig) -> ContainerResult<Container> {
        Container::create(path, &config)
    }

    /// Opens an existing container, creating it when `create_if_missing`
    /// is set and the open is writable.
    ///
    /// # Errors
    ///
    /// - `ContainerNotFound` if there is no container and none may be created
    /// - `ContainerLocked` if another handle has write access
    /// - `Corrupted` if the stored snapshot fails validation
    pub fn open_container(&self, path: &Path, config: ContainerConfig) -> ContainerResult<Container> {
        if !self.exists_container(path) && config.create_if_missing && !config.read_only {
            return Container::create(path, &config);
        }
        Container::open(path, &config)
    }

    /// Opens a local file as a document input stream.
    pub fn create_local_file_input_stream(&self, path: &Path) -> ContainerResult<InputStream> {
        InputStream::from_file(path)
    }

    /// Binds `alias` to `container`.
    ///
    /// Returns false if the alias is malformed or already bound to a
    /// different container. Binding the same container twice succeeds.
    pub fn add_alias(&self, alias: &str, container: &Container) -> bool {
        if !valid_alias(alias) {
            return false;
        }

        let mut aliases = self.aliases.write();
        match aliases.get(alias) {
            Some(bound) => bound.same_container(container),
            None => {
                aliases.insert(alias.to_string(), container.clone());
                tracing::debug!(alias, path = %container.path().display(), "bound alias");
                true
            }
        }
    }

    /// Removes an alias. Returns false if it was not bound.
    pub fn remove_alias(&self, alias: &str) -> bool {
        self.aliases.write().remove(alias).is_some()
    }

    /// Creates a query context.
    #[must_use]
    pub fn create_query_context(&self, evaluation: EvaluationType) -> QueryContext {
        QueryContext::new(evaluation)
    }

    /// Runs a query expression.
    ///
    /// # Errors
    ///
    /// - `Query` if the expression does not compile or names no collection
    ///   and the context has no default
    /// - `UnknownCollection` if the alias is not bound
    pub fn query(&self, expr: &str, context: &QueryContext) -> ContainerResult<Results> {
        let query = Query::compile(expr)?;

        let alias = query
            .collection()
            .or(context.default_collection())
            .ok_or_else(|| ContainerError::query("collection() needs an alias or a default collection"))?
            .to_string();

        let container = self
            .aliases
            .read()
            .get(&alias)
            .cloned()
            .ok_or(ContainerError::UnknownCollection { alias })?;

        tracing::trace!(expr, "running query");
        Ok(Results::query(
            container.snapshot(),
            Arc::new(query),
            context.evaluation(),
        ))
    }
}

fn valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn writable() -> ContainerConfig {
        ContainerConfig::new().create_if_missing(true)
    }

    #[test]
    fn open_creates_when_allowed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("c");
        let manager = Manager::new();

        assert!(!manager.exists_container(&path));
        assert!(matches!(
            manager.open_container(&path, ContainerConfig::default()),
            Err(ContainerError::ContainerNotFound { .. })
        ));

        let container = manager.open_container(&path, writable()).unwrap();
        assert!(manager.exists_container(&path));
        assert_eq!(container.num_documents(), 0);
    }

    #[test]
    fn read_only_open_never_creates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("c");
        let manager = Manager::new();

        let result = manager.open_container(&path, writable().read_only(true));
        assert!(matches!(result, Err(ContainerError::ContainerNotFound { .. })));
        assert!(!manager.exists_container(&path));
    }

    #[test]
    fn alias_rules() {
        let temp = tempdir().unwrap();
        let manager = Manager::new();
        let first = manager.open_container(&temp.path().join("a"), writable()).unwrap();
        let second = manager.open_container(&temp.path().join("b"), writable()).unwrap();

        assert!(manager.add_alias("docs", &first));
        assert!(manager.add_alias("docs", &first));
        assert!(!manager.add_alias("docs", &second));
        assert!(!manager.add_alias("", &second));
        assert!(!manager.add_alias("it's", &second));

        assert!(manager.remove_alias("docs"));
        assert!(!manager.remove_alias("docs"));
        assert!(manager.add_alias("docs", &second));
    }

    #[test]
    fn query_by_alias_and_default() {
        let temp = tempdir().unwrap();
        let manager = Manager::new();
        let container = manager.open_container(&temp.path().join("c"), writable()).unwrap();
        container.put_document("a", "<note><to>Ann</to></note>").unwrap();
        container.put_document("b", "<note><to>Bob</to></note>").unwrap();
        assert!(manager.add_alias("notes", &container));

        let context = manager.create_query_context(EvaluationType::Lazy);
        let names: Vec<_> = manager
            .query("collection('notes')/note[to = 'Bob']", &context)
            .unwrap()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["b"]);

        let mut context = manager.create_query_context(EvaluationType::Eager);
        context.set_default_collection("notes");
        assert_eq!(manager.query("collection()//to", &context).unwrap().count(), 2);
    }

    #[test]
    fn query_errors() {
        let manager = Manager::new();
        let context = QueryContext::default();

        assert!(matches!(
            manager.query("collection('nope')", &context),
            Err(ContainerError::UnknownCollection { .. })
        ));
        assert!(matches!(
            manager.query("collection()", &context),
            Err(ContainerError::Query { .. })
        ));
        assert!(matches!(
            manager.query("collection('x')/[", &context),
            Err(ContainerError::Query { .. })
        ));
    }
}
