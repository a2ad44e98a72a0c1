/// Language adapter layer.
///
/// An adapter turns source text written in some query DSL into a [`Query`].
/// The registry picks an adapter by name or by file extension, so the CLI
/// and the editor session never hard-code a particular input language.
use super::eval::evaluate;
use super::query::Query;
use crate::error::Result;

/// Adapter for Domain-Specific Languages that compile to a [`Query`].
///
/// # Example
///
/// ```ignore
/// struct SqlLikeAdapter;
///
/// impl DSLAdapter for SqlLikeAdapter {
///     fn name(&self) -> &str { "SQL-like" }
///     fn compile_to_ast(&self, code: &str) -> Result<Query> {
///         // Parse the text and build the query with the builder API
///     }
/// }
/// ```
pub trait DSLAdapter: Send + Sync {
    /// Human-readable name of the DSL.
    fn name(&self) -> &str;

    /// Compile DSL code into a single query.
    fn compile_to_ast(&self, code: &str) -> Result<Query>;

    /// Return supported file extensions for this DSL (e.g., `["xql"]`).
    fn file_extensions(&self) -> Vec<&str> {
        vec![]
    }
}

/// The builder call syntax that [`Query::to_text`] emits.
pub struct BuilderTextAdapter;

impl DSLAdapter for BuilderTextAdapter {
    fn name(&self) -> &str {
        "XQL builder"
    }

    fn compile_to_ast(&self, code: &str) -> Result<Query> {
        evaluate(code)
    }

    fn file_extensions(&self) -> Vec<&str> {
        vec!["xql", "js"]
    }
}

/// Registry for managing multiple language adapters.
pub struct AdapterRegistry {
    dsl_adapters: Vec<Box<dyn DSLAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self {
            dsl_adapters: Vec::new(),
        };
        registry.register_dsl_adapter(Box::new(BuilderTextAdapter));
        registry
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dsl_adapter(&mut self, adapter: Box<dyn DSLAdapter>) {
        self.dsl_adapters.push(adapter);
    }

    /// The adapter used when nothing more specific is known.
    pub fn default_adapter(&self) -> Option<&dyn DSLAdapter> {
        self.dsl_adapters.first().map(|a| a.as_ref())
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn DSLAdapter> {
        self.dsl_adapters
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .map(|a| a.as_ref())
    }

    /// Find the adapter registered for a file extension (without the dot).
    pub fn for_extension(&self, extension: &str) -> Option<&dyn DSLAdapter> {
        self.dsl_adapters
            .iter()
            .find(|a| {
                a.file_extensions()
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .map(|a| a.as_ref())
    }

    /// List all registered adapter names.
    pub fn adapter_names(&self) -> Vec<&str> {
        self.dsl_adapters.iter().map(|a| a.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::functions::from;
    use crate::error::Error;

    struct TableNameAdapter;

    impl DSLAdapter for TableNameAdapter {
        fn name(&self) -> &str {
            "table"
        }

        fn compile_to_ast(&self, code: &str) -> Result<Query> {
            Ok(from(code.trim()))
        }

        fn file_extensions(&self) -> Vec<&str> {
            vec!["tbl"]
        }
    }

    #[test]
    fn test_builder_adapter_compiles() {
        let adapter = BuilderTextAdapter;
        let q = adapter.compile_to_ast(r#"XQL.from("users").limit(1)"#).unwrap();
        assert_eq!(q, from("users").limit(1));
    }

    #[test]
    fn test_builder_adapter_reports_errors() {
        let adapter = BuilderTextAdapter;
        assert!(matches!(
            adapter.compile_to_ast("XQL.from("),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_registry_default_has_builder_text() {
        let registry = AdapterRegistry::new();
        assert_eq!(registry.adapter_names(), vec!["XQL builder"]);
        assert!(registry.default_adapter().is_some());
        assert!(registry.by_name("xql BUILDER").is_some());
    }

    #[test]
    fn test_registry_lookup_by_extension() {
        let mut registry = AdapterRegistry::new();
        registry.register_dsl_adapter(Box::new(TableNameAdapter));

        let adapter = registry.for_extension("tbl").unwrap();
        assert_eq!(adapter.compile_to_ast("orders\n").unwrap(), from("orders"));
        assert_eq!(registry.for_extension("XQL").unwrap().name(), "XQL builder");
        assert!(registry.for_extension("py").is_none());
    }
}
