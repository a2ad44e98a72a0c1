//! Editor session state.
//!
//! A session owns the builder text being edited and the last query that
//! text evaluated to. Edits that fail to evaluate are reported but never
//! replace the last-known-good query, so the rendered SQL always reflects
//! something that compiled.

pub mod history;

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::ast::{BuilderTextAdapter, DSLAdapter, FormatOptions, Query, SortDirection};
use crate::config::Config;
use crate::error::{Error, Result};
use history::{HistoryEntry, QueryHistory};

/// A verb the data explorer appends to the current query.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerAction {
    /// Frequency table over the given columns.
    ValueCounts(Vec<String>),
    /// Project the given columns; empty selects `*`.
    Select(Vec<String>),
    /// `TRY_CAST` a column in place.
    Cast { column: String, data_type: String },
    Sort {
        column: String,
        direction: SortDirection,
    },
}

pub struct Session {
    adapter: Box<dyn DSLAdapter>,
    text: String,
    query: Option<Query>,
    error: Option<Error>,
    history: QueryHistory,
    history_path: Option<PathBuf>,
    options: FormatOptions,
    pretty: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Session {
    /// Session with in-memory history.
    pub fn new(config: &Config) -> Self {
        Self {
            adapter: Box::new(BuilderTextAdapter),
            text: String::new(),
            query: None,
            error: None,
            history: QueryHistory::new(config.history.max_entries),
            history_path: None,
            options: config.format.options(),
            pretty: config.format.pretty,
        }
    }

    /// Session whose history is loaded from and saved to the data directory
    /// when the config asks for persistence.
    pub fn with_persistent_history(config: &Config) -> anyhow::Result<Self> {
        if config.history.persist {
            Self::with_history_file(config, QueryHistory::history_path())
        } else {
            Ok(Self::new(config))
        }
    }

    /// Session whose history is loaded from `path` and written back to it
    /// after every accepted query.
    pub fn with_history_file(config: &Config, path: PathBuf) -> anyhow::Result<Self> {
        let mut session = Self::new(config);
        session.history = QueryHistory::load_from(&path, config.history.max_entries)?;
        session.history_path = Some(path);
        Ok(session)
    }

    /// Evaluate edits with a different input language.
    pub fn with_adapter(mut self, adapter: Box<dyn DSLAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last query that evaluated successfully.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// Error from the most recent rejected edit, cleared on success.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut QueryHistory {
        &mut self.history
    }

    /// SQL for the current query, pretty or single-line per config.
    pub fn sql(&self) -> Option<String> {
        self.query.as_ref().map(|q| {
            if self.pretty {
                q.to_sql_with(&self.options)
            } else {
                q.to_compact_sql()
            }
        })
    }

    /// Evaluate edited builder text. On failure the previous text and query
    /// are kept and the error is recorded.
    pub fn apply_text(&mut self, text: &str) -> Result<&Query> {
        match self.adapter.compile_to_ast(text) {
            Ok(query) => {
                self.text = text.to_string();
                self.error = None;
                Ok(self.accept(query))
            }
            Err(e) => {
                warn!(error = %e, "keeping last valid query");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Reset to a plain scan of `table`.
    pub fn open_table(&mut self, table: &str) -> &Query {
        let query = Query::from_source(table);
        self.text = query.to_text_with(&self.options);
        self.error = None;
        self.accept(query)
    }

    /// Apply an explorer action to the current query and regenerate the
    /// text from the result. Returns `None` when there is no query yet.
    pub fn dispatch(&mut self, action: ExplorerAction) -> Option<&Query> {
        let current = match self.query.as_ref() {
            Some(query) => query,
            None => {
                warn!(?action, "no query to apply action to");
                return None;
            }
        };
        debug!(?action, "applying explorer action");
        let next = match &action {
            ExplorerAction::ValueCounts(columns) => current.value_counts(columns),
            ExplorerAction::Select(columns) => current.select(columns),
            ExplorerAction::Cast { column, data_type } => current.with_cast(column, data_type),
            ExplorerAction::Sort { column, direction } => current.sort_by(column, *direction),
        };
        self.text = next.to_text_with(&self.options);
        self.error = None;
        Some(self.accept(next))
    }

    fn accept(&mut self, query: Query) -> &Query {
        self.history
            .add(HistoryEntry::new(self.text.clone(), query.to_compact_sql()));
        if let Some(ref path) = self.history_path {
            if let Err(e) = self.history.save_to(path) {
                warn!(error = %e, "failed to save history");
            }
        }
        self.query.insert(query)
    }
}
