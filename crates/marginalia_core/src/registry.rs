//! Destination registry and store memoization.
//!
//! # Responsibility
//! - Map each (dsn, table) destination to exactly one shared store.
//! - Build stores lazily on first resolution, from validated config.
//!
//! # Invariants
//! - At most one store per destination per registry lifetime; no eviction.
//! - Store names are process-unique, across registries.
//! - A store is only registered after its destination bootstrap succeeds.
//! - First-use of one destination from multiple threads must be serialized
//!   by the caller; `resolve` takes `&mut self`, so the borrow checker
//!   enforces this for a shared registry. The handles it returns are
//!   `Send + Sync`.

use crate::config::{ConfigError, DestinationConfig};
use crate::model::columns::{is_sql_identifier, ColumnLayout, LayoutError};
use crate::store::annotation_store::{AnnotationStore, StoreError};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static STORE_SEQ: AtomicU64 = AtomicU64::new(0);

/// The (dsn, table) pair identifying where annotations are stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Destination {
    pub dsn: String,
    pub table: String,
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.dsn, self.table)
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Store resolution/build error.
#[derive(Debug)]
pub enum RegistryError {
    Config(ConfigError),
    Layout(LayoutError),
    InvalidTableName(String),
    InvalidSequenceName(String),
    Store(StoreError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Layout(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => write!(f, "invalid table name: `{name}`"),
            Self::InvalidSequenceName(name) => write!(f, "invalid sequence name: `{name}`"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Layout(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::InvalidTableName(_) | Self::InvalidSequenceName(_) => None,
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LayoutError> for RegistryError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Registry of annotation stores, keyed by destination.
#[derive(Default)]
pub struct AnnotationRegistry {
    stores: BTreeMap<Destination, Arc<AnnotationStore>>,
}

impl AnnotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store for the configured destination, building it on
    /// first use.
    ///
    /// Repeated resolution of one destination returns the same handle;
    /// distinct destinations get distinct stores with distinct names.
    pub fn resolve(
        &mut self,
        config: &DestinationConfig,
    ) -> RegistryResult<Arc<AnnotationStore>> {
        let resolved = config.resolve()?;
        if !is_sql_identifier(&resolved.table) {
            return Err(RegistryError::InvalidTableName(resolved.table));
        }
        if let Some(sequence) = config.sequence.as_deref() {
            if !is_sql_identifier(sequence) {
                return Err(RegistryError::InvalidSequenceName(sequence.to_string()));
            }
        }

        let destination = Destination {
            dsn: resolved.dsn,
            table: resolved.table,
        };
        if let Some(store) = self.stores.get(&destination) {
            return Ok(Arc::clone(store));
        }

        let layout = match config.columns.as_deref() {
            Some(columns) => ColumnLayout::with_details(config.timestamps, columns)?,
            None => ColumnLayout::standard(config.timestamps),
        };

        if config.db_user.is_some() || config.db_pass.is_some() {
            warn!(
                "event=store_build module=registry status=warn table={} detail=credentials_unused_by_sqlite",
                destination.table
            );
        }
        if let Some(sequence) = config.sequence.as_deref() {
            info!(
                "event=store_build module=registry status=info table={} detail=sequence_inert_on_sqlite sequence={sequence}",
                destination.table
            );
        }

        let store = Arc::new(AnnotationStore::open(
            next_store_name(),
            &destination.dsn,
            destination.table.clone(),
            layout,
        )?);
        info!(
            "event=store_build module=registry status=ok store={} table={}",
            store.name(),
            store.table()
        );
        self.stores.insert(destination, Arc::clone(&store));
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Returns registered destinations in key order.
    pub fn destinations(&self) -> Vec<Destination> {
        self.stores.keys().cloned().collect()
    }

    /// Returns the store already built for `destination`, if any.
    pub fn get(&self, destination: &Destination) -> Option<Arc<AnnotationStore>> {
        self.stores.get(destination).cloned()
    }
}

fn next_store_name() -> String {
    let seq = STORE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("annotations_{seq}")
}
