//! Annotator facade binding one label and identifier strategy to a store.
//!
//! # Responsibility
//! - Resolve instance identifiers per the configured strategy.
//! - Forward annotate/search calls to the bound store with the label and
//!   identifier constraints applied.
//!
//! # Invariants
//! - Every stored row carries the annotator's label in `class`.
//! - Identifier resolution failures abort the call; nothing is written.
//! - Instance searches inject `object_id` only when the caller did not
//!   supply one; the caller's value wins.

use crate::config::DestinationConfig;
use crate::model::record::{AnnotationRecord, FieldMap, ObjectId};
use crate::registry::{AnnotationRegistry, RegistryError};
use crate::store::annotation_store::{AnnotationStore, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type AnnotatorResult<T> = Result<T, AnnotatorError>;

#[derive(Debug)]
pub enum AnnotatorError {
    /// Label was blank at construction.
    EmptyLabel,
    /// Constant identifier was blank at construction.
    EmptyConstantId,
    /// The identifier strategy produced no usable identifier.
    MissingIdentifier { label: String },
    Registry(RegistryError),
    Store(StoreError),
}

impl Display for AnnotatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLabel => write!(f, "annotator label cannot be blank"),
            Self::EmptyConstantId => write!(f, "constant object id cannot be blank"),
            Self::MissingIdentifier { label } => write!(
                f,
                "identifier resolution for `{label}` produced no value; annotations require a non-empty object id"
            ),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AnnotatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for AnnotatorError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<StoreError> for AnnotatorError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Identifier strategy for annotated subjects.
pub enum IdSource<T: ?Sized> {
    /// Fixed identifier used for every call (classless/conceptual mode).
    Constant(ObjectId),
    /// Extraction function applied to the subject on every call.
    Extract(Box<dyn Fn(&T) -> Option<ObjectId> + Send + Sync>),
}

impl<T: ?Sized> IdSource<T> {
    pub fn constant(id: impl Into<ObjectId>) -> Self {
        Self::Constant(id.into())
    }

    pub fn extract(extract: impl Fn(&T) -> Option<ObjectId> + Send + Sync + 'static) -> Self {
        Self::Extract(Box::new(extract))
    }
}

/// Derives a default logical label from a type-name string.
///
/// Takes the last `::` segment and converts CamelCase to snake_case:
/// `"inventory::Widget"` becomes `"widget"`, `"OrderLine"` becomes
/// `"order_line"`. Purely lexical; callers pass the name explicitly.
pub fn derive_label(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    let mut label = String::with_capacity(short.len());
    for (idx, ch) in short.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                label.push('_');
            }
            label.push(ch.to_ascii_lowercase());
        } else {
            label.push(ch);
        }
    }
    label
}

/// Annotation facade for one consuming type (or a standalone concept).
///
/// Holds the closed-over configuration the three operations share: the
/// store handle, the logical label, and the identifier strategy.
pub struct Annotator<T: ?Sized> {
    store: Arc<AnnotationStore>,
    label: String,
    id_source: IdSource<T>,
}

impl<T: ?Sized> Annotator<T> {
    /// Builds an annotator over an already-resolved store.
    pub fn new(
        store: Arc<AnnotationStore>,
        label: impl Into<String>,
        id_source: IdSource<T>,
    ) -> AnnotatorResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AnnotatorError::EmptyLabel);
        }
        if let IdSource::Constant(id) = &id_source {
            if id.is_blank() {
                return Err(AnnotatorError::EmptyConstantId);
            }
        }
        Ok(Self {
            store,
            label,
            id_source,
        })
    }

    /// Resolves the destination through `registry` and builds an annotator
    /// in one step.
    pub fn bind(
        registry: &mut AnnotationRegistry,
        config: &DestinationConfig,
        label: impl Into<String>,
        id_source: IdSource<T>,
    ) -> AnnotatorResult<Self> {
        let store = registry.resolve(config)?;
        Self::new(store, label, id_source)
    }

    /// The logical object-class label stored with every annotation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The shared storage proxy this annotator writes through.
    pub fn annotation_store(&self) -> Arc<AnnotationStore> {
        Arc::clone(&self.store)
    }

    /// Records one annotation about `subject`.
    ///
    /// Detail keys outside the destination's column set are dropped
    /// silently. The stored record is not returned; annotation is
    /// fire-and-forget from the caller's perspective.
    pub fn annotate(&self, subject: &T, details: &[(&str, &str)]) -> AnnotatorResult<()> {
        let object_id = self.resolve_id(subject)?;
        let row_id = self
            .store
            .insert(&self.label, &object_id, &to_field_map(details))?;
        debug!(
            "event=annotate module=annotator status=ok class={} object_id={object_id} row_id={row_id}",
            self.label
        );
        Ok(())
    }

    /// Searches annotations scoped to `subject`.
    ///
    /// Always constrains `class`; adds the subject's resolved `object_id`
    /// unless the caller supplied one.
    pub fn search_annotations(
        &self,
        subject: &T,
        criteria: &[(&str, &str)],
    ) -> AnnotatorResult<Vec<AnnotationRecord>> {
        let mut merged = to_field_map(criteria);
        if !merged.contains_key("object_id") {
            let object_id = self.resolve_id(subject)?;
            merged.insert("object_id".to_string(), object_id.as_str().to_string());
        }
        merged.insert("class".to_string(), self.label.clone());
        Ok(self.store.search(&merged)?)
    }

    /// Searches annotations for the whole logical class.
    ///
    /// Constrains `class` only; never injects an `object_id`.
    pub fn search_class_annotations(
        &self,
        criteria: &[(&str, &str)],
    ) -> AnnotatorResult<Vec<AnnotationRecord>> {
        let mut merged = to_field_map(criteria);
        merged.insert("class".to_string(), self.label.clone());
        Ok(self.store.search(&merged)?)
    }

    fn resolve_id(&self, subject: &T) -> AnnotatorResult<ObjectId> {
        match &self.id_source {
            IdSource::Constant(id) => Ok(id.clone()),
            IdSource::Extract(extract) => match extract(subject) {
                Some(id) if !id.is_blank() => Ok(id),
                _ => Err(AnnotatorError::MissingIdentifier {
                    label: self.label.clone(),
                }),
            },
        }
    }
}

impl Annotator<()> {
    /// Builds a classless annotator writing under a fixed identifier.
    pub fn classless(
        store: Arc<AnnotationStore>,
        label: impl Into<String>,
        constant: impl Into<ObjectId>,
    ) -> AnnotatorResult<Self> {
        Self::new(store, label, IdSource::constant(constant))
    }

    /// Records one classless annotation.
    pub fn annotate_concept(&self, details: &[(&str, &str)]) -> AnnotatorResult<()> {
        self.annotate(&(), details)
    }

    /// Searches classless annotations under the fixed identifier.
    pub fn search_concept_annotations(
        &self,
        criteria: &[(&str, &str)],
    ) -> AnnotatorResult<Vec<AnnotationRecord>> {
        self.search_annotations(&(), criteria)
    }
}

fn to_field_map(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}
