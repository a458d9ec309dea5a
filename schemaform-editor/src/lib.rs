//! Editing support for schemaform.
//!
//! [`CompoundField`] edits an object value whose keys come from three
//! sources (direct properties, merged sub-schemas and dynamic keys) as one
//! buffer, with explicit commit and rollback. Dirtiness is computed by
//! [`reconcile`], which treats `null`, absent and `{}` as the same value.
//!
//! Links are resolved to an inline entity or a fetch request by
//! [`resolve_link`]; fetching itself belongs to a host [`EntityApi`].

mod api;
mod dirty;
mod error;
mod link;
mod object;

pub use api::{
    ApiError, EntityApi, EntityResponse, FetchState, RetryPolicy, api_error_message,
    fetch_entity_with_retry,
};
pub use dirty::{ChangeSet, is_empty_value, reconcile};
pub use error::{EditorError, LinkError};
pub use link::{Breadcrumb, LinkExplorer, Resolution, inline_field, resolve_link};
pub use object::{CompoundField, FieldState, MergedField};
