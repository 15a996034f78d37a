//! Request body classification and document materialization

pub mod resolver;

pub use resolver::{classify_body, materialize_document, BodySource};
