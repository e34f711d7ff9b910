//! Image-builder compose records as reported by the REST API.
//!
//! `schema` holds the wire types, `upload` the runtime guards that narrow the
//! loosely typed upload options into provider-specific shapes.

pub mod schema;
pub mod upload;

pub use schema::*;
pub use upload::*;
