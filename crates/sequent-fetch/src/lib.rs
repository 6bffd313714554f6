//! HTTP work items for sequent.
//!
//! A [`FetchItem`] GETs one URL, parses the response as JSON and hands it to
//! a sink before completing its continuation. [`fetch_chain`] turns a list of
//! URLs into a [`TaskList`](sequent_runner::TaskList) so the documents are
//! fetched strictly one after another.
//!
//! [`ValidateItem`] submits an HTML, CSS or SVG document to the W3C
//! validators and hands the JSON verdict to the same kind of sink;
//! [`validation_chain`] validates a batch of documents in order.

mod error;
mod item;
mod validate;

pub use error::FetchError;
pub use item::{FetchItem, JsonSink, fetch_chain, fetch_json};
pub use validate::{
  CSS_VALIDATOR_URL, MARKUP_VALIDATOR_URL, ValidateItem, ValidationDocument, ValidationKind,
  ValidatorEndpoints, validate, validation_chain,
};

/// Sample endpoints fetched when no URL is given.
pub const DEMO_URLS: [&str; 3] = [
  "https://jsonplaceholder.typicode.com/posts/1",
  "https://jsonplaceholder.typicode.com/posts/2",
  "https://jsonplaceholder.typicode.com/posts/3",
];
