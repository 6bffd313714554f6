//! W3C validator work items.

use std::fmt;
use std::path::Path;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use sequent_runner::{Continuation, TaskList, WorkItem};
use tracing::{info, instrument};

use crate::error::FetchError;
use crate::item::JsonSink;

/// Nu HTML checker, used for both HTML and SVG documents.
pub const MARKUP_VALIDATOR_URL: &str = "https://validator.w3.org/nu/?out=json";

/// Jigsaw CSS validator.
pub const CSS_VALIDATOR_URL: &str = "https://jigsaw.w3.org/css-validator/validator?output=json";

/// Kind of document sent to the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
  Html,
  Css,
  Svg,
}

impl ValidationKind {
  /// Guess the kind from a file extension.
  pub fn from_path(path: &Path) -> Option<Self> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
      "html" | "htm" => Some(Self::Html),
      "css" => Some(Self::Css),
      "svg" => Some(Self::Svg),
      _ => None,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Html => "html",
      Self::Css => "css",
      Self::Svg => "svg",
    }
  }
}

impl fmt::Display for ValidationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Where validation requests are sent.
#[derive(Debug, Clone)]
pub struct ValidatorEndpoints {
  /// Receives HTML and SVG bodies.
  pub markup: String,
  /// Receives CSS as a `text=` form field.
  pub css: String,
}

impl Default for ValidatorEndpoints {
  fn default() -> Self {
    Self {
      markup: MARKUP_VALIDATOR_URL.to_string(),
      css: CSS_VALIDATOR_URL.to_string(),
    }
  }
}

impl ValidatorEndpoints {
  fn for_kind(&self, kind: ValidationKind) -> &str {
    match kind {
      ValidationKind::Html | ValidationKind::Svg => &self.markup,
      ValidationKind::Css => &self.css,
    }
  }
}

/// A named document to validate.
#[derive(Debug, Clone)]
pub struct ValidationDocument {
  pub name: String,
  pub kind: ValidationKind,
  pub source: String,
}

impl ValidationDocument {
  pub fn new(name: impl Into<String>, kind: ValidationKind, source: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind,
      source: source.into(),
    }
  }
}

/// Work item that submits one document to the validator.
///
/// The validator's JSON verdict goes to the sink under the document's name.
/// Only transport, status and decode failures fail the continuation; a
/// document with validation errors still completes.
pub struct ValidateItem {
  client: Client,
  endpoint: String,
  document: ValidationDocument,
  sink: JsonSink,
}

impl ValidateItem {
  pub fn new(
    client: Client,
    endpoints: &ValidatorEndpoints,
    document: ValidationDocument,
    sink: JsonSink,
  ) -> Self {
    Self {
      client,
      endpoint: endpoints.for_kind(document.kind).to_string(),
      document,
      sink,
    }
  }

  pub fn document(&self) -> &ValidationDocument {
    &self.document
  }
}

impl WorkItem for ValidateItem {
  fn invoke(&self, done: Continuation) {
    let client = self.client.clone();
    let endpoint = self.endpoint.clone();
    let document = self.document.clone();
    let sink = self.sink.clone();

    tokio::spawn(async move {
      match validate(&client, &endpoint, document.kind, &document.source).await {
        Ok(verdict) => {
          sink(&document.name, verdict);
          done.complete();
        }
        Err(e) => {
          done.fail(e);
        }
      }
    });
  }
}

/// POST `source` to `endpoint` and decode the validator's JSON verdict.
#[instrument(name = "validate", skip(client, source), fields(bytes = source.len()))]
pub async fn validate(
  client: &Client,
  endpoint: &str,
  kind: ValidationKind,
  source: &str,
) -> Result<serde_json::Value, FetchError> {
  let request = client.post(endpoint);
  let request = match kind {
    ValidationKind::Html => request
      .header(CONTENT_TYPE, "text/html; charset=utf-8")
      .body(source.to_string()),
    ValidationKind::Svg => request
      .header(CONTENT_TYPE, "image/svg+xml; charset=utf-8")
      .body(source.to_string()),
    ValidationKind::Css => request.form(&[("text", source)]),
  };

  let response = request.send().await.map_err(|source| FetchError::Request {
    url: endpoint.to_string(),
    source,
  })?;

  let status = response.status();
  if !status.is_success() {
    return Err(FetchError::Status {
      url: endpoint.to_string(),
      status: status.as_u16(),
    });
  }

  let verdict = response
    .json::<serde_json::Value>()
    .await
    .map_err(|source| FetchError::Decode {
      url: endpoint.to_string(),
      source,
    })?;

  info!(status = status.as_u16(), "validation completed");
  Ok(verdict)
}

/// Build a task list that validates `documents` in order.
pub fn validation_chain<I>(
  client: &Client,
  endpoints: &ValidatorEndpoints,
  documents: I,
  sink: JsonSink,
) -> TaskList
where
  I: IntoIterator<Item = ValidationDocument>,
{
  documents
    .into_iter()
    .map(|document| ValidateItem::new(client.clone(), endpoints, document, sink.clone()))
    .collect::<Vec<_>>()
    .into()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_from_path() {
    assert_eq!(
      ValidationKind::from_path(Path::new("site/index.HTML")),
      Some(ValidationKind::Html)
    );
    assert_eq!(
      ValidationKind::from_path(Path::new("style.css")),
      Some(ValidationKind::Css)
    );
    assert_eq!(
      ValidationKind::from_path(Path::new("logo.svg")),
      Some(ValidationKind::Svg)
    );
    assert_eq!(ValidationKind::from_path(Path::new("notes.txt")), None);
    assert_eq!(ValidationKind::from_path(Path::new("Makefile")), None);
  }

  #[test]
  fn test_endpoint_per_kind() {
    let endpoints = ValidatorEndpoints::default();
    assert_eq!(endpoints.for_kind(ValidationKind::Html), MARKUP_VALIDATOR_URL);
    assert_eq!(endpoints.for_kind(ValidationKind::Svg), MARKUP_VALIDATOR_URL);
    assert_eq!(endpoints.for_kind(ValidationKind::Css), CSS_VALIDATOR_URL);
  }
}
