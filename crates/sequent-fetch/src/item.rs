use std::sync::Arc;

use reqwest::Client;
use sequent_runner::{Continuation, TaskList, WorkItem};
use tracing::{info, instrument};

use crate::error::FetchError;

/// Receives each fetched document with the URL it came from.
pub type JsonSink = Arc<dyn Fn(&str, serde_json::Value) + Send + Sync>;

/// Work item that fetches one JSON document.
pub struct FetchItem {
  client: Client,
  url: String,
  sink: JsonSink,
}

impl FetchItem {
  pub fn new(client: Client, url: impl Into<String>, sink: JsonSink) -> Self {
    Self {
      client,
      url: url.into(),
      sink,
    }
  }

  pub fn url(&self) -> &str {
    &self.url
  }
}

impl WorkItem for FetchItem {
  fn invoke(&self, done: Continuation) {
    let client = self.client.clone();
    let url = self.url.clone();
    let sink = self.sink.clone();

    tokio::spawn(async move {
      match fetch_json(&client, &url).await {
        Ok(body) => {
          sink(&url, body);
          done.complete();
        }
        Err(e) => {
          done.fail(e);
        }
      }
    });
  }
}

/// GET `url` and parse the body as JSON.
#[instrument(name = "fetch_json", skip(client))]
pub async fn fetch_json(client: &Client, url: &str) -> Result<serde_json::Value, FetchError> {
  let response = client
    .get(url)
    .send()
    .await
    .map_err(|source| FetchError::Request {
      url: url.to_string(),
      source,
    })?;

  let status = response.status();
  if !status.is_success() {
    return Err(FetchError::Status {
      url: url.to_string(),
      status: status.as_u16(),
    });
  }

  let body = response
    .json::<serde_json::Value>()
    .await
    .map_err(|source| FetchError::Decode {
      url: url.to_string(),
      source,
    })?;

  info!(status = status.as_u16(), "fetch completed");
  Ok(body)
}

/// Build a task list that fetches `urls` in order, sending each body to `sink`.
pub fn fetch_chain<I, S>(client: &Client, urls: I, sink: JsonSink) -> TaskList
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  urls
    .into_iter()
    .map(|url| FetchItem::new(client.clone(), url, sink.clone()))
    .collect::<Vec<_>>()
    .into()
}
