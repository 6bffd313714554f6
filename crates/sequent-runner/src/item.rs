//! Work items and task lists.

use std::future::Future;
use std::ops::Index;
use std::sync::Arc;
use std::time::Duration;

use crate::continuation::Continuation;
use crate::error::{ItemError, WorkItemError};

/// A unit of work driven by a continuation.
///
/// `invoke` starts the work and must arrange for `done` to be invoked exactly
/// once, now or at some later point. The runner does not start the next item
/// until that happens.
pub trait WorkItem: Send + Sync {
  /// Start the work.
  fn invoke(&self, done: Continuation);
}

impl<F> WorkItem for F
where
  F: Fn(Continuation) + Send + Sync,
{
  fn invoke(&self, done: Continuation) {
    self(done)
  }
}

/// Adapts an async closure into a [`WorkItem`].
///
/// Each invocation builds a fresh future from the factory, spawns it on the
/// current tokio runtime and forwards its result to the continuation.
pub struct AsyncItem<F> {
  factory: F,
  timeout: Option<Duration>,
}

impl<F, Fut> AsyncItem<F>
where
  F: Fn() -> Fut + Send + Sync,
  Fut: Future<Output = Result<(), ItemError>> + Send + 'static,
{
  /// Create a new async work item.
  pub fn new(factory: F) -> Self {
    Self {
      factory,
      timeout: None,
    }
  }

  /// Fail the item with [`WorkItemError::TimedOut`] if its future does not
  /// resolve within `limit`.
  pub fn with_timeout(mut self, limit: Duration) -> Self {
    self.timeout = Some(limit);
    self
  }
}

impl<F, Fut> WorkItem for AsyncItem<F>
where
  F: Fn() -> Fut + Send + Sync,
  Fut: Future<Output = Result<(), ItemError>> + Send + 'static,
{
  fn invoke(&self, done: Continuation) {
    let work = (self.factory)();
    let timeout = self.timeout;

    tokio::spawn(async move {
      let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
          Ok(result) => result,
          Err(_) => Err(Box::new(WorkItemError::TimedOut {
            timeout_ms: limit.as_millis() as u64,
          }) as ItemError),
        },
        None => work.await,
      };
      done.finish(result);
    });
  }
}

/// An ordered, immutable list of work items.
///
/// Insertion order is execution order. Cloning is cheap and every run over a
/// clone keeps its own progress.
#[derive(Clone, Default)]
pub struct TaskList {
  items: Arc<[Arc<dyn WorkItem>]>,
}

impl TaskList {
  /// Start building a task list.
  pub fn builder() -> TaskListBuilder {
    TaskListBuilder::default()
  }

  /// Number of items.
  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Whether the list has no items.
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Item at `index`, if any.
  pub fn get(&self, index: usize) -> Option<&Arc<dyn WorkItem>> {
    self.items.get(index)
  }
}

impl std::fmt::Debug for TaskList {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskList")
      .field("len", &self.items.len())
      .finish()
  }
}

impl Index<usize> for TaskList {
  type Output = Arc<dyn WorkItem>;

  fn index(&self, index: usize) -> &Self::Output {
    &self.items[index]
  }
}

impl<W: WorkItem + 'static> From<Vec<W>> for TaskList {
  fn from(items: Vec<W>) -> Self {
    items
      .into_iter()
      .map(|item| Arc::new(item) as Arc<dyn WorkItem>)
      .collect()
  }
}

impl FromIterator<Arc<dyn WorkItem>> for TaskList {
  fn from_iter<I: IntoIterator<Item = Arc<dyn WorkItem>>>(iter: I) -> Self {
    let items: Vec<Arc<dyn WorkItem>> = iter.into_iter().collect();
    Self {
      items: items.into(),
    }
  }
}

/// Collects items of mixed types into a [`TaskList`].
#[derive(Default)]
pub struct TaskListBuilder {
  items: Vec<Arc<dyn WorkItem>>,
}

impl TaskListBuilder {
  /// Append an item.
  pub fn push(mut self, item: impl WorkItem + 'static) -> Self {
    self.items.push(Arc::new(item));
    self
  }

  /// Append an already shared item.
  pub fn push_shared(mut self, item: Arc<dyn WorkItem>) -> Self {
    self.items.push(item);
    self
  }

  pub fn build(self) -> TaskList {
    TaskList {
      items: self.items.into(),
    }
  }
}
