//! One-shot writes that report their lifecycle and invalidate the cache.
//!
//! A mutation never writes into the cache itself. When the request succeeds,
//! the `on_success` callback runs first and then the declared keys are
//! invalidated, so a view that writes and then reads always sees its own
//! write. Nothing is retried: every write here is user-triggered and not
//! idempotent.

use std::future::Future;
use tokio::sync::watch;
use tracing::{info, warn};

use super::client::QueryClient;
use super::error::QueryError;
use super::key::QueryKey;

/// The state of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
  /// Not started yet.
  Idle,
  /// Request in flight.
  Pending,
  /// Succeeded with a result.
  Success(T),
  /// Failed with an error.
  Error(QueryError),
}

impl<T> MutationState<T> {
  pub fn data(&self) -> Option<&T> {
    match self {
      MutationState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn is_pending(&self) -> bool {
    matches!(self, MutationState::Pending)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, MutationState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, MutationState::Error(_))
  }

  pub fn error(&self) -> Option<&QueryError> {
    match self {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type SuccessFn<O> = Box<dyn FnOnce(&O) + Send>;
type ErrorFn = Box<dyn FnOnce(&QueryError) + Send>;

/// Lifecycle hooks for one run. Exactly one of them fires.
pub struct MutationCallbacks<O> {
  on_success: Option<SuccessFn<O>>,
  on_error: Option<ErrorFn>,
}

impl<O> Default for MutationCallbacks<O> {
  fn default() -> Self {
    Self {
      on_success: None,
      on_error: None,
    }
  }
}

impl<O> MutationCallbacks<O> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on_success(mut self, f: impl FnOnce(&O) + Send + 'static) -> Self {
    self.on_success = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(&QueryError) + Send + 'static) -> Self {
    self.on_error = Some(Box::new(f));
    self
  }
}

/// Runs writes for one view and tracks whether one is pending.
pub struct MutationRunner<O> {
  client: QueryClient,
  state: watch::Sender<MutationState<O>>,
}

impl<O> MutationRunner<O>
where
  O: Clone + Send + Sync + 'static,
{
  pub fn new(client: QueryClient) -> Self {
    let (state, _) = watch::channel(MutationState::Idle);
    Self { client, state }
  }

  pub fn is_pending(&self) -> bool {
    self.state.borrow().is_pending()
  }

  pub fn state(&self) -> MutationState<O> {
    self.state.borrow().clone()
  }

  /// Follow state changes from a view.
  pub fn watch(&self) -> watch::Receiver<MutationState<O>> {
    self.state.subscribe()
  }

  /// Back to `Idle`, e.g. when a form is reopened.
  pub fn reset(&self) {
    self.state.send_replace(MutationState::Idle);
  }

  /// Await `request`, then fire one callback and invalidate `invalidates`
  /// on success.
  pub async fn run<Fut>(
    &self,
    request: Fut,
    invalidates: &[QueryKey],
    callbacks: MutationCallbacks<O>,
  ) -> Result<O, QueryError>
  where
    Fut: Future<Output = Result<O, QueryError>>,
  {
    self.state.send_replace(MutationState::Pending);

    let outcome = request.await;
    match &outcome {
      Ok(data) => {
        if let Some(on_success) = callbacks.on_success {
          on_success(data);
        }
        let touched = self.client.invalidate_all(invalidates);
        info!(keys = invalidates.len(), entries = touched, "mutation succeeded");
        self.state.send_replace(MutationState::Success(data.clone()));
      }
      Err(e) => {
        warn!(error = %e, "mutation failed");
        if let Some(on_error) = callbacks.on_error {
          on_error(e);
        }
        self.state.send_replace(MutationState::Error(e.clone()));
      }
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Lease, Property};
  use crate::query::{fetcher, Fetcher};
  use crate::query_key;
  use serde_json::{json, Value};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};
  use tokio::sync::Notify;

  /// In-memory collection standing in for one REST endpoint.
  #[derive(Clone, Default)]
  struct FakeCollection {
    rows: Arc<Mutex<Vec<Value>>>,
    gets: Arc<AtomicUsize>,
  }

  impl FakeCollection {
    fn with_rows(rows: Vec<Value>) -> Self {
      Self {
        rows: Arc::new(Mutex::new(rows)),
        gets: Arc::default(),
      }
    }

    fn fetcher(&self) -> Fetcher {
      let this = self.clone();
      fetcher(move |_key| {
        let this = this.clone();
        async move {
          this.gets.fetch_add(1, Ordering::SeqCst);
          Ok(Value::Array(this.rows.lock().unwrap().clone()))
        }
      })
    }

    fn gets(&self) -> usize {
      self.gets.load(Ordering::SeqCst)
    }
  }

  #[test]
  fn test_mutation_state_predicates() {
    let idle: MutationState<i32> = MutationState::Idle;
    assert!(!idle.is_pending());
    assert!(idle.data().is_none());

    let pending: MutationState<i32> = MutationState::Pending;
    assert!(pending.is_pending());

    let success = MutationState::Success(42);
    assert!(success.is_success());
    assert_eq!(success.data(), Some(&42));

    let error: MutationState<i32> = MutationState::Error(QueryError::Cancelled);
    assert!(error.is_error());
    assert_eq!(error.error(), Some(&QueryError::Cancelled));
  }

  #[tokio::test]
  async fn test_create_lease_then_read_sees_it() {
    let client = QueryClient::new();
    let leases = FakeCollection::default();
    let key = query_key!["/api/leases"];

    let before: Vec<Lease> = {
      client.fetch_with(&key, leases.fetcher()).await.unwrap();
      client.query(&key).await.unwrap()
    };
    assert!(before.is_empty());

    let runner = MutationRunner::<Value>::new(client.clone());
    let succeeded = Arc::new(AtomicUsize::new(0));
    let server = leases.clone();
    let request = async move {
      let lease = json!({
        "id": 1,
        "propertyId": 10,
        "unitId": 3,
        "tenantId": 20,
        "startDate": "2026-11-01",
        "endDate": "2027-10-31",
        "rentAmount": "1450.00",
        "status": "active"
      });
      server.rows.lock().unwrap().push(lease.clone());
      Ok(lease)
    };
    let callbacks = {
      let succeeded = succeeded.clone();
      MutationCallbacks::new().on_success(move |_lease: &Value| {
        succeeded.fetch_add(1, Ordering::SeqCst);
      })
    };
    runner
      .run(request, &[key.clone()], callbacks)
      .await
      .unwrap();
    assert_eq!(succeeded.load(Ordering::SeqCst), 1);

    let after: Vec<Lease> = client.query(&key).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].property_id, 10);
    assert_eq!(after[0].tenant_id, 20);
    assert!(runner.state().is_success());
  }

  #[tokio::test]
  async fn test_delete_refreshes_every_subscribed_view() {
    let client = QueryClient::new();
    let properties = FakeCollection::with_rows(vec![
      json!({"id": 1, "name": "Maple Court", "address": "1 Maple Ct"}),
      json!({"id": 2, "name": "Birch House", "address": "9 Birch Rd"}),
    ]);
    let key = query_key!["/api/properties"];

    let mut list_view = client.observe::<Vec<Property>>(&key, Some(properties.fetcher()));
    let mut summary_view = client.observe::<Vec<Property>>(&key, None);
    list_view.settled().await;
    summary_view.settled().await;
    assert_eq!(properties.gets(), 1);

    let runner = MutationRunner::<()>::new(client.clone());
    let server = properties.clone();
    let delete = async move {
      server.rows.lock().unwrap().retain(|row| row["id"] != json!(1));
      Ok(())
    };
    runner
      .run(delete, &[key.clone()], MutationCallbacks::new())
      .await
      .unwrap();

    for view in [&mut list_view, &mut summary_view] {
      let result = view.settled().await;
      let ids: Vec<u64> = result.data.unwrap().iter().map(|p| p.id).collect();
      assert_eq!(ids, vec![2]);
    }
    assert_eq!(properties.gets(), 2);
  }

  #[tokio::test]
  async fn test_success_callback_runs_before_invalidation_refetch() {
    let client = QueryClient::new();
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let f = {
      let log = log.clone();
      fetcher(move |_key| {
        let log = log.clone();
        async move {
          log.lock().unwrap().push("fetch");
          Ok(json!([]))
        }
      })
    };
    let key = query_key!["/api/expenses"];
    let mut observer = client.observe::<Vec<Value>>(&key, Some(f));
    observer.settled().await;

    let runner = MutationRunner::<()>::new(client.clone());
    let callbacks = {
      let log = log.clone();
      MutationCallbacks::new().on_success(move |_: &()| log.lock().unwrap().push("on_success"))
    };
    runner
      .run(async { Ok(()) }, &[key], callbacks)
      .await
      .unwrap();
    observer.settled().await;

    assert_eq!(*log.lock().unwrap(), vec!["fetch", "on_success", "fetch"]);
  }

  #[tokio::test]
  async fn test_failure_reports_message_and_skips_invalidation() {
    let client = QueryClient::new();
    let leases = FakeCollection::default();
    let key = query_key!["/api/leases"];
    let mut observer = client.observe::<Vec<Value>>(&key, Some(leases.fetcher()));
    observer.settled().await;

    let runner = MutationRunner::<Value>::new(client.clone());
    let seen = Arc::new(Mutex::new(None));
    let callbacks = {
      let seen = seen.clone();
      MutationCallbacks::new()
        .on_success(|_: &Value| panic!("success must not fire"))
        .on_error(move |e: &QueryError| *seen.lock().unwrap() = Some(e.to_string()))
    };
    let request = async {
      Err(QueryError::Status {
        status: 422,
        message: "End date must be after start date".to_string(),
      })
    };
    let err = runner.run(request, &[key.clone()], callbacks).await.unwrap_err();

    assert_eq!(err.to_string(), "End date must be after start date");
    assert_eq!(
      seen.lock().unwrap().as_deref(),
      Some("End date must be after start date")
    );
    assert!(!client.peek(&key).unwrap().is_stale);
    assert_eq!(leases.gets(), 1);
    assert!(runner.state().is_error());
  }

  #[tokio::test]
  async fn test_pending_for_duration_of_request() {
    let client = QueryClient::new();
    let runner = Arc::new(MutationRunner::<u32>::new(client));
    let gate = Arc::new(Notify::new());
    let mut states = runner.watch();

    let task = {
      let runner = runner.clone();
      let gate = gate.clone();
      tokio::spawn(async move {
        runner
          .run(
            async move {
              gate.notified().await;
              Ok(5)
            },
            &[],
            MutationCallbacks::new(),
          )
          .await
      })
    };

    states.changed().await.unwrap();
    assert!(runner.is_pending());
    gate.notify_one();
    assert_eq!(task.await.unwrap().unwrap(), 5);
    assert!(!runner.is_pending());
    assert_eq!(runner.state().data(), Some(&5));
  }
}
