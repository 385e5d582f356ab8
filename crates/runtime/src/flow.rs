//! The sequential control-flow queue.
//!
//! A session owns exactly one [`ControlFlow`]. Every façade operation is
//! enqueued here, so its ordering relative to ordinary driver commands is
//! the queue order: a check enqueued after a click observes the DOM state
//! that click produced. Tasks run one at a time, strictly FIFO, and are
//! never cancelled mid-task.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

type Task = BoxFuture<'static, ()>;

/// Cloneable handle to one sequential task queue.
///
/// Dropping every handle shuts the worker down after it drains the queue.
#[derive(Clone)]
pub struct ControlFlow {
	tx: mpsc::UnboundedSender<Task>,
}

impl ControlFlow {
	/// Creates the queue and spawns its worker task.
	///
	/// Must be called from within a tokio runtime.
	pub fn new() -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<Task>();

		tokio::spawn(async move {
			while let Some(task) = rx.recv().await {
				task.await;
			}
			tracing::debug!("control flow drained, worker exiting");
		});

		Self { tx }
	}

	/// Enqueues `fut` and waits for its completion.
	///
	/// The future runs only once every previously enqueued task has
	/// finished. Fails with [`Error::FlowTerminated`] if the worker is gone.
	pub async fn execute<T, F>(&self, fut: F) -> Result<T>
	where
		T: Send + 'static,
		F: Future<Output = Result<T>> + Send + 'static,
	{
		let (done_tx, done_rx) = oneshot::channel();

		let task: Task = Box::pin(async move {
			let _ = done_tx.send(fut.await);
		});

		self.tx.send(task).map_err(|_| Error::FlowTerminated)?;
		done_rx.await.map_err(|_| Error::FlowTerminated)?
	}

	/// The queue's generic delay primitive: sleeps for `ms` milliseconds as
	/// a queued task, so the delay orders with everything else on the flow.
	pub async fn timeout(&self, ms: u64) -> Result<()> {
		self.execute(async move {
			tokio::time::sleep(Duration::from_millis(ms)).await;
			Ok(())
		})
		.await
	}
}

impl Default for ControlFlow {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ControlFlow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ControlFlow").finish_non_exhaustive()
	}
}
