//! Shared per-session state touched by the element proxies.

use parking_lot::Mutex;

use crate::element::{InteractionEvent, InteractionSink};

/// Records what the proxies report: currently the last click/key-entry
/// event, kept for coordinate corrections against the next capture.
#[derive(Default)]
pub struct SessionState {
	last_interaction: Mutex<Option<InteractionEvent>>,
}

impl SessionState {
	pub fn new() -> Self {
		Self::default()
	}

	/// The most recent interaction reported by a proxy, if any.
	pub fn last_interaction(&self) -> Option<InteractionEvent> {
		self.last_interaction.lock().clone()
	}

	pub(crate) fn reset(&self) {
		*self.last_interaction.lock() = None;
	}
}

impl InteractionSink for SessionState {
	fn on_interaction(&self, event: InteractionEvent) {
		tracing::trace!(?event, "interaction reported");
		*self.last_interaction.lock() = Some(event);
	}
}
