//! Once-only completion gate and the response accumulator built on it.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{_prelude::*, error::TransportError, http::HttpExchange};

/// Commits the first terminal outcome of an exchange and discards every later one.
///
/// Transports may report several terminal notifications for one request (a close racing an
/// end, an error after a close). Only the first reaches the caller.
#[derive(Debug)]
pub struct CompletionGate<T> {
	outcome: Mutex<Option<T>>,
	discarded: AtomicUsize,
}
impl<T> CompletionGate<T> {
	/// Creates an open gate.
	pub fn new() -> Self {
		Self { outcome: Mutex::new(None), discarded: AtomicUsize::new(0) }
	}

	/// Attempts to commit `outcome`; returns `false` when the gate was already committed.
	pub fn commit(&self, outcome: T) -> bool {
		let mut slot = self.outcome.lock();

		if slot.is_some() {
			self.discarded.fetch_add(1, Ordering::Relaxed);

			return false;
		}

		*slot = Some(outcome);

		true
	}

	/// Returns `true` once an outcome has been committed.
	pub fn is_committed(&self) -> bool {
		self.outcome.lock().is_some()
	}

	/// Number of terminal events dropped after the first commit.
	pub fn discarded(&self) -> usize {
		self.discarded.load(Ordering::Relaxed)
	}

	/// Consumes the gate, yielding the committed outcome.
	pub fn into_inner(self) -> Option<T> {
		self.outcome.into_inner()
	}
}
impl<T> Default for CompletionGate<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// Event-driven sink for one response.
///
/// Body chunks accumulate until a terminal event: `end` commits the exchange, `close` before
/// `end` commits a [`TransportError::Closed`], and `error` commits the transport failure.
/// Whichever arrives first wins.
#[derive(Debug)]
pub struct ResponseAccumulator {
	status: u16,
	buffer: Vec<u8>,
	gate: CompletionGate<Result<HttpExchange, TransportError>>,
}
impl ResponseAccumulator {
	/// Starts accumulating a response with the given status.
	pub fn new(status: u16) -> Self {
		Self { status, buffer: Vec::new(), gate: CompletionGate::new() }
	}

	/// Appends a body chunk; chunks arriving after completion are ignored.
	pub fn data(&mut self, chunk: &[u8]) {
		if !self.gate.is_committed() {
			self.buffer.extend_from_slice(chunk);
		}
	}

	/// Body fully received.
	pub fn end(&mut self) -> bool {
		let body = String::from_utf8_lossy(&self.buffer).into_owned();

		self.gate.commit(Ok(HttpExchange { status: self.status, body }))
	}

	/// Connection closed.
	pub fn close(&mut self) -> bool {
		let received = self.buffer.len();

		self.gate.commit(Err(TransportError::Closed { received }))
	}

	/// Transport failure while reading the body.
	pub fn error(&mut self, error: TransportError) -> bool {
		self.gate.commit(Err(error))
	}

	/// Number of terminal events discarded so far.
	pub fn discarded(&self) -> usize {
		self.gate.discarded()
	}

	/// Yields the committed outcome.
	pub fn finish(self) -> Result<HttpExchange, TransportError> {
		self.gate.into_inner().unwrap_or(Err(TransportError::Incomplete))
	}
}
