//! Serializes edit requests against the data source.

use std::collections::VecDeque;

use crate::completion::{Completion, Resolver};
use crate::source::{DataSource, Edit};
use crate::{Error, ItemKey};

struct Request<T> {
    edit: Edit<T>,
    resolver: Resolver<ItemKey>,
}

/// An edit sent to the source and not confirmed yet.
struct InFlight {
    kind: &'static str,
    confirmation: Completion<ItemKey>,
    resolver: Resolver<ItemKey>,
}

/// A FIFO of edits. At most one edit is dispatched per scheduling pass, and the next one only
/// after the source confirmed the previous one.
pub(crate) struct Reconciler<T> {
    queue: VecDeque<Request<T>>,
    in_flight: Option<InFlight>,
}

impl<T> Reconciler<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            in_flight: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn enqueue(&mut self, edit: Edit<T>) -> Completion<ItemKey> {
        let (completion, resolver) = Completion::pending();
        gtrace!(kind = edit.kind(), queued = self.queue.len(), "enqueue edit");
        self.queue.push_back(Request { edit, resolver });
        completion
    }

    /// Moves the queue forward by one step: settles the in-flight edit if the source confirmed
    /// it, otherwise sends the oldest queued edit to `source` (which may confirm right away).
    ///
    /// Returns `true` when an edit settled. Failures are reported to the caller only and do
    /// not stall the queue.
    pub(crate) fn advance(&mut self, source: &mut dyn DataSource<T>) -> bool {
        if let Some(in_flight) = self.in_flight.take() {
            return self.settle(in_flight);
        }
        let Some(Request { edit, resolver }) = self.queue.pop_front() else {
            return false;
        };
        let kind = edit.kind();
        gtrace!(kind, queued = self.queue.len(), "dispatch edit");
        let confirmation = source.apply(edit);
        self.settle(InFlight {
            kind,
            confirmation,
            resolver,
        })
    }

    fn settle(&mut self, mut in_flight: InFlight) -> bool {
        let Some(result) = in_flight.confirmation.take_result() else {
            self.in_flight = Some(in_flight);
            return false;
        };
        if let Err(err) = &result {
            gwarn!(kind = in_flight.kind, error = %err, "edit failed");
        }
        in_flight.resolver.resolve(result);
        true
    }

    /// Fails every queued request and the one in flight.
    pub(crate) fn fail_all(&mut self, error: Error) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.resolver.resolve(Err(error.clone()));
        }
        for request in self.queue.drain(..) {
            request.resolver.resolve(Err(error.clone()));
        }
    }
}
