//! The request_queue module provides [`InMemoryRequestQueue`], a [`RequestQueue`] that keeps
//! requests in memory. Updates are serialized by a single lock and status changes are checked
//! against the stored request so that a terminal request is never modified.
//!
//! ```
//! use certenroll::*;
//!
//! let queue = InMemoryRequestQueue::default();
//! let mut request = queue.new_request(RequestKind::Crmf).unwrap();
//! request.set_status(RequestStatus::Pending).unwrap();
//! queue.update_request(&request).unwrap();
//! assert_eq!(
//!     RequestStatus::Pending,
//!     queue.find_request(request.id()).unwrap().unwrap().status()
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::environment::enrollment_environment_traits::RequestQueue;
use crate::request::*;
use crate::util::error::*;

#[derive(Default)]
struct QueueState {
    next_id: u64,
    requests: BTreeMap<RequestId, Request>,
    serviced: BTreeSet<RequestId>,
}

/// In-memory [`RequestQueue`]. Request IDs are assigned sequentially starting at 1.
#[derive(Default)]
pub struct InMemoryRequestQueue {
    state: Mutex<QueueState>,
}

impl InMemoryRequestQueue {
    fn lock(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| Error::InternalError("request queue lock poisoned".to_string()))
    }

    /// Returns the number of requests in the queue
    pub fn len(&self) -> usize {
        match self.lock() {
            Ok(state) => state.requests.len(),
            Err(_) => 0,
        }
    }

    /// Returns true if the queue holds no requests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if mark_serviced was called for the request
    pub fn is_serviced(&self, id: RequestId) -> bool {
        match self.lock() {
            Ok(state) => state.serviced.contains(&id),
            Err(_) => false,
        }
    }
}

/// Replaces the stored request unless doing so would move its status backward or modify a request
/// in a terminal status
fn overwrite(stored: &mut Request, request: &Request) -> Result<()> {
    if stored.status() != request.status() && !stored.status().can_transition_to(request.status()) {
        return Err(Error::InvalidStatusTransition {
            from: stored.status(),
            to: request.status(),
        });
    }
    if stored.status().is_terminal() && stored != request {
        return Err(Error::InvalidStatusTransition {
            from: stored.status(),
            to: request.status(),
        });
    }
    *stored = request.clone();
    Ok(())
}

impl RequestQueue for InMemoryRequestQueue {
    fn new_request(&self, kind: RequestKind) -> Result<Request> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let request = Request::new(RequestId(state.next_id), kind);
        state.requests.insert(request.id(), request.clone());
        Ok(request)
    }

    fn find_request(&self, id: RequestId) -> Result<Option<Request>> {
        let state = self.lock()?;
        Ok(state.requests.get(&id).cloned())
    }

    fn update_request(&self, request: &Request) -> Result<()> {
        let mut state = self.lock()?;
        match state.requests.get_mut(&request.id()) {
            Some(stored) => overwrite(stored, request),
            None => Err(Error::NotFound),
        }
    }

    fn replace_request(&self, expected: &Request, request: &Request) -> Result<()> {
        let mut state = self.lock()?;
        let stored = match state.requests.get_mut(&request.id()) {
            Some(stored) => stored,
            None => return Err(Error::NotFound),
        };
        if *stored != *expected {
            return Err(Error::BadRequest(format!(
                "request {} was updated concurrently",
                request.id()
            )));
        }
        overwrite(stored, request)
    }

    fn mark_serviced(&self, request: &Request) -> Result<()> {
        let mut state = self.lock()?;
        if !state.requests.contains_key(&request.id()) {
            return Err(Error::NotFound);
        }
        state.serviced.insert(request.id());
        Ok(())
    }
}
