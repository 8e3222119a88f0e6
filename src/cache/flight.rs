//! In-flight computations
//!
//! Coalesces concurrent `get_or_compute` misses on the same key: the first
//! caller becomes the leader and computes, later callers wait on the flight
//! and receive the leader's value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
enum FlightState<V> {
    Pending,
    Ready(V),
    Abandoned,
}

/// Outcome observed by a caller waiting on another caller's computation.
#[derive(Debug, PartialEq, Eq)]
pub enum Landing<V> {
    /// The leader stored this value
    Ready(V),
    /// The leader failed or panicked; the waiter should retry
    Abandoned,
}

/// One in-progress computation for a key.
#[derive(Debug)]
pub struct Flight<V> {
    state: Mutex<FlightState<V>>,
    landed: Condvar,
}

impl<V> Flight<V> {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Pending),
            landed: Condvar::new(),
        }
    }

    fn land(&self, outcome: FlightState<V>) {
        *self.state.lock() = outcome;
        self.landed.notify_all();
    }
}

impl<V: Clone> Flight<V> {
    /// Blocks until the leader completes or abandons the flight.
    pub fn wait(&self) -> Landing<V> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                FlightState::Pending => self.landed.wait(&mut state),
                FlightState::Ready(value) => return Landing::Ready(value.clone()),
                FlightState::Abandoned => return Landing::Abandoned,
            }
        }
    }
}

/// Role assigned to a caller that missed the cache.
pub enum Role<'a, V> {
    /// This caller computes; dropping the guard without completing abandons the flight
    Leader(LeaderGuard<'a, V>),
    /// Another caller is computing
    Follower(Arc<Flight<V>>),
}

// == Flight Table ==
/// Per-key table of in-flight computations.
#[derive(Debug)]
pub struct FlightTable<V> {
    flights: Mutex<HashMap<String, Arc<Flight<V>>>>,
}

impl<V> FlightTable<V> {
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Joins the flight for `key`, starting one if none is in progress.
    pub fn join(&self, key: &str) -> Role<'_, V> {
        let mut flights = self.flights.lock();
        if let Some(flight) = flights.get(key) {
            return Role::Follower(Arc::clone(flight));
        }

        let flight = Arc::new(Flight::new());
        flights.insert(key.to_owned(), Arc::clone(&flight));
        Role::Leader(LeaderGuard {
            table: self,
            key: key.to_owned(),
            flight,
            landed: false,
        })
    }

    /// Number of keys currently being computed.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.flights.lock().len()
    }

    fn remove(&self, key: &str) {
        self.flights.lock().remove(key);
    }
}

// == Leader Guard ==
/// Held by the leader while it computes.
pub struct LeaderGuard<'a, V> {
    table: &'a FlightTable<V>,
    key: String,
    flight: Arc<Flight<V>>,
    landed: bool,
}

impl<V> LeaderGuard<'_, V> {
    /// Publishes `value` to every waiter and retires the flight.
    pub fn complete(mut self, value: V) {
        self.table.remove(&self.key);
        self.flight.land(FlightState::Ready(value));
        self.landed = true;
    }
}

impl<V> Drop for LeaderGuard<'_, V> {
    fn drop(&mut self) {
        if !self.landed {
            self.table.remove(&self.key);
            self.flight.land(FlightState::Abandoned);
        }
    }
}
