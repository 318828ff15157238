//! Shared fixtures for the integration tests.
//!
//! Provides the villa client's route table, navigator constructors and small
//! hooks that record or park what they see.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use villa_navigator::*;

/// Route table modelled on the management client.
pub fn villa_routes() -> RouteTable<String> {
    RouteTable::from_routes([
        RouteDescriptor::new("home", |_| "Home".to_string())
            .path("/")
            .label("Home")
            .icon("house"),
        RouteDescriptor::new("dashboard", |_| "Dashboard".to_string())
            .label("Dashboard")
            .icon("chart"),
        RouteDescriptor::new("bookings", |_| "Bookings".to_string())
            .label("Bookings")
            .icon("calendar"),
        RouteDescriptor::new("booking", |params: &RouteParams| {
            format!(
                "Booking {}",
                params.get("bookingId").map_or("?", String::as_str)
            )
        })
        .path("/bookings/:bookingId")
        .label("Booking")
        .hidden(),
        RouteDescriptor::new("reviews", |_| "Reviews".to_string()).label("Reviews"),
        RouteDescriptor::new("login", |_| "Login".to_string())
            .label("Sign in")
            .hidden(),
    ])
    .expect("villa routes are valid")
}

pub fn navigator() -> Navigator<String> {
    Navigator::new(villa_routes())
}

pub fn navigator_with(config: NavigatorConfig) -> Navigator<String> {
    Navigator::with_config(villa_routes(), config).expect("valid navigator config")
}

/// Enable log output for a test run (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Ordered list of labels written by hooks.
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// Before hook that records its name and the target, then proceeds.
pub fn recording_hook(
    name: &'static str,
    recorder: &Recorder,
) -> impl BeforeNavigate<String> {
    let recorder = recorder.clone();
    before_fn(name, move |next, event: Arc<NavigationEvent<String>>| {
        recorder.push(format!("{}:{}", name, event.target.key()));
        next.proceed();
        futures::future::ready(Ok(()))
    })
}

/// Continuations held back by [`parking_hook`].
#[derive(Clone, Default)]
pub struct Parked {
    slots: Arc<Mutex<Vec<Continuation>>>,
}

impl Parked {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Take the oldest parked continuation.
    pub fn take(&self) -> Option<Continuation> {
        let mut slots = self.slots.lock();
        if slots.is_empty() {
            None
        } else {
            Some(slots.remove(0))
        }
    }
}

/// Before hook that keeps the continuation for navigations to `key` and
/// proceeds for every other target.
pub fn parking_hook(key: &'static str, parked: &Parked) -> impl BeforeNavigate<String> {
    let parked = parked.clone();
    before_fn("park", move |next, event: Arc<NavigationEvent<String>>| {
        if event.target.key() == key {
            parked.slots.lock().push(next);
        } else {
            next.proceed();
        }
        futures::future::ready(Ok(()))
    })
}
