//! # tributary: hierarchical event-stream composition
//!
//! Hot multicast subjects, flattening of a stream of streams, and strict
//! completion/failure propagation — delivered synchronously on the
//! caller's thread, with no scheduler and no async boundary.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use tributary::prelude::*;
//!
//! let commits = LocalSubject::<&'static str, &'static str>::new();
//! let authors = LocalSubject::<_, &'static str>::new();
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let sink = {
//!   let seen = seen.clone();
//!   move |signal: Signal<&'static str, &'static str>| seen.borrow_mut().push(signal)
//! };
//!
//! authors
//!   .clone()
//!   .flat_map(|stream: LocalSubject<&'static str, &'static str>| stream)
//!   .subscribe_signals(sink);
//!
//! authors.clone().next(commits.clone());
//! commits.clone().next("a1f9");
//! authors.clone().complete();
//! commits.clone().complete();
//!
//! assert_eq!(*seen.borrow(), vec![Signal::Value("a1f9"), Signal::Completed]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Signal`] | One materialized event: `Value`, `Completed`, or `Failed` |
//! | [`Subject`] | Hot multicast source; emit capability and subscribe capability over one shared core |
//! | [`Observer`] / [`Sink`] | Consumers of a stream's signals |
//! | [`ObservableExt::flat_map`] | Merge every projected inner stream into one downstream stream |
//! | [`Subscription`] | Disposal handle for an active link |
//!
//! Emitting a signal runs every subscriber callback before the emit call
//! returns, in subscription order. Once any source in a flattened pipeline
//! fails, every other source is disposed and the failure reaches the sink
//! exactly once; a flattened pipeline completes only when its outer stream
//! and every spawned inner stream have completed.
//!
//! [`Signal`]: signal::Signal
//! [`Subject`]: subject::Subject
//! [`Observer`]: observer::Observer
//! [`Sink`]: sink::Sink
//! [`ObservableExt::flat_map`]: observable::ObservableExt::flat_map
//! [`Subscription`]: subscription::Subscription

pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod signal;
pub mod sink;
pub mod subject;
pub mod subscription;

pub use prelude::*;
