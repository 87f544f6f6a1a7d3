//! Convenience re-exports of the crate's surface.

pub use crate::{
  observable::{AllObserver, NextObserver, Observable, ObservableExt},
  observer::{BoxedObserver, BoxedObserverSend, DynObserver, IntoBoxed, Observer},
  ops::flat_map::{FlatMapOp, FlatMapOpThreads, FlatMapSubscription},
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  signal::Signal,
  sink::{Sink, SinkObserver},
  subject::{LocalSubject, SharedSubject, Subject, SubjectState, SubjectSubscription},
  subscription::{
    BoxedSubscription, BoxedSubscriptionSend, DynSubscription, Subscription, SubscriptionSet,
  },
};
