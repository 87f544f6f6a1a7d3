//! Shared-ownership cells used by subjects and operators.
//!
//! [`MutRc`] and [`MutArc`] are the single-threaded and thread-safe flavors
//! of the same idea: a cheaply clonable handle to interior-mutable state.
//! Generic code takes `P: RcDerefMut<Target = …>` and works with either, so
//! subjects and operators are written once and instantiated for both
//! environments.

use std::{
  cell::{Ref, RefCell, RefMut},
  ops::{Deref, DerefMut},
  rc::Rc,
  sync::{Arc, Mutex, MutexGuard},
};

/// `Rc<RefCell<T>>` behind one name.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

/// `Arc<Mutex<T>>` behind one name.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }
}

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }
}

/// Shared read access through a guard.
pub trait RcDeref: Clone {
  type Target;
  type Guard<'a>: Deref<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref(&self) -> Self::Guard<'_>;
}

/// Shared write access through a guard.
pub trait RcDerefMut: RcDeref {
  type GuardMut<'a>: DerefMut<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref_mut(&self) -> Self::GuardMut<'_>;
}

impl<T> RcDeref for MutRc<T> {
  type Target = T;
  type Guard<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Guard<'_> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type GuardMut<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::GuardMut<'_> { self.0.borrow_mut() }
}

impl<T> RcDeref for MutArc<T> {
  type Target = T;
  type Guard<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Guard<'_> { self.0.lock().unwrap() }
}

impl<T> RcDerefMut for MutArc<T> {
  type GuardMut<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::GuardMut<'_> { self.0.lock().unwrap() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> From<T> for MutRc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

impl<T> From<T> for MutArc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn shared_mutation_is_visible_through_clones() {
    let a = MutRc::own(0);
    let b = a.clone();
    *a.rc_deref_mut() = 7;
    assert_eq!(*b.rc_deref(), 7);
  }

  #[test]
  fn arc_flavor_behaves_the_same() {
    let a = MutArc::own(String::new());
    let b = a.clone();
    a.rc_deref_mut().push_str("hi");
    assert_eq!(&*b.rc_deref(), "hi");
  }
}
