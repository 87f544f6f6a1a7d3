//! Observer trait and boxing support.
//!
//! An [`Observer`] is the consumer half of a stream: it receives values
//! through `next` and exactly one terminal notification through `error` or
//! `complete`. The terminal methods take `self` by value, so "a terminal
//! signal is delivered at most once" is enforced by the type system rather
//! than by runtime flags.

/// The consumer of a stream.
pub trait Observer<Item, Err> {
  /// Receive the next value.
  fn next(&mut self, value: Item);

  /// Receive the failure notification, consuming the observer.
  fn error(self, err: Err);

  /// Receive the completion notification, consuming the observer.
  fn complete(self);

  /// `true` once the observer will not accept further signals.
  ///
  /// Sources use this to stop emitting early; operators use it to
  /// short-circuit forwarding into a dead downstream.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Object-safe boxing
// ============================================================================

/// Object-safe mirror of [`Observer`].
///
/// `Observer` itself is not object-safe because its terminal methods take
/// `self` by value. This trait adapts them to `Box<Self>` receivers so a
/// subject can hold `Box<dyn DynObserver<…>>` observers of mixed concrete
/// types.
pub trait DynObserver<Item, Err> {
  fn dyn_next(&mut self, value: Item);
  fn dyn_error(self: Box<Self>, err: Err);
  fn dyn_complete(self: Box<Self>);
  fn dyn_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn dyn_next(&mut self, value: Item) { self.next(value); }

  fn dyn_error(self: Box<Self>, err: Err) { (*self).error(err); }

  fn dyn_complete(self: Box<Self>) { (*self).complete(); }

  fn dyn_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer, single-threaded flavor.
pub type BoxedObserver<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + 'a>;

/// Boxed observer usable across threads.
pub type BoxedObserverSend<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + Send + 'a>;

macro_rules! impl_observer_for_boxed {
  ($ty: ty) => {
    impl<'a, Item, Err> Observer<Item, Err> for $ty {
      #[inline]
      fn next(&mut self, value: Item) { (**self).dyn_next(value) }

      #[inline]
      fn error(self, err: Err) { self.dyn_error(err) }

      #[inline]
      fn complete(self) { self.dyn_complete() }

      #[inline]
      fn is_closed(&self) -> bool { (**self).dyn_is_closed() }
    }
  };
}

impl_observer_for_boxed!(BoxedObserver<'a, Item, Err>);
impl_observer_for_boxed!(BoxedObserverSend<'a, Item, Err>);

/// Conversion of a concrete observer into the boxed form a subject stores.
///
/// Two blanket impls target the `Send` and non-`Send` boxes; which one
/// applies is picked by the subject flavor being subscribed to.
pub trait IntoBoxed<B> {
  fn into_boxed(self) -> B;
}

impl<'a, Item, Err, O> IntoBoxed<BoxedObserver<'a, Item, Err>> for O
where
  O: Observer<Item, Err> + 'a,
{
  fn into_boxed(self) -> BoxedObserver<'a, Item, Err> { Box::new(self) }
}

impl<'a, Item, Err, O> IntoBoxed<BoxedObserverSend<'a, Item, Err>> for O
where
  O: Observer<Item, Err> + Send + 'a,
{
  fn into_boxed(self) -> BoxedObserverSend<'a, Item, Err> { Box::new(self) }
}

#[cfg(test)]
mod test {
  use super::*;

  struct Collector {
    values: Vec<i32>,
  }

  impl Observer<i32, &'static str> for Collector {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: &'static str) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[test]
  fn plain_observer() {
    let mut ob = Collector { values: vec![] };
    ob.next(1);
    ob.next(2);
    assert_eq!(ob.values, vec![1, 2]);
    assert!(!ob.is_closed());
  }

  #[test]
  fn boxed_observer_dispatches() {
    let mut boxed: BoxedObserver<'static, i32, &'static str> =
      Collector { values: vec![] }.into_boxed();
    boxed.next(3);
    assert!(!boxed.is_closed());
    boxed.complete();
  }
}
