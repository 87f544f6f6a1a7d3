//! End-to-end coverage of a flattened pipeline, using the same shape as
//! the `ci_pipeline` example: an outer stream of developers, each carrying
//! an inner stream of commits, merged into one sink.

use std::{cell::RefCell, rc::Rc};

use tributary::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Commit {
  author: &'static str,
  hash: &'static str,
}

#[derive(Clone)]
struct Developer {
  name: &'static str,
  commits: LocalSubject<'static, Commit, &'static str>,
}

impl Developer {
  fn new(name: &'static str) -> Self { Self { name, commits: LocalSubject::new() } }

  fn push_commit(&self, hash: &'static str) {
    self.commits.clone().next(Commit { author: self.name, hash });
  }
}

type SignalLog = Rc<RefCell<Vec<Signal<Commit, &'static str>>>>;

fn pipeline() -> (LocalSubject<'static, Developer, &'static str>, SignalLog) {
  let developers = LocalSubject::new();
  let log: SignalLog = Rc::new(RefCell::new(vec![]));
  let sink = {
    let log = log.clone();
    move |signal| log.borrow_mut().push(signal)
  };
  developers
    .clone()
    .flat_map(|developer: Developer| developer.commits.clone())
    .subscribe_signals(sink);
  (developers, log)
}

#[test]
fn commits_interleave_and_completion_waits_for_everyone() {
  let (developers, log) = pipeline();
  let a = Developer::new("a");
  let b = Developer::new("b");

  developers.clone().next(a.clone());
  a.push_commit("1");
  developers.clone().next(b.clone());
  b.push_commit("1");
  a.push_commit("2");

  // Outer completes first, then the inners in reverse order; the sink
  // completes exactly once, after all three.
  developers.clone().complete();
  b.commits.clone().complete();
  assert!(!log.borrow().iter().any(Signal::is_terminal));
  a.commits.clone().complete();

  assert_eq!(
    *log.borrow(),
    vec![
      Signal::Value(Commit { author: "a", hash: "1" }),
      Signal::Value(Commit { author: "b", hash: "1" }),
      Signal::Value(Commit { author: "a", hash: "2" }),
      Signal::Completed,
    ]
  );
}

#[test]
fn a_straggler_holds_completion_open() {
  let (developers, log) = pipeline();
  let straggler = Developer::new("s");

  developers.clone().next(straggler.clone());
  developers.clone().complete();
  assert!(log.borrow().is_empty());

  straggler.push_commit("wip");
  straggler.commits.clone().complete();

  assert_eq!(
    *log.borrow(),
    vec![
      Signal::Value(Commit { author: "s", hash: "wip" }),
      Signal::Completed,
    ]
  );
}

#[test]
fn one_broken_build_kills_the_whole_pipeline() {
  let (developers, log) = pipeline();
  let mia = Developer::new("mia");
  let noa = Developer::new("noa");

  developers.clone().next(mia.clone());
  developers.clone().next(noa.clone());
  mia.commits.clone().error("broken build");

  // The other developer and the project lost their subscribers, so
  // nothing they emit afterwards is observable.
  noa.push_commit("2");
  developers.clone().next(Developer::new("zoe"));
  developers.clone().complete();

  assert_eq!(*log.borrow(), vec![Signal::Failed("broken build")]);
  assert_eq!(noa.commits.subscriber_count(), 0);
  assert_eq!(developers.subscriber_count(), 0);
}

#[test]
fn a_project_failure_kills_the_whole_pipeline() {
  let (developers, log) = pipeline();
  let dev = Developer::new("dev");

  developers.clone().next(dev.clone());
  developers.clone().error("project failed");
  dev.push_commit("3");

  assert_eq!(*log.borrow(), vec![Signal::Failed("project failed")]);
  assert_eq!(dev.commits.subscriber_count(), 0);
}

#[test]
fn stopped_developers_leave_the_pipeline_running() {
  let (developers, log) = pipeline();
  let early = Developer::new("early");
  let late = Developer::new("late");

  developers.clone().next(early.clone());
  early.push_commit("1");
  early.commits.clone().complete();

  developers.clone().next(late.clone());
  late.push_commit("1");
  developers.clone().complete();
  late.commits.clone().complete();

  assert_eq!(
    *log.borrow(),
    vec![
      Signal::Value(Commit { author: "early", hash: "1" }),
      Signal::Value(Commit { author: "late", hash: "1" }),
      Signal::Completed,
    ]
  );
}
