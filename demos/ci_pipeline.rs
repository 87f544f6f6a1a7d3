//! The continuous-integration demo: a project announces developers, every
//! developer produces commits, and one CI sink watches the merged commit
//! stream.
//!
//! Run with `cargo run --example ci_pipeline`.

use std::fmt;

use tributary::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
enum PipelineError {
  ProjectFailed,
  BrokenBuild,
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineError::ProjectFailed => write!(f, "project failed"),
      PipelineError::BrokenBuild => write!(f, "broken build"),
    }
  }
}

impl std::error::Error for PipelineError {}

#[derive(Clone, Debug)]
struct Commit {
  author: String,
  hash: String,
}

/// A developer owns a hot stream of commits. Cloning shares the stream.
#[derive(Clone)]
struct Developer {
  name: String,
  commits: LocalSubject<'static, Commit, PipelineError>,
}

impl Developer {
  fn new(name: &str) -> Self { Self { name: name.to_string(), commits: LocalSubject::new() } }

  /// The commit stream; subscribing to it is how CI follows along.
  fn start_coding(&self) -> LocalSubject<'static, Commit, PipelineError> { self.commits.clone() }

  fn push_commit(&self, hash: &str) {
    self
      .commits
      .clone()
      .next(Commit { author: self.name.clone(), hash: hash.to_string() });
  }

  fn stop_coding(&self) { self.commits.clone().complete(); }

  fn push_broken_build(&self) { self.commits.clone().error(PipelineError::BrokenBuild); }
}

/// A project announces developers on a hot stream.
struct Project {
  developers: LocalSubject<'static, Developer, PipelineError>,
}

impl Project {
  fn new() -> Self { Self { developers: LocalSubject::new() } }

  fn developer_stream(&self) -> LocalSubject<'static, Developer, PipelineError> {
    self.developers.clone()
  }

  fn add_developer(&self, developer: &Developer) {
    self.developers.clone().next(developer.clone());
  }

  fn stop(&self) { self.developers.clone().complete(); }

  fn fail(&self) { self.developers.clone().error(PipelineError::ProjectFailed); }
}

/// CI builds whatever the merged commit stream delivers.
struct Ci;

impl Sink<Commit, PipelineError> for Ci {
  fn on_signal(&mut self, signal: Signal<Commit, PipelineError>) {
    match signal {
      Signal::Value(commit) => {
        println!("CI is building {} by {}.", commit.hash, commit.author);
      }
      Signal::Completed => println!("CI stopped."),
      Signal::Failed(err) => println!("CI errored: {err}."),
    }
  }
}

fn main() {
  let project = Project::new();
  let jim = Developer::new("Jim");
  let anna = Developer::new("Anna");
  let bob = Developer::new("Bob");

  project
    .developer_stream()
    .flat_map(|developer: Developer| {
      println!("{} started coding...", developer.name);
      developer.start_coding()
    })
    .subscribe_sink(Ci);

  println!("--- normal operation");
  project.add_developer(&jim); // Jim started coding...
  jim.push_commit("1"); // CI is building 1 by Jim.
  project.add_developer(&anna); // Anna started coding...
  anna.push_commit("1"); // CI is building 1 by Anna.
  jim.push_commit("2"); // CI is building 2 by Jim.

  println!("--- completion");
  // Stopping the project alone does not stop CI: Jim and Anna are still
  // coding. CI stops with the last of them.
  project.stop();
  anna.stop_coding();
  jim.stop_coding(); // CI stopped.

  // The pipeline is finished; latecomers and stragglers go nowhere.
  project.add_developer(&bob);
  bob.push_commit("1");
  jim.push_commit("3");

  println!("--- failure");
  let project = Project::new();
  let mia = Developer::new("Mia");
  let noa = Developer::new("Noa");

  project
    .developer_stream()
    .flat_map(|developer: Developer| developer.start_coding())
    .subscribe_sink(Ci);

  project.add_developer(&mia);
  project.add_developer(&noa);
  mia.push_broken_build(); // CI errored: broken build.

  // Everything is dead now, no matter who emits.
  noa.push_commit("2");
  project.add_developer(&Developer::new("Zoe"));

  println!("--- project failure");
  let project = Project::new();
  let kim = Developer::new("Kim");

  project
    .developer_stream()
    .flat_map(|developer: Developer| developer.start_coding())
    .subscribe_sink(Ci);

  project.add_developer(&kim);
  kim.push_commit("1"); // CI is building 1 by Kim.
  project.fail(); // CI errored: project failed.
  kim.push_commit("2");
}
