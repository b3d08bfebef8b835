//! Background tasks owned by a handler

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// Named background tasks of one handler.
///
/// Finished tasks are pruned lazily; names let a handler avoid starting a
/// second copy of the same periodic check.
#[derive(Debug, Default)]
pub(super) struct TaskSet {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl TaskSet {
    pub(super) fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.prune();
        debug!(task = name, "Spawning handler task");
        self.tasks.push((name, tokio::spawn(task)));
    }

    pub(super) fn is_running(&mut self, name: &'static str) -> bool {
        self.prune();
        self.tasks.iter().any(|(n, _)| *n == name)
    }

    pub(super) fn running(&self) -> usize {
        self.tasks.iter().filter(|(_, handle)| !handle.is_finished()).count()
    }

    /// Hand over every join handle, finished or not.
    pub(super) fn drain(&mut self) -> Vec<JoinHandle<()>> {
        self.tasks.drain(..).map(|(_, handle)| handle).collect()
    }

    fn prune(&mut self) {
        self.tasks.retain(|(_, handle)| !handle.is_finished());
    }
}
