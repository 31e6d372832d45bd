//! In-memory service and prompter for tests

use crate::backend::{Backend, BackendError, Query, Reply};
use crate::orchestrator::Prompter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One scripted response
pub enum Step {
    Reply(Reply),
    Fail(BackendError),
    /// Never answers
    Hang,
    /// Answers after a delay
    Slow(Duration, Reply),
}

/// Backend that replays a script and records every query it receives
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    queries: Mutex<Vec<Query>>,
    completed: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            queries: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().clone()
    }

    /// Calls that ran to the end of their step
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn query(&self, query: &Query) -> Result<Reply, BackendError> {
        self.queries.lock().push(query.clone());
        let step = self.script.lock().pop_front();

        let result = match step {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Slow(delay, reply)) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            None => Err(BackendError::Service("script exhausted".to_string())),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Prompter with a fixed answer
#[derive(Clone)]
pub struct FixedPrompter {
    answer: bool,
    asked: Arc<AtomicUsize>,
}

impl FixedPrompter {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prompter for FixedPrompter {
    async fn confirm(&self, _question: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
