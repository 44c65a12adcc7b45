//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hookweave_pipeline::{SharedMiddleware, from_fn};
use hookweave_plugin::{PluginDescriptor, PluginMeta};

/// Middleware adding `n` to the head argument.
pub fn add(n: i64) -> SharedMiddleware<i64> {
    from_fn(move |args: &[i64]| Some(args[0] + n))
}

/// Middleware multiplying the head argument by `n`.
pub fn mul(n: i64) -> SharedMiddleware<i64> {
    from_fn(move |args: &[i64]| Some(args[0] * n))
}

/// Middleware that never answers.
pub fn silent() -> SharedMiddleware<i64> {
    from_fn(|_: &[i64]| None)
}

/// Shared log of labels written by [`record`] middlewares.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Middleware that records `label` and stays silent.
    pub fn record(&self, label: &str) -> SharedMiddleware<i64> {
        let log = self.clone();
        let label = label.to_string();
        from_fn(move |_: &[i64]| {
            log.0.lock().expect("lock").push(label.clone());
            None
        })
    }

    /// Labels recorded so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("lock").clone()
    }
}

/// Plugin descriptor contributing a recorder to `hook`.
pub fn recording_plugin(
    meta: PluginMeta,
    hook: &str,
    log: &CallLog,
) -> PluginDescriptor<i64> {
    let recorder = log.record(&meta.name);
    PluginDescriptor::new(meta).with_hook(hook, recorder)
}
