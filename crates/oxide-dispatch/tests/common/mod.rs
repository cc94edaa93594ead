#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_dispatch::{BoxError, Dispatch, Flow, HandlerResult, Router, RouteSpec};
use serde_json::Value;

/// Ordered log of callback invocations shared between closures.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// A filter that records `label` with its parameters and returns `flow`.
    pub fn filter(
        &self,
        label: &'static str,
        flow: Flow,
    ) -> impl Fn(&[String]) -> Result<Flow, BoxError> + Send + Sync + 'static {
        let trace = self.clone();
        move |params: &[String]| -> Result<Flow, BoxError> {
            trace.push(format!("{label}:{}", params.join(",")));
            Ok(flow)
        }
    }

    /// A handler that records `label` and returns it as payload.
    pub fn handler(
        &self,
        label: &'static str,
    ) -> impl Fn(&[String]) -> HandlerResult + Send + Sync + 'static {
        let trace = self.clone();
        move |params: &[String]| -> HandlerResult {
            trace.push(format!("{label}:{}", params.join(",")));
            Ok(Some(Value::from(label)))
        }
    }
}

/// A handler that returns its parameters joined by commas.
pub fn echo(params: &[String]) -> HandlerResult {
    Ok(Some(Value::from(params.join(","))))
}

/// A spec that returns `label`.
pub fn labelled(label: &'static str) -> RouteSpec {
    RouteSpec::callback(move |_: &[String]| Ok(Some(Value::from(label))))
}

pub fn payload(router: &Router, verb: &str, path: &str) -> Value {
    match router
        .dispatch(verb, path)
        .unwrap_or_else(|e| panic!("dispatch {verb} {path} failed: {e}"))
    {
        Dispatch::Dispatched(Some(value)) => value,
        other => panic!("expected payload for {verb} {path}, got {other:?}"),
    }
}
