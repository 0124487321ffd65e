//! Browser transport over `window.fetch`.
//!
//! Completions are collected by the spawned fetch futures and must be polled
//! via `poll_completions()`.

use super::{Completion, OutgoingRequest, Transport, TransportOutcome};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

pub struct FetchTransport {
    endpoint: String,
    completions: Rc<RefCell<Vec<Completion>>>,
}

impl FetchTransport {
    /// Create a transport posting to `endpoint`, relative to the page.
    pub fn new(endpoint: &str) -> Self {
        Self { endpoint: endpoint.to_string(), completions: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for FetchTransport {
    fn send(&mut self, request: OutgoingRequest) {
        let endpoint = self.endpoint.clone();
        let completions = self.completions.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let outcome = post(&endpoint, &request.body).await;
            if let TransportOutcome::Failed { reason, .. } = &outcome {
                log::warn!("fetch: {} failed: {}", request.id, reason);
            }
            completions.borrow_mut().push(Completion { request_id: request.id, outcome });
        });
    }

    fn poll_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut *self.completions.borrow_mut())
    }
}

fn failed(reason: impl Into<String>) -> TransportOutcome {
    TransportOutcome::Failed { status: None, reason: reason.into() }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

async fn post(endpoint: &str, body: &str) -> TransportOutcome {
    let Some(window) = web_sys::window() else {
        return failed("no window");
    };

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(body));

    let request = match Request::new_with_str_and_init(endpoint, &init) {
        Ok(request) => request,
        Err(e) => return failed(format!("bad request: {}", describe(&e))),
    };
    if let Err(e) = request.headers().set("Content-Type", "application/json") {
        return failed(format!("bad header: {}", describe(&e)));
    }

    let response: Response = match JsFuture::from(window.fetch_with_request(&request)).await {
        Ok(value) => match value.dyn_into() {
            Ok(response) => response,
            Err(_) => return failed("fetch did not yield a Response"),
        },
        Err(e) => return failed(describe(&e)),
    };

    let status = response.status();
    let text = match response.text() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(e) => Err(e),
    };
    match text {
        Ok(value) => match value.as_string() {
            Some(body) => TransportOutcome::Delivered { status, body },
            None => TransportOutcome::Failed { status: Some(status), reason: "non-text body".into() },
        },
        Err(e) => TransportOutcome::Failed { status: Some(status), reason: describe(&e) },
    }
}
