//! Native HTTP transport.
//!
//! Each request is posted with `ureq` on its own thread; the outcome comes
//! back over a channel and is picked up by `poll_completions`.

use super::{Completion, OutgoingRequest, Transport, TransportOutcome, TransportSetupError};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use url::Url;

pub struct HttpTransport {
    endpoint: Url,
    agent: ureq::Agent,
    event_tx: Sender<Completion>,
    event_rx: Receiver<Completion>,
}

impl HttpTransport {
    /// Create a transport posting to an absolute `http`/`https` endpoint.
    pub fn new(endpoint: &str) -> Result<Self, TransportSetupError> {
        let endpoint = Url::parse(endpoint).map_err(|e| TransportSetupError::InvalidUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(TransportSetupError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        let (event_tx, event_rx) = channel();
        Ok(Self { endpoint, agent: ureq::Agent::new(), event_tx, event_rx })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: OutgoingRequest) {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let event_tx = self.event_tx.clone();

        thread::spawn(move || {
            let outcome = post(&agent, &endpoint, &request.body);
            if let TransportOutcome::Failed { reason, .. } = &outcome {
                log::warn!("HTTP thread: {} failed: {}", request.id, reason);
            }
            // The transport may already be gone; nobody is waiting then.
            let _ = event_tx.send(Completion { request_id: request.id, outcome });
        });
    }

    fn poll_completions(&mut self) -> Vec<Completion> {
        self.event_rx.try_iter().collect()
    }
}

fn post(agent: &ureq::Agent, endpoint: &Url, body: &str) -> TransportOutcome {
    match agent
        .post(endpoint.as_str())
        .set("Content-Type", "application/json")
        .send_string(body)
    {
        Ok(response) => {
            let status = response.status();
            match response.into_string() {
                Ok(body) => TransportOutcome::Delivered { status, body },
                Err(e) => TransportOutcome::Failed { status: Some(status), reason: e.to_string() },
            }
        }
        Err(ureq::Error::Status(status, _)) => {
            TransportOutcome::Failed { status: Some(status), reason: format!("HTTP {}", status) }
        }
        Err(ureq::Error::Transport(e)) => {
            TransportOutcome::Failed { status: None, reason: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_endpoint() {
        assert!(matches!(
            HttpTransport::new("/jsonrpc"),
            Err(TransportSetupError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert_eq!(
            HttpTransport::new("ws://localhost:3030/jsonrpc").err(),
            Some(TransportSetupError::UnsupportedScheme("ws".into()))
        );
    }

    #[test]
    fn test_accepts_https() {
        let transport = HttpTransport::new("https://dozer.example/jsonrpc").unwrap();
        assert_eq!(transport.endpoint(), "https://dozer.example/jsonrpc");
    }
}
