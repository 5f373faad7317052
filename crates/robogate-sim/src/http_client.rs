// crates/robogate-sim/src/http_client.rs
// ============================================================================
// Module: HTTP Simulator Client
// Description: The production SimulatorClient implementation (C5): an async
//              reqwest client against the simulator's telemetry/world/
//              command/scenario endpoints, with per-call timeouts and an
//              optional X-Sim-Token bearer header.
// Purpose: Give the control loop (robogate-runtime) a concrete, networked
//          collaborator behind the storage-agnostic SimulatorClient trait.
// Dependencies: robogate-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! A timeout-and-size-bounded request pattern over async `reqwest`, since
//! the control loop itself is a `tokio` task rather than a blocking
//! worker. All calls are idempotent except [`HttpSimulatorClient::send_command`];
//! every call carries its own timeout so a slow simulator degrades one
//! tick, not the whole run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use robogate_core::RobogateError;
use robogate_core::interfaces::SendCommandOutcome;
use robogate_core::interfaces::SimulatorClient;
use robogate_core::proposal::ActionProposal;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;

use crate::errors::SimError;

/// Configuration for [`HttpSimulatorClient`].
#[derive(Debug, Clone)]
pub struct HttpSimulatorConfig {
    /// Base URL of the simulator HTTP API, e.g. `http://localhost:9000`.
    pub base_url: String,
    /// Bearer token sent as `X-Sim-Token`, if the simulator requires auth.
    pub token: Option<String>,
    /// Timeout for `get_telemetry`/`get_world`/`trigger_scenario`, milliseconds.
    pub telemetry_timeout_ms: u64,
    /// Timeout for `send_command`, milliseconds.
    pub command_timeout_ms: u64,
}

/// Async HTTP client for the simulator adapter (C5).
///
/// # Invariants
/// - Every outbound call carries an explicit timeout; none can hang the
///   control loop's tick indefinitely.
pub struct HttpSimulatorClient {
    config: HttpSimulatorConfig,
    client: Client,
}

impl HttpSimulatorClient {
    /// Builds a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Transport`] if the underlying `reqwest` client
    /// cannot be constructed (e.g. an invalid TLS backend configuration).
    pub fn new(config: HttpSimulatorConfig) -> Result<Self, SimError> {
        let client = Client::builder()
            .build()
            .map_err(|err| SimError::Transport { endpoint: "client_init".to_string(), detail: err.to_string() })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => builder.header("X-Sim-Token", token),
            None => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, timeout_ms: u64) -> Result<T, SimError> {
        let endpoint = self.endpoint(path);
        let request = self.apply_auth(self.client.get(&endpoint)).timeout(Duration::from_millis(timeout_ms));
        let response = request.send().await.map_err(|err| map_transport_error(&endpoint, timeout_ms, &err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SimError::Http { endpoint, status: status.as_u16() });
        }
        response
            .json::<T>()
            .await
            .map_err(|err| SimError::MalformedResponse { endpoint, detail: err.to_string() })
    }

    async fn post_json<B: serde::Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout_ms: u64,
    ) -> Result<T, SimError> {
        let endpoint = self.endpoint(path);
        let request =
            self.apply_auth(self.client.post(&endpoint)).json(body).timeout(Duration::from_millis(timeout_ms));
        let response = request.send().await.map_err(|err| map_transport_error(&endpoint, timeout_ms, &err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SimError::Http { endpoint, status: status.as_u16() });
        }
        response
            .json::<T>()
            .await
            .map_err(|err| SimError::MalformedResponse { endpoint, detail: err.to_string() })
    }
}

fn map_transport_error(endpoint: &str, timeout_ms: u64, err: &reqwest::Error) -> SimError {
    if err.is_timeout() {
        SimError::Timeout { endpoint: endpoint.to_string(), timeout_ms }
    } else {
        SimError::Transport { endpoint: endpoint.to_string(), detail: err.to_string() }
    }
}

fn into_robogate_error(endpoint: &str, err: SimError) -> RobogateError {
    tracing::warn!(endpoint, error = %err, "simulator call failed");
    RobogateError::TransientExternal(err.to_string())
}

#[derive(serde::Serialize)]
struct SendCommandRequest<'a> {
    intent: &'a str,
    params: serde_json::Value,
}

#[derive(serde::Serialize)]
struct ScenarioRequest<'a> {
    scenario: &'a str,
}

#[async_trait]
impl SimulatorClient for HttpSimulatorClient {
    async fn get_telemetry(&self) -> Result<Telemetry, RobogateError> {
        self.get_json("/sim/telemetry", self.config.telemetry_timeout_ms)
            .await
            .map_err(|err| into_robogate_error("/sim/telemetry", err))
    }

    async fn get_world(&self) -> Result<World, RobogateError> {
        self.get_json("/sim/world", self.config.telemetry_timeout_ms)
            .await
            .map_err(|err| into_robogate_error("/sim/world", err))
    }

    async fn send_command(&self, proposal: &ActionProposal) -> Result<SendCommandOutcome, RobogateError> {
        let (intent, params) = intent_wire_shape(proposal);
        let body = SendCommandRequest { intent, params };
        self.post_json("/sim/command", &body, self.config.command_timeout_ms)
            .await
            .map_err(|err| into_robogate_error("/sim/command", err))
    }

    async fn trigger_scenario(&self, name: &str) -> Result<(), RobogateError> {
        let body = ScenarioRequest { scenario: name };
        let _: serde_json::Value = self
            .post_json("/sim/scenario", &body, self.config.telemetry_timeout_ms)
            .await
            .map_err(|err| into_robogate_error("/sim/scenario", err))?;
        Ok(())
    }
}

/// Renders a proposal's intent as the `(intent, params)` wire shape the
/// simulator's `send_command` endpoint expects.
fn intent_wire_shape(proposal: &ActionProposal) -> (&'static str, serde_json::Value) {
    use robogate_core::proposal::Intent;
    match proposal.intent {
        Intent::MoveTo { x, y, max_speed } => ("MOVE_TO", serde_json::json!({ "x": x, "y": y, "max_speed": max_speed })),
        Intent::Stop => ("STOP", serde_json::Value::Null),
        Intent::Wait => ("WAIT", serde_json::Value::Null),
        Intent::ModifySpeed { max_speed } => ("MODIFY_SPEED", serde_json::json!({ "max_speed": max_speed })),
    }
}

#[cfg(test)]
mod tests {
    use robogate_core::proposal::Intent;

    use super::*;

    #[test]
    fn move_to_renders_its_params_as_json() {
        let proposal = ActionProposal::new(Intent::MoveTo { x: 1.0, y: 2.0, max_speed: 0.4 }, "go");
        let (intent, params) = intent_wire_shape(&proposal);
        assert_eq!(intent, "MOVE_TO");
        assert_eq!(params["x"], 1.0);
        assert_eq!(params["max_speed"], 0.4);
    }

    #[test]
    fn stop_carries_no_params() {
        let proposal = ActionProposal::new(Intent::Stop, "halt");
        let (intent, params) = intent_wire_shape(&proposal);
        assert_eq!(intent, "STOP");
        assert!(params.is_null());
    }
}
