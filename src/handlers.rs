// src/handlers.rs
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::canon::{Signed, Signer, Verdict};
use crate::config::Config;
use crate::error::GatewayError;
use crate::registry::DeviceRegistry;
use crate::relay::VerifyClient;
use crate::translate::translate;
use crate::types::{CommandReply, CommandReq, DeviceReply, ScanReq};

/// Everything a request may read. Built once, never mutated.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<DeviceRegistry>,
    signer: Arc<Signer>,
    relay: VerifyClient,
    tz: FixedOffset,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            registry: Arc::new(DeviceRegistry::new(&cfg.devices)),
            signer: Arc::new(Signer::new(cfg.secret_key.clone(), cfg.require_sign)),
            relay: VerifyClient::new(cfg.verify_url.clone(), cfg.mc_shop_id, cfg.verify_timeout())?,
            tz: cfg.utc_offset()?,
        })
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.tz)
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/CheckCode", post(check_code))
        .route("/api/IsConnect", post(is_connect))
        .route("/api/QueryCmd", post(query_cmd))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

// ---------- API HANDLERS ---------- //

async fn check_code(State(state): State<AppState>, body: Bytes) -> Response {
    match scan(&state, &body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn scan(state: &AppState, body: &[u8]) -> Result<DeviceReply, GatewayError> {
    const ENDPOINT: &str = "CheckCode";

    let req: ScanReq = decode(body, ENDPOINT)?;
    authenticate(&state.signer, &req, &req.uid, ENDPOINT)?;
    let device = state.registry.resolve(&req.uid).ok_or_else(|| {
        warn!(endpoint = ENDPOINT, uid = %req.uid, "unknown device");
        GatewayError::UnknownDevice(req.uid.clone())
    })?;

    info!(
        endpoint = ENDPOINT,
        device,
        uid = %req.uid,
        code_val = %req.code_val,
        code_type = %req.code_type,
        sn = %req.sn,
        is_online = %req.is_online,
        timestamp = %req.timestamp,
        "scan received"
    );

    let outcome = state.relay.relay(&req.code_val).await;
    match &outcome {
        Ok(o) if o.is_success() => {
            info!(endpoint = ENDPOINT, device, uid = %req.uid, code_val = %req.code_val, "code accepted")
        }
        Ok(o) => info!(
            endpoint = ENDPOINT,
            device,
            uid = %req.uid,
            code_val = %req.code_val,
            code = o.code,
            message = %o.message,
            "code rejected by backend"
        ),
        Err(e) => error!(
            endpoint = ENDPOINT,
            device,
            uid = %req.uid,
            code_val = %req.code_val,
            error = %e,
            "verification backend failed"
        ),
    }
    Ok(translate(outcome))
}

async fn is_connect(State(state): State<AppState>, body: Bytes) -> Response {
    HEARTBEAT.respond(&state, &body)
}

async fn query_cmd(State(state): State<AppState>, body: Bytes) -> Response {
    QUERY_CMD.respond(&state, &body)
}

// ---------- IDLE COMMAND ---------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Surface the rejection as an HTTP error.
    Reject,
    /// Answer 200 with an empty command packet.
    EmptyReply,
}

/// One of the polling endpoints that hand a terminal a no-op command.
#[derive(Debug, Clone, Copy)]
pub struct IdleCommand {
    endpoint: &'static str,
    verify_signature: bool,
    require_known_device: bool,
    on_failure: OnFailure,
    cmd_id_suffix: &'static str,
}

pub const HEARTBEAT: IdleCommand = IdleCommand {
    endpoint: "IsConnect",
    verify_signature: false,
    require_known_device: false,
    on_failure: OnFailure::Reject,
    cmd_id_suffix: "345",
};

pub const QUERY_CMD: IdleCommand = IdleCommand {
    endpoint: "QueryCmd",
    verify_signature: true,
    require_known_device: true,
    on_failure: OnFailure::EmptyReply,
    cmd_id_suffix: "",
};

impl IdleCommand {
    fn respond(self, state: &AppState, body: &[u8]) -> Response {
        match self.reply(state, body) {
            Ok(reply) => Json(reply).into_response(),
            Err(e) => match self.on_failure {
                OnFailure::Reject => e.into_response(),
                OnFailure::EmptyReply => Json(CommandReply::empty()).into_response(),
            },
        }
    }

    fn reply(self, state: &AppState, body: &[u8]) -> Result<CommandReply, GatewayError> {
        let req: CommandReq = decode(body, self.endpoint)?;
        if self.verify_signature {
            authenticate(&state.signer, &req, &req.uid, self.endpoint)?;
        }

        match state.registry.resolve(&req.uid) {
            Some(device) => info!(
                endpoint = self.endpoint,
                device,
                uid = %req.uid,
                view_id = %req.view_id,
                sn = %req.sn,
                tamper_alarm = %req.tamper_alarm,
                door_magnetic = %req.door_magnetic,
                "device poll"
            ),
            None if self.require_known_device => {
                warn!(endpoint = self.endpoint, uid = %req.uid, "unknown device");
                return Err(GatewayError::UnknownDevice(req.uid));
            }
            None => warn!(
                endpoint = self.endpoint,
                uid = %req.uid,
                view_id = %req.view_id,
                sn = %req.sn,
                tamper_alarm = %req.tamper_alarm,
                door_magnetic = %req.door_magnetic,
                "poll from unregistered device"
            ),
        }

        Ok(CommandReply::idle(state.now(), self.cmd_id_suffix))
    }
}

// ---------- HELPERS ---------- //

fn decode<T: DeserializeOwned>(body: &[u8], endpoint: &'static str) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(endpoint, error = %e, "request body decode failed");
        GatewayError::Malformed(e)
    })
}

fn authenticate<R: Signed>(
    signer: &Signer,
    req: &R,
    uid: &str,
    endpoint: &'static str,
) -> Result<(), GatewayError> {
    match signer.verify(req) {
        Ok(Verdict::Valid) => {
            debug!(endpoint, uid, "signature verified");
            Ok(())
        }
        Ok(Verdict::Unsigned) => {
            debug!(endpoint, uid, "unsigned request accepted");
            Ok(())
        }
        Err(e) => {
            if let GatewayError::Authentication { expected, actual } = &e {
                warn!(endpoint, uid, %expected, %actual, "signature verification failed");
            }
            Err(e)
        }
    }
}
