// src/types.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------- DEVICE-FACING ---------- //

/// Scan submission from a terminal. Absent fields decode as empty strings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanReq {
    #[serde(
        rename = "CodeVal", alias = "codeVal", alias = "codeval",
        deserialize_with = "null_default"
    )]
    pub code_val: String,
    #[serde(
        rename = "CodeType", alias = "codeType", alias = "codetype",
        deserialize_with = "null_default"
    )]
    pub code_type: String,
    #[serde(
        rename = "BrushTime", alias = "brushTime", alias = "brushtime",
        deserialize_with = "null_default"
    )]
    pub brush_time: String,
    #[serde(
        rename = "ViewId", alias = "viewId", alias = "viewid", alias = "ViewID",
        deserialize_with = "null_default"
    )]
    pub view_id: String,
    #[serde(
        rename = "UID", alias = "Uid", alias = "uid",
        deserialize_with = "null_default"
    )]
    pub uid: String,
    #[serde(
        rename = "UKey", alias = "Ukey", alias = "uKey", alias = "ukey",
        deserialize_with = "null_default"
    )]
    pub ukey: String,
    #[serde(
        rename = "SN", alias = "Sn", alias = "sn",
        deserialize_with = "null_default"
    )]
    pub sn: String,
    #[serde(
        rename = "IsOnline", alias = "isOnline", alias = "isonline",
        deserialize_with = "null_default"
    )]
    pub is_online: String,
    #[serde(
        rename = "Property", alias = "property",
        deserialize_with = "null_default"
    )]
    pub property: String,
    #[serde(
        rename = "Timestamp", alias = "timestamp", alias = "TimeStamp",
        deserialize_with = "null_default"
    )]
    pub timestamp: String,
    #[serde(rename = "Sign", alias = "sign", skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// Body shared by the heartbeat and command-query polls.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandReq {
    #[serde(
        rename = "ViewId", alias = "viewId", alias = "viewid", alias = "ViewID",
        deserialize_with = "null_default"
    )]
    pub view_id: String,
    #[serde(
        rename = "UID", alias = "Uid", alias = "uid",
        deserialize_with = "null_default"
    )]
    pub uid: String,
    #[serde(
        rename = "UKey", alias = "Ukey", alias = "uKey", alias = "ukey",
        deserialize_with = "null_default"
    )]
    pub ukey: String,
    #[serde(
        rename = "SN", alias = "Sn", alias = "sn",
        deserialize_with = "null_default"
    )]
    pub sn: String,
    #[serde(
        rename = "TamperAlarm", alias = "tamperAlarm", alias = "tamperalarm",
        deserialize_with = "null_default"
    )]
    pub tamper_alarm: String,
    #[serde(
        rename = "DoorMagnetic", alias = "doorMagnetic", alias = "doormagnetic",
        deserialize_with = "null_default"
    )]
    pub door_magnetic: String,
    #[serde(
        rename = "Timestamp", alias = "timestamp", alias = "TimeStamp",
        deserialize_with = "null_default"
    )]
    pub timestamp: String,
    #[serde(rename = "Sign", alias = "sign", skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// Hardware actuation hints handed through from the backend untouched.
/// A key sent as `null` is still present and is copied as `null`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    #[serde(
        rename = "Relay1Time",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub relay1_time: Option<Value>,
    #[serde(
        rename = "BeepType",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub beep_type: Option<Value>,
    #[serde(
        rename = "BeepTime",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub beep_time: Option<Value>,
}

/// Go-style decoding: an explicit `null` leaves the zero value.
fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReply {
    #[serde(rename = "Status")]
    pub status: u8,
    #[serde(rename = "StatusDesc", skip_serializing_if = "Option::is_none")]
    pub status_desc: Option<String>,
    #[serde(flatten)]
    pub actuation: Actuation,
}

impl DeviceReply {
    pub fn denied() -> Self {
        Self {
            status: 0,
            status_desc: None,
            actuation: Actuation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    #[serde(rename = "CmdID")]
    pub cmd_id: String,
    #[serde(rename = "CmdCode")]
    pub cmd_code: i32,
    #[serde(rename = "CmdParams")]
    pub cmd_params: CmdParams,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CmdParams {
    #[serde(rename = "DateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl CommandReply {
    /// No-op command stamped from a single clock reading.
    pub fn idle(now: DateTime<FixedOffset>, id_suffix: &str) -> Self {
        Self {
            cmd_id: format!("{}{id_suffix}", now.format("%Y%m%d%H%M%S")),
            cmd_code: 0,
            cmd_params: CmdParams {
                date_time: Some(now.format("%Y-%m-%d %H:%M:%S").to_string()),
            },
        }
    }

    pub fn empty() -> Self {
        Self {
            cmd_id: String::new(),
            cmd_code: 0,
            cmd_params: CmdParams::default(),
        }
    }
}

// ---------- BACKEND ---------- //

#[derive(Debug, Serialize)]
pub struct VerifyReq<'a> {
    #[serde(rename = "Verification")]
    pub verification: u8,
    #[serde(rename = "McShopID")]
    pub shop_id: i64,
    #[serde(rename = "IsAllSuccess")]
    pub is_all_success: bool,
    #[serde(rename = "UseInfoList")]
    pub use_info_list: [UseInfo<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct UseInfo<'a> {
    #[serde(rename = "VCode")]
    pub v_code: &'a str,
}

impl<'a> VerifyReq<'a> {
    /// Only the scanned value and shop id leave the gateway.
    pub fn for_code(shop_id: i64, code_val: &'a str) -> Self {
        Self {
            verification: 3,
            shop_id,
            is_all_success: true,
            use_info_list: [UseInfo { v_code: code_val }],
        }
    }
}

/// Backend reply, parsed once: typed status plus named passthrough keys.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct VerificationOutcome {
    #[serde(rename = "Code", alias = "code", default, deserialize_with = "null_default")]
    pub code: i64,
    #[serde(rename = "Message", alias = "message", default, deserialize_with = "null_default")]
    pub message: String,
    #[serde(flatten)]
    pub actuation: Actuation,
}

impl VerificationOutcome {
    pub const SUCCESS: i64 = 1;

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }
}
