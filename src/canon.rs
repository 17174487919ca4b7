use md5::{Digest, Md5};

use crate::error::GatewayError;
use crate::types::{CommandReq, ScanReq};

/// A request carrying a signature over a fixed, ordered field list.
pub trait Signed {
    fn fields(&self) -> Vec<(&'static str, &str)>;
    fn sign(&self) -> Option<&str>;
}

impl Signed for ScanReq {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("CodeVal", self.code_val.as_str()),
            ("CodeType", self.code_type.as_str()),
            ("BrushTime", self.brush_time.as_str()),
            ("ViewId", self.view_id.as_str()),
            ("UID", self.uid.as_str()),
            ("UKey", self.ukey.as_str()),
            ("SN", self.sn.as_str()),
            ("IsOnline", self.is_online.as_str()),
            ("Property", self.property.as_str()),
            ("Timestamp", self.timestamp.as_str()),
        ]
    }

    fn sign(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

impl Signed for CommandReq {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("ViewId", self.view_id.as_str()),
            ("UID", self.uid.as_str()),
            ("UKey", self.ukey.as_str()),
            ("SN", self.sn.as_str()),
            ("TamperAlarm", self.tamper_alarm.as_str()),
            ("DoorMagnetic", self.door_magnetic.as_str()),
            ("Timestamp", self.timestamp.as_str()),
        ]
    }

    fn sign(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

/// `key=value` pairs concatenated in order, secret appended last when set.
pub fn canonical_string(fields: &[(&str, &str)], secret: &str) -> String {
    let mut out = String::new();
    for (k, v) in fields {
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    if !secret.is_empty() {
        out.push_str("SecretKey=");
        out.push_str(secret);
    }
    out
}

pub fn digest(fields: &[(&str, &str)], secret: &str) -> String {
    hex::encode(Md5::digest(canonical_string(fields, secret).as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// No signature supplied and none required.
    Unsigned,
}

#[derive(Debug, Clone)]
pub struct Signer {
    secret: String,
    require_sign: bool,
}

impl Signer {
    pub fn new(secret: impl Into<String>, require_sign: bool) -> Self {
        Self {
            secret: secret.into(),
            require_sign,
        }
    }

    pub fn verify<R: Signed>(&self, req: &R) -> Result<Verdict, GatewayError> {
        let actual = match req.sign() {
            Some(s) if !s.is_empty() => s,
            _ if !self.require_sign => return Ok(Verdict::Unsigned),
            _ => "",
        };
        let expected = digest(&req.fields(), &self.secret);
        if expected.eq_ignore_ascii_case(actual) {
            Ok(Verdict::Valid)
        } else {
            Err(GatewayError::Authentication {
                expected,
                actual: actual.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scan() -> ScanReq {
        ScanReq {
            code_val: "998678".into(),
            code_type: "Q".into(),
            brush_time: "2025-05-26 10:20:30".into(),
            view_id: "D2".into(),
            uid: "dev001".into(),
            ukey: "3F698DAC58".into(),
            sn: "2001000111".into(),
            is_online: "1".into(),
            property: "1".into(),
            timestamp: "1591789801".into(),
            sign: None,
        }
    }

    #[test]
    fn scan_canonical_order() {
        let s = canonical_string(&sample_scan().fields(), "testkey");
        assert_eq!(
            s,
            "CodeVal=998678CodeType=QBrushTime=2025-05-26 10:20:30ViewId=D2UID=dev001\
             UKey=3F698DAC58SN=2001000111IsOnline=1Property=1Timestamp=1591789801SecretKey=testkey"
        );
    }

    #[test]
    fn scan_digest_known_vectors() {
        let scan = sample_scan();
        let fields = scan.fields();
        assert_eq!(digest(&fields, "testkey"), "7b53af91bdca0f9959e6bd4605f37e77");
        // no secret, no trailing SecretKey pair
        assert_eq!(digest(&fields, ""), "2d489b79ccf807a315edcd2527edd7f2");
    }

    #[test]
    fn command_digest_known_vector() {
        let req = CommandReq {
            view_id: "D2".into(),
            uid: "dev001".into(),
            ukey: "3F698DAC58".into(),
            sn: "2001000111".into(),
            tamper_alarm: "0".into(),
            door_magnetic: "1".into(),
            timestamp: "1591789801".into(),
            sign: None,
        };
        assert_eq!(digest(&req.fields(), "testkey"), "fd2f820db75e59d52f2d4128b273466d");
    }

    #[test]
    fn signature_compare_ignores_case() {
        let signer = Signer::new("testkey", false);
        let mut req = sample_scan();
        req.sign = Some("7B53AF91BDCA0F9959E6BD4605F37E77".into());
        assert_eq!(signer.verify(&req).unwrap(), Verdict::Valid);
    }

    #[test]
    fn mismatch_reports_both_digests() {
        let signer = Signer::new("testkey", false);
        let mut req = sample_scan();
        req.sign = Some("deadbeef".into());
        match signer.verify(&req) {
            Err(GatewayError::Authentication { expected, actual }) => {
                assert_eq!(expected, "7b53af91bdca0f9959e6bd4605f37e77");
                assert_eq!(actual, "deadbeef");
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn unsigned_requests_pass_unless_required() {
        let mut req = sample_scan();
        assert_eq!(Signer::new("k", false).verify(&req).unwrap(), Verdict::Unsigned);
        req.sign = Some(String::new());
        assert_eq!(Signer::new("k", false).verify(&req).unwrap(), Verdict::Unsigned);
        assert!(Signer::new("k", true).verify(&req).is_err());
    }
}
