//! Reply decoding for the engine protocol
//!
//! Every request is answered by exactly one JSON array. A record carrying
//! an `error` field turns the whole reply into [`ScanError::Engine`] with
//! the message verbatim; otherwise the named fields are extracted per
//! command. A shape mismatch is a [`ScanError::Protocol`].

use crate::core::types::{ScanError, ScanResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reply to `reset <pid>`: attachment facts
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttachInfo {
    #[serde(default)]
    pub regions_count: u64,
    #[serde(default)]
    pub exelink: String,
}

/// Reply to `info <pid>`: liveness, match count, scan progress
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InfoReply {
    #[serde(default, alias = "match_count")]
    pub found: u64,
    #[serde(default)]
    pub scan_progress: f64,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub is_process_dead: bool,
}

/// Reply to `dump`: the raw bytes plus the count actually read
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DumpReply {
    #[serde(default)]
    pub raw: Vec<u8>,
    #[serde(default)]
    pub total_readed: Option<usize>,
}

impl DumpReply {
    /// Bytes actually read; a short read is visible to the caller
    pub fn bytes(self) -> Vec<u8> {
        match self.total_readed {
            Some(n) if n < self.raw.len() => {
                let mut raw = self.raw;
                raw.truncate(n);
                raw
            }
            _ => self.raw,
        }
    }
}

/// One element of a `list`/`next` reply, fields still in wire form
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMatch {
    pub match_id: u64,
    pub addr: String,
    pub off: String,
    pub region_type: String,
    #[serde(deserialize_with = "value_text")]
    pub value: String,
    pub types: String,
}

/// The engine reports booleans as `0`/`1` in some replies
fn bool_or_int<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    match Value::deserialize(de)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(serde::de::Error::custom(format!(
            "expected bool or integer, got {}",
            other
        ))),
    }
}

/// Match values arrive as JSON numbers or strings; normalize to text
fn value_text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Ok(other.to_string()),
    }
}

/// A parsed reply frame, already screened for engine errors
#[derive(Debug, Clone)]
pub struct ReplyFrame(Vec<Value>);

impl ReplyFrame {
    /// Parses one reply frame. An `error` field in the first record yields
    /// [`ScanError::Engine`] carrying the engine's message verbatim.
    pub fn parse(bytes: &[u8]) -> ScanResult<ReplyFrame> {
        let records: Vec<Value> = serde_json::from_slice(bytes)?;
        if let Some(Value::Object(map)) = records.first() {
            if let Some(msg) = map.get("error") {
                let msg = match msg {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(ScanError::Engine(msg));
            }
        }
        Ok(ReplyFrame(records))
    }

    /// Number of records in the frame
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Commands that only acknowledge: any non-error frame is fine
    pub fn into_ack(self) -> ScanResult<()> {
        Ok(())
    }

    fn first(self, expected: &str) -> ScanResult<Value> {
        self.0.into_iter().next().ok_or_else(|| {
            ScanError::protocol(format!("empty reply, expected {}", expected))
        })
    }

    pub fn into_attach_info(self) -> ScanResult<AttachInfo> {
        let value = self.first("attach info")?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_info(self) -> ScanResult<InfoReply> {
        let value = self.first("info record")?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_dump(self) -> ScanResult<DumpReply> {
        let value = self.first("dump record")?;
        Ok(serde_json::from_value(value)?)
    }

    /// A whole frame of match records; an empty frame is the end-of-set page
    pub fn into_matches(self) -> ScanResult<Vec<RawMatch>> {
        self.0
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(ScanError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_record_wins() {
        let err = ReplyFrame::parse(br#"[{"error":"error parsing pid"}]"#).unwrap_err();
        match err {
            ScanError::Engine(msg) => assert_eq!(msg, "error parsing pid"),
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_protocol_error() {
        assert!(matches!(
            ReplyFrame::parse(b"{not json").unwrap_err(),
            ScanError::Protocol(_)
        ));
        // a bare object is not a frame
        assert!(matches!(
            ReplyFrame::parse(br#"{"found":1}"#).unwrap_err(),
            ScanError::Protocol(_)
        ));
    }

    #[test]
    fn test_empty_frame_is_ack() {
        let frame = ReplyFrame::parse(b"[]").unwrap();
        assert!(frame.is_empty());
        frame.into_ack().unwrap();
    }

    #[test]
    fn test_attach_info() {
        let frame =
            ReplyFrame::parse(br#"[{"regions_count":58,"exelink":"/usr/bin/game"}]"#).unwrap();
        let info = frame.into_attach_info().unwrap();
        assert_eq!(info.regions_count, 58);
        assert_eq!(info.exelink, "/usr/bin/game");
    }

    #[test]
    fn test_info_reply_tolerates_int_bools() {
        let frame = ReplyFrame::parse(
            br#"[{"found":7,"scan_progress":0.25,"is_process_dead":0}]"#,
        )
        .unwrap();
        let info = frame.into_info().unwrap();
        assert_eq!(info.found, 7);
        assert_eq!(info.scan_progress, 0.25);
        assert!(!info.is_process_dead);

        let frame =
            ReplyFrame::parse(br#"[{"match_count":3,"is_process_dead":true}]"#).unwrap();
        let info = frame.into_info().unwrap();
        assert_eq!(info.found, 3);
        assert!(info.is_process_dead);
    }

    #[test]
    fn test_match_records() {
        let frame = ReplyFrame::parse(
            br#"[{"match_id":0,"addr":"7f001000","off":"1000","region_type":"heap","value":100,"types":"I32s I16s"},
                {"match_id":1,"addr":"7f002000","off":"2000","region_type":"stack","value":"hi","types":"string"}]"#,
        )
        .unwrap();
        let rows = frame.into_matches().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "100");
        assert_eq!(rows[1].value, "hi");
        assert_eq!(rows[0].types, "I32s I16s");
    }

    #[test]
    fn test_dump_truncates_to_total_readed() {
        let frame =
            ReplyFrame::parse(br#"[{"raw":[1,2,3,4],"total_readed":2}]"#).unwrap();
        assert_eq!(frame.into_dump().unwrap().bytes(), vec![1, 2]);

        let frame = ReplyFrame::parse(br#"[{"raw":[1,2,3,4]}]"#).unwrap();
        assert_eq!(frame.into_dump().unwrap().bytes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_record_is_protocol_error() {
        let frame = ReplyFrame::parse(b"[]").unwrap();
        assert!(matches!(
            frame.into_info().unwrap_err(),
            ScanError::Protocol(_)
        ));
    }
}
