//! Match page streamer
//!
//! Retrieves the current match set in fixed-size pages: one `list <N>`,
//! then `next <N>` until an empty page signals end-of-set. The pass is not
//! restartable; re-issue `list` for a fresh one.

use tracing::debug;

use super::conn::EngineConn;
use super::response::RawMatch;
use crate::core::types::{MatchRow, ScanResult, TypeTag};

/// Converts one wire record to a row. Rows whose engine type list is the
/// `unknown` sentinel, or whose hex fields don't parse, are dropped.
fn convert(raw: RawMatch) -> Option<MatchRow> {
    let tag = TypeTag::from_engine_names(&raw.types)?;
    let address = raw.addr.parse().ok()?;
    let offset = u64::from_str_radix(&raw.off, 16).ok()?;
    Some(MatchRow::new(
        raw.match_id,
        address,
        offset,
        raw.region_type,
        raw.value,
        tag,
    ))
}

/// Drains the whole match set through the connection, `page_size` rows per
/// round-trip.
pub async fn fetch_matches(
    conn: &mut EngineConn,
    page_size: usize,
) -> ScanResult<Vec<MatchRow>> {
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    let mut page = conn.list(page_size).await?;
    while !page.is_empty() {
        for raw in page.drain(..) {
            match convert(raw) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
        page = conn.next(page_size).await?;
    }

    if dropped > 0 {
        debug!(dropped, kept = rows.len(), "dropped unrepresentable match rows");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Address;
    use crate::engine::response::RawMatch;

    fn raw(id: u64, types: &str) -> RawMatch {
        RawMatch {
            match_id: id,
            addr: "7f001000".to_string(),
            off: "1000".to_string(),
            region_type: "heap".to_string(),
            value: "100".to_string(),
            types: types.to_string(),
        }
    }

    #[test]
    fn test_convert_known_type() {
        let row = convert(raw(5, "I32s I16s I8s")).unwrap();
        assert_eq!(row.match_id, 5);
        assert_eq!(row.address, Address::new(0x7f001000));
        assert_eq!(row.offset, 0x1000);
        assert_eq!(row.tag, TypeTag::Int32);
        assert!(row.valid);
    }

    #[test]
    fn test_convert_drops_unknown_sentinel() {
        assert!(convert(raw(1, "unknown")).is_none());
    }

    #[test]
    fn test_convert_drops_unparsable_fields() {
        let mut bad = raw(1, "I32s");
        bad.addr = "not-hex".to_string();
        assert!(convert(bad).is_none());

        let mut bad = raw(2, "I32s");
        bad.off = "xyz".to_string();
        assert!(convert(bad).is_none());
    }
}
