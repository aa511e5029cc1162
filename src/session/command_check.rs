//! Scan-command validation
//!
//! Pure and local: a command is fully checked before any engine call, so a
//! rejected value never touches engine state. The output is the exact
//! predicate text for `find`, plus the derived match kind.

use crate::core::types::{ScanError, ScanResult, TypeTag};
use crate::session::state::MatchKind;

/// A validated scan predicate ready to be sent as `find <text>`
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPredicate {
    pub kind: MatchKind,
    pub text: String,
}

impl ScanPredicate {
    fn new(kind: MatchKind, text: impl Into<String>) -> Self {
        ScanPredicate {
            kind,
            text: text.into(),
        }
    }
}

/// Checks command syntax and data range, returning a valid engine predicate.
///
/// Bare comparison operators and `+`/`-` increments compare against the
/// previous generation, so they are rejected on a first scan. Range bounds
/// are checked against the type's bit width.
pub fn check_scan_command(
    tag: TypeTag,
    input: &str,
    first_scan: bool,
) -> ScanResult<ScanPredicate> {
    if input.is_empty() {
        return Err(ScanError::validation("No value provided"));
    }
    // strings go through essentially verbatim, whitespace preserved
    if tag == TypeTag::String {
        return Ok(ScanPredicate::new(
            MatchKind::MatchString,
            format!("\" {}", input),
        ));
    }

    let cmd = input.trim();

    // snapshot-vs-update shorthand
    if cmd == "?" {
        return Ok(if first_scan {
            ScanPredicate::new(MatchKind::Snapshot, "snapshot")
        } else {
            ScanPredicate::new(MatchKind::Update, "update")
        });
    }

    if tag == TypeTag::ByteArray {
        return check_byte_tokens(cmd);
    }

    check_numeric(tag, cmd, first_scan)
}

fn check_byte_tokens(cmd: &str) -> ScanResult<ScanPredicate> {
    for token in cmd.split(' ') {
        let token = token.trim();
        if token.is_empty() || token == "??" {
            continue;
        }
        if token.len() != 2 || hex::decode(token).is_err() {
            return Err(ScanError::Validation(format!("Bad value: {}", token)));
        }
    }
    Ok(ScanPredicate::new(MatchKind::ByteMask, cmd))
}

fn check_numeric(tag: TypeTag, cmd: &str, first_scan: bool) -> ScanResult<ScanPredicate> {
    let bare_kind = match cmd {
        "=" => Some(MatchKind::Unchanged),
        "!=" => Some(MatchKind::Changed),
        ">" | "+" => Some(MatchKind::Increased),
        "<" | "-" => Some(MatchKind::Decreased),
        _ => None,
    };
    if let Some(kind) = bare_kind {
        if first_scan {
            return Err(ScanError::Validation(format!(
                "Command \"{}\" is not valid for the first scan",
                cmd
            )));
        }
        return Ok(ScanPredicate::new(kind, cmd));
    }

    // `+N` always means "increased by N"; a bare leading `-` stays a
    // negative literal so signed exact scans remain expressible
    let cmd = if cmd.starts_with('+') && !cmd.starts_with("+ ") {
        format!("+ {}", &cmd[1..])
    } else {
        cmd.to_string()
    };
    let cmd = cmd.as_str();

    if first_scan && (cmd.starts_with("+ ") || cmd.starts_with("- ")) {
        return Err(ScanError::Validation(format!(
            "Command \"{}\" is not valid for the first scan",
            &cmd[..1]
        )));
    }

    // inclusive range
    if let Some((lo, hi)) = cmd.split_once("..") {
        let lo = eval_operand(tag, lo)?;
        let hi = eval_operand(tag, hi)?;
        return Ok(ScanPredicate::new(
            MatchKind::Range,
            format!("{}..{}", lo, hi),
        ));
    }

    // prefixed comparison / increment forms
    let (kind, prefix, rest) = if let Some(rest) = cmd.strip_prefix("+ ") {
        (MatchKind::IncreasedBy, "+ ", rest)
    } else if let Some(rest) = cmd.strip_prefix("- ") {
        (MatchKind::DecreasedBy, "- ", rest)
    } else if let Some(rest) = cmd.strip_prefix("> ") {
        (MatchKind::GreaterThan, "> ", rest)
    } else if let Some(rest) = cmd.strip_prefix("< ") {
        (MatchKind::LessThan, "< ", rest)
    } else if let Some(rest) = cmd.strip_prefix("!= ") {
        (MatchKind::NotEqual, "!= ", rest)
    } else {
        (MatchKind::Exact, "", cmd)
    };

    let num = eval_operand(tag, rest)?;
    Ok(ScanPredicate::new(kind, format!("{}{}", prefix, num)))
}

/// Canonical text of one numeric literal, range-checked against the tag
fn eval_operand(tag: TypeTag, s: &str) -> ScanResult<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ScanError::Validation(format!("Bad value: {}", s)));
    }

    if tag.is_float() {
        let v: f64 = s
            .parse()
            .map_err(|_| ScanError::Validation(format!("Bad value: {}", s)))?;
        if !v.is_finite() {
            return Err(ScanError::Validation(format!("Bad value: {}", s)));
        }
        return Ok(v.to_string());
    }

    let Some(num) = parse_int_literal(s) else {
        // a float literal on an integer tag gets the more precise message
        if s.parse::<f64>().is_ok() {
            return Err(ScanError::Validation(format!("{} is not an integer", s)));
        }
        return Err(ScanError::Validation(format!("Bad value: {}", s)));
    };

    let width = tag.bit_width().unwrap_or(64);
    let (min, max): (i128, i128) = if tag.is_signed() {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    } else {
        (0, (1i128 << width) - 1)
    };
    if num < min || num > max {
        return Err(ScanError::Validation(format!(
            "{} is out of range for {}",
            num, tag
        )));
    }
    Ok(num.to_string())
}

/// Decimal or `0x`-prefixed hex, optional leading sign
fn parse_int_literal(s: &str) -> Option<i128> {
    let (neg, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i128>().ok()?
    };
    Some(if neg { -value } else { value })
}
