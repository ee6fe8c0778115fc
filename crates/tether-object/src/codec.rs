//! Node codec: scalar variants to literal/URI nodes and back.
//!
//! Canonical datatypes:
//!
//! | Variant    | Node                                   |
//! |------------|----------------------------------------|
//! | `Bool`     | literal `xsd:boolean`                  |
//! | `Int`      | literal `xsd:integer`                  |
//! | `Double`   | literal `xsd:decimal`                  |
//! | `String`   | untyped literal                        |
//! | `Uri`      | Uri node                               |
//! | `DateTime` | literal `xsd:dateTime` (RFC 3339, UTC) |
//! | `Date`     | literal `xsd:date`                     |
//! | `Time`     | literal `xsd:time`                     |
//! | `Duration` | literal `xsd:duration`                 |
//! | other      | hex-encoded bincode, encoded-variant   |
//!
//! Strings are never tagged `xsd:string`, so they compare equal to bare
//! literals written by other tools.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use tether_types::vocab::{tether, xsd};
use tether_types::Node;

use crate::error::{CodecError, CodecResult};
use crate::variant::{ScalarType, Variant};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Encode a value as a node.
///
/// Fails for `Null` and for in-memory object handles, which the storer
/// resolves to nodes itself.
pub fn from_variant(value: &Variant) -> CodecResult<Node> {
    Ok(match value {
        Variant::Null => return Err(CodecError::NotEncodable("null".into())),
        Variant::Object(handle) => {
            return Err(CodecError::NotEncodable(format!("object handle {handle}")))
        }
        Variant::Reference(node) if node.is_nothing() => {
            return Err(CodecError::NotEncodable("wildcard node".into()))
        }
        Variant::Reference(node) => node.clone(),
        Variant::Bool(b) => Node::typed_literal(b.to_string(), xsd::BOOLEAN),
        Variant::Int(i) => Node::typed_literal(i.to_string(), xsd::INTEGER),
        Variant::Double(d) => Node::typed_literal(format_double(*d), xsd::DECIMAL),
        Variant::String(s) => Node::literal(s.clone()),
        Variant::Uri(u) => Node::uri(u.clone()),
        Variant::DateTime(dt) => Node::typed_literal(
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            xsd::DATE_TIME,
        ),
        Variant::Date(d) => Node::typed_literal(d.format(DATE_FORMAT).to_string(), xsd::DATE),
        Variant::Time(t) => Node::typed_literal(t.format(TIME_FORMAT).to_string(), xsd::TIME),
        Variant::Duration(d) => Node::typed_literal(format_duration(*d), xsd::DURATION),
        Variant::Bytes(_) | Variant::List(_) | Variant::Map(_) => {
            if value.contains_references() {
                return Err(CodecError::NotEncodable(format!(
                    "{} holding object references",
                    value.kind_name()
                )));
            }
            let bytes = bincode::serialize(value).map_err(|e| CodecError::Opaque(e.to_string()))?;
            Node::typed_literal(hex::encode(bytes), tether::ENCODED_VARIANT)
        }
    })
}

/// Decode a node into a value.
///
/// Typed literals decode by datatype; unknown datatypes decode to their
/// lexical string. `hint` forces the interpretation of untyped literals and
/// bare URIs, and widens decoded values where that is lossless.
pub fn to_variant(node: &Node, hint: Option<ScalarType>) -> CodecResult<Variant> {
    let decoded = match node {
        Node::Nothing => return Err(CodecError::NotEncodable("wildcard node".into())),
        Node::Blank(_) => return Ok(Variant::Reference(node.clone())),
        Node::Uri(uri) => match hint {
            Some(ScalarType::String) => Variant::String(uri.clone()),
            _ => Variant::Uri(uri.clone()),
        },
        Node::Literal {
            value,
            datatype: None,
        } => match hint {
            Some(scalar) => parse_lexical(value, scalar)?,
            None => Variant::String(value.clone()),
        },
        Node::Literal {
            value,
            datatype: Some(datatype),
        } => decode_typed(value, datatype)?,
    };
    Ok(match hint {
        Some(scalar) => coerce(decoded, scalar)?,
        None => decoded,
    })
}

/// Whether two values encode to the same node.
///
/// An untyped literal is equal to any literal with the same lexical form, so
/// `42` and `"42"` compare equal. Lists and maps never compare equal, so
/// opaque container values always count as changed. Other values with no
/// node form fall back to plain equality.
pub fn node_equal(a: &Variant, b: &Variant) -> bool {
    if is_container(a) || is_container(b) {
        return false;
    }
    match (from_variant(a), from_variant(b)) {
        (Ok(na), Ok(nb)) => {
            na == nb
                || match (&na, &nb) {
                    (
                        Node::Literal {
                            value: va,
                            datatype: da,
                        },
                        Node::Literal {
                            value: vb,
                            datatype: db,
                        },
                    ) => va == vb && (da.is_none() || db.is_none()),
                    _ => false,
                }
        }
        _ => a == b,
    }
}

fn is_container(value: &Variant) -> bool {
    matches!(value, Variant::List(_) | Variant::Map(_))
}

fn decode_typed(value: &str, datatype: &str) -> CodecResult<Variant> {
    let scalar = match datatype {
        xsd::BOOLEAN => ScalarType::Bool,
        xsd::INTEGER => ScalarType::Int,
        xsd::DECIMAL | xsd::DOUBLE => ScalarType::Double,
        xsd::DATE_TIME => ScalarType::DateTime,
        xsd::DATE => ScalarType::Date,
        xsd::TIME => ScalarType::Time,
        xsd::DURATION => ScalarType::Duration,
        tether::ENCODED_VARIANT => {
            let bytes = hex::decode(value).map_err(|e| CodecError::Opaque(e.to_string()))?;
            return bincode::deserialize(&bytes).map_err(|e| CodecError::Opaque(e.to_string()));
        }
        _ => ScalarType::String,
    };
    parse_lexical(value, scalar).map_err(|_| invalid(value, datatype))
}

fn parse_lexical(value: &str, scalar: ScalarType) -> CodecResult<Variant> {
    let lexical = value.trim();
    let parsed = match scalar {
        ScalarType::String | ScalarType::Any => Some(Variant::String(value.to_string())),
        ScalarType::Uri => Some(Variant::Uri(value.to_string())),
        ScalarType::Bool => match lexical {
            "true" | "1" => Some(Variant::Bool(true)),
            "false" | "0" => Some(Variant::Bool(false)),
            _ => None,
        },
        ScalarType::Int => lexical.parse().ok().map(Variant::Int),
        ScalarType::Double => parse_double(lexical).map(Variant::Double),
        ScalarType::DateTime => DateTime::parse_from_rfc3339(lexical)
            .ok()
            .map(|dt| Variant::DateTime(dt.with_timezone(&Utc))),
        ScalarType::Date => NaiveDate::parse_from_str(lexical, DATE_FORMAT)
            .ok()
            .map(Variant::Date),
        ScalarType::Time => NaiveTime::parse_from_str(lexical, TIME_FORMAT)
            .ok()
            .map(Variant::Time),
        ScalarType::Duration => parse_duration(lexical).map(Variant::Duration),
        ScalarType::Bytes => hex::decode(lexical).ok().map(Variant::Bytes),
    };
    parsed.ok_or_else(|| invalid(value, &scalar.to_string()))
}

fn coerce(value: Variant, scalar: ScalarType) -> CodecResult<Variant> {
    Ok(match (scalar, value) {
        (ScalarType::Double, Variant::Int(i)) => Variant::Double(i as f64),
        (ScalarType::String, Variant::Uri(u)) => Variant::String(u),
        (ScalarType::Uri, Variant::String(s)) => Variant::Uri(s),
        (scalar, Variant::String(s)) if scalar != ScalarType::String && scalar != ScalarType::Any => {
            parse_lexical(&s, scalar)?
        }
        (_, value) => value,
    })
}

fn invalid(value: &str, datatype: &str) -> CodecError {
    CodecError::InvalidLexical {
        value: value.to_string(),
        datatype: datatype.to_string(),
    }
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        let inf = if d > 0.0 { "INF" } else { "-INF" };
        inf.to_string()
    } else {
        d.to_string()
    }
}

fn parse_double(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        _ => s.parse().ok().filter(|d: &f64| d.is_finite()),
    }
}

/// `PnDTnHnMnS`, omitting zero components; `PT0S` for zero.
fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let nanos = d.subsec_nanos();
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || nanos > 0 || (hours == 0 && minutes == 0) {
            if nanos > 0 {
                let frac = format!("{nanos:09}");
                out.push_str(&format!("{seconds}.{}S", frac.trim_end_matches('0')));
            } else {
                out.push_str(&format!("{seconds}S"));
            }
        }
    }
    out
}

/// Parse a day-time duration. Year and month components have no fixed
/// length and are rejected.
fn parse_duration(s: &str) -> Option<Duration> {
    let body = s.strip_prefix('P')?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, Some(time))
        }
        None => (body, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let mut total = Duration::ZERO;
    for (number, designator) in components(date_part)? {
        match designator {
            'D' => total += Duration::from_secs(number.parse::<u64>().ok()?.checked_mul(86_400)?),
            _ => return None,
        }
    }
    for (number, designator) in components(time_part.unwrap_or(""))? {
        let add = match designator {
            'H' => Duration::from_secs(number.parse::<u64>().ok()?.checked_mul(3_600)?),
            'M' => Duration::from_secs(number.parse::<u64>().ok()?.checked_mul(60)?),
            'S' => parse_seconds(number)?,
            _ => return None,
        };
        total = total.checked_add(add)?;
    }
    Some(total)
}

fn components(part: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in part.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            continue;
        }
        if i == start {
            return None;
        }
        out.push((&part[start..i], c));
        start = i + c.len_utf8();
    }
    (start == part.len()).then_some(out)
}

fn parse_seconds(s: &str) -> Option<Duration> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let secs = whole.parse::<u64>().ok()?;
    if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let nanos = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse::<u32>().ok()?
    };
    Some(Duration::new(secs, nanos))
}
