use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Return a fresh `updatedAt` value that is strictly after `previous`.
///
/// Wall-clock time is used when it has moved past `previous`; otherwise the
/// previous value is nudged forward by one microsecond.
pub fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// A timestamp as a backend hands it back.
///
/// Document stores return a server timestamp object, key-value stores hold
/// ISO-8601 strings, and some clients report epoch milliseconds. All of them
/// are normalized to `DateTime<Utc>` at the adapter boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Server-assigned timestamp object.
    Server { seconds: i64, nanoseconds: u32 },
    /// Milliseconds since the UNIX epoch.
    Millis(i64),
    /// ISO-8601 / RFC 3339 text.
    Iso(String),
}

impl RawTimestamp {
    /// Encode a time as a server timestamp object.
    pub fn server(at: DateTime<Utc>) -> Self {
        Self::Server {
            seconds: at.timestamp(),
            nanoseconds: at.timestamp_subsec_nanos(),
        }
    }

    /// Convert to UTC. Returns `None` when the value is out of range or
    /// cannot be parsed.
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Server {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(*seconds, *nanoseconds).single(),
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Iso(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Normalize an optional JSON field, treating a missing or unreadable
    /// value as "now".
    pub fn normalize_value(value: Option<&Value>) -> DateTime<Utc> {
        value
            .and_then(|v| serde_json::from_value::<RawTimestamp>(v.clone()).ok())
            .and_then(|raw| raw.normalize())
            .unwrap_or_else(Utc::now)
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Iso(at.to_rfc3339())
    }
}
