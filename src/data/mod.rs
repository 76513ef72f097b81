use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while ingesting a location snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] simd_json::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Stable location identifier. Upstream feeds send either strings ("OR1")
/// or integers (17); both are kept in their printed form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(String);

impl LocationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! id_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for LocationId {
            fn from(value: $t) -> Self {
                Self(value.to_string())
            }
        })*
    };
}

id_from_int!(i32, i64, u32, u64, usize);

/// A scored facility location. Read-only once ingested.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub risk_score: f64,
    pub description: Option<String>,
    pub last_incident: Option<String>,
    pub last_updated: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>, risk_score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            risk_score,
            description: None,
            last_incident: None,
            last_updated: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of ingesting a snapshot
#[derive(Debug, Default)]
pub struct Snapshot {
    pub locations: Vec<Location>,
    /// Recent alerts, newest last; empty for a bare location list
    pub alerts: Vec<Alert>,
    /// Records dropped for a missing or non-finite score
    pub rejected: usize,
    /// Records dropped because their id was already seen
    pub duplicates: usize,
}

/// Recent alert raised for a location
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub id: Option<String>,
    pub location: String,
    pub message: String,
    /// ISO-8601 timestamp as sent by the feed
    pub timestamp: Option<String>,
    pub status: AlertStatus,
    pub risk_score: Option<f64>,
    pub pathogen: Option<String>,
    /// Suggested responses
    pub actions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlertStatus {
    Active,
    /// Any other state reported by the feed (e.g. "RESOLVED")
    Other(String),
}

impl AlertStatus {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("active") {
            AlertStatus::Active
        } else {
            AlertStatus::Other(raw.to_ascii_uppercase())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Other(s) => s,
        }
    }
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Clock part of the timestamp (`HH:MM:SS`), if it has one
    pub fn time_of_day(&self) -> Option<&str> {
        let ts = self.timestamp.as_deref()?;
        let time = ts.split_once('T').map_or(ts, |(_, t)| t);
        time.get(..8).filter(|t| t.as_bytes().get(2) == Some(&b':'))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Other(IgnoredAny),
}

impl RawId {
    fn into_id(self) -> Option<LocationId> {
        match self {
            RawId::Text(s) => Some(LocationId(s)),
            RawId::Int(n) => Some(LocationId(n.to_string())),
            RawId::UInt(n) => Some(LocationId(n.to_string())),
            RawId::Float(f) if f.is_finite() => Some(LocationId(f.to_string())),
            RawId::Float(_) | RawId::Other(_) => None,
        }
    }
}

/// A score of the wrong JSON type reads as absent, so the record alone is
/// rejected instead of the whole file
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Num(f64),
        Other(IgnoredAny),
    }

    Ok(match RawScore::deserialize(deserializer)? {
        RawScore::Num(n) => Some(n),
        RawScore::Other(_) => None,
    })
}

/// Text field that tolerates numbers, booleans and nulls
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Int(i64),
        Float(f64),
        Other(IgnoredAny),
    }

    Ok(match RawText::deserialize(deserializer)? {
        RawText::Text(s) => Some(s),
        RawText::Int(n) => Some(n.to_string()),
        RawText::Float(f) => Some(f.to_string()),
        RawText::Other(_) => None,
    })
}

/// Raw location record as sent by the dashboard API
#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(default, alias = "lastIncident", deserialize_with = "lenient_text")]
    last_incident: Option<String>,
    #[serde(default, alias = "lastUpdated", deserialize_with = "lenient_text")]
    last_updated: Option<String>,
}

/// Raw alert record from the dashboard API
#[derive(Debug, Deserialize)]
struct RawAlert {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pathogen_name: Option<String>,
    #[serde(default)]
    actions: Vec<IgnoredOr<String>>,
}

/// List element that is skipped when it has the wrong type
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IgnoredOr<T> {
    Value(T),
    Ignored(IgnoredAny),
}

/// Dashboard payload: `{"locations": [...], "alerts": [...], "stats": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Dashboard {
        locations: Vec<RawLocation>,
        #[serde(default)]
        alerts: Vec<IgnoredOr<RawAlert>>,
    },
    Bare(Vec<RawLocation>),
}

/// Parse a snapshot from JSON bytes (buffer is used as simd-json scratch space)
pub fn parse_snapshot(bytes: &mut [u8]) -> Result<Snapshot> {
    let raw: RawSnapshot = simd_json::serde::from_slice(bytes)?;
    let (records, alerts) = match raw {
        RawSnapshot::Dashboard { locations, alerts } => (locations, alerts),
        RawSnapshot::Bare(locations) => (locations, Vec::new()),
    };
    let mut snapshot = ingest(records);
    snapshot.alerts = ingest_alerts(alerts);
    Ok(snapshot)
}

/// Load a snapshot file from disk
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    info!("Loading snapshot from {:?}", path);

    let mut bytes = fs::read(path)?;
    let snapshot = parse_snapshot(&mut bytes)?;

    info!(
        "Loaded {} locations, {} alerts ({} rejected, {} duplicate)",
        snapshot.locations.len(),
        snapshot.alerts.len(),
        snapshot.rejected,
        snapshot.duplicates
    );
    Ok(snapshot)
}

fn ingest(records: Vec<RawLocation>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut seen = HashSet::new();

    for (i, record) in records.into_iter().enumerate() {
        let Some(id) = record.id.and_then(RawId::into_id) else {
            warn!("Record {} has no id, skipping", i);
            snapshot.rejected += 1;
            continue;
        };

        let risk_score = match record.risk_score {
            Some(score) if score.is_finite() => score,
            other => {
                warn!("Location {} has unusable risk score {:?}, skipping", id, other);
                snapshot.rejected += 1;
                continue;
            }
        };

        if !seen.insert(id.clone()) {
            debug!("Duplicate location id {}, keeping first", id);
            snapshot.duplicates += 1;
            continue;
        }

        let name = record.name.unwrap_or_else(|| id.to_string());
        snapshot.locations.push(Location {
            id,
            name,
            risk_score,
            description: record.description,
            last_incident: record.last_incident,
            last_updated: record.last_updated,
        });
    }

    snapshot
}

fn ingest_alerts(records: Vec<IgnoredOr<RawAlert>>) -> Vec<Alert> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let IgnoredOr::Value(raw) = record else {
                warn!("Alert {} is not an object, skipping", i);
                return None;
            };
            let Some(message) = raw.message else {
                warn!("Alert {} has no message, skipping", i);
                return None;
            };
            Some(Alert {
                id: raw.id,
                location: raw.location.unwrap_or_else(|| "Unknown".to_string()),
                message,
                timestamp: raw.timestamp,
                status: raw.status.as_deref().map_or(AlertStatus::Active, AlertStatus::parse),
                risk_score: raw.risk_score.filter(|s| s.is_finite()),
                pathogen: raw.pathogen_name,
                actions: raw
                    .actions
                    .into_iter()
                    .filter_map(|a| match a {
                        IgnoredOr::Value(action) => Some(action),
                        IgnoredOr::Ignored(_) => None,
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Drop non-finite scores and repeated ids from locations built in code,
/// applying the same policy as file ingestion
pub fn sanitize(locations: Vec<Location>) -> Vec<Location> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|loc| {
            if !loc.risk_score.is_finite() {
                warn!("Location {} has non-finite risk score, dropping", loc.id);
                return false;
            }
            seen.insert(loc.id.clone())
        })
        .collect()
}

/// Alert raised for the demo facility's critical room
pub fn demo_alerts() -> Vec<Alert> {
    vec![Alert {
        id: Some("demo-or3".to_string()),
        location: "Operating Room 3".to_string(),
        message: "CRITICAL: 89% infection risk detected in Operating Room 3".to_string(),
        timestamp: None,
        status: AlertStatus::Active,
        risk_score: Some(89.0),
        pathogen: Some("C. difficile".to_string()),
        actions: vec![
            "Deploy UV disinfection robots".to_string(),
            "Delay non-urgent procedures".to_string(),
            "Alert infection control team".to_string(),
        ],
    }]
}

/// Built-in facility used when no snapshot file is available
pub fn demo_snapshot() -> Vec<Location> {
    vec![
        Location::new("OR1", "Operating Room 1", 45.0),
        Location::new("OR2", "Operating Room 2", 72.0),
        Location::new("OR3", "Operating Room 3", 89.0)
            .with_description("Post-op turnover, elevated C. difficile readings"),
        Location::new("ICU1", "ICU Room 1", 34.0),
        Location::new("ICU2", "ICU Room 2", 56.0),
    ]
}
