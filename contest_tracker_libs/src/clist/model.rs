use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use serde_with::{serde_as, DeserializeAs, SerializeAs};

/// Body of `GET /api/v2/contest/`.
#[derive(Deserialize, Debug)]
pub struct ClistContestList {
    pub objects: Vec<UpstreamContest>,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UpstreamContest {
    pub id: i64,
    pub event: String,
    #[serde_as(as = "FromClistDateTime")]
    pub start: DateTime<Utc>,
    pub href: String,
    #[serde(default)]
    pub resource: Option<Resource>,
}

impl UpstreamContest {
    pub fn resource_name(&self) -> Option<&str> {
        self.resource.as_ref().and_then(|resource| resource.name())
    }
}

/// The `resource` field is a bare host name in API v2 responses and an object
/// carrying `name` in the v1 style payloads. Both are accepted.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Resource {
    Name(String),
    Object { name: Option<String> },
}

impl Resource {
    pub fn name(&self) -> Option<&str> {
        match self {
            Resource::Name(name) => Some(name.as_str()),
            Resource::Object { name } => name.as_deref(),
        }
    }
}

/// Timestamps emitted by clist.by. They are UTC but usually come without an offset.
pub struct FromClistDateTime;

impl<'de> DeserializeAs<'de, DateTime<Utc>> for FromClistDateTime {
    fn deserialize_as<D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_utc(&value).map_err(serde::de::Error::custom)
    }
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("invalid timestamp `{}`: {}", value, e))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-08-10T20:00:00.000Z`.
pub struct IsoMillis;

impl SerializeAs<DateTime<Utc>> for IsoMillis {
    fn serialize_as<S>(source: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&source.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<'de> DeserializeAs<'de, DateTime<Utc>> for IsoMillis {
    fn deserialize_as<D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let timestamp = DateTime::parse_from_rfc3339(&value)
            .map_err(|e| serde::de::Error::custom(e.to_string()))?
            .with_timezone(&Utc);

        Ok(timestamp)
    }
}
