//! Platform entity model
//!
//! Entity "type" strings are resolved once into [`EntityKind`]; everything
//! downstream (API path, response key, file support) hangs off that enum.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// INDICATOR TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Address,
    EmailAddress,
    File,
    Host,
    Url,
    Asn,
    Cidr,
    Mutex,
    RegistryKey,
    UserAgent,
    EmailSubject,
    Hashtag,
}

impl IndicatorType {
    pub const ALL: [IndicatorType; 12] = [
        IndicatorType::Address,
        IndicatorType::EmailAddress,
        IndicatorType::File,
        IndicatorType::Host,
        IndicatorType::Url,
        IndicatorType::Asn,
        IndicatorType::Cidr,
        IndicatorType::Mutex,
        IndicatorType::RegistryKey,
        IndicatorType::UserAgent,
        IndicatorType::EmailSubject,
        IndicatorType::Hashtag,
    ];

    /// Name as written in entity records
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorType::Address => "Address",
            IndicatorType::EmailAddress => "EmailAddress",
            IndicatorType::File => "File",
            IndicatorType::Host => "Host",
            IndicatorType::Url => "URL",
            IndicatorType::Asn => "ASN",
            IndicatorType::Cidr => "CIDR",
            IndicatorType::Mutex => "Mutex",
            IndicatorType::RegistryKey => "Registry Key",
            IndicatorType::UserAgent => "User Agent",
            IndicatorType::EmailSubject => "Email Subject",
            IndicatorType::Hashtag => "Hashtag",
        }
    }

    pub fn api_branch(&self) -> &'static str {
        match self {
            IndicatorType::Address => "addresses",
            IndicatorType::EmailAddress => "emailAddresses",
            IndicatorType::File => "files",
            IndicatorType::Host => "hosts",
            IndicatorType::Url => "urls",
            IndicatorType::Asn => "asns",
            IndicatorType::Cidr => "cidrBlocks",
            IndicatorType::Mutex => "mutexes",
            IndicatorType::RegistryKey => "registryKeys",
            IndicatorType::UserAgent => "userAgents",
            IndicatorType::EmailSubject => "emailSubjects",
            IndicatorType::Hashtag => "hashtags",
        }
    }

    pub fn api_entity(&self) -> &'static str {
        match self {
            IndicatorType::Address => "address",
            IndicatorType::EmailAddress => "emailAddress",
            IndicatorType::File => "file",
            IndicatorType::Host => "host",
            IndicatorType::Url => "url",
            IndicatorType::Asn => "asn",
            IndicatorType::Cidr => "cidrBlock",
            IndicatorType::Mutex => "mutex",
            IndicatorType::RegistryKey => "registryKey",
            IndicatorType::UserAgent => "userAgent",
            IndicatorType::EmailSubject => "emailSubject",
            IndicatorType::Hashtag => "hashtag",
        }
    }

    /// Response fields that make up the indicator summary, in order
    fn value_fields(&self) -> &'static [&'static str] {
        match self {
            IndicatorType::Address => &["ip"],
            IndicatorType::EmailAddress => &["address"],
            IndicatorType::File => &["md5", "sha1", "sha256"],
            IndicatorType::Host => &["hostName"],
            IndicatorType::Url => &["text"],
            IndicatorType::Asn => &["AS Number"],
            IndicatorType::Cidr => &["Block"],
            IndicatorType::Mutex => &["Mutex"],
            IndicatorType::RegistryKey => &["Key Name", "Value Name", "Value Type"],
            IndicatorType::UserAgent => &["User Agent String"],
            IndicatorType::EmailSubject => &["Subject"],
            IndicatorType::Hashtag => &["Hashtag"],
        }
    }
}

// ============================================================================
// GROUP TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    Adversary,
    Campaign,
    Document,
    Email,
    Event,
    Incident,
    IntrusionSet,
    Report,
    Signature,
    Task,
    Threat,
}

impl GroupType {
    pub const ALL: [GroupType; 11] = [
        GroupType::Adversary,
        GroupType::Campaign,
        GroupType::Document,
        GroupType::Email,
        GroupType::Event,
        GroupType::Incident,
        GroupType::IntrusionSet,
        GroupType::Report,
        GroupType::Signature,
        GroupType::Task,
        GroupType::Threat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupType::Adversary => "Adversary",
            GroupType::Campaign => "Campaign",
            GroupType::Document => "Document",
            GroupType::Email => "Email",
            GroupType::Event => "Event",
            GroupType::Incident => "Incident",
            GroupType::IntrusionSet => "Intrusion Set",
            GroupType::Report => "Report",
            GroupType::Signature => "Signature",
            GroupType::Task => "Task",
            GroupType::Threat => "Threat",
        }
    }

    pub fn api_branch(&self) -> &'static str {
        match self {
            GroupType::Adversary => "adversaries",
            GroupType::Campaign => "campaigns",
            GroupType::Document => "documents",
            GroupType::Email => "emails",
            GroupType::Event => "events",
            GroupType::Incident => "incidents",
            GroupType::IntrusionSet => "intrusionSets",
            GroupType::Report => "reports",
            GroupType::Signature => "signatures",
            GroupType::Task => "tasks",
            GroupType::Threat => "threats",
        }
    }

    pub fn api_entity(&self) -> &'static str {
        match self {
            GroupType::Adversary => "adversary",
            GroupType::Campaign => "campaign",
            GroupType::Document => "document",
            GroupType::Email => "email",
            GroupType::Event => "event",
            GroupType::Incident => "incident",
            GroupType::IntrusionSet => "intrusionSet",
            GroupType::Report => "report",
            GroupType::Signature => "signature",
            GroupType::Task => "task",
            GroupType::Threat => "threat",
        }
    }
}

// ============================================================================
// ENTITY KIND
// ============================================================================

/// Closed set of entity kinds the platform can look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityKind {
    Indicator(IndicatorType),
    Group(GroupType),
    Victim,
}

impl EntityKind {
    /// Top-level type: "Indicator", "Group" or "Victim"
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Indicator(_) => "Indicator",
            EntityKind::Group(_) => "Group",
            EntityKind::Victim => "Victim",
        }
    }

    /// Declared subtype, e.g. "Address" or "Document"
    pub fn sub_type(&self) -> &'static str {
        match self {
            EntityKind::Indicator(t) => t.name(),
            EntityKind::Group(t) => t.name(),
            EntityKind::Victim => "Victim",
        }
    }

    pub fn api_type(&self) -> &'static str {
        match self {
            EntityKind::Indicator(_) => "indicators",
            EntityKind::Group(_) => "groups",
            EntityKind::Victim => "victims",
        }
    }

    pub fn api_branch(&self) -> Option<&'static str> {
        match self {
            EntityKind::Indicator(t) => Some(t.api_branch()),
            EntityKind::Group(t) => Some(t.api_branch()),
            EntityKind::Victim => None,
        }
    }

    /// Key the platform wraps a single entity under in `data`
    pub fn api_entity(&self) -> &'static str {
        match self {
            EntityKind::Indicator(t) => t.api_entity(),
            EntityKind::Group(t) => t.api_entity(),
            EntityKind::Victim => "victim",
        }
    }

    /// Only documents and reports carry a file payload
    pub fn supports_file(&self) -> bool {
        matches!(
            self,
            EntityKind::Group(GroupType::Document) | EntityKind::Group(GroupType::Report)
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sub_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type '{0}'")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Victim" {
            return Ok(EntityKind::Victim);
        }
        if let Some(t) = IndicatorType::ALL.iter().find(|t| t.name() == s) {
            return Ok(EntityKind::Indicator(*t));
        }
        if let Some(t) = GroupType::ALL.iter().find(|t| t.name() == s) {
            return Ok(EntityKind::Group(*t));
        }
        Err(UnknownEntityType(s.to_string()))
    }
}

impl TryFrom<String> for EntityKind {
    type Error = UnknownEntityType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.sub_type().to_string()
    }
}

// ============================================================================
// ENTITY HANDLE
// ============================================================================

/// A resolved lookup target on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHandle {
    pub kind: EntityKind,
    pub owner: String,
    pub unique_id: String,
}

impl EntityHandle {
    pub fn new(kind: EntityKind, owner: impl Into<String>, unique_id: impl Into<String>) -> Self {
        Self {
            kind,
            owner: owner.into(),
            unique_id: unique_id.into(),
        }
    }

    /// Unencoded REST path segments for the entity
    pub fn path_segments(&self) -> Vec<&str> {
        let mut segments = vec!["v2", self.kind.api_type()];
        if let Some(branch) = self.kind.api_branch() {
            segments.push(branch);
        }
        segments.push(&self.unique_id);
        segments
    }

    pub fn path(&self) -> String {
        format!("/{}", self.path_segments().join("/"))
    }

    pub fn api_entity(&self) -> &'static str {
        self.kind.api_entity()
    }

    pub fn api_sub_type(&self) -> &'static str {
        self.kind.sub_type()
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Raw platform response; a non-2xx status is still a response
#[derive(Debug, Clone)]
pub struct PlatformResponse {
    pub status: u16,
    pub body: String,
}

impl PlatformResponse {
    /// Transport-level success (status below 400)
    pub fn ok(&self) -> bool {
        self.status < 400
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// One entity representation as returned by the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformEntity {
    pub value: Option<String>,
    pub rating: Option<f64>,
    pub confidence: Option<f64>,
    pub attributes: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub security_labels: Vec<String>,
}

/// Normalise `data.<api_entity>` into entity representations.
///
/// The platform returns a single object for a direct lookup and an array
/// when several entities match.
pub fn entities(raw: &Value, kind: &EntityKind) -> Vec<PlatformEntity> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| to_entity(item, kind))
            .collect(),
        Value::Object(_) => vec![to_entity(raw, kind)],
        _ => Vec::new(),
    }
}

fn to_entity(raw: &Value, kind: &EntityKind) -> PlatformEntity {
    let value = match kind {
        EntityKind::Indicator(t) => raw
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| summary_from_fields(raw, t.value_fields())),
        EntityKind::Group(_) | EntityKind::Victim => {
            raw.get("name").and_then(Value::as_str).map(str::to_string)
        }
    };

    let mut attributes = BTreeMap::new();
    for attribute in array(raw, "attribute") {
        if let Some(attr_type) = attribute.get("type").and_then(Value::as_str) {
            attributes.insert(attr_type.to_string(), text(attribute.get("value")));
        }
    }

    PlatformEntity {
        value,
        rating: raw.get("rating").and_then(Value::as_f64),
        confidence: raw.get("confidence").and_then(Value::as_f64),
        attributes,
        tags: names(raw, "tag"),
        security_labels: names(raw, "securityLabel"),
    }
}

fn summary_from_fields(raw: &Value, fields: &[&str]) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|f| raw.get(*f))
        .filter(|v| !v.is_null())
        .map(|v| text(Some(v)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" : "))
    }
}

fn array<'a>(raw: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

fn names(raw: &Value, key: &str) -> Vec<String> {
    array(raw, key)
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
