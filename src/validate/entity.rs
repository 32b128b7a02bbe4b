//! Platform entity validation
//!
//! Cross-checks locally authored expected entities against the live
//! platform. Only fields present in the expected record are checked.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{ValidateError, ValidateResult};
use crate::platform::{
    entities, sha256_hex, EntityHandle, EntityKind, PlatformClient, PlatformResponse,
};

use super::outcome::{BatchOutcome, FileOutcome, Outcome};

/// Sections requested with every entity fetch
pub const INCLUDES: [&str; 4] = ["additional", "attributes", "labels", "tags"];

const FILE_PREFIX: &str = "validate_";
const FILE_SUFFIX: &str = ".json";

// ============================================================================
// EXPECTED ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedAttribute {
    #[serde(rename = "type")]
    pub attr_type: String,
    pub value: String,
}

/// A locally authored description of an entity the test expects to exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExpectedEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,

    /// Platform id (groups and victims)
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    /// Indicator value or group name
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,

    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub confidence: Option<u32>,

    #[serde(default)]
    pub attribute: Option<Vec<ExpectedAttribute>>,

    #[serde(default, deserialize_with = "names")]
    pub tag: Option<Vec<String>>,

    #[serde(default, rename = "securityLabel", deserialize_with = "names")]
    pub security_label: Option<Vec<String>>,

    /// Local file whose hash must match the platform's copy
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl ExpectedEntity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            id: None,
            summary: None,
            rating: None,
            confidence: None,
            attribute: None,
            tag: None,
            security_label: None,
            file: None,
        }
    }

    /// Identifier used for the platform lookup
    pub fn unique_id(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Indicator(_) => self.summary.as_deref().or(self.id.as_deref()),
            EntityKind::Group(_) => self.id.as_deref(),
            EntityKind::Victim => self.id.as_deref().or(self.summary.as_deref()),
        }
    }

    /// Attributes as `type -> value`; a repeated type keeps its last value
    pub fn attribute_map(&self) -> Option<BTreeMap<String, String>> {
        self.attribute.as_ref().map(|attrs| {
            attrs
                .iter()
                .map(|a| (a.attr_type.clone(), a.value.clone()))
                .collect()
        })
    }

    fn label(&self) -> String {
        match (&self.summary, &self.id) {
            (Some(summary), _) => summary.clone(),
            (None, Some(id)) => id.clone(),
            (None, None) => format!("<{}>", self.kind),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

/// Accepts `["a"]` or the platform's `[{"name": "a"}]`
fn names<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Name {
        Plain(String),
        Named { name: String },
    }

    let raw = Option::<Vec<Name>>::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .into_iter()
            .map(|n| match n {
                Name::Plain(s) | Name::Named { name: s } => s,
            })
            .collect()
    }))
}

// ============================================================================
// COMPARISON HELPERS
// ============================================================================

/// Result of a collection comparison: the verdict and whatever on the
/// actual side was never matched
#[derive(Debug, Clone, PartialEq)]
pub struct Compared<T> {
    pub outcome: Outcome,
    pub unmatched: T,
}

/// Compare two `key -> value` mappings.
///
/// Every expected key must exist in actual with an equal value; whatever is
/// left of actual afterwards is reported as unexpected. All problems are
/// reported, not only the first. Inputs are left untouched.
pub fn compare_dicts<V>(
    expected: &BTreeMap<String, V>,
    actual: &BTreeMap<String, V>,
    error_type: &str,
) -> Compared<BTreeMap<String, V>>
where
    V: PartialEq + Clone + Display,
{
    let mut outcome = Outcome::pass();
    let mut remaining = actual.clone();

    for (key, value) in expected {
        match remaining.remove(key) {
            Some(found) if found == *value => {}
            Some(found) => outcome.record(format!(
                "{0}{1} : {2} did not match {1} : {3}",
                error_type, key, value, found
            )),
            None => outcome.record(format!(
                "{}{} : {} was in expected results but not in actual results.",
                error_type, key, value
            )),
        }
    }

    for (key, value) in &remaining {
        outcome.record(format!(
            "{}{} : {} was in actual results but not in expected results.",
            error_type, key, value
        ));
    }

    Compared {
        outcome,
        unmatched: remaining,
    }
}

/// Compare two unordered sequences; each match consumes one occurrence
pub fn compare_lists<T>(expected: &[T], actual: &[T], error_type: &str) -> Compared<Vec<T>>
where
    T: PartialEq + Clone + Display,
{
    let mut outcome = Outcome::pass();
    let mut remaining = actual.to_vec();

    for item in expected {
        match remaining.iter().position(|a| a == item) {
            Some(index) => {
                remaining.remove(index);
            }
            None => outcome.record(format!(
                "{}{} was in expected results but not in actual results.",
                error_type, item
            )),
        }
    }

    for item in &remaining {
        outcome.record(format!(
            "{}{} was in actual results but not in expected results.",
            error_type, item
        ));
    }

    Compared {
        outcome,
        unmatched: remaining,
    }
}

fn show<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

// ============================================================================
// ENTITY VALIDATOR
// ============================================================================

pub struct EntityValidator<'a> {
    platform: &'a dyn PlatformClient,
}

impl<'a> EntityValidator<'a> {
    pub fn new(platform: &'a dyn PlatformClient) -> Self {
        Self { platform }
    }

    /// Validate every `validate_*.json` file in a directory, in name order
    pub fn dir(&self, directory: &Path, owner: &str) -> ValidateResult<Vec<FileOutcome>> {
        let io_err = |source: std::io::Error| ValidateError::Io {
            path: directory.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(directory).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            tracing::info!("[validator] Validating {}", path.display());
            let batch = self.file(&path, owner)?;
            results.push(FileOutcome { path, batch });
        }
        Ok(results)
    }

    /// Validate every entity described in one JSON file
    pub fn file(&self, path: &Path, owner: &str) -> ValidateResult<BatchOutcome> {
        let entities = load_entities(path)?;
        self.tc_entities(&entities, owner, None)
    }

    /// Validate a batch of entities, optionally paired position-wise with files;
    /// an empty file list counts as no files
    pub fn tc_entities(
        &self,
        entities: &[ExpectedEntity],
        owner: &str,
        files: Option<&[PathBuf]>,
    ) -> ValidateResult<BatchOutcome> {
        let files = files.filter(|f| !f.is_empty());
        if let Some(files) = files {
            if files.len() != entities.len() {
                return Ok(BatchOutcome::rejected(format!(
                    "LengthError: Length of files provided ({}) does not match length of \
                     entities provided ({}).",
                    files.len(),
                    entities.len()
                )));
            }
        }

        let mut results = Vec::with_capacity(entities.len());
        for (index, entity) in entities.iter().enumerate() {
            let file = files.map(|f| f[index].as_path());
            results.push(self.tc_entity(entity, owner, file)?);
        }

        Ok(BatchOutcome {
            results,
            diagnostics: Vec::new(),
        })
    }

    /// Fetch one entity from the platform and compare it with `expected`
    pub fn tc_entity(
        &self,
        expected: &ExpectedEntity,
        owner: &str,
        file: Option<&Path>,
    ) -> ValidateResult<Outcome> {
        let Some(unique_id) = expected.unique_id() else {
            return Ok(Outcome::fail(format!(
                "NoneError: Provided {} entity has no identifier",
                expected.kind
            )));
        };

        let handle = EntityHandle::new(expected.kind, owner, unique_id);
        let response = self.platform.single(&handle, &INCLUDES)?;
        if !Self::success(&response) {
            return Ok(Outcome::fail(format!(
                "NotFoundError: Provided entity {} could not be fetched from the platform",
                expected.label()
            )));
        }

        let body = response.json().unwrap_or(Value::Null);
        let raw = body
            .get("data")
            .and_then(|d| d.get(handle.api_entity()))
            .unwrap_or(&Value::Null);

        let found = entities(raw, &handle.kind);
        if found.is_empty() {
            return Ok(Outcome::fail(format!(
                "NotFoundError: Response for entity {} contained no {} data",
                expected.label(),
                handle.api_entity()
            )));
        }

        let mut outcome = Outcome::pass();
        let expected_attributes = expected.attribute_map();

        for actual in &found {
            if let Some(attributes) = &expected_attributes {
                let compared = compare_dicts(attributes, &actual.attributes, "AttributeError: ");
                outcome.merge(compared.outcome);
            }
            if let Some(tags) = &expected.tag {
                outcome.merge(compare_lists(tags, &actual.tags, "TagError: ").outcome);
            }
            if let Some(labels) = &expected.security_label {
                let compared =
                    compare_lists(labels, &actual.security_labels, "SecurityLabelError: ");
                outcome.merge(compared.outcome);
            }

            match handle.kind {
                EntityKind::Indicator(_) => {
                    if let Some(rating) = expected.rating {
                        if actual.rating != Some(rating) {
                            outcome.record(format!(
                                "RatingError: Provided rating {} does not match actual rating {}",
                                rating,
                                show(&actual.rating)
                            ));
                        }
                    }
                    if let Some(confidence) = expected.confidence {
                        if actual.confidence != Some(f64::from(confidence)) {
                            outcome.record(format!(
                                "ConfidenceError: Provided confidence {} does not match \
                                 actual confidence {}",
                                confidence,
                                show(&actual.confidence)
                            ));
                        }
                    }
                    if actual.value.as_deref() != Some(unique_id) {
                        outcome.record(format!(
                            "SummaryError: Provided summary {} does not match actual summary {}",
                            unique_id,
                            show(&actual.value)
                        ));
                    }
                }
                EntityKind::Group(_) => {
                    if let Some(summary) = &expected.summary {
                        if actual.value.as_ref() != Some(summary) {
                            outcome.record(format!(
                                "SummaryError: Provided summary {} does not match actual summary {}",
                                summary,
                                show(&actual.value)
                            ));
                        }
                    }
                }
                EntityKind::Victim => {}
            }
        }

        if let Some(path) = file.or(expected.file.as_deref()) {
            outcome.merge(self.file_hash(&handle, path)?);
        }

        Ok(outcome)
    }

    /// Compare a local file's SHA-256 with the platform's copy
    pub fn file_hash(&self, handle: &EntityHandle, path: &Path) -> ValidateResult<Outcome> {
        if !handle.kind.supports_file() {
            return Ok(Outcome::fail(format!(
                "TypeError: {} entity type does not contain files.",
                handle.api_sub_type()
            )));
        }

        let io_err = |source: std::io::Error| ValidateError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let provided = sha256_hex(file).map_err(io_err)?;
        let actual = self.platform.file_hash(handle)?;

        if provided.eq_ignore_ascii_case(&actual) {
            Ok(Outcome::pass())
        } else {
            Ok(Outcome::fail(format!(
                "FileHashError: sha256 {} of provided file did not match sha256 of actual file {}",
                provided, actual
            )))
        }
    }

    /// Transport status is OK and the body reports `"status": "Success"`
    pub fn success(response: &PlatformResponse) -> bool {
        if !response.ok() {
            return false;
        }
        match response.json() {
            Ok(body) => body.get("status").and_then(Value::as_str) == Some("Success"),
            Err(_) => false,
        }
    }
}

/// Parse and check a file of expected entities.
///
/// Relative `file` paths inside the records resolve against the file's
/// own directory.
pub fn load_entities(path: &Path) -> ValidateResult<Vec<ExpectedEntity>> {
    let contents = fs::read_to_string(path).map_err(|source| ValidateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entities: Vec<ExpectedEntity> =
        serde_json::from_str(&contents).map_err(|source| ValidateError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for entity in &mut entities {
        entity.validate()?;
        if let Some(file) = &entity.file {
            if file.is_relative() {
                entity.file = Some(base.join(file));
            }
        }
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platform::{GroupType, IndicatorType};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;

    /// Canned platform keyed by entity path
    #[derive(Default)]
    struct FakePlatform {
        responses: HashMap<String, PlatformResponse>,
        hashes: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakePlatform {
        fn with_entity(mut self, path: &str, api_entity: &str, data: Value) -> Self {
            let body = json!({"status": "Success", "data": {api_entity: data}});
            self.responses.insert(
                path.to_string(),
                PlatformResponse { status: 200, body: body.to_string() },
            );
            self
        }

        fn with_hash(mut self, path: &str, hash: &str) -> Self {
            self.hashes.insert(path.to_string(), hash.to_string());
            self
        }
    }

    impl PlatformClient for FakePlatform {
        fn single(
            &self,
            handle: &EntityHandle,
            includes: &[&str],
        ) -> Result<PlatformResponse, PlatformError> {
            assert_eq!(includes, &INCLUDES[..]);
            self.calls.borrow_mut().push(handle.path());
            Ok(self.responses.get(&handle.path()).cloned().unwrap_or(PlatformResponse {
                status: 404,
                body: r#"{"status":"Failure"}"#.into(),
            }))
        }

        fn file_hash(&self, handle: &EntityHandle) -> Result<String, PlatformError> {
            self.hashes
                .get(&handle.path())
                .cloned()
                .ok_or_else(|| PlatformError::Network("no file".into()))
        }
    }

    fn address_data() -> Value {
        json!({
            "ip": "1.1.1.1",
            "rating": 3.0,
            "confidence": 50,
            "attribute": [
                {"type": "Description", "value": "dns resolver"},
                {"type": "Source", "value": "feed"}
            ],
            "tag": [{"name": "dns"}, {"name": "public"}],
            "securityLabel": [{"name": "TLP:WHITE"}]
        })
    }

    fn expected_address() -> ExpectedEntity {
        serde_json::from_value(json!({
            "type": "Address",
            "summary": "1.1.1.1",
            "rating": 3,
            "confidence": 50,
            "attribute": [
                {"type": "Source", "value": "feed"},
                {"type": "Description", "value": "dns resolver"}
            ],
            "tag": ["public", "dns"],
            "securityLabel": ["TLP:WHITE"]
        }))
        .unwrap()
    }

    fn platform() -> FakePlatform {
        FakePlatform::default()
            .with_entity("/v2/indicators/addresses/1.1.1.1", "address", address_data())
            .with_entity(
                "/v2/groups/documents/12",
                "document",
                json!({"id": 12, "name": "Report.pdf", "tag": [{"name": "apt"}]}),
            )
            .with_entity("/v2/victims/7", "victim", json!({"id": 7, "name": "Acme"}))
    }

    #[test]
    fn test_compare_lists_empty() {
        let compared = compare_lists::<String>(&[], &[], "TagError: ");
        assert!(compared.outcome.is_valid());
        assert!(compared.unmatched.is_empty());
    }

    #[test]
    fn test_compare_lists_counts_duplicates() {
        let expected = vec!["a".to_string(), "a".to_string()];
        let actual = vec!["a".to_string()];
        let compared = compare_lists(&expected, &actual, "TagError: ");

        assert!(!compared.outcome.is_valid());
        assert_eq!(
            compared.outcome.diagnostics,
            vec!["TagError: a was in expected results but not in actual results."]
        );
        assert_eq!(actual, vec!["a".to_string()]);
    }

    #[test]
    fn test_compare_lists_reports_both_sides() {
        let expected = vec!["a", "b"];
        let actual = vec!["b", "c", "d"];
        let compared = compare_lists(&expected, &actual, "");
        assert_eq!(compared.outcome.diagnostics.len(), 3);
        assert_eq!(compared.unmatched, vec!["c", "d"]);
    }

    #[test]
    fn test_compare_dicts_extra_key() {
        let expected = BTreeMap::from([("x".to_string(), 1)]);
        let actual = BTreeMap::from([("x".to_string(), 1), ("y".to_string(), 2)]);
        let compared = compare_dicts(&expected, &actual, "AttributeError: ");

        assert!(!compared.outcome.is_valid());
        assert_eq!(compared.unmatched, BTreeMap::from([("y".to_string(), 2)]));
        assert_eq!(
            compared.outcome.diagnostics,
            vec!["AttributeError: y : 2 was in actual results but not in expected results."]
        );
        assert_eq!(actual.len(), 2);
    }

    #[test]
    fn test_compare_dicts_reports_every_problem() {
        let expected = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("c".to_string(), "3".to_string()),
        ]);
        let actual = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "20".to_string()),
        ]);
        let compared = compare_dicts(&expected, &actual, "");

        assert_eq!(
            compared.outcome.diagnostics,
            vec![
                "b : 2 did not match b : 20",
                "c : 3 was in expected results but not in actual results.",
            ]
        );
        assert!(compared.unmatched.is_empty());
    }

    #[test]
    fn test_success() {
        let ok = |status, body: &str| PlatformResponse { status, body: body.to_string() };
        assert!(EntityValidator::success(&ok(200, r#"{"status":"Success"}"#)));
        assert!(!EntityValidator::success(&ok(200, r#"{"status":"Failure"}"#)));
        assert!(!EntityValidator::success(&ok(200, "not json")));
        assert!(!EntityValidator::success(&ok(500, r#"{"status":"Success"}"#)));
    }

    #[test]
    fn test_expected_entity_parsing() {
        let entity: ExpectedEntity = serde_json::from_value(json!({
            "type": "Document",
            "id": 12,
            "summary": "Report.pdf",
            "tag": [{"name": "apt"}, "other"]
        }))
        .unwrap();

        assert_eq!(entity.kind, EntityKind::Group(GroupType::Document));
        assert_eq!(entity.unique_id(), Some("12"));
        assert_eq!(entity.tag, Some(vec!["apt".to_string(), "other".to_string()]));
        assert!(entity.attribute_map().is_none());

        let unknown = serde_json::from_value::<ExpectedEntity>(json!({"type": "Widget"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_expected_entity_field_ranges() {
        let mut entity = ExpectedEntity::new(EntityKind::Indicator(IndicatorType::Host));
        entity.confidence = Some(101);
        assert!(entity.validate().is_err());

        entity.confidence = Some(100);
        entity.rating = Some(5.0);
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_indicator_matches() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);

        let outcome = validator.tc_entity(&expected_address(), "Acme", None).unwrap();
        assert!(outcome.is_valid(), "{:?}", outcome.diagnostics);
    }

    #[test]
    fn test_indicator_confidence_mismatch() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = expected_address();
        expected.confidence = Some(75);

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].starts_with("ConfidenceError"));
    }

    #[test]
    fn test_indicator_rating_mismatch() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = expected_address();
        expected.rating = Some(4.0);

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(
            outcome.diagnostics,
            vec!["RatingError: Provided rating 4 does not match actual rating 3"]
        );
    }

    #[test]
    fn test_security_label_mismatch() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);

        let mut expected = expected_address();
        expected.security_label = Some(vec!["TLP:WHITE".into(), "TLP:AMBER".into()]);
        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].starts_with("SecurityLabelError: TLP:AMBER"));

        expected.security_label = Some(Vec::new());
        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert!(outcome.diagnostics[0].starts_with("SecurityLabelError: TLP:WHITE"));
    }

    #[test]
    fn test_indicator_summary_mismatch() {
        let platform = FakePlatform::default().with_entity(
            "/v2/indicators/hosts/example.com",
            "host",
            json!({"summary": "www.example.com"}),
        );
        let validator = EntityValidator::new(&platform);
        let mut expected = ExpectedEntity::new(EntityKind::Indicator(IndicatorType::Host));
        expected.summary = Some("example.com".into());

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].starts_with("SummaryError"));
        assert!(outcome.diagnostics[0].contains("www.example.com"));
    }

    #[test]
    fn test_every_representation_must_match() {
        let mut other = address_data();
        other["confidence"] = json!(20);
        let platform = FakePlatform::default().with_entity(
            "/v2/indicators/addresses/1.1.1.1",
            "address",
            json!([address_data(), other]),
        );
        let validator = EntityValidator::new(&platform);

        let outcome = validator.tc_entity(&expected_address(), "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].starts_with("ConfidenceError"));

        let platform = FakePlatform::default().with_entity(
            "/v2/indicators/addresses/1.1.1.1",
            "address",
            json!([address_data(), address_data()]),
        );
        let validator = EntityValidator::new(&platform);
        assert!(validator.tc_entity(&expected_address(), "Acme", None).unwrap().is_valid());
    }

    #[test]
    fn test_indicator_tag_and_attribute_mismatch() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = expected_address();
        expected.tag = Some(vec!["dns".into()]);
        expected.attribute = Some(vec![ExpectedAttribute {
            attr_type: "Description".into(),
            value: "dns resolver".into(),
        }]);

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(!outcome.is_valid());
        assert!(outcome.diagnostics.iter().any(|d| d.starts_with("TagError: public")));
        assert!(outcome.diagnostics.iter().any(|d| d.starts_with("AttributeError: Source")));
    }

    #[test]
    fn test_absent_fields_are_not_checked() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = ExpectedEntity::new(EntityKind::Indicator(IndicatorType::Address));
        expected.summary = Some("1.1.1.1".into());

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_not_found() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = ExpectedEntity::new(EntityKind::Indicator(IndicatorType::Address));
        expected.summary = Some("9.9.9.9".into());

        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(outcome.diagnostics[0].starts_with("NotFoundError"));
    }

    #[test]
    fn test_group_summary() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = ExpectedEntity::new(EntityKind::Group(GroupType::Document));
        expected.id = Some("12".into());
        expected.summary = Some("Report.pdf".into());
        expected.tag = Some(vec!["apt".into()]);
        assert!(validator.tc_entity(&expected, "Acme", None).unwrap().is_valid());

        expected.summary = Some("Other.pdf".into());
        let outcome = validator.tc_entity(&expected, "Acme", None).unwrap();
        assert!(outcome.diagnostics[0].starts_with("SummaryError"));
    }

    #[test]
    fn test_victim_by_id() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let mut expected = ExpectedEntity::new(EntityKind::Victim);
        expected.id = Some("7".into());

        assert!(validator.tc_entity(&expected, "Acme", None).unwrap().is_valid());
        assert_eq!(*platform.calls.borrow(), vec!["/v2/victims/7".to_string()]);
    }

    #[test]
    fn test_file_hash() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let digest = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

        let platform = platform().with_hash("/v2/groups/documents/12", digest);
        let validator = EntityValidator::new(&platform);
        let handle = EntityHandle::new(EntityKind::Group(GroupType::Document), "Acme", "12");
        assert!(validator.file_hash(&handle, file.path()).unwrap().is_valid());

        file.write_all(b"d").unwrap();
        let outcome = validator.file_hash(&handle, file.path()).unwrap();
        assert!(outcome.diagnostics[0].starts_with("FileHashError"));

        let handle = EntityHandle::new(EntityKind::Group(GroupType::Threat), "Acme", "3");
        let outcome = validator.file_hash(&handle, file.path()).unwrap();
        assert_eq!(
            outcome.diagnostics,
            vec!["TypeError: Threat entity type does not contain files."]
        );
    }

    #[test]
    fn test_tc_entities_length_mismatch() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let files = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];

        let batch = validator
            .tc_entities(&[expected_address()], "Acme", Some(&files))
            .unwrap();
        assert!(!batch.is_valid());
        assert!(batch.results.is_empty());
        assert!(batch.diagnostics[0].starts_with("LengthError"));
        assert!(platform.calls.borrow().is_empty());
    }

    #[test]
    fn test_tc_entities_empty_files_means_none() {
        let platform = platform();
        let validator = EntityValidator::new(&platform);

        let batch = validator
            .tc_entities(&[expected_address()], "Acme", Some(&[][..]))
            .unwrap();
        assert!(batch.is_valid());
        assert_eq!(batch.len(), 1);
        assert!(batch.diagnostics.is_empty());
    }

    #[test]
    fn test_tc_entities_one_result_per_entity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let digest = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let platform = platform().with_hash("/v2/groups/documents/12", digest);
        let validator = EntityValidator::new(&platform);

        let mut document = ExpectedEntity::new(EntityKind::Group(GroupType::Document));
        document.id = Some("12".into());
        let mut victim = ExpectedEntity::new(EntityKind::Victim);
        victim.id = Some("7".into());

        let files = vec![file.path().to_path_buf(), file.path().to_path_buf()];
        let batch = validator
            .tc_entities(&[document, victim], "Acme", Some(&files))
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch.results[0].is_valid());
        // victims carry no file payload
        assert!(!batch.results[1].is_valid());
    }

    #[test]
    fn test_dir_picks_validation_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: Value| {
            fs::write(dir.path().join(name), body.to_string()).unwrap();
        };
        write("validate_b.json", json!([{"type": "Victim", "id": 7}]));
        write(
            "validate_a.json",
            json!([{"type": "Address", "summary": "1.1.1.1", "confidence": 10}]),
        );
        write("other.json", json!([{"type": "Victim", "id": 99}]));
        write("validate_notes.txt", json!([]));

        let platform = platform();
        let validator = EntityValidator::new(&platform);
        let results = validator.dir(dir.path(), "Acme").unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].path.ends_with("validate_a.json"));
        assert!(!results[0].is_valid());
        assert!(results[1].is_valid());
    }

    #[test]
    fn test_file_propagates_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validate_bad.json");
        fs::write(&path, "[{").unwrap();

        let platform = platform();
        let validator = EntityValidator::new(&platform);
        assert!(matches!(
            validator.file(&path, "Acme"),
            Err(ValidateError::Json { .. })
        ));
        assert!(matches!(
            validator.file(&dir.path().join("missing.json"), "Acme"),
            Err(ValidateError::Io { .. })
        ));
    }

    #[test]
    fn test_load_entities_resolves_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validate_docs.json");
        fs::write(
            &path,
            json!([{"type": "Document", "id": 12, "file": "report.pdf"}]).to_string(),
        )
        .unwrap();

        let entities = load_entities(&path).unwrap();
        assert_eq!(entities[0].file, Some(dir.path().join("report.pdf")));
    }
}
