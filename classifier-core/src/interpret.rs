//! Parsing and classification of the remote endpoint's JSON responses.
//!
//! Two response shapes exist: the classifier replies `{"category": ...}`,
//! the diagnostic endpoint replies `{"status", "message"}`. Interpretation
//! is total: every upload result, including transport failures and
//! malformed bodies, yields a [`ClassificationOutcome`].

use serde::Deserialize;

/// Raw result of one upload attempt. `status_code <= 0` means the transport
/// produced no response at all; any positive status carries whatever body
/// the server sent, 200 or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub status_code: i32,
    pub body: String,
    pub error: Option<String>,
}

impl UploadResult {
    pub fn received(status_code: i32, body: String) -> Self {
        Self {
            status_code,
            body,
            error: None,
        }
    }

    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self {
            status_code: -1,
            body: String::new(),
            error: Some(reason.into()),
        }
    }

    /// A response was received, successful or not.
    pub fn has_response(&self) -> bool {
        self.status_code > 0
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Canonical waste categories the classification endpoint can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Paper,
    Metal,
    Glass,
    Organic,
    NotTrash,
    Unknown,
}

impl Category {
    /// Case-insensitive match against the fixed category set; anything
    /// outside it is Unknown.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PAPER" => Category::Paper,
            "METAL" => Category::Metal,
            "GLASS" => Category::Glass,
            "ORGANIC" => Category::Organic,
            "NOT_TRASH" => Category::NotTrash,
            _ => Category::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Paper => "PAPER",
            Category::Metal => "METAL",
            Category::Glass => "GLASS",
            Category::Organic => "ORGANIC",
            Category::NotTrash => "NOT_TRASH",
            Category::Unknown => "UNKNOWN",
        }
    }

    /// Organic waste is compostable, not recyclable.
    pub fn recyclable(self) -> bool {
        matches!(self, Category::Paper | Category::Metal | Category::Glass)
    }

    fn describe(self) -> &'static str {
        match self {
            Category::Paper => "PAPER waste - recyclable",
            Category::Metal => "METAL waste - recyclable",
            Category::Glass => "GLASS waste - recyclable",
            Category::Organic => "ORGANIC waste - compostable",
            Category::NotTrash => "NOT_TRASH - item not recognized as waste",
            Category::Unknown => "UNKNOWN category - verify server response",
        }
    }
}

/// Final, typed result of interpreting one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutcome {
    pub category: Category,
    pub recyclable: bool,
    pub message: String,
}

impl ClassificationOutcome {
    fn of(category: Category) -> Self {
        Self {
            category,
            recyclable: category.recyclable(),
            message: category.describe().to_string(),
        }
    }

    fn unknown(message: impl Into<String>) -> Self {
        Self {
            category: Category::Unknown,
            recyclable: false,
            message: message.into(),
        }
    }
}

/// Maps an upload result to a classification outcome.
///
/// Missing key and wrong type are deliberately distinct diagnostics: a
/// server that renames the field and one that changes its type need
/// different fixes.
pub fn interpret(result: &UploadResult) -> ClassificationOutcome {
    if result.body.is_empty() {
        return ClassificationOutcome::unknown("no response received");
    }

    let value: serde_json::Value = match serde_json::from_str(&result.body) {
        Ok(value) => value,
        Err(err) => {
            return ClassificationOutcome::unknown(format!("response parse error: {err}"));
        }
    };

    match value.get("category") {
        None => ClassificationOutcome::unknown("category field missing"),
        Some(serde_json::Value::String(label)) => {
            ClassificationOutcome::of(Category::from_label(label))
        }
        Some(other) => {
            ClassificationOutcome::unknown(format!("category field is not a string: {other}"))
        }
    }
}

/// Reply shape of the diagnostic/test endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeReply {
    pub status: String,
    pub message: String,
}

pub fn parse_probe(body: &str) -> Result<ProbeReply, serde_json::Error> {
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> UploadResult {
        UploadResult::received(200, body.to_string())
    }

    #[test]
    fn known_categories_map_case_insensitively() {
        let cases = [
            ("Paper", Category::Paper, true),
            ("METAL", Category::Metal, true),
            ("glass", Category::Glass, true),
            ("oRgAnIc", Category::Organic, false),
            ("not_trash", Category::NotTrash, false),
        ];
        for (label, category, recyclable) in cases {
            let outcome = interpret(&ok(&format!("{{\"category\":\"{label}\"}}")));
            assert_eq!(outcome.category, category, "label {label}");
            assert_eq!(outcome.recyclable, recyclable, "label {label}");
        }
    }

    #[test]
    fn paper_outcome_message_names_the_category() {
        let outcome = interpret(&ok("{\"category\":\"Paper\"}"));
        assert_eq!(outcome.category, Category::Paper);
        assert!(outcome.recyclable);
        assert!(outcome.message.contains("PAPER"));
    }

    #[test]
    fn unrecognized_label_maps_to_unknown() {
        let outcome = interpret(&ok("{\"category\":\"plutonium\"}"));
        assert_eq!(outcome.category, Category::Unknown);
        assert!(!outcome.recyclable);
    }

    #[test]
    fn missing_category_field_is_reported_distinctly() {
        let outcome = interpret(&ok("{\"error\":\"internal\"}"));
        assert_eq!(outcome.category, Category::Unknown);
        assert_eq!(outcome.message, "category field missing");
    }

    #[test]
    fn non_string_category_is_not_conflated_with_a_missing_one() {
        let outcome = interpret(&ok("{\"category\":42}"));
        assert_eq!(outcome.category, Category::Unknown);
        assert!(outcome.message.contains("not a string"));
        assert_ne!(outcome.message, "category field missing");
    }

    #[test]
    fn malformed_body_yields_a_parse_diagnostic() {
        let outcome = interpret(&ok("{\"category\": \"paper\""));
        assert_eq!(outcome.category, Category::Unknown);
        assert!(outcome.message.contains("parse error"));
    }

    #[test]
    fn empty_body_is_no_response_not_a_parse_error() {
        let outcome = interpret(&UploadResult::received(200, String::new()));
        assert_eq!(outcome.category, Category::Unknown);
        assert_eq!(outcome.message, "no response received");
    }

    #[test]
    fn transport_failure_is_no_response() {
        let result = UploadResult::transport_failure("connection refused");
        assert!(!result.has_response());
        let outcome = interpret(&result);
        assert_eq!(outcome.message, "no response received");
    }

    #[test]
    fn error_body_on_a_500_is_still_inspected() {
        let result = UploadResult::received(500, "{\"error\":\"internal\"}".to_string());
        assert!(result.has_response());
        assert!(!result.is_success());
        let outcome = interpret(&result);
        assert_eq!(outcome.message, "category field missing");
    }

    #[test]
    fn probe_reply_parses_the_diagnostic_shape() {
        let reply = parse_probe("{\"status\":\"ok\",\"message\":\"server alive\"}").unwrap();
        assert_eq!(reply.status, "ok");
        assert_eq!(reply.message, "server alive");
    }

    #[test]
    fn probe_reply_rejects_the_classifier_shape() {
        assert!(parse_probe("{\"category\":\"paper\"}").is_err());
    }
}
