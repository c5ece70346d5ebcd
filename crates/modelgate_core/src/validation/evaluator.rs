//! Rule evaluation against attribute mappings.
//!
//! # Responsibility
//! - Evaluate every rule of a set and collect human-readable messages.
//!
//! # Invariants
//! - Only `Required` is evaluated for missing or null attributes.
//! - Evaluation never short-circuits; all failures are reported.

use crate::model::attribute::{AttributeValue, Attributes};
use crate::validation::rule::{Rule, RuleKind, RuleSet};
use validator::{ValidateEmail, ValidateUrl};

/// Outcome of evaluating one rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    messages: Vec<String>,
}

impl ValidationReport {
    pub fn passes(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn fails(&self) -> bool {
        !self.passes()
    }

    /// Violation messages in rule declaration order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Evaluates `rules` against `attributes`.
pub fn validate_attributes(attributes: &Attributes, rules: &RuleSet) -> ValidationReport {
    let messages = rules
        .iter()
        .filter(|rule| !rule_passes(rule, attributes.get(rule.attribute())))
        .map(Rule::message)
        .collect();

    ValidationReport { messages }
}

fn rule_passes(rule: &Rule, value: Option<&AttributeValue>) -> bool {
    let value = match value {
        Some(value) if !value.is_null() => value,
        _ => return !rule.kind().applies_to_missing(),
    };

    match rule.kind() {
        RuleKind::Required => !value.is_blank(),
        RuleKind::MinLength(min) => text_len(value).is_some_and(|len| len >= *min),
        RuleKind::MaxLength(max) => text_len(value).is_some_and(|len| len <= *max),
        RuleKind::Email => value.as_text().is_some_and(|text| text.validate_email()),
        RuleKind::Url => value.as_text().is_some_and(|text| text.validate_url()),
        RuleKind::Numeric => value.as_number().is_some(),
        RuleKind::Integer => match value {
            AttributeValue::Integer(_) => true,
            AttributeValue::Text(text) => text.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        RuleKind::Boolean => match value {
            AttributeValue::Bool(_) | AttributeValue::Integer(0) | AttributeValue::Integer(1) => {
                true
            }
            AttributeValue::Text(text) => matches!(text.trim(), "0" | "1"),
            _ => false,
        },
        RuleKind::Min(min) => value.as_number().is_some_and(|number| number >= *min),
        RuleKind::Max(max) => value.as_number().is_some_and(|number| number <= *max),
        RuleKind::In(allowed) => value
            .as_text()
            .is_some_and(|text| allowed.iter().any(|candidate| candidate == text)),
        RuleKind::Matches(pattern) => value.as_text().is_some_and(|text| pattern.is_match(text)),
    }
}

fn text_len(value: &AttributeValue) -> Option<usize> {
    value.as_text().map(|text| text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::validate_attributes;
    use crate::model::attribute::{AttributeValue, Attributes};
    use crate::validation::rule::{Rule, RuleKind, RuleSet};
    use regex::Regex;

    fn attrs(pairs: &[(&str, AttributeValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn empty_rule_set_always_passes() {
        let report = validate_attributes(&Attributes::new(), &RuleSet::new());
        assert!(report.passes());
    }

    #[test]
    fn required_rejects_missing_null_and_blank() {
        let rules = RuleSet::new().rule(Rule::required("title"));

        for attributes in [
            Attributes::new(),
            attrs(&[("title", AttributeValue::Null)]),
            attrs(&[("title", "  ".into())]),
        ] {
            let report = validate_attributes(&attributes, &rules);
            assert_eq!(report.messages(), ["The title field is required."]);
        }

        let ok = validate_attributes(&attrs(&[("title", "x".into())]), &rules);
        assert!(ok.passes());
    }

    #[test]
    fn optional_rules_skip_missing_attributes() {
        let rules = RuleSet::new()
            .rule(Rule::email("email"))
            .rule(Rule::max_length("bio", 3));
        let report = validate_attributes(&Attributes::new(), &rules);
        assert!(report.passes());
    }

    #[test]
    fn collects_every_failure_in_declaration_order() {
        let rules = RuleSet::new()
            .rule(Rule::required("title").with_message("title required message"))
            .rule(Rule::email("email").with_message("email invalid"))
            .rule(Rule::new("score", RuleKind::Min(1.0)));
        let attributes = attrs(&[("email", "not-an-email".into()), ("score", 0_i64.into())]);

        let report = validate_attributes(&attributes, &rules);
        assert!(report.fails());
        assert_eq!(
            report.messages(),
            [
                "title required message",
                "email invalid",
                "The score field must be at least 1."
            ]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let rules = RuleSet::new().rule(Rule::max_length("name", 2));
        let report = validate_attributes(&attrs(&[("name", "éé".into())]), &rules);
        assert!(report.passes());
    }

    #[test]
    fn typed_rules_check_value_shapes() {
        let rules = RuleSet::new()
            .rule(Rule::new("count", RuleKind::Integer))
            .rule(Rule::new("flag", RuleKind::Boolean))
            .rule(Rule::one_of("status", ["draft", "published"]))
            .rule(Rule::matches(
                "slug",
                Regex::new("^[a-z-]+$").expect("valid slug regex"),
            ))
            .rule(Rule::url("homepage"));

        let good = attrs(&[
            ("count", "12".into()),
            ("flag", true.into()),
            ("status", "draft".into()),
            ("slug", "hello-world".into()),
            ("homepage", "https://example.com".into()),
        ]);
        assert!(validate_attributes(&good, &rules).passes());

        let bad = attrs(&[
            ("count", 1.5_f64.into()),
            ("flag", "yes".into()),
            ("status", "archived".into()),
            ("slug", "Hello World".into()),
            ("homepage", "not a url".into()),
        ]);
        assert_eq!(validate_attributes(&bad, &rules).messages().len(), 5);
    }

    #[test]
    fn non_finite_text_fails_numeric_rules() {
        let rules = RuleSet::new()
            .rule(Rule::new("n", RuleKind::Numeric))
            .rule(Rule::new("m", RuleKind::Min(1.0)))
            .rule(Rule::new("x", RuleKind::Max(10.0)));
        let attributes = attrs(&[
            ("n", "NaN".into()),
            ("m", "inf".into()),
            ("x", f64::NAN.into()),
        ]);

        assert_eq!(validate_attributes(&attributes, &rules).messages().len(), 3);
    }

    #[test]
    fn boolean_accepts_zero_and_one_text() {
        let rules = RuleSet::new().rule(Rule::new("flag", RuleKind::Boolean));

        for accepted in ["1", "0"] {
            let report = validate_attributes(&attrs(&[("flag", accepted.into())]), &rules);
            assert!(report.passes(), "{accepted}");
        }
        for rejected in ["true", "false", "2"] {
            let report = validate_attributes(&attrs(&[("flag", rejected.into())]), &rules);
            assert!(report.fails(), "{rejected}");
        }
    }
}
