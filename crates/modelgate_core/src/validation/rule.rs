//! Typed validation rules.
//!
//! Rules are plain values built in code; there is no rule string syntax.

use regex::Regex;

/// Constraint kind evaluated against one attribute.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Present, not null, and not blank text.
    Required,
    /// Text with at least `n` characters.
    MinLength(usize),
    /// Text with at most `n` characters.
    MaxLength(usize),
    Email,
    Url,
    /// Integer, real, or numeric text.
    Numeric,
    /// Integer, or text that parses as one.
    Integer,
    /// `true`/`false`, integer `0`/`1`, or the text `"0"`/`"1"`.
    Boolean,
    /// Number greater than or equal to the bound.
    Min(f64),
    /// Number less than or equal to the bound.
    Max(f64),
    /// Text equal to one of the allowed values.
    In(Vec<String>),
    /// Text matching the pattern.
    Matches(Regex),
}

impl RuleKind {
    /// Returns whether the rule is evaluated when the attribute is missing or null.
    pub fn applies_to_missing(&self) -> bool {
        matches!(self, Self::Required)
    }

    fn default_message(&self, attribute: &str) -> String {
        match self {
            Self::Required => format!("The {attribute} field is required."),
            Self::MinLength(min) => {
                format!("The {attribute} field must be at least {min} characters.")
            }
            Self::MaxLength(max) => {
                format!("The {attribute} field must not be greater than {max} characters.")
            }
            Self::Email => format!("The {attribute} field must be a valid email address."),
            Self::Url => format!("The {attribute} field must be a valid URL."),
            Self::Numeric => format!("The {attribute} field must be a number."),
            Self::Integer => format!("The {attribute} field must be an integer."),
            Self::Boolean => format!("The {attribute} field must be true or false."),
            Self::Min(min) => format!("The {attribute} field must be at least {min}."),
            Self::Max(max) => format!("The {attribute} field must not be greater than {max}."),
            Self::In(_) => format!("The selected {attribute} is invalid."),
            Self::Matches(_) => format!("The {attribute} field format is invalid."),
        }
    }
}

/// One constraint on one attribute, with an optional custom message.
#[derive(Debug, Clone)]
pub struct Rule {
    attribute: String,
    kind: RuleKind,
    message: Option<String>,
}

impl Rule {
    pub fn new(attribute: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            message: None,
        }
    }

    pub fn required(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Required)
    }

    pub fn min_length(attribute: impl Into<String>, min: usize) -> Self {
        Self::new(attribute, RuleKind::MinLength(min))
    }

    pub fn max_length(attribute: impl Into<String>, max: usize) -> Self {
        Self::new(attribute, RuleKind::MaxLength(max))
    }

    pub fn email(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Email)
    }

    pub fn url(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Url)
    }

    pub fn one_of<I, S>(attribute: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            attribute,
            RuleKind::In(allowed.into_iter().map(Into::into).collect()),
        )
    }

    pub fn matches(attribute: impl Into<String>, pattern: Regex) -> Self {
        Self::new(attribute, RuleKind::Matches(pattern))
    }

    /// Replaces the default message reported on failure.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Message reported when this rule fails.
    pub fn message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.kind.default_message(&self.attribute),
        }
    }
}

/// Ordered collection of rules declared by one model type.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one rule, builder style.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
