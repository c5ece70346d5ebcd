#![allow(dead_code)]

use modelgate_core::{Model, NoRelations, RelationKey, Rule, RuleSet};

pub struct Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PostRelation {
    Tags,
}

impl RelationKey for PostRelation {
    fn name(self) -> &'static str {
        match self {
            Self::Tags => "tags",
        }
    }

    fn pivot(self) -> &'static str {
        match self {
            Self::Tags => "post_tag",
        }
    }

    fn related_model(self) -> &'static str {
        match self {
            Self::Tags => Tag::MODEL_NAME,
        }
    }
}

impl Model for Post {
    const MODEL_NAME: &'static str = "post";
    type Relation = PostRelation;

    fn validation_rules() -> RuleSet {
        RuleSet::new().rule(Rule::required("title").with_message("title required message"))
    }
}

pub struct Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagRelation {
    Posts,
}

impl RelationKey for TagRelation {
    fn name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
        }
    }

    fn pivot(self) -> &'static str {
        match self {
            Self::Posts => "post_tag",
        }
    }

    fn related_model(self) -> &'static str {
        match self {
            Self::Posts => Post::MODEL_NAME,
        }
    }

    fn inverse(self) -> bool {
        true
    }
}

impl Model for Tag {
    const MODEL_NAME: &'static str = "tag";
    type Relation = TagRelation;
}

/// Model with rules on several attributes and no relations.
pub struct Account;

impl Model for Account {
    const MODEL_NAME: &'static str = "account";
    type Relation = NoRelations;

    fn validation_rules() -> RuleSet {
        RuleSet::new()
            .rule(Rule::required("email").with_message("email required"))
            .rule(Rule::email("email").with_message("email invalid"))
            .rule(Rule::min_length("name", 2).with_message("name too short"))
    }
}

/// Model with one required numeric attribute.
pub struct Score;

impl Model for Score {
    const MODEL_NAME: &'static str = "score";
    type Relation = NoRelations;

    fn validation_rules() -> RuleSet {
        RuleSet::new().rule(Rule::required("value"))
    }
}
