//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run the post/tag walkthrough against a fresh or file-backed store.
//! - Keep output deterministic `key=value` lines for quick sanity checks.
//!
//! Usage: `modelgate_cli [db_path]` (in-memory when omitted).

use modelgate_core::db::{open_db, open_db_in_memory};
use modelgate_core::{
    Model, ModelService, Record, RelationKey, RepoError, Rule, RuleSet, SqliteRecordRepository,
};
use std::error::Error;
use std::process::ExitCode;

struct Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PostRelation {
    Tags,
}

impl RelationKey for PostRelation {
    fn name(self) -> &'static str {
        "tags"
    }

    fn pivot(self) -> &'static str {
        "post_tag"
    }

    fn related_model(self) -> &'static str {
        Tag::MODEL_NAME
    }
}

impl Model for Post {
    const MODEL_NAME: &'static str = "post";
    type Relation = PostRelation;

    fn validation_rules() -> RuleSet {
        RuleSet::new().rule(Rule::required("title").with_message("title required message"))
    }
}

struct Tag;

impl Model for Tag {
    const MODEL_NAME: &'static str = "tag";
    type Relation = modelgate_core::NoRelations;
}

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn Error>> {
    println!("modelgate_core version={}", modelgate_core::core_version());

    let mut conn = match db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let mut service = ModelService::new(SqliteRecordRepository::try_new(&mut conn)?);

    let mut rejected = Record::<Post>::new().with("title", "");
    match service.save(&mut rejected) {
        Err(RepoError::Validation(failed)) => println!("empty_title=rejected message={failed}"),
        Err(other) => return Err(other.into()),
        Ok(id) => println!("empty_title=saved id={id}"),
    }

    let mut post = Record::<Post>::new().with("title", "Hello");
    let post_id = service.save(&mut post)?;
    println!("post=saved id={post_id}");

    let mut tag_ids = Vec::new();
    for name in ["rust", "sqlite", "orm"] {
        let mut tag = Record::<Tag>::new().with("name", name);
        tag_ids.push(service.save(&mut tag)?);
    }

    service.attach(&mut post, PostRelation::Tags, tag_ids[0])?;
    println!("after_attach tags={}", member_count(&post));

    service.attach(&mut post, PostRelation::Tags, tag_ids[1])?;
    service.detach(&mut post, PostRelation::Tags, tag_ids[0])?;
    println!("after_detach tags={}", member_count(&post));

    let changes = service.sync(&mut post, PostRelation::Tags, tag_ids.iter().copied())?;
    println!(
        "after_sync tags={} attached={} detached={}",
        member_count(&post),
        changes.attached.len(),
        changes.detached.len()
    );

    Ok(())
}

fn member_count(post: &Record<Post>) -> usize {
    post.relation(PostRelation::Tags).map_or(0, |members| members.len())
}
