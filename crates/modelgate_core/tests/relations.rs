mod common;

use common::{Post, PostRelation, Tag, TagRelation};
use modelgate_core::db::open_db_in_memory;
use modelgate_core::{ModelService, Record, RecordId, RepoError, SqliteRecordRepository};
use std::collections::BTreeSet;

fn saved_tag<R>(service: &ModelService<R>, name: &str) -> Record<Tag>
where
    R: modelgate_core::RecordRepository + modelgate_core::RelationRepository,
{
    let mut tag = Record::<Tag>::new().with("name", name);
    service.save(&mut tag).unwrap();
    tag
}

fn saved_post<R>(service: &ModelService<R>, title: &str) -> Record<Post>
where
    R: modelgate_core::RecordRepository + modelgate_core::RelationRepository,
{
    let mut post = Record::<Post>::new().with("title", title);
    service.save(&mut post).unwrap();
    post
}

fn ids(values: &[RecordId]) -> BTreeSet<RecordId> {
    values.iter().copied().collect()
}

#[test]
fn attach_makes_member_visible_immediately() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let rust = saved_tag(&service, "rust");

    assert!(service.related(&mut post, PostRelation::Tags).unwrap().is_empty());

    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();
    assert!(post.relation(PostRelation::Tags).unwrap().contains(&rust.id()));
}

#[test]
fn attach_twice_keeps_a_single_link() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let rust = saved_tag(&service, "rust");

    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();
    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();

    assert_eq!(post.relation(PostRelation::Tags), Some(&ids(&[rust.id()])));
}

#[test]
fn detach_removes_member_immediately() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let rust = saved_tag(&service, "rust");
    let sql = saved_tag(&service, "sql");

    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();
    service.attach(&mut post, PostRelation::Tags, sql.id()).unwrap();
    service.detach(&mut post, PostRelation::Tags, rust.id()).unwrap();

    let members = post.relation(PostRelation::Tags).unwrap();
    assert!(!members.contains(&rust.id()));
    assert!(members.contains(&sql.id()));

    // Detaching a missing link is a no-op.
    service.detach(&mut post, PostRelation::Tags, rust.id()).unwrap();
    assert_eq!(post.relation(PostRelation::Tags), Some(&ids(&[sql.id()])));
}

#[test]
fn sync_leaves_exactly_the_given_members() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let a = saved_tag(&service, "a");
    let b = saved_tag(&service, "b");
    let c = saved_tag(&service, "c");

    service.attach(&mut post, PostRelation::Tags, a.id()).unwrap();
    service.attach(&mut post, PostRelation::Tags, c.id()).unwrap();

    let changes = service
        .sync(&mut post, PostRelation::Tags, [a.id(), b.id(), b.id()])
        .unwrap();
    assert_eq!(changes.attached, vec![b.id()]);
    assert_eq!(changes.detached, vec![c.id()]);

    let expected = ids(&[a.id(), b.id()]);
    assert_eq!(post.relation(PostRelation::Tags), Some(&expected));

    // The cache set by sync matches what storage now holds.
    service.reload_relation(&mut post, PostRelation::Tags).unwrap();
    assert_eq!(post.relation(PostRelation::Tags), Some(&expected));

    let unchanged = service
        .sync(&mut post, PostRelation::Tags, [b.id(), a.id()])
        .unwrap();
    assert!(unchanged.is_empty());

    let cleared = service
        .sync(&mut post, PostRelation::Tags, Vec::<RecordId>::new())
        .unwrap();
    assert_eq!(cleared.detached.len(), 2);
    assert_eq!(post.relation(PostRelation::Tags), Some(&BTreeSet::new()));
}

#[test]
fn sync_with_unknown_member_changes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let a = saved_tag(&service, "a");
    service.attach(&mut post, PostRelation::Tags, a.id()).unwrap();

    let ghost = RecordId::new_v4();
    let err = service
        .sync(&mut post, PostRelation::Tags, [ghost])
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));

    service.reload_relation(&mut post, PostRelation::Tags).unwrap();
    assert_eq!(post.relation(PostRelation::Tags), Some(&ids(&[a.id()])));
}

#[test]
fn relation_helpers_require_a_saved_owner() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let rust = saved_tag(&service, "rust");

    let mut draft = Record::<Post>::new().with("title", "unsaved");
    let err = service
        .attach(&mut draft, PostRelation::Tags, rust.id())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted { model: "post", .. }));
}

#[test]
fn attach_rejects_records_of_the_wrong_model() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let other_post = saved_post(&service, "Not a tag");

    let err = service
        .attach(&mut post, PostRelation::Tags, other_post.id())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == other_post.id()));
}

#[test]
fn inverse_relation_reads_the_same_links() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut first = saved_post(&service, "first");
    let second = saved_post(&service, "second");
    let mut rust = saved_tag(&service, "rust");

    service.attach(&mut first, PostRelation::Tags, rust.id()).unwrap();
    service.attach(&mut rust, TagRelation::Posts, second.id()).unwrap();

    let posts = service.related(&mut rust, TagRelation::Posts).unwrap();
    assert_eq!(posts, &ids(&[first.id(), second.id()]));

    service.reload_relation(&mut first, PostRelation::Tags).unwrap();
    assert_eq!(first.relation(PostRelation::Tags), Some(&ids(&[rust.id()])));
}

#[test]
fn deleting_a_related_record_drops_its_links() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let rust = saved_tag(&service, "rust");
    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();

    service.delete(rust).unwrap();

    // The stale cache still shows the link until an explicit reload.
    assert_eq!(post.relation(PostRelation::Tags).map(BTreeSet::len), Some(1));
    service.reload_relation(&mut post, PostRelation::Tags).unwrap();
    assert!(post.relation(PostRelation::Tags).unwrap().is_empty());
}

#[test]
fn refresh_forgets_cached_relations() {
    let mut conn = open_db_in_memory().unwrap();
    let service = ModelService::new(SqliteRecordRepository::try_new(&mut conn).unwrap());
    let mut post = saved_post(&service, "Hello");
    let rust = saved_tag(&service, "rust");
    service.attach(&mut post, PostRelation::Tags, rust.id()).unwrap();

    service.refresh(&mut post).unwrap();
    assert!(!post.relation_loaded(PostRelation::Tags));
    assert_eq!(
        service.related(&mut post, PostRelation::Tags).unwrap(),
        &ids(&[rust.id()])
    );
}
