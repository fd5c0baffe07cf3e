use forum_core::{EntityKind, ErrorKind, ForumService, ServiceError, ValidationError};
use uuid::Uuid;

fn service() -> ForumService {
    ForumService::open_in_memory().unwrap()
}

fn row_count(service: &ForumService, table: &str) -> i64 {
    service
        .gateway()
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_category_sets_created_and_leaves_last_edit_empty() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();

    assert_eq!(category.title, "Tech");
    assert_eq!(category.summary, "About tech");
    assert!(category.created > 0);
    assert_eq!(category.last_edit, None);
    assert_eq!(service.get_category(category.category_id).unwrap(), category);
}

#[test]
fn create_rejects_blank_fields_before_writing() {
    let mut service = service();
    let err = service.create_category("  ", "About tech").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::EmptyField("title"))
    ));

    let category = service.create_category("Tech", "About tech").unwrap();
    let err = service
        .create_post(category.category_id, "Intro", "")
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::EmptyField("body"))
    ));
    assert_eq!(row_count(&service, "posts"), 0);
}

#[test]
fn create_post_for_missing_category_is_not_found_and_writes_nothing() {
    let mut service = service();
    let ghost = Uuid::new_v4();

    let err = service.create_post(ghost, "Intro", "Body").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { kind: EntityKind::Category, id } if id == ghost
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(row_count(&service, "posts"), 0);
}

#[test]
fn create_comment_for_missing_post_is_not_found() {
    let mut service = service();
    let ghost = Uuid::new_v4();

    let err = service
        .create_comment(ghost, "Nice", "Thanks!", None)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { kind: EntityKind::Post, id } if id == ghost
    ));
    assert_eq!(row_count(&service, "comments"), 0);
}

#[test]
fn nested_comment_records_its_parent() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();
    let post = service
        .create_post(category.category_id, "Intro", "Body")
        .unwrap();
    let parent = service
        .create_comment(post.post_id, "Nice", "Thanks!", None)
        .unwrap();
    let reply = service
        .create_comment(post.post_id, "Reply", "Re:", Some(parent.comment_id))
        .unwrap();

    assert!(parent.is_top_level());
    assert_eq!(reply.parent_comment_id, Some(parent.comment_id));
    assert_eq!(reply.post_id, post.post_id);
    assert_eq!(service.get_comment(reply.comment_id).unwrap(), reply);
}

#[test]
fn update_applies_only_changed_fields_and_stamps_last_edit() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();

    let updated = service
        .update_category(category.category_id, Some("Tech"), Some("All about tech"))
        .unwrap();
    assert_eq!(updated.title, "Tech");
    assert_eq!(updated.summary, "All about tech");
    assert_eq!(updated.created, category.created);
    let first_edit = updated.last_edit.unwrap();
    assert!(first_edit >= category.created);

    let again = service
        .update_category(category.category_id, Some("Technology"), None)
        .unwrap();
    assert!(again.last_edit.unwrap() >= first_edit);
}

#[test]
fn update_with_unchanged_or_blank_fields_is_rejected_without_stamping() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();
    let post = service
        .create_post(category.category_id, "Intro", "Body")
        .unwrap();

    for (title, body) in [(None, None), (Some("Intro"), Some("Body")), (Some(" "), None)] {
        let err = service.update_post(post.post_id, title, body).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NothingToChange)
        ));
    }
    assert_eq!(service.get_post(post.post_id).unwrap().last_edit, None);
}

#[test]
fn update_comment_keeps_parent_link() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();
    let post = service
        .create_post(category.category_id, "Intro", "Body")
        .unwrap();
    let parent = service
        .create_comment(post.post_id, "Nice", "Thanks!", None)
        .unwrap();
    let reply = service
        .create_comment(post.post_id, "Reply", "Re:", Some(parent.comment_id))
        .unwrap();

    let updated = service
        .update_comment(reply.comment_id, None, Some("Re: edited"))
        .unwrap();
    assert_eq!(updated.body, "Re: edited");
    assert_eq!(updated.title, "Reply");
    assert_eq!(updated.parent_comment_id, Some(parent.comment_id));
    assert!(updated.last_edit.is_some());
}

#[test]
fn lookups_and_updates_of_missing_ids_are_not_found() {
    let mut service = service();
    let ghost = Uuid::new_v4();

    assert_eq!(service.get_category(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(service.get_post(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(service.get_comment(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    assert!(matches!(
        service.update_comment(ghost, Some("t"), None).unwrap_err(),
        ServiceError::NotFound { kind: EntityKind::Comment, .. }
    ));
}
