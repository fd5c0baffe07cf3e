use forum_core::{DeleteReport, EntityKind, ErrorKind, ForumService, ServiceError};
use uuid::Uuid;

fn service() -> ForumService {
    ForumService::open_in_memory().unwrap()
}

fn total_rows(service: &ForumService) -> i64 {
    service
        .gateway()
        .connection()
        .query_row(
            "SELECT (SELECT COUNT(*) FROM categories)
                  + (SELECT COUNT(*) FROM posts)
                  + (SELECT COUNT(*) FROM comments);",
            [],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn deleting_category_removes_exactly_its_posts_and_comments() {
    let mut service = service();
    let doomed = service.create_category("Tech", "About tech").unwrap();
    let kept = service.create_category("Food", "About food").unwrap();
    let kept_post = service.create_post(kept.category_id, "Soup", "Hot").unwrap();

    let mut post_ids = Vec::new();
    let mut comment_ids = Vec::new();
    for index in 0..3 {
        let post = service
            .create_post(doomed.category_id, &format!("Post {index}"), "Body")
            .unwrap();
        let top = service
            .create_comment(post.post_id, "Top", "Body", None)
            .unwrap();
        let reply = service
            .create_comment(post.post_id, "Reply", "Body", Some(top.comment_id))
            .unwrap();
        post_ids.push(post.post_id);
        comment_ids.extend([top.comment_id, reply.comment_id]);
    }
    service
        .create_comment(kept_post.post_id, "Yum", "Body", None)
        .unwrap();

    let before = total_rows(&service);
    let report = service.delete_category(doomed.category_id).unwrap();

    assert_eq!(
        report,
        DeleteReport {
            categories: 1,
            posts: 3,
            comments: 6,
        }
    );
    assert_eq!(before - total_rows(&service), report.total() as i64);

    assert_eq!(
        service.get_category(doomed.category_id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    for post_id in post_ids {
        assert_eq!(service.get_post(post_id).unwrap_err().kind(), ErrorKind::NotFound);
    }
    for comment_id in comment_ids {
        assert_eq!(
            service.get_comment(comment_id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
    assert!(service.get_post(kept_post.post_id).is_ok());
}

#[test]
fn deleting_comment_removes_every_descendant_at_every_depth() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();
    let post = service
        .create_post(category.category_id, "Intro", "Body")
        .unwrap();
    let sibling = service
        .create_comment(post.post_id, "Sibling", "Body", None)
        .unwrap();
    let root = service
        .create_comment(post.post_id, "Root", "Body", None)
        .unwrap();

    let mut chain = vec![root.comment_id];
    for depth in 1..=5 {
        let parent = *chain.last().unwrap();
        let child = service
            .create_comment(post.post_id, &format!("Depth {depth}"), "Body", Some(parent))
            .unwrap();
        chain.push(child.comment_id);
    }
    let branch = service
        .create_comment(post.post_id, "Branch", "Body", Some(chain[2]))
        .unwrap();

    let report = service.delete_comment(root.comment_id).unwrap();
    assert_eq!(report.comments, chain.len() + 1);
    assert_eq!((report.categories, report.posts), (0, 0));

    for comment_id in chain.into_iter().chain([branch.comment_id]) {
        assert!(matches!(
            service.get_comment(comment_id).unwrap_err(),
            ServiceError::NotFound { kind: EntityKind::Comment, .. }
        ));
    }
    assert!(service.get_comment(sibling.comment_id).is_ok());
    assert!(service.get_post(post.post_id).is_ok());
}

#[test]
fn deleting_post_twice_succeeds_then_reports_not_found() {
    let mut service = service();
    let category = service.create_category("Tech", "About tech").unwrap();
    let post = service
        .create_post(category.category_id, "Intro", "Body")
        .unwrap();
    let top = service
        .create_comment(post.post_id, "Nice", "Thanks!", None)
        .unwrap();
    service
        .create_comment(post.post_id, "Reply", "Re:", Some(top.comment_id))
        .unwrap();

    let report = service.delete_post(post.post_id).unwrap();
    assert_eq!(report.posts, 1);
    assert_eq!(report.comments, 2);

    let err = service.delete_post(post.post_id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { kind: EntityKind::Post, id } if id == post.post_id
    ));
    assert!(service.get_category(category.category_id).is_ok());
}

#[test]
fn deleting_missing_entities_is_not_found() {
    let mut service = service();
    let ghost = Uuid::new_v4();

    assert_eq!(service.delete_category(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(service.delete_post(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(service.delete_comment(ghost).unwrap_err().kind(), ErrorKind::NotFound);
}
