#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{delete, get, patch_json, post_json, put_json, Fixture};

#[actix_rt::test]
async fn comment_on_missing_post_is_not_found() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let app = blog_app!(fx);

    let req = post_json("/api/v1/posts/999/comments/", json!({"text": "hello?"}))
        .insert_header(alice.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(fx.store.comment_count().await, 0);

    let resp = test::call_service(&app, get("/api/v1/posts/999/comments/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn anonymous_comment_is_unauthorized() {
    let fx = Fixture::new();
    let app = blog_app!(fx);

    let req = post_json("/api/v1/posts/999/comments/", json!({"text": "hi"})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn comment_is_bound_to_path_post_and_caller() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let app = blog_app!(fx);

    let first = fx.post(&alice, "first").await.id;
    let second = fx.post(&alice, "second").await.id;

    let req = post_json(
        &format!("/api/v1/posts/{first}/comments/"),
        json!({"text": "nice", "post": second, "author": "alice"}),
    )
    .insert_header(bob.bearer())
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["post"], first);
    assert_eq!(body["author"], "bob");
    assert_eq!(body["text"], "nice");
    assert!(body["created"].is_string());

    let uri = format!("/api/v1/posts/{second}/comments/");
    let listed: Value = test::read_body_json(test::call_service(&app, get(&uri).to_request()).await).await;
    assert!(listed.as_array().unwrap().is_empty());

    let uri = format!("/api/v1/posts/{second}/comments/{}/", body["id"]);
    let resp = test::call_service(&app, get(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn only_comment_author_may_change_it() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let app = blog_app!(fx);

    let post_id = fx.post(&alice, "post").await.id;
    let req = post_json(&format!("/api/v1/posts/{post_id}/comments/"), json!({"text": "bob says"}))
        .insert_header(bob.bearer())
        .to_request();
    let comment: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let uri = format!("/api/v1/posts/{post_id}/comments/{}/", comment["id"]);

    // the post author has no say over other people's comments
    let req = patch_json(&uri, json!({"text": "censored"}))
        .insert_header(alice.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = delete(&uri).insert_header(alice.bearer()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = put_json(&uri, json!({"text": "bob edits"}))
        .insert_header(bob.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["text"], "bob edits");

    let req = delete(&uri).insert_header(bob.bearer()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(fx.store.comment_count().await, 0);
}

#[actix_rt::test]
async fn blank_comment_is_rejected() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let app = blog_app!(fx);

    let post_id = fx.post(&alice, "post").await.id;
    let req = post_json(&format!("/api/v1/posts/{post_id}/comments/"), json!({"text": "  "}))
        .insert_header(alice.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fx.store.comment_count().await, 0);
}

#[actix_rt::test]
async fn deleting_post_removes_its_comments() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let app = blog_app!(fx);

    let post_id = fx.post(&alice, "post").await.id;
    let req = post_json(&format!("/api/v1/posts/{post_id}/comments/"), json!({"text": "hi"}))
        .insert_header(alice.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = delete(&format!("/api/v1/posts/{post_id}/"))
        .insert_header(alice.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(fx.store.comment_count().await, 0);

    let uri = format!("/api/v1/posts/{post_id}/comments/");
    let resp = test::call_service(&app, get(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
