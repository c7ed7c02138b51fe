#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use actix_web::test::TestRequest;
use blog_service::db::{MemoryStore, Store};
use blog_service::identity::{Caller, IdentityError, IdentityProvider};
use blog_service::models::{Group, NewPost, Post};
use uuid::Uuid;

/// Maps opaque test tokens to callers.
#[derive(Default)]
pub struct StaticIdentityProvider {
    tokens: RwLock<HashMap<String, Caller>>,
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, token: &str) -> Result<Caller, IdentityError> {
        self.tokens
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }
}

pub struct TestUser {
    pub caller: Caller,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub identities: Arc<StaticIdentityProvider>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            identities: Arc::new(StaticIdentityProvider::default()),
        }
    }

    pub fn store_handle(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn identity_handle(&self) -> Arc<dyn IdentityProvider> {
        self.identities.clone()
    }

    pub async fn user(&self, username: &str) -> TestUser {
        let caller = Caller::from(self.store.insert_user(username).await);
        let token = format!("token-{}", username);
        self.identities
            .tokens
            .write()
            .unwrap()
            .insert(token.clone(), caller.clone());
        TestUser { caller, token }
    }

    /// A user known only to the identity provider; the store has never seen
    /// them.
    pub fn identity(&self, username: &str) -> TestUser {
        let caller = Caller {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        let token = format!("token-{}", username);
        self.identities
            .tokens
            .write()
            .unwrap()
            .insert(token.clone(), caller.clone());
        TestUser { caller, token }
    }

    pub async fn post(&self, author: &TestUser, text: &str) -> Post {
        self.store
            .insert_post(NewPost {
                author_id: author.caller.id,
                text: text.to_string(),
                image: None,
                group_id: None,
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .insert_group(&slug.to_uppercase(), slug, "test group")
            .await
    }
}

/// Build the full API against a fixture's store and identities.
macro_rules! blog_app {
    ($fixture:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::<dyn blog_service::db::Store>::from(
                    $fixture.store_handle(),
                ))
                .wrap(blog_service::middleware::IdentityMiddleware::new(
                    $fixture.identity_handle(),
                ))
                .configure(blog_service::handlers::configure),
        )
        .await
    };
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri(uri).set_json(body)
}

pub fn put_json(uri: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::put().uri(uri).set_json(body)
}

pub fn patch_json(uri: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::patch().uri(uri).set_json(body)
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri)
}
