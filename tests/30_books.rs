mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn books_reference_authors() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.user("writer@example.com").await?;

    let author = server
        .client
        .post(server.url("/authors"))
        .bearer_auth(&token)
        .json(&json!({ "author": { "name": { "firstName": "Frank", "lastName": "Herbert" }, "dob": "1920-10-08" } }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let author_id = author["author"]["id"].as_str().unwrap();

    let res = server
        .client
        .post(server.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "book": { "title": "Dune", "author": author_id } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let book = res.json::<Value>().await?["book"].clone();
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["author"], author_id);

    let listed = server
        .client
        .get(server.url("/books"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(listed["books"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn books_need_a_title_and_a_valid_author_id() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.user("writer@example.com").await?;

    let res = server
        .client
        .post(server.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "book": { "author": "not-an-id" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = res.json::<Value>().await?;
    assert_eq!(body["field_errors"]["title"], "is required");
    assert_eq!(body["field_errors"]["author"], "must be a valid authors id");
    Ok(())
}

#[tokio::test]
async fn patching_a_book_returns_no_content() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.user("writer@example.com").await?;
    let author_id = uuid_like();

    let created = server
        .client
        .post(server.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "book": { "title": "Dune", "author": author_id } }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = created["book"]["id"].as_str().unwrap();

    let res = server
        .client
        .patch(server.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "book": { "title": "Dune Messiah" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let fetched = server
        .client
        .get(server.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(fetched["book"]["title"], "Dune Messiah");
    Ok(())
}

#[tokio::test]
async fn malformed_and_unknown_ids_are_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.user("writer@example.com").await?;

    for id in ["not-a-uuid".to_string(), uuid_like()] {
        let res = server
            .client
            .get(server.url(&format!("/books/{id}")))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = server
            .client
            .delete(server.url(&format!("/books/{id}")))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
    Ok(())
}

fn uuid_like() -> String {
    "5f0c2a3e-9d1b-4c8a-8e6f-2b7d4a1c9e30".to_string()
}
