//! Demonstrates a `Logging -> ErrorHandling -> Transport` chain.
//!
//! This example shows how to:
//! - Assemble the decorator chain around a transport client
//! - Build requests with the fluent request builder
//! - Read typed payloads, raw bodies and captured errors from envelopes
//!
//! Run with: `cargo run --example logged_call`

use http::Method;
use httpwrap::{Error, HttpClient, HttpClientExt, JsonSerializer, RequestBuilder, TransportClient};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing so the logging decorator's records are printed
    tracing_subscriber::fmt()
        .with_env_filter("httpwrap=debug,logged_call=info")
        .init();

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let client = TransportClient::builder()
        .http_client(http_client)
        .serializer(JsonSerializer)
        .build()?
        .with_error_handling()
        .with_logging();

    let mut builder = RequestBuilder::new(JsonSerializer);

    println!("=== Typed GET ===");
    let request = builder
        .create_relative_request("https://jsonplaceholder.typicode.com/", "posts/1", Method::GET)?
        .build()?;
    let envelope = client
        .send_typed::<Post>(request)
        .await
        .map_err(|e| e.into_error())?;

    match &envelope.response {
        Some(post) => println!("Post {}: {}", post.id, post.title),
        None => println!("No payload (status {})", envelope.status_code),
    }
    println!();

    println!("=== Typed POST ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let request = builder
        .create_relative_request("https://jsonplaceholder.typicode.com/", "posts", Method::POST)?
        .with_content(&new_post, "application/json", encoding_rs::UTF_8)?
        .with_headers([("x-request-source", "logged_call")])?
        .build()?;
    let envelope = client
        .send_typed::<Post>(request)
        .await
        .map_err(|e| e.into_error())?;

    println!("Status code: {}", envelope.status_code);
    println!("Raw body length: {} bytes", envelope.original_body.len());
    println!("Content-Type: {:?}", envelope.header("content-type"));
    println!();

    println!("=== Captured failure ===");
    let request = builder
        .create_request("http://127.0.0.1:1/unreachable", Method::GET)?
        .build()?;
    let envelope = client.send(request).await.map_err(|e| e.into_error())?;

    if let Some(error) = &envelope.error {
        println!("Captured: {} (status {})", error, envelope.status_code);
    }

    Ok(())
}
