//! Walks through the todo-list calls against a local API server.
//!
//! This example shows how to:
//! - Build a client with a custom navigator
//! - Create, read, update and delete a todo list
//! - Upload a file alongside regular fields
//! - Inspect rejected payloads
//!
//! Run with: `cargo run --example todo_list` (expects the API on localhost:5000)

use std::sync::Arc;
use todolist_client::{todo_list, Client, Error, Fields, FilePart};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("todolist_client=debug,todo_list=info")
        .init();

    let client = Client::builder()
        .navigator(Arc::new(|| println!("Session expired, please sign in again")))
        .build()?;

    println!("=== Create ===");
    let created = todo_list::add_todo_list(
        &client,
        Fields::new()
            .with("title", "groceries")
            .with("attachment", FilePart::new("list.txt", b"milk\neggs".to_vec())),
    )
    .await?;
    println!("Created: {}", created.data);
    println!("Request latency: {:?}", created.latency);

    let id = created.data["id"].as_i64().unwrap_or_default();

    println!("=== Read ===");
    let fetched = todo_list::get_todo_list(&client, id).await?;
    println!("Fetched: {}", fetched.data);

    println!("=== Update ===");
    let edited = todo_list::edit_todo_list(&client, id, Fields::new().with("title", "errands")).await?;
    println!("Edited: {}", edited.data);

    println!("=== List ===");
    let all = todo_list::get_todo_lists(&client).await?;
    println!("All: {}", all.data);

    println!("=== Delete ===");
    match todo_list::delete_todo_list(&client, id).await {
        Ok(response) => println!("Deleted (status {})", response.status),
        Err(Error::Rejected(failure)) => {
            println!("Rejected with error_code {:?}", failure.error_code());
            println!("Message: {:?}", failure.message());
            println!("Payload: {}", failure.payload);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
