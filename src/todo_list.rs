//! Calls for the `v1/todoList` resource.
//!
//! Each function is one request through the [`Client`] it is given; results
//! and errors are returned exactly as the client produced them.
//!
//! ```no_run
//! use todolist_client::{todo_list, Client, Fields};
//!
//! # async fn example() -> Result<(), todolist_client::Error> {
//! let client = Client::new()?;
//!
//! let created = todo_list::add_todo_list(&client, Fields::new().with("title", "groceries")).await?;
//! let id = created.data["id"].as_i64().unwrap_or_default();
//!
//! todo_list::edit_todo_list(&client, id, Fields::new().with("title", "errands")).await?;
//! let all = todo_list::get_todo_lists(&client).await?;
//! println!("{}", all.data);
//!
//! todo_list::delete_todo_list(&client, id).await?;
//! # Ok(())
//! # }
//! ```

use crate::{Client, Fields, Response, Result};
use serde_json::Value;
use std::fmt::Display;

/// The collection path.
pub const RESOURCE_PATH: &str = "v1/todoList";

fn item_path(id: impl Display) -> String {
    format!("{}/{}", RESOURCE_PATH, id)
}

/// Creates a todo list. `POST v1/todoList`
pub async fn add_todo_list(client: &Client, info: Fields) -> Result<Response<Value>> {
    client.post(RESOURCE_PATH, info, Fields::new()).await
}

/// Fetches one todo list. `GET v1/todoList/{id}`
pub async fn get_todo_list(client: &Client, id: impl Display) -> Result<Response<Value>> {
    client.get(item_path(id), Fields::new()).await
}

/// Replaces a todo list. `PUT v1/todoList/{id}`
pub async fn edit_todo_list(
    client: &Client,
    id: impl Display,
    info: Fields,
) -> Result<Response<Value>> {
    client.put(item_path(id), info, Fields::new()).await
}

/// Deletes a todo list. `DELETE v1/todoList/{id}`
pub async fn delete_todo_list(client: &Client, id: impl Display) -> Result<Response<Value>> {
    client.delete(item_path(id), Fields::new()).await
}

/// Fetches every todo list. `GET v1/todoList`
pub async fn get_todo_lists(client: &Client) -> Result<Response<Value>> {
    client.get(RESOURCE_PATH, Fields::new()).await
}
