//! # todolist-client - A pre-configured HTTP client for the todo-list API
//!
//! This crate wraps `reqwest` in a client that normalizes every outgoing
//! request, unwraps the API's response envelope, and forces re-authentication
//! when the server reports an invalid session. A thin set of functions in
//! [`todo_list`] covers the `v1/todoList` resource.
//!
//! ## Quick Start
//!
//! ```no_run
//! use todolist_client::{todo_list, Client, Fields};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), todolist_client::Error> {
//!     // http://localhost:5000/, 5 second timeout
//!     let client = Client::new()?;
//!
//!     let created = todo_list::add_todo_list(
//!         &client,
//!         Fields::new().with("title", "groceries"),
//!     )
//!     .await?;
//!     println!("Created: {}", created.data);
//!
//!     let lists = todo_list::get_todo_lists(&client).await?;
//!     println!("All lists: {}", lists.data);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## The pipeline
//!
//! Every call goes through the same steps:
//!
//! 1. [`NormalizeRequest`] requires a URL, defaults and lower-cases the
//!    method, reconciles `params` and `data`, stringifies nested objects in
//!    POST bodies and switches to `multipart/form-data` when a field holds a
//!    file.
//! 2. The request is sent. Statuses outside `[200, 500)` fail with
//!    [`Error::HttpError`]; connection failures and timeouts fail with
//!    [`Error::Network`] and [`Error::Timeout`].
//! 3. [`UnwrapEnvelope`] resolves 2xx responses with the payload as-is and
//!    rejects everything else with [`Error::Rejected`], carrying the raw
//!    payload. Error codes `10000` and `10100` additionally trigger the
//!    configured [`Navigator`] after 1.5 seconds.
//!
//! No call is ever retried.
//!
//! ## Uploading files
//!
//! ```no_run
//! use todolist_client::{Client, Fields, FilePart};
//!
//! # async fn example() -> Result<(), todolist_client::Error> {
//! let client = Client::new()?;
//!
//! let body = Fields::new()
//!     .with("title", "with attachment")
//!     .with("attachment", FilePart::new("notes.txt", b"buy milk".to_vec()));
//!
//! // Sent as multipart/form-data because `attachment` is a file.
//! client.post("v1/todoList", body, Fields::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use todolist_client::{todo_list, Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new()?;
//! match todo_list::get_todo_list(&client, 42).await {
//!     Ok(response) => println!("List: {}", response.data),
//!     Err(Error::Rejected(failure)) => {
//!         eprintln!("error_code: {:?}", failure.error_code());
//!         eprintln!("message: {:?}", failure.message());
//!         eprintln!("payload: {}", failure.payload);
//!     }
//!     Err(e) => eprintln!("Transport error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod envelope;
mod error;
mod form;
pub mod interceptor;
mod request;
mod response;
pub mod todo_list;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use envelope::ApiFailure;
pub use error::{Error, Result};
pub use form::{Blob, FieldValue, Fields, FileLike, FilePart, FormPart, MultipartForm};
pub use interceptor::{
    Navigator, NormalizeRequest, RequestInterceptor, ResponseInterceptor, TracingNavigator,
    UnwrapEnvelope,
};
pub use request::{RequestBody, RequestConfig};
pub use response::Response;
