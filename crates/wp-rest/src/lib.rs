//! # wp-api-rest
//!
//! WordPress REST API client facade and tool dispatch.
//!
//! ## Features
//!
//! - **Generic requests** - GET with query parameters, JSON POST/PUT/PATCH, DELETE
//! - **Site helpers** - current user, API root document, media upload
//! - **OAuth hooks** - code exchange and token refresh installed into the session
//! - **Tool dispatch** - named tools with lazy authentication and structured errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use wp_api_rest::{ToolRegistry, WordPressClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wp_api_client::Error> {
//!     let client = WordPressClient::from_env()?;
//!
//!     let posts = client.get("posts", &[("per_page", "5")]).await?;
//!     println!("{posts}");
//!
//!     let tools = ToolRegistry::with_builtin_tools();
//!     let result = tools
//!         .call(&client, "wp_get_current_user", serde_json::json!({}))
//!         .await;
//!     println!("{}", result.text());
//!     Ok(())
//! }
//! ```

mod client;
mod tools;

pub use client::WordPressClient;
pub use tools::{Tool, ToolContent, ToolHandler, ToolRegistry, ToolResult};
