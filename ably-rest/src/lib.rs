//! Ably REST client
//!
//! Publish messages to channels, read channel history page by page, and
//! authenticate with either an API key or a token.
//!
//! ```no_run
//! use ably_rest::{PaginateParams, RestClient};
//!
//! # async fn run() -> ably_rest::AblyResult<()> {
//! let client = RestClient::from_key("appid.keyid:secret")?;
//! let channel = client.channel("news")?;
//! channel.publish("sendMessage", "A message in a bottle").await?;
//!
//! let mut page = channel.history(PaginateParams::new().limit(10)).await?;
//! loop {
//!     for message in page.messages() {
//!         println!("{:?}: {:?}", message.name, message.data);
//!     }
//!     if page.is_last() {
//!         break;
//!     }
//!     page = page.next().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod logging;
pub mod protocol;

pub use auth::{AuthMode, TokenProvider};
pub use client::{
    ClientOptions, Direction, PaginateParams, PaginatedResult, RestChannel, RestClient,
};
pub use error::{AblyError, AblyResult};
pub use http::ContinuationParams;
pub use protocol::{Message, MessageData, PresenceMessage};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
