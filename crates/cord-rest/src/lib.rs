//! # cord-rest
//!
//! HTTP side of the client: everything that is sent to Discord on purpose
//! rather than received over the gateway.
//!
//! ## Features
//!
//! - **Endpoints**: path templates with a major parameter for bucketing
//! - **Rate limits**: per-bucket serialization, global limits, 429 retries
//! - **Errors**: Discord JSON error codes mapped before HTTP status codes
//! - **Builders**: validated request bodies for roles, channels, messages and more
//!
//! ## Example
//!
//! ```ignore
//! use cord_rest::{RestClient, builders::MessageBuilder};
//!
//! let client = RestClient::new(token, "https://discord.com/api", 10)?;
//! let response = MessageBuilder::new()
//!     .content("hello")
//!     .to_request(channel_id)?
//!     .execute(&client)
//!     .await?;
//! ```

pub mod builders;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod ratelimit;
pub mod request;

pub use client::RestClient;
pub use endpoint::RestEndpoint;
pub use error::{RestError, RestErrorCode, RestResult};
pub use ratelimit::{BucketKey, RatelimitBucket, RatelimitHeaders, RatelimitManager};
pub use request::{RestRequest, RestResponse};
