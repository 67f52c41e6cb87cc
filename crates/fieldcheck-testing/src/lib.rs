//! Testing utilities for fieldcheck
//!
//! # Mock lookup server
//!
//! `MockServer` stands in for a remote uniqueness endpoint. Responses are
//! scripted per query value and can be delayed, which makes lookup races
//! reproducible:
//!
//! ```rust,ignore
//! let server = MockServer::start().await;
//! server
//!     .expect(RequestMatcher::lookup("/users").query_param("q", "alice"))
//!     .respond_with(MockResponse::matches(&["alice"]).delay(Duration::from_millis(200)));
//! ```

pub mod expectation;
pub mod matcher;
pub mod server;

pub use expectation::{Expectation, MockResponse, Times};
pub use matcher::RequestMatcher;
pub use server::{ExpectationBuilder, MockServer, RecordedRequest};
