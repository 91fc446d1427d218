pub mod accumulator;
pub mod auth;
pub mod client;
pub mod protocol;

pub use accumulator::ResponseAccumulator;
pub use auth::{rfc1123_now, sign_url};
pub use client::SparkClient;
