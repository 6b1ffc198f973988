//! Wire-format implementations of [`Client`](crate::client::Client).

pub mod openai;
