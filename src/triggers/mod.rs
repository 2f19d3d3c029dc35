//! Event intake: the HTTP webhook and the optional Redis subscriber.

mod http;
mod redis;

pub use self::http::receive_event;
pub use self::redis::RedisSubscriber;
