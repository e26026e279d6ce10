mod kind_sse;

pub use kind_sse::{SseQuery, kind_sse};
