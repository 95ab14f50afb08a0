// Adapters layer: concrete implementations for external systems (http, storage).

pub mod http;
pub mod retry;
pub mod storage;
