//! Speech-recognition client

mod http;

pub use http::HttpRecognizer;
