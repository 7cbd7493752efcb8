#![forbid(unsafe_code)]

pub mod contract;
pub mod fake;
pub mod http;

pub use contract::{
    AnswerGateway, GatewayError, Gateways, LessonGateway, QueryGateway, SchemaGateway,
};
pub use fake::InMemoryGateway;
pub use http::HttpGateway;
