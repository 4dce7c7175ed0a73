#![forbid(unsafe_code)]

pub mod gateway;
pub mod http;

pub use gateway::{
    BookmarkRecord, CertificateStore, GatewayError, InMemoryGateway, LessonProgressRecord,
    LessonProgressUpdate, NoteRecord, ProgressGateway, SaveAck,
};
pub use http::{HttpGateway, HttpGatewayConfig};
