//! Backend clients and the publish pipeline.
//!
//! Three collaborators are wrapped here: the Gemini generation API, the
//! Lark auth endpoint, and Lark Drive (upload + temporary link). The
//! [`pipeline::Publisher`] sequences them; every entry shell goes through
//! it. Clients take explicit base URLs so tests can point them at a mock
//! server.

pub mod gemini;
pub mod lark;
pub mod pipeline;
pub mod source;

pub use gemini::GeminiClient;
pub use lark::LarkClient;
pub use pipeline::Publisher;
