pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod text;

pub use config::{Config, Mode};
pub use document::{ElementTextSource, FragmentId, HtmlDocument, highlight_source};
pub use engine::Engine;
pub use error::{Error, Result};
pub use text::{LiteralRule, escape_pattern, replace_all_literal};
