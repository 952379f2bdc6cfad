//! 语音目录模块：从 Catalog Service 加载可用语言及其语音。
//!
//! Voice catalog: languages offered by the service and the voices under each.
//! The catalog is fetched once per session and replaced wholesale on reload.

mod client;
mod types;

pub use client::CatalogClient;
pub use types::{parse_catalog, LanguageEntry, LanguagesResponse, VoiceCatalog, MALFORMED_CATALOG};
