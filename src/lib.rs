//! gpwal — интерпретатор WAL-записей Greenplum 6 для backup/restore фильтров.
//!
//! Для одной записи: проверка формы заголовка и CRC32C (включая backup blocks
//! с "дырой"), затем RelFileNode, который запись меняет.

// Формат
pub mod consts;
pub mod error;
pub mod page_size;
pub mod record; // src/record/{mod,encode}.rs
pub mod rmgr;   // src/rmgr/{mod,opcodes}.rs

// Ядро
pub mod extract;
pub mod validate; // src/validate/{mod,header,checksum}.rs
pub mod interpret;

// Вокруг ядра
pub mod config;
pub mod metrics;
pub mod filter;
pub mod dump;
pub mod cli;

// Удобные реэкспорты
pub use error::{FormatError, FormatErrorKind, FormatResult};
pub use extract::extract_relation;
pub use interpret::{validate, validate_header_shape, Interpreter, Verdict};
pub use page_size::PageSize;
pub use record::{BackupBlock, RawRecord, RelFileNode};
pub use rmgr::ResourceManager;
