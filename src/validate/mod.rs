//! validate — проверки одной WAL-записи до того, как ей доверять.
//!
//! - header.rs   — форма заголовка (xl_len, границы xl_tot_len, xl_rmid);
//! - checksum.rs — обход backup blocks и CRC32C по payload, блокам и префиксу заголовка.
//!
//! Обе проверки независимы от того, какое отношение меняет запись.

pub mod checksum;
pub mod header;

pub use checksum::{validate_backup_blocks, validate_checksum};
pub use header::validate_header_shape;
