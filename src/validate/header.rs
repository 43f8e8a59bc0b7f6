//! validate/header — проверка формы заголовка XLogRecord.

use crate::consts::{BKP_BLOCK_SIZE, XLOG_RECORD_SIZE, XLR_MAX_BKP_BLOCKS};
use crate::error::{FormatError, FormatErrorKind, FormatResult};
use crate::page_size::PageSize;
use crate::record::RawRecord;
use crate::rmgr::{Opcode, ResourceManager, XlogOp, RM_MAX_ID};

/// Проверить согласованность полей заголовка.
///
/// - xl_len == 0 недопустим везде, кроме XLOG SWITCH, где он обязателен;
/// - header + xl_len <= xl_tot_len <= header + xl_len + 4 * (BkpBlock + page size);
/// - xl_rmid <= RM_MAX_ID.
pub fn validate_header_shape(rec: &RawRecord<'_>, page_size: PageSize) -> FormatResult<()> {
    let len = rec.len();

    // Сравнивается весь xl_info: SWITCH не несёт флагов backup blocks.
    if rec.rmid() == ResourceManager::Xlog.id() && rec.info() == XlogOp::Switch.code() {
        if len != 0 {
            return Err(FormatError::new(
                FormatErrorKind::InvalidSwitchRecord,
                "invalid xlog switch record",
            ));
        }
    } else if len == 0 {
        return Err(FormatError::new(
            FormatErrorKind::ZeroLength,
            "record with zero length",
        ));
    }

    let tot_len = rec.tot_len() as u64;
    let min = XLOG_RECORD_SIZE as u64 + len as u64;
    let max = min + XLR_MAX_BKP_BLOCKS as u64 * (BKP_BLOCK_SIZE as u64 + page_size.bytes() as u64);
    if tot_len < min || tot_len > max {
        return Err(FormatError::new(
            FormatErrorKind::InvalidRecordLength,
            format!(
                "invalid record length: xl_tot_len {} outside [{} .. {}]",
                tot_len, min, max
            ),
        ));
    }

    if rec.rmid() > RM_MAX_ID {
        return Err(FormatError::new(
            FormatErrorKind::UnknownResourceManager,
            format!("invalid resource manager ID {}", rec.rmid()),
        ));
    }

    Ok(())
}
