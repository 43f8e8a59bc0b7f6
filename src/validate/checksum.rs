//! validate/checksum — пересчёт CRC32C записи.
//!
//! Порядок байтов совпадает с тем, в котором CRC считался при записи:
//! 1) payload (xl_len байт);
//! 2) backup blocks по возрастанию бита XLR_BKP_BLOCK(i), каждый — заголовок
//!    BkpBlock + page_size - hole_length байт образа;
//! 3) заголовок записи до поля xl_crc.
//! Менять порядок нельзя.
//!
//! Обход блоков (геометрия дыры, размер блока, остаток xl_tot_len) выполняется
//! всегда; сравнение CRC можно отключить (`validate_backup_blocks`).

use crate::error::{FormatError, FormatErrorKind, FormatResult};
use crate::page_size::PageSize;
use crate::record::RawRecord;

/// Проверить CRC записи. Возвращает число учтённых backup blocks.
pub fn validate_checksum(rec: &RawRecord<'_>, page_size: PageSize) -> FormatResult<usize> {
    let (count, crc) = walk(rec, page_size, true)?;
    let crc = crc32c::crc32c_append(crc, rec.header_prefix());

    let stored = rec.crc();
    if crc != stored {
        return Err(FormatError::new(
            FormatErrorKind::ChecksumMismatch,
            format!(
                "incorrect resource manager data checksum in record. expect: {}, but got: {}",
                stored, crc
            ),
        ));
    }
    Ok(count)
}

/// Те же структурные проверки, что и в `validate_checksum`, без сравнения CRC.
pub fn validate_backup_blocks(rec: &RawRecord<'_>, page_size: PageSize) -> FormatResult<usize> {
    walk(rec, page_size, false).map(|(count, _)| count)
}

fn walk(rec: &RawRecord<'_>, page_size: PageSize, with_crc: bool) -> FormatResult<(usize, u32)> {
    let mut blocks = rec.backup_blocks(page_size)?;
    let data = rec.data()?;
    let mut crc = if with_crc {
        crc32c::crc32c_append(0, data)
    } else {
        0
    };

    let mut count = 0usize;
    for b in blocks.by_ref() {
        let b = b?;
        if with_crc {
            crc = crc32c::crc32c_append(crc, b.encoded);
        }
        count += 1;
    }

    // xl_tot_len должен совпасть с посчитанным размером
    if blocks.remaining() != 0 {
        return Err(FormatError::new(
            FormatErrorKind::IncorrectTotalLength,
            "incorrect total length in record",
        ));
    }
    Ok((count, crc))
}
