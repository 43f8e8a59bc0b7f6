//! record — представление одной WAL-записи Greenplum 6 поверх среза байтов.
//!
//! Что здесь:
//! - RawRecord: неизменяемый view (заголовок XLogRecord + payload + backup blocks);
//! - RecordHeader: копия полей заголовка (для логов/CLI);
//! - RelFileNode: (spcNode, dbNode, relNode), копируется из payload;
//! - BackupBlock + BackupBlocks: разбор full-page images по флагам xl_info.
//!
//! Все чтения — явные смещения с проверкой границ, без reinterpret буфера.
//! Ошибки — FormatError (см. error.rs).

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::{
    xlr_bkp_block, BKP_BLOCK_SIZE, BKP_OFF_BLOCK, BKP_OFF_FORK, BKP_OFF_HOLE_LENGTH,
    BKP_OFF_HOLE_OFFSET, BKP_OFF_NODE, REL_FILE_NODE_SIZE, XLOG_RECORD_SIZE, XLOG_REC_OFF_CRC,
    XLOG_REC_OFF_INFO, XLOG_REC_OFF_LEN, XLOG_REC_OFF_PREV, XLOG_REC_OFF_RMID,
    XLOG_REC_OFF_TOT_LEN, XLOG_REC_OFF_XID, XLR_MAX_BKP_BLOCKS,
};
use crate::error::{FormatError, FormatErrorKind, FormatResult};
use crate::page_size::PageSize;

pub mod encode;

// -------------------- RelFileNode --------------------

/// Физический идентификатор файла отношения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelFileNode {
    pub spc_node: u32,
    pub db_node: u32,
    pub rel_node: u32,
}

impl RelFileNode {
    pub const fn new(spc_node: u32, db_node: u32, rel_node: u32) -> Self {
        Self {
            spc_node,
            db_node,
            rel_node,
        }
    }

    /// Прочитать RelFileNode по смещению `off`; буфер обязан вмещать все 12 байт.
    pub fn read_at(buf: &[u8], off: usize) -> FormatResult<Self> {
        let end = off.saturating_add(REL_FILE_NODE_SIZE);
        if buf.len() < end {
            return Err(FormatError::truncated(
                "payload too short for RelFileNode",
                end,
                buf.len(),
            ));
        }
        let b = &buf[off..end];
        Ok(Self {
            spc_node: LittleEndian::read_u32(&b[0..4]),
            db_node: LittleEndian::read_u32(&b[4..8]),
            rel_node: LittleEndian::read_u32(&b[8..12]),
        })
    }

    pub fn to_bytes(&self) -> [u8; REL_FILE_NODE_SIZE] {
        let mut out = [0u8; REL_FILE_NODE_SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.spc_node);
        LittleEndian::write_u32(&mut out[4..8], self.db_node);
        LittleEndian::write_u32(&mut out[8..12], self.rel_node);
        out
    }
}

impl fmt::Display for RelFileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.spc_node, self.db_node, self.rel_node)
    }
}

// -------------------- Header --------------------

/// Копия полей заголовка XLogRecord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    pub tot_len: u32,
    pub xid: u32,
    pub len: u32,
    pub info: u8,
    pub rmid: u8,
    pub prev: u64,
    pub crc: u32,
}

// -------------------- RawRecord --------------------

/// Неизменяемый view одной записи. Гарантирует только читаемость заголовка;
/// согласованность xl_tot_len/xl_len проверяет validate.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    buf: &'a [u8],
}

impl<'a> RawRecord<'a> {
    pub fn new(buf: &'a [u8]) -> FormatResult<Self> {
        if buf.len() < XLOG_RECORD_SIZE {
            return Err(FormatError::truncated(
                "buffer too short for record header",
                XLOG_RECORD_SIZE,
                buf.len(),
            ));
        }
        Ok(Self { buf })
    }

    #[inline]
    pub fn tot_len(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[XLOG_REC_OFF_TOT_LEN..XLOG_REC_OFF_TOT_LEN + 4])
    }

    #[inline]
    pub fn xid(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[XLOG_REC_OFF_XID..XLOG_REC_OFF_XID + 4])
    }

    #[inline]
    pub fn len(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[XLOG_REC_OFF_LEN..XLOG_REC_OFF_LEN + 4])
    }

    #[inline]
    pub fn info(&self) -> u8 {
        self.buf[XLOG_REC_OFF_INFO]
    }

    #[inline]
    pub fn rmid(&self) -> u8 {
        self.buf[XLOG_REC_OFF_RMID]
    }

    #[inline]
    pub fn prev(&self) -> u64 {
        LittleEndian::read_u64(&self.buf[XLOG_REC_OFF_PREV..XLOG_REC_OFF_PREV + 8])
    }

    #[inline]
    pub fn crc(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[XLOG_REC_OFF_CRC..XLOG_REC_OFF_CRC + 4])
    }

    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            tot_len: self.tot_len(),
            xid: self.xid(),
            len: self.len(),
            info: self.info(),
            rmid: self.rmid(),
            prev: self.prev(),
            crc: self.crc(),
        }
    }

    /// Байты заголовка до поля xl_crc (входят в CRC последними).
    #[inline]
    pub fn header_prefix(&self) -> &'a [u8] {
        &self.buf[..XLOG_REC_OFF_CRC]
    }

    /// Данные менеджера ресурсов (xl_len байт сразу после заголовка).
    pub fn data(&self) -> FormatResult<&'a [u8]> {
        let end = XLOG_RECORD_SIZE + self.len() as usize;
        if self.buf.len() < end {
            return Err(FormatError::truncated(
                "buffer too short for record data",
                end,
                self.buf.len(),
            ));
        }
        Ok(&self.buf[XLOG_RECORD_SIZE..end])
    }

    /// Backup blocks записи. Буфер обязан вмещать xl_tot_len байт.
    pub fn backup_blocks(&self, page_size: PageSize) -> FormatResult<BackupBlocks<'a>> {
        let tot_len = self.tot_len() as usize;
        if self.buf.len() < tot_len {
            return Err(FormatError::truncated(
                "buffer shorter than xl_tot_len",
                tot_len,
                self.buf.len(),
            ));
        }
        let data_end = XLOG_RECORD_SIZE + self.len() as usize;
        if tot_len < data_end {
            return Err(FormatError::new(
                FormatErrorKind::InvalidRecordLength,
                format!(
                    "invalid record length: xl_tot_len {} < header + xl_len {}",
                    tot_len, data_end
                ),
            ));
        }
        Ok(BackupBlocks {
            rest: &self.buf[data_end..tot_len],
            info: self.info(),
            page_size,
            slot: 0,
            failed: false,
        })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }
}

// -------------------- Backup blocks --------------------

/// Заголовок BkpBlock (24 байта); за ним page_size - hole_length байт образа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackupBlock {
    pub node: RelFileNode,
    pub fork: u32,
    pub block: u32,
    pub hole_offset: u16,
    pub hole_length: u16,
}

impl BackupBlock {
    pub fn parse(b: &[u8]) -> FormatResult<Self> {
        if b.len() < BKP_BLOCK_SIZE {
            return Err(FormatError::new(
                FormatErrorKind::InvalidBackupBlockSize,
                "invalid backup block size in record",
            ));
        }
        Ok(Self {
            node: RelFileNode::read_at(b, BKP_OFF_NODE)?,
            fork: LittleEndian::read_u32(&b[BKP_OFF_FORK..BKP_OFF_FORK + 4]),
            block: LittleEndian::read_u32(&b[BKP_OFF_BLOCK..BKP_OFF_BLOCK + 4]),
            hole_offset: LittleEndian::read_u16(&b[BKP_OFF_HOLE_OFFSET..BKP_OFF_HOLE_OFFSET + 2]),
            hole_length: LittleEndian::read_u16(&b[BKP_OFF_HOLE_LENGTH..BKP_OFF_HOLE_LENGTH + 2]),
        })
    }

    pub fn to_bytes(&self) -> [u8; BKP_BLOCK_SIZE] {
        let mut out = [0u8; BKP_BLOCK_SIZE];
        out[BKP_OFF_NODE..BKP_OFF_NODE + REL_FILE_NODE_SIZE].copy_from_slice(&self.node.to_bytes());
        LittleEndian::write_u32(&mut out[BKP_OFF_FORK..BKP_OFF_FORK + 4], self.fork);
        LittleEndian::write_u32(&mut out[BKP_OFF_BLOCK..BKP_OFF_BLOCK + 4], self.block);
        LittleEndian::write_u16(
            &mut out[BKP_OFF_HOLE_OFFSET..BKP_OFF_HOLE_OFFSET + 2],
            self.hole_offset,
        );
        LittleEndian::write_u16(
            &mut out[BKP_OFF_HOLE_LENGTH..BKP_OFF_HOLE_LENGTH + 2],
            self.hole_length,
        );
        out
    }

    /// "Дыра" помещается в страницу.
    #[inline]
    pub fn hole_fits(&self, page_size: PageSize) -> bool {
        self.hole_offset as u32 + self.hole_length as u32 <= page_size.bytes()
    }

    /// Размер на диске: заголовок + образ страницы без дыры.
    /// Имеет смысл только при hole_fits().
    #[inline]
    pub fn encoded_len(&self, page_size: PageSize) -> u32 {
        BKP_BLOCK_SIZE as u32 + page_size.bytes() - self.hole_length as u32
    }
}

/// Один backup block внутри записи.
#[derive(Debug, Clone, Copy)]
pub struct BackupBlockRef<'a> {
    /// Номер слота (бит XLR_BKP_BLOCK(slot) в xl_info).
    pub slot: usize,
    pub block: BackupBlock,
    /// Заголовок + образ, ровно так, как они входят в CRC.
    pub encoded: &'a [u8],
}

impl<'a> BackupBlockRef<'a> {
    pub fn image(&self) -> &'a [u8] {
        &self.encoded[BKP_BLOCK_SIZE..]
    }
}

/// Итератор по backup blocks в порядке возрастания слота.
///
/// Проверки на каждый установленный бит:
/// - остаток записи >= заголовка BkpBlock;
/// - hole_offset + hole_length <= page size;
/// - остаток записи >= заголовок + образ.
///
/// После первой ошибки итератор завершается. `remaining()` — байты записи,
/// ещё не отнесённые ни к одному блоку (после полного прохода обязаны быть 0).
#[derive(Debug, Clone)]
pub struct BackupBlocks<'a> {
    rest: &'a [u8],
    info: u8,
    page_size: PageSize,
    slot: usize,
    failed: bool,
}

impl<'a> BackupBlocks<'a> {
    #[inline]
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    fn fail(&mut self, e: FormatError) -> Option<FormatResult<BackupBlockRef<'a>>> {
        self.failed = true;
        Some(Err(e))
    }
}

impl<'a> Iterator for BackupBlocks<'a> {
    type Item = FormatResult<BackupBlockRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.slot < XLR_MAX_BKP_BLOCKS {
            let slot = self.slot;
            self.slot += 1;
            if self.info & xlr_bkp_block(slot) == 0 {
                continue;
            }

            if self.rest.len() < BKP_BLOCK_SIZE {
                return self.fail(FormatError::new(
                    FormatErrorKind::InvalidBackupBlockSize,
                    "invalid backup block size in record",
                ));
            }
            let block = match BackupBlock::parse(self.rest) {
                Ok(b) => b,
                Err(e) => return self.fail(e),
            };
            if !block.hole_fits(self.page_size) {
                return self.fail(FormatError::new(
                    FormatErrorKind::IncorrectHoleSize,
                    "incorrect hole size in record",
                ));
            }
            let blen = block.encoded_len(self.page_size) as usize;
            if self.rest.len() < blen {
                return self.fail(FormatError::new(
                    FormatErrorKind::InvalidBackupBlockSize,
                    "invalid backup block size in record",
                ));
            }

            let (encoded, rest) = self.rest.split_at(blen);
            self.rest = rest;
            return Some(Ok(BackupBlockRef {
                slot,
                block,
                encoded,
            }));
        }
        None
    }
}
