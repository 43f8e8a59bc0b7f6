//! Константы формата WAL-записи Greenplum 6 (XLogRecord, BkpBlock, RelFileNode).

// -------- XLogRecord --------
// Layout (LE, MAXALIGN=8):
// [xl_tot_len u32]   -- полная длина записи (заголовок + данные + backup blocks)
// [xl_xid u32]
// [xl_len u32]       -- длина данных менеджера ресурсов
// [xl_info u8]
// [xl_rmid u8]
// [pad u16]
// [xl_prev u64]
// [xl_crc u32]       -- CRC32C
// [pad u32]
//
// SizeOfXLogRecord = MAXALIGN(28) = 32.
pub const XLOG_RECORD_SIZE: usize = 32;
pub const MAXALIGN: usize = 8;

// Offsets inside record header
pub const XLOG_REC_OFF_TOT_LEN: usize = 0;
pub const XLOG_REC_OFF_XID: usize = 4;
pub const XLOG_REC_OFF_LEN: usize = 8;
pub const XLOG_REC_OFF_INFO: usize = 12;
pub const XLOG_REC_OFF_RMID: usize = 13;
pub const XLOG_REC_OFF_PREV: usize = 16;
pub const XLOG_REC_OFF_CRC: usize = 24;

// -------- xl_info --------
// Младший полубайт — флаги уровня записи (backup blocks), старший — opcode менеджера.
pub const XLR_INFO_MASK: u8 = 0x0F;
pub const XLR_MAX_BKP_BLOCKS: usize = 4;

/// Бит "запись несёт backup block N" (N в 0..XLR_MAX_BKP_BLOCKS).
#[inline]
pub const fn xlr_bkp_block(i: usize) -> u8 {
    0x08 >> i
}

// Heap/Heap2 используют только 3 бита opcode.
pub const XLOG_HEAP_OPMASK: u8 = 0x70;

// -------- BkpBlock --------
// [RelFileNode 12][fork u32][block u32][hole_offset u16][hole_length u16]
pub const BKP_BLOCK_SIZE: usize = 24;
pub const BKP_OFF_NODE: usize = 0;
pub const BKP_OFF_FORK: usize = 12;
pub const BKP_OFF_BLOCK: usize = 16;
pub const BKP_OFF_HOLE_OFFSET: usize = 20;
pub const BKP_OFF_HOLE_LENGTH: usize = 22;

// -------- RelFileNode --------
pub const REL_FILE_NODE_SIZE: usize = 12;

// Смещения RelFileNode внутри вложенных структур payload.
// xl_smgr_truncate { blkno u32; rnode RelFileNode }
pub const SMGR_TRUNCATE_OFF_RNODE: usize = 4;
// xl_heap_new_cid { top_xid, cmin, cmax, combocid: u32; target xl_heaptid }
pub const HEAP2_NEW_CID_OFF_RNODE: usize = 16;

// -------- Page size --------
// BLCKSZ сборки Greenplum 6 по умолчанию.
pub const DEFAULT_PAGE_SIZE: u32 = 32 * 1024;
pub const MIN_PAGE_SIZE: u32 = 1024;
pub const MAX_PAGE_SIZE: u32 = 32 * 1024;

// -------- Catalog OIDs (filter) --------
pub const FIRST_NORMAL_OBJECT_ID: u32 = 16384;
pub const GLOBAL_TABLESPACE_OID: u32 = 1664;
