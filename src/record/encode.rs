//! record/encode — сборка корректных WAL-записей (fixtures для тестов и инструментов).
//!
//! Интерпретатор байты не меняет; этот модуль нужен, чтобы получать записи с
//! правильным CRC32C: payload, затем backup blocks по возрастанию слота, затем
//! header[0..xl_crc).

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{
    xlr_bkp_block, XLOG_RECORD_SIZE, XLOG_REC_OFF_CRC, XLOG_REC_OFF_INFO,
    XLOG_REC_OFF_LEN, XLOG_REC_OFF_PREV, XLOG_REC_OFF_RMID, XLOG_REC_OFF_TOT_LEN,
    XLOG_REC_OFF_XID, XLR_MAX_BKP_BLOCKS,
};
use crate::page_size::PageSize;
use crate::record::BackupBlock;
use crate::rmgr::ResourceManager;

#[derive(Debug, Clone)]
pub struct RecordBuilder {
    rmid: u8,
    info: u8,
    xid: u32,
    prev: u64,
    payload: Vec<u8>,
    blocks: [Option<(BackupBlock, Vec<u8>)>; XLR_MAX_BKP_BLOCKS],
}

impl RecordBuilder {
    /// `info` — opcode менеджера; флаги backup blocks выставляются сборщиком.
    pub fn new(rm: ResourceManager, info: u8) -> Self {
        Self::with_raw_rmid(rm.id(), info)
    }

    /// Произвольный xl_rmid (в том числе вне диапазона — для негативных тестов).
    pub fn with_raw_rmid(rmid: u8, info: u8) -> Self {
        Self {
            rmid,
            info,
            xid: 0,
            prev: 0,
            payload: Vec::new(),
            blocks: Default::default(),
        }
    }

    pub fn xid(mut self, xid: u32) -> Self {
        self.xid = xid;
        self
    }

    pub fn prev(mut self, prev: u64) -> Self {
        self.prev = prev;
        self
    }

    pub fn payload(mut self, data: &[u8]) -> Self {
        self.payload = data.to_vec();
        self
    }

    /// Положить backup block в первый свободный слот.
    pub fn backup_block(self, block: BackupBlock, image: &[u8]) -> Result<Self> {
        let slot = self
            .blocks
            .iter()
            .position(|b| b.is_none())
            .ok_or_else(|| anyhow!("all {} backup block slots are used", XLR_MAX_BKP_BLOCKS))?;
        self.backup_block_at(slot, block, image)
    }

    /// Положить backup block в конкретный слот (бит XLR_BKP_BLOCK(slot)).
    pub fn backup_block_at(mut self, slot: usize, block: BackupBlock, image: &[u8]) -> Result<Self> {
        if slot >= XLR_MAX_BKP_BLOCKS {
            return Err(anyhow!("backup block slot {} out of range", slot));
        }
        self.blocks[slot] = Some((block, image.to_vec()));
        Ok(self)
    }

    /// Собрать запись. Образ каждого блока должен быть ровно page_size - hole_length
    /// байт, если дыра помещается в страницу; иначе длина образа не проверяется
    /// (так строятся записи с заведомо неверной геометрией).
    pub fn build(&self, page_size: PageSize) -> Result<Vec<u8>> {
        let mut info = self.info;
        let mut tail: Vec<u8> = Vec::new();
        for (slot, entry) in self.blocks.iter().enumerate() {
            let Some((block, image)) = entry else {
                continue;
            };
            if block.hole_fits(page_size) {
                let want = (page_size.bytes() - block.hole_length as u32) as usize;
                if image.len() != want {
                    return Err(anyhow!(
                        "backup block image in slot {} must be {} bytes, got {}",
                        slot,
                        want,
                        image.len()
                    ));
                }
            }
            info |= xlr_bkp_block(slot);
            tail.extend_from_slice(&block.to_bytes());
            tail.extend_from_slice(image);
        }

        let tot_len = XLOG_RECORD_SIZE + self.payload.len() + tail.len();
        let tot_len_u32 =
            u32::try_from(tot_len).map_err(|_| anyhow!("record too large: {} bytes", tot_len))?;

        let mut out = vec![0u8; tot_len];
        LittleEndian::write_u32(&mut out[XLOG_REC_OFF_TOT_LEN..XLOG_REC_OFF_TOT_LEN + 4], tot_len_u32);
        LittleEndian::write_u32(&mut out[XLOG_REC_OFF_XID..XLOG_REC_OFF_XID + 4], self.xid);
        LittleEndian::write_u32(
            &mut out[XLOG_REC_OFF_LEN..XLOG_REC_OFF_LEN + 4],
            self.payload.len() as u32,
        );
        out[XLOG_REC_OFF_INFO] = info;
        out[XLOG_REC_OFF_RMID] = self.rmid;
        LittleEndian::write_u64(&mut out[XLOG_REC_OFF_PREV..XLOG_REC_OFF_PREV + 8], self.prev);

        let data_end = XLOG_RECORD_SIZE + self.payload.len();
        out[XLOG_RECORD_SIZE..data_end].copy_from_slice(&self.payload);
        out[data_end..].copy_from_slice(&tail);

        let crc = record_crc(&out[XLOG_RECORD_SIZE..data_end], &tail, &out[..XLOG_REC_OFF_CRC]);
        LittleEndian::write_u32(&mut out[XLOG_REC_OFF_CRC..XLOG_REC_OFF_CRC + 4], crc);
        Ok(out)
    }
}

/// CRC32C записи в порядке записи на диск: payload, блоки, header[0..xl_crc).
#[inline]
pub fn record_crc(payload: &[u8], blocks: &[u8], header_prefix: &[u8]) -> u32 {
    let c = crc32c::crc32c_append(0, payload);
    let c = crc32c::crc32c_append(c, blocks);
    crc32c::crc32c_append(c, header_prefix)
}
