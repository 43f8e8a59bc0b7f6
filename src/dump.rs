//! dump — чтение "дампа записей": подряд идущие WAL-записи, каждая выровнена
//! до MAXALIGN, без заголовков страниц/сегментов.
//!
//! Формат для инструментов и тестов. Нарезка настоящих WAL-сегментов (page headers,
//! continuation records) сюда не входит.
//!
//! Использование:
//!   for item in RecordDump::new(&bytes) {
//!       let (off, rec) = item?;
//!       /* interpreter.interpret(rec) */
//!   }

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::consts::{MAXALIGN, XLOG_RECORD_SIZE, XLOG_REC_OFF_TOT_LEN};

#[inline]
pub fn maxalign(len: usize) -> usize {
    (len + MAXALIGN - 1) & !(MAXALIGN - 1)
}

/// Склеить записи в дамп (каждая дополняется нулями до MAXALIGN).
pub fn write_dump<R: AsRef<[u8]>>(records: &[R]) -> Vec<u8> {
    let mut out = Vec::new();
    for r in records {
        let r = r.as_ref();
        out.extend_from_slice(r);
        out.resize(out.len() + maxalign(r.len()) - r.len(), 0);
    }
    out
}

/// Итератор по записям дампа: (смещение, байты записи длиной xl_tot_len).
///
/// Конец:
/// - буфер исчерпан;
/// - xl_tot_len == 0 (нулевой хвост);
/// - хвост короче заголовка и весь из нулей.
/// Ошибка (после неё итератор завершается): ненулевой короткий хвост,
/// xl_tot_len меньше заголовка или за пределами буфера.
pub struct RecordDump<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> RecordDump<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            done: false,
        }
    }

    fn fail(&mut self, msg: String) -> Option<Result<(usize, &'a [u8])>> {
        self.done = true;
        Some(Err(anyhow!(msg)))
    }
}

impl<'a> Iterator for RecordDump<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];

        if rest.len() < XLOG_RECORD_SIZE {
            if rest.iter().all(|&b| b == 0) {
                self.done = true;
                return None;
            }
            let pos = self.pos;
            return self.fail(format!(
                "partial record header at offset {} ({} bytes)",
                pos,
                rest.len()
            ));
        }

        let tot_len =
            LittleEndian::read_u32(&rest[XLOG_REC_OFF_TOT_LEN..XLOG_REC_OFF_TOT_LEN + 4]) as usize;
        if tot_len == 0 {
            debug!("record dump: zero xl_tot_len at offset {}, stop", self.pos);
            self.done = true;
            return None;
        }
        if tot_len < XLOG_RECORD_SIZE {
            let pos = self.pos;
            return self.fail(format!(
                "record at offset {} declares xl_tot_len {} < header size {}",
                pos, tot_len, XLOG_RECORD_SIZE
            ));
        }
        if tot_len > rest.len() {
            let pos = self.pos;
            return self.fail(format!(
                "record at offset {} declares xl_tot_len {} but only {} bytes remain",
                pos,
                tot_len,
                rest.len()
            ));
        }

        let off = self.pos;
        self.pos = self.pos.saturating_add(maxalign(tot_len));
        Some(Ok((off, &rest[..tot_len])))
    }
}
