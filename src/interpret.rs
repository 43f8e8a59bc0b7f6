//! interpret — фасад для filter pipeline: validate + extract для одной записи.
//!
//! Чистая функция от (байты записи, page size): состояния между вызовами нет,
//! поэтому записи с разных позиций WAL можно проверять параллельно.
//! Любая ошибка прерывает разбор записи целиком — частичного Verdict не бывает.

use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;

use crate::config::InterpreterConfig;
use crate::error::{FormatErrorKind, FormatResult};
use crate::extract::extract_relation;
use crate::metrics;
use crate::page_size::PageSize;
use crate::record::{RawRecord, RelFileNode};
use crate::rmgr::ResourceManager;
use crate::validate as checks;

/// Итог разбора записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Отношение, которое меняет запись; None — запись не привязана к отношению.
    pub relation: Option<RelFileNode>,
}

/// Полная проверка: форма заголовка, CRC32C, затем извлечение RelFileNode.
pub fn validate(buf: &[u8], page_size: PageSize) -> FormatResult<Verdict> {
    let rec = RawRecord::new(buf)?;
    run(&rec, page_size, true).map(|(v, _)| v)
}

/// Быстрая проверка только формы заголовка (без CRC).
pub fn validate_header_shape(buf: &[u8], page_size: PageSize) -> FormatResult<()> {
    let rec = RawRecord::new(buf)?;
    checks::validate_header_shape(&rec, page_size)
}

fn run(rec: &RawRecord<'_>, page_size: PageSize, verify_checksum: bool) -> FormatResult<(Verdict, usize)> {
    checks::validate_header_shape(rec, page_size)?;
    // без CRC геометрия блоков и xl_tot_len всё равно проверяются
    let blocks = if verify_checksum {
        checks::validate_checksum(rec, page_size)?
    } else {
        checks::validate_backup_blocks(rec, page_size)?
    };
    let relation = extract_relation(rec.rmid(), rec.info(), rec.data()?)?;
    Ok((Verdict { relation }, blocks))
}

/// Сессия интерпретатора: page size и режим проверки фиксируются один раз.
/// Не хранит состояния между записями; `&self` можно делить между потоками.
#[derive(Debug, Clone)]
pub struct Interpreter {
    page_size: PageSize,
    verify_checksum: bool,
}

impl Interpreter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            verify_checksum: true,
        }
    }

    pub fn from_config(cfg: &InterpreterConfig) -> Result<Self> {
        Ok(Self {
            page_size: cfg.page_size()?,
            verify_checksum: cfg.verify_checksum,
        })
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn verifies_checksum(&self) -> bool {
        self.verify_checksum
    }

    /// Разобрать запись; обновляет глобальные метрики.
    pub fn interpret(&self, buf: &[u8]) -> FormatResult<Verdict> {
        let res = RawRecord::new(buf).and_then(|rec| {
            let out = run(&rec, self.page_size, self.verify_checksum);
            if let Ok((v, blocks)) = &out {
                debug!(
                    "record rmgr={} op={} len={} tot_len={} bkp={} rel={}",
                    ResourceManager::from_id(rec.rmid()).map(|r| r.name()).unwrap_or("?"),
                    ResourceManager::from_id(rec.rmid())
                        .map(|r| r.opcode_name(rec.info()))
                        .unwrap_or("?"),
                    rec.len(),
                    rec.tot_len(),
                    blocks,
                    v.relation
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            out.map(|(v, blocks)| (v, blocks, rec.tot_len() as usize))
        });

        match res {
            Ok((v, blocks, bytes)) => {
                metrics::record_ok(v.relation.is_some(), blocks, bytes);
                Ok(v)
            }
            Err(e) => {
                warn!("WAL record rejected: {}", e);
                metrics::record_format_error(e.kind() == FormatErrorKind::ChecksumMismatch);
                Err(e)
            }
        }
    }

    /// Только форма заголовка; метрики не трогает.
    pub fn check_header(&self, buf: &[u8]) -> FormatResult<()> {
        validate_header_shape(buf, self.page_size)
    }
}
