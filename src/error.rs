//! Ошибка формата WAL-записи.
//!
//! Единственный вид ошибки ядра: структурная проблема входных байтов, никогда не
//! временная. Вызывающий код ветвится по `kind()`, тесты и логи смотрят на текст.

use thiserror::Error;

/// Стабильный дискриминант ошибки формата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatErrorKind {
    /// xl_rmid вне диапазона известных менеджеров ресурсов.
    UnknownResourceManager,
    /// Менеджер известен, но не используется в этой версии движка (hash).
    UnsupportedResourceManager,
    /// Opcode не описан для данного менеджера.
    UnknownOpcode,
    /// Устаревший opcode (XLOG_HEAP_MOVE).
    ObsoleteOpcode,
    /// xl_len == 0 у записи, которой нужны данные.
    ZeroLength,
    /// XLOG SWITCH с ненулевым xl_len.
    InvalidSwitchRecord,
    /// xl_tot_len вне допустимых границ.
    InvalidRecordLength,
    /// hole_offset + hole_length > page size.
    IncorrectHoleSize,
    /// Backup block не помещается в остаток записи.
    InvalidBackupBlockSize,
    /// После всех backup blocks остались байты.
    IncorrectTotalLength,
    /// CRC32C не совпал.
    ChecksumMismatch,
    /// Буфер короче, чем требует заголовок или структура payload.
    TruncatedRecord,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct FormatError {
    kind: FormatErrorKind,
    detail: String,
}

impl FormatError {
    pub fn new(kind: FormatErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> FormatErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    // ----- конструкторы со стабильными сообщениями -----

    pub(crate) fn unknown_rmgr(rmid: u8) -> Self {
        Self::new(
            FormatErrorKind::UnknownResourceManager,
            format!("Unknown resource manager {}", rmid),
        )
    }

    pub(crate) fn unknown_opcode(label: &str, masked: u8) -> Self {
        Self::new(
            FormatErrorKind::UnknownOpcode,
            format!("{} UNKNOWN: {}", label, masked),
        )
    }

    pub(crate) fn truncated(what: &str, need: usize, have: usize) -> Self {
        Self::new(
            FormatErrorKind::TruncatedRecord,
            format!("{}: need {} bytes, have {}", what, need, have),
        )
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
