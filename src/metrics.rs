//! Lightweight global metrics for the record interpreter.
//!
//! Потокобезопасные атомарные счётчики (Relaxed): интерпретатор можно звать из
//! нескольких потоков, счётчики — единственное разделяемое состояние.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static RECORDS_OK: AtomicU64 = AtomicU64::new(0);
static RECORDS_WITH_RELATION: AtomicU64 = AtomicU64::new(0);
static RECORDS_WITHOUT_RELATION: AtomicU64 = AtomicU64::new(0);
static BACKUP_BLOCKS_CHECKED: AtomicU64 = AtomicU64::new(0);
static BYTES_CHECKED: AtomicU64 = AtomicU64::new(0);
static FORMAT_ERRORS: AtomicU64 = AtomicU64::new(0);
static CHECKSUM_MISMATCHES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub records_ok: u64,
    pub records_with_relation: u64,
    pub records_without_relation: u64,
    pub backup_blocks_checked: u64,
    pub bytes_checked: u64,
    pub format_errors: u64,
    pub checksum_mismatches: u64,
}

impl MetricsSnapshot {
    /// Доля записей с ошибкой формата среди всех просмотренных.
    pub fn error_ratio(&self) -> f64 {
        let total = self.records_ok + self.format_errors;
        if total == 0 {
            0.0
        } else {
            self.format_errors as f64 / total as f64
        }
    }
}

// ----- Recorders -----
pub fn record_ok(has_relation: bool, backup_blocks: usize, bytes: usize) {
    RECORDS_OK.fetch_add(1, Ordering::Relaxed);
    if has_relation {
        RECORDS_WITH_RELATION.fetch_add(1, Ordering::Relaxed);
    } else {
        RECORDS_WITHOUT_RELATION.fetch_add(1, Ordering::Relaxed);
    }
    BACKUP_BLOCKS_CHECKED.fetch_add(backup_blocks as u64, Ordering::Relaxed);
    BYTES_CHECKED.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_format_error(checksum_mismatch: bool) {
    FORMAT_ERRORS.fetch_add(1, Ordering::Relaxed);
    if checksum_mismatch {
        CHECKSUM_MISMATCHES.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        records_ok: RECORDS_OK.load(Ordering::Relaxed),
        records_with_relation: RECORDS_WITH_RELATION.load(Ordering::Relaxed),
        records_without_relation: RECORDS_WITHOUT_RELATION.load(Ordering::Relaxed),
        backup_blocks_checked: BACKUP_BLOCKS_CHECKED.load(Ordering::Relaxed),
        bytes_checked: BYTES_CHECKED.load(Ordering::Relaxed),
        format_errors: FORMAT_ERRORS.load(Ordering::Relaxed),
        checksum_mismatches: CHECKSUM_MISMATCHES.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    RECORDS_OK.store(0, Ordering::Relaxed);
    RECORDS_WITH_RELATION.store(0, Ordering::Relaxed);
    RECORDS_WITHOUT_RELATION.store(0, Ordering::Relaxed);
    BACKUP_BLOCKS_CHECKED.store(0, Ordering::Relaxed);
    BYTES_CHECKED.store(0, Ordering::Relaxed);
    FORMAT_ERRORS.store(0, Ordering::Relaxed);
    CHECKSUM_MISMATCHES.store(0, Ordering::Relaxed);
}
