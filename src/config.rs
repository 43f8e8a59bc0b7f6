//! Configuration for the record interpreter.
//!
//! Один источник настроек вместо разбросанных env lookups:
//! - page_size (ENV GPWAL_PAGE_SIZE) — BLCKSZ исходного кластера, по умолчанию 32768;
//! - verify_checksum (ENV GPWAL_VERIFY_CHECKSUM) — пересчитывать CRC32C (по умолчанию да).
//!   "0|false|off|no" отключает только сравнение CRC; форма заголовка, геометрия
//!   backup blocks и xl_tot_len проверяются всегда.
//!
//! Builder-style setters поверх from_env()/default().

use anyhow::{Context, Result};
use std::fmt;

use crate::consts::DEFAULT_PAGE_SIZE;
use crate::page_size::PageSize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Размер страницы исходного кластера.
    /// Env: GPWAL_PAGE_SIZE (default 32768)
    pub page_size: u32,

    /// Пересчитывать CRC32C записи.
    /// Env: GPWAL_VERIFY_CHECKSUM (default true)
    pub verify_checksum: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            verify_checksum: true,
        }
    }
}

impl InterpreterConfig {
    /// Load configuration from environment variables.
    /// Нечитаемые значения игнорируются (остаётся default).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("GPWAL_PAGE_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.page_size = n;
            }
        }

        if let Ok(v) = std::env::var("GPWAL_VERIFY_CHECKSUM") {
            let s = v.trim().to_ascii_lowercase();
            if s == "0" || s == "false" || s == "off" || s == "no" {
                cfg.verify_checksum = false;
            }
        }

        cfg
    }

    pub fn with_page_size(mut self, bytes: u32) -> Self {
        self.page_size = bytes;
        self
    }

    pub fn with_verify_checksum(mut self, on: bool) -> Self {
        self.verify_checksum = on;
        self
    }

    /// Провалидированный размер страницы.
    pub fn page_size(&self) -> Result<PageSize> {
        PageSize::new(self.page_size).context("invalid interpreter page_size")
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for InterpreterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InterpreterConfig {{ page_size: {}, verify_checksum: {} }}",
            self.page_size, self.verify_checksum
        )
    }
}
