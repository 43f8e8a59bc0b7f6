//! PageSize — размер страницы хранилища исходного кластера (BLCKSZ).
//!
//! Передаётся вызывающим кодом один раз на сессию; ядро только читает его.

use anyhow::{anyhow, Result};
use std::fmt;

use crate::consts::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(u32);

impl PageSize {
    /// Размер по умолчанию для сборок Greenplum 6 (32 KiB).
    pub const DEFAULT: PageSize = PageSize(DEFAULT_PAGE_SIZE);

    /// Степень двойки в [1024 .. 32768].
    pub fn new(bytes: u32) -> Result<Self> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&bytes) || !bytes.is_power_of_two() {
            return Err(anyhow!(
                "page_size must be a power of two in [{} .. {}], got {}",
                MIN_PAGE_SIZE,
                MAX_PAGE_SIZE,
                bytes
            ));
        }
        Ok(Self(bytes))
    }

    #[inline]
    pub fn bytes(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
