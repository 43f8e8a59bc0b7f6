//! rmgr — кодовая книга менеджеров ресурсов Greenplum 6.
//!
//! - `ResourceManager` — закрытый набор xl_rmid (0..=RM_MAX_ID); match по нему
//!   исчерпывающий, новый менеджер не пройдёт мимо компилятора.
//! - opcodes.rs — таблицы opcode по менеджерам (trait `Opcode`).
//! - `codebook()` — плоское описание для CLI/диагностики.
//!
//! Кодовая книга статична и неизменяема: синхронизация не нужна.

use serde::Serialize;

pub mod opcodes;

pub use opcodes::{
    AppendOnlyOp, BitmapOp, BtreeOp, GinOp, GistOp, Heap2Op, HeapOp, SeqOp, SmgrOp, SpgistOp,
    XlogOp,
};

/// Максимальный допустимый xl_rmid (RM_APPEND_ONLY_ID).
pub const RM_MAX_ID: u8 = 19;

/// Где в payload лежит RelFileNode для данного opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationSite {
    /// Запись не несёт RelFileNode.
    Absent,
    /// RelFileNode по смещению в payload.
    At(usize),
    /// Opcode выведен из употребления; встреча с ним — ошибка формата.
    Retired,
}

/// Таблица opcode одного менеджера.
pub trait Opcode: Copy + Sized + 'static {
    /// Метка в сообщениях "<LABEL> UNKNOWN: n".
    const LABEL: &'static str;
    const MASK: u8;
    const ALL: &'static [Self];

    fn from_info(info: u8) -> Option<Self>;
    fn code(self) -> u8;
    fn name(self) -> &'static str;
    fn relation_site(self) -> RelationSite;

    #[inline]
    fn masked(info: u8) -> u8 {
        info & Self::MASK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ManagerClass {
    /// Записи менеджера никогда не несут RelFileNode; payload не читается.
    NoRelation,
    /// RelFileNode определяется по таблице opcode.
    Opcodes,
    /// Менеджер не поддерживается этой версией движка.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ResourceManager {
    Xlog = 0,
    Xact = 1,
    Smgr = 2,
    Clog = 3,
    Dbase = 4,
    Tblspc = 5,
    MultiXact = 6,
    RelMap = 7,
    Standby = 8,
    Heap2 = 9,
    Heap = 10,
    Btree = 11,
    Hash = 12,
    Gin = 13,
    Gist = 14,
    Seq = 15,
    Spgist = 16,
    Bitmap = 17,
    DistributedLog = 18,
    AppendOnly = 19,
}

impl ResourceManager {
    pub const ALL: [ResourceManager; RM_MAX_ID as usize + 1] = [
        Self::Xlog,
        Self::Xact,
        Self::Smgr,
        Self::Clog,
        Self::Dbase,
        Self::Tblspc,
        Self::MultiXact,
        Self::RelMap,
        Self::Standby,
        Self::Heap2,
        Self::Heap,
        Self::Btree,
        Self::Hash,
        Self::Gin,
        Self::Gist,
        Self::Seq,
        Self::Spgist,
        Self::Bitmap,
        Self::DistributedLog,
        Self::AppendOnly,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Xlog => "XLOG",
            Self::Xact => "Transaction",
            Self::Smgr => "Storage",
            Self::Clog => "CLOG",
            Self::Dbase => "Database",
            Self::Tblspc => "Tablespace",
            Self::MultiXact => "MultiXact",
            Self::RelMap => "RelMap",
            Self::Standby => "Standby",
            Self::Heap2 => "Heap2",
            Self::Heap => "Heap",
            Self::Btree => "Btree",
            Self::Hash => "Hash",
            Self::Gin => "Gin",
            Self::Gist => "Gist",
            Self::Seq => "Sequence",
            Self::Spgist => "SPGist",
            Self::Bitmap => "Bitmap",
            Self::DistributedLog => "DistributedLog",
            Self::AppendOnly => "Appendonly",
        }
    }

    pub fn class(self) -> ManagerClass {
        match self {
            Self::Xact
            | Self::Clog
            | Self::Dbase
            | Self::Tblspc
            | Self::MultiXact
            | Self::RelMap
            | Self::Standby
            | Self::DistributedLog => ManagerClass::NoRelation,
            Self::Hash => ManagerClass::Unsupported,
            Self::Xlog
            | Self::Smgr
            | Self::Heap2
            | Self::Heap
            | Self::Btree
            | Self::Gin
            | Self::Gist
            | Self::Seq
            | Self::Spgist
            | Self::Bitmap
            | Self::AppendOnly => ManagerClass::Opcodes,
        }
    }

    /// Маска и список opcode менеджера; None для менеджеров без таблицы.
    pub fn opcode_table(self) -> Option<(u8, Vec<OpcodeEntry>)> {
        match self {
            Self::Xlog => Some(entries::<XlogOp>()),
            Self::Smgr => Some(entries::<SmgrOp>()),
            Self::Heap2 => Some(entries::<Heap2Op>()),
            Self::Heap => Some(entries::<HeapOp>()),
            Self::Btree => Some(entries::<BtreeOp>()),
            Self::Gin => Some(entries::<GinOp>()),
            Self::Gist => Some(entries::<GistOp>()),
            Self::Seq => Some(entries::<SeqOp>()),
            Self::Spgist => Some(entries::<SpgistOp>()),
            Self::Bitmap => Some(entries::<BitmapOp>()),
            Self::AppendOnly => Some(entries::<AppendOnlyOp>()),
            Self::Xact
            | Self::Clog
            | Self::Dbase
            | Self::Tblspc
            | Self::MultiXact
            | Self::RelMap
            | Self::Standby
            | Self::DistributedLog
            | Self::Hash => None,
        }
    }

    /// Имя opcode для диагностики (`"?"` если код неизвестен).
    pub fn opcode_name(self, info: u8) -> &'static str {
        fn lookup<O: Opcode>(info: u8) -> &'static str {
            O::from_info(info).map(|o| o.name()).unwrap_or("?")
        }
        match self {
            Self::Xlog => lookup::<XlogOp>(info),
            Self::Smgr => lookup::<SmgrOp>(info),
            Self::Heap2 => lookup::<Heap2Op>(info),
            Self::Heap => lookup::<HeapOp>(info),
            Self::Btree => lookup::<BtreeOp>(info),
            Self::Gin => lookup::<GinOp>(info),
            Self::Gist => lookup::<GistOp>(info),
            Self::Seq => lookup::<SeqOp>(info),
            Self::Spgist => lookup::<SpgistOp>(info),
            Self::Bitmap => lookup::<BitmapOp>(info),
            Self::AppendOnly => lookup::<AppendOnlyOp>(info),
            _ => "-",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpcodeEntry {
    pub code: u8,
    pub name: &'static str,
    pub site: RelationSite,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodebookEntry {
    pub id: u8,
    pub manager: &'static str,
    pub class: ManagerClass,
    pub mask: Option<u8>,
    pub opcodes: Vec<OpcodeEntry>,
}

fn entries<O: Opcode>() -> (u8, Vec<OpcodeEntry>) {
    let list = O::ALL
        .iter()
        .map(|op| OpcodeEntry {
            code: op.code(),
            name: op.name(),
            site: op.relation_site(),
        })
        .collect();
    (O::MASK, list)
}

/// Полная кодовая книга в порядке xl_rmid.
pub fn codebook() -> Vec<CodebookEntry> {
    ResourceManager::ALL
        .iter()
        .map(|&rm| {
            let (mask, opcodes) = match rm.opcode_table() {
                Some((mask, ops)) => (Some(mask), ops),
                None => (None, Vec::new()),
            };
            CodebookEntry {
                id: rm.id(),
                manager: rm.name(),
                class: rm.class(),
                mask,
                opcodes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_from_id() {
        for id in 0..=RM_MAX_ID {
            let rm = ResourceManager::from_id(id).unwrap();
            assert_eq!(rm.id(), id);
        }
        assert_eq!(ResourceManager::from_id(RM_MAX_ID + 1), None);
        assert_eq!(ResourceManager::from_id(u8::MAX), None);
    }

    #[test]
    fn codebook_is_total() {
        let book = codebook();
        assert_eq!(book.len(), RM_MAX_ID as usize + 1);
        for e in &book {
            match e.class {
                ManagerClass::Opcodes => assert!(!e.opcodes.is_empty(), "{}", e.manager),
                _ => assert!(e.opcodes.is_empty() && e.mask.is_none(), "{}", e.manager),
            }
        }
    }

    #[test]
    fn opcode_names_for_diagnostics() {
        assert_eq!(ResourceManager::Xlog.opcode_name(0x40), "XLOG_SWITCH");
        assert_eq!(ResourceManager::Btree.opcode_name(0xF0), "?");
        assert_eq!(ResourceManager::Xact.opcode_name(0x00), "-");
    }
}
