//! rmgr/opcodes — таблицы opcode по менеджерам ресурсов (Greenplum 6).
//!
//! Каждая таблица — enum с явными кодами; `from_info` маскирует xl_info маской
//! менеджера и возвращает None для кода, которого нет в таблице.
//! Heap/Heap2 используют 3-битную маску XLOG_HEAP_OPMASK: 8 значений, все заняты.

use crate::consts::{HEAP2_NEW_CID_OFF_RNODE, SMGR_TRUNCATE_OFF_RNODE, XLOG_HEAP_OPMASK, XLR_INFO_MASK};

use super::{Opcode, RelationSite};

const RMGR_MASK: u8 = !XLR_INFO_MASK;

macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $name:ident, label = $label:literal, mask = $mask:expr;
        $( $variant:ident = $code:literal, $cname:literal => $site:expr; )+
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $variant = $code, )+
        }

        impl Opcode for $name {
            const LABEL: &'static str = $label;
            const MASK: u8 = $mask;
            const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            fn from_info(info: u8) -> Option<Self> {
                match info & $mask {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }

            fn code(self) -> u8 {
                self as u8
            }

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $cname, )+
                }
            }

            fn relation_site(self) -> RelationSite {
                match self {
                    $( Self::$variant => $site, )+
                }
            }
        }
    };
}

opcode_table! {
    /// RM_XLOG_ID. RelFileNode есть только у XLOG_FPI.
    XlogOp, label = "XLOG", mask = RMGR_MASK;
    CheckpointShutdown = 0x00, "XLOG_CHECKPOINT_SHUTDOWN" => RelationSite::Absent;
    CheckpointOnline = 0x10, "XLOG_CHECKPOINT_ONLINE" => RelationSite::Absent;
    Noop = 0x20, "XLOG_NOOP" => RelationSite::Absent;
    NextOid = 0x30, "XLOG_NEXTOID" => RelationSite::Absent;
    Switch = 0x40, "XLOG_SWITCH" => RelationSite::Absent;
    BackupEnd = 0x50, "XLOG_BACKUP_END" => RelationSite::Absent;
    ParameterChange = 0x60, "XLOG_PARAMETER_CHANGE" => RelationSite::Absent;
    RestorePoint = 0x70, "XLOG_RESTORE_POINT" => RelationSite::Absent;
    FpwChange = 0x80, "XLOG_FPW_CHANGE" => RelationSite::Absent;
    EndOfRecovery = 0x90, "XLOG_END_OF_RECOVERY" => RelationSite::Absent;
    Fpi = 0xA0, "XLOG_FPI" => RelationSite::At(0);
    NextRelFileNode = 0xB0, "XLOG_NEXTRELFILENODE" => RelationSite::Absent;
    OverwriteContrecord = 0xC0, "XLOG_OVERWRITE_CONTRECORD" => RelationSite::Absent;
}

opcode_table! {
    /// RM_SMGR_ID. У TRUNCATE узел лежит внутри xl_smgr_truncate, не в начале.
    SmgrOp, label = "Storage", mask = RMGR_MASK;
    Create = 0x10, "XLOG_SMGR_CREATE" => RelationSite::At(0);
    Truncate = 0x20, "XLOG_SMGR_TRUNCATE" => RelationSite::At(SMGR_TRUNCATE_OFF_RNODE);
}

opcode_table! {
    /// RM_HEAP2_ID ("tier 2").
    Heap2Op, label = "Heap2", mask = XLOG_HEAP_OPMASK;
    Rewrite = 0x00, "XLOG_HEAP2_REWRITE" => RelationSite::Absent;
    Clean = 0x10, "XLOG_HEAP2_CLEAN" => RelationSite::At(0);
    FreezePage = 0x20, "XLOG_HEAP2_FREEZE_PAGE" => RelationSite::At(0);
    CleanupInfo = 0x30, "XLOG_HEAP2_CLEANUP_INFO" => RelationSite::At(0);
    Visible = 0x40, "XLOG_HEAP2_VISIBLE" => RelationSite::At(0);
    MultiInsert = 0x50, "XLOG_HEAP2_MULTI_INSERT" => RelationSite::At(0);
    LockUpdated = 0x60, "XLOG_HEAP2_LOCK_UPDATED" => RelationSite::At(0);
    NewCid = 0x70, "XLOG_HEAP2_NEW_CID" => RelationSite::At(HEAP2_NEW_CID_OFF_RNODE);
}

opcode_table! {
    /// RM_HEAP_ID ("tier 1"). XLOG_HEAP_MOVE в этой версии не пишется.
    HeapOp, label = "Heap", mask = XLOG_HEAP_OPMASK;
    Insert = 0x00, "XLOG_HEAP_INSERT" => RelationSite::At(0);
    Delete = 0x10, "XLOG_HEAP_DELETE" => RelationSite::At(0);
    Update = 0x20, "XLOG_HEAP_UPDATE" => RelationSite::At(0);
    Move = 0x30, "XLOG_HEAP_MOVE" => RelationSite::Retired;
    HotUpdate = 0x40, "XLOG_HEAP_HOT_UPDATE" => RelationSite::At(0);
    NewPage = 0x50, "XLOG_HEAP_NEWPAGE" => RelationSite::At(0);
    Lock = 0x60, "XLOG_HEAP_LOCK" => RelationSite::At(0);
    Inplace = 0x70, "XLOG_HEAP_INPLACE" => RelationSite::At(0);
}

opcode_table! {
    BtreeOp, label = "Btree", mask = RMGR_MASK;
    InsertLeaf = 0x00, "XLOG_BTREE_INSERT_LEAF" => RelationSite::At(0);
    InsertUpper = 0x10, "XLOG_BTREE_INSERT_UPPER" => RelationSite::At(0);
    InsertMeta = 0x20, "XLOG_BTREE_INSERT_META" => RelationSite::At(0);
    SplitL = 0x30, "XLOG_BTREE_SPLIT_L" => RelationSite::At(0);
    SplitR = 0x40, "XLOG_BTREE_SPLIT_R" => RelationSite::At(0);
    SplitLRoot = 0x50, "XLOG_BTREE_SPLIT_L_ROOT" => RelationSite::At(0);
    SplitRRoot = 0x60, "XLOG_BTREE_SPLIT_R_ROOT" => RelationSite::At(0);
    Delete = 0x70, "XLOG_BTREE_DELETE" => RelationSite::At(0);
    UnlinkPage = 0x80, "XLOG_BTREE_UNLINK_PAGE" => RelationSite::At(0);
    UnlinkPageMeta = 0x90, "XLOG_BTREE_UNLINK_PAGE_META" => RelationSite::At(0);
    NewRoot = 0xA0, "XLOG_BTREE_NEWROOT" => RelationSite::At(0);
    MarkPageHalfDead = 0xB0, "XLOG_BTREE_MARK_PAGE_HALFDEAD" => RelationSite::At(0);
    Vacuum = 0xC0, "XLOG_BTREE_VACUUM" => RelationSite::At(0);
    ReusePage = 0xD0, "XLOG_BTREE_REUSE_PAGE" => RelationSite::At(0);
}

opcode_table! {
    GinOp, label = "GIN", mask = RMGR_MASK;
    CreateIndex = 0x00, "XLOG_GIN_CREATE_INDEX" => RelationSite::At(0);
    CreatePtree = 0x10, "XLOG_GIN_CREATE_PTREE" => RelationSite::At(0);
    Insert = 0x20, "XLOG_GIN_INSERT" => RelationSite::At(0);
    Split = 0x30, "XLOG_GIN_SPLIT" => RelationSite::At(0);
    VacuumPage = 0x40, "XLOG_GIN_VACUUM_PAGE" => RelationSite::At(0);
    DeletePage = 0x50, "XLOG_GIN_DELETE_PAGE" => RelationSite::At(0);
    UpdateMetaPage = 0x60, "XLOG_GIN_UPDATE_META_PAGE" => RelationSite::At(0);
    InsertListPage = 0x70, "XLOG_GIN_INSERT_LISTPAGE" => RelationSite::At(0);
    DeleteListPage = 0x80, "XLOG_GIN_DELETE_LISTPAGE" => RelationSite::At(0);
    VacuumDataLeafPage = 0x90, "XLOG_GIN_VACUUM_DATA_LEAF_PAGE" => RelationSite::At(0);
}

opcode_table! {
    GistOp, label = "GIST", mask = RMGR_MASK;
    PageUpdate = 0x00, "XLOG_GIST_PAGE_UPDATE" => RelationSite::At(0);
    PageSplit = 0x30, "XLOG_GIST_PAGE_SPLIT" => RelationSite::At(0);
    CreateIndex = 0x50, "XLOG_GIST_CREATE_INDEX" => RelationSite::At(0);
}

opcode_table! {
    SeqOp, label = "Sequence", mask = RMGR_MASK;
    Log = 0x00, "XLOG_SEQ_LOG" => RelationSite::At(0);
}

opcode_table! {
    SpgistOp, label = "SPGIST", mask = RMGR_MASK;
    CreateIndex = 0x00, "XLOG_SPGIST_CREATE_INDEX" => RelationSite::At(0);
    AddLeaf = 0x10, "XLOG_SPGIST_ADD_LEAF" => RelationSite::At(0);
    MoveLeafs = 0x20, "XLOG_SPGIST_MOVE_LEAFS" => RelationSite::At(0);
    AddNode = 0x30, "XLOG_SPGIST_ADD_NODE" => RelationSite::At(0);
    SplitTuple = 0x40, "XLOG_SPGIST_SPLIT_TUPLE" => RelationSite::At(0);
    PickSplit = 0x50, "XLOG_SPGIST_PICKSPLIT" => RelationSite::At(0);
    VacuumLeaf = 0x60, "XLOG_SPGIST_VACUUM_LEAF" => RelationSite::At(0);
    VacuumRoot = 0x70, "XLOG_SPGIST_VACUUM_ROOT" => RelationSite::At(0);
    VacuumRedirect = 0x80, "XLOG_SPGIST_VACUUM_REDIRECT" => RelationSite::At(0);
}

opcode_table! {
    /// RM_BITMAP_ID (Greenplum). 0x00, 0x10 и 0x60 не используются.
    BitmapOp, label = "Bitmap", mask = RMGR_MASK;
    InsertLovItem = 0x20, "XLOG_BITMAP_INSERT_LOVITEM" => RelationSite::At(0);
    InsertMeta = 0x30, "XLOG_BITMAP_INSERT_META" => RelationSite::At(0);
    InsertBitmapLastWords = 0x40, "XLOG_BITMAP_INSERT_BITMAP_LASTWORDS" => RelationSite::At(0);
    InsertWords = 0x50, "XLOG_BITMAP_INSERT_WORDS" => RelationSite::At(0);
    UpdateWord = 0x70, "XLOG_BITMAP_UPDATEWORD" => RelationSite::At(0);
    UpdateWords = 0x80, "XLOG_BITMAP_UPDATEWORDS" => RelationSite::At(0);
}

opcode_table! {
    /// RM_APPEND_ONLY_ID (Greenplum).
    AppendOnlyOp, label = "Appendonly", mask = RMGR_MASK;
    Insert = 0x00, "XLOG_APPENDONLY_INSERT" => RelationSite::At(0);
    Truncate = 0x10, "XLOG_APPENDONLY_TRUNCATE" => RelationSite::At(0);
}
