//! filter — решение pass/drop по Verdict для частичного восстановления.
//!
//! Только классификация: байты записи не меняются, переписывание остаётся за
//! вызывающим pipeline.
//!
//! Запись проходит, если:
//! - она не привязана к отношению;
//! - отношение системное (relNode < FirstNormalObjectId);
//! - отношение в global tablespace (общие каталоги кластера);
//! - база отношения входит в список включённых.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::consts::{FIRST_NORMAL_OBJECT_ID, GLOBAL_TABLESPACE_OID};
use crate::interpret::Verdict;
use crate::record::RelFileNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDecision {
    Pass,
    Drop,
}

#[derive(Debug, Clone, Default)]
pub struct RelationFilter {
    databases: BTreeSet<u32>,
}

impl RelationFilter {
    pub fn new<I: IntoIterator<Item = u32>>(databases: I) -> Self {
        Self {
            databases: databases.into_iter().collect(),
        }
    }

    pub fn databases(&self) -> impl Iterator<Item = u32> + '_ {
        self.databases.iter().copied()
    }

    pub fn decide(&self, verdict: &Verdict) -> FilterDecision {
        match verdict.relation {
            None => FilterDecision::Pass,
            Some(node) => self.decide_relation(&node),
        }
    }

    pub fn decide_relation(&self, node: &RelFileNode) -> FilterDecision {
        if node.rel_node < FIRST_NORMAL_OBJECT_ID
            || node.spc_node == GLOBAL_TABLESPACE_OID
            || self.databases.contains(&node.db_node)
        {
            FilterDecision::Pass
        } else {
            FilterDecision::Drop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions() {
        let f = RelationFilter::new([16384]);
        let v = |n: Option<RelFileNode>| Verdict { relation: n };

        assert_eq!(f.decide(&v(None)), FilterDecision::Pass);
        assert_eq!(
            f.decide(&v(Some(RelFileNode::new(1663, 16384, 24601)))),
            FilterDecision::Pass
        );
        assert_eq!(
            f.decide(&v(Some(RelFileNode::new(1663, 16385, 24601)))),
            FilterDecision::Drop
        );
        // системный каталог в чужой базе
        assert_eq!(
            f.decide(&v(Some(RelFileNode::new(1663, 16385, 1259)))),
            FilterDecision::Pass
        );
        // global tablespace
        assert_eq!(
            f.decide(&v(Some(RelFileNode::new(1664, 0, 90000)))),
            FilterDecision::Pass
        );
    }
}
