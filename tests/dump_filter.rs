// tests/dump_filter.rs
//
// Запуск только этого файла:
//   cargo test --test dump_filter -- --nocapture
//
// Дамп записей и фильтр pass/drop:
// 1) смещения RecordDump совпадают с MAXALIGN-раскладкой write_dump;
// 2) классификация потока по списку баз (системные и global всегда pass);
// 3) битая запись в середине дампа; мусорный хвост.

use anyhow::Result;

use gpwal::dump::{maxalign, write_dump, RecordDump};
use gpwal::filter::{FilterDecision, RelationFilter};
use gpwal::record::encode::RecordBuilder;
use gpwal::{Interpreter, PageSize, RawRecord, RelFileNode, ResourceManager};

const KEEP_DB: u32 = 16384;
const OTHER_DB: u32 = 16390;

fn heap_insert(node: RelFileNode, ps: PageSize) -> Result<Vec<u8>> {
    let mut p = node.to_bytes().to_vec();
    p.extend_from_slice(&[0x33u8; 9]); // 21 байт — запись не кратна MAXALIGN
    RecordBuilder::new(ResourceManager::Heap, 0x00).payload(&p).build(ps)
}

fn stream(ps: PageSize) -> Result<Vec<Vec<u8>>> {
    Ok(vec![
        heap_insert(RelFileNode::new(1663, KEEP_DB, 24601), ps)?,
        heap_insert(RelFileNode::new(1663, OTHER_DB, 24602), ps)?,
        // системный каталог чужой базы
        heap_insert(RelFileNode::new(1663, OTHER_DB, 1259), ps)?,
        // global tablespace
        heap_insert(RelFileNode::new(1664, 0, 20000), ps)?,
        RecordBuilder::new(ResourceManager::Xact, 0x00)
            .payload(&[0u8; 12])
            .build(ps)?,
        RecordBuilder::new(ResourceManager::Xlog, 0x40).build(ps)?,
    ])
}

#[test]
fn dump_roundtrip_preserves_offsets() -> Result<()> {
    let ps = PageSize::new(8192)?;
    let records = stream(ps)?;
    let mut dump = write_dump(&records);
    // хвост сегмента — нули
    dump.extend_from_slice(&[0u8; 20]);

    let mut expected_off = 0usize;
    let mut seen = 0usize;
    for (item, orig) in RecordDump::new(&dump).zip(records.iter()) {
        let (off, rec) = item?;
        assert_eq!(off, expected_off);
        assert_eq!(rec, &orig[..]);
        assert_eq!(RawRecord::new(rec)?.tot_len() as usize, orig.len());
        expected_off += maxalign(orig.len());
        seen += 1;
    }
    assert_eq!(seen, records.len());
    assert_eq!(RecordDump::new(&dump).count(), records.len());
    Ok(())
}

#[test]
fn filter_classifies_stream() -> Result<()> {
    let ps = PageSize::new(8192)?;
    let dump = write_dump(&stream(ps)?);
    let interp = Interpreter::new(ps);
    let filter = RelationFilter::new([KEEP_DB]);

    let mut decisions = Vec::new();
    for item in RecordDump::new(&dump) {
        let (_, rec) = item?;
        decisions.push(filter.decide(&interp.interpret(rec)?));
    }
    let (pass, drop) = (FilterDecision::Pass, FilterDecision::Drop);
    assert_eq!(decisions, vec![pass, drop, pass, pass, pass, pass]);

    // без включённых баз падает только пользовательская таблица
    let none = RelationFilter::new(std::iter::empty());
    assert_eq!(none.databases().count(), 0);
    let first = RecordDump::new(&dump).next().unwrap()?.1;
    assert_eq!(none.decide(&interp.interpret(first)?), FilterDecision::Drop);
    Ok(())
}

#[test]
fn corrupted_record_stops_the_pass() -> Result<()> {
    let ps = PageSize::new(8192)?;
    let mut records = stream(ps)?;
    records[1][34] ^= 0x10;
    let dump = write_dump(&records);
    let interp = Interpreter::new(ps);

    let results: Vec<_> = RecordDump::new(&dump)
        .map(|item| item.map(|(_, rec)| interp.interpret(rec)))
        .collect::<Result<_>>()?;
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2..].iter().all(|r| r.is_ok()));
    Ok(())
}

#[test]
fn dump_reports_garbage_tail() {
    let ps = PageSize::new(8192).unwrap();
    let mut dump = write_dump(&[heap_insert(RelFileNode::new(1663, 1, 16400), ps).unwrap()]);
    dump.extend_from_slice(&[0xFFu8; 10]);
    let items: Vec<_> = RecordDump::new(&dump).collect();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    let err = items[1].as_ref().unwrap_err();
    assert!(err.to_string().contains("partial record header"));
}
