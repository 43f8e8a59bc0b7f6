// tests/checksum.rs
//
// Запуск только этого файла:
//   cargo test --test checksum -- --nocapture
//
// Обход backup blocks и CRC32C записи:
// 1) соглашение crc32c и порядок частей (payload, блоки, заголовок до xl_crc);
// 2) блоки в разреженных слотах, 4 блока на странице по умолчанию;
// 3) порча покрытых байтов -> ChecksumMismatch, паддинг 28..32 не покрыт;
// 4) порядок ошибок: форма заголовка, геометрия блоков, CRC, извлечение.

use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};
use oorandom::Rand64;

use gpwal::record::encode::{record_crc, RecordBuilder};
use gpwal::rmgr::ResourceManager;
use gpwal::validate::validate_checksum;
use gpwal::{validate, BackupBlock, FormatErrorKind, PageSize, RawRecord, RelFileNode};

const NODE: RelFileNode = RelFileNode::new(1663, 16384, 24601);
const HEAP_INSERT: u8 = 0x00;

fn page_size() -> PageSize {
    PageSize::new(8192).unwrap()
}

fn bkp(hole_offset: u16, hole_length: u16, block: u32) -> BackupBlock {
    BackupBlock {
        node: NODE,
        fork: 0,
        block,
        hole_offset,
        hole_length,
    }
}

/// Образ страницы без дыры: детерминированный, не нулевой.
fn image(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn heap_payload() -> Vec<u8> {
    let mut p = NODE.to_bytes().to_vec();
    p.extend_from_slice(&[0x11u8; 20]);
    p
}

/// Heap INSERT с двумя backup blocks (с дырой и без).
fn record_with_blocks() -> Result<Vec<u8>> {
    let ps = page_size();
    RecordBuilder::new(ResourceManager::Heap, HEAP_INSERT)
        .xid(700)
        .prev(0x0000_0001_0000_0028)
        .payload(&heap_payload())
        .backup_block(bkp(100, 8000, 3), &image(192, 1))?
        .backup_block(bkp(0, 0, 4), &image(8192, 2))?
        .build(ps)
}

fn set_u32(rec: &mut [u8], off: usize, v: u32) {
    LittleEndian::write_u32(&mut rec[off..off + 4], v);
}

#[test]
fn crc32c_convention() {
    // Castagnoli, init/xorout 0xFFFFFFFF
    assert_eq!(crc32c::crc32c(b"123456789"), 0xE306_9283);
    // цепочка частей == CRC конкатенации
    let whole: Vec<u8> = [&b"abc"[..], b"defgh", b"ij"].concat();
    assert_eq!(record_crc(b"abc", b"defgh", b"ij"), crc32c::crc32c(&whole));
}

#[test]
fn valid_record_with_backup_blocks() -> Result<()> {
    let ps = page_size();
    let rec = record_with_blocks()?;

    // 32 + payload + (24 + 192) + (24 + 8192)
    assert_eq!(rec.len(), 32 + 32 + 216 + 8216);
    assert_eq!(rec[12] & 0x0F, 0x08 | 0x04);

    let verdict = validate(&rec, ps)?;
    assert_eq!(verdict.relation, Some(NODE));

    let raw = RawRecord::new(&rec)?;
    assert_eq!(validate_checksum(&raw, ps)?, 2);

    let blocks: Vec<_> = raw.backup_blocks(ps)?.collect::<Result<_, _>>()?;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].slot, 0);
    assert_eq!(blocks[0].block.hole_length, 8000);
    assert_eq!(blocks[0].image(), &image(192, 1)[..]);
    assert_eq!(blocks[1].slot, 1);
    assert_eq!(blocks[1].block.block, 4);
    Ok(())
}

#[test]
fn sparse_slots_are_walked_in_bit_order() -> Result<()> {
    let ps = page_size();
    let rec = RecordBuilder::new(ResourceManager::Btree, 0x00)
        .payload(&heap_payload())
        .backup_block_at(1, bkp(10, 8182, 7), &image(10, 3))?
        .backup_block_at(3, bkp(4000, 4000, 8), &image(4192, 4))?
        .build(ps)?;
    assert_eq!(rec[12] & 0x0F, 0x04 | 0x01);

    assert_eq!(validate(&rec, ps)?.relation, Some(NODE));
    let raw = RawRecord::new(&rec)?;
    let slots: Vec<usize> = raw
        .backup_blocks(ps)?
        .map(|b| b.map(|b| b.slot))
        .collect::<Result<_, _>>()?;
    assert_eq!(slots, vec![1, 3]);
    Ok(())
}

#[test]
fn four_blocks_at_default_page_size() -> Result<()> {
    let ps = PageSize::DEFAULT;
    let mut b = RecordBuilder::new(ResourceManager::Heap2, 0x10).payload(&heap_payload());
    for i in 0..4u16 {
        let hole = 1000 * i;
        b = b.backup_block(bkp(64, hole, i as u32), &image(32768 - hole as usize, i as u8))?;
    }
    let rec = b.build(ps)?;
    assert_eq!(rec[12] & 0x0F, 0x0F);
    assert_eq!(validate(&rec, ps)?.relation, Some(NODE));

    // тот же поток байтов с другим page size — уже не сходится
    assert!(validate(&rec, PageSize::new(16384)?).is_err());
    Ok(())
}

#[test]
fn flipping_covered_bytes_breaks_checksum() -> Result<()> {
    let ps = page_size();
    let rec = record_with_blocks()?;
    let payload_end = 32 + heap_payload().len();
    let block0_image = payload_end + 24;

    let mut positions: Vec<usize> = Vec::new();
    // xl_xid, pad, xl_prev — поля заголовка, не влияющие на структуру
    positions.extend(4..8);
    positions.extend(14..24);
    // payload
    positions.extend(32..payload_end);
    // заголовок первого блока: RelFileNode/fork/block
    positions.extend(payload_end..payload_end + 20);
    // случайные байты образов
    let mut rng = Rand64::new(0x5EED_0F_C4C3);
    for _ in 0..64 {
        let span = (rec.len() - block0_image) as u64;
        positions.push(block0_image + (rng.rand_u64() % span) as usize);
    }

    // hole_length второго блока меняет геометрию, а не только CRC
    let block1_hole_len = block0_image + 192 + 22..block0_image + 192 + 24;

    for pos in positions {
        if block1_hole_len.contains(&pos) {
            continue;
        }
        let mut bad = rec.clone();
        bad[pos] ^= 0x5A;
        let err = validate(&bad, ps).unwrap_err();
        assert_eq!(err.kind(), FormatErrorKind::ChecksumMismatch, "pos={}", pos);
        assert!(err.to_string().contains("expect:"), "{}", err);
    }
    Ok(())
}

#[test]
fn mismatch_message_reports_both_values() -> Result<()> {
    let ps = page_size();
    let mut rec = record_with_blocks()?;
    let stored = LittleEndian::read_u32(&rec[24..28]);
    set_u32(&mut rec, 24, stored ^ 1);

    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::ChecksumMismatch);
    assert_eq!(
        err.to_string(),
        format!(
            "incorrect resource manager data checksum in record. expect: {}, but got: {}",
            stored ^ 1,
            stored
        )
    );
    Ok(())
}

#[test]
fn trailing_header_padding_is_not_covered() -> Result<()> {
    // байты 28..32 (MAXALIGN) в CRC не входят
    let ps = page_size();
    let mut rec = record_with_blocks()?;
    rec[29] = 0xFF;
    assert_eq!(validate(&rec, ps)?.relation, Some(NODE));
    Ok(())
}

#[test]
fn hole_geometry_error_wins_over_checksum() -> Result<()> {
    let ps = page_size();
    // 8000 + 300 > 8192
    let mut rec = RecordBuilder::new(ResourceManager::Heap, HEAP_INSERT)
        .payload(&heap_payload())
        .backup_block(bkp(8000, 300, 1), &image(8192 - 300, 9))?
        .build(ps)?;

    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::IncorrectHoleSize);
    assert_eq!(err.to_string(), "incorrect hole size in record");

    // и с испорченным CRC — та же ошибка
    rec[24] ^= 0xFF;
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::IncorrectHoleSize);
    Ok(())
}

#[test]
fn residual_bytes_after_blocks() -> Result<()> {
    let ps = page_size();

    // с блоком
    let mut rec = record_with_blocks()?;
    let tot = rec.len() as u32;
    rec.extend_from_slice(&[0u8; 8]);
    set_u32(&mut rec, 0, tot + 8);
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::IncorrectTotalLength);
    assert_eq!(err.to_string(), "incorrect total length in record");

    // без блоков
    let mut rec = RecordBuilder::new(ResourceManager::Seq, 0x00)
        .payload(&heap_payload())
        .build(ps)?;
    let tot = rec.len() as u32;
    rec.extend_from_slice(&[0u8; 4]);
    set_u32(&mut rec, 0, tot + 4);
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::IncorrectTotalLength);
    Ok(())
}

#[test]
fn block_larger_than_remaining_bytes() -> Result<()> {
    let ps = page_size();

    // образ обрезан на 10 байт, xl_tot_len поправлен
    let mut rec = RecordBuilder::new(ResourceManager::Heap, HEAP_INSERT)
        .payload(&heap_payload())
        .backup_block(bkp(0, 100, 1), &image(8092, 5))?
        .build(ps)?;
    rec.truncate(rec.len() - 10);
    let tot = rec.len() as u32;
    set_u32(&mut rec, 0, tot);
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::InvalidBackupBlockSize);
    assert_eq!(err.to_string(), "invalid backup block size in record");

    // флаг блока есть, а байтов нет совсем
    let mut rec = RecordBuilder::new(ResourceManager::Heap, HEAP_INSERT)
        .payload(&heap_payload())
        .build(ps)?;
    rec[12] |= 0x08;
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::InvalidBackupBlockSize);
    Ok(())
}

#[test]
fn buffer_shorter_than_total_length() -> Result<()> {
    let ps = page_size();
    let rec = record_with_blocks()?;
    let err = validate(&rec[..rec.len() - 1], ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::TruncatedRecord);
    Ok(())
}

#[test]
fn header_errors_come_before_checksum() -> Result<()> {
    let ps = page_size();
    let mut rec = record_with_blocks()?;
    // xl_len = 0 — форма заголовка ломается раньше CRC
    set_u32(&mut rec, 8, 0);
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::ZeroLength);
    Ok(())
}

#[test]
fn extraction_errors_surface_after_valid_checksum() -> Result<()> {
    let ps = page_size();
    // корректный CRC, но opcode XLOG_HEAP_MOVE
    let rec = RecordBuilder::new(ResourceManager::Heap, 0x30)
        .payload(&heap_payload())
        .build(ps)?;
    assert!(validate_checksum(&RawRecord::new(&rec)?, ps).is_ok());
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::ObsoleteOpcode);

    // Hash
    let rec = RecordBuilder::new(ResourceManager::Hash, 0x00)
        .payload(&heap_payload())
        .build(ps)?;
    let err = validate(&rec, ps).unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::UnsupportedResourceManager);
    Ok(())
}
