//! End of archive handling, strictness and restarts

mod util;

use std::io::Write;

use bitcrust_blk::{ArchiveFile, ArchiveReader, Error, ReaderState, Sequence, Strictness};

use self::util::*;

fn indices<S: bitcrust_blk::Storage>(blocks: &[bitcrust_blk::Block<S>]) -> Vec<usize> {
    blocks.iter().map(|b| b.index()).collect()
}

#[test]
fn test_truncation_boundary() {
    let mut raw = genesis();
    raw.extend_from_slice(&[0xf9, 0xbe, 0xb4]);

    let mut reader = ArchiveReader::eager(&raw);

    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.hash().to_hex(), GENESIS_HASH);
    assert_eq!(reader.state(), ReaderState::Yielded);

    match reader.next() {
        Some(Err(Error::TruncatedRecord { offset, decoded, available })) => {
            assert_eq!(offset, GENESIS_RECORD_LEN);
            assert_eq!(decoded, 1);
            assert_eq!(available, 3);
        },
        other => panic!("unexpected {:?}", other.map(|r| r.map(|b| b.index()))),
    }
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(reader.next().is_none());
}

#[test]
fn test_truncated_inside_transactions() {
    let archive = small_chain(2);
    let cut = record_end(&archive, 2) + 100;

    let report = ArchiveReader::lazy(&archive[..cut]).scan();
    assert_eq!(indices(&report.blocks), vec![0, 1]);
    match report.error {
        Some(Error::TruncatedRecord { offset, decoded: 2, .. }) => assert_eq!(offset, record_end(&archive, 2)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_scan_to_the_end() {
    let archive = small_chain(3);
    let mut reader = ArchiveReader::eager(&archive);

    let blocks: Vec<_> = (&mut reader).map(|b| b.unwrap()).collect();
    assert_eq!(indices(&blocks), vec![0, 1, 2, 3]);
    assert_eq!(reader.state(), ReaderState::Exhausted);
    assert_eq!(reader.position(), archive.len());
    assert_eq!(reader.decoded(), 4);

    // each block starts where the previous one ended
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
    }
    assert_eq!(blocks[2].transactions().len(), 2);
    assert_eq!(blocks[2].transactions()[1].lock_time(), 2);
}

#[test]
fn test_zero_tail() {
    let mut raw = genesis();
    raw.extend_from_slice(&[0; 64]);

    let lenient = ArchiveReader::eager(&raw).with_strictness(Strictness::Lenient).scan();
    assert!(lenient.is_complete());
    assert_eq!(lenient.blocks.len(), 1);

    let strict = ArchiveReader::eager(&raw).scan();
    assert_eq!(strict.blocks.len(), 1);
    match strict.error {
        Some(Error::TruncatedRecord { offset, decoded: 1, available: 64 }) => assert_eq!(offset, GENESIS_RECORD_LEN),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_size_mismatch() {
    let mut archive = small_chain(2);
    // second block claims one byte more than it has
    let at = record_end(&archive, 1) + 4;
    archive[at] += 1;

    let strict = ArchiveReader::eager(&archive).scan();
    assert_eq!(strict.blocks.len(), 1);
    match strict.error {
        Some(Error::SizeMismatch { offset, declared, actual }) => {
            assert_eq!(offset, record_end(&archive, 1));
            assert_eq!(declared as usize, actual + 1);
        },
        other => panic!("unexpected {:?}", other),
    }

    // lenient continues at the decoded end
    let lenient = ArchiveReader::eager(&archive).with_strictness(Strictness::Lenient).scan();
    assert!(lenient.is_complete());
    assert_eq!(indices(&lenient.blocks), vec![0, 1, 2]);
    assert!(!lenient.blocks[1].is_size_consistent());
}

#[test]
fn test_bad_magic_between_blocks() {
    let mut archive = small_chain(2);
    let at = record_end(&archive, 2);
    archive[at..at + 4].copy_from_slice(&[0x0b, 0x11, 0x09, 0x07]);

    let report = ArchiveReader::eager(&archive).scan();
    assert_eq!(report.blocks.len(), 2);
    match report.error {
        Some(Error::BadMagic { offset, found }) => {
            assert_eq!(offset, at);
            assert_eq!(found, [0x0b, 0x11, 0x09, 0x07]);
        },
        other => panic!("unexpected {:?}", other),
    }

    // without a magic check the block decodes normally
    let report = ArchiveReader::eager(&archive).with_magic(None).scan();
    assert!(report.is_complete());
    assert_eq!(report.blocks.len(), 3);
    assert_eq!(report.blocks[2].magic(), &[0x0b, 0x11, 0x09, 0x07]);
}

#[test]
fn test_restart_is_idempotent() {
    let archive = small_chain(3);
    let mut reader = ArchiveReader::lazy(&archive)
        .with_sequence(Sequence { block: 10, transaction: 100 });

    let first: Vec<_> = (&mut reader).map(|b| b.unwrap()).collect();
    assert!(reader.next().is_none());

    reader.restart();
    assert_eq!(reader.state(), ReaderState::Positioned);
    let second: Vec<_> = (&mut reader).map(|b| b.unwrap()).collect();

    let fresh = ArchiveReader::lazy(&archive)
        .with_sequence(Sequence { block: 10, transaction: 100 })
        .scan();

    assert_eq!(indices(&first), vec![10, 11, 12, 13]);
    for blocks in &[&second, &fresh.blocks] {
        assert_eq!(blocks.len(), first.len());
        for (a, b) in first.iter().zip(blocks.iter()) {
            assert_eq!(a.index(), b.index());
            assert_eq!(a.hash(), b.hash());
            assert_eq!((a.start(), a.end()), (b.start(), b.end()));
            let a_txs: Vec<_> = a.transactions().iter().map(|t| (t.index(), t.hash())).collect();
            let b_txs: Vec<_> = b.transactions().iter().map(|t| (t.index(), t.hash())).collect();
            assert_eq!(a_txs, b_txs);
        }
    }

    // transaction labels run on across blocks
    assert_eq!(first[0].transactions()[0].index(), 100);
    assert_eq!(first[1].transactions()[0].index(), 101);
    assert_eq!(first[3].transactions()[1].index(), 106);
    assert_eq!(reader.sequence(), Sequence { block: 14, transaction: 107 });
}

#[test]
fn test_archive_file() {
    let archive = small_chain(2);
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&archive).unwrap();
    f.flush().unwrap();

    let file = ArchiveFile::open(f.path()).unwrap();
    assert_eq!(file.len(), archive.len());

    let eager: Vec<_> = file.eager_blocks().map(|b| b.unwrap()).collect();
    let lazy: Vec<_> = file.lazy_blocks().map(|b| b.unwrap()).collect();
    assert_eq!(eager.len(), 3);
    assert_eq!(eager.iter().map(|b| b.hash()).collect::<Vec<_>>(),
               lazy.iter().map(|b| b.hash()).collect::<Vec<_>>());
}

#[test]
fn test_empty_archive_file() {
    let f = tempfile::NamedTempFile::new().unwrap();

    let file = ArchiveFile::open(f.path()).unwrap();
    assert!(file.is_empty());

    let mut reader = file.eager_blocks();
    assert!(reader.next().is_none());
    assert_eq!(reader.state(), ReaderState::Exhausted);
}

#[test]
fn test_missing_archive_file() {
    match ArchiveFile::open("/nonexistent/blk00000.dat") {
        Err(Error::Io(_)) => {},
        Err(e) => panic!("unexpected {:?}", e),
        Ok(_) => panic!("opened a missing file"),
    }
}

/// Genesis followed by `record`, filled up with 0x01 bytes to 8 MiB
///
/// 0x01 filler decodes as endless minimal transactions, inputs and outputs.
fn huge_count_archive(record: &[u8]) -> Vec<u8> {
    let mut raw = genesis();
    raw.extend_from_slice(record);
    raw.resize(8 << 20, 0x01);
    raw
}

fn assert_truncated_after_genesis(raw: &[u8]) {
    let report = ArchiveReader::lazy(raw).scan();
    assert_eq!(report.blocks.len(), 1);
    assert_eq!(report.blocks[0].hash().to_hex(), GENESIS_HASH);
    match report.error {
        Some(Error::TruncatedRecord { offset, decoded: 1, available }) => {
            assert_eq!(offset, GENESIS_RECORD_LEN);
            assert_eq!(available, raw.len() - GENESIS_RECORD_LEN);
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_huge_tx_count() {
    // header without transactions; replace its tx_count of 0
    let mut record = block([7; 32], 1_400_000_000, 7, &[]);
    record.pop();
    record.extend_from_slice(&[0xfe, 0xff, 0xff, 0xff, 0xff]);

    assert_truncated_after_genesis(&huge_count_archive(&record));
}

#[test]
fn test_huge_input_count() {
    let mut record = block([7; 32], 1_400_000_000, 7, &[]);
    record.pop();
    record.push(1);
    // transaction version, then an input count that cannot fit
    record.extend_from_slice(&[1, 0, 0, 0]);
    record.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);

    assert_truncated_after_genesis(&huge_count_archive(&record));
}
