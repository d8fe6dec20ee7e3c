//!
//! Access to bitcoin-core style blk archives
//!
//! An archive is a concatenation of block records without any header or
//! padding. The `ArchiveReader` decodes them one after another from a
//! single buffer; `ArchiveFile` provides such a buffer by mapping a file.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::buffer::Buffer;
use crate::decoder::{Decoder, Sequence};
use crate::error::{Error, Result};
use crate::layout::MAGIC_LEN;
use crate::storage::{Eager, Lazy, Storage};


/// Magic number stored at the start of each block on mainnet
pub const MAINNET_MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

/// How strictly the end of an archive and inconsistent sizes are judged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Every byte must belong to a complete and consistent block
    Strict,

    /// Zero bytes after the last block end the archive, and size
    /// mismatches are only logged
    Lenient,
}

impl Default for Strictness {
    fn default() -> Strictness {
        Strictness::Strict
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// At a record boundary, nothing decoded there yet
    Positioned,

    Decoding,

    /// A block was returned and the position moved past it
    Yielded,

    /// Clean end of the archive
    Exhausted,

    /// Stopped on an error
    Failed,
}

impl ReaderState {
    pub fn is_terminal(&self) -> bool {
        *self == ReaderState::Exhausted || *self == ReaderState::Failed
    }
}

/// Blocks decoded by a complete scan, and the error that ended it if any
#[derive(Debug)]
pub struct ScanReport<S: Storage> {
    pub blocks: Vec<Block<S>>,
    pub error:  Option<Error>,
}

impl<S: Storage> ScanReport<S> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}


/// Iterates over the blocks of a single buffer
///
/// After an error the reader yields nothing until `restart`.
pub struct ArchiveReader<'a, S: Storage> {
    buf:        Buffer<'a>,
    decoder:    Decoder<S>,
    first:      Sequence,

    strictness: Strictness,
    magic:      Option<[u8; 4]>,

    state:      ReaderState,
    decoded:    usize,

    logger:     slog::Logger,
}

impl<'a> ArchiveReader<'a, Eager> {
    pub fn eager(source: &'a [u8]) -> Self {
        ArchiveReader::new(source, Decoder::eager())
    }
}

impl<'a> ArchiveReader<'a, Lazy<'a>> {
    pub fn lazy(source: &'a [u8]) -> Self {
        ArchiveReader::new(source, Decoder::lazy(source))
    }
}

impl<'a, S: Storage> ArchiveReader<'a, S> {

    /// Reader over `source` using `decoder`; the labels of the first block
    /// are the decoder's current sequence
    pub fn new(source: &'a [u8], decoder: Decoder<S>) -> Self {
        ArchiveReader {
            buf:        Buffer::new(source),
            first:      decoder.sequence(),
            decoder:    decoder,
            strictness: Strictness::default(),
            magic:      Some(MAINNET_MAGIC),
            state:      ReaderState::Positioned,
            decoded:    0,
            logger:     slog::Logger::root(slog::Discard, o!()),
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Expected magic number; None accepts any
    pub fn with_magic(mut self, magic: Option<[u8; 4]>) -> Self {
        self.magic = magic;
        self
    }

    pub fn with_logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Labels for the first block, also after `restart`
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.first = sequence;
        self.decoder.set_sequence(sequence);
        self
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.buf.position()
    }

    /// Labels the next block will receive
    pub fn sequence(&self) -> Sequence {
        self.decoder.sequence()
    }

    /// Number of blocks returned since the start
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Rewinds to the first block; the blocks will be decoded again with
    /// the same labels
    pub fn restart(&mut self) {
        self.buf.seek(0);
        self.decoder.set_sequence(self.first);
        self.state = ReaderState::Positioned;
        self.decoded = 0;
    }

    /// Reads all remaining blocks
    pub fn scan(mut self) -> ScanReport<S> {
        let mut blocks = Vec::new();
        let mut error = None;

        for result in &mut self {
            match result {
                Ok(block) => blocks.push(block),
                Err(e)    => error = Some(e),
            }
        }
        ScanReport { blocks: blocks, error: error }
    }

    fn fail(&mut self, error: Error) -> Option<Result<Block<S>>> {
        warn!(self.logger, "archive scan stopped";
            "offset" => self.buf.position(),
            "blocks" => self.decoded,
            "error" => %error);

        self.state = ReaderState::Failed;
        Some(Err(error))
    }

    fn exhausted(&mut self, reason: &'static str) -> Option<Result<Block<S>>> {
        debug!(self.logger, "end of archive";
            "reason" => reason,
            "offset" => self.buf.position(),
            "blocks" => self.decoded);

        self.state = ReaderState::Exhausted;
        None
    }

    fn truncated(&self, offset: usize) -> Error {
        Error::TruncatedRecord {
            offset:    offset,
            decoded:   self.decoded,
            available: self.buf.len() - offset,
        }
    }
}

impl<'a, S: Storage> Iterator for ArchiveReader<'a, S> {
    type Item = Result<Block<S>>;

    fn next(&mut self) -> Option<Result<Block<S>>> {
        if self.state.is_terminal() {
            return None;
        }

        if self.buf.is_at_end() {
            return self.exhausted("end of buffer");
        }

        let offset = self.buf.position();

        // pre-allocated files end in zeros
        if self.buf.rest().iter().all(|&b| b == 0) {
            return match self.strictness {
                Strictness::Lenient => self.exhausted("zero tail"),
                Strictness::Strict  => {
                    let err = self.truncated(offset);
                    self.fail(err)
                }
            };
        }

        self.state = ReaderState::Decoding;

        if let Some(magic) = self.magic {
            let rest = self.buf.rest();
            if rest.len() >= MAGIC_LEN && rest[..MAGIC_LEN] != magic {
                let mut found = [0; MAGIC_LEN];
                found.copy_from_slice(&rest[..MAGIC_LEN]);
                return self.fail(Error::BadMagic { offset: offset, found: found });
            }
        }

        let block = match self.decoder.decode_block(&mut self.buf) {
            Ok(block) => block,
            Err(Error::OutOfRange(_)) => {
                let err = self.truncated(offset);
                return self.fail(err);
            },
            Err(e) => return self.fail(e),
        };

        if let Err(e) = block.verify_size() {
            match self.strictness {
                Strictness::Strict  => return self.fail(e),
                Strictness::Lenient => warn!(self.logger, "block size mismatch";
                    "offset" => offset,
                    "declared" => block.declared_size(),
                    "actual" => block.actual_size()),
            }
        }

        trace!(self.logger, "block decoded"; "offset" => offset, "index" => block.index());

        self.buf.seek(block.end());
        self.decoded += 1;
        self.state = ReaderState::Yielded;
        Some(Ok(block))
    }
}


/// A single archive file, mapped read-only into memory
///
/// The mapping is released when this is dropped; records decoded lazily
/// from it borrow it and cannot outlive it.
pub struct ArchiveFile {
    path: PathBuf,

    // empty files cannot be mapped
    map:  Option<memmap::Mmap>,
}

impl ArchiveFile {

    pub fn open<P: AsRef<Path>>(path: P) -> Result<ArchiveFile> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        let map = if file.metadata()?.len() == 0 {
            None
        } else {
            // the file is opened read-only; other writers are not supported
            Some(unsafe { memmap::Mmap::map(&file)? })
        };

        Ok(ArchiveFile { path: path, map: map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        match self.map {
            Some(ref map) => &map[..],
            None          => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reader that copies each block out of the mapping
    pub fn eager_blocks(&self) -> ArchiveReader<Eager> {
        ArchiveReader::eager(self.bytes())
    }

    /// Reader of blocks that keep borrowing the mapping
    pub fn lazy_blocks(&self) -> ArchiveReader<Lazy> {
        ArchiveReader::lazy(self.bytes())
    }
}
