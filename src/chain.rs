//!
//! Walks the numbered blk files of a blocks directory
//!
//! Each file is mapped and scanned on its own; an error ends the scan of
//! that file only and is reported with it.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::archive::{ArchiveFile, Strictness, MAINNET_MAGIC};
use crate::block::Block;
use crate::config::Config;
use crate::decoder::Sequence;
use crate::error::Error;
use crate::storage::Lazy;


/// Name of archive file number `n`
pub fn file_name(n: usize) -> String {
    format!("blk{:05}.dat", n)
}

/// Outcome of scanning a single file
#[derive(Debug)]
pub struct FileReport {
    pub path:   PathBuf,

    /// Number of blocks decoded before the end or the error
    pub blocks: usize,

    pub error:  Option<Error>,
}

impl FileReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Chain {
    dir:        PathBuf,
    first:      usize,
    count:      Option<usize>,

    strictness: Strictness,
    magic:      Option<[u8; 4]>,

    logger:     slog::Logger,
}

impl Chain {

    /// All blk files in `dir`, starting at number 0
    pub fn new<P: AsRef<Path>>(dir: P) -> Chain {
        Chain {
            dir:        dir.as_ref().to_path_buf(),
            first:      0,
            count:      None,
            strictness: Strictness::default(),
            magic:      Some(MAINNET_MAGIC),
            logger:     slog::Logger::root(slog::Discard, o!()),
        }
    }

    pub fn from_config(config: &Config, logger: slog::Logger) -> Chain {
        Chain {
            dir:        config.blocks_dir.clone(),
            first:      config.first_file,
            count:      config.file_count,
            strictness: config.strictness,
            magic:      config.magic,
            logger:     logger,
        }
    }

    /// Limits the files to `count` files starting at number `first`
    pub fn with_range(mut self, first: usize, count: Option<usize>) -> Chain {
        self.first = first;
        self.count = count;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Chain {
        self.strictness = strictness;
        self
    }

    pub fn with_magic(mut self, magic: Option<[u8; 4]>) -> Chain {
        self.magic = magic;
        self
    }

    pub fn with_logger(mut self, logger: slog::Logger) -> Chain {
        self.logger = logger;
        self
    }

    pub fn path(&self, n: usize) -> PathBuf {
        self.dir.join(file_name(n))
    }

    /// Paths of the files to scan
    ///
    /// Without a count these are the existing files up to the first gap;
    /// with a count missing files are included and fail when scanned.
    pub fn files(&self) -> Vec<PathBuf> {
        match self.count {
            Some(count) => (self.first..self.first + count).map(|n| self.path(n)).collect(),
            None        => (self.first..)
                .map(|n| self.path(n))
                .take_while(|path| path.is_file())
                .collect(),
        }
    }

    /// Scans the files one after another, passing every block to `visit`
    ///
    /// Block labels continue from one file into the next.
    pub fn scan<F>(&self, mut visit: F) -> Vec<FileReport>
        where F: FnMut(&Path, &Block<Lazy>)
    {
        let mut sequence = Sequence::default();
        let mut reports = Vec::new();

        for path in self.files() {
            let (report, next) = self.scan_file(path, sequence, &mut visit);
            sequence = next;
            reports.push(report);
        }
        reports
    }

    /// Scans the files in parallel, one file per task
    ///
    /// Labels restart at zero in each file. Reports are in file order.
    pub fn scan_parallel<F>(&self, visit: F) -> Vec<FileReport>
        where F: Fn(&Path, &Block<Lazy>) + Sync
    {
        self.files()
            .into_par_iter()
            .map(|path| {
                let mut visit = |p: &Path, b: &Block<Lazy>| visit(p, b);
                self.scan_file(path, Sequence::default(), &mut visit).0
            })
            .collect()
    }

    fn scan_file<F>(&self, path: PathBuf, sequence: Sequence, visit: &mut F) -> (FileReport, Sequence)
        where F: FnMut(&Path, &Block<Lazy>)
    {
        let file = match ArchiveFile::open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(self.logger, "cannot open archive"; "path" => %path.display(), "error" => %e);
                return (FileReport { path: path, blocks: 0, error: Some(e) }, sequence);
            }
        };

        let logger = self.logger.new(o!("file" => path.display().to_string()));
        info!(logger, "scanning archive"; "bytes" => file.len());

        let mut reader = file.lazy_blocks()
            .with_strictness(self.strictness)
            .with_magic(self.magic)
            .with_logger(logger.clone())
            .with_sequence(sequence);

        let mut blocks = 0;
        let mut error = None;
        for result in &mut reader {
            match result {
                Ok(block) => {
                    visit(&path, &block);
                    blocks += 1;
                },
                Err(e) => error = Some(e),
            }
        }
        let next = reader.sequence();

        info!(logger, "archive scanned"; "blocks" => blocks, "complete" => error.is_none());
        (FileReport { path: path, blocks: blocks, error: error }, next)
    }
}
