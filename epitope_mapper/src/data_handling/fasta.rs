use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use needletail::parse_fastx_reader;
use tracing::{debug, error, info, warn};

use crate::models::{ProteinSequence, SequenceSource};

pub struct FastaFile {
    pub path: PathBuf,
}

impl SequenceSource for FastaFile {
    fn load(&self) -> anyhow::Result<Vec<ProteinSequence>> {
        info!("Reading sequences from {}", self.path.display());

        let bytes = fs::read(&self.path)
            .with_context(|| format!("failed to read FASTA {}", self.path.display()))?;

        let mut reader = match parse_fastx_reader(Cursor::new(bytes.as_slice())) {
            Ok(reader) => reader,
            Err(e) => {
                error!("Failed to open FASTA {}: {}", self.path.display(), e);
                return Err(anyhow!("failed to open FASTA {}: {}", self.path.display(), e));
            }
        };

        let mut records = Vec::new();
        while let Some(record) = reader.next() {
            let record = match record {
                Ok(record) => record,
                Err(e) => match trailing_header(&bytes) {
                    // needletail refuses a final header with no sequence lines
                    Some(header) => {
                        let (id, description) = split_header(&header);
                        warn!("Record {} in {} has no sequence", id, self.path.display());
                        records.push(ProteinSequence::new(id, description, &[]));
                        break;
                    }
                    None => bail!("malformed FASTA record in {}: {}", self.path.display(), e),
                },
            };
            let header = String::from_utf8_lossy(record.id()).into_owned();
            let (id, description) = split_header(&header);
            let residues = clean_residues(&record.seq());

            debug!("Parsed record {} ({} residues)", id, residues.len());
            records.push(ProteinSequence::new(id, description, &residues));
        }

        Ok(records)
    }
}

/// Exactly one record, as for the query protein.
pub fn read_single_fasta(path: &Path) -> anyhow::Result<ProteinSequence> {
    let mut records = FastaFile { path: path.to_path_buf() }
        .load()
        .with_context(|| format!("could not load query protein from {}", path.display()))?;

    match records.len() {
        1 => {
            let record = records.remove(0);
            if record.is_empty() {
                warn!("{} has no residues, its profile will be empty", record.id());
            }
            info!("Loaded {} '{}' of length {}", record.id(), record.description(), record.len());
            Ok(record)
        }
        0 => bail!("{} contains no FASTA records", path.display()),
        n => bail!("{} contains {} FASTA records, expected exactly one", path.display(), n),
    }
}

pub fn read_multi_fasta(path: &Path) -> anyhow::Result<Vec<ProteinSequence>> {
    let records = FastaFile { path: path.to_path_buf() }
        .load()
        .with_context(|| format!("could not load sequences from {}", path.display()))?;
    info!("Loaded {} sequences from {}", records.len(), path.display());
    Ok(records)
}

/// Header text of the last non-blank line, when that line is a `>` header.
fn trailing_header(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let last = text.lines().map(str::trim).filter(|l| !l.is_empty()).last()?;
    last.strip_prefix('>').map(str::to_string)
}

fn split_header(header: &str) -> (&str, &str) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, rest.trim()),
        None => (header, ""),
    }
}

/// Drop stray whitespace and a terminal stop symbol; case is normalised by `ProteinSequence`.
fn clean_residues(raw: &[u8]) -> Vec<u8> {
    let mut residues: Vec<u8> = raw.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    if residues.last() == Some(&b'*') {
        residues.pop();
    }
    residues
}
