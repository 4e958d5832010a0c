//! # Compressed representations of genomic data
//!
//! A signature is a collection of sketches for a genomic dataset, in the
//! JSON layout shared by every sourmash implementation.

use std::fs::File;
use std::io;
use std::io::Write;
use std::iter::Iterator;
use std::path::Path;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::encodings::{revcomp, VALID};
use crate::sketch::KmerMinHash;
use crate::Error;

// Iterator for converting sequence to hashes
pub struct SeqToHashes {
    sequence: Vec<u8>,
    rc: Vec<u8>,
    kmer_index: usize,
    k_size: usize,
    max_index: usize,
    force: bool,
    seed: u64,
    last_position_check: usize,
}

impl SeqToHashes {
    pub fn new(seq: &[u8], k_size: usize, force: bool, seed: u64) -> SeqToHashes {
        let sequence = seq.to_ascii_uppercase();

        // With max_index at 0 the iterator is exhausted from the start
        let max_index = if k_size > 0 && sequence.len() >= k_size {
            sequence.len() - k_size + 1
        } else {
            0
        };

        let rc = if max_index > 0 {
            revcomp(&sequence)
        } else {
            Vec::new()
        };

        SeqToHashes {
            sequence,
            rc,
            kmer_index: 0,
            k_size,
            max_index,
            force,
            seed,
            last_position_check: 0,
        }
    }
}

impl Iterator for SeqToHashes {
    type Item = Result<u64, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.kmer_index >= self.max_index {
            return None;
        }

        let start = self.kmer_index;
        let end = start + self.k_size;

        for j in std::cmp::max(start, self.last_position_check)..end {
            if !VALID[self.sequence[j] as usize] {
                if !self.force {
                    self.kmer_index = self.max_index;
                    return Some(Err(Error::InvalidDNA {
                        message: String::from_utf8_lossy(&self.sequence[start..end]).into(),
                    }));
                }
                // every k-mer overlapping position j is invalid, jump past it
                self.kmer_index = j + 1;
                self.last_position_check = j + 1;
                return Some(Ok(0));
            }
        }
        self.last_position_check = end;

        // The reverse complement window moves backwards while the forward
        // window moves forward. For ksize = 3 and AGTCGT (len = 6):
        //   i = 0 -> seq[0..3] AGT, rc[3..6] ACT
        //   i = 3 -> seq[3..6] CGT, rc[0..3] ACG
        let len = self.sequence.len();
        let kmer = &self.sequence[start..end];
        let krc = &self.rc[len - end..len - start];
        let hash = crate::_hash_murmur(std::cmp::min(kmer, krc), self.seed);

        self.kmer_index += 1;
        Some(Ok(hash))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
pub struct Signature {
    #[serde(default = "default_class")]
    #[builder(default = default_class())]
    class: String,

    #[serde(default)]
    #[builder(default)]
    email: String,

    #[serde(default = "default_hash_function")]
    #[builder(default = default_hash_function(), setter(into))]
    hash_function: String,

    #[builder(default, setter(into))]
    filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into))]
    name: Option<String>,

    #[serde(default = "default_license")]
    #[builder(default = default_license())]
    license: String,

    signatures: Vec<KmerMinHash>,

    #[serde(default = "default_version")]
    #[builder(default = default_version())]
    version: f64,
}

fn default_license() -> String {
    "CC0".to_string()
}

fn default_class() -> String {
    "sourmash_signature".to_string()
}

fn default_hash_function() -> String {
    "0.murmur64".to_string()
}

fn default_version() -> f64 {
    0.4
}

impl Default for Signature {
    fn default() -> Signature {
        Signature {
            class: default_class(),
            email: "".to_string(),
            hash_function: default_hash_function(),
            license: default_license(),
            filename: None,
            name: None,
            signatures: Vec::new(),
            version: default_version(),
        }
    }
}

impl Signature {
    pub fn name(&self) -> String {
        if let Some(name) = &self.name {
            name.clone()
        } else if let Some(filename) = &self.filename {
            filename.clone()
        } else {
            self.md5sum()
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.into())
    }

    pub fn filename(&self) -> String {
        self.filename.clone().unwrap_or_default()
    }

    pub fn set_filename(&mut self, name: &str) {
        self.filename = Some(name.into())
    }

    pub fn size(&self) -> usize {
        self.signatures.len()
    }

    pub fn sketches(&self) -> Vec<KmerMinHash> {
        self.signatures.clone()
    }

    pub fn push(&mut self, sketch: KmerMinHash) {
        self.signatures.push(sketch);
    }

    pub fn license(&self) -> String {
        self.license.clone()
    }

    pub fn class(&self) -> String {
        self.class.clone()
    }

    pub fn hash_function(&self) -> String {
        self.hash_function.clone()
    }

    /// md5sum of the first sketch, or an empty string for a signature
    /// without sketches.
    pub fn md5sum(&self) -> String {
        self.signatures
            .first()
            .map(|mh| mh.md5sum())
            .unwrap_or_default()
    }

    /// Total number of hashes over all sketches.
    pub fn hash_count(&self) -> usize {
        self.signatures.iter().map(|mh| mh.size()).sum()
    }

    pub fn add_sequence(&mut self, seq: &[u8], force: bool) -> Result<(), Error> {
        for sketch in self.signatures.iter_mut() {
            sketch.add_sequence(seq, force)?;
        }
        Ok(())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Signature>, Error> {
        let mut reader = io::BufReader::new(File::open(path)?);
        Signature::from_reader(&mut reader)
    }

    /// Load signatures from plain or gzip compressed JSON.
    ///
    /// Both a list of signatures and a single signature object are accepted.
    pub fn from_reader<R>(rdr: R) -> Result<Vec<Signature>, Error>
    where
        R: io::Read,
    {
        let (rdr, _format) =
            niffler::get_reader(Box::new(rdr)).map_err(|e| Error::InvalidSignature {
                message: e.to_string(),
            })?;

        let value: serde_json::Value =
            serde_json::from_reader(rdr).map_err(|e| Error::InvalidSignature {
                message: e.to_string(),
            })?;

        let sigs: Vec<Signature> = match value {
            serde_json::Value::Array(_) => serde_json::from_value::<Vec<Signature>>(value),
            _ => serde_json::from_value::<Signature>(value).map(|sig| vec![sig]),
        }
        .map_err(|e| Error::InvalidSignature {
            message: e.to_string(),
        })?;

        if sigs.is_empty() {
            return Err(Error::InvalidSignature {
                message: "no signatures found".into(),
            });
        }

        Ok(sigs)
    }

    pub fn from_json_str(data: &str) -> Result<Vec<Signature>, Error> {
        Signature::from_reader(data.as_bytes())
    }
}

/// Write `sigs` as a JSON list, gzip compressed when `compress` is set.
///
/// Compressed output carries no timestamp, so the same signatures always
/// produce the same bytes.
pub fn save_signatures<W>(sigs: &[Signature], mut writer: W, compress: bool) -> Result<(), Error>
where
    W: io::Write,
{
    if compress {
        let mut wrt = niffler::get_writer(
            Box::new(&mut writer),
            niffler::compression::Format::Gzip,
            niffler::compression::Level::One,
        )?;
        serde_json::to_writer(&mut wrt, sigs)?;
        wrt.flush()?;
        // dropping the encoder writes the gzip trailer
        drop(wrt);
    } else {
        serde_json::to_writer(&mut writer, sigs)?;
    }
    writer.flush()?;

    Ok(())
}
