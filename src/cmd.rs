//! Sketch construction and serialization, shared by the HTTP handlers and
//! the command line.

use std::fs::File;
use std::io;
use std::path::Path;

use log::{info, warn};
use needletail::parse_fastx_reader;
use typed_builder::TypedBuilder;

use crate::encodings::HashFunctions;
use crate::signature::{save_signatures, Signature};
use crate::sketch::KmerMinHash;
use crate::{Error, Result};

#[derive(Debug, Clone, TypedBuilder)]
pub struct SketchParameters {
    #[builder(default = 21)]
    ksize: u32,

    #[builder(default = 1000)]
    scaled: u64,

    #[builder(default = 0)]
    num: u32,

    #[builder(default = 42)]
    seed: u64,

    /// Skip k-mers with non-ACGT characters instead of failing.
    #[builder(default = true)]
    force: bool,
}

impl Default for SketchParameters {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SketchParameters {
    pub fn ksize(&self) -> u32 {
        self.ksize
    }

    pub fn scaled(&self) -> u64 {
        self.scaled
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// An empty sketch for these parameters.
    pub fn template(&self) -> KmerMinHash {
        KmerMinHash::new(
            self.scaled,
            self.ksize,
            HashFunctions::murmur64_DNA,
            self.seed,
            self.num,
        )
    }
}

fn invalid_sequence<E: std::fmt::Display>(name: &str) -> impl Fn(E) -> Error + '_ {
    move |e| Error::InvalidSequence {
        name: name.into(),
        message: e.to_string(),
    }
}

/// Build a signature from FASTA/FASTQ records, plain or gzip compressed.
///
/// Records are decompressed and parsed as they are read.
pub fn sketch_reader<R>(rdr: R, name: &str, params: &SketchParameters) -> Result<Signature>
where
    R: io::Read + Send,
{
    let (rdr, _format) =
        niffler::send::get_reader(Box::new(rdr)).map_err(invalid_sequence(name))?;

    let mut parser = parse_fastx_reader(rdr).map_err(invalid_sequence(name))?;

    let mut sig = Signature::builder()
        .filename(name.to_string())
        .signatures(vec![params.template()])
        .build();

    let mut total_bp = 0;
    while let Some(record) = parser.next() {
        let record = record.map_err(invalid_sequence(name))?;
        let seq = record.seq();
        sig.add_sequence(&seq, params.force)?;
        total_bp += seq.len();
    }

    info!(
        "generated {} hashes by sketching {} bp from '{}'",
        sig.hash_count(),
        total_bp,
        name
    );
    if sig.hash_count() == 0 {
        warn!("sketch for '{}' is empty", name);
    }

    Ok(sig)
}

pub fn sketch_path<P: AsRef<Path>>(path: P, params: &SketchParameters) -> Result<Signature> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let reader = io::BufReader::new(File::open(path)?);
    sketch_reader(reader, &name, params)
}

/// Serialize signatures into the compressed payload sent to the search API.
pub fn serialize_sketch(sigs: &[Signature]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    save_signatures(sigs, &mut buf, true)?;
    info!("serialized signature into {} bytes.", buf.len());
    Ok(buf)
}
