//! # Sketch sequence uploads and relay them to a remote sourmash search.
//!
//! The relay accepts either a file of DNA sequences (FASTA/FASTQ, optionally
//! gzip compressed) or a pre-built sourmash signature, builds a scaled
//! [MinHash sketch][0] when needed, and forwards the compressed signature to
//! a remote search API (by default [mastiff]). The CSV reply is returned to
//! the caller as JSON.
//!
//! [0]: https://en.wikipedia.org/wiki/MinHash
//! [mastiff]: https://mastiff.sourmash.bio
//!
//! The sketching pipeline lives in [`cmd`], the signature format in
//! [`signature`] and [`sketch`], the remote client in [`search`] and the HTTP
//! surface in [`server`].

pub mod errors;
pub use errors::RelayError as Error;

pub type Result<T> = std::result::Result<T, Error>;

pub mod cmd;
pub mod config;
pub mod encodings;
pub mod search;
pub mod server;
pub mod signature;
pub mod sketch;

use murmurhash3::murmurhash3_x64_128;

type HashIntoType = u64;

pub fn _hash_murmur(kmer: &[u8], seed: u64) -> u64 {
    murmurhash3_x64_128(kmer, seed).0
}
