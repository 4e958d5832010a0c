pub mod minhash;

pub use minhash::KmerMinHash;
