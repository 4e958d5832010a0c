use std::convert::TryFrom;
use std::fmt::Write;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::encodings::HashFunctions;
use crate::signature::SeqToHashes;
use crate::Error;
use crate::HashIntoType;

pub fn max_hash_for_scaled(scaled: u64) -> u64 {
    match scaled {
        0 => 0,
        1 => u64::MAX,
        _ => (u64::MAX as f64 / scaled as f64) as u64,
    }
}

pub fn scaled_for_max_hash(max_hash: u64) -> u64 {
    match max_hash {
        0 => 0,
        _ => (u64::MAX as f64 / max_hash as f64) as u64,
    }
}

/// A MinHash sketch over canonical k-mers.
///
/// Bounded either by `max_hash` (scaled) or by `num`; `mins` stays sorted
/// and unique. Abundances are only ever read from submitted signatures and
/// kept aligned with `mins`.
#[derive(Debug, Clone, PartialEq)]
pub struct KmerMinHash {
    num: u32,
    ksize: u32,
    hash_function: HashFunctions,
    seed: u64,
    max_hash: u64,
    mins: Vec<u64>,
    abunds: Option<Vec<u64>>,
}

impl Serialize for KmerMinHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let n_fields = if self.abunds.is_some() { 8 } else { 7 };

        let mut partial = serializer.serialize_struct("KmerMinHash", n_fields)?;
        partial.serialize_field("num", &self.num)?;
        partial.serialize_field("ksize", &self.ksize)?;
        partial.serialize_field("seed", &self.seed)?;
        partial.serialize_field("max_hash", &self.max_hash)?;
        partial.serialize_field("mins", &self.mins)?;
        partial.serialize_field("md5sum", &self.md5sum())?;
        if let Some(abunds) = &self.abunds {
            partial.serialize_field("abundances", abunds)?;
        }
        partial.serialize_field("molecule", &self.hash_function.to_string())?;
        partial.end()
    }
}

impl<'de> Deserialize<'de> for KmerMinHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            num: u32,
            ksize: u32,
            seed: u64,
            max_hash: u64,
            mins: Vec<u64>,
            abundances: Option<Vec<u64>>,
            molecule: String,
        }

        let fields = Fields::deserialize(deserializer)?;

        let hash_function = HashFunctions::try_from(fields.molecule.as_str())
            .map_err(|e| <D::Error as de::Error>::custom(e))?;

        // older writers did not always sort mins
        let (mins, abunds) = match fields.abundances {
            Some(abunds) => {
                if abunds.len() != fields.mins.len() {
                    return Err(de::Error::custom(format!(
                        "{} mins but {} abundances",
                        fields.mins.len(),
                        abunds.len()
                    )));
                }
                let mut pairs: Vec<(u64, u64)> = fields.mins.into_iter().zip(abunds).collect();
                pairs.sort_unstable();
                let (mins, abunds): (Vec<u64>, Vec<u64>) = pairs.into_iter().unzip();
                (mins, Some(abunds))
            }
            None => {
                let mut mins = fields.mins;
                mins.sort_unstable();
                (mins, None)
            }
        };

        Ok(KmerMinHash {
            num: if fields.max_hash != 0 { 0 } else { fields.num },
            ksize: fields.ksize,
            hash_function,
            seed: fields.seed,
            max_hash: fields.max_hash,
            mins,
            abunds,
        })
    }
}

impl KmerMinHash {
    pub fn new(
        scaled: u64,
        ksize: u32,
        hash_function: HashFunctions,
        seed: u64,
        num: u32,
    ) -> KmerMinHash {
        KmerMinHash {
            num,
            ksize,
            hash_function,
            seed,
            max_hash: max_hash_for_scaled(scaled),
            mins: Vec::new(),
            abunds: None,
        }
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn ksize(&self) -> usize {
        self.ksize as usize
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn max_hash(&self) -> u64 {
        self.max_hash
    }

    pub fn scaled(&self) -> u64 {
        scaled_for_max_hash(self.max_hash)
    }

    pub fn size(&self) -> usize {
        self.mins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    pub fn mins(&self) -> Vec<u64> {
        self.mins.clone()
    }

    /// md5 over the k-mer size and every hash, as decimal strings.
    pub fn md5sum(&self) -> String {
        let mut buffer = String::with_capacity(20);
        let mut md5_ctx = md5::Context::new();

        let _ = write!(&mut buffer, "{}", self.ksize);
        md5_ctx.consume(&buffer);
        for x in &self.mins {
            buffer.clear();
            let _ = write!(&mut buffer, "{}", x);
            md5_ctx.consume(&buffer);
        }
        format!("{:x}", md5_ctx.compute())
    }

    pub fn add_hash(&mut self, hash: HashIntoType) {
        let bounded_by_num = self.num != 0;

        if self.max_hash != 0 && hash > self.max_hash {
            return;
        }
        if !bounded_by_num && self.max_hash == 0 {
            // neither num nor scaled: nothing is ever kept
            return;
        }

        match self.mins.binary_search(&hash) {
            Ok(pos) => {
                if let Some(abunds) = self.abunds.as_mut() {
                    abunds[pos] += 1;
                }
            }
            Err(pos) => {
                if bounded_by_num && pos >= self.num as usize {
                    return;
                }
                self.mins.insert(pos, hash);
                if let Some(abunds) = self.abunds.as_mut() {
                    abunds.insert(pos, 1);
                }
                if bounded_by_num {
                    let num = self.num as usize;
                    self.mins.truncate(num);
                    if let Some(abunds) = self.abunds.as_mut() {
                        abunds.truncate(num);
                    }
                }
            }
        }
    }

    /// Add all canonical k-mers of a DNA sequence.
    ///
    /// With `force`, k-mers containing anything other than `ACGT` are
    /// skipped; otherwise the first one found is an error.
    pub fn add_sequence(&mut self, seq: &[u8], force: bool) -> Result<(), Error> {
        if !self.hash_function.dna() {
            return Err(Error::InvalidHashFunction {
                function: self.hash_function.to_string(),
            });
        }

        for hash_value in SeqToHashes::new(seq, self.ksize(), force, self.seed) {
            match hash_value? {
                0 => continue,
                hash => self.add_hash(hash),
            }
        }

        Ok(())
    }
}
