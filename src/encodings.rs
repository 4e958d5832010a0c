use std::convert::TryFrom;
use std::str;

use crate::Error;

/// The `molecule` a sketch was built from.
///
/// The relay only builds DNA sketches, but signatures submitted by callers
/// may carry any of the sourmash molecule types and are forwarded unchanged.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HashFunctions {
    murmur64_DNA = 1,
    murmur64_protein = 2,
    murmur64_dayhoff = 3,
    murmur64_hp = 4,
}

impl HashFunctions {
    pub fn dna(&self) -> bool {
        *self == HashFunctions::murmur64_DNA
    }
}

impl std::fmt::Display for HashFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HashFunctions::murmur64_DNA => "DNA",
                HashFunctions::murmur64_protein => "protein",
                HashFunctions::murmur64_dayhoff => "dayhoff",
                HashFunctions::murmur64_hp => "hp",
            }
        )
    }
}

impl TryFrom<&str> for HashFunctions {
    type Error = Error;

    fn try_from(moltype: &str) -> Result<Self, Self::Error> {
        match moltype.to_lowercase().as_ref() {
            "dna" => Ok(HashFunctions::murmur64_DNA),
            "dayhoff" => Ok(HashFunctions::murmur64_dayhoff),
            "hp" => Ok(HashFunctions::murmur64_hp),
            "protein" => Ok(HashFunctions::murmur64_protein),
            _ => Err(Error::InvalidHashFunction {
                function: moltype.into(),
            }),
        }
    }
}

const COMPLEMENT: [u8; 256] = {
    let mut lookup = [0; 256];
    lookup[b'A' as usize] = b'T';
    lookup[b'C' as usize] = b'G';
    lookup[b'G' as usize] = b'C';
    lookup[b'T' as usize] = b'A';
    lookup[b'N' as usize] = b'N';
    lookup
};

#[inline]
pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|nt| COMPLEMENT[*nt as usize])
        .collect()
}

pub const VALID: [bool; 256] = {
    let mut lookup = [false; 256];
    lookup[b'A' as usize] = true;
    lookup[b'C' as usize] = true;
    lookup[b'G' as usize] = true;
    lookup[b'T' as usize] = true;
    lookup
};

#[cfg(test)]
mod test {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn revcomp_roundtrip() {
        assert_eq!(revcomp(b"AGTCGT"), b"ACGACT".to_vec());
        assert_eq!(revcomp(&revcomp(b"ACGTN")), b"ACGTN".to_vec());
    }

    #[test]
    fn molecule_names() {
        assert_eq!(
            HashFunctions::try_from("DNA").unwrap(),
            HashFunctions::murmur64_DNA
        );
        assert_eq!(
            HashFunctions::try_from("Protein").unwrap(),
            HashFunctions::murmur64_protein
        );
        assert_eq!(HashFunctions::murmur64_DNA.to_string(), "DNA");
        assert!(HashFunctions::try_from("rna").is_err());
    }
}
