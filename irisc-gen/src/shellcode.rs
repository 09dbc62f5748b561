//! Generated test-vector records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// One generated test vector: the assembled code together with the
/// parameter assignment and label table that produced it.
///
/// Serialized as one JSON object per vector; `code` is hex-encoded.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shellcode {
    /// Assembled instruction stream, big-endian words.
    #[serde_as(as = "serde_with::hex::Hex")]
    pub code: Vec<u8>,

    /// Template parameters bound for this vector.
    pub parameters: BTreeMap<String, u64>,

    /// Labels resolved during assembly.
    pub labels: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_serializes_as_hex() {
        let record = Shellcode {
            code: vec![0xfc, 0x00, 0x00, 0x2d],
            parameters: BTreeMap::from([("funct".to_string(), 0x2d)]),
            labels: BTreeMap::from([("setup".to_string(), 0)]),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"fc00002d\""), "json was: {json}");

        let back: Shellcode = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
