//! Sweep parameter parsing and expansion.
//!
//! A sweep argument is `key=spec[,spec...]`. Each spec contributes one or
//! more values: a literal number, an inclusive `lo-hi` range, or one of
//! `rand8`/`rand16`/`rand32`/`rand64` for a fresh uniform value of that
//! width. Random values are drawn once, at parse time, so every vector of
//! a run sees the same assignment per combination.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::GenError;
use irisc_types::parse_number;

/// Parse one `key=spec[,spec...]` sweep argument into its value list.
pub fn parse_parameter(s: &str) -> Result<(String, Vec<u64>), GenError> {
    let (key, specs) = s
        .split_once('=')
        .ok_or_else(|| GenError::ParameterSyntax(s.to_string()))?;

    let mut values = Vec::new();
    for spec in specs.split(',') {
        match spec {
            "rand8" => values.push(rand::random::<u8>() as u64),
            "rand16" => values.push(rand::random::<u16>() as u64),
            "rand32" => values.push(rand::random::<u32>() as u64),
            "rand64" => values.push(rand::random::<u64>()),
            _ => {
                // `lo-hi` is a range; a leading `-` is a negative literal
                let range = spec
                    .split_once('-')
                    .filter(|(low, _)| !low.is_empty());
                if let Some((low, high)) = range {
                    values.extend(parse_number(low)?..=parse_number(high)?);
                } else {
                    values.push(parse_number(spec)?);
                }
            }
        }
    }

    Ok((key.to_string(), values))
}

/// Expand per-key value lists into every parameter assignment of their
/// cartesian product. An empty parameter list yields the single empty
/// assignment, so an unparameterized fixture still assembles once.
pub fn sweep(parameters: &[(String, Vec<u64>)]) -> Vec<BTreeMap<String, u64>> {
    if parameters.is_empty() {
        return vec![BTreeMap::new()];
    }

    parameters
        .iter()
        .map(|(key, values)| {
            values
                .iter()
                .map(|value| (key.clone(), *value))
                .collect::<Vec<_>>()
        })
        .multi_cartesian_product()
        .map(BTreeMap::from_iter)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_values_and_lists() {
        assert_eq!(
            parse_parameter("funct=0x2d").unwrap(),
            ("funct".to_string(), vec![0x2d])
        );
        assert_eq!(
            parse_parameter("cmpop=1,5,0x1f").unwrap(),
            ("cmpop".to_string(), vec![1, 5, 0x1f])
        );
    }

    #[test]
    fn inclusive_ranges() {
        assert_eq!(
            parse_parameter("jmpop=0-3").unwrap(),
            ("jmpop".to_string(), vec![0, 1, 2, 3])
        );
    }

    #[test]
    fn negative_literals_are_not_ranges() {
        assert_eq!(
            parse_parameter("imm=-1").unwrap(),
            ("imm".to_string(), vec![u64::MAX])
        );
    }

    #[test]
    fn random_values_fit_their_width() {
        let (_, values) = parse_parameter("x=rand8,rand16,rand32").unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[0] <= u8::MAX as u64);
        assert!(values[1] <= u16::MAX as u64);
        assert!(values[2] <= u32::MAX as u64);
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(matches!(
            parse_parameter("funct"),
            Err(GenError::ParameterSyntax(_))
        ));
    }

    #[test]
    fn cartesian_product_order_and_size() {
        let combos = sweep(&[
            ("funct".to_string(), vec![0, 4]),
            ("cmpop".to_string(), vec![1, 5]),
        ]);

        assert_eq!(combos.len(), 4);
        assert_eq!(combos[0].get("funct"), Some(&0));
        assert_eq!(combos[0].get("cmpop"), Some(&1));
        assert_eq!(combos[3].get("funct"), Some(&4));
        assert_eq!(combos[3].get("cmpop"), Some(&5));
    }

    #[test]
    fn empty_parameter_list_runs_once() {
        assert_eq!(sweep(&[]), vec![BTreeMap::new()]);
    }
}
