use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::synthesis::term::Term;
use crate::synthesis::{check_num_vars, SynthesisError};

/// Widest function [`minimize`] accepts.
pub const MAX_VARIABLES: usize = 8;

/// Finds the prime implicants of the function that is true exactly on `minterms`, using Quine-McCluskey
/// combination.
///
/// The result always covers every minterm and nothing else, but it is every prime implicant rather than a
/// smallest cover, so some terms may be redundant. It is sorted and free of duplicates.
pub fn minimize(num_vars: usize, minterms: &[usize]) -> Result<Vec<Term>, SynthesisError> {
    check_num_vars(num_vars)?;
    if let Some(&minterm) = minterms.iter().find(|minterm| **minterm >> num_vars != 0) {
        return Err(SynthesisError::MintermOutOfRange { minterm, num_vars });
    }

    let minterms: BTreeSet<usize> = minterms.iter().copied().collect();
    if minterms.is_empty() {
        debug!(num_vars, "constant false");
        return Ok(Vec::new());
    }
    if minterms.len() == 1 << num_vars {
        debug!(num_vars, "constant true");
        return Ok(vec![Term::tautology(num_vars)]);
    }

    let mut generation: BTreeSet<Term> = minterms.iter().map(|minterm| Term::from_minterm(num_vars, *minterm)).collect();
    let mut primes = BTreeSet::new();
    let mut round = 0;
    while !generation.is_empty() {
        let (next, unused) = combine_generation(generation);
        trace!(round, combined = next.len(), primes = unused.len(), "combined generation");
        primes.extend(unused);
        generation = next;
        round += 1;
    }

    debug!(num_vars, minterms = minterms.len(), primes = primes.len(), "minimized");
    Ok(primes.into_iter().collect())
}

// returns the next generation and the terms of this one that combined with nothing
fn combine_generation(generation: BTreeSet<Term>) -> (BTreeSet<Term>, Vec<Term>) {
    // only terms whose counts of ones differ by exactly one can differ in a single position
    let mut groups: BTreeMap<usize, Vec<(Term, bool)>> = BTreeMap::new();
    for term in generation {
        groups.entry(term.count_ones()).or_default().push((term, false));
    }

    let mut next = BTreeSet::new();
    let ones: Vec<usize> = groups.keys().copied().collect();
    for &low in &ones {
        if !groups.contains_key(&(low + 1)) {
            continue;
        }
        let (Some(mut lower), Some(mut upper)) = (groups.remove(&low), groups.remove(&(low + 1))) else { continue };
        for (a, a_used) in lower.iter_mut() {
            for (b, b_used) in upper.iter_mut() {
                if let Some(combined) = a.combine(b) {
                    *a_used = true;
                    *b_used = true;
                    next.insert(combined);
                }
            }
        }
        groups.insert(low, lower);
        groups.insert(low + 1, upper);
    }

    let unused = groups.into_values().flatten().filter(|(_, used)| !used).map(|(term, _)| term).collect();
    (next, unused)
}

#[cfg(test)]
mod test {
    use super::{minimize, MAX_VARIABLES};
    use crate::synthesis::term::{sum_covers, Term};
    use crate::synthesis::SynthesisError;

    fn strings(terms: &[Term]) -> Vec<String> {
        terms.iter().map(Term::to_string).collect()
    }

    #[test]
    fn xor() {
        assert_eq!(strings(&minimize(2, &[1, 2]).unwrap()), vec!["01", "10"]);
    }

    #[test]
    fn constant_false() {
        assert!(minimize(2, &[]).unwrap().is_empty());
    }

    #[test]
    fn constant_true() {
        assert_eq!(strings(&minimize(2, &[0, 1, 2, 3]).unwrap()), vec!["--"]);
        assert_eq!(strings(&minimize(3, &[7, 6, 5, 4, 3, 2, 1, 0, 0]).unwrap()), vec!["---"]);
    }

    #[test]
    fn single_variable() {
        assert_eq!(strings(&minimize(1, &[1]).unwrap()), vec!["1"]);
        assert_eq!(strings(&minimize(1, &[0]).unwrap()), vec!["0"]);
    }

    #[test]
    fn classic_four_variable_example() {
        // sum of m(4,8,10,11,12,15): 1-00 is covered by -100 and 10-0 but is still prime
        let terms = minimize(4, &[4, 8, 10, 11, 12, 15]).unwrap();
        assert_eq!(strings(&terms), vec!["-100", "1-00", "1-11", "10-0", "101-"]);
    }

    #[test]
    fn redundant_primes_are_kept() {
        // the consensus term -11 is prime but not needed
        let terms = minimize(3, &[1, 3, 6, 7]).unwrap();
        assert_eq!(strings(&terms), vec!["-11", "0-1", "11-"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        assert_eq!(minimize(3, &[5, 1, 7, 3]).unwrap(), minimize(3, &[1, 3, 5, 7, 7]).unwrap());
        assert_eq!(strings(&minimize(3, &[5, 1, 7, 3]).unwrap()), vec!["--1"]);
    }

    #[test]
    fn bad_arguments() {
        assert_eq!(minimize(0, &[]), Err(SynthesisError::NoVariables));
        assert_eq!(minimize(9, &[]), Err(SynthesisError::TooManyVariables { num_vars: 9, max: 8 }));
        assert_eq!(minimize(2, &[4]), Err(SynthesisError::MintermOutOfRange { minterm: 4, num_vars: 2 }));
    }

    #[test]
    fn largest_supported_width_finishes() {
        let minterms: Vec<usize> = (1..1 << MAX_VARIABLES).collect();
        let terms = minimize(MAX_VARIABLES, &minterms).unwrap();
        assert_eq!(terms.len(), MAX_VARIABLES);
        assert!(!sum_covers(&terms, 0));
        assert!((1..1 << MAX_VARIABLES).all(|minterm| sum_covers(&terms, minterm)));
    }

    #[test]
    fn equivalent_for_every_function_up_to_three_variables() {
        for num_vars in 1..=3usize {
            let rows = 1usize << num_vars;
            for function in 0..(1u32 << rows) {
                let minterms: Vec<usize> = (0..rows).filter(|m| (function >> *m) & 1 == 1).collect();
                let terms = minimize(num_vars, &minterms).unwrap();
                for assignment in 0..rows {
                    assert_eq!(sum_covers(&terms, assignment), minterms.contains(&assignment), "{num_vars} variables, minterms {minterms:?}, terms {terms:?}");
                }
                let mut sorted = terms.clone();
                sorted.sort();
                sorted.dedup();
                assert_eq!(sorted, terms);
            }
        }
    }
}
