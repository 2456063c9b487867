use std::fmt;
use std::str::FromStr;

use crate::synthesis::SynthesisError;

/// One position of a [`Term`]. Ordered like the characters they print as (`-` < `0` < `1`).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Bit {
    DontCare,
    Zero,
    One,
}

/// A product of literals over a fixed number of variables, position 0 being variable A.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Term(Vec<Bit>);

impl Bit {
    pub fn as_char(self) -> char {
        match self {
            Bit::DontCare => '-',
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }

    pub fn from_char(c: char) -> Option<Bit> {
        match c {
            '-' => Some(Bit::DontCare),
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        }
    }
}

impl Term {
    pub fn new(bits: Vec<Bit>) -> Self {
        Self(bits)
    }

    // the first variable is the most significant bit of the minterm
    pub fn from_minterm(num_vars: usize, minterm: usize) -> Self {
        Self((0..num_vars).map(|var| if (minterm >> (num_vars - 1 - var)) & 1 == 1 { Bit::One } else { Bit::Zero }).collect())
    }

    pub fn tautology(num_vars: usize) -> Self {
        Self(vec![Bit::DontCare; num_vars])
    }

    pub fn bits(&self) -> &[Bit] {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn is_tautology(&self) -> bool {
        self.0.iter().all(|bit| *bit == Bit::DontCare)
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|bit| **bit == Bit::One).count()
    }

    /// `(variable, positive)` for every position that is not a don't-care.
    pub fn literals(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.0.iter().enumerate().filter_map(|(var, bit)| match bit {
            Bit::DontCare => None,
            Bit::Zero => Some((var, false)),
            Bit::One => Some((var, true)),
        })
    }

    /// Merges two terms that differ in exactly one position, neither of them a don't-care there.
    pub fn combine(&self, other: &Term) -> Option<Term> {
        if self.width() != other.width() {
            return None;
        }

        let mut differing = self.0.iter().zip(&other.0).enumerate().filter(|(_, (a, b))| a != b);
        let (position, (a, b)) = differing.next()?;
        if differing.next().is_some() || *a == Bit::DontCare || *b == Bit::DontCare {
            return None;
        }

        let mut bits = self.0.clone();
        bits[position] = Bit::DontCare;
        Some(Term(bits))
    }

    pub fn covers(&self, minterm: usize) -> bool {
        let width = self.width();
        self.literals().all(|(var, positive)| ((minterm >> (width - 1 - var)) & 1 == 1) == positive)
    }
}

/// Whether the sum of `terms` is true for `minterm`.
pub fn sum_covers(terms: &[Term], minterm: usize) -> bool {
    terms.iter().any(|term| term.covers(minterm))
}

impl FromStr for Term {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().map(|c| Bit::from_char(c).ok_or(SynthesisError::InvalidTermCharacter(c))).collect::<Result<Vec<_>, _>>().map(Term)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|bit| write!(f, "{}", bit.as_char()))
    }
}

#[cfg(test)]
mod test {
    use super::{sum_covers, Bit, Term};
    use crate::synthesis::SynthesisError;

    fn t(s: &str) -> Term {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(t("01-"), Term::new(vec![Bit::Zero, Bit::One, Bit::DontCare]));
        assert_eq!(t("01-").to_string(), "01-");
        assert_eq!("0x1".parse::<Term>(), Err(SynthesisError::InvalidTermCharacter('x')));
    }

    #[test]
    fn from_minterm_is_msb_first() {
        assert_eq!(Term::from_minterm(2, 1).to_string(), "01");
        assert_eq!(Term::from_minterm(2, 2).to_string(), "10");
        assert_eq!(Term::from_minterm(4, 11).to_string(), "1011");
    }

    #[test]
    fn ordering_follows_characters() {
        let mut terms = vec![t("1-"), t("01"), t("-0"), t("00")];
        terms.sort();
        let printed: Vec<_> = terms.iter().map(Term::to_string).collect();
        assert_eq!(printed, vec!["-0", "00", "01", "1-"]);
    }

    #[test]
    fn combine() {
        assert_eq!(t("010").combine(&t("011")), Some(t("01-")));
        assert_eq!(t("0-1").combine(&t("1-1")), Some(t("--1")));
        assert_eq!(t("010").combine(&t("001")), None);
        assert_eq!(t("01-").combine(&t("010")), None);
        assert_eq!(t("01").combine(&t("01")), None);
        assert_eq!(t("01").combine(&t("011")), None);
    }

    #[test]
    fn covers() {
        let term = t("1-0");
        let covered: Vec<_> = (0..8).filter(|m| term.covers(*m)).collect();
        assert_eq!(covered, vec![4, 6]);
        assert!((0..8).all(|m| t("---").covers(m)));
        assert!(sum_covers(&[t("00-"), t("11-")], 7));
        assert!(!sum_covers(&[], 0));
    }

    #[test]
    fn literals() {
        assert_eq!(t("1-0").literals().collect::<Vec<_>>(), vec![(0, true), (2, false)]);
        assert!(t("--").is_tautology());
        assert_eq!(t("1-1").count_ones(), 2);
    }
}
