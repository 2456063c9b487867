use crate::simulation::{logic, Circuit, EditError, ElementKey};
use crate::synthesis::term::{sum_covers, Term};
use crate::synthesis::{check_num_vars, SynthesisError};
use crate::utils::enumerate_inputs;

/// One output column over every assignment of `num_vars` inputs, row `i` being the assignment whose bits (A most
/// significant) spell `i`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TruthTable {
    num_vars: usize,
    outputs: Vec<bool>,
}

impl TruthTable {
    pub fn from_minterms(num_vars: usize, minterms: &[usize]) -> Result<Self, SynthesisError> {
        check_num_vars(num_vars)?;
        let mut outputs = vec![false; 1 << num_vars];
        for &minterm in minterms {
            *outputs.get_mut(minterm).ok_or(SynthesisError::MintermOutOfRange { minterm, num_vars })? = true;
        }
        Ok(Self { num_vars, outputs })
    }

    pub fn from_outputs(outputs: Vec<bool>) -> Result<Self, SynthesisError> {
        if outputs.len() < 2 || !outputs.len().is_power_of_two() {
            return Err(SynthesisError::BadTruthTableLength(outputs.len()));
        }
        let num_vars = outputs.len().trailing_zeros() as usize;
        check_num_vars(num_vars)?;
        Ok(Self { num_vars, outputs })
    }

    pub fn from_terms(num_vars: usize, terms: &[Term]) -> Result<Self, SynthesisError> {
        check_num_vars(num_vars)?;
        Ok(Self { num_vars, outputs: (0..1 << num_vars).map(|assignment| sum_covers(terms, assignment)).collect() })
    }

    /// Drives `inputs` (A first) through every assignment and records what `output` settles to.
    ///
    /// Works on a copy; `circuit` itself is left as it was.
    pub fn measure(circuit: &Circuit, inputs: &[ElementKey], output: ElementKey, max_rounds: usize) -> Result<Self, EditError> {
        let mut circuit = circuit.clone();
        circuit.element(output).ok_or(EditError::NoSuchElement(output))?;

        let mut outputs = Vec::with_capacity(1 << inputs.len());
        for assignment in enumerate_inputs(inputs.len()) {
            for (input, value) in inputs.iter().zip(assignment) {
                circuit.set_input(*input, value)?;
            }
            logic::update(&mut circuit, max_rounds);
            outputs.push(circuit.element(output).is_some_and(|element| element.output));
        }
        Ok(Self { num_vars: inputs.len(), outputs })
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn outputs(&self) -> &[bool] {
        &self.outputs
    }

    pub fn output(&self, assignment: usize) -> Option<bool> {
        self.outputs.get(assignment).copied()
    }

    pub fn minterms(&self) -> Vec<usize> {
        self.outputs.iter().enumerate().filter(|(_, output)| **output).map(|(assignment, _)| assignment).collect()
    }
}

#[cfg(test)]
mod test {
    use super::TruthTable;
    use crate::simulation::location::Position;
    use crate::simulation::{Circuit, EditError, ElementKind};
    use crate::synthesis::SynthesisError;

    #[test]
    fn minterms_round_trip() {
        let table = TruthTable::from_minterms(3, &[6, 1, 1]).unwrap();
        assert_eq!(table.minterms(), vec![1, 6]);
        assert_eq!(table.output(6), Some(true));
        assert_eq!(table.output(8), None);
        assert_eq!(TruthTable::from_minterms(2, &[4]), Err(SynthesisError::MintermOutOfRange { minterm: 4, num_vars: 2 }));
    }

    #[test]
    fn from_outputs() {
        let table = TruthTable::from_outputs(vec![false, true, true, false]).unwrap();
        assert_eq!(table.num_vars(), 2);
        assert_eq!(table.minterms(), vec![1, 2]);
        assert_eq!(TruthTable::from_outputs(vec![true; 3]), Err(SynthesisError::BadTruthTableLength(3)));
        assert_eq!(TruthTable::from_outputs(vec![true]), Err(SynthesisError::BadTruthTableLength(1)));
    }

    #[test]
    fn from_terms() {
        let terms = vec!["1-".parse().unwrap()];
        assert_eq!(TruthTable::from_terms(2, &terms).unwrap().outputs(), &[false, false, true, true]);
    }

    #[test]
    fn measure_nand() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Input, Position::default());
        let b = circuit.add_element(ElementKind::Input, Position::default());
        let nand = circuit.add_element(ElementKind::Nand, Position::default());
        let out = circuit.add_element(ElementKind::Output, Position::default());
        circuit.connect(a, nand, 0).unwrap();
        circuit.connect(b, nand, 1).unwrap();
        circuit.connect(nand, out, 0).unwrap();

        let table = TruthTable::measure(&circuit, &[a, b], out, 20).unwrap();

        assert_eq!(table.outputs(), &[true, true, true, false]);
        assert!(!circuit.element(a).unwrap().output);
    }

    #[test]
    fn measure_rejects_non_inputs() {
        let mut circuit = Circuit::new();
        let not = circuit.add_element(ElementKind::Not, Position::default());
        assert_eq!(TruthTable::measure(&circuit, &[not], not, 20), Err(EditError::NotAnInput(ElementKind::Not)));
    }
}
