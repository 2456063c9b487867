// the first value of every returned vector is the most significant bit of the assignment index
pub fn enumerate_inputs(arity: usize) -> Vec<Vec<bool>> {
    let mut inputs = vec![vec![]];
    for _ in 0..arity {
        let mut inputs_false = inputs.clone();
        let mut inputs_true = inputs;

        inputs_false.iter_mut().for_each(|i| i.insert(0, false));
        inputs_true.iter_mut().for_each(|i| i.insert(0, true));

        inputs = inputs_false;
        inputs.extend(inputs_true);
    }
    inputs
}

pub fn assignment_bits(arity: usize, assignment: usize) -> Vec<bool> {
    (0..arity).map(|var| (assignment >> (arity - 1 - var)) & 1 == 1).collect()
}

#[cfg(test)]
mod test {
    #[test]
    fn enumerate_inputs() {
        assert_eq!(super::enumerate_inputs(0), vec![Vec::<bool>::new()]);
        assert_eq!(super::enumerate_inputs(2), vec![vec![false, false], vec![false, true], vec![true, false], vec![true, true]]);
        assert_eq!(
            super::enumerate_inputs(3),
            vec![
                vec![false, false, false],
                vec![false, false, true],
                vec![false, true, false],
                vec![false, true, true],
                vec![true, false, false],
                vec![true, false, true],
                vec![true, true, false],
                vec![true, true, true]
            ]
        );
    }

    #[test]
    fn assignment_bits_match_enumeration_order() {
        for arity in 1..=4 {
            for (assignment, bits) in super::enumerate_inputs(arity).into_iter().enumerate() {
                assert_eq!(super::assignment_bits(arity, assignment), bits);
            }
        }
    }
}
