#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Upper bound on propagation rounds per stabilization. Feedback loops that never settle stop here.
    pub max_propagation_rounds: usize,

    pub min_gate_inputs: usize,
    pub max_gate_inputs: usize,

    pub layout_column_spacing: f32,
    pub layout_row_spacing: f32,
    pub layout_row_gap: f32,
}

impl Config {
    pub const DEFAULT: Config = Config {
        max_propagation_rounds: 20,

        min_gate_inputs: 2,
        max_gate_inputs: 8,

        layout_column_spacing: 120.0,
        layout_row_spacing: 100.0,
        layout_row_gap: 20.0,
    };

    pub fn with_max_propagation_rounds(self, max_propagation_rounds: usize) -> Self {
        Self { max_propagation_rounds, ..self }
    }

    pub fn with_max_gate_inputs(self, max_gate_inputs: usize) -> Self {
        Self { max_gate_inputs: max_gate_inputs.max(self.min_gate_inputs), ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
