use crate::synthesis::term::Term;

pub const FALSE_EQUATION: &str = "0 (False)";
pub const TRUE_EQUATION: &str = "1 (True)";

/// `A` through `Z`, then `X26`, `X27` and so on.
pub fn variable_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("X{index}"),
    }
}

pub fn variable_names(num_vars: usize) -> Vec<String> {
    (0..num_vars).map(variable_name).collect()
}

/// Renders one product, e.g. `AB'`. Variables without a name in `names` fall back to [`variable_name`].
pub fn render_term<S: AsRef<str>>(term: &Term, names: &[S]) -> String {
    if term.is_tautology() {
        return "1".to_string();
    }

    let mut rendered = String::new();
    for (var, positive) in term.literals() {
        match names.get(var) {
            Some(name) => rendered.push_str(name.as_ref()),
            None => rendered.push_str(&variable_name(var)),
        }
        if !positive {
            rendered.push('\'');
        }
    }
    rendered
}

pub fn render_equation<S: AsRef<str>>(terms: &[Term], names: &[S]) -> String {
    if terms.is_empty() {
        return FALSE_EQUATION.to_string();
    }
    if terms.iter().any(Term::is_tautology) {
        return TRUE_EQUATION.to_string();
    }
    terms.iter().map(|term| render_term(term, names)).collect::<Vec<_>>().join(" + ")
}
