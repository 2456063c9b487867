//! Logic circuits: settling a network of gates to a stable state, and turning a truth table into a minimized
//! sum of products and then into gates.

pub mod config;
pub mod export;
pub mod import;
pub mod simulation;
pub mod synthesis;
pub mod utils;

pub use config::Config;
pub use simulation::logic::{stabilize, Settle};
pub use simulation::{Circuit, Connection, ConnectionKey, Element, ElementKey, ElementKind, Simulation};
pub use synthesis::{minimize, render_equation, synthesize, Term, TruthTable};
