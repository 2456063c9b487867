use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use logicsynth::simulation::location::Position;
use logicsynth::synthesis::{self, variable_names, TruthTable};
use logicsynth::{import, Config, ElementKind, Simulation};

#[derive(Parser, Debug)]
#[command(name = "logicsynth")]
#[command(author, version, about = "Minimize truth tables, synthesize them into gates, and simulate saved circuits", long_about = None)]
struct Cli {
    /// Maximum propagation rounds before giving up on a circuit settling
    #[arg(long, global = true, default_value_t = Config::DEFAULT.max_propagation_rounds, value_name = "ROUNDS")]
    max_rounds: usize,

    /// Largest number of inputs a gate may be given
    #[arg(long, global = true, default_value_t = Config::DEFAULT.max_gate_inputs, value_name = "INPUTS")]
    max_gate_inputs: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the prime implicants and equation of a function
    Minimize {
        #[arg(short, long, value_name = "N")]
        vars: usize,
        /// Input assignments (A most significant) for which the function is true
        minterms: Vec<usize>,
    },
    /// Build a gate circuit for a function, check it, and optionally save it
    Synthesize {
        #[arg(short, long, value_name = "N")]
        vars: usize,
        minterms: Vec<usize>,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Load a saved circuit, apply inputs and clock ticks, and print every output
    Simulate {
        file: PathBuf,
        /// Set the INPUT labelled LABEL, e.g. --set A=1
        #[arg(long = "set", value_name = "LABEL=0|1")]
        settings: Vec<String>,
        #[arg(long, default_value_t = 0)]
        ticks: usize,
        /// Write the settled circuit back to FILE
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = Config::DEFAULT.with_max_propagation_rounds(cli.max_rounds).with_max_gate_inputs(cli.max_gate_inputs);

    match cli.command {
        Command::Minimize { vars, minterms } => {
            let terms = synthesis::minimize(vars, &minterms)?;
            for term in &terms {
                println!("{}", term);
            }
            println!("F = {}", synthesis::render_equation(&terms, &variable_names(vars)));
        }
        Command::Synthesize { vars, minterms, output } => {
            let table = TruthTable::from_minterms(vars, &minterms)?;
            let mut simulation = Simulation::new(config);
            let placed = simulation.place_truth_table(&table, Position::default())?;

            let measured = TruthTable::measure(&simulation.circuit, &placed.inputs, placed.output, simulation.config.max_propagation_rounds)?;
            print_table(&measured);
            if measured != table {
                bail!("synthesized circuit does not reproduce the truth table");
            }

            let terms = synthesis::minimize(vars, &minterms)?;
            println!("F = {}", synthesis::render_equation(&terms, &variable_names(vars)));
            println!("{} elements, {} connections", simulation.circuit.num_elements(), simulation.circuit.num_connections());

            if let Some(output) = output {
                std::fs::write(&output, simulation.save()).with_context(|| format!("could not write {}", output.display()))?;
            }
        }
        Command::Simulate { file, settings, ticks, write } => {
            let document = import::import(&file.to_string_lossy(), &config).with_context(|| format!("could not load {}", file.display()))?;
            let mut simulation = Simulation::from_document(document, config);

            for setting in &settings {
                let Some((label, value)) = setting.split_once('=') else { bail!("expected LABEL=0|1, got {:?}", setting) };
                let value = match value {
                    "0" => false,
                    "1" => true,
                    _ => bail!("input value must be 0 or 1, got {:?}", value),
                };
                let key = simulation.circuit.find_by_label(label).with_context(|| format!("no element labelled {:?}", label))?;
                simulation.set_input(key, value)?;
            }
            for _ in 0..ticks {
                let settle = simulation.tick_clocks();
                if !settle.settled {
                    eprintln!("circuit did not settle within {} rounds", simulation.config.max_propagation_rounds);
                }
            }

            for key in simulation.circuit.elements_of_kind(ElementKind::Output) {
                if let Some(element) = simulation.circuit.element(key) {
                    println!("{} = {}", if element.label.is_empty() { "?" } else { &element.label }, u8::from(element.output));
                }
            }

            if write {
                std::fs::write(&file, simulation.save()).with_context(|| format!("could not write {}", file.display()))?;
            }
        }
    }

    Ok(())
}

fn print_table(table: &TruthTable) {
    let names = variable_names(table.num_vars());
    println!("{} | F", names.join(" "));
    for (assignment, output) in table.outputs().iter().enumerate() {
        let bits: Vec<String> = logicsynth::utils::assignment_bits(table.num_vars(), assignment).into_iter().map(|bit| u8::from(bit).to_string()).collect();
        println!("{} | {}", bits.join(" "), u8::from(*output));
    }
}
