use std::fmt::{self, Display, Formatter};

use clap::{Parser, ValueEnum};
use reliability_core::{reliability, Element, Processor, Scheme, StateVector, Strategy, TransitionUnit};
use smallvec::smallvec;

/// Computes sp/sq and the per-element failure breakdown for the canonical 4P/8E
/// redundant scheme, via either the exhaustive or the greedy reconfiguration engine.
#[derive(Debug, Parser)]
#[command(name = "reliability")]
struct Opt {
    /// Reconfiguration strategy to use.
    #[arg(long, value_enum, default_value_t = StrategyArg::Exhaustive)]
    strategy: StrategyArg,

    /// Logging level: one of "error", "warn", "info", "debug", "trace".
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Exhaustive,
    Greedy,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Exhaustive => Strategy::Exhaustive,
            StrategyArg::Greedy => Strategy::Greedy,
        }
    }
}

/// The 4-processor, 8-element scheme used throughout the design doc's canonical
/// scenario: two processors cross-cover each other (p1/p2), and two more
/// (p3/p4) share a pair of equivalent recovery plans into p1/p2.
fn canonical_scheme(strategy: Strategy) -> Scheme<impl Fn(&StateVector) -> bool> {
    let elements = vec![
        Element::new("p1", 0.9),
        Element::new("p2", 0.9),
        Element::new("p3", 0.9),
        Element::new("p4", 0.9),
        Element::new("c1", 0.8),
        Element::new("d1", 0.8),
        Element::new("d2", 0.8),
        Element::new("c2", 0.8),
    ];

    let processors = vec![
        Processor::new(
            40.0,
            100.0,
            vec![
                smallvec![TransitionUnit::new(1, 40.0)],
                smallvec![
                    TransitionUnit::new(1, 20.0),
                    TransitionUnit::new(2, 10.0),
                    TransitionUnit::new(3, 10.0),
                ],
            ],
        ),
        Processor::new(
            20.0,
            100.0,
            vec![
                smallvec![TransitionUnit::new(0, 20.0)],
                smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(2, 10.0)],
                smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(3, 10.0)],
            ],
        ),
        Processor::new(
            30.0,
            50.0,
            vec![
                smallvec![TransitionUnit::new(0, 20.0), TransitionUnit::new(1, 10.0)],
                smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(1, 20.0)],
            ],
        ),
        Processor::new(
            30.0,
            50.0,
            vec![
                smallvec![TransitionUnit::new(0, 20.0), TransitionUnit::new(1, 10.0)],
                smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(1, 20.0)],
            ],
        ),
    ];

    let scheme_function = |sv: &StateVector| {
        let s = sv.all();
        s[0] && s[1] && (s[2] || s[3]) && s[4] && (s[5] || s[6]) && s[7]
    };

    Scheme::new(elements, processors, strategy, scheme_function).expect("canonical scheme is well-formed")
}

struct Report<'a> {
    element_names: &'a [&'a str],
    summary: reliability_core::ReliabilitySummary,
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "sp = {:.6}", self.summary.sp)?;
        writeln!(f, "sq = {:.6}", self.summary.sq)?;
        writeln!(f, "fail_prob_per_element:")?;
        for (name, prob) in self.element_names.iter().zip(&self.summary.fail_prob_per_element) {
            writeln!(f, "  {name}\t{prob:.6}")?;
        }
        if let Some(warning) = &self.summary.numeric_warning {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

fn main() {
    let opt = Opt::parse();

    let subscriber = tracing_subscriber::fmt().with_max_level(opt.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("no global subscriber installed yet");

    let strategy: Strategy = opt.strategy.into();
    let scheme = canonical_scheme(strategy);
    let summary = reliability(&scheme);

    let element_names = ["p1", "p2", "p3", "p4", "c1", "d1", "d2", "c2"];
    println!(
        "{}",
        Report {
            element_names: &element_names,
            summary,
        }
    );
}
