use clap::{Args, ValueEnum};
use serde_json::Value;

use loancalc_core::amortization::{
    compute_amortization, quote_payment, AmortizationInput, EngineConfig, ScheduleStrategy,
};
use loancalc_core::input::LoanRequest;

use crate::input;
use crate::output::display;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Level annuity payment, residual folded into the final month
    Level,
    /// Equal slice of the remaining principal each month, declining payments
    Principal,
}

impl From<StrategyArg> for ScheduleStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Level => ScheduleStrategy::LevelPayment,
            StrategyArg::Principal => ScheduleStrategy::PrincipalAmortized,
        }
    }
}

/// Arguments shared by `amortize` and `payment`
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to a JSON file with integer loan terms
    #[arg(
        long,
        conflicts_with_all = ["amount", "rate", "years", "months", "first_payment_date"]
    )]
    pub input: Option<String>,

    /// Engine configuration file (.json, .yaml or .yml)
    #[arg(long)]
    pub config: Option<String>,

    /// Principal in major currency units, e.g. 25000.00
    #[arg(long)]
    pub amount: Option<String>,

    /// Annual interest rate in percent, e.g. 5.5
    #[arg(long)]
    pub rate: Option<String>,

    /// Term in whole years
    #[arg(long, conflicts_with = "months")]
    pub years: Option<String>,

    /// Term in months
    #[arg(long)]
    pub months: Option<String>,

    /// Schedule strategy (overrides the config file)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Date of the first payment, YYYY-MM-DD
    #[arg(long)]
    pub first_payment_date: Option<String>,
}

pub fn run_amortize(
    args: AmortizeArgs,
    format: &OutputFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let amortization_input = build_input(args)?;
    let denomination = amortization_input.config.minor_units_per_major;
    let output = compute_amortization(&amortization_input)?;

    match format {
        OutputFormat::Json => Ok(serde_json::to_value(output)?),
        _ => Ok(serde_json::to_value(display::loan_envelope(&output, denomination))?),
    }
}

pub fn run_payment(
    args: AmortizeArgs,
    format: &OutputFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let amortization_input = build_input(args)?;
    let denomination = amortization_input.config.minor_units_per_major;
    let output = quote_payment(&amortization_input)?;

    match format {
        OutputFormat::Json => Ok(serde_json::to_value(output)?),
        _ => Ok(serde_json::to_value(display::summary_envelope(&output, denomination))?),
    }
}

fn build_input(args: AmortizeArgs) -> Result<AmortizationInput, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => input::file::read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }

    let mut amortization_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.amount.is_none() {
        match input::stdin::read_stdin::<AmortizationInput>()? {
            Some(parsed) => {
                let ignored = ignored_term_flags(&args);
                if !ignored.is_empty() {
                    tracing::warn!(
                        flags = %ignored.join(", "),
                        "loan terms read from stdin; term flags ignored"
                    );
                }
                parsed
            }
            None => {
                return Err("--amount, --rate and --years (or --input <file.json> / stdin) are required".into())
            }
        }
    } else {
        let request = LoanRequest {
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years,
            months: args.months,
            first_payment_date: args.first_payment_date,
        };
        let loan = request.to_loan_input(&config)?;
        AmortizationInput {
            loan,
            config: config.clone(),
        }
    };

    // Flags and --config win over a config embedded in the input document.
    if args.config.is_some() || args.strategy.is_some() {
        amortization_input.config = config;
    }
    tracing::debug!(
        principal = amortization_input.loan.principal_minor_units,
        rate = amortization_input.loan.annual_rate_scaled,
        term = amortization_input.loan.term_months,
        strategy = %amortization_input.config.strategy,
        "loan terms resolved"
    );
    Ok(amortization_input)
}

/// Loan-term flags given alongside a piped stdin document.
fn ignored_term_flags(args: &AmortizeArgs) -> Vec<&'static str> {
    [
        ("--rate", args.rate.is_some()),
        ("--years", args.years.is_some()),
        ("--months", args.months.is_some()),
        ("--first-payment-date", args.first_payment_date.is_some()),
    ]
    .into_iter()
    .filter_map(|(flag, given)| given.then_some(flag))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AmortizeArgs,
    }

    #[test]
    fn test_input_file_conflicts_with_term_flags() {
        for flag in ["--amount", "--rate", "--years", "--months", "--first-payment-date"] {
            let parsed = Harness::try_parse_from(["loancalc", "--input", "loan.json", flag, "1"]);
            assert!(parsed.is_err(), "{flag} accepted alongside --input");
        }
    }

    #[test]
    fn test_input_file_alone_parses() {
        let parsed = Harness::try_parse_from(["loancalc", "--input", "loan.json", "--strategy", "principal"])
            .unwrap();
        assert_eq!(parsed.args.input.as_deref(), Some("loan.json"));
        assert!(parsed.args.amount.is_none());
    }

    #[test]
    fn test_ignored_term_flags_lists_given_flags() {
        let parsed = Harness::try_parse_from(["loancalc", "--rate", "5.5", "--months", "60"]).unwrap();
        assert_eq!(ignored_term_flags(&parsed.args), vec!["--rate", "--months"]);

        let bare = Harness::try_parse_from(["loancalc"]).unwrap();
        assert!(ignored_term_flags(&bare.args).is_empty());
    }
}
