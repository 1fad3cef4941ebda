use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use waterfall_core::datasets::{self, LoanKind, PortfolioSummaryInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Consumer,
    Corporate,
    Mortgage,
}

impl From<KindArg> for LoanKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Consumer => LoanKind::Consumer,
            KindArg::Corporate => LoanKind::Corporate,
            KindArg::Mortgage => LoanKind::Mortgage,
        }
    }
}

/// Arguments for portfolio summary. Flags override the input's filter.
#[derive(Args)]
pub struct SummarizeArgs {
    /// Path to JSON input file ({ records, filter? })
    #[arg(long)]
    pub input: Option<String>,

    /// Only records of this product family
    #[arg(long)]
    pub kind: Option<KindArg>,

    /// Minimum opening balance
    #[arg(long)]
    pub min_balance: Option<Decimal>,

    /// Maximum opening balance
    #[arg(long)]
    pub max_balance: Option<Decimal>,

    /// Only records above the high-risk PD threshold
    #[arg(long)]
    pub high_risk_only: bool,
}

pub fn run_summarize(args: SummarizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut summary_input: PortfolioSummaryInput =
        input::read_input(args.input.as_deref(), "portfolio summary")?;
    apply_overrides(&args, &mut summary_input);
    let result = datasets::summarize_portfolio(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_overrides(args: &SummarizeArgs, summary_input: &mut PortfolioSummaryInput) {
    let filter = &mut summary_input.filter;
    if let Some(kind) = args.kind {
        filter.kind = Some(kind.into());
    }
    if args.min_balance.is_some() {
        filter.min_balance = args.min_balance;
    }
    if args.max_balance.is_some() {
        filter.max_balance = args.max_balance;
    }
    if args.high_risk_only {
        filter.high_risk_only = true;
    }
}
