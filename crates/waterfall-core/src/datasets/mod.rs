pub mod cache;
pub mod provider;
pub mod records;

pub use cache::DatasetCache;
pub use provider::{AggregateProvider, CachedAggregateProvider, InMemoryAggregateProvider};
pub use records::{
    summarize_portfolio, summarize_records, AggregateFilter, LoanKind, LoanRecord,
    PortfolioSummaryInput, HIGH_RISK_PD_THRESHOLD,
};
