pub mod aggregate;

pub use aggregate::PortfolioAggregate;
