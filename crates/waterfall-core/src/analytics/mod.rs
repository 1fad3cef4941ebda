pub mod analysis;
pub mod concentration;
pub mod scenario;

pub use analysis::{
    analyze_concentration, analyze_structure, analyze_structure_with, ConcentrationReport,
    StructureAnalysis, StructureAnalysisInput,
};
pub use concentration::{
    concentration, investor_rollup, ConcentrationSummary, InvestorAssignments, InvestorRollup,
    InvestorShare,
};
pub use scenario::{all_scenarios, analyze_scenarios, scenario_analytics, Scenario, ScenarioAnalytics};
