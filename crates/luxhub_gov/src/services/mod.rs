pub mod gov_api;
pub mod membership;
pub mod orchestrator;
