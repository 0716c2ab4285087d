pub mod doctor;
pub mod draft;
pub mod onboard;
pub mod orchestrator;
pub mod serve;
