pub mod analyze;
pub mod make_monorepo;
pub mod report;
pub mod reset;
pub mod version;
