pub mod agent;
pub mod session;
