pub mod browse;
pub mod cli;
pub mod logging;
pub mod paths;
pub mod selection;
pub mod session;
pub mod store;
