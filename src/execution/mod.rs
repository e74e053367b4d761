pub mod risk_manager;
pub mod scan_loop;
pub mod strategy;
