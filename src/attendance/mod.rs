pub mod biometric;
pub mod error;
pub mod ledger;
pub mod location;
#[cfg(test)]
pub mod memory;
pub mod mysql_store;
pub mod recap;
pub mod store;
