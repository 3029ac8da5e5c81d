pub mod aws;
pub mod digest;
pub mod mysql;
pub mod runner;
pub mod secrets;
pub mod staleness;
pub mod store;

pub use mysql::{MySqlConnector, MySqlCronStats};
pub use runner::{AlertDelivery, CheckOutcome, Monitor, RunReport};
pub use secrets::{CredentialProvider, SecretCache, SecretsManagerProvider};
pub use store::{CronStatsDigestRow, CronStatsRow, CronStatsSource, StoreConnector};
