use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    //object storage
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket_name: String,
    pub s3_public_url: String,
    //auth
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i32,
}

fn default_session_ttl_days() -> i32 {
    7
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default())
            .build()?;
        conf.try_deserialize()
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
