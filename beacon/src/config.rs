use serde_derive::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6666;

#[derive(Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub base_port: u16,
}

#[derive(Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: Server,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            server: Server {
                host: DEFAULT_HOST.to_string(),
                base_port: DEFAULT_PORT,
            },
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> ServerConfig {
        serdeconv::from_toml_file(path).expect("Error loading server configuration file")
    }
}
