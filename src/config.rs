//! Command line configuration for the server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::PaginationConfig;

/// The web server for Finboard.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// File path to the application SQLite database.
    #[arg(long)]
    pub db_path: String,

    /// The address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The canonical name of the timezone used for "today", e.g. "Pacific/Auckland".
    #[arg(long, env = "FINBOARD_TIMEZONE", default_value = "Etc/UTC")]
    pub timezone: String,

    /// The secret the cookie encryption key is derived from.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: String,

    /// The number of rows shown on each page of a table.
    #[arg(long, default_value_t = PaginationConfig::default().page_size)]
    pub page_size: u64,
}

impl ServerConfig {
    /// The address and port to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// The table paging settings, with a page size of at least one.
    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig {
            page_size: self.page_size.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use clap::Parser;

    use super::ServerConfig;

    #[test]
    fn uses_defaults() {
        let config =
            ServerConfig::try_parse_from(["server", "--db-path", "app.db", "--secret", "shh"])
                .unwrap();

        assert_eq!(config.db_path, "app.db");
        assert_eq!(config.socket_addr(), SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.pagination_config().page_size, 10);
        // The timezone default may be overridden by the environment.
        assert!(!config.timezone.is_empty());
    }

    #[test]
    fn reads_all_flags() {
        let config = ServerConfig::try_parse_from([
            "server",
            "--db-path",
            "app.db",
            "--address",
            "0.0.0.0",
            "--port",
            "8080",
            "--timezone",
            "Pacific/Auckland",
            "--secret",
            "shh",
            "--page-size",
            "25",
        ])
        .unwrap();

        assert_eq!(config.socket_addr(), SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.timezone, "Pacific/Auckland");
        assert_eq!(config.secret, "shh");
        assert_eq!(config.pagination_config().page_size, 25);
    }

    #[test]
    fn requires_db_path() {
        assert!(ServerConfig::try_parse_from(["server", "--secret", "shh"]).is_err());
    }
}
