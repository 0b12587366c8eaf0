use anyhow::bail;
use clap::Parser;

/// Address used when `LISTEN_ADDR` is unset or empty: port 50051 on all
/// interfaces.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";

/// Runtime configuration for the `users-tonic-server` binary.
///
/// Values are parsed from CLI arguments or environment variables. A `.env`
/// file in the working directory is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "users-tonic-server",
    version,
    about = "A gRPC service for user lookups and streaming help"
)]
pub struct CliArgs {
    /// TCP address to listen on, as `host:port`.
    ///
    /// When unset or empty the server listens on `0.0.0.0:50051`.
    ///
    /// Environment variable: `LISTEN_ADDR`
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Number of replies a `GetHelp` session may queue ahead of the client.
    ///
    /// The default of one keeps every session strictly lock-step: a request
    /// is not read until the previous reply has been taken by the transport.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 1)]
    pub stream_buffer_size: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub stream_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            stream_buffer_size: 1,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        let listen_addr = match args.listen_addr {
            Some(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => DEFAULT_LISTEN_ADDR.to_string(),
        };

        Ok(Self {
            listen_addr,
            stream_buffer_size: args.stream_buffer_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(listen_addr: Option<&str>, stream_buffer_size: usize) -> CliArgs {
        CliArgs {
            listen_addr: listen_addr.map(str::to_string),
            stream_buffer_size,
        }
    }

    #[test]
    fn missing_address_falls_back_to_default() -> anyhow::Result<()> {
        let config = ServerConfig::try_from(args(None, 1))?;
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        Ok(())
    }

    #[test]
    fn empty_address_falls_back_to_default() -> anyhow::Result<()> {
        let config = ServerConfig::try_from(args(Some("   "), 1))?;
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        Ok(())
    }

    #[test]
    fn explicit_address_is_kept() -> anyhow::Result<()> {
        let config = ServerConfig::try_from(args(Some("127.0.0.1:6000"), 4))?;
        assert_eq!(config.listen_addr, "127.0.0.1:6000");
        assert_eq!(config.stream_buffer_size, 4);
        Ok(())
    }

    #[test]
    fn zero_stream_buffer_is_rejected() {
        assert!(ServerConfig::try_from(args(None, 0)).is_err());
    }

    #[test]
    fn parses_cli_flags() -> anyhow::Result<()> {
        let args = CliArgs::try_parse_from([
            "users-tonic-server",
            "--listen-addr",
            "[::1]:7000",
            "--stream-buffer-size",
            "2",
        ])?;
        let config = ServerConfig::try_from(args)?;
        assert_eq!(config.listen_addr, "[::1]:7000");
        assert_eq!(config.stream_buffer_size, 2);
        Ok(())
    }
}
