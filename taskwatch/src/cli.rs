use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "taskwatch",
    version,
    about = "Watch a Notion task database and post changes to Discord"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Seconds between polls (overrides POLL_INTERVAL_SECS)
    #[arg(short, long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Snapshot file (overrides STATE_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Log directory (overrides LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll until interrupted (default)
    Run,
    /// Run a single poll cycle and exit
    Once,
    /// Print the property names and kinds of the first record
    Columns,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_and_overrides() {
        let args = Args::parse_from(["taskwatch", "--interval", "30", "--state", "s.json"]);
        assert_eq!(args.command, None);
        assert_eq!(args.interval, Some(30));
        assert_eq!(args.state, Some(PathBuf::from("s.json")));

        let args = Args::parse_from(["taskwatch", "once", "--log-dir", "/tmp/logs"]);
        assert_eq!(args.command, Some(Commands::Once));
        assert_eq!(args.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Args::try_parse_from(["taskwatch", "run", "--interval", "0"]).is_err());
    }
}
