//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spfed_client::SubmissionState;

#[derive(Parser, Debug)]
#[command(name = "spfed", author, version, about = "SharePoint Online federated session client", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "SPFED_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the Cookie and X-RequestDigest headers for the configured site
    Auth {
        /// Ignore the cached session and sign in again
        #[arg(long)]
        force: bool,

        /// Print the headers as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Drop the cached session so the next command signs in again
    Logout,

    /// Post a submission file to the configured SharePoint list
    Post {
        /// JSON file with `uuid`, `data` and an optional `form` object
        file: PathBuf,

        /// Submission state the post is made for
        #[arg(long, default_value = "completed")]
        state: SubmissionState,

        /// Treat the form as asynchronous: credential errors fail the command
        #[arg(long)]
        ajax: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_post_defaults_to_completed() {
        let args = Args::try_parse_from(["spfed", "post", "submission.json"]).unwrap();
        let Command::Post { file, state, ajax } = args.command else {
            panic!("expected post");
        };
        assert_eq!(file, PathBuf::from("submission.json"));
        assert_eq!(state, SubmissionState::Completed);
        assert!(!ajax);
    }

    #[test]
    fn test_unknown_state_rejected() {
        assert!(Args::try_parse_from(["spfed", "post", "s.json", "--state", "archived"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["spfed", "auth", "--force", "--json-logs", "-c", "spfed.toml"]).unwrap();
        assert!(args.json_logs);
        assert_eq!(args.config, Some(PathBuf::from("spfed.toml")));
        assert!(matches!(args.command, Command::Auth { force: true, json: false }));
    }

    #[test]
    fn test_logout_takes_no_arguments() {
        let args = Args::try_parse_from(["spfed", "logout"]).unwrap();
        assert!(matches!(args.command, Command::Logout));
        assert!(Args::try_parse_from(["spfed", "logout", "extra"]).is_err());
    }
}
