use clap::{Parser, Subcommand};

/// Loads event logs into the listening history tables and answers the lookups they serve.
///
/// Configuration is read from `configuration/` and `APP_` prefixed environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Defaults to `load` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Load)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rebuild the canonical artifact and reload every table.
    Load,
    /// Query tables loaded by a previous run.
    #[command(subcommand)]
    Query(QueryCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Song played at a given step of a session.
    Session {
        #[arg(long, allow_negative_numbers = true)]
        session_id: i32,
        #[arg(long, allow_negative_numbers = true)]
        item_in_session: i32,
    },
    /// Songs a user played in a session, in play order.
    User {
        #[arg(long, allow_negative_numbers = true)]
        user_id: i32,
        #[arg(long, allow_negative_numbers = true)]
        session_id: i32,
    },
    /// Users who listened to a song.
    Song {
        #[arg(long)]
        song: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn load_is_the_default_command() {
        let cli = Cli::try_parse_from(["etl-loader"]).unwrap();
        assert_eq!(cli.into_command(), Command::Load);
    }

    #[test]
    fn parses_user_session_query() {
        let cli = Cli::try_parse_from([
            "etl-loader",
            "query",
            "user",
            "--user-id",
            "10",
            "--session-id",
            "182",
        ])
        .unwrap();

        assert_eq!(
            cli.into_command(),
            Command::Query(QueryCommand::User {
                user_id: 10,
                session_id: 182
            })
        );
    }

    #[test]
    fn rejects_non_numeric_session_id() {
        let result = Cli::try_parse_from([
            "etl-loader",
            "query",
            "session",
            "--session-id",
            "abc",
            "--item-in-session",
            "4",
        ]);
        assert!(result.is_err());
    }
}
