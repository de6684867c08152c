//! The `seed` command: confirm, then replace a table with a CSV file.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::columns::ColumnSpec;
use crate::config::SeedConfig;
use crate::db::{SeedError, SeedResult, Seeder};
use crate::source::PrepareError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No source file given and `source_file` is not configured")]
    MissingSource,
    #[error("The column `{column}` does not exist in {}", .path.display())]
    HeaderValidation { column: String, path: PathBuf },
    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Arguments accepted by the command.
#[derive(Debug, Clone, Default)]
pub struct SeedArgs {
    /// CSV file; falls back to `source_file` from the config.
    pub source: Option<PathBuf>,
    /// Comma-separated list of columns to import.
    pub columns: Option<String>,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user declined the confirmation prompt.
    Cancelled,
    Seeded(SeedResult),
}

/// Yes/no confirmation before destructive work.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Confirms without asking (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

/// Asks on `output` and reads the answer from `input`.
///
/// Only `y` or `yes` (any case) count as agreement.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr and reads stdin.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        if write!(self.output, "{message} ").and_then(|_| self.output.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Handler for the `seed` command.
pub struct SeedCommand {
    config: SeedConfig,
    seeder: Seeder,
}

impl SeedCommand {
    pub fn new(config: SeedConfig, seeder: Seeder) -> Self {
        Self { config, seeder }
    }

    pub fn seeder(&self) -> &Seeder {
        &self.seeder
    }

    /// Prompt shown before the table is emptied.
    pub fn confirmation_message(&self) -> String {
        format!(
            "This command will delete the `{}` table and then seed the '{}' database.\n  Do you want to continue? [y|n]",
            self.seeder.table(),
            self.config.connection_label()
        )
    }

    /// Picks the CSV path from the arguments, then the config.
    pub fn resolve_source(&self, args: &SeedArgs) -> Result<PathBuf, CommandError> {
        args.source
            .clone()
            .or_else(|| self.config.source_file.clone())
            .ok_or(CommandError::MissingSource)
    }

    /// Runs the command.
    ///
    /// Header validation failures surface as [`CommandError::HeaderValidation`]
    /// and leave the table untouched.
    pub async fn run(
        &self,
        args: &SeedArgs,
        confirm: &mut impl Confirm,
    ) -> Result<Outcome, CommandError> {
        let source = self.resolve_source(args)?;
        let columns = ColumnSpec::from_option(args.columns.as_deref());
        let start = Instant::now();

        if !confirm.confirm(&self.confirmation_message()) {
            info!("Seeding cancelled");
            return Ok(Outcome::Cancelled);
        }

        info!("Preparing data...");
        let data = match self.seeder.prepare(&source, &columns) {
            Err(SeedError::Prepare(PrepareError::HeaderDoesNotExist(column))) => {
                return Err(CommandError::HeaderValidation {
                    column,
                    path: source,
                });
            }
            other => other?,
        };

        let result = self.seeder.replace(&data).await?;
        let elapsed = start.elapsed();

        info!("Database seeded in {} seconds!", elapsed.as_secs());
        Ok(Outcome::Seeded(SeedResult {
            rows: result.rows,
            elapsed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let answer = PromptConfirm::new(input.as_bytes(), &mut output).confirm("Continue?");
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_prompt_accepts_yes() {
        assert!(prompt("y\n").0);
        assert!(prompt("YES\n").0);
        assert!(prompt("  yes  \n").0);
    }

    #[test]
    fn test_prompt_declines_everything_else() {
        assert!(!prompt("n\n").0);
        assert!(!prompt("\n").0);
        assert!(!prompt("").0);
        assert!(!prompt("yep\n").0);
    }

    #[test]
    fn test_prompt_writes_message() {
        let (_, written) = prompt("n\n");
        assert_eq!(written, "Continue? ");
    }

    #[test]
    fn test_closures_confirm() {
        let mut asked = Vec::new();
        let mut decline = |message: &str| {
            asked.push(message.to_string());
            false
        };
        assert!(!decline.confirm("Sure?"));
        assert_eq!(asked, vec!["Sure?".to_string()]);
        assert!(AssumeYes.confirm("Sure?"));
    }

    #[test]
    fn test_header_error_message() {
        let err = CommandError::HeaderValidation {
            column: "state".to_string(),
            path: PathBuf::from("zips.csv"),
        };
        assert_eq!(err.to_string(), "The column `state` does not exist in zips.csv");
    }
}
