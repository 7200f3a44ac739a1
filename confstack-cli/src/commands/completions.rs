//! Shell completion generation command.
//!
//! Prints a completion script for the requested shell on stdout and a short
//! installation hint on stderr.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

/// Name of the installed binary (the package is `confstack-cli`).
const BIN_NAME: &str = "confstack";

/// Generate shell completion scripts
#[derive(Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(&self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut cmd = Cli::command();

        if !global.quiet {
            print_instructions(self.shell);
        }

        generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout());
        Ok(())
    }
}

fn print_instructions(shell: Shell) {
    eprintln!("# Generating {shell} completion script");
    match shell {
        Shell::Bash => {
            eprintln!("#   confstack completions bash > ~/.local/share/bash-completion/completions/confstack");
            eprintln!("# Or add to ~/.bashrc:");
            eprintln!("#   eval \"$(confstack completions bash)\"");
        }
        Shell::Zsh => {
            eprintln!("#   confstack completions zsh > ~/.zsh/completions/_confstack");
            eprintln!("# Make sure ~/.zsh/completions is in your $fpath");
        }
        Shell::Fish => {
            eprintln!("#   confstack completions fish > ~/.config/fish/completions/confstack.fish");
        }
        Shell::PowerShell => {
            eprintln!("#   confstack completions powershell | Out-String | Invoke-Expression");
        }
        _ => {}
    }
    eprintln!();
}
