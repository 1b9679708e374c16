//! CLI entry point for skiff.
//!
//! This binary provides the `skiff` command: the interactive configuration
//! editor plus non-interactive subcommands for inspecting and mutating the
//! store.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use skiff_config::{BuiltinObscurer, Session, default_config_path};

mod backends;
mod cli;
mod editor;
mod password;
mod prompt;

use cli::{Cli, Commands};
use prompt::Console;

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let path = args.config.unwrap_or_else(default_config_path);
    let registry = backends::builtin_registry();
    let obscurer = BuiltinObscurer;

    let mut session = Session::new(path);
    session.ask_password = !args.no_ask_password;
    session.auto_confirm = args.auto_confirm;

    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    let mut console = Console::terminal(&mut input, &mut output);

    session
        .load(&mut console)
        .with_context(|| format!("failed to load config file {:?}", session.path()))?;

    match args.command.unwrap_or(Commands::Edit) {
        Commands::Edit => {
            editor::edit_loop(&mut session, &registry, &obscurer, &mut console)?;
        }
        Commands::File => {
            if session.path().exists() {
                println!("Configuration file is stored at:");
            } else {
                println!("Configuration file doesn't exist, but skiff will use this path:");
            }
            println!("{}", session.path().display());
        }
        Commands::Show { remote } => match remote {
            Some(name) => {
                editor::show_remote(&session, &registry, &mut console, &name)?;
            }
            None => print!("{}", session.show()),
        },
        Commands::Dump => {
            println!("{}", session.dump_json()?);
        }
        Commands::ListRemotes { long } => {
            if long {
                editor::show_remotes(&session, &mut console)?;
            } else {
                let mut names = session.sections();
                names.sort();
                for name in names {
                    println!("{name}:");
                }
            }
        }
        Commands::Providers => {
            println!("{}", registry.to_json()?);
        }
        Commands::Create {
            name,
            backend_type,
            key_values,
        } => {
            editor::create_remote(
                &mut session,
                &registry,
                &mut console,
                &name,
                &backend_type,
                &key_values,
            )?;
        }
        Commands::Update { name, key_values } => {
            editor::update_remote(&mut session, &registry, &mut console, &name, &key_values)?;
        }
        Commands::Delete { name } => {
            editor::delete_remote(&mut session, &name)?;
        }
        Commands::Password { name, key, value } => {
            editor::password_remote(
                &mut session,
                &registry,
                &obscurer,
                &mut console,
                &name,
                &key,
                &value,
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

/// Initialize the tracing subscriber.  `SKIFF_LOG` controls verbosity; the
/// default keeps warnings and errors visible on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SKIFF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
