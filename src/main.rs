use std::process;

use nix::sys::signal::{self, SigHandler, Signal};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use minish::config::ConfigLoader;
use minish::environment::Environment;
use minish::executor::{Engine, Executor, Status};
use minish::parser;
use minish::prompt::ShellPrompt;

fn main() {
    let mut env = Environment::new();
    let config = ConfigLoader::load(env.home());
    let history_file = config.history_path(env.home());
    let prompt = ShellPrompt::new(&config.prompt);

    let mut rl = match editor(config.history_max) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("minish: cannot initialize line editor: {}", e);
            process::exit(1);
        }
    };
    // Missing history file just means a first run.
    let _ = rl.load_history(&history_file);

    // Ctrl-C must interrupt whichever child is running, never this process.
    // Children restore the default disposition before execvp, so they still
    // die on SIGINT while the shell survives to show the next prompt.
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigIgn);
    }

    let mut engine = Engine::new();
    let mut exit_code = 0;

    loop {
        engine.reap_background();

        match rl.readline(&prompt.render()) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                // Persist as we go so a killed session keeps its history.
                let _ = rl.save_history(&history_file);

                let ast = match parser::parse_line(&line) {
                    Ok(ast) => ast,
                    Err(e) => {
                        eprintln!("minish: {}", e);
                        continue;
                    }
                };

                match engine.exec(&ast, &mut env) {
                    Ok(Status::Exit(code)) => {
                        exit_code = code;
                        break;
                    }
                    Ok(status) if !status.is_success() => {
                        eprintln!("minish: command failed with status {}", status.code());
                    }
                    Ok(_) => {}
                    Err(e) => eprintln!("minish: {}", e),
                }
            }
            // ^C: drop the current line and show a fresh prompt.
            Err(ReadlineError::Interrupted) => continue,
            // ^D: leave cleanly.
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("minish: {}", e);
                exit_code = 1;
                break;
            }
        }
    }

    let _ = rl.save_history(&history_file);
    process::exit(exit_code);
}

fn editor(history_max: usize) -> rustyline::Result<DefaultEditor> {
    let config = rustyline::Config::builder()
        .max_history_size(history_max)?
        .auto_add_history(false)
        .build();
    DefaultEditor::with_config(config)
}
