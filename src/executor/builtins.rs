use std::collections::HashMap;
use std::env;

use crate::environment::Environment;

use super::status::Status;

/// An operation that must run inside the interpreter's own process because
/// its effect (directory change, termination) has to outlive the command.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    /// `args` is argv without the command name. Failures are reported on
    /// stderr and turned into a failure status; they never abort the shell.
    fn run(&self, args: &[String], env: &mut Environment) -> Status;
}

pub struct BuiltinManager {
    commands: HashMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute(&self, name: &str, args: &[String], env: &mut Environment) -> Status {
        match self.commands.get(name) {
            Some(cmd) => cmd.run(args, env),
            None => {
                eprintln!("minish: {}: no such builtin", name);
                Status::Failure(1)
            }
        }
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(&self, args: &[String], env: &mut Environment) -> Status {
        match args {
            [] => match env.home() {
                Some(home) => change_dir(home),
                None => {
                    eprintln!("minish: cd: HOME not set");
                    Status::Failure(1)
                }
            },
            [target] => change_dir(target),
            _ => {
                eprintln!("minish: cd: too many arguments");
                Status::Failure(1)
            }
        }
    }
}

fn change_dir(target: &str) -> Status {
    match env::set_current_dir(target) {
        Ok(()) => Status::Success,
        Err(e) => {
            eprintln!("minish: cd: {}: {}", target, e);
            Status::Failure(1)
        }
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn run(&self, _args: &[String], _env: &mut Environment) -> Status {
        match env::current_dir() {
            Ok(dir) => {
                println!("{}", dir.display());
                Status::Success
            }
            Err(e) => {
                eprintln!("minish: pwd: {}", e);
                Status::Failure(1)
            }
        }
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn run(&self, args: &[String], _env: &mut Environment) -> Status {
        match args {
            [] => Status::Exit(0),
            [code] => match code.parse::<i32>() {
                Ok(n) => Status::Exit(n),
                Err(_) => {
                    eprintln!("minish: exit: {}: numeric argument required", code);
                    Status::Exit(2)
                }
            },
            _ => {
                eprintln!("minish: exit: too many arguments");
                Status::Failure(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_registry_contents() {
        let mgr = BuiltinManager::new();
        assert!(mgr.is_builtin("cd"));
        assert!(mgr.is_builtin("pwd"));
        assert!(mgr.is_builtin("exit"));
        assert!(!mgr.is_builtin("echo"));
    }

    #[test]
    fn test_exit_statuses() {
        let mut env = Environment::new();
        let exit = ExitCommand;
        assert_eq!(exit.run(&[], &mut env), Status::Exit(0));
        assert_eq!(exit.run(&strings(&["5"]), &mut env), Status::Exit(5));
        assert_eq!(exit.run(&strings(&["nope"]), &mut env), Status::Exit(2));
        assert_eq!(exit.run(&strings(&["1", "2"]), &mut env), Status::Failure(1));
    }

    #[test]
    fn test_cd_argument_count() {
        let mut env = Environment::new();
        let cd = CdCommand;
        assert_eq!(
            cd.run(&strings(&["/tmp", "/var"]), &mut env),
            Status::Failure(1),
        );
    }

    // cwd is process-global, so every cd assertion lives in one test and
    // restores the directory it started from.
    #[test]
    fn test_cd_changes_and_reports_failure() {
        let mut env = Environment::new();
        let cd = CdCommand;
        let original = env::current_dir().unwrap();

        let target = env::temp_dir();
        assert_eq!(
            cd.run(&strings(&[target.to_str().unwrap()]), &mut env),
            Status::Success,
        );
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            target.canonicalize().unwrap(),
        );

        // Invalid target: failure status and the directory stays put.
        let before = env::current_dir().unwrap();
        assert_eq!(
            cd.run(&strings(&["/no/such/dir/minish"]), &mut env),
            Status::Failure(1),
        );
        assert_eq!(env::current_dir().unwrap(), before);

        // No argument: go to HOME as the environment table sees it.
        env.set("HOME", original.to_str().unwrap());
        assert_eq!(cd.run(&[], &mut env), Status::Success);
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            original.canonicalize().unwrap(),
        );

        env::set_current_dir(&original).unwrap();
    }

    #[test]
    fn test_pwd_succeeds() {
        let mut env = Environment::new();
        assert_eq!(PwdCommand.run(&[], &mut env), Status::Success);
    }
}
