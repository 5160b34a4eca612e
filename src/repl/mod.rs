//! Interactive REPL (Read-Eval-Print Loop)
//!
//! Line editing and history come from rustyline. Input that the parser
//! reports as incomplete (an open block, string or trailing operator)
//! continues on the next line instead of failing.

use crate::runtime::PropertyKey;
use crate::{Runtime, RuntimeConfig, Value};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// REPL configuration
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Prompt string
    pub prompt: String,
    /// Continuation prompt (for multi-line input)
    pub continuation_prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        let history_file = home_dir().map(|h| h.join(".ecmawalk_history"));

        Self {
            history_file,
            prompt: "es5> ".to_string(),
            continuation_prompt: "...  ".to_string(),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Keywords offered by completion
const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "continue", "debugger", "default", "delete", "do", "else", "false",
    "finally", "for", "function", "if", "in", "instanceof", "new", "null", "return", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
];

/// REPL commands
const COMMANDS: &[&str] = &[".help", ".exit", ".load", ".reset"];

/// REPL errors
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("failed to initialize line editor: {0}")]
    Init(String),
    #[error("interrupted")]
    Interrupted,
    #[error("end of input")]
    Eof,
    #[error("readline error: {0}")]
    Readline(String),
    #[error("cannot load {path}: {source}")]
    Load {
        path: String,
        source: std::io::Error,
    },
}

/// Completion, validation and (plain) highlighting for the editor
struct ReplHelper {
    globals: Rc<RefCell<BTreeSet<String>>>,
}

impl ReplHelper {
    fn word_at<'a>(&self, line: &'a str, pos: usize) -> (usize, &'a str) {
        let start = line[..pos]
            .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '$' && c != '.')
            .map(|i| i + 1)
            .unwrap_or(0);
        (start, &line[start..pos])
    }

    fn candidates(&self, word: &str) -> Vec<Pair> {
        let pair = |s: &str| Pair {
            display: s.to_string(),
            replacement: s.to_string(),
        };
        if word.starts_with('.') {
            return COMMANDS.iter().filter(|c| c.starts_with(word)).map(|c| pair(c)).collect();
        }
        let mut out: Vec<Pair> = KEYWORDS.iter().filter(|k| k.starts_with(word)).map(|k| pair(k)).collect();
        out.extend(
            self.globals
                .borrow()
                .iter()
                .filter(|g| g.starts_with(word))
                .map(|g| pair(g)),
        );
        out
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, word) = self.word_at(line, pos);
        if word.is_empty() {
            return Ok((pos, Vec::new()));
        }
        Ok((start, self.candidates(word)))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim_start().starts_with('.') || !crate::parser::is_incomplete(input) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Exit,
    Load(String),
    Reset,
}

impl ReplCommand {
    fn parse(input: &str) -> Option<Self> {
        let rest = input.trim().strip_prefix('.')?;
        let (cmd, arg) = match rest.split_once(' ') {
            Some((cmd, arg)) => (cmd, Some(arg.trim().to_string())),
            None => (rest, None),
        };
        match cmd {
            "help" | "h" => Some(Self::Help),
            "exit" | "quit" | "q" => Some(Self::Exit),
            "load" => arg.map(Self::Load),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// The interactive shell
pub struct Repl {
    config: ReplConfig,
    runtime_config: RuntimeConfig,
    runtime: Runtime,
    editor: Editor<ReplHelper, rustyline::history::DefaultHistory>,
    globals: Rc<RefCell<BTreeSet<String>>>,
}

impl Repl {
    pub fn new(runtime_config: RuntimeConfig) -> Result<Self, ReplError> {
        Self::with_config(ReplConfig::default(), runtime_config)
    }

    pub fn with_config(config: ReplConfig, runtime_config: RuntimeConfig) -> Result<Self, ReplError> {
        let mut editor = Editor::new().map_err(|e| ReplError::Init(e.to_string()))?;
        let globals = Rc::new(RefCell::new(BTreeSet::new()));
        editor.set_helper(Some(ReplHelper {
            globals: globals.clone(),
        }));
        if let Some(history_file) = &config.history_file {
            if let Err(err) = editor.load_history(history_file) {
                debug!(error = %err, "no history loaded");
            }
        }

        let mut repl = Self {
            config,
            runtime: Runtime::with_config(runtime_config.clone()),
            runtime_config,
            editor,
            globals,
        };
        repl.refresh_globals();
        Ok(repl)
    }

    pub fn run(&mut self) -> Result<(), ReplError> {
        println!("ecmawalk {} (ECMAScript 5)", crate::VERSION);
        println!("Type .help for available commands\n");

        loop {
            let input = match self.read_input() {
                Ok(input) => input,
                Err(ReplError::Interrupted) => {
                    println!("(To exit, type .exit or press Ctrl+D)");
                    continue;
                }
                Err(ReplError::Eof) => break,
                Err(e) => return Err(e),
            };
            if input.trim().is_empty() {
                continue;
            }
            match ReplCommand::parse(&input) {
                Some(ReplCommand::Exit) => break,
                Some(cmd) => {
                    if let Err(e) = self.execute_command(cmd) {
                        eprintln!("{}", e);
                    }
                }
                None => self.eval_and_print(&input),
            }
        }

        if let Some(history_file) = &self.config.history_file {
            if let Err(err) = self.editor.save_history(history_file) {
                debug!(error = %err, "history not saved");
            }
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<String, ReplError> {
        match self.editor.readline(&self.config.prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(line)
            }
            Err(ReadlineError::Interrupted) => Err(ReplError::Interrupted),
            Err(ReadlineError::Eof) => Err(ReplError::Eof),
            Err(e) => Err(ReplError::Readline(e.to_string())),
        }
    }

    fn execute_command(&mut self, cmd: ReplCommand) -> Result<(), ReplError> {
        match cmd {
            ReplCommand::Help => {
                println!(".help          Show this help");
                println!(".exit          Leave the shell");
                println!(".load <file>   Evaluate a script file");
                println!(".reset         Start over with a fresh global object");
            }
            ReplCommand::Load(path) => {
                let source = std::fs::read_to_string(&path).map_err(|source| ReplError::Load {
                    path: path.clone(),
                    source,
                })?;
                self.eval_and_print(&source);
            }
            ReplCommand::Reset => {
                self.runtime = Runtime::with_config(self.runtime_config.clone());
                self.refresh_globals();
                println!("Runtime reset");
            }
            ReplCommand::Exit => {}
        }
        Ok(())
    }

    fn eval_and_print(&mut self, code: &str) {
        match self.runtime.eval(code) {
            Ok(Value::Undefined) => {}
            Ok(value) => println!("{}", format_result(&value)),
            Err(e) => eprintln!("{}", e),
        }
        self.refresh_globals();
    }

    /// Offer every global name, built-in or user-defined, for completion
    fn refresh_globals(&mut self) {
        let global = self.runtime.global_object();
        let names = global.borrow().own_keys();
        let mut set = self.globals.borrow_mut();
        set.clear();
        set.extend(names.iter().filter_map(|k| match k {
            PropertyKey::String(s) => Some(s.to_rust_string()),
            PropertyKey::Index(_) => None,
        }));
    }
}

/// Display form of a REPL result: strings are quoted
pub fn format_result(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s.to_rust_string()),
        other => other.describe(),
    }
}
