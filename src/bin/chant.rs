//! Command-line interface for chant
//! This binary parses and executes chant DSL programs and prints the active
//! grammar for wiring up external constrained generators.
//!
//! Usage:
//!   chant parse `<path>`              - Parse a program and print its AST as JSON
//!   chant grammar [--external]      - Print the canonical grammar text
//!   chant run `<path>`                - Execute a program against the demo task-manager verbs

use clap::{Arg, ArgAction, Command};
use std::cell::RefCell;
use std::rc::Rc;

use chant::chant::ast::Value;
use chant::chant::grammar::GrammarBuilder;
use chant::chant::runtime::Dsl;
use chant::chant::verbs::{Verb, VerbRegistry};

fn main() {
    let matches = Command::new("chant")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A grammar-driven call-chain DSL engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a program and print its AST as JSON")
                .arg(
                    Arg::new("path")
                        .help("Path to the program, or - for stdin")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("grammar")
                .about("Print the canonical grammar text")
                .arg(
                    Arg::new("external")
                        .long("external")
                        .action(ArgAction::SetTrue)
                        .help("Strip backend directives for use as a constrained-decoding CFG"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a program against the demo task-manager verbs")
                .arg(
                    Arg::new("path")
                        .help("Path to the program, or - for stdin")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("parse", parse_matches)) => {
            let path = parse_matches.get_one::<String>("path").unwrap();
            handle_parse_command(path);
        }
        Some(("grammar", grammar_matches)) => {
            handle_grammar_command(grammar_matches.get_flag("external"));
        }
        Some(("run", run_matches)) => {
            let path = run_matches.get_one::<String>("path").unwrap();
            handle_run_command(path);
        }
        _ => unreachable!(),
    }
}

fn read_source(path: &str) -> String {
    let result = if path == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        std::process::exit(1);
    })
}

/// Handle the parse command
fn handle_parse_command(path: &str) {
    let source = read_source(path);
    let dsl = Dsl::new(VerbRegistry::new()).unwrap_or_else(|e| {
        eprintln!("Grammar error: {}", e);
        std::process::exit(1);
    });
    let program = dsl.parse(&source).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let json = serde_json::to_string_pretty(&program).unwrap_or_else(|e| {
        eprintln!("Error serializing AST: {}", e);
        std::process::exit(1);
    });
    println!("{}", json);
}

/// Handle the grammar command
fn handle_grammar_command(external: bool) {
    let dsl = Dsl::new(VerbRegistry::new()).unwrap_or_else(|e| {
        eprintln!("Grammar error: {}", e);
        std::process::exit(1);
    });
    if external {
        print!("{}", dsl.external_grammar());
    } else {
        print!("{}", dsl.grammar_text());
    }
}

/// Handle the run command: the task-manager demo DSL over the canonical
/// grammar, with stateful handlers sharing one task list.
fn handle_run_command(path: &str) {
    let source = read_source(path);
    let mut dsl = task_manager_dsl().unwrap_or_else(|e| {
        eprintln!("Error defining DSL: {}", e);
        std::process::exit(1);
    });
    if let Err(e) = dsl.execute(&source) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

struct Task {
    name: String,
    priority: String,
    done: bool,
}

fn task_manager_dsl() -> Result<Dsl, Box<dyn std::error::Error>> {
    let tasks: Rc<RefCell<Vec<Task>>> = Rc::new(RefCell::new(Vec::new()));
    let mut registry = VerbRegistry::new();

    let store = Rc::clone(&tasks);
    registry.register(
        Verb::new("create_task", move |inv| {
            let name = inv.text("name").ok_or("name must be a string")?.to_string();
            let priority = inv
                .text("priority")
                .ok_or("priority must be a string")?
                .to_string();
            println!("Created task {:?} (priority: {})", name, priority);
            store.borrow_mut().push(Task {
                name,
                priority,
                done: false,
            });
            Ok(None)
        })
        .param("name")
        .param_default("priority", Value::string("normal")),
    )?;

    let store = Rc::clone(&tasks);
    registry.register(
        Verb::new("complete_task", move |inv| {
            let name = inv.text("name").ok_or("name must be a string")?;
            let mut tasks = store.borrow_mut();
            let task = tasks
                .iter_mut()
                .find(|t| t.name == name)
                .ok_or_else(|| format!("no task named {:?}", name))?;
            task.done = true;
            println!("Completed task {:?}", name);
            Ok(None)
        })
        .param("name"),
    )?;

    let store = Rc::clone(&tasks);
    registry.register(Verb::new("list_tasks", move |_| {
        let tasks = store.borrow();
        if tasks.is_empty() {
            println!("No tasks.");
            return Ok(None);
        }
        for task in tasks.iter() {
            let mark = if task.done { "x" } else { " " };
            println!("[{}] {} (priority: {})", mark, task.name, task.priority);
        }
        Ok(None)
    }))?;

    let spec = GrammarBuilder::default_grammar();
    Ok(Dsl::with_spec(registry, &spec)?)
}
