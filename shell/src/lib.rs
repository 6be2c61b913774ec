//! A line-oriented command interpreter.
//!
//! Each input line is parsed into an [`Action`](types::Action) (nothing,
//! `exit`, `cd DIR`, or a pipeline of programs with optional `<` / `>`
//! redirection and a trailing `&`) and then executed with
//! [`Action::execute`](types::Action::execute), which forks one process per
//! pipeline stage and wires them together with pipes.
//!
//! ```no_run
//! let mut state = minish::global::State::new();
//! let action = minish::parser::parse("ls -1 | head -n 2").unwrap();
//! let status = action.execute(&mut state).unwrap();
//! assert_eq!(status, 0);
//! ```

pub mod builtin;
pub mod config;
pub mod eval;
pub mod global;
pub mod job;
pub mod parser;
pub mod types;
