use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use log::{debug, error};

use minish::config::Config;
use minish::{global, parser};

const PROMPT_DIR_COLOR: &str = "\x1b[32m";
const DEFAULT_COLOR: &str = "\x1b[39m";

fn display_prompt(stdout: &mut impl Write) {
	if let Ok(dir) = env::current_dir() {
		let _ = write!(stdout, "{}{}{}", PROMPT_DIR_COLOR, dir.display(), DEFAULT_COLOR);
	}
	let _ = stdout.write_all(b"$ ");
	let _ = stdout.flush();
}

fn run_line(state: &mut global::State, line: &str) -> i32 {
	let action = match parser::parse(line) {
		Ok(action) => action,
		Err(e) => {
			let _ = writeln!(io::stderr(), "minish: {}", e);
			return 127;
		},
	};
	match action.execute(state) {
		Ok(status) => status,
		Err(e) => {
			error!("{}", e);
			let _ = writeln!(io::stderr(), "minish: {}", e);
			process::exit(1)
		},
	}
}

fn main() {
	let config: Config = argh::from_env();
	config.init_logging();

	let mut state = global::State::new();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	loop {
		state.job_set.reap();
		if config.show_prompt() {
			display_prompt(&mut stdout);
		}
		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => {
				if config.show_prompt() {
					let _ = writeln!(stdout);
				}
				break;
			},
			Ok(_) => (),
			Err(e) => {
				error!("cannot read input: {}", e);
				process::exit(1);
			},
		}
		let line = String::from_utf8_lossy(&line);
		let status = run_line(&mut state, &line);
		debug!("status {}", status);
		if config.single_shot {
			process::exit(status);
		}
	}
}
