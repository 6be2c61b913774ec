use argh::FromArgs;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

/// A minimal line-oriented shell: exit, cd, and pipelines with redirection.
#[derive(FromArgs, Debug, PartialEq)]
pub struct Config {
	/// run one line from standard input without a prompt and exit with its status
	#[argh(switch, short = 't')]
	pub single_shot: bool,

	/// log verbosity on standard error: off, error, warn, info, debug or trace
	#[argh(option, default = "LevelFilter::Warn")]
	pub log_level: LevelFilter,
}

impl Config {
	pub fn show_prompt(&self) -> bool {
		!self.single_shot
	}

	/// Installs the stderr logger. A second call keeps the first logger.
	pub fn init_logging(&self) {
		let _ = TermLogger::init(
			self.log_level,
			simplelog::Config::default(),
			TerminalMode::Stderr,
			ColorChoice::Auto,
		);
	}
}
