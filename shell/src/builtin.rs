use std::io::{self, Write};
use std::process;

use log::debug;
use nix::errno::Errno;
use nix::unistd;

use crate::types::ChangeDirectory;

fn describe_chdir_error(e: Errno) -> &'static str {
	match e {
		Errno::ENOENT => "no such file or directory",
		Errno::ENOTDIR => "not a directory",
		Errno::EACCES => "permission denied",
		_ => "unknown error",
	}
}

/// Changes the working directory of the interpreter, which every later stage inherits.
/// Returns 0, or the errno value after printing a diagnostic.
pub fn builtin_cd(cd: &ChangeDirectory) -> i32 {
	debug!("cd {}", cd.target_directory);
	match unistd::chdir(cd.target_directory) {
		Ok(()) => 0,
		Err(e) => {
			let mut stderr = io::stderr();
			let _ = writeln!(stderr, "cd: {}: {}", describe_chdir_error(e), cd.target_directory);
			let _ = stderr.flush();
			e as i32
		},
	}
}

pub fn builtin_exit() -> ! {
	let _ = io::stdout().flush();
	process::exit(0)
}
