use std::convert::Infallible;
use std::ffi::{CString, NulError};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;

use log::debug;
use nix::errno::Errno;
use nix::unistd::{self, ForkResult};
use thiserror::Error;

use crate::builtin;
use crate::global;
use crate::job;
use crate::types::*;

/// Failures that leave the interpreter unable to continue.
#[derive(Debug, Error)]
pub enum ExecError {
	#[error("cannot create pipe: {0}")]
	Pipe(#[source] nix::Error),
	#[error("cannot fork: {0}")]
	Fork(#[source] nix::Error),
	#[error("argument contains a nul byte: {0}")]
	Nul(#[from] NulError),
}

/// Failures inside a forked stage. They end that stage's process only.
#[derive(Debug, Error)]
enum StageError<'a> {
	#[error("empty command")]
	Empty,
	#[error("{file}: {source}")]
	Redirect { file: &'a str, source: io::Error },
	#[error("cannot redirect: {0}")]
	Dup(nix::Error),
	#[error("command not found: {0}")]
	NotFound(&'a str),
	#[error("{name}: {source}")]
	Exec { name: &'a str, source: nix::Error },
}

impl<'a> StageError<'a> {
	fn status(&self) -> i32 {
		match *self {
			StageError::NotFound(_) => 127,
			StageError::Exec { .. } => 126,
			_ => 1,
		}
	}
}

struct Pipe {
	read: OwnedFd,
	write: OwnedFd,
}

impl Pipe {
	fn new() -> Result<Pipe, ExecError> {
		let (read, write) = unistd::pipe().map_err(ExecError::Pipe)?;
		Ok(Pipe { read, write })
	}
}

fn redirect<'a>(fd: &impl AsRawFd, to: libc::c_int) -> Result<(), StageError<'a>> {
	unistd::dup2(fd.as_raw_fd(), to).map_err(StageError::Dup)?;
	Ok(())
}

// Every descriptor this receives is closed before exec: the pipes and files
// are dropped at the end of their wiring block, only the dup2 copies survive.
fn do_exec_stage<'a>(command: &Command<'a>, argv: &[CString],
                     prev_pipe: Option<Pipe>, next_pipe: Option<Pipe>) -> Result<Infallible, StageError<'a>> {
	if let Some(pipe) = prev_pipe {
		redirect(&pipe.read, libc::STDIN_FILENO)?;
	} else if let Some(file) = command.input_file {
		let f = File::open(file).map_err(|source| StageError::Redirect { file, source })?;
		redirect(&f, libc::STDIN_FILENO)?;
	}

	if let Some(pipe) = next_pipe {
		redirect(&pipe.write, libc::STDOUT_FILENO)?;
	} else if let Some(file) = command.output_file {
		let f = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.mode(0o644)
			.open(file)
			.map_err(|source| StageError::Redirect { file, source })?;
		redirect(&f, libc::STDOUT_FILENO)?;
	}

	let (program, name) = match (argv.first(), command.arguments.first()) {
		(Some(program), Some(&name)) => (program, name),
		_ => { return Err(StageError::Empty); },
	};
	match unistd::execvp(program, argv) {
		Err(Errno::ENOENT) => Err(StageError::NotFound(name)),
		Err(source) => Err(StageError::Exec { name, source }),
		Ok(never) => match never {},
	}
}

fn exec_stage(command: &Command, argv: &[CString], prev_pipe: Option<Pipe>, next_pipe: Option<Pipe>) -> ! {
	let s = match do_exec_stage(command, argv, prev_pipe, next_pipe) {
		Ok(never) => match never {},
		Err(e) => {
			let mut stderr = io::stderr();
			let _ = writeln!(stderr, "minish: {}", e);
			let _ = stderr.flush();
			e.status()
		},
	};
	unsafe { libc::_exit(s) }
}

fn c_arguments(command: &Command) -> Result<Vec<CString>, ExecError> {
	let argv: Result<Vec<CString>, NulError> = command.arguments.iter().map(|&s| CString::new(s)).collect();
	Ok(argv?)
}

// The pipe feeding stage i+1 is created before stage i is forked, since both
// children need an end of it. The parent drops its copy of `prev_pipe` as
// soon as the stage reading from it exists, or downstream readers never see EOF.
fn spawn_commands(run: &RunCommands, job_builder: &mut job::JobBuilder) -> Result<(), ExecError> {
	let last = run.stages.len().saturating_sub(1);
	let mut prev_pipe: Option<Pipe> = None;
	for (i, command) in run.stages.iter().enumerate() {
		let argv = c_arguments(command)?;
		let next_pipe = if i < last { Some(Pipe::new()?) } else { None };
		match job_builder.push_fork().map_err(ExecError::Fork)? {
			ForkResult::Parent { child } => {
				debug!("stage {} pid {}: {:?}", i, child, command.arguments);
				drop(prev_pipe);
			},
			ForkResult::Child => exec_stage(command, &argv, prev_pipe, next_pipe),
		}
		prev_pipe = next_pipe;
	}
	Ok(())
}

fn eval_pipeline(state: &mut global::State, run: &RunCommands) -> Result<i32, ExecError> {
	if run.stages.is_empty() {
		return Ok(0);
	}
	// Buffered output of the interpreter goes out before the children's.
	let _ = io::stdout().flush();

	let mut job_builder = job::JobBuilder::new(run.stages.len());
	spawn_commands(run, &mut job_builder)?;
	let job = job_builder.build();
	if run.run_in_background {
		debug!("detached {:?}", job.processes);
		state.job_set.push(job);
		Ok(0)
	} else {
		Ok(job.wait())
	}
}

impl<'a> Action<'a> {
	/// Runs the action and returns its status. `Exit` does not return.
	/// An `Err` means the interpreter itself can no longer continue.
	pub fn execute(self, state: &mut global::State) -> Result<i32, ExecError> {
		debug!("execute {:?}", self);
		match self {
			Action::Nop => Ok(0),
			Action::Exit => builtin::builtin_exit(),
			Action::ChangeDirectory(cd) => Ok(builtin::builtin_cd(&cd)),
			Action::RunCommands(run) => eval_pipeline(state, &run),
		}
	}
}
