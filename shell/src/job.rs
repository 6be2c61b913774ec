use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

pub trait WaitStatusExt {
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	/// Shell-style status: the exit code, or 128 + signal number.
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

/// Retries `f` while it fails with EINTR.
pub fn syscall<F, T>(f: F) -> nix::Result<T> where F: Fn() -> nix::Result<T> {
	loop {
		match f() {
			Err(Errno::EINTR) => (),
			r => return r,
		}
	}
}

/// Processes of one pipeline, in spawn order (leftmost stage first).
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Pid>,
}

impl Job {
	/// Waits for every process, latest spawned first, and returns the
	/// status of the last stage.
	pub fn wait(self) -> i32 {
		let mut last_status = 0;
		for (i, &pid) in self.processes.iter().enumerate().rev() {
			let status = match syscall(|| wait::waitpid(pid, None)) {
				Ok(status) => {
					debug!("pid {} finished: {:?}", pid, status);
					status.code().unwrap_or(1)
				},
				Err(e) => {
					warn!("waitpid {} failed: {}", pid, e);
					1
				},
			};
			if i + 1 == self.processes.len() {
				last_status = status;
			}
		}
		last_status
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks and, in the parent, records the child's pid.
	pub fn push_fork(&mut self) -> nix::Result<ForkResult> {
		// The interpreter has a single thread of control, so the child may
		// run arbitrary code until it execs or exits.
		let r = unsafe { unistd::fork() }?;
		if let ForkResult::Parent { child } = r {
			self.imp.processes.push(child);
		}
		Ok(r)
	}

	pub fn is_empty(&self) -> bool {
		self.imp.processes.is_empty()
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// Processes of pipelines started with `&`. They are never waited for;
/// `reap` only collects the ones that already finished.
#[derive(Debug, Default)]
pub struct JobSet {
	background: Vec<Pid>,
}

impl JobSet {
	pub fn new() -> JobSet {
		JobSet::default()
	}

	pub fn push(&mut self, job: Job) {
		self.background.extend(job.processes);
	}

	pub fn len(&self) -> usize {
		self.background.len()
	}

	pub fn is_empty(&self) -> bool {
		self.background.is_empty()
	}

	pub fn reap(&mut self) {
		self.background.retain(|&pid| {
			match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
				Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => true,
				Ok(status) => {
					debug!("background pid {} finished: {:?}", pid, status);
					false
				},
				Err(e) => {
					warn!("reaping background pid {} failed: {}", pid, e);
					false
				},
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::sys::signal::Signal;
	use std::{thread, time};

	// Children only call async-signal-safe functions: the test harness is multi-threaded.
	fn spawn_exiting(builder: &mut JobBuilder, code: i32) {
		match builder.push_fork().unwrap() {
			ForkResult::Parent { .. } => (),
			ForkResult::Child => unsafe { libc::_exit(code) },
		}
	}

	#[test]
	fn wait_status_codes() {
		let pid = Pid::from_raw(1);
		assert_eq!(WaitStatus::Exited(pid, 0).code(), Some(0));
		assert_eq!(WaitStatus::Exited(pid, 3).code(), Some(3));
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGKILL, false).code(), Some(137));
		assert_eq!(WaitStatus::StillAlive.code(), None);
	}

	#[test]
	fn wait_returns_status_of_last_stage() {
		let mut builder = JobBuilder::new(3);
		spawn_exiting(&mut builder, 1);
		spawn_exiting(&mut builder, 2);
		spawn_exiting(&mut builder, 5);
		let job = builder.build();
		assert_eq!(job.processes.len(), 3);
		assert_eq!(job.wait(), 5);
	}

	#[test]
	fn wait_reports_signals() {
		let mut builder = JobBuilder::new(1);
		match builder.push_fork().unwrap() {
			ForkResult::Parent { .. } => (),
			ForkResult::Child => unsafe {
				libc::raise(libc::SIGKILL);
				libc::_exit(0)
			},
		}
		assert_eq!(builder.build().wait(), 137);
	}

	#[test]
	fn empty_builder() {
		let builder = JobBuilder::new(0);
		assert!(builder.is_empty());
		assert_eq!(builder.build().wait(), 0);
	}

	#[test]
	fn job_set_reaps_finished_processes() {
		let mut builder = JobBuilder::new(2);
		spawn_exiting(&mut builder, 0);
		spawn_exiting(&mut builder, 0);
		let mut job_set = JobSet::new();
		job_set.push(builder.build());
		assert_eq!(job_set.len(), 2);

		for _ in 0 .. 200 {
			job_set.reap();
			if job_set.is_empty() {
				break;
			}
			thread::sleep(time::Duration::from_millis(10));
		}
		assert!(job_set.is_empty());
	}
}
