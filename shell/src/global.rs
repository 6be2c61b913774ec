use crate::job;

/// Interpreter-wide state that outlives a single line.
#[derive(Debug, Default)]
pub struct State {
	pub job_set: job::JobSet,
}

impl State {
	pub fn new() -> State {
		let job_set = job::JobSet::new();
		State { job_set }
	}
}
