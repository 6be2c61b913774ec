/// One pipeline stage. `arguments[0]` is the program name.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Command<'a> {
	pub arguments: Vec<&'a str>,
	pub input_file: Option<&'a str>,
	pub output_file: Option<&'a str>,
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RunCommands<'a> {
	pub stages: Vec<Command<'a>>,
	pub run_in_background: bool,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ChangeDirectory<'a> {
	pub target_directory: &'a str,
}

/// What one input line asks the interpreter to do.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Action<'a> {
	Nop,
	Exit,
	ChangeDirectory(ChangeDirectory<'a>),
	RunCommands(RunCommands<'a>),
}
