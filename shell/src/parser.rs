use std::cmp;

use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
	/// No alternative of the line grammar matched the whole line.
	/// `column` is 1-based and points at the furthest character reached.
	#[error("syntax error at column {column}: command not found")]
	Syntax { column: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Collects the action while grammar rules match. Starts out empty; the
/// first argument token allocates a `RunCommands`.
#[derive(Debug, Default)]
struct ActionBuilder<'a> {
	action: Option<Action<'a>>,
}

impl<'a> ActionBuilder<'a> {
	fn on_exit(&mut self) {
		self.action = Some(Action::Exit);
	}

	fn on_cd(&mut self) {
		self.action = Some(Action::ChangeDirectory(ChangeDirectory { target_directory: "" }));
	}

	fn on_directory(&mut self, directory: &'a str) {
		if let Some(Action::ChangeDirectory(ref mut cd)) = self.action {
			cd.target_directory = directory;
		}
	}

	fn run_commands(&mut self) -> &mut RunCommands<'a> {
		if !matches!(self.action, Some(Action::RunCommands(_))) {
			self.action = Some(Action::RunCommands(RunCommands::default()));
		}
		match self.action {
			Some(Action::RunCommands(ref mut run)) => run,
			_ => unreachable!(),
		}
	}

	fn on_arg(&mut self, arg: &'a str) {
		let run = self.run_commands();
		if run.stages.is_empty() {
			run.stages.push(Command::default());
		}
		if let Some(stage) = run.stages.last_mut() {
			stage.arguments.push(arg);
		}
	}

	fn on_input_file(&mut self, file: &'a str) {
		if let Some(stage) = self.run_commands().stages.first_mut() {
			stage.input_file = Some(file);
		}
	}

	fn on_output_file(&mut self, file: &'a str) {
		if let Some(stage) = self.run_commands().stages.last_mut() {
			stage.output_file = Some(file);
		}
	}

	fn on_pipe(&mut self) {
		self.run_commands().stages.push(Command::default());
	}

	fn on_background(&mut self) {
		self.run_commands().run_in_background = true;
	}

	fn finish(self) -> Action<'a> {
		self.action.unwrap_or(Action::Nop)
	}
}

struct Parser<'a> {
	line: &'a str,
	i: usize,
	furthest: usize,
	builder: ActionBuilder<'a>,
}

impl<'a> Parser<'a> {
	fn new(line: &'a str) -> Parser<'a> {
		Parser { line, i: 0, furthest: 0, builder: ActionBuilder::default() }
	}

	fn rewind(&mut self) {
		self.i = 0;
		self.builder = ActionBuilder::default();
	}

	fn peek(&self) -> Option<u8> {
		self.line.as_bytes().get(self.i).copied()
	}

	fn advance(&mut self, n: usize) {
		self.i += n;
		self.furthest = cmp::max(self.furthest, self.i);
	}

	fn proceed_while<F>(&mut self, f: F) -> usize where F: Fn(u8) -> bool {
		let orig = self.i;
		while let Some(c) = self.peek() {
			if !f(c) { break; }
			self.advance(1);
		}
		self.i - orig
	}

	fn is_blank(c: u8) -> bool {
		matches!(c, b' ' | b'\t')
	}

	fn is_part(c: u8) -> bool {
		c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'/' | b'.')
	}

	fn is_identifier(c: u8) -> bool {
		c.is_ascii_alphanumeric() || c == b'_'
	}

	fn skip_blanks(&mut self) -> usize {
		self.proceed_while(Parser::is_blank)
	}

	fn eat(&mut self, c: u8) -> bool {
		if self.peek() == Some(c) {
			self.advance(1);
			true
		} else {
			false
		}
	}

	// A keyword must not run on into an identifier: `exitcode` is not `exit`.
	fn keyword(&mut self, word: &str) -> bool {
		let rest = &self.line.as_bytes()[self.i..];
		if !rest.starts_with(word.as_bytes()) {
			return false;
		}
		if rest.get(word.len()).map_or(false, |&c| Parser::is_identifier(c)) {
			return false;
		}
		self.advance(word.len());
		true
	}

	fn read_part(&mut self) -> Option<&'a str> {
		let orig = self.i;
		if self.proceed_while(Parser::is_part) == 0 {
			None
		} else {
			Some(&self.line[orig .. self.i])
		}
	}

	fn end_of_line(&self) -> bool {
		matches!(&self.line[self.i ..], "" | "\n" | "\r\n")
	}

	fn exit_line(&mut self) -> bool {
		self.skip_blanks();
		if !self.keyword("exit") {
			return false;
		}
		self.builder.on_exit();
		self.skip_blanks();
		true
	}

	fn cd_line(&mut self) -> bool {
		self.skip_blanks();
		if !self.keyword("cd") {
			return false;
		}
		self.builder.on_cd();
		if self.skip_blanks() == 0 {
			return false;
		}
		let directory = match self.read_part() {
			Some(directory) => directory,
			None => { return false; },
		};
		self.builder.on_directory(directory);
		self.skip_blanks();
		true
	}

	fn command(&mut self) -> bool {
		match self.read_part() {
			Some(arg) => self.builder.on_arg(arg),
			None => { return false; },
		}
		loop {
			let orig = self.i;
			if self.skip_blanks() == 0 {
				break;
			}
			match self.read_part() {
				Some(arg) => self.builder.on_arg(arg),
				None => {
					self.i = orig;
					break;
				},
			}
		}
		true
	}

	fn redirect_target(&mut self) -> Option<&'a str> {
		self.skip_blanks();
		self.read_part()
	}

	fn pipeline(&mut self) -> bool {
		self.skip_blanks();
		if !self.command() {
			return false;
		}
		self.skip_blanks();
		if self.eat(b'<') {
			match self.redirect_target() {
				Some(file) => self.builder.on_input_file(file),
				None => { return false; },
			}
		}
		self.skip_blanks();
		while self.eat(b'|') {
			self.builder.on_pipe();
			self.skip_blanks();
			if !self.command() {
				return false;
			}
			self.skip_blanks();
		}
		if self.eat(b'>') {
			match self.redirect_target() {
				Some(file) => self.builder.on_output_file(file),
				None => { return false; },
			}
		}
		self.skip_blanks();
		if self.eat(b'&') {
			self.builder.on_background();
		}
		self.skip_blanks();
		true
	}

	fn nop_line(&mut self) -> bool {
		self.skip_blanks();
		true
	}
}

/// Parses one line. The alternatives are tried in order (exit, cd, pipeline,
/// blank) and the first one that consumes the whole line wins.
pub fn parse<'a>(line: &'a str) -> ParseResult<Action<'a>> {
	let alternatives: [fn(&mut Parser<'a>) -> bool; 4] =
		[Parser::exit_line, Parser::cd_line, Parser::pipeline, Parser::nop_line];

	let mut parser = Parser::new(line);
	for alternative in alternatives.iter() {
		parser.rewind();
		if alternative(&mut parser) && parser.end_of_line() {
			return Ok(parser.builder.finish());
		}
	}
	Err(ParseError::Syntax { column: parser.furthest + 1 })
}
