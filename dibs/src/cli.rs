/*!
# DIBS CLI: Argument Parsing
*/

use argyle::Argument;
use dactyl::traits::BytesToUnsigned;
use dibs_core::CliError;
use std::path::PathBuf;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Subcommand.
enum Command {
	/// # `encode`.
	Encode,

	/// # `decode`.
	Decode,
}

/// # Encode Arguments.
pub(super) struct EncodeArgs {
	/// # Decimal Places.
	pub(super) decimal_places: u8,

	/// # Block Size (log2).
	pub(super) block_log2: u8,

	/// # CRC-32C Enabled?
	pub(super) enable_crc: bool,

	/// # Input Path.
	pub(super) input: PathBuf,

	/// # Output Path.
	pub(super) output: PathBuf,
}

/// # Decode Arguments.
pub(super) struct DecodeArgs {
	/// # Input Path.
	pub(super) input: PathBuf,

	/// # Output Path.
	pub(super) output: PathBuf,
}

/// # Parsed CLI.
pub(super) enum Parsed {
	/// # `encode IN OUT`.
	Encode(EncodeArgs),

	/// # `decode IN OUT`.
	Decode(DecodeArgs),
}



/// # Parse CLI Arguments.
pub(super) fn parse() -> Result<Parsed, CliError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut command = None;
	let mut decimal_places: u8 = 2;
	let mut block_log2: u8 = 8;
	let mut enable_crc = true;
	let mut positional: Vec<String> = Vec::new();

	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(CliError::PrintHelp),
			Argument::Key("-V" | "--version") => return Err(CliError::PrintVersion),

			Argument::KeyWithValue("--decimals", s) => {
				decimal_places = u8::btou(s.trim().as_bytes())
					.ok_or(CliError::CliParse("--decimals"))?;
			},
			Argument::KeyWithValue("--block-log2", s) => {
				block_log2 = u8::btou(s.trim().as_bytes())
					.ok_or(CliError::CliParse("--block-log2"))?;
			},
			Argument::KeyWithValue("--crc", s) => {
				enable_crc = match s.trim() {
					"on" => true,
					"off" => false,
					_ => return Err(CliError::CliParse("--crc")),
				};
			},

			Argument::Other(s) => {
				if command.is_none() {
					command = Some(match s.as_str() {
						"encode" => Command::Encode,
						"decode" => Command::Decode,
						_ => return Err(CliError::CliArg(s)),
					});
				}
				else { positional.push(s); }
			},

			_ => {},
		}
	}

	let command = command.ok_or(CliError::CliArg(String::from("encode|decode")))?;
	if positional.len() != 2 {
		return Err(CliError::CliArg(String::from("IN OUT")));
	}
	let input = PathBuf::from(positional.remove(0));
	let output = PathBuf::from(positional.remove(0));

	Ok(match command {
		Command::Encode => Parsed::Encode(EncodeArgs { decimal_places, block_log2, enable_crc, input, output }),
		Command::Decode => Parsed::Decode(DecodeArgs { input, output }),
	})
}
