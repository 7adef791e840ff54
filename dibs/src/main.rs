/*!
# DIBS
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]



mod cli;

use cli::{DecodeArgs, EncodeArgs, Parsed};
use dibs_core::{compress, decompress, CliError, CodecOptions};
use fyi_msg::Msg;
use std::path::Path;



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed with
/// the right exit code (spec: `0` success, `2` bad args, `3` I/O, `4` codec
/// error).
fn main() {
	match _main() {
		Ok(()) => {},
		Err(CliError::PrintVersion) => {
			println!(concat!("DIBS v", env!("CARGO_PKG_VERSION")));
		},
		Err(CliError::PrintHelp) => { helper(); },
		Err(e @ (CliError::CliArg(_) | CliError::CliParse(_))) => {
			Msg::from(e).eprint();
			std::process::exit(2);
		},
		Err(e @ CliError::Io(_)) => {
			Msg::from(e).eprint();
			std::process::exit(3);
		},
		Err(e @ CliError::Codec(_)) => {
			Msg::from(e).eprint();
			std::process::exit(4);
		},
	}
}

#[inline]
/// # Actual Main.
fn _main() -> Result<(), CliError> {
	match cli::parse()? {
		Parsed::Encode(args) => run_encode(&args),
		Parsed::Decode(args) => run_decode(&args),
	}
}

/// # Run `encode`.
fn run_encode(args: &EncodeArgs) -> Result<(), CliError> {
	let opts = CodecOptions::new(args.decimal_places, args.block_log2, args.enable_crc)?;
	let data = read_samples(&args.input)?;
	let bytes = compress(&data, &opts)?;
	std::fs::write(&args.output, &bytes)
		.map_err(|e| CliError::Io(e.to_string()))?;

	Msg::success(format!(
		"Encoded {} sample(s) into {} byte(s) at {}.",
		data.len(),
		bytes.len(),
		args.output.display(),
	)).eprint();

	Ok(())
}

/// # Run `decode`.
fn run_decode(args: &DecodeArgs) -> Result<(), CliError> {
	let bytes = std::fs::read(&args.input)
		.map_err(|e| CliError::Io(e.to_string()))?;
	let data = decompress(&bytes)?;
	write_samples(&args.output, &data)?;

	Msg::success(format!(
		"Decoded {} sample(s) to {}.",
		data.len(),
		args.output.display(),
	)).eprint();

	Ok(())
}

/// # Read Samples.
///
/// The encoder's input format is one float per line; blank lines are
/// skipped so trailing newlines don't matter.
fn read_samples(path: &Path) -> Result<Vec<f64>, CliError> {
	let raw = std::fs::read_to_string(path)
		.map_err(|e| CliError::Io(e.to_string()))?;

	raw.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(|line| line.parse::<f64>().map_err(|_| CliError::CliParse("sample value")))
		.collect()
}

/// # Write Samples.
fn write_samples(path: &Path, data: &[f64]) -> Result<(), CliError> {
	let mut out = String::with_capacity(data.len() * 16);
	for v in data {
		out.push_str(&v.to_string());
		out.push('\n');
	}
	std::fs::write(path, out).map_err(|e| CliError::Io(e.to_string()))
}

#[cold]
/// # Print Help.
fn helper() {
	println!(concat!(
		"DIBS v", env!("CARGO_PKG_VERSION"), r#"
Delta Integer Bit Streaming: a lossy float64 time-series codec.

USAGE:
    dibs <SUBCOMMAND> [OPTIONS] <IN> <OUT>

SUBCOMMANDS:
    encode <IN> <OUT>
                      Read newline-separated float64 samples from <IN>,
                      compress them, and write the DIBS segment to <OUT>.
    decode <IN> <OUT>
                      Read a DIBS segment from <IN>, decompress it, and
                      write newline-separated float64 samples to <OUT>.

ENCODE OPTIONS:
        --decimals <NUM>
                      Number of decimal places to preserve during
                      fixed-point quantization. [default: 2; range: 0..=6]
        --block-log2 <NUM>
                      Log2 of the per-block sample count.
                      [default: 8; range: 2..=16]
        --crc <on|off>
                      Enable or disable the trailing CRC-32C integrity
                      check. [default: on]

MISCELLANEOUS:
    -h, --help        Print help information and exit.
    -V, --version     Print version information and exit.

EXIT CODES:
    0   Success.
    2   Bad arguments.
    3   I/O error.
    4   Codec error.
"#
	));
}
