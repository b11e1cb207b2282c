//! Help output colors.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Yellow section headers, green command literals, cyan placeholders and
/// red errors.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Green.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
		.error(AnsiColor::Red.on_default().bold())
}
