// cli.rs — Command-line parsing for the psinline binary
//
// The binary only ever runs the language server over stdio; everything else
// it can do is report on itself.

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve LSP over stdin/stdout
    Serve,
    Version,
    Usage,
}

/// Parse the arguments that follow the executable name.
///
/// `--version` and `--help` take effect as soon as they are seen. With no
/// `--stdio` flag the usage text is printed instead of starting a server.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
    let mut serve = false;

    for arg in args {
        match arg.as_str() {
            "--stdio" => serve = true,
            "--version" | "-V" => return Ok(Command::Version),
            "--help" | "-h" => return Ok(Command::Usage),
            other => anyhow::bail!("Unknown argument: '{other}'"),
        }
    }

    Ok(if serve { Command::Serve } else { Command::Usage })
}

pub fn version() -> String {
    format!("psinline {}", env!("CARGO_PKG_VERSION"))
}

pub fn usage() -> String {
    format!(
        r#"{}, inline debugger values for PowerShell.

Usage: psinline [OPTIONS]

Available options:

--stdio                      Start the LSP server using stdio transport
-V, --version                Print the version
-h, --help                   Print this help message

Logging goes to stderr and is controlled with RUST_LOG
(e.g. RUST_LOG=psinline=trace).
"#,
        version()
    )
}
