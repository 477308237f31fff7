//
// main.rs
//
// Copyright (C) 2022-2025 Posit Software, PBC. All rights reserved.
// Modifications copyright (C) 2026 Jonathan Marc Bearak
//

use psinline::backend;
use psinline::cli::{self, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match cli::parse_args(std::env::args().skip(1))? {
        Command::Version => println!("{}", cli::version()),
        Command::Usage => print!("{}", cli::usage()),
        Command::Serve => {
            env_logger::init();
            backend::start_lsp().await?;
        }
    }

    Ok(())
}
