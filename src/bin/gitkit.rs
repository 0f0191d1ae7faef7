use console::style;

/// Entry point for the `gitkit` binary.
///
/// Delegates to the CLI entry function and exits the process with the
/// returned exit code. If an error occurs, prints it and exits with status 1.
fn main() {
    match gitkit::cli::entry() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", style(format!("Error: {}", e)).red().bold());
            std::process::exit(1)
        }
    }
}
