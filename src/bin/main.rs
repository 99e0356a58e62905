//! Binary entrypoint for the taskpad tool

fn main() {
    if let Err(e) = taskpad::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
