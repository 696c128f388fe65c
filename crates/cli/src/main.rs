fn main() {
    if let Err(e) = stubscope_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
