fn main() {
    if let Err(err) = comfygit_cli::execute() {
        eprintln!("error: {err}");
        std::process::exit(err.class().exit_code());
    }
}
