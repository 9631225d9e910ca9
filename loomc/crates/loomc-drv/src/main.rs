fn main() {
    if let Err(e) = loomc_drv::main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
