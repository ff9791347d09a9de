fn main() {
    if let Err(err) = maptoposter::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
