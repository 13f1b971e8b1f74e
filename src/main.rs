fn main() {
    if let Err(err) = wgpu_stage::run() {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
