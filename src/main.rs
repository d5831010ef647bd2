use ext2fs::shell::Shell;

fn main() {
    // RUST_LOG controls verbosity; errors the shell can explain are
    // printed by the shell itself.
    env_logger::init();

    let code = Shell::new().run();
    std::process::exit(code);
}
