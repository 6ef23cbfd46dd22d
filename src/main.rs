fn main() -> std::process::ExitCode {
    wurm_launcher_lib::run()
}
