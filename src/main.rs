fn main() -> std::process::ExitCode {
    clipboard_ai_lib::run()
}
