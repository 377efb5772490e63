use slog::Drain;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

/// Root logger writing to the terminal, tagged with the server's name.
pub fn create_root_logger_for_stdout(server_id: &str) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("server" => server_id.to_string()))
}

/// Root logger appending plain text to `path`, creating the file if needed.
pub fn create_root_logger_for_file<P: AsRef<Path>>(path: P, server_id: &str) -> io::Result<slog::Logger> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!("server" => server_id.to_string())))
}
