use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const LOG_DIR: &str = "logs";

fn log_path(filename: &str) -> io::Result<PathBuf> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }
    Ok(log_dir.join(filename))
}

/// Logs a message to a file with timestamp
///
/// # Arguments
///
/// * `filename` - The name of the log file (created under `logs/`)
/// * `message` - The message to log
pub fn log_to_file(filename: &str, message: &str) -> io::Result<()> {
    let path = log_path(filename)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    writeln!(file, "[{}] {}", timestamp, message)?;
    file.flush()?;

    Ok(())
}

/// Appends a row to a CSV file, writing `headers` first if the file is new
///
/// # Arguments
///
/// * `filename` - The name of the CSV file (created under `logs/`)
/// * `headers` - Column headers (only written if file is new)
/// * `row` - Row of data to append
pub fn log_csv(filename: &str, headers: &[&str], row: &[String]) -> io::Result<()> {
    let path = log_path(filename)?;
    let file_exists = path.exists();

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !file_exists && !headers.is_empty() {
        writer.write_record(headers)?;
    }
    writer.write_record(row)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_headers_written_once() {
        let name = format!("log_test_{}.csv", std::process::id());
        let headers = ["a", "b"];
        log_csv(&name, &headers, &["1".to_string(), "2".to_string()]).unwrap();
        log_csv(&name, &headers, &["3".to_string(), "4".to_string()]).unwrap();

        let path = Path::new(LOG_DIR).join(&name);
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(contents, "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn log_lines_are_timestamped() {
        let name = format!("log_test_{}.log", std::process::id());
        log_to_file(&name, "resumed").unwrap();

        let path = Path::new(LOG_DIR).join(&name);
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert!(contents.starts_with('['));
        assert!(contents.trim_end().ends_with("] resumed"));
    }
}
