//! Convert YAML files to JSON files.
//!
//! The whole tool is one operation, [`convert`], driven by a [`Config`] that
//! the command line builds once per invocation.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

mod transcode;

pub use transcode::{prettify_json, yaml_to_json, TranscodeError};

/// Options for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// YAML file to read
    pub input: PathBuf,
    /// JSON file to create or truncate
    pub output: PathBuf,
    /// Indent the JSON with two spaces instead of writing it on one line
    pub prettify: bool,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read input file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to convert YAML in input file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: TranscodeError,
    },
    #[error("Failed to prettify JSON from input file '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write output file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// The file the failing step was working on.
    pub fn path(&self) -> &Path {
        match self {
            Error::Read { path, .. }
            | Error::Parse { path, .. }
            | Error::Format { path, .. }
            | Error::Write { path, .. } => path,
        }
    }
}

/// Reads `config.input` as YAML and writes it to `config.output` as JSON.
///
/// The output file is only opened once the JSON is fully built, so a read,
/// parse or format failure never creates or truncates it.
pub fn convert(config: &Config) -> Result<(), Error> {
    let input = std::fs::read(&config.input).map_err(|source| Error::Read {
        path: config.input.clone(),
        source,
    })?;

    let mut json = yaml_to_json(&input).map_err(|source| Error::Parse {
        path: config.input.clone(),
        source,
    })?;

    if config.prettify {
        json = prettify_json(&json).map_err(|source| Error::Format {
            path: config.input.clone(),
            source,
        })?;
    }

    write_output(&config.output, &json).map_err(|source| Error::Write {
        path: config.output.clone(),
        source,
    })
}

fn write_output(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const EXAMPLE: &str = "a:\n  - 1\n  - 2\n  - 3\n";

    fn config(dir: &Path, input: &str, output: &str, prettify: bool) -> Config {
        Config {
            input: dir.join(input),
            output: dir.join(output),
            prettify,
        }
    }

    #[test]
    fn converts_compact() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), EXAMPLE).unwrap();

        convert(&config(temp.path(), "in.yaml", "out.json", false)).unwrap();

        let out = std::fs::read_to_string(temp.path().join("out.json")).unwrap();
        assert_eq!(out, r#"{"a":[1,2,3]}"#);
    }

    #[test]
    fn converts_pretty() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), EXAMPLE).unwrap();

        convert(&config(temp.path(), "in.yaml", "out.json", true)).unwrap();

        let out = std::fs::read_to_string(temp.path().join("out.json")).unwrap();
        assert_eq!(out, "{\n  \"a\": [\n    1,\n    2,\n    3\n  ]\n}");
    }

    #[test]
    fn truncates_existing_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), "x: 1\n").unwrap();
        std::fs::write(temp.path().join("out.json"), "a much longer previous file").unwrap();

        convert(&config(temp.path(), "in.yaml", "out.json", false)).unwrap();

        let out: Value =
            serde_json::from_slice(&std::fs::read(temp.path().join("out.json")).unwrap()).unwrap();
        assert_eq!(out, json!({"x": 1}));
    }

    #[test]
    fn missing_input_is_read_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path(), "missing.yaml", "out.json", false);

        let err = convert(&cfg).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert_eq!(err.path(), cfg.input);
        assert!(!cfg.output.exists());
    }

    #[test]
    fn missing_input_leaves_existing_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("out.json"), "keep").unwrap();

        let err = convert(&config(temp.path(), "missing.yaml", "out.json", false)).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("out.json")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), "a: [1, 2\nb: \"\\q\"\n").unwrap();
        let cfg = config(temp.path(), "in.yaml", "out.json", true);

        let err = convert(&cfg).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.path(), cfg.input);
        assert!(!cfg.output.exists());
    }

    #[test]
    fn missing_output_directory_is_write_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), EXAMPLE).unwrap();
        let cfg = config(temp.path(), "in.yaml", "no/such/dir/out.json", false);

        let err = convert(&cfg).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(err.path(), cfg.output);
    }

    #[test]
    fn error_message_names_path_and_cause() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path(), "missing.yaml", "out.json", false);

        let err = convert(&cfg).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing.yaml"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn output_is_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("in.yaml"), EXAMPLE).unwrap();
        let cfg = config(temp.path(), "in.yaml", "out.json", false);
        convert(&cfg).unwrap();

        let mode = std::fs::metadata(&cfg.output).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
        assert_ne!(mode & 0o600, 0);
    }
}
