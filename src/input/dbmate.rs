//! dbmate migration directory loader
//!
//! dbmate keeps one file per migration, named `<version>_<description>.sql`.
//! Each file holds an up block introduced by `-- migrate:up` and an optional
//! down block introduced by `-- migrate:down`. Directive lines may carry
//! `key:value` options, of which only `transaction` is meaningful.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::input::{LoadError, Migration, MigrationLoader, MigrationOptions};

static MIGRATION_FILE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+).*\.sql$").expect("Invalid migration file regex"));

static UP_DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^--[ \t]*migrate:up([ \t]*$|[ \t]+\S+)").expect("Invalid up directive regex")
});

static DOWN_DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^--[ \t]*migrate:down([ \t]*$|[ \t]+\S+)")
        .expect("Invalid down directive regex")
});

/// A migration file found in the migrations directory, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub file_name: String,
    pub version: String,
    pub path: PathBuf,
}

/// The up and down blocks of one migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationBlocks {
    pub up: String,
    pub up_options: MigrationOptions,
    pub down: String,
    pub down_options: MigrationOptions,
}

/// Loader for a flat directory of dbmate migration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbmateLoader;

impl MigrationLoader for DbmateLoader {
    fn load(&self, dir: &Path) -> Result<Vec<Migration>, LoadError> {
        discover(dir)?
            .into_iter()
            .map(|file| load_file(dir, file))
            .collect()
    }
}

/// List migration files in `dir`, sorted by file name.
///
/// Subdirectories and files that do not look like `<digits>...sql` are skipped.
pub fn discover(dir: &Path) -> Result<Vec<MigrationFile>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(version) = MIGRATION_FILE_REGEX
            .captures(&file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        else {
            debug!(file = %file_name, "skipping non-migration file");
            continue;
        };
        files.push(MigrationFile {
            path: dir.join(&file_name),
            file_name,
            version,
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

fn load_file(dir: &Path, file: MigrationFile) -> Result<Migration, LoadError> {
    let contents = std::fs::read_to_string(&file.path).map_err(|source| LoadError::Io {
        path: file.path.clone(),
        source,
    })?;
    let blocks = parse_blocks(&contents).map_err(|message| LoadError::Parse {
        path: file.path.clone(),
        message,
    })?;

    let relative_file_path = file
        .path
        .strip_prefix(dir)
        .unwrap_or(&file.path)
        .display()
        .to_string();

    Ok(Migration {
        applied: false,
        file_name: file.file_name,
        file_path: file.path.display().to_string(),
        relative_file_path,
        version: file.version,
        up: blocks.up,
        up_options: blocks.up_options,
        down: blocks.down,
        down_options: blocks.down_options,
    })
}

/// Split migration file contents into up and down blocks.
///
/// The first block starts at the beginning of the file, so any leading
/// comment lines stay in it and its lines match the file. The second block
/// starts at its directive line and runs to the end of the file. Everything
/// before the first directive must be blank lines or comments.
pub fn parse_blocks(contents: &str) -> Result<MigrationBlocks, String> {
    let up_start = UP_DIRECTIVE_REGEX
        .find(contents)
        .map(|m| m.start())
        .ok_or_else(|| {
            "dbmate requires each migration to define an up block with '-- migrate:up'".to_string()
        })?;
    let down_start = DOWN_DIRECTIVE_REGEX.find(contents).map(|m| m.start());

    let first_directive = down_start.map_or(up_start, |down| down.min(up_start));
    if statements_precede(&contents[..first_directive]) {
        return Err(
            "statements must be preceded by a migration directive ('-- migrate:up')".to_string(),
        );
    }

    let (up, down) = match down_start {
        None => (contents, ""),
        Some(down_start) if up_start < down_start => {
            (&contents[..down_start], &contents[down_start..])
        }
        Some(down_start) => (&contents[up_start..], &contents[..up_start]),
    };

    Ok(MigrationBlocks {
        up: up.to_string(),
        up_options: parse_options(&contents[up_start..]),
        down: down.to_string(),
        down_options: parse_options(down_start.map_or("", |start| &contents[start..])),
    })
}

fn statements_precede(preamble: &str) -> bool {
    preamble.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

/// Options from the directive line at the start of `block`.
///
/// `transaction` is always present and normalized to `"true"` or `"false"`.
fn parse_options(block: &str) -> MigrationOptions {
    let directive = block.lines().next().unwrap_or("");
    let directive = directive.trim().trim_start_matches("--").trim();

    let mut options: MigrationOptions = directive
        .split_whitespace()
        .skip(1)
        .filter_map(|word| word.split_once(':'))
        .collect();

    let run_in_transaction = options.runs_in_transaction();
    options.insert(MigrationOptions::TRANSACTION, run_in_transaction.to_string());
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{TextLocation, resolve};
    use std::fs;

    const SIMPLE: &str = "-- migrate:up\nCREATE TABLE t (id int);\n\n-- migrate:down\nDROP TABLE t;\n";

    #[test]
    fn test_parse_blocks_keeps_directives() {
        let blocks = parse_blocks(SIMPLE).unwrap();
        assert_eq!(blocks.up, "-- migrate:up\nCREATE TABLE t (id int);\n\n");
        assert_eq!(blocks.down, "-- migrate:down\nDROP TABLE t;\n");
        assert_eq!(format!("{}{}", blocks.up, blocks.down), SIMPLE);
    }

    #[test]
    fn test_parse_blocks_default_transaction() {
        let blocks = parse_blocks(SIMPLE).unwrap();
        assert_eq!(blocks.up_options.get("transaction"), Some("true"));
        assert_eq!(blocks.down_options.get("transaction"), Some("true"));
    }

    #[test]
    fn test_parse_blocks_options_are_independent() {
        let contents = "-- migrate:up transaction:false\nCREATE INDEX CONCURRENTLY i ON t(c);\n\
                        -- migrate:down\nDROP INDEX i;\n";
        let blocks = parse_blocks(contents).unwrap();
        assert_eq!(blocks.up_options, MigrationOptions::with_transaction(false));
        assert_eq!(blocks.down_options, MigrationOptions::with_transaction(true));
    }

    #[test]
    fn test_parse_blocks_keeps_unknown_options() {
        let blocks = parse_blocks("--migrate:up foo:bar\nSELECT 1;\n").unwrap();
        assert_eq!(blocks.up_options.get("foo"), Some("bar"));
        assert_eq!(blocks.up_options.get("transaction"), Some("true"));
    }

    #[test]
    fn test_parse_blocks_without_down() {
        let blocks = parse_blocks("-- migrate:up\nSELECT 1;\n").unwrap();
        assert_eq!(blocks.down, "");
        assert_eq!(blocks.down_options, MigrationOptions::with_transaction(true));
    }

    #[test]
    fn test_parse_blocks_down_first() {
        let contents = "-- migrate:down\nDROP TABLE t;\n-- migrate:up\nCREATE TABLE t (id int);\n";
        let blocks = parse_blocks(contents).unwrap();
        assert_eq!(blocks.up, "-- migrate:up\nCREATE TABLE t (id int);\n");
        assert_eq!(blocks.down, "-- migrate:down\nDROP TABLE t;\n");
    }

    #[test]
    fn test_parse_blocks_leading_comments_stay_in_up() {
        let contents = "-- header comment\n\n-- migrate:up transaction:false\nSELECT 1;\n\
                        -- migrate:down\nSELECT 2;\n";
        let blocks = parse_blocks(contents).unwrap();
        assert_eq!(
            blocks.up,
            "-- header comment\n\n-- migrate:up transaction:false\nSELECT 1;\n"
        );
        assert_eq!(blocks.up_options, MigrationOptions::with_transaction(false));
        assert_eq!(format!("{}{}", blocks.up, blocks.down), contents);

        let select = blocks.up.find("SELECT").unwrap();
        assert_eq!(resolve(&blocks.up, select), TextLocation::new(4, 1));
    }

    #[test]
    fn test_parse_blocks_leading_comments_before_down_first() {
        let contents = "-- header\n-- migrate:down\nDROP TABLE t;\n-- migrate:up\nSELECT 1;\n";
        let blocks = parse_blocks(contents).unwrap();
        assert_eq!(blocks.down, "-- header\n-- migrate:down\nDROP TABLE t;\n");
        assert_eq!(blocks.up, "-- migrate:up\nSELECT 1;\n");
    }

    #[test]
    fn test_parse_blocks_missing_up() {
        let err = parse_blocks("CREATE TABLE t (id int);\n").unwrap_err();
        assert!(err.contains("migrate:up"), "got: {err}");
    }

    #[test]
    fn test_parse_blocks_statement_before_up() {
        let err = parse_blocks("SELECT 1;\n-- migrate:up\nSELECT 2;\n").unwrap_err();
        assert!(err.contains("preceded"), "got: {err}");
    }

    #[test]
    fn test_directive_must_start_line() {
        let err = parse_blocks("SELECT 1; -- migrate:up\n").unwrap_err();
        assert!(err.contains("migrate:up"), "got: {err}");
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("20240102_b.sql"), SIMPLE).unwrap();
        fs::write(dir.path().join("20240101_a.sql"), SIMPLE).unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();
        fs::write(dir.path().join("schema.sql"), "").unwrap();
        fs::create_dir(dir.path().join("20240103_dir.sql")).unwrap();

        let files = discover(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["20240101_a.sql", "20240102_b.sql"]);
        assert_eq!(files[0].version, "20240101");
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        match discover(&missing) {
            Err(LoadError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_sets_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("001_init.sql"), SIMPLE).unwrap();

        let migrations = DbmateLoader.load(dir.path()).unwrap();
        assert_eq!(migrations.len(), 1);
        let migration = &migrations[0];
        assert_eq!(migration.file_name, "001_init.sql");
        assert_eq!(migration.relative_file_path, "001_init.sql");
        assert_eq!(
            migration.file_path,
            dir.path().join("001_init.sql").display().to_string()
        );
        assert_eq!(migration.version, "001");
        assert!(!migration.applied);
    }

    #[test]
    fn test_load_reports_file_on_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("001_bad.sql"), "SELECT 1;\n").unwrap();

        match DbmateLoader.load(dir.path()) {
            Err(LoadError::Parse { path, .. }) => {
                assert_eq!(path, dir.path().join("001_bad.sql"));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
