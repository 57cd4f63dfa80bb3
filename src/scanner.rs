use std::fs;
use std::path::PathBuf;

/// A candidate project directory. Identity is `full_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub name: String,
    pub full_path: PathBuf,
}

/// Lists the immediate subdirectories of every search root, one level deep.
///
/// A root that cannot be read (missing, permissions) is reported on stderr
/// and skipped; the remaining roots are still scanned. The aggregate is
/// sorted by full path so the initial list order is reproducible.
pub fn scan_directories(roots: &[PathBuf]) -> Vec<Directory> {
    let mut directories = Vec::new();

    for root in roots {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                eprintln!("warning: skipping {}: {err}", root.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            directories.push(Directory {
                name: entry.file_name().to_string_lossy().into_owned(),
                full_path: entry.path(),
            });
        }
    }

    directories.sort_by(|a, b| a.full_path.cmp(&b.full_path));
    directories
}
