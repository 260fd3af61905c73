//! Module specifier resolution for relative imports.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::runtime::Runtime;

/// Extensions tried, in order, for an extensionless specifier.
pub const EXTENSIONS: &[&str] = &["ts", "d.ts", "tsx", "js", "mjs", "svelte"];

/// Returns `true` for `./` and `../` specifiers.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative specifier imported from `importer` to an existing file.
///
/// Candidates, in order: the joined path as written, the path with each of
/// [`EXTENSIONS`] appended, a `.js` specifier mapped to its `.ts` source, and
/// `index.*` files inside the path.
pub fn resolve_relative(importer: &Path, specifier: &str, runtime: &dyn Runtime) -> Option<PathBuf> {
    if !is_relative_specifier(specifier) {
        return None;
    }
    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    let candidate = base.join(specifier).clean();

    try_extensions(&candidate, runtime)
        .or_else(|| try_source_for_js(&candidate, runtime))
        .or_else(|| try_index_files(&candidate, runtime))
}

fn try_extensions(candidate: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
    if runtime.is_file(candidate) {
        return Some(candidate.to_path_buf());
    }
    EXTENSIONS
        .iter()
        .map(|ext| append_extension(candidate, ext))
        .find(|path| runtime.is_file(path))
}

/// `./types.js` written for ESM output usually points at `./types.ts`.
fn try_source_for_js(candidate: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
    if candidate.extension()? != "js" {
        return None;
    }
    let source = candidate.with_extension("ts");
    runtime.is_file(&source).then_some(source)
}

fn try_index_files(dir: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("index.{ext}")))
        .find(|path| runtime.is_file(path))
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut appended = path.as_os_str().to_owned();
    appended.push(".");
    appended.push(ext);
    PathBuf::from(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemoryRuntime;

    fn runtime() -> MemoryRuntime {
        MemoryRuntime::new()
            .with_file("/app/src/types.ts", "")
            .with_file("/app/src/model.d.ts", "")
            .with_file("/app/src/lib/index.ts", "")
            .with_file("/app/src/Button.svelte", "")
            .with_file("/app/shared/theme.ts", "")
    }

    #[test]
    fn appends_extensions() {
        let runtime = runtime();
        let importer = Path::new("/app/src/Button.svelte");
        assert_eq!(
            resolve_relative(importer, "./types", &runtime),
            Some(PathBuf::from("/app/src/types.ts"))
        );
        assert_eq!(
            resolve_relative(importer, "./model", &runtime),
            Some(PathBuf::from("/app/src/model.d.ts"))
        );
        assert_eq!(
            resolve_relative(importer, "./Button.svelte", &runtime),
            Some(PathBuf::from("/app/src/Button.svelte"))
        );
    }

    #[test]
    fn cleans_parent_segments_and_maps_js() {
        let runtime = runtime();
        let importer = Path::new("/app/src/Button.svelte");
        assert_eq!(
            resolve_relative(importer, "../shared/./theme.js", &runtime),
            Some(PathBuf::from("/app/shared/theme.ts"))
        );
    }

    #[test]
    fn falls_back_to_index_files() {
        let runtime = runtime();
        assert_eq!(
            resolve_relative(Path::new("/app/src/Button.svelte"), "./lib", &runtime),
            Some(PathBuf::from("/app/src/lib/index.ts"))
        );
    }

    #[test]
    fn bare_and_missing_specifiers_do_not_resolve() {
        let runtime = runtime();
        let importer = Path::new("/app/src/Button.svelte");
        assert_eq!(resolve_relative(importer, "svelte", &runtime), None);
        assert_eq!(resolve_relative(importer, "./missing", &runtime), None);
    }
}
