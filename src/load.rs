//! Model document loading: glob resolution, path-aware decoding, merging.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use crate::model::Model;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Load and merge every model document named by `inputs` (literal paths or
/// glob patterns). Duplicate declaration names across documents are a load
/// error.
pub fn load_model<I>(inputs: I) -> Result<Model>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let paths = resolve_file_path_patterns(inputs)?;
    let mut model = Model::default();
    for path in paths {
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read model file {}", path.display()))?;
        let doc: Model = from_str_with_path(&source)
            .map_err(|err| anyhow::anyhow!("{}: {err}", path.display()))?;
        for decl in doc.types {
            if model.get(decl.name()).is_some() {
                bail!(
                    "duplicate declaration `{}` (second copy in {})",
                    decl.name(),
                    path.display()
                );
            }
            model.types.push(decl);
        }
    }
    Ok(model)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_carry_the_json_path() {
        let err = from_str_with_path::<Model>(
            r#"{"types": [{"kind": "struct", "name": "A", "fields": [{"name": "x"}]}]}"#,
        )
        .unwrap_err();
        assert!(err.contains("types[0]"), "unexpected message: {err}");
    }

    #[test]
    fn literal_paths_pass_through_untouched() {
        let paths = resolve_file_path_patterns(["model.json"]).expect("resolves");
        assert_eq!(paths, vec![PathBuf::from("model.json")]);
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let err = resolve_file_path_patterns(["no-such-dir-xyz/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
