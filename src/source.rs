//! Source materialization
//!
//! Writes the submitted source code into a workspace under the filename
//! the language's toolchain expects. For class-bound toolchains (Java)
//! the declared public class is renamed to the canonical name so the
//! file name and the runnable unit agree.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::error::JudgeError;
use crate::languages::LanguageProfile;
use crate::workspace::Workspace;

/// Canonical public type name for class-bound toolchains
pub const CANONICAL_CLASS_NAME: &str = "Solution";

/// The source file written into a workspace
#[derive(Debug)]
pub struct MaterializedSource {
    pub path: PathBuf,
    pub file_name: String,
}

/// Write the submitted source into the workspace per the profile's policy
pub async fn materialize(
    workspace: &Workspace,
    profile: &LanguageProfile,
    code: &str,
) -> Result<MaterializedSource, JudgeError> {
    let contents = if profile.rename_public_class {
        match rewrite_public_class(code, CANONICAL_CLASS_NAME) {
            Some(rewritten) => rewritten,
            // No public class declaration: write as-is under the canonical
            // file name and let the compiler report the mismatch.
            None => code.to_string(),
        }
    } else {
        code.to_string()
    };

    let file_name = profile.source_file.clone();
    let path = workspace.path().join(&file_name);
    fs::write(&path, contents)
        .await
        .map_err(JudgeError::SourceWrite)?;

    debug!("Materialized source at {:?}", path);
    Ok(MaterializedSource { path, file_name })
}

/// Rename the first `public ... class <Name>` declaration to `canonical`.
/// Only the declared identifier changes; the rest of the code is untouched.
/// Returns None when no public class declaration is found.
fn rewrite_public_class(code: &str, canonical: &str) -> Option<String> {
    let mut search = 0;
    while let Some(rel) = code[search..].find("class") {
        let idx = search + rel;
        search = idx + "class".len();

        // `class` must be a standalone keyword
        let keyword_end = idx + "class".len();
        let before_ok = idx == 0 || !is_ident_char(code.as_bytes()[idx - 1] as char);
        let after_ok = code[keyword_end..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        if !before_ok || !after_ok {
            continue;
        }

        // The declaration's modifiers run from the previous `{`/`}`/`;`
        // up to the keyword; one of them must be `public`.
        let decl_start = code[..idx]
            .rfind(|c: char| matches!(c, '{' | '}' | ';'))
            .map(|p| p + 1)
            .unwrap_or(0);
        let is_public = code[decl_start..idx]
            .split_whitespace()
            .any(|token| token == "public");
        if !is_public {
            continue;
        }

        let name_start = keyword_end
            + code[keyword_end..]
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(0);
        let name_end = code[name_start..]
            .find(|c: char| !is_ident_char(c))
            .map(|p| p + name_start)
            .unwrap_or(code.len());
        if name_start == name_end {
            return None;
        }

        let mut rewritten = String::with_capacity(code.len());
        rewritten.push_str(&code[..name_start]);
        rewritten.push_str(canonical);
        rewritten.push_str(&code[name_end..]);
        return Some(rewritten);
    }

    None
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;

    #[test]
    fn test_rewrite_public_class() {
        let code = "public class Main {\n    public static void main(String[] args) {}\n}\n";
        let rewritten = rewrite_public_class(code, "Solution").unwrap();
        assert!(rewritten.starts_with("public class Solution {"));
        assert!(rewritten.contains("public static void main"));
    }

    #[test]
    fn test_rewrite_with_modifiers() {
        let code = "public final class MyAnswer { }";
        assert_eq!(
            rewrite_public_class(code, "Solution").unwrap(),
            "public final class Solution { }"
        );
    }

    #[test]
    fn test_rewrite_skips_non_public_class() {
        let code = "class Helper { }\npublic class Main { }";
        assert_eq!(
            rewrite_public_class(code, "Solution").unwrap(),
            "class Helper { }\npublic class Solution { }"
        );
    }

    #[test]
    fn test_rewrite_ignores_identifiers_containing_class() {
        let code = "int classCount = 0; public class A {}";
        assert_eq!(
            rewrite_public_class(code, "Solution").unwrap(),
            "int classCount = 0; public class Solution {}"
        );
    }

    #[test]
    fn test_rewrite_no_declaration() {
        assert!(rewrite_public_class("print('hello')", "Solution").is_none());
        assert!(rewrite_public_class("class Private {}", "Solution").is_none());
    }

    #[test]
    fn test_materialize_verbatim() {
        let registry = LanguageRegistry::builtin().unwrap();
        let workspace = Workspace::create().unwrap();
        let code = "print(input())";

        let source = tokio_test::block_on(materialize(
            &workspace,
            registry.get("python").unwrap(),
            code,
        ))
        .unwrap();

        assert_eq!(source.file_name, "solution.py");
        assert_eq!(std::fs::read_to_string(&source.path).unwrap(), code);
    }

    #[test]
    fn test_materialize_java_renames_class() {
        let registry = LanguageRegistry::builtin().unwrap();
        let workspace = Workspace::create().unwrap();
        let code = "public class Answer { public static void main(String[] a) {} }";

        let source =
            tokio_test::block_on(materialize(&workspace, registry.get("java").unwrap(), code))
                .unwrap();

        assert_eq!(source.file_name, "Solution.java");
        let written = std::fs::read_to_string(&source.path).unwrap();
        assert!(written.contains("public class Solution"));
        assert!(!written.contains("Answer"));
    }

    #[test]
    fn test_materialize_java_without_declaration() {
        let registry = LanguageRegistry::builtin().unwrap();
        let workspace = Workspace::create().unwrap();
        let code = "interface Runnable {}";

        let source =
            tokio_test::block_on(materialize(&workspace, registry.get("java").unwrap(), code))
                .unwrap();

        // Written unchanged under the canonical name; javac surfaces the
        // mismatch as a compile error.
        assert_eq!(source.file_name, "Solution.java");
        assert_eq!(std::fs::read_to_string(&source.path).unwrap(), code);
    }
}
