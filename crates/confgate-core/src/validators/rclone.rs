use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;
use std::path::Path;

/// Remote templates shipped for rclone backup targets
pub const RCLONE_TEMPLATES: [&str; 14] = [
    "azureblob", "b2", "box", "crypt", "drive", "dropbox", "ftp", "gcs", "onedrive", "pcloud", "s3", "sftp", "swift",
    "webdav",
];

/// Known template name, or a path to a custom template file
pub fn rclone_template(value: &Value, ctx: &ValidatorContext<'_>) -> CheckResult {
    let template = expect_str(value)?;
    if RCLONE_TEMPLATES.contains(&template) {
        return Ok(());
    }
    let path = Path::new(template);
    if path.is_file() {
        ctx.note(format!("using custom rclone template file {}", path.display()));
        return Ok(());
    }
    if path.exists() {
        return Err(format!("rclone template path '{}' is not a regular file", template));
    }
    Err(format!(
        "'{}' is neither a known rclone template ({}) nor an existing template file",
        template,
        RCLONE_TEMPLATES.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::check;

    #[test]
    fn test_known_templates() {
        assert!(check(rclone_template, "s3").is_ok());
        assert!(check(rclone_template, "sftp").is_ok());
    }

    #[test]
    fn test_template_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.conf.j2");
        std::fs::write(&file, "[remote]\ntype = s3\n").unwrap();
        assert!(check(rclone_template, file.to_str().unwrap()).is_ok());
        assert!(check(rclone_template, dir.path().to_str().unwrap())
            .unwrap_err()
            .contains("not a regular file"));
    }

    #[test]
    fn test_unknown_template() {
        let err = check(rclone_template, "s4").unwrap_err();
        assert!(err.contains("neither a known rclone template"));
    }
}
