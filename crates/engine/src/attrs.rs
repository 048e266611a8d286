use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

use logging::targets::XATTR;
use metadata::{MetadataMask, xattr};
use tracing::{debug, warn};

use crate::engine::{Engine, emit};
use crate::error::{EngineError, EngineResult, IoResultExt};

impl Engine {
    /// `get-xattr`: writes the value of `name` followed by a newline.
    pub fn get_xattr(&mut self, path: &Path, name: &OsStr, out: &mut dyn Write) -> EngineResult<()> {
        let value = xattr::get(path, name)?;
        emit(out, &value)?;
        emit(out, b"\n")
    }

    /// `set-xattr`: sets `name` to `value`.
    ///
    /// Without `allow_overwrite` an existing attribute fails with `EEXIST`.
    pub fn set_xattr(
        &mut self,
        path: &Path,
        name: &OsStr,
        value: &[u8],
        allow_overwrite: bool,
    ) -> EngineResult<()> {
        xattr::set(path, name, value, allow_overwrite)?;
        debug!(target: XATTR, path = %path.display(), name = %name.to_string_lossy(), "attribute set");
        Ok(())
    }

    /// `list-xattr`: writes one attribute name per line.
    pub fn list_xattr(&mut self, path: &Path, out: &mut dyn Write) -> EngineResult<()> {
        for name in xattr::list_names(path)? {
            emit(out, name.as_bytes())?;
            emit(out, b"\n")?;
        }
        Ok(())
    }

    /// `delete-xattr`: removes `name`.
    pub fn delete_xattr(&mut self, path: &Path, name: &OsStr) -> EngineResult<()> {
        xattr::remove(path, name)?;
        debug!(target: XATTR, path = %path.display(), name = %name.to_string_lossy(), "attribute removed");
        Ok(())
    }

    /// `chmod`: applies the permission bits of `mode` and reports the entry.
    pub fn chmod(&mut self, path: &Path, mode: u32, out: &mut dyn Write) -> EngineResult<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .with_path("change mode of", path)?;
        self.report(path, MetadataMask::CREATED, out)
    }

    /// `setfacl`: runs `setfacl` with `arguments` through the shell.
    ///
    /// The arguments are passed through verbatim. Standard output of the tool
    /// is discarded; its diagnostics are logged when it fails.
    pub fn setfacl(&mut self, arguments: &[u8]) -> EngineResult<()> {
        let mut script = OsString::from("setfacl ");
        script.push(OsStr::from_bytes(arguments));
        let program = Path::new("setfacl");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_path("run", program)?;

        if output.status.success() {
            debug!(target: XATTR, script = %script.to_string_lossy(), "setfacl applied");
            return Ok(());
        }
        warn!(
            target: XATTR,
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
            "setfacl failed"
        );
        Err(EngineError::status_error("run", program, libc::EIO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata::Category;
    use test_support::{TestTree, output_lines, xattrs_supported};

    #[test]
    fn xattr_round_trip_through_commands() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        if !xattrs_supported(&file) {
            return;
        }
        let name = OsStr::new("user.annotate.note");
        let mut engine = Engine::new();

        engine.set_xattr(&file, name, b"hello", false).expect("set");
        assert_eq!(
            ::xattr::get(&file, name).expect("get").as_deref(),
            Some(&b"hello"[..])
        );

        let mut out = Vec::new();
        engine.get_xattr(&file, name, &mut out).expect("get");
        assert_eq!(out, b"hello\n");

        out.clear();
        engine.list_xattr(&file, &mut out).expect("list");
        assert_eq!(output_lines(&out), vec!["user.annotate.note"]);

        engine.delete_xattr(&file, name).expect("delete");
        out.clear();
        engine.list_xattr(&file, &mut out).expect("list");
        assert!(out.is_empty());
    }

    #[test]
    fn set_without_overwrite_refuses_existing_attribute() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        if !xattrs_supported(&file) {
            return;
        }
        let name = OsStr::new("user.sensitivity");
        let mut engine = Engine::new();
        engine.set_xattr(&file, name, b"PUBLIC", false).expect("first");

        let error = engine
            .set_xattr(&file, name, b"SECRET", false)
            .expect_err("exists");
        assert_eq!(error.status(), Some(-libc::EEXIST));

        engine.set_xattr(&file, name, b"SECRET", true).expect("overwrite");
        let mut out = Vec::new();
        engine
            .stat(&file, MetadataMask::EMPTY.with(Category::Sensitivity), &mut out)
            .expect("stat");
        assert_eq!(out, b"SECRET\n");
    }

    #[test]
    fn missing_attribute_reports_errno() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        if !xattrs_supported(&file) {
            return;
        }
        let error = Engine::new()
            .get_xattr(&file, OsStr::new("user.absent"), &mut Vec::new())
            .expect_err("absent");
        assert_eq!(error.status(), Some(-libc::ENODATA));
    }

    #[test]
    fn chmod_applies_mode_and_reports() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");

        let mut out = Vec::new();
        Engine::new().chmod(&file, 0o640, &mut out).expect("chmod");

        let mode = fs::metadata(&file).expect("stat").permissions().mode() & 0o7777;
        assert_eq!(mode, 0o640);
        let line = &output_lines(&out)[0];
        assert!(line.starts_with("F,0,,0,416,"));
    }

    #[test]
    fn chmod_missing_path_is_enoent() {
        let tree = TestTree::new().expect("tree");
        let error = Engine::new()
            .chmod(&tree.join("absent"), 0o600, &mut Vec::new())
            .expect_err("missing");
        assert_eq!(error.status(), Some(-libc::ENOENT));
    }

    #[test]
    fn failing_setfacl_is_eio() {
        let error = Engine::new()
            .setfacl(b"-m u:0:rwx /nonexistent/fs-interpreter/path")
            .expect_err("no such path");
        assert_eq!(error.status(), Some(-libc::EIO));
    }
}
