//! Call-site resolution for records
//!
//! Every public emission method and `Logger::write` are `#[track_caller]`,
//! so `Location::caller()` inside the write path already names the first
//! frame outside the emission API. That chain stands in for a fixed frame
//! skip: any new layer between the public methods and the write path must
//! also be `#[track_caller]`, or it becomes the reported call site.
//!
//! The tracked location has no function name, and an entry may ask to skip
//! further frames (wrappers that cannot carry the attribute). Both need a
//! stack walk, anchored at the tracked location and moving outward.

use super::record::SourceLocation;
use std::panic::Location;
use std::path::{Path, PathBuf};

struct ResolvedFrame {
    function: Option<String>,
    file: Option<PathBuf>,
    line: Option<u32>,
}

/// Resolve the source location `skip` frames above `origin`
///
/// The function name is filled in from debug info when available. If the
/// walk cannot find `origin` (no debug info, inlined away) or runs off the
/// end of the stack, the tracked location is returned without a function.
pub(crate) fn resolve(origin: &'static Location<'static>, skip: usize) -> SourceLocation {
    let tracked = SourceLocation::new(origin.file(), origin.line());

    let frames = capture_frames();
    let anchor = frames.iter().position(|frame| {
        frame.line == Some(origin.line())
            && frame
                .file
                .as_deref()
                .is_some_and(|file| same_file(file, origin.file()))
    });
    let Some(anchor) = anchor else {
        return tracked;
    };

    if skip == 0 {
        return match &frames[anchor].function {
            Some(function) => tracked.with_function(function.as_str()),
            None => tracked,
        };
    }

    let Some(target) = frames.get(anchor + skip) else {
        return tracked;
    };
    let root = frames[anchor]
        .file
        .as_deref()
        .and_then(|file| source_root(file, origin.file()));

    match (&target.file, target.line) {
        (Some(file), Some(line)) => {
            let location = SourceLocation::new(display_path(file, root.as_deref()), line);
            match &target.function {
                Some(function) => location.with_function(function.as_str()),
                None => location,
            }
        }
        _ => tracked,
    }
}

fn capture_frames() -> Vec<ResolvedFrame> {
    let mut frames = Vec::new();
    backtrace::trace(|frame| {
        // One physical frame yields one symbol per inlined function.
        backtrace::resolve_frame(frame, |symbol| {
            frames.push(ResolvedFrame {
                function: symbol.name().map(|name| format!("{:#}", name)),
                file: symbol.filename().map(Path::to_path_buf),
                line: symbol.lineno(),
            });
        });
        true
    });
    frames
}

fn same_file(resolved: &Path, tracked: &str) -> bool {
    resolved.ends_with(tracked) || Path::new(tracked).ends_with(resolved)
}

/// Directory that `tracked` paths are relative to, given its resolved path
fn source_root(resolved: &Path, tracked: &str) -> Option<PathBuf> {
    let mut root = resolved;
    for _ in Path::new(tracked).components() {
        root = root.parent()?;
    }
    Some(root.to_path_buf())
}

/// Render a walked path the way tracked locations are rendered
fn display_path(file: &Path, root: Option<&Path>) -> String {
    root.and_then(|root| file.strip_prefix(root).ok())
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or(file)
        .display()
        .to_string()
}
