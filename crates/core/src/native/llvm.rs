use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::NativeConfig;
use crate::dot::parse_native_dot;
use crate::native::{NativeBackend, NativeError, NativeGraph};

/// Name of the linked module inside the build directory.
const LINKED_MODULE: &str = "linked.ll";

/// Generated binding glue that never contains user logic.
const SKIPPED_SOURCES: &[&str] = &["_cgo_export.c", "_cgo_main.c"];

/// Builds the native call graph with the LLVM toolchain:
/// `unifdef` -> `clang -emit-llvm` -> `llvm-link` -> `opt` dot-callgraph.
///
/// Every step is a blocking subprocess; the first failing step aborts the
/// extraction with its captured output.
pub struct LlvmBackend;

impl NativeBackend for LlvmBackend {
    fn extract(&self, config: &NativeConfig) -> Result<NativeGraph, NativeError> {
        let root = config.root.clone().unwrap_or_default();
        if !root.is_dir() {
            return Err(NativeError::MissingRoot(root));
        }
        if let Some(build_dir) = config.unsafe_build_dir() {
            return Err(NativeError::UnsafeBuildDir(build_dir));
        }
        let build_dir = config.resolved_build_dir().unwrap_or_else(|| root.join("build"));

        let sources = collect_sources(&root, &build_dir)?;
        if sources.is_empty() {
            return Err(NativeError::NoSources(root));
        }
        info!("{} native sources under {}", sources.len(), root.display());

        fs::create_dir_all(&build_dir)?;
        clear_artifacts(&build_dir)?;

        let unifdef = resolve_tool(&config.tools.unifdef, "BRIDGEGRAPH_UNIFDEF", "unifdef");
        let clang = resolve_tool(&config.tools.clang, "BRIDGEGRAPH_CLANG", "clang");
        let llvm_link = resolve_tool(&config.tools.llvm_link, "BRIDGEGRAPH_LLVM_LINK", "llvm-link");
        let opt = resolve_tool(&config.tools.opt, "BRIDGEGRAPH_OPT", "opt");

        let mut bitcode = Vec::new();
        for (idx, source) in sources.iter().enumerate() {
            let file_name = source.file_name().and_then(|n| n.to_str()).unwrap_or("source.c");
            let input = if config.defines.is_empty() {
                source.clone()
            } else {
                let stripped = build_dir.join(format!("unifdef_{idx}_{file_name}"));
                let mut args: Vec<OsString> = config.defines.iter().map(OsString::from).collect();
                args.push(source.clone().into());
                args.push("-o".into());
                args.push(stripped.clone().into());
                // unifdef exits 1 when it changed the output; only 2 is an error.
                run_tool(&unifdef, &args, None, &[0, 1])?;
                stripped
            };

            let output = build_dir.join(format!("{idx}_{file_name}.bc"));
            let mut args: Vec<OsString> = vec!["-c".into(), "-emit-llvm".into()];
            for dir in include_dirs(source) {
                args.push("-I".into());
                args.push(dir.into());
            }
            args.push("-o".into());
            args.push(output.clone().into());
            args.push(input.into());
            run_tool(&clang, &args, None, &[0])?;
            bitcode.push(output);
        }

        let linked = build_dir.join(LINKED_MODULE);
        let mut args: Vec<OsString> = vec!["-S".into()];
        args.extend(bitcode.iter().map(|p| p.clone().into_os_string()));
        args.push("-o".into());
        args.push(linked.clone().into());
        run_tool(&llvm_link, &args, None, &[0])?;

        let args: Vec<OsString> =
            vec!["-passes=dot-callgraph".into(), "-disable-output".into(), LINKED_MODULE.into()];
        run_tool(&opt, &args, Some(&build_dir), &[0])?;

        let dot_path = build_dir.join(format!("{LINKED_MODULE}.callgraph.dot"));
        if !dot_path.is_file() {
            return Err(NativeError::Tool {
                tool: opt.display().to_string(),
                status: "exit status: 0".to_string(),
                output: format!("no call graph written to {}", dot_path.display()),
            });
        }
        let body = fs::read_to_string(&dot_path)?;
        Ok(parse_native_dot(&body)?)
    }

    fn name(&self) -> &'static str {
        "llvm"
    }

    fn description(&self) -> &'static str {
        "Builds the native call graph with unifdef, clang, llvm-link and opt"
    }
}

/// Remove outputs of a previous run. Anything else in `build_dir` is left alone.
fn clear_artifacts(build_dir: &Path) -> Result<(), NativeError> {
    for entry in fs::read_dir(build_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let ours = name.starts_with("unifdef_")
            || name.ends_with(".bc")
            || name == LINKED_MODULE
            || name == format!("{LINKED_MODULE}.callgraph.dot");
        if ours {
            debug!("removing stale artifact {}", entry.path().display());
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Configured path, then env var, then the bare tool name on PATH.
fn resolve_tool(configured: &Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    configured
        .clone()
        .or_else(|| env::var_os(env_var).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// `.c` files under `root`, sorted, skipping the build directory and
/// generated binding glue.
fn collect_sources(root: &Path, build_dir: &Path) -> Result<Vec<PathBuf>, NativeError> {
    let mut sources = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                if path == build_dir || entry.file_name() == "build" {
                    continue;
                }
                pending.push(path);
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".c") || SKIPPED_SOURCES.contains(&name.as_str()) {
                continue;
            }
            if name.starts_with("unifdef_") {
                debug!("skipping stale preprocessed copy {}", path.display());
                continue;
            }
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// Include dirs: the source's own directory, plus its parent for files
/// living in a generated `_obj` directory.
fn include_dirs(source: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = source.parent() {
        dirs.push(dir.to_path_buf());
        let in_obj = dir.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.contains("_obj"));
        if in_obj {
            if let Some(parent) = dir.parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    dirs
}

fn run_tool(
    tool: &Path,
    args: &[OsString],
    cwd: Option<&Path>,
    ok_codes: &[i32],
) -> Result<(), NativeError> {
    let mut cmd = Command::new(tool);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    info!("{:?}", cmd);
    let output = cmd.output().map_err(|e| NativeError::Spawn {
        tool: tool.display().to_string(),
        source: e,
    })?;
    let code_ok = output.status.code().is_some_and(|c| ok_codes.contains(&c));
    if !code_ok {
        let mut captured = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !captured.is_empty() {
                captured.push('\n');
            }
            captured.push_str(stderr.trim());
        }
        warn!("{} failed ({}): {}", tool.display(), output.status, captured);
        return Err(NativeError::Tool {
            tool: tool.display().to_string(),
            status: output.status.to_string(),
            output: captured,
        });
    }
    debug!("succeed");
    Ok(())
}
