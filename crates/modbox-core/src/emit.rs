use crate::resolve::ResolvedSet;
use modbox_schema::Mod;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Unprivileged account every image runs as.
pub const SANDBOX_USER: &str = "sandbox";
pub const SANDBOX_HOME: &str = "/home/sandbox";

const SYNTAX_DIRECTIVE: &str = "# syntax=docker/dockerfile:1";
const HEREDOC_MARKER: &str = "__MODBOX_EOF__";

/// Where the emitted build starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// Start from the OS mod's base image.
    Standalone,
    /// Start from a previously built image.
    Dependent { parent_image: String },
}

/// Render a resolved set as a Dockerfile.
///
/// The output depends only on `resolved` and `layer`, so equal inputs always
/// produce identical text (and identical digests).
pub fn emit(resolved: &ResolvedSet, layer: &Layer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{SYNTAX_DIRECTIVE}");

    match layer {
        Layer::Standalone => {
            if let Some(image) = resolved.os_mods().find_map(|m| m.base_image.as_deref()) {
                let _ = writeln!(out, "FROM {image}");
            }
        }
        Layer::Dependent { parent_image } => {
            let _ = writeln!(out, "FROM {parent_image}");
        }
    }

    let mut env: BTreeMap<&str, &str> = BTreeMap::new();
    let mut shell: Option<&str> = None;

    for m in resolved {
        emit_mod(&mut out, m);
        for (key, value) in &m.env {
            env.insert(key, value);
        }
        if let Some(s) = m.shell.as_deref() {
            shell = Some(s);
        }
    }

    if !env.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "# ── environment ──");
        for (key, value) in &env {
            let _ = writeln!(out, "ENV {key}={}", quote(value));
        }
    }

    if let Some(shell) = shell {
        let _ = writeln!(out);
        let _ = writeln!(out, "# ── login shell ──");
        let _ = writeln!(out, "USER root");
        let _ = writeln!(out, "RUN usermod --shell {shell} {SANDBOX_USER}");
        let _ = writeln!(out, "ENV SHELL={}", quote(shell));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "USER {SANDBOX_USER}");
    let _ = writeln!(out, "WORKDIR {SANDBOX_HOME}");

    let _ = writeln!(out);
    match layer {
        Layer::Standalone => {
            let _ = writeln!(out, "# modbox: standalone image");
        }
        Layer::Dependent { parent_image } => {
            let _ = writeln!(out, "# modbox: layer on top of {parent_image}");
        }
    }
    if resolved.is_empty() {
        let _ = writeln!(out, "# mods: (none)");
    } else {
        let _ = writeln!(out, "# mods:");
        for m in resolved {
            let _ = writeln!(out, "#   {}", m.id);
        }
    }
    out
}

fn emit_mod(out: &mut String, m: &Mod) {
    let _ = writeln!(out);
    let _ = writeln!(out, "# ── {} ──", m.id);
    if let Some(script) = m.run_as_root.as_deref() {
        emit_run(out, "root", script);
    }
    if let Some(script) = m.run_as_user.as_deref() {
        emit_run(out, SANDBOX_USER, script);
    }
}

fn emit_run(out: &mut String, user: &str, script: &str) {
    let script = script.trim_end();
    if script.trim().is_empty() {
        return;
    }
    let marker = heredoc_marker(script);
    let _ = writeln!(out, "USER {user}");
    let _ = writeln!(out, "RUN <<'{marker}'");
    let _ = writeln!(out, "set -e");
    let _ = writeln!(out, "{script}");
    let _ = writeln!(out, "{marker}");
}

/// A heredoc terminator that does not occur as a line of `script`.
fn heredoc_marker(script: &str) -> String {
    let mut marker = HEREDOC_MARKER.to_owned();
    while script.lines().any(|line| line.trim() == marker) {
        marker.push('_');
    }
    marker
}

/// Double-quote a value for an `ENV` instruction. `$` is left alone so values
/// can reference earlier variables.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
