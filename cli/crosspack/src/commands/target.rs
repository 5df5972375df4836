//! `crosspack --list`: print the platform registry.

use crosspack_targets::{detect_host, list_known};

/// Render the registry table.
pub fn render_list() -> String {
    let host = detect_host().ok();
    let mut out = String::from("Supported platforms:\n\n");
    out.push_str(&format!(
        "  {:<14} {:<32} {:<22} {}\n",
        "PLATFORM", "RUST TARGET", "ZIG TARGET", "ARCH"
    ));
    for spec in list_known() {
        let marker = if host == Some(spec.token) { "  (host)" } else { "" };
        out.push_str(&format!(
            "  {:<14} {:<32} {:<22} {}{marker}\n",
            spec.name,
            spec.host_triple,
            spec.alt_linker_triple.unwrap_or("-"),
            spec.arch_label,
        ));
    }
    out
}

/// Print every registered platform.
pub fn list() {
    print!("{}", render_list());
}
