// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Finish-Args Policy Engine
//!
//! Pure rule evaluation over an application identifier and its canonical
//! permission model. Every rule group runs; groups never short-circuit each
//! other.
//!
//! Severity follows one principle: anything granting more scope than
//! declared intent, enabling a sandbox escape, or contradicting itself is an
//! **error**; anything merely redundant, deprecated or discouraged is a
//! **warning**.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the sandbox permission policy

use crate::domain::appid::AppId;
use crate::domain::diagnostics::Diagnostics;
use crate::domain::permissions::{
    PermissionModel, DEVICE, FILESYSTEM, OWN_NAME, SHARE, SOCKET, TALK_NAME,
};
use regex::Regex;
use std::sync::LazyLock;

const XDG_DIRS: &[&str] = &["xdg-data", "xdg-config", "xdg-cache"];

/// Inherited from common runtimes; always acceptable
const KDEGLOBALS_EXCEPTION: &str = "xdg-config/kdeglobals:ro";

const RESERVED_PREFIXES: &[&str] = &[
    "/app",
    "/dev",
    "/etc",
    "/lib",
    "/lib32",
    "/lib64",
    "/proc",
    "/root",
    "/run/flatpak",
    "/run/host",
    "/sbin",
    "/usr",
    ".flatpak-info",
];

const ABSOLUTE_HOME_PREFIXES: &[&str] = &["/home", "/var/home"];

const HOST_GRANTS: &[&str] = &["host", "host:rw", "host:create", "host:ro"];
const HOME_GRANTS: &[&str] = &["home", "home:rw", "home:create", "home:ro"];

const SYSTEM_FLATPAK_FOLDERS: &[&str] = &["/var/lib/flatpak"];
const USER_FLATPAK_FOLDERS: &[&str] = &[
    "~/.local/share/flatpak",
    "home/.local/share/flatpak",
    "xdg-data/flatpak",
];

const WILDCARD_NAMESPACES: &[(&str, &str)] = &[
    ("org.freedesktop.*", "freedesktop"),
    ("org.gnome.*", "gnome"),
    ("org.kde.*", "kde"),
];

const PORTAL_PREFIX: &str = "org.freedesktop.portal.";
const GVFS_NAME: &str = "org.gtk.vfs";
const FLATPAK_NAME: &str = "org.freedesktop.Flatpak";

struct XdgPatterns {
    dir: &'static str,
    arbitrary: Regex,
    unnecessary: Regex,
}

static XDG_PATTERNS: LazyLock<Vec<XdgPatterns>> = LazyLock::new(|| {
    XDG_DIRS
        .iter()
        .map(|&dir| XdgPatterns {
            dir,
            arbitrary: Regex::new(&format!(r"^{}(:(create|rw|ro))?$", regex::escape(dir)))
                .expect("valid xdg pattern"),
            unnecessary: Regex::new(&format!(r"^{}/.+?(:(create|rw|ro))?$", regex::escape(dir)))
                .expect("valid xdg pattern"),
        })
        .collect()
});

static AUTOSTART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^xdg-config/autostart(:create)?$").expect("valid autostart pattern"));

static RUN_MEDIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/run/media/[^/:]+").expect("valid run-media pattern"));

/// Evaluate every policy rule group
pub fn evaluate(appid: &AppId, model: &PermissionModel) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    check_not_defined(appid, model, &mut diagnostics);
    check_display(model, &mut diagnostics);
    check_negations(model, &mut diagnostics);
    check_xdg_dirs(model, &mut diagnostics);
    check_reserved_paths(model, &mut diagnostics);
    check_host_home(model, &mut diagnostics);
    check_flatpak_folders(model, &mut diagnostics);
    check_bus_names(appid, model, &mut diagnostics);
    check_bus_sockets(model, &mut diagnostics);
    check_devices(model, &mut diagnostics);
    check_autostart(model, &mut diagnostics);

    diagnostics
}

fn check_not_defined(appid: &AppId, model: &PermissionModel, diagnostics: &mut Diagnostics) {
    if model.is_empty() && !appid.is_extension() && !appid.is_base_app() {
        diagnostics.warning("finish-args-not-defined");
    }
}

fn check_display(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    let x11 = model.contains(SOCKET, "x11");
    let fallback = model.contains(SOCKET, "fallback-x11");
    let wayland = model.contains(SOCKET, "wayland");

    if x11 && wayland {
        diagnostics.error("finish-args-contains-both-x11-and-wayland");
    }
    if x11 && fallback {
        diagnostics.error("finish-args-contains-both-x11-and-fallback");
    }
    if fallback && !wayland {
        diagnostics.error("finish-args-fallback-x11-without-wayland");
    }
    if wayland && !x11 && !fallback {
        diagnostics.error("finish-args-only-wayland");
    }
    if (x11 || fallback) && !model.contains(SHARE, "ipc") {
        diagnostics.warning("finish-args-x11-without-ipc");
    }
}

fn check_negations(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    for (category, flag) in [(SOCKET, "nosocket"), (SHARE, "unshare"), (DEVICE, "nodevice")] {
        for value in model.negations(category) {
            diagnostics.error(format!("finish-args-has-{}-{}", flag, value));
        }
    }
}

fn check_xdg_dirs(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    for fs in model.grants(FILESYSTEM) {
        if fs == KDEGLOBALS_EXCEPTION {
            continue;
        }
        for patterns in XDG_PATTERNS.iter() {
            if patterns.arbitrary.is_match(fs) {
                diagnostics.error(format!("finish-args-arbitrary-{}-access", patterns.dir));
            } else if patterns.unnecessary.is_match(fs) {
                diagnostics.error(format!("finish-args-unnecessary-{}-access", patterns.dir));
            }
        }
    }
}

/// True when `path` is `prefix` itself or lies below it, allowing a
/// `:mode` suffix.
fn rooted_at(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with(':'),
        None => false,
    }
}

fn reserved_slug(prefix: &str) -> String {
    prefix.trim_start_matches(['/', '.']).replace('/', "-")
}

fn check_reserved_paths(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    for fs in model.grants(FILESYSTEM) {
        for prefix in RESERVED_PREFIXES {
            if rooted_at(fs, prefix) {
                diagnostics.error(format!("finish-args-reserved-{}", reserved_slug(prefix)));
            }
        }
        if ABSOLUTE_HOME_PREFIXES.iter().any(|prefix| rooted_at(fs, prefix)) {
            diagnostics.error("finish-args-absolute-home-path");
        }
        if RUN_MEDIA.is_match(fs) {
            diagnostics.error("finish-args-absolute-run-media-path");
        }
    }
}

fn check_host_home(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    // Every host/home pairing is redundant except read-only on both sides.
    let redundant = HOST_GRANTS.iter().any(|&host| {
        model.contains(FILESYSTEM, host)
            && HOME_GRANTS
                .iter()
                .any(|&home| model.contains(FILESYSTEM, home) && !(host == "host:ro" && home == "home:ro"))
    });
    if redundant {
        diagnostics.error("finish-args-redundant-home-and-host");
    }

    for fs in model.grants(FILESYSTEM) {
        if let Some(name) = fs.strip_suffix(":create") {
            if name.starts_with("host") && !name.contains('/') {
                diagnostics.warning("finish-args-unnecessary-host-create");
            } else if name == "home" {
                diagnostics.warning("finish-args-unnecessary-home-create");
            }
        }
    }
}

fn check_flatpak_folders(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    for fs in model.grants(FILESYSTEM) {
        if SYSTEM_FLATPAK_FOLDERS.iter().any(|prefix| rooted_at(fs, prefix)) {
            diagnostics.error("finish-args-flatpak-system-folder-access");
        }
        if USER_FLATPAK_FOLDERS.iter().any(|prefix| rooted_at(fs, prefix)) {
            diagnostics.error("finish-args-flatpak-user-folder-access");
        }
    }
}

fn check_bus_names(appid: &AppId, model: &PermissionModel, diagnostics: &mut Diagnostics) {
    let own_prefix = format!("{}.", appid.as_str());
    if model
        .grants(OWN_NAME)
        .any(|name| name == appid.as_str() || name.starts_with(&own_prefix))
    {
        diagnostics.error("finish-args-unnecessary-appid-own-name");
    }

    for (category, level) in [(OWN_NAME, "own"), (TALK_NAME, "talk")] {
        for name in model.grants(category) {
            if let Some((_, namespace)) = WILDCARD_NAMESPACES.iter().find(|(wildcard, _)| name == *wildcard) {
                diagnostics.error(format!("finish-args-wildcard-{}-{}-name", namespace, level));
            }
            if name.starts_with(PORTAL_PREFIX) {
                diagnostics.error(format!("finish-args-portal-{}-name", level));
            }
        }
    }

    for name in model.grants(TALK_NAME) {
        if name == GVFS_NAME || name.starts_with(&format!("{}.", GVFS_NAME)) {
            diagnostics.error("finish-args-incorrect-dbus-gvfs");
        }
        if name == FLATPAK_NAME {
            diagnostics.error("finish-args-flatpak-spawn-access");
        }
    }
}

fn check_bus_sockets(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    if model.contains(SOCKET, "session-bus") {
        diagnostics.error("finish-args-arbitrary-dbus-access");
    }
    if model.contains(SOCKET, "system-bus") {
        diagnostics.error("finish-args-system-bus-access");
    }
}

fn check_devices(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    if model.contains(DEVICE, "shm") {
        diagnostics.warning("finish-args-deprecated-shm");
    }
    if model.contains(DEVICE, "all")
        && model.grants(DEVICE).any(|device| device != "all" && device != "shm")
    {
        diagnostics.warning("finish-args-redundant-device-all");
    }
}

fn check_autostart(model: &PermissionModel, diagnostics: &mut Diagnostics) {
    if model.grants(FILESYSTEM).any(|fs| AUTOSTART.is_match(fs)) {
        diagnostics.error("finish-args-autostart-filesystem-access");
    }
}
